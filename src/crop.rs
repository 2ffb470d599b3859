use image::{GrayImage, Luma, RgbImage, imageops};

use crate::error::AnnotationError;
use crate::selector::Polygon;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Masks `image` to the polygon interior and crops to the tight bounding box
/// of the remaining non-zero pixels.
pub fn crop_to_polygon(image: &RgbImage, polygon: &Polygon) -> Result<RgbImage, AnnotationError> {
    let mask = fill_mask(image.width(), image.height(), polygon);
    let masked = apply_mask(image, &mask);
    let bounds = non_zero_bounds(&masked).ok_or(AnnotationError::EmptyRegion)?;

    tracing::debug!(
        vertices = polygon.len(),
        x = bounds.x,
        y = bounds.y,
        width = bounds.width,
        height = bounds.height,
        "cropping polygon region"
    );

    Ok(imageops::crop_imm(&masked, bounds.x, bounds.y, bounds.width, bounds.height).to_image())
}

/// Rasterizes the polygon with an even-odd scanline fill. A pixel belongs to
/// the polygon when its center does.
#[must_use]
pub fn fill_mask(width: u32, height: u32, polygon: &Polygon) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let vertices = polygon.vertices();
    if vertices.len() < 3 {
        return mask;
    }

    let mut crossings = Vec::with_capacity(vertices.len());
    for y in 0..height {
        let scan_y = f64::from(y) + 0.5;
        crossings.clear();

        for (index, start) in vertices.iter().enumerate() {
            let end = vertices[(index + 1) % vertices.len()];
            let (y0, y1) = (f64::from(start.y), f64::from(end.y));
            if (y0 > scan_y) == (y1 > scan_y) {
                continue;
            }
            let (x0, x1) = (f64::from(start.x), f64::from(end.x));
            crossings.push(x0 + (scan_y - y0) * (x1 - x0) / (y1 - y0));
        }

        crossings.sort_by(f64::total_cmp);
        for span in crossings.chunks_exact(2) {
            let first = first_covered_column(span[0]).max(0);
            let last = first_covered_column(span[1]).min(i64::from(width));
            for x in first..last {
                if let Ok(x) = u32::try_from(x) {
                    mask.put_pixel(x, y, Luma([u8::MAX]));
                }
            }
        }
    }

    mask
}

#[allow(clippy::cast_possible_truncation)]
fn first_covered_column(edge_x: f64) -> i64 {
    (edge_x - 0.5).ceil() as i64
}

/// Per-pixel logical AND of every channel with the mask.
#[must_use]
pub fn apply_mask(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut masked = image.clone();
    for (x, y, pixel) in masked.enumerate_pixels_mut() {
        let Luma([value]) = *mask.get_pixel(x, y);
        for channel in &mut pixel.0 {
            *channel &= value;
        }
    }
    masked
}

/// Bounding box of all pixels with at least one non-zero channel.
#[must_use]
pub fn non_zero_bounds(image: &RgbImage) -> Option<Bounds> {
    let mut extent: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0.iter().all(|channel| *channel == 0) {
            continue;
        }
        extent = Some(match extent {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    extent.map(|(min_x, min_y, max_x, max_y)| Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}
