use std::collections::HashMap;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

use crate::crop::crop_to_polygon;
use crate::error::AnnotationError;
use crate::models::{
    Annotation, LINE_COLOR_FIELD, NOTE_FIELD, TAG_FIELD, TITLE_FIELD, TableRow,
};
use crate::selector::parse_selector;

pub const THUMBNAIL_JPEG_QUALITY: u8 = 90;

/// What to do when an annotation's region cannot be cropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CropQuality {
    /// Propagate selector and empty-region errors.
    #[default]
    Strict,
    /// Log the failure and leave the image cell empty.
    BestEffort,
}

impl CropQuality {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::BestEffort => "best_effort",
        }
    }
}

impl FromStr for CropQuality {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            other => Err(format!(
                "invalid quality '{other}', expected strict or best_effort"
            )),
        }
    }
}

/// Source of the full image an annotation is cropped from.
pub trait ImageLookup {
    fn image_for(&self, annotation: &Annotation) -> Option<&RgbImage>;
}

/// Every annotation is cropped from the same image.
impl ImageLookup for RgbImage {
    fn image_for(&self, _annotation: &Annotation) -> Option<&RgbImage> {
        Some(self)
    }
}

impl ImageLookup for HashMap<String, RgbImage> {
    fn image_for(&self, annotation: &Annotation) -> Option<&RgbImage> {
        self.get(&annotation.image_id)
    }
}

/// One row per annotation, in input order.
pub fn build_rows<L>(
    annotations: &[Annotation],
    images: &L,
    language: &str,
    quality: CropQuality,
) -> Result<Vec<TableRow>, AnnotationError>
where
    L: ImageLookup + ?Sized,
{
    annotations
        .iter()
        .map(|annotation| build_row(annotation, images, language, quality))
        .collect()
}

fn build_row<L>(
    annotation: &Annotation,
    images: &L,
    language: &str,
    quality: CropQuality,
) -> Result<TableRow, AnnotationError>
where
    L: ImageLookup + ?Sized,
{
    let image = match (annotation.selector.as_deref(), images.image_for(annotation)) {
        (Some(selector), Some(full_image)) => {
            match image_cell(selector, full_image) {
                Ok(markup) => markup,
                Err(error) if quality == CropQuality::BestEffort => {
                    tracing::warn!(
                        annotation = %annotation.id,
                        %error,
                        "leaving image cell empty"
                    );
                    String::new()
                }
                Err(error) => return Err(error),
            }
        }
        _ => String::new(),
    };

    Ok(TableRow {
        image,
        title: annotation.joined_field(TITLE_FIELD, language),
        tags: annotation.joined_field(TAG_FIELD, language),
        notes: annotation.joined_field(NOTE_FIELD, language),
        line_color: annotation.joined_field(LINE_COLOR_FIELD, language),
    })
}

fn image_cell(selector: &str, full_image: &RgbImage) -> Result<String, AnnotationError> {
    let polygon = parse_selector(selector)?;
    let cropped = crop_to_polygon(full_image, &polygon)?;
    Ok(format!(
        r#"<img src="data:image/jpeg;base64,{}">"#,
        encode_jpeg_base64(&cropped)?
    ))
}

pub fn encode_jpeg_base64(image: &RgbImage) -> Result<String, AnnotationError> {
    let mut bytes = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(
        &mut bytes,
        THUMBNAIL_JPEG_QUALITY,
    ))?;
    Ok(STANDARD.encode(bytes))
}
