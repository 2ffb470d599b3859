//! Offline rendering from an image file and an annotations JSON dump.

use std::path::Path;

use image::RgbImage;

use crate::error::AnnotationError;
use crate::filter::matches_keyword;
use crate::models::{Annotation, DEFAULT_LANGUAGE};
use crate::render::{render_html_page, render_html_table};
use crate::table::{CropQuality, build_rows};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRenderOptions {
    pub keyword: Option<String>,
    pub language: String,
    pub quality: CropQuality,
}

impl Default for LocalRenderOptions {
    fn default() -> Self {
        Self {
            keyword: None,
            language: DEFAULT_LANGUAGE.to_string(),
            quality: CropQuality::Strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRenderReport {
    pub html: String,
    pub total_annotations: usize,
    pub row_count: usize,
}

pub fn load_annotations(path: &Path) -> Result<Vec<Annotation>, AnnotationError> {
    let body = std::fs::read(path)?;
    serde_json::from_slice(&body).map_err(|error| AnnotationError::Payload {
        url: path.display().to_string(),
        reason: error.to_string(),
    })
}

pub fn load_image(path: &Path) -> Result<RgbImage, AnnotationError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Crops every (optionally keyword-filtered) annotation out of one image.
pub fn render_local_table(
    image_path: &Path,
    annotations_path: &Path,
    options: &LocalRenderOptions,
) -> Result<LocalRenderReport, AnnotationError> {
    let annotations = load_annotations(annotations_path)?;
    let total_annotations = annotations.len();
    let selected = match options.keyword.as_deref() {
        Some(keyword) => annotations
            .into_iter()
            .filter(|annotation| matches_keyword(annotation, keyword, &options.language))
            .collect(),
        None => annotations,
    };

    let image = load_image(image_path)?;
    let rows = build_rows(&selected, &image, &options.language, options.quality)?;
    let title = match options.keyword.as_deref() {
        Some(keyword) => format!("Annotations matching \"{keyword}\""),
        None => format!("Annotations of {}", image_path.display()),
    };

    Ok(LocalRenderReport {
        html: render_html_page(&title, &render_html_table(&rows)),
        total_annotations,
        row_count: rows.len(),
    })
}
