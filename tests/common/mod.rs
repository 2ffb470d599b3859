#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use iaw_annotation_crops::client::AnnotationApi;
use iaw_annotation_crops::error::AnnotationError;
use iaw_annotation_crops::models::{
    Annotation, AnnotationSetRef, Collection, FieldValue, IiifInfo, ImageRecord, ImageSetRef,
    LocalizedValues,
};
use image::{Rgb, RgbImage};

pub const SQUARE: &str = r#"<svg><polygon points="0,0 10,0 10,10 0,10"></polygon></svg>"#;

pub fn failure(url: &str, status: u16) -> AnnotationError {
    AnnotationError::Network {
        url: url.to_string(),
        status: Some(status),
        reason: format!("status {status}"),
    }
}

pub fn annotation(id: &str, image_id: &str, title: Option<&str>, tags: &[&str]) -> Annotation {
    let mut fields = HashMap::new();
    if let Some(title) = title {
        fields.insert(
            "title".to_string(),
            HashMap::from([(
                "en".to_string(),
                LocalizedValues {
                    values: vec![FieldValue::Text(title.to_string())],
                },
            )]),
        );
    }
    if !tags.is_empty() {
        fields.insert(
            "tag".to_string(),
            HashMap::from([(
                "en".to_string(),
                LocalizedValues {
                    values: tags
                        .iter()
                        .map(|label| FieldValue::Term {
                            term_label: (*label).to_string(),
                        })
                        .collect(),
                },
            )]),
        );
    }

    Annotation {
        id: id.to_string(),
        image_id: image_id.to_string(),
        selector: Some(SQUARE.to_string()),
        fields,
    }
}

pub fn white_image() -> RgbImage {
    RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]))
}

/// In-memory IAW hierarchy. Missing keys answer with a 404, keys listed in
/// `failing` answer with a 500.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub collections: Vec<Collection>,
    pub image_sets: HashMap<String, Vec<ImageSetRef>>,
    pub image_records: HashMap<String, Vec<ImageRecord>>,
    pub annotation_sets: HashMap<String, Vec<AnnotationSetRef>>,
    pub annotations: HashMap<String, Vec<Annotation>>,
    pub images: HashMap<String, RgbImage>,
    pub failing: Vec<String>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeApi {
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn lookup<T: Clone>(
        &self,
        call: String,
        key: &str,
        table: &HashMap<String, T>,
    ) -> Result<T, AnnotationError> {
        let failing = self.failing.iter().any(|id| id == key);
        self.calls.borrow_mut().push(call.clone());
        if failing {
            return Err(failure(&call, 500));
        }
        table.get(key).cloned().ok_or_else(|| failure(&call, 404))
    }
}

pub fn image_set(id: &str) -> ImageSetRef {
    ImageSetRef {
        id: id.to_string(),
        name: None,
    }
}

pub fn image_record(id: &str) -> ImageRecord {
    ImageRecord {
        id: id.to_string(),
        name: Some(format!("folio {id}")),
        iiif_base_url: format!("https://iiif.test/{id}"),
    }
}

pub fn annotation_set(id: &str) -> AnnotationSetRef {
    AnnotationSetRef {
        id: id.to_string(),
        name: None,
    }
}

impl AnnotationApi for FakeApi {
    async fn list_collections(&self) -> Result<Vec<Collection>, AnnotationError> {
        self.calls.borrow_mut().push("/collections".to_string());
        Ok(self.collections.clone())
    }

    async fn list_image_sets(
        &self,
        collection_id: &str,
    ) -> Result<Vec<ImageSetRef>, AnnotationError> {
        self.lookup(
            format!("/collections/{collection_id}/image-sets"),
            collection_id,
            &self.image_sets,
        )
    }

    async fn list_images(&self, image_set_id: &str) -> Result<Vec<ImageRecord>, AnnotationError> {
        self.lookup(
            format!("/image-sets/{image_set_id}/images"),
            image_set_id,
            &self.image_records,
        )
    }

    async fn list_annotation_sets(
        &self,
        image_set_id: &str,
    ) -> Result<Vec<AnnotationSetRef>, AnnotationError> {
        self.lookup(
            format!("/image-sets/{image_set_id}/annotation-sets"),
            image_set_id,
            &self.annotation_sets,
        )
    }

    async fn list_annotations(
        &self,
        annotation_set_id: &str,
    ) -> Result<Vec<Annotation>, AnnotationError> {
        self.lookup(
            format!("/annotation-sets/{annotation_set_id}/annotations"),
            annotation_set_id,
            &self.annotations,
        )
    }

    async fn get_image(&self, image_id: &str) -> Result<ImageRecord, AnnotationError> {
        self.lookup(format!("/images/{image_id}"), image_id, &self.images)?;
        Ok(ImageRecord {
            id: image_id.to_string(),
            name: None,
            iiif_base_url: format!("https://iiif.test/{image_id}"),
        })
    }

    async fn get_image_info(&self, iiif_base_url: &str) -> Result<IiifInfo, AnnotationError> {
        let image_id = iiif_base_url.trim_start_matches("https://iiif.test/");
        let image = self.lookup(format!("{iiif_base_url}/info.json"), image_id, &self.images)?;
        Ok(IiifInfo {
            width: image.width(),
            height: image.height(),
        })
    }

    async fn fetch_full_image(
        &self,
        iiif_base_url: &str,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, AnnotationError> {
        let image_id = iiif_base_url.trim_start_matches("https://iiif.test/");
        let image = self.lookup(
            format!("{iiif_base_url}/full/{width},{height}/0/default.jpg"),
            image_id,
            &self.images,
        )?;
        assert_eq!(image.dimensions(), (width, height));
        Ok(image)
    }
}
