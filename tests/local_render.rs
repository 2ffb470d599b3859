use iaw_annotation_crops::error::AnnotationError;
use iaw_annotation_crops::local::{LocalRenderOptions, render_local_table};
use iaw_annotation_crops::table::CropQuality;
use image::{Rgb, RgbImage};
use tempfile::tempdir;

const ANNOTATIONS: &str = r##"[
    {
        "id": 1,
        "image_id": 10,
        "selector": "<svg><polygon points=\"0,0 10,0 10,10 0,10\"></polygon></svg>",
        "fields": {
            "title": { "en": { "values": ["Red Robe"] } },
            "tag": { "en": { "values": [{ "term_label": "robe" }, { "term_label": "red" }] } },
            "note": { "en": { "values": ["first line", "second line"] } },
            "line_color": { "en": { "values": ["#ff0000"] } }
        }
    },
    {
        "id": 2,
        "image_id": 10,
        "fields": {
            "title": { "en": { "values": ["Crown"] } }
        }
    },
    {
        "id": 3,
        "image_id": 10,
        "selector": "<svg><polygon points=\"40,40 50,40 50,50\"></polygon></svg>",
        "fields": {}
    }
]"##;

fn write_fixtures(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let image_path = dir.join("folio.png");
    RgbImage::from_pixel(20, 20, Rgb([200, 180, 40]))
        .save(&image_path)
        .expect("fixture image should be written");
    let annotations_path = dir.join("annotations.json");
    std::fs::write(&annotations_path, ANNOTATIONS).expect("fixture json should be written");
    (image_path, annotations_path)
}

#[test]
fn best_effort_render_keeps_every_annotation() {
    let dir = tempdir().expect("tempdir should be created");
    let (image_path, annotations_path) = write_fixtures(dir.path());

    let options = LocalRenderOptions {
        quality: CropQuality::BestEffort,
        ..LocalRenderOptions::default()
    };
    let report =
        render_local_table(&image_path, &annotations_path, &options).expect("render should work");

    assert_eq!(report.total_annotations, 3);
    assert_eq!(report.row_count, 3);
    assert_eq!(report.html.matches("data:image/jpeg;base64,").count(), 1);
    assert!(report.html.contains("first line<br>second line"));
    assert!(report.html.contains("robe<br>red"));
}

#[test]
fn strict_render_fails_on_region_outside_image() {
    let dir = tempdir().expect("tempdir should be created");
    let (image_path, annotations_path) = write_fixtures(dir.path());

    let err = render_local_table(
        &image_path,
        &annotations_path,
        &LocalRenderOptions::default(),
    )
    .expect_err("annotation 3 lies outside the image");
    assert!(matches!(err, AnnotationError::EmptyRegion));
}

#[test]
fn keyword_render_filters_annotations() {
    let dir = tempdir().expect("tempdir should be created");
    let (image_path, annotations_path) = write_fixtures(dir.path());

    let options = LocalRenderOptions {
        keyword: Some("ROBE".to_string()),
        ..LocalRenderOptions::default()
    };
    let report =
        render_local_table(&image_path, &annotations_path, &options).expect("render should work");

    assert_eq!(report.row_count, 1);
    assert!(report.html.contains("Red Robe"));
    assert!(!report.html.contains("Crown"));
}

#[test]
fn malformed_annotation_file_is_a_payload_error() {
    let dir = tempdir().expect("tempdir should be created");
    let (image_path, annotations_path) = write_fixtures(dir.path());
    std::fs::write(&annotations_path, r#"{"detail": "not a list"}"#).expect("overwrite json");

    let err = render_local_table(
        &image_path,
        &annotations_path,
        &LocalRenderOptions::default(),
    )
    .expect_err("object payload should fail");
    assert!(matches!(err, AnnotationError::Payload { .. }));
}
