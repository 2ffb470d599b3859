use std::collections::HashMap;

use image::RgbImage;

use crate::client::AnnotationApi;
use crate::error::AnnotationError;
use crate::filter::matches_keyword;
use crate::models::{Annotation, BranchLevel, SkippedBranch};

/// Resolves an image id to its full-resolution raster via the IIIF server.
pub async fn fetch_image<A>(api: &A, image_id: &str) -> Result<RgbImage, AnnotationError>
where
    A: AnnotationApi + ?Sized,
{
    let record = api.get_image(image_id).await?;
    let info = api.get_image_info(&record.iiif_base_url).await?;
    api.fetch_full_image(&record.iiif_base_url, info.width, info.height)
        .await
}

#[derive(Debug, Clone)]
pub struct AnnotationSetTable {
    pub image: RgbImage,
    pub annotations: Vec<Annotation>,
}

/// One image and every annotation of one annotation set. Any failure aborts.
pub async fn load_annotation_set<A>(
    api: &A,
    image_id: &str,
    annotation_set_id: &str,
) -> Result<AnnotationSetTable, AnnotationError>
where
    A: AnnotationApi + ?Sized,
{
    let image = fetch_image(api, image_id).await?;
    let annotations = api.list_annotations(annotation_set_id).await?;
    tracing::debug!(
        annotation_set = annotation_set_id,
        count = annotations.len(),
        "loaded annotation set"
    );

    Ok(AnnotationSetTable { image, annotations })
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Matches in traversal order.
    pub annotations: Vec<Annotation>,
    /// Full images keyed by image id, one per distinct image among matches.
    pub images: HashMap<String, RgbImage>,
    pub skipped: Vec<SkippedBranch>,
}

impl SearchOutcome {
    fn skip(&mut self, level: BranchLevel, id: &str, error: &AnnotationError) {
        tracing::warn!(?level, id, %error, "skipping branch");
        self.skipped.push(SkippedBranch {
            level,
            id: id.to_string(),
            reason: error.to_string(),
        });
    }
}

/// Walks image sets, annotation sets and annotations of a collection depth
/// first and keeps the annotations whose title or tags contain `keyword`.
///
/// A failed listing below the collection level skips that branch only.
pub async fn search_collection<A>(
    api: &A,
    collection_id: &str,
    keyword: &str,
    language: &str,
) -> Result<SearchOutcome, AnnotationError>
where
    A: AnnotationApi + ?Sized,
{
    let mut outcome = SearchOutcome::default();
    let image_sets = api.list_image_sets(collection_id).await?;

    for image_set in &image_sets {
        let annotation_sets = match api.list_annotation_sets(&image_set.id).await {
            Ok(annotation_sets) => annotation_sets,
            Err(error) => {
                outcome.skip(BranchLevel::ImageSet, &image_set.id, &error);
                continue;
            }
        };

        for annotation_set in &annotation_sets {
            let annotations = match api.list_annotations(&annotation_set.id).await {
                Ok(annotations) => annotations,
                Err(error) => {
                    outcome.skip(BranchLevel::AnnotationSet, &annotation_set.id, &error);
                    continue;
                }
            };

            let before = outcome.annotations.len();
            outcome.annotations.extend(
                annotations
                    .into_iter()
                    .filter(|annotation| matches_keyword(annotation, keyword, language)),
            );
            tracing::debug!(
                image_set = %image_set.id,
                annotation_set = %annotation_set.id,
                matches = outcome.annotations.len() - before,
                "searched annotation set"
            );

            for index in before..outcome.annotations.len() {
                let image_id = outcome.annotations[index].image_id.clone();
                if outcome.images.contains_key(&image_id)
                    || outcome
                        .skipped
                        .iter()
                        .any(|skipped| skipped.level == BranchLevel::Image && skipped.id == image_id)
                {
                    continue;
                }

                match fetch_image(api, &image_id).await {
                    Ok(image) => {
                        outcome.images.insert(image_id, image);
                    }
                    Err(error) => outcome.skip(BranchLevel::Image, &image_id, &error),
                }
            }
        }
    }

    Ok(outcome)
}
