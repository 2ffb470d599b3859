use std::str::FromStr;

use crate::cache;
use crate::client::AnnotationApi;
use crate::error::ApiError;
use crate::models::{SkippedBranch, TableResponse, TableRow};
use crate::render::{render_html_page, render_html_table};
use crate::table::{CropQuality, build_rows};
use crate::traversal::{load_annotation_set, search_collection};

pub const TABLE_CACHE_KEY_PREFIX: &str = "table:v1:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub const fn as_header_value(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableFormat {
    #[default]
    Html,
    Json,
}

impl TableFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json; charset=utf-8",
        }
    }
}

impl FromStr for TableFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(format!("invalid format '{other}', expected html or json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    AnnotationSet {
        annotation_set_id: String,
        image_id: String,
    },
    Search {
        collection_id: String,
        keyword: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub source: TableSource,
    pub language: String,
    pub quality: CropQuality,
    pub format: TableFormat,
}

impl TableRequest {
    pub fn cache_key(&self) -> String {
        let source = match &self.source {
            TableSource::AnnotationSet {
                annotation_set_id,
                image_id,
            } => format!("set:{annotation_set_id}:{image_id}"),
            TableSource::Search {
                collection_id,
                keyword,
            } => format!("search:{collection_id}:{}", keyword.to_lowercase()),
        };
        format!(
            "{TABLE_CACHE_KEY_PREFIX}{source}:{}:{}:{}",
            self.language,
            self.quality.as_str(),
            self.format.as_str()
        )
    }

    fn title(&self) -> String {
        match &self.source {
            TableSource::AnnotationSet {
                annotation_set_id,
                image_id,
            } => format!("Annotation set {annotation_set_id} on image {image_id}"),
            TableSource::Search {
                collection_id,
                keyword,
            } => format!(
                "Annotations matching \"{}\" in collection {collection_id}",
                keyword.to_lowercase()
            ),
        }
    }
}

pub async fn get_or_build_table_with_status<A>(
    api: &A,
    request: &TableRequest,
    ttl_seconds: u32,
) -> Result<(String, CacheStatus), ApiError>
where
    A: AnnotationApi + ?Sized,
{
    let cache_key = request.cache_key();
    if let Some(cached) = cache::get_text(&cache_key).await? {
        return Ok((cached, CacheStatus::Hit));
    }

    let body = build_table(api, request).await?;
    put_table_in_cache(request, &body, ttl_seconds).await?;
    Ok((body, CacheStatus::Miss))
}

pub async fn rebuild_table_with_status<A>(
    api: &A,
    request: &TableRequest,
    ttl_seconds: u32,
) -> Result<(String, CacheStatus), ApiError>
where
    A: AnnotationApi + ?Sized,
{
    let body = build_table(api, request).await?;
    put_table_in_cache(request, &body, ttl_seconds).await?;
    Ok((body, CacheStatus::Bypass))
}

async fn put_table_in_cache(
    request: &TableRequest,
    body: &str,
    ttl_seconds: u32,
) -> Result<(), ApiError> {
    cache::put_text(
        &request.cache_key(),
        body,
        ttl_seconds,
        request.format.content_type(),
    )
    .await
}

/// Runs the requested pipeline and renders its rows in the requested format.
pub async fn build_table<A>(api: &A, request: &TableRequest) -> Result<String, ApiError>
where
    A: AnnotationApi + ?Sized,
{
    let (rows, skipped) = match &request.source {
        TableSource::AnnotationSet {
            annotation_set_id,
            image_id,
        } => {
            let loaded = load_annotation_set(api, image_id, annotation_set_id).await?;
            let rows = build_rows(
                &loaded.annotations,
                &loaded.image,
                &request.language,
                request.quality,
            )?;
            (rows, Vec::new())
        }
        TableSource::Search {
            collection_id,
            keyword,
        } => {
            let outcome =
                search_collection(api, collection_id, keyword, &request.language).await?;
            let rows = build_rows(
                &outcome.annotations,
                &outcome.images,
                &request.language,
                request.quality,
            )?;
            (rows, outcome.skipped)
        }
    };

    tracing::info!(
        rows = rows.len(),
        skipped = skipped.len(),
        format = request.format.as_str(),
        "table built"
    );
    render_table(request, rows, skipped)
}

fn render_table(
    request: &TableRequest,
    rows: Vec<TableRow>,
    skipped: Vec<SkippedBranch>,
) -> Result<String, ApiError> {
    match request.format {
        TableFormat::Html => Ok(render_html_page(
            &request.title(),
            &render_html_table(&rows),
        )),
        TableFormat::Json => Ok(serde_json::to_string(&TableResponse {
            row_count: rows.len(),
            rows,
            skipped,
        })?),
    }
}
