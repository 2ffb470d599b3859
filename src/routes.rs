use std::collections::HashMap;

use serde::Serialize;
use worker::{Context, Env, Request, Response, Result, RouteContext, Router};

use crate::client::{AnnotationApi, ClientConfig, HttpAnnotationApi};
use crate::error::ApiError;
use crate::models::{
    CollectionsResponse, DEFAULT_LANGUAGE, ImagesResponse, TABLE_CACHE_TTL_SECONDS,
};
use crate::pipeline::{self, TableFormat, TableRequest, TableSource};
use crate::table::CropQuality;

pub const CACHE_TTL_VAR: &str = "TABLE_CACHE_TTL_SECONDS";

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Option<ClientConfig>,
    pub config_error: Option<String>,
    pub cache_ttl_seconds: u32,
}

impl AppState {
    fn api(&self) -> Result<HttpAnnotationApi, ApiError> {
        match &self.config {
            Some(config) => Ok(HttpAnnotationApi::new(config.clone())),
            None => Err(ApiError::Internal(
                self.config_error
                    .clone()
                    .unwrap_or_else(|| "client is not configured".to_string()),
            )),
        }
    }
}

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let (config, config_error) = match ClientConfig::from_env(&env) {
        Ok(config) => (Some(config), None),
        Err(error) => (None, Some(error.message().to_string())),
    };
    let cache_ttl_seconds = env
        .var(CACHE_TTL_VAR)
        .ok()
        .and_then(|value| value.to_string().trim().parse::<u32>().ok())
        .unwrap_or(TABLE_CACHE_TTL_SECONDS);

    let state = AppState {
        config,
        config_error,
        cache_ttl_seconds,
    };

    Router::with_data(state)
        .get_async("/api/v1/collections", collections_route)
        .get_async("/api/v1/images", images_route)
        .get_async("/api/v1/annotation_set", annotation_set_route)
        .get_async("/api/v1/search", search_route)
        .run(req, env)
        .await
}

async fn collections_route(_req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let result = match ctx.data.api() {
        Ok(api) => collections_response(&api).await,
        Err(error) => Err(error),
    };
    match result {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn images_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let result = match (parse_query(&req), ctx.data.api()) {
        (Ok(query), Ok(api)) => images_response(&api, &query).await,
        (Err(error), _) | (_, Err(error)) => Err(error),
    };
    match result {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn annotation_set_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match table_response(&req, &ctx.data, parse_annotation_set_source).await {
        Ok(response) => Ok(response),
        Err(error) => error.into_response(),
    }
}

async fn search_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match table_response(&req, &ctx.data, parse_search_source).await {
        Ok(response) => Ok(response),
        Err(error) => error.into_response(),
    }
}

pub async fn collections_response<A: AnnotationApi>(
    api: &A,
) -> Result<CollectionsResponse, ApiError> {
    let items = api.list_collections().await?;
    Ok(CollectionsResponse { items })
}

/// Lists the images of one image set, in API order.
pub async fn images_response<A: AnnotationApi>(
    api: &A,
    query: &HashMap<String, String>,
) -> Result<ImagesResponse, ApiError> {
    let image_set = required_query(query, "image_set")?;
    let items = api.list_images(&image_set).await?;
    Ok(ImagesResponse { image_set, items })
}

async fn table_response(
    req: &Request,
    state: &AppState,
    parse_source: fn(&HashMap<String, String>) -> Result<TableSource, ApiError>,
) -> Result<Response, ApiError> {
    let query = parse_query(req)?;
    let request = parse_table_request(&query, parse_source)?;
    let force = parse_flag_query(&query, "force");
    let api = state.api()?;

    let (body, cache_status) = if force {
        pipeline::rebuild_table_with_status(&api, &request, state.cache_ttl_seconds).await?
    } else {
        pipeline::get_or_build_table_with_status(&api, &request, state.cache_ttl_seconds).await?
    };

    let mut response = Response::ok(body)?;
    response
        .headers_mut()
        .set("Content-Type", request.format.content_type())?;
    response
        .headers_mut()
        .set("X-Cache-Status", cache_status.as_header_value())?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn json_response<T>(payload: &T) -> Result<Response>
where
    T: Serialize,
{
    let mut response = Response::from_json(payload)?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn parse_query(req: &Request) -> Result<HashMap<String, String>, ApiError> {
    let url = req.url()?;
    let query = url
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Ok(query)
}

pub fn parse_table_request(
    query: &HashMap<String, String>,
    parse_source: fn(&HashMap<String, String>) -> Result<TableSource, ApiError>,
) -> Result<TableRequest, ApiError> {
    let source = parse_source(query)?;
    let language = query
        .get("lang")
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string();
    let quality = query
        .get("quality")
        .map(|value| value.parse::<CropQuality>())
        .transpose()
        .map_err(ApiError::BadRequest)?
        .unwrap_or_default();
    let format = query
        .get("format")
        .map(|value| value.parse::<TableFormat>())
        .transpose()
        .map_err(ApiError::BadRequest)?
        .unwrap_or_default();

    Ok(TableRequest {
        source,
        language,
        quality,
        format,
    })
}

pub fn parse_annotation_set_source(
    query: &HashMap<String, String>,
) -> Result<TableSource, ApiError> {
    Ok(TableSource::AnnotationSet {
        annotation_set_id: required_query(query, "id")?,
        image_id: required_query(query, "image")?,
    })
}

pub fn parse_search_source(
    query: &HashMap<String, String>,
) -> Result<TableSource, ApiError> {
    Ok(TableSource::Search {
        collection_id: required_query(query, "collection")?,
        keyword: required_query(query, "keyword")?,
    })
}

fn required_query(
    query: &HashMap<String, String>,
    name: &str,
) -> Result<String, ApiError> {
    query
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(format!("missing query parameter '{name}'")))
}

pub fn parse_flag_query(query: &HashMap<String, String>, name: &str) -> bool {
    query.get(name).is_some_and(|value| {
        let lowered = value.trim().to_ascii_lowercase();
        lowered == "true" || lowered == "1" || lowered == "yes"
    })
}
