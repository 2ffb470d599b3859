use std::fmt::{Debug, Formatter};

use image::RgbImage;
use serde::de::DeserializeOwned;
use url::Url;
use worker::{Env, Fetch, Headers, Method, Request, RequestInit};

use crate::error::{AnnotationError, ApiError};
use crate::models::{
    Annotation, AnnotationSetRef, Collection, IiifInfo, ImageRecord, ImageSetRef,
};

pub const API_URL_VAR: &str = "IAW_API_URL";
pub const API_TOKEN_SECRET: &str = "IAW_API_TOKEN";

/// Connection settings for the IAW REST API.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub token: String,
}

impl ClientConfig {
    pub fn new(api_url: &str, token: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            api_url: Url::parse(api_url)?,
            token: token.into(),
        })
    }

    pub fn from_env(env: &Env) -> Result<Self, ApiError> {
        let api_url = env
            .var(API_URL_VAR)
            .map(|value| value.to_string())
            .map_err(|_| ApiError::Internal(format!("{API_URL_VAR} is not configured")))?;
        let token = env
            .secret(API_TOKEN_SECRET)
            .map(|value| value.to_string())
            .map_err(|_| ApiError::Internal(format!("{API_TOKEN_SECRET} is not configured")))?;

        Self::new(&api_url, token)
            .map_err(|error| ApiError::Internal(format!("invalid {API_URL_VAR}: {error}")))
    }

    /// Absolute URL of an API path such as `/image-sets/7/images`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Debug for ClientConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

pub fn iiif_info_url(iiif_base_url: &str) -> String {
    format!("{}/info.json", iiif_base_url.trim_end_matches('/'))
}

pub fn iiif_full_image_url(iiif_base_url: &str, width: u32, height: u32) -> String {
    format!(
        "{}/full/{width},{height}/0/default.jpg",
        iiif_base_url.trim_end_matches('/')
    )
}

/// Read access to the IAW hierarchy and the IIIF image server.
#[allow(async_fn_in_trait)]
pub trait AnnotationApi {
    async fn list_collections(&self) -> Result<Vec<Collection>, AnnotationError>;

    async fn list_image_sets(&self, collection_id: &str)
    -> Result<Vec<ImageSetRef>, AnnotationError>;

    async fn list_images(&self, image_set_id: &str) -> Result<Vec<ImageRecord>, AnnotationError>;

    async fn list_annotation_sets(
        &self,
        image_set_id: &str,
    ) -> Result<Vec<AnnotationSetRef>, AnnotationError>;

    async fn list_annotations(
        &self,
        annotation_set_id: &str,
    ) -> Result<Vec<Annotation>, AnnotationError>;

    async fn get_image(&self, image_id: &str) -> Result<ImageRecord, AnnotationError>;

    async fn get_image_info(&self, iiif_base_url: &str) -> Result<IiifInfo, AnnotationError>;

    async fn fetch_full_image(
        &self,
        iiif_base_url: &str,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, AnnotationError>;
}

/// `AnnotationApi` over the Workers fetch API.
#[derive(Debug, Clone)]
pub struct HttpAnnotationApi {
    config: ClientConfig,
}

impl HttpAnnotationApi {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    async fn get_api_json<T>(&self, path: &str) -> Result<T, AnnotationError>
    where
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        let headers = Headers::new();
        headers
            .set("Authorization", &format!("Bearer {}", self.config.token))
            .map_err(|error| AnnotationError::transport(&url, error))?;
        headers
            .set("Accept", "application/json")
            .map_err(|error| AnnotationError::transport(&url, error))?;

        let body = get_bytes(&url, Some(headers)).await?;
        decode_json(&url, &body)
    }
}

impl AnnotationApi for HttpAnnotationApi {
    async fn list_collections(&self) -> Result<Vec<Collection>, AnnotationError> {
        self.get_api_json("/collections").await
    }

    async fn list_image_sets(
        &self,
        collection_id: &str,
    ) -> Result<Vec<ImageSetRef>, AnnotationError> {
        self.get_api_json(&format!(
            "/collections/{}/image-sets",
            urlencoding::encode(collection_id)
        ))
        .await
    }

    async fn list_images(&self, image_set_id: &str) -> Result<Vec<ImageRecord>, AnnotationError> {
        self.get_api_json(&format!(
            "/image-sets/{}/images",
            urlencoding::encode(image_set_id)
        ))
        .await
    }

    async fn list_annotation_sets(
        &self,
        image_set_id: &str,
    ) -> Result<Vec<AnnotationSetRef>, AnnotationError> {
        self.get_api_json(&format!(
            "/image-sets/{}/annotation-sets",
            urlencoding::encode(image_set_id)
        ))
        .await
    }

    async fn list_annotations(
        &self,
        annotation_set_id: &str,
    ) -> Result<Vec<Annotation>, AnnotationError> {
        self.get_api_json(&format!(
            "/annotation-sets/{}/annotations",
            urlencoding::encode(annotation_set_id)
        ))
        .await
    }

    async fn get_image(&self, image_id: &str) -> Result<ImageRecord, AnnotationError> {
        self.get_api_json(&format!("/images/{}", urlencoding::encode(image_id)))
            .await
    }

    async fn get_image_info(&self, iiif_base_url: &str) -> Result<IiifInfo, AnnotationError> {
        let url = iiif_info_url(iiif_base_url);
        let body = get_bytes(&url, None).await?;
        decode_json(&url, &body)
    }

    async fn fetch_full_image(
        &self,
        iiif_base_url: &str,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, AnnotationError> {
        let url = iiif_full_image_url(iiif_base_url, width, height);
        let body = get_bytes(&url, None).await?;
        if body.is_empty() {
            return Err(AnnotationError::Payload {
                url,
                reason: "image body is empty".to_string(),
            });
        }
        Ok(image::load_from_memory(&body)?.to_rgb8())
    }
}

async fn get_bytes(url: &str, headers: Option<Headers>) -> Result<Vec<u8>, AnnotationError> {
    let mut init = RequestInit::new();
    init.with_method(Method::Get);
    if let Some(headers) = headers {
        init.with_headers(headers);
    }

    let request = Request::new_with_init(url, &init)
        .map_err(|error| AnnotationError::transport(url, error))?;
    let mut response = Fetch::Request(request)
        .send()
        .await
        .map_err(|error| AnnotationError::transport(url, error))?;

    let status = response.status_code();
    tracing::info!(%url, status, "GET");
    if !(200..300).contains(&status) {
        return Err(AnnotationError::status(url, status));
    }

    response
        .bytes()
        .await
        .map_err(|error| AnnotationError::transport(url, error))
}

fn decode_json<T>(url: &str, body: &[u8]) -> Result<T, AnnotationError>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|error| AnnotationError::Payload {
        url: url.to_string(),
        reason: error.to_string(),
    })
}
