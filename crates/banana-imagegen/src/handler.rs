//! Axum route handlers for the image generation and prompt optimization endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing,
};
use banana_core::HttpError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;

use crate::{
    dispatch::Dispatcher,
    result::{ErrorKind, Failure, GeneratedImage, GenerationResult},
    types::{GenerationInput, ReferenceImage},
};

/// Up to 14 base64 reference images fit comfortably
const MAX_BODY_BYTES: usize = 128 * 1024 * 1024;

/// Body of `POST /v1/images/generations`
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    /// Falls back to the first configured mode
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub reference_images: Vec<WireReferenceImage>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub skip_optimization: bool,
}

/// Reference image as sent over the wire
#[derive(Debug, Deserialize)]
pub struct WireReferenceImage {
    /// Base64-encoded image bytes
    pub data: String,
    #[serde(default = "default_reference_mime_type")]
    pub mime_type: String,
}

fn default_reference_mime_type() -> String {
    "image/png".to_string()
}

/// Body of `POST /v1/prompts/optimize`
#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub prompt: String,
}

impl ImageRequest {
    /// Decode reference images into a pipeline input, resolving a missing
    /// mode to `default_mode`
    ///
    /// # Errors
    ///
    /// Returns a `Validation` failure if a reference image is not valid base64,
    /// or a `Configuration` failure if no mode is named and there is no default
    pub fn into_input(self, default_mode: Option<&str>) -> Result<GenerationInput, Failure> {
        let reference_images = self
            .reference_images
            .into_iter()
            .enumerate()
            .map(|(i, reference)| {
                let encoded = reference
                    .data
                    .split_once(";base64,")
                    .map_or(reference.data.as_str(), |(_, data)| data);

                STANDARD
                    .decode(encoded.trim())
                    .map(|data| ReferenceImage::new(data, reference.mime_type))
                    .map_err(|e| Failure::validation(format!("reference image {} is not valid base64: {e}", i + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let Some(mode) = self.mode.or_else(|| default_mode.map(str::to_string)) else {
            return Err(Failure::new(
                ErrorKind::Configuration,
                "no image generation modes are configured",
            ));
        };

        Ok(GenerationInput {
            prompt: self.prompt,
            mode,
            reference_images,
            aspect_ratio: self.aspect_ratio,
            resolution: self.resolution,
            temperature: self.temperature,
            skip_optimization: self.skip_optimization,
        })
    }
}

/// Create the endpoint router for image generation
pub fn endpoint_router() -> Router<Arc<Dispatcher>> {
    Router::new()
        .route("/v1/images/generations", routing::post(generate))
        .route("/v1/prompts/optimize", routing::post(optimize))
        .route("/health", routing::get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Handle `POST /v1/images/generations`
async fn generate(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Result<Json<ImageRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    tracing::debug!(
        mode = request.mode.as_deref().unwrap_or_default(),
        references = request.reference_images.len(),
        "image generation handler called"
    );

    let input = match request.into_input(dispatcher.default_mode()) {
        Ok(input) => input,
        Err(failure) => return failure_response(&failure),
    };

    match dispatcher.generate(input).await {
        GenerationResult::Success(image) => image_response(image),
        GenerationResult::Failure(failure) => failure_response(&failure),
    }
}

/// Handle `POST /v1/prompts/optimize`
async fn optimize(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    tracing::debug!(prompt_len = request.prompt.len(), "prompt optimization handler called");

    match dispatcher.optimize_prompt(&request.prompt).await {
        Ok(optimized) => (StatusCode::OK, Json(optimized)).into_response(),
        Err(failure) => failure_response(&failure),
    }
}

/// Handle `GET /health`
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn image_response(image: GeneratedImage) -> Response {
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(image.format.mime_type())),
        (HeaderName::from_static("x-image-width"), HeaderValue::from(image.width)),
        (HeaderName::from_static("x-image-height"), HeaderValue::from(image.height)),
    ];

    (StatusCode::OK, headers, image.bytes).into_response()
}

/// Malformed or incomplete JSON bodies get the same envelope as any other validation failure
fn rejection_response(rejection: &JsonRejection) -> Response {
    tracing::debug!(status = %rejection.status(), "request body rejected");
    failure_response(&Failure::validation(rejection.body_text()))
}

fn failure_response(failure: &Failure) -> Response {
    let body = serde_json::json!({
        "error": {
            "kind": failure.error_type(),
            "message": failure.client_message(),
            "retryable": failure.retryable,
        }
    });

    (failure.status_code(), Json(body)).into_response()
}
