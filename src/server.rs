use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    pipeline::Pipeline,
    types::{ClassificationOutcome, Image},
};

pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, msg: impl ToString) -> ApiError {
    (status, Json(json!({ "error": msg.to_string() })))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    // 413 once the body limit trips, 400 for malformed forms.
    let status = match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    api_error(status, e.body_text())
}

// ---------- Handlers ----------

async fn read_image(mut form: Multipart) -> Result<Image, ApiError> {
    while let Some(field) = form.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let image = Image::new(bytes.to_vec());
        return Ok(match filename {
            Some(name) => image.with_filename(name),
            None => image,
        });
    }
    Err(api_error(StatusCode::BAD_REQUEST, "missing multipart field 'image'"))
}

async fn predict(
    State(state): State<AppState>,
    form: Multipart,
) -> Result<Json<Value>, ApiError> {
    let image = read_image(form).await?;

    // Inference is CPU-bound; keep it off the async workers.
    let pipeline = state.pipeline.clone();
    let outcome: ClassificationOutcome =
        tokio::task::spawn_blocking(move || pipeline.evaluate(&image))
            .await
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    let mut body = serde_json::to_value(&outcome)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    body["message"] = Value::String(outcome.message());
    Ok(Json(body))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let settings = state.pipeline.settings();
    Json(json!({
        "status": "ok",
        "vocabulary_version": state.pipeline.gate().version(),
        "confidence_threshold": settings.confidence_threshold,
        "top_k": settings.top_k,
    }))
}

/// `POST /predict` (multipart field `image`) and `GET /health`.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(AppState { pipeline })
}
