use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AssistantError;
use crate::handlers::RecipeHandler;
use crate::models::{FoodImage, Mode, RecipeRequest, SessionState};
use crate::services::imaging;

/// Body of `POST /api/generate`. The client carries `state` between calls.
#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub state: SessionState,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub display_text: String,
    pub audio_url: Option<String>,
    pub state: SessionState,
    pub generated_at: DateTime<Utc>,
}

/// Error body. `state` is the session state the client sent, untouched.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
    pub state: SessionState,
}

/// Body of `POST /api/classify`
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub has_image: bool,
    #[serde(default)]
    pub mode: Option<Mode>,
}

/// Accepts raw base64 or a full `data:<mime>;base64,` URL from a browser file reader.
/// The bytes must decode as a picture before anything is sent to the vision model.
fn decode_image(encoded: &str) -> Result<FoodImage, AssistantError> {
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };

    let image = general_purpose::STANDARD
        .decode(payload.trim())
        .map(FoodImage::new)
        .map_err(|e| AssistantError::InvalidRequest(format!("image is not valid base64: {}", e)))?;

    let (width, height) = imaging::check_decodable(&image).map_err(|e| {
        log::warn!("⚠️ Rejecting upload: {:#}", e);
        AssistantError::InvalidRequest(format!("unsupported or corrupt image: {:#}", e))
    })?;
    log::debug!("📸 Upload accepted: {}x{}, {} bytes", width, height, image.bytes.len());

    Ok(image)
}

/// Run one action from an API payload.
pub async fn handle_generate(
    handler: &RecipeHandler,
    payload: GenerateRequest,
) -> Result<GenerateResponse, ErrorResponse> {
    let GenerateRequest {
        text,
        image_base64,
        mode,
        state,
    } = payload;

    let image = match image_base64.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(encoded) => match decode_image(encoded) {
            Ok(image) => Some(image),
            Err(e) => return Err(error_response(e, state)),
        },
        None => None,
    };

    let request = RecipeRequest {
        raw_text: text,
        image,
        mode,
    };

    match handler.run(request, &state).await {
        Ok(result) => Ok(GenerateResponse {
            display_text: result.display_text,
            audio_url: result
                .audio
                .and_then(|audio| audio.file_name())
                .map(|name| format!("/audio/{}", name)),
            state: result.updated_state,
            generated_at: Utc::now(),
        }),
        Err(e) => Err(error_response(e, state)),
    }
}

fn error_response(e: AssistantError, state: SessionState) -> ErrorResponse {
    ErrorResponse {
        error: e.to_string(),
        kind: e.kind(),
        state,
    }
}

/// Best effort: pull `state` out of a body that failed to parse as a whole.
fn salvage_state(body: &str) -> SessionState {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("state").cloned())
        .and_then(|state| serde_json::from_value(state).ok())
        .unwrap_or_default()
}

// Axum integration (optional - requires axum dependency)
#[cfg(feature = "web-server")]
pub mod server {
    use super::*;
    use axum::{
        extract::{DefaultBodyLimit, State},
        http::StatusCode,
        response::{Html, IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower_http::services::ServeDir;

    use crate::handlers::classifier;

    const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

    pub struct AppState {
        pub recipe_handler: Arc<RecipeHandler>,
    }

    pub fn create_router(recipe_handler: Arc<RecipeHandler>, audio_dir: PathBuf) -> Router {
        let state = Arc::new(AppState { recipe_handler });

        Router::new()
            .route("/", get(index_page))
            .route("/health", get(health_check))
            .route("/api/modes", get(modes_handler))
            .route("/api/classify", post(classify_handler))
            .route("/api/generate", post(generate_handler))
            .nest_service("/audio", ServeDir::new(audio_dir))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .with_state(state)
    }

    async fn modes_handler() -> Json<Vec<&'static str>> {
        Json(Mode::ALL.iter().map(|mode| mode.label()).collect())
    }

    async fn classify_handler(Json(request): Json<ClassifyRequest>) -> impl IntoResponse {
        Json(classifier::classify(request.has_image, request.mode))
    }

    async fn generate_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
        let payload: GenerateRequest = match serde_json::from_str(&body) {
            Ok(p) => p,
            Err(e) => {
                log::error!("❌ Failed to parse generate payload: {}", e);
                let error = error_response(
                    AssistantError::InvalidRequest(format!("malformed request body: {}", e)),
                    salvage_state(&body),
                );
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(error)).into_response();
            }
        };

        match handle_generate(&state.recipe_handler, payload).await {
            Ok(response) => (StatusCode::OK, Json(response)).into_response(),
            Err(error) => {
                let status = match error.kind {
                    "invalid_request" => StatusCode::BAD_REQUEST,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, Json(error)).into_response()
            }
        }
    }

    async fn index_page() -> Html<&'static str> {
        Html(include_str!("../static/index.html"))
    }

    async fn health_check() -> &'static str {
        "OK"
    }
}
