//! HTTP surface: one prediction route, a liveness probe, and CORS for the
//! browser frontend.

use crate::config::{ConfigError, ServeConfig};
use crate::features::InputRecord;
use crate::predict::{PredictError, PredictionResult, PredictionService};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to bind or serve on {address}: {source}")]
    Io {
        address: String,
        source: std::io::Error,
    },
}

/// A request failure rendered as `{"detail": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        let status = match &err {
            PredictError::ShapeMismatch { .. } => {
                warn!("Rejected prediction request: {err}");
                StatusCode::BAD_REQUEST
            }
            PredictError::Inference(_) => {
                error!("Inference failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// CORS policy for the given origins. Credentials are allowed, so methods and
/// headers are mirrored from the preflight request instead of using a wildcard.
pub fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

pub fn router(service: PredictionService, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(cors)
        .with_state(service)
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn predict(
    State(service): State<PredictionService>,
    Json(record): Json<InputRecord>,
) -> Result<Json<PredictionResult>, ApiError> {
    let result = service.predict(&record)?;
    Ok(Json(result))
}

/// Binds the configured address and serves until the process is stopped.
pub async fn serve(config: &ServeConfig, service: PredictionService) -> Result<(), ServeError> {
    let cors = cors_layer(config.origin_headers()?);
    let app = router(service, cors);

    let address = config.bind_address();
    let io_error = |source| ServeError::Io {
        address: address.clone(),
        source,
    };
    let listener = tokio::net::TcpListener::bind(address.as_str())
        .await
        .map_err(io_error)?;
    info!("HeartPredict API listening on http://{address}");
    axum::serve(listener, app).await.map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InferenceError;

    #[test]
    fn shape_mismatch_maps_to_bad_request() {
        let err = ApiError::from(PredictError::ShapeMismatch {
            actual: 14,
            expected: 13,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "Input vector has 14 features but model expects 13");
    }

    #[test]
    fn inference_failure_maps_to_internal_error() {
        let err = ApiError::from(PredictError::Inference(InferenceError::NonFiniteDecision));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn default_origins_parse_as_headers() {
        let origins = ServeConfig::default().origin_headers().unwrap();
        assert_eq!(origins[0], "http://localhost:5173");
        assert_eq!(origins[1], "http://127.0.0.1:5173");
    }
}
