//! REST API for the validator front end

use crate::catalog::{self, Example};
use crate::model::ValidationResult;
use crate::relay::{
    GenerateIrRequest, GenerateIrResponse, RelayBackend, RelayError, ValidateRequest,
    ValidateResponse,
};
use crate::report::{format_report, present, FormattedReport, PresentedSection};
use crate::ValidatorConfig;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// API state
pub struct ApiState {
    pub relay: Arc<dyn RelayBackend>,
    pub config: ValidatorConfig,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub relay: String,
    pub relay_healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_latency_ms: Option<u64>,
}

/// Request to format raw verifier output
#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    pub verifier_output: String,
}

/// Formatted report plus the line views the front end draws
#[derive(Debug, Serialize)]
pub struct FormatResponse {
    #[serde(flatten)]
    pub report: FormattedReport,
    pub presented: Vec<PresentedSection>,
}

impl From<FormattedReport> for FormatResponse {
    fn from(report: FormattedReport) -> Self {
        let presented = present(&report);
        Self { report, presented }
    }
}

/// Catalog entry without the code
#[derive(Debug, Serialize)]
pub struct ExampleSummary {
    pub name: &'static str,
    pub summary: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Create the API router
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/generate-ir", post(generate_ir))
        .route("/api/validate", post(validate))
        .route("/api/format", post(format))
        .route("/api/examples", get(list_examples))
        .route("/api/examples/:name", get(get_example))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let relay = state.relay.health_check().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        relay: state.relay.name().to_string(),
        relay_healthy: relay.healthy,
        relay_latency_ms: relay.latency_ms,
    })
}

/// Generate IR for both programs through the relay
async fn generate_ir(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<GenerateIrRequest>,
) -> Result<Json<GenerateIrResponse>, (StatusCode, Json<GenerateIrResponse>)> {
    let submission = request.into_submission();
    let max = state.config.max_code_length;
    for (field, code) in [
        ("cppCode", &submission.source_code),
        ("rustCode", &submission.translated_code),
    ] {
        let len = code.chars().count();
        if len > max {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(GenerateIrResponse::error(format!(
                    "{} is {} characters, the limit is {}",
                    field, len, max
                ))),
            ));
        }
    }

    match state.relay.generate_ir(&submission).await {
        Ok(ir) => Ok(Json(ir.into())),
        Err(e) => {
            warn!(error = %e, "IR generation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GenerateIrResponse::error(e.to_string())),
            ))
        }
    }
}

/// Validate an IR pair through the relay
async fn validate(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, (StatusCode, Json<ValidateResponse>)> {
    let ir = request.ir_pair();
    let hints = request.hints();

    match state.relay.validate(&ir, &hints).await {
        Ok(result) => {
            debug!(success = result.success, num_errors = result.num_errors, "validated");
            Ok(Json(result.into()))
        }
        Err(e) => {
            warn!(error = %e, "validation failed");
            let body = match e {
                RelayError::Reported(message) => ValidateResponse {
                    error: Some(message),
                    ..Default::default()
                },
                RelayError::Status { status, body } => ValidateResponse {
                    error: Some(format!("HTTP {}: {}", status, body)),
                    ..Default::default()
                },
                other => {
                    let failure = ValidationResult::from_failure(other.to_string());
                    ValidateResponse {
                        error_message: None,
                        ..ValidateResponse::from(failure)
                    }
                }
            };
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(body)))
        }
    }
}

/// Split raw verifier output into sections
async fn format(Json(request): Json<FormatRequest>) -> Json<FormatResponse> {
    Json(format_report(&request.verifier_output).into())
}

async fn list_examples() -> Json<Vec<ExampleSummary>> {
    Json(
        catalog::all()
            .iter()
            .map(|e| ExampleSummary {
                name: e.name,
                summary: e.summary,
            })
            .collect(),
    )
}

async fn get_example(Path(name): Path<String>) -> Result<Json<Example>, ApiError> {
    catalog::find(&name)
        .copied()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("unknown example: {}", name)))
}
