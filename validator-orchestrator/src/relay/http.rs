//! HTTP relay client

use super::{
    ErrorBody, GenerateIrRequest, GenerateIrResponse, HealthStatus, RelayBackend, RelayError,
    ValidateRequest, ValidateResponse,
};
use crate::model::{FunctionHints, IrPair, Submission, ValidationResult};
use crate::ValidatorConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Relay reached over HTTP
pub struct HttpRelay {
    client: Client,
    base_url: String,
    name: String,
}

impl HttpRelay {
    /// Create a relay client with no client-side timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, RelayError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a relay client, optionally bounding every request
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RelayError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            name: format!("relay:{}", base_url),
            base_url,
        })
    }

    pub fn from_config(config: &ValidatorConfig) -> Result<Self, RelayError> {
        Self::with_timeout(
            &config.relay_url,
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, RelayError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!(
            url = %url,
            status = status.as_u16(),
            body_len = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Relay responded"
        );

        if !status.is_success() {
            // Prefer the relay's own message over the bare status line
            let reported = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .filter(|message| !message.trim().is_empty());
            return Err(match reported {
                Some(message) => RelayError::Reported(message),
                None => RelayError::Status {
                    status: status.as_u16(),
                    body: text,
                },
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl RelayBackend for HttpRelay {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_ir(&self, submission: &Submission) -> Result<IrPair, RelayError> {
        let request = GenerateIrRequest::from(submission);
        let response: GenerateIrResponse = self.post_json("/api/generate-ir", &request).await?;
        response.into_ir_pair()
    }

    async fn validate(
        &self,
        ir: &IrPair,
        hints: &FunctionHints,
    ) -> Result<ValidationResult, RelayError> {
        let request = ValidateRequest::new(ir, hints);
        let response: ValidateResponse = self.post_json("/api/validate", &request).await?;
        response.into_result()
    }

    async fn health_check(&self) -> HealthStatus {
        let start = Instant::now();

        // The relay only routes the two API paths, so any HTTP answer means it is up
        match self.client.get(&self.base_url).send().await {
            Ok(_) => HealthStatus {
                healthy: true,
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => HealthStatus {
                healthy: false,
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_relay(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_relay_creation() {
        let relay = HttpRelay::new("http://localhost:3001/").unwrap();
        assert_eq!(relay.base_url(), "http://localhost:3001");
        assert!(relay.name().contains("relay"));
    }

    #[tokio::test]
    async fn test_generate_ir_round_trip() {
        let router = Router::new().route(
            "/api/generate-ir",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "cppIR": format!("; from {}", body["cppCode"].as_str().unwrap_or("")),
                    "rustIR": format!("; from {}", body["rustCode"].as_str().unwrap_or("")),
                }))
            }),
        );
        let relay = HttpRelay::new(spawn_relay(router).await).unwrap();

        let ir = relay
            .generate_ir(&Submission::new("int x;", "let x;"))
            .await
            .unwrap();
        assert_eq!(ir.source_ir, "; from int x;");
        assert_eq!(ir.target_ir, "; from let x;");
    }

    #[tokio::test]
    async fn test_non_success_status_uses_reported_error() {
        let router = Router::new().route(
            "/api/validate",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "function not found"})),
                )
            }),
        );
        let relay = HttpRelay::new(spawn_relay(router).await).unwrap();

        let err = relay
            .validate(&IrPair::default(), &FunctionHints::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Reported(ref m) if m == "function not found"));
    }

    #[tokio::test]
    async fn test_non_success_status_without_error_field() {
        let router = Router::new().route(
            "/api/validate",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let relay = HttpRelay::new(spawn_relay(router).await).unwrap();

        let err = relay
            .validate(&IrPair::default(), &FunctionHints::default())
            .await
            .unwrap_err();
        match err {
            RelayError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validate_forwards_hints() {
        let router = Router::new().route(
            "/api/validate",
            post(|Json(body): Json<Value>| async move {
                let ok = body["cppFunctionName"] == "_Z3addii" && body["rustFunctionName"] == "";
                Json(json!({
                    "success": ok,
                    "verifier_output": "Transformation seems to be correct!",
                    "num_errors": 0,
                }))
            }),
        );
        let relay = HttpRelay::new(spawn_relay(router).await).unwrap();
        let hints = FunctionHints {
            source: Some("_Z3addii".to_string()),
            target: None,
        };

        let result = relay.validate(&IrPair::default(), &hints).await.unwrap();
        assert!(result.success);
        assert_eq!(result.num_errors, 0);
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_http_error() {
        // Port 9 (discard) is not expected to run an HTTP server
        let relay = HttpRelay::new("http://127.0.0.1:9").unwrap();
        let err = relay
            .generate_ir(&Submission::new("a", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::HttpError(_)));
        assert!(!relay.health_check().await.healthy);
    }
}
