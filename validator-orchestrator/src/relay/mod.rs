//! Relay client abstraction and wire formats
//!
//! The relay fronts the validator with two JSON endpoints:
//! - `POST /api/generate-ir`: `{cppCode, rustCode}` -> `{cppIR, rustIR}` or `{error}`
//! - `POST /api/validate`: `{cppIR, rustIR, cppFunctionName, rustFunctionName}`
//!   -> `{success, verifier_output, num_errors, error_message?}` or `{error}`
//!
//! Field names on these records are the compatibility surface and must not change.

mod http;

pub use http::HttpRelay;

use crate::model::{FunctionHints, IrPair, Submission, ValidationResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to the relay
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Message taken verbatim from the relay's `error` field
    #[error("{0}")]
    Reported(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed relay response: {0}")]
    Malformed(String),
}

/// `POST /api/generate-ir` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateIrRequest {
    #[serde(rename = "cppCode")]
    pub cpp_code: String,
    #[serde(rename = "rustCode")]
    pub rust_code: String,
}

impl GenerateIrRequest {
    pub fn into_submission(self) -> Submission {
        Submission::new(self.cpp_code, self.rust_code)
    }
}

impl From<&Submission> for GenerateIrRequest {
    fn from(submission: &Submission) -> Self {
        Self {
            cpp_code: submission.source_code.clone(),
            rust_code: submission.translated_code.clone(),
        }
    }
}

/// `POST /api/generate-ir` response body, either the IR pair or an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateIrResponse {
    #[serde(rename = "cppIR", default, skip_serializing_if = "Option::is_none")]
    pub cpp_ir: Option<String>,
    #[serde(rename = "rustIR", default, skip_serializing_if = "Option::is_none")]
    pub rust_ir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateIrResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Check the payload and pull out the IR pair
    pub fn into_ir_pair(self) -> Result<IrPair, RelayError> {
        if let Some(message) = reported(self.error) {
            return Err(RelayError::Reported(message));
        }
        match (self.cpp_ir, self.rust_ir) {
            (Some(source_ir), Some(target_ir)) => Ok(IrPair {
                source_ir,
                target_ir,
            }),
            _ => Err(RelayError::Malformed(
                "generate-ir response is missing cppIR or rustIR".to_string(),
            )),
        }
    }
}

impl From<IrPair> for GenerateIrResponse {
    fn from(ir: IrPair) -> Self {
        Self {
            cpp_ir: Some(ir.source_ir),
            rust_ir: Some(ir.target_ir),
            error: None,
        }
    }
}

/// `POST /api/validate` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    #[serde(rename = "cppIR")]
    pub cpp_ir: String,
    #[serde(rename = "rustIR")]
    pub rust_ir: String,
    /// Empty means "the only function defined in the module"
    #[serde(rename = "cppFunctionName", default)]
    pub cpp_function_name: String,
    #[serde(rename = "rustFunctionName", default)]
    pub rust_function_name: String,
}

impl ValidateRequest {
    pub fn new(ir: &IrPair, hints: &FunctionHints) -> Self {
        Self {
            cpp_ir: ir.source_ir.clone(),
            rust_ir: ir.target_ir.clone(),
            cpp_function_name: hints.source.clone().unwrap_or_default(),
            rust_function_name: hints.target.clone().unwrap_or_default(),
        }
    }

    pub fn ir_pair(&self) -> IrPair {
        IrPair {
            source_ir: self.cpp_ir.clone(),
            target_ir: self.rust_ir.clone(),
        }
    }

    pub fn hints(&self) -> FunctionHints {
        let hint = |name: &str| (!name.is_empty()).then(|| name.to_string());
        FunctionHints {
            source: hint(&self.cpp_function_name),
            target: hint(&self.rust_function_name),
        }
    }
}

/// `POST /api/validate` response body, either a result or an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_errors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateResponse {
    /// Check the payload and pull out the validation result
    pub fn into_result(self) -> Result<ValidationResult, RelayError> {
        if let Some(message) = reported(self.error) {
            return Err(RelayError::Reported(message));
        }
        let (Some(success), Some(verifier_output)) = (self.success, self.verifier_output) else {
            return Err(RelayError::Malformed(
                "validate response is missing success or verifier_output".to_string(),
            ));
        };
        Ok(ValidationResult {
            success,
            verifier_output,
            num_errors: self.num_errors.unwrap_or(if success { 0 } else { 1 }),
            error_message: self.error_message.filter(|m| !m.is_empty()),
        })
    }
}

impl From<ValidationResult> for ValidateResponse {
    fn from(result: ValidationResult) -> Self {
        Self {
            success: Some(result.success),
            verifier_output: Some(result.verifier_output),
            num_errors: Some(result.num_errors),
            error_message: result.error_message,
            error: None,
        }
    }
}

/// Body shape used when only the `error` field matters
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// An `error` field counts only when it carries text
fn reported(error: Option<String>) -> Option<String> {
    error.filter(|message| !message.trim().is_empty())
}

/// Health status of the relay
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

/// Trait for relay backends
#[async_trait]
pub trait RelayBackend: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Generate LLVM IR for both sides of a submission
    async fn generate_ir(&self, submission: &Submission) -> Result<IrPair, RelayError>;

    /// Check the two IR modules for semantic equivalence
    async fn validate(
        &self,
        ir: &IrPair,
        hints: &FunctionHints,
    ) -> Result<ValidationResult, RelayError>;

    /// Check whether the relay is reachable
    async fn health_check(&self) -> HealthStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ir_request_field_names() {
        let submission = Submission::new("int add(int a, int b);", "pub fn add() {}");
        let json = serde_json::to_value(GenerateIrRequest::from(&submission)).unwrap();
        assert_eq!(json["cppCode"], "int add(int a, int b);");
        assert_eq!(json["rustCode"], "pub fn add() {}");
    }

    #[test]
    fn test_generate_ir_error_payload() {
        let response: GenerateIrResponse =
            serde_json::from_str(r#"{"error": "failed to generate C++ IR"}"#).unwrap();
        match response.into_ir_pair() {
            Err(RelayError::Reported(message)) => assert_eq!(message, "failed to generate C++ IR"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_generate_ir_missing_side_is_malformed() {
        let response: GenerateIrResponse = serde_json::from_str(r#"{"cppIR": "define"}"#).unwrap();
        assert!(matches!(response.into_ir_pair(), Err(RelayError::Malformed(_))));
    }

    #[test]
    fn test_empty_error_field_is_ignored() {
        let response: GenerateIrResponse =
            serde_json::from_str(r#"{"cppIR": "a", "rustIR": "b", "error": ""}"#).unwrap();
        let ir = response.into_ir_pair().unwrap();
        assert_eq!(ir.source_ir, "a");
        assert_eq!(ir.target_ir, "b");
    }

    #[test]
    fn test_validate_request_sends_empty_hints() {
        let ir = IrPair {
            source_ir: "src".to_string(),
            target_ir: "tgt".to_string(),
        };
        let hints = FunctionHints {
            source: Some("_Z3addii".to_string()),
            target: None,
        };
        let json = serde_json::to_value(ValidateRequest::new(&ir, &hints)).unwrap();
        assert_eq!(json["cppIR"], "src");
        assert_eq!(json["rustIR"], "tgt");
        assert_eq!(json["cppFunctionName"], "_Z3addii");
        assert_eq!(json["rustFunctionName"], "");
    }

    #[test]
    fn test_validate_response_defaults_error_count() {
        let response: ValidateResponse =
            serde_json::from_str(r#"{"success": false, "verifier_output": "ERROR: Value mismatch"}"#)
                .unwrap();
        let result = response.into_result().unwrap();
        assert!(!result.success);
        assert_eq!(result.num_errors, 1);
        assert_eq!(result.error_message, None);
    }

    #[test]
    fn test_validate_response_wrong_type_is_rejected() {
        let parsed: Result<ValidateResponse, _> =
            serde_json::from_str(r#"{"success": "yes", "verifier_output": "x"}"#);
        assert!(parsed.is_err());
    }
}
