//! Records exchanged between the orchestrator, the relay and the formatter

use serde::{Deserialize, Serialize};

/// A C++/Rust pair submitted for validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The original C++ code
    pub source_code: String,
    /// The Rust translation
    pub translated_code: String,
    /// Function to compare on the C++ side (empty lets the validator pick)
    #[serde(default)]
    pub source_function_name: Option<String>,
    /// Function to compare on the Rust side
    #[serde(default)]
    pub target_function_name: Option<String>,
}

impl Submission {
    pub fn new(source_code: impl Into<String>, translated_code: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            translated_code: translated_code.into(),
            source_function_name: None,
            target_function_name: None,
        }
    }

    pub fn with_source_function(mut self, name: impl Into<String>) -> Self {
        self.source_function_name = non_empty(name.into());
        self
    }

    pub fn with_target_function(mut self, name: impl Into<String>) -> Self {
        self.target_function_name = non_empty(name.into());
        self
    }

    /// The function-name hints forwarded to the validation step
    pub fn hints(&self) -> FunctionHints {
        FunctionHints {
            source: self.source_function_name.clone(),
            target: self.target_function_name.clone(),
        }
    }
}

fn non_empty(name: String) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Optional function names that narrow validation to one function per module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionHints {
    pub source: Option<String>,
    pub target: Option<String>,
}

/// LLVM IR generated for both sides of a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrPair {
    pub source_ir: String,
    pub target_ir: String,
}

/// Outcome reported by the validator for one IR pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub verifier_output: String,
    pub num_errors: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationResult {
    /// Result carrying a failure message in place of a verifier report
    pub fn from_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            verifier_output: message.clone(),
            num_errors: 1,
            error_message: Some(message),
        }
    }
}
