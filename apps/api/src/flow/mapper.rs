//! Result Mapper: raw model text to a typed result, all-or-nothing.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{AppError, GENERATION_FAILED_MESSAGE};
use crate::llm_client::schema::Schema;
use crate::llm_client::strip_json_fences;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport or provider-side failure.
    Generation,
    /// Output was not JSON or did not satisfy the schema.
    MalformedResult,
}

/// Why a submission ended in `Failed`. Both kinds look the same to the user;
/// `detail` is for logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl FlowFailure {
    pub fn generation(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Generation,
            detail: detail.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::MalformedResult,
            detail: detail.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        GENERATION_FAILED_MESSAGE
    }
}

impl From<FlowFailure> for AppError {
    fn from(failure: FlowFailure) -> Self {
        match failure.kind {
            FailureKind::Generation => AppError::Generation(failure.detail),
            FailureKind::MalformedResult => AppError::MalformedResult(failure.detail),
        }
    }
}

/// Strips fences, parses, checks against `schema`, then deserializes.
/// Any failure is a `MalformedResult`; no partial value is returned.
pub fn map_result<T: DeserializeOwned>(raw: &str, schema: &Schema) -> Result<T, FlowFailure> {
    let text = strip_json_fences(raw);

    let value: Value = serde_json::from_str(text)
        .map_err(|e| FlowFailure::malformed(format!("response is not valid JSON: {e}")))?;

    schema
        .validate(&value)
        .map_err(|violation| FlowFailure::malformed(violation.to_string()))?;

    serde_json::from_value(value)
        .map_err(|e| FlowFailure::malformed(format!("response does not match the plan: {e}")))
}
