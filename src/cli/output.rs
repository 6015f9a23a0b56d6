//! CLI output: error mapping and the result of a routed command.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Coverage(violation) => format!(
            "Internal error: {} (no invalidation was submitted for this plan)",
            violation
        ),
        other => other.to_string(),
    }
}

/// Rendered output of a command plus whether the run recorded failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub failed: bool,
}

impl CommandOutput {
    pub fn ok(text: String) -> Self {
        Self {
            text,
            failed: false,
        }
    }
}
