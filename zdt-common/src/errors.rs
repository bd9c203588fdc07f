//! Error types for ZDT subsystems.
//!
//! The taxonomy mirrors how failures propagate: probe and workflow errors
//! are recovered locally into counters, upgrade-step errors are logged and
//! skipped, and only setup errors abort a stream.

use thiserror::Error;

/// Errors from one request/assert cycle against the platform API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, TLS, ...).
    #[error("transport error for {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response arrived with an unexpected status code.
    #[error("unexpected status for {path}: got {got}, expected {expected}")]
    UnexpectedStatus { path: String, got: u16, expected: u16 },

    /// Response body did not contain the expected fragment.
    #[error("body mismatch for {path}: expected fragment {fragment:?}")]
    BodyMismatch { path: String, fragment: String },

    /// Response body could not be decoded.
    #[error("failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The platform rejected the request outright (e.g. unknown workflow).
    #[error("platform rejected request for {path}: {detail}")]
    Rejected { path: String, detail: String },
}

/// Errors from one upgrade step of the system under test.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// The upgrade command could not be spawned at all.
    #[error("failed to spawn upgrade command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The upgrade command ran but exited non-zero.
    #[error("upgrade command exited with {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    /// The configured upgrade command line was empty.
    #[error("upgrade command line is empty")]
    EmptyCommand,
}

/// Setup-time errors; the only class that aborts the run early.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Baseline target could not be provisioned.
    #[error("failed to provision baseline target '{name}': {source}")]
    BaselineTarget {
        name: String,
        #[source]
        source: ApiError,
    },

    /// Baseline component could not be provisioned.
    #[error("failed to provision baseline component '{component}' in '{target}': {source}")]
    BaselineComponent {
        target: String,
        component: String,
        #[source]
        source: ApiError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_messages_name_the_path() {
        let err = ApiError::UnexpectedStatus {
            path: "/v1/metadata".to_string(),
            got: 503,
            expected: 200,
        };
        let msg = err.to_string();
        assert!(msg.contains("/v1/metadata"));
        assert!(msg.contains("503"));
        assert!(msg.contains("200"));
    }

    #[test]
    fn setup_error_carries_source() {
        let err = SetupError::BaselineTarget {
            name: "zdt-base".to_string(),
            source: ApiError::Rejected {
                path: "/controlPlane/v1/targets".to_string(),
                detail: "duplicate".to_string(),
            },
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
