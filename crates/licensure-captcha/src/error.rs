//! Error types for CAPTCHA solving.

use std::time::Duration;
use thiserror::Error;

/// Errors that can end a solve request.
#[derive(Error, Debug)]
pub enum CaptchaError {
    /// No API key configured for the solving service
    #[error("CAPSOLVER_API_KEY not configured")]
    NotConfigured,

    /// Network failure talking to the solving service
    #[error("transport error during {step}: {source}")]
    Transport {
        /// Protocol step (`create_task` or `get_task_result`)
        step: &'static str,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// The service rejected the request; code and description are verbatim
    #[error("solving service error: {code} - {description}")]
    Vendor {
        /// Vendor error code
        code: String,
        /// Vendor error description
        description: String,
    },

    /// The service reported `ready` without a token
    #[error("solving service returned an empty token for task {task_id}")]
    EmptyToken {
        /// Task identifier
        task_id: String,
    },

    /// The task was still processing when the deadline passed
    #[error("timed out after {waited:?} waiting for task {task_id}")]
    TimedOut {
        /// Task identifier
        task_id: String,
        /// Time spent since task creation
        waited: Duration,
    },

    /// The caller cancelled the solve
    #[error("CAPTCHA solve cancelled")]
    Cancelled,

    /// A response did not match the protocol
    #[error("unexpected response during {step}: {message}")]
    Parse {
        /// Protocol step
        step: &'static str,
        /// What was wrong
        message: String,
    },
}

/// Result type for CAPTCHA operations.
pub type Result<T> = std::result::Result<T, CaptchaError>;
