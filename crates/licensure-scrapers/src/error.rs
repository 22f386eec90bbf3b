//! Error types for license lookups.
//!
//! Every variant names the jurisdiction and the step that failed so an
//! operator can tell a Florida detail-page timeout from a Texas CAPTCHA
//! rejection without reading logs.

use licensure_captcha::CaptchaError;
use licensure_core::JurisdictionCode;
use licensure_session::SessionError;
use thiserror::Error;

/// Errors that can end a lookup.
///
/// "No match" is never an error; it is a `found=false` record.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Could not build an HTTP session
    #[error("{state}: session setup failed: {source}")]
    Session {
        /// Jurisdiction code
        state: String,
        /// Underlying error
        #[source]
        source: SessionError,
    },

    /// Network or TLS failure
    #[error("{state}: {step}: request failed: {source}")]
    Transport {
        /// Jurisdiction code
        state: String,
        /// Lookup step
        step: &'static str,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// The jurisdiction answered with a non-200 status
    #[error("{state}: {step}: HTTP {status}: {body}")]
    Http {
        /// Jurisdiction code
        state: String,
        /// Lookup step
        step: &'static str,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The jurisdiction's API reported an error envelope
    #[error("{state}: {step}: API error: {message}")]
    Api {
        /// Jurisdiction code
        state: String,
        /// Lookup step
        step: &'static str,
        /// Vendor-supplied message
        message: String,
    },

    /// A page did not have the shape the flow depends on
    #[error("{state}: {step}: {message}")]
    Parse {
        /// Jurisdiction code
        state: String,
        /// Lookup step
        step: &'static str,
        /// What was missing or malformed
        message: String,
    },

    /// CAPTCHA solving failed or timed out
    #[error("{state}: CAPTCHA solve failed: {source}")]
    Captcha {
        /// Jurisdiction code
        state: String,
        /// Underlying error
        #[source]
        source: CaptchaError,
    },

    /// The caller cancelled the lookup
    #[error("{state}: {step}: lookup cancelled")]
    Cancelled {
        /// Jurisdiction code
        state: String,
        /// Step in progress when cancelled
        step: &'static str,
    },

    /// The lookup's deadline passed
    #[error("{state}: {step}: lookup deadline exceeded")]
    DeadlineExceeded {
        /// Jurisdiction code
        state: String,
        /// Step in progress when the deadline passed
        step: &'static str,
    },
}

impl LookupError {
    /// Build a `map_err` adapter for transport failures.
    pub(crate) fn transport(
        state: &JurisdictionCode,
        step: &'static str,
    ) -> impl FnOnce(reqwest::Error) -> Self {
        let state = state.to_string();
        move |source| Self::Transport {
            state,
            step,
            source,
        }
    }

    pub(crate) fn session(state: &JurisdictionCode) -> impl FnOnce(SessionError) -> Self {
        let state = state.to_string();
        move |source| Self::Session { state, source }
    }

    pub(crate) fn parse(
        state: &JurisdictionCode,
        step: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            state: state.to_string(),
            step,
            message: message.into(),
        }
    }

    /// Map a solver failure. A solver that observed the lookup's own
    /// cancellation reports it as a lookup cancellation.
    pub(crate) fn captcha(state: &JurisdictionCode, source: CaptchaError) -> Self {
        match source {
            CaptchaError::Cancelled => Self::Cancelled {
                state: state.to_string(),
                step: "captcha",
            },
            source => Self::Captcha {
                state: state.to_string(),
                source,
            },
        }
    }

    /// True for cancellation and deadline errors, which must abort the
    /// whole lookup rather than being recorded as a partial failure.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }

    /// Jurisdiction the failing lookup was for.
    #[must_use]
    pub fn state(&self) -> &str {
        match self {
            Self::Session { state, .. }
            | Self::Transport { state, .. }
            | Self::Http { state, .. }
            | Self::Api { state, .. }
            | Self::Parse { state, .. }
            | Self::Captcha { state, .. }
            | Self::Cancelled { state, .. }
            | Self::DeadlineExceeded { state, .. } => state,
        }
    }
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;
