//! Shared types used across Licensure.

use crate::error::LicensureError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for a jurisdiction code (US state or territory).
///
/// Codes are stored trimmed and uppercased. [`JurisdictionCode::normalize`]
/// never fails, so routing stays total over arbitrary input; use
/// [`JurisdictionCode::new`] when the caller wants a strict two-letter code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JurisdictionCode(String);

impl JurisdictionCode {
    /// Create a validated `JurisdictionCode`.
    ///
    /// # Errors
    /// Returns error if the normalized code is not exactly two ASCII letters.
    pub fn new(code: impl AsRef<str>) -> Result<Self, LicensureError> {
        let code = Self::normalize(code);
        if code.is_well_formed() {
            Ok(code)
        } else {
            Err(LicensureError::Validation(format!(
                "invalid jurisdiction code: must be two letters, got '{code}'"
            )))
        }
    }

    /// Normalize raw input (trim, uppercase) without validating it.
    #[must_use]
    pub fn normalize(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Whether the code has the two-letter shape.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        static CODE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = CODE_REGEX.get_or_init(|| Regex::new(r"^[A-Z]{2}$").expect("valid regex"));
        regex.is_match(&self.0)
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JurisdictionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for JurisdictionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
