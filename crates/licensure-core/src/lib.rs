//! Licensure Core - Foundation crate for professional-license lookups.
//!
//! This crate provides the normalized record shape, shared types, error
//! handling and configuration that every other Licensure crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`record`] - The normalized [`LicenseRecord`] and [`LookupQuery`]
//! - [`types`] - Shared newtypes (`JurisdictionCode`)
//!
//! # Example
//!
//! ```rust
//! use licensure_core::{AppConfig, JurisdictionCode, LicenseRecord};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.lookup.max_results, 5);
//!
//! let code = JurisdictionCode::normalize(" fl ");
//! let record = LicenseRecord::not_found(&code);
//! assert!(!record.found);
//! assert_eq!(record.state, "FL");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod record;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, CaptchaConfig, EndpointConfig, LookupConfig, SessionConfig, DEFAULT_MAX_RESULTS,
};
pub use error::{ConfigError, ConfigResult, LicensureError, Result};
pub use record::{LicenseRecord, LookupQuery};
pub use types::JurisdictionCode;
