//! Licensure Scrapers - jurisdiction registry and license lookup strategies.
//!
//! Given a two-letter jurisdiction code, the [`Registry`] picks the strategy
//! that knows how to query that jurisdiction and normalizes whatever it
//! returns into [`licensure_core::LicenseRecord`]s.
//!
//! # Architecture
//!
//! - **Registry** ([`registry`]): immutable routing tables and strategy construction
//! - **Strategy** ([`strategy`]): the [`LicenseStrategy`] capability
//! - **JSON API** ([`naic`]): the shared regulatory API covering most states
//! - **HTML forms** ([`florida`], [`gated`]): session flows over search forms,
//!   with the document queries in [`html`]
//! - **Manual** ([`manual`]): "verify manually" fallback
//! - **Context** ([`context`]): per-lookup cancellation and deadline
//! - **Errors** ([`error`]): lookup error types
//!
//! # Example
//!
//! ```rust,no_run
//! use licensure_core::{AppConfig, LookupQuery};
//! use licensure_scrapers::{LookupContext, Registry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load_with_env()?;
//! let registry = Registry::from_config(&config)?;
//!
//! let query = LookupQuery::Npn { npn: "1234567".to_string() };
//! let records = registry.lookup(&LookupContext::new(), "wv", &query).await?;
//! for record in records {
//!     println!("{} {} active={}", record.full_name, record.license_type, record.active);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod context;
pub mod error;
mod fetch;
pub mod florida;
pub mod gated;
pub mod html;
pub mod manual;
pub mod naic;
pub mod registry;
pub mod strategy;

// Re-export commonly used types
pub use context::LookupContext;
pub use error::{LookupError, Result};
pub use florida::FloridaStrategy;
pub use gated::{CaliforniaSite, CaptchaFormStrategy, GatedFormSite, SearchPage, TexasSite};
pub use manual::ManualStrategy;
pub use naic::NaicStrategy;
pub use registry::{Bespoke, JurisdictionTable, Registry, Route};
pub use strategy::{LicenseStrategy, StrategyKind};
