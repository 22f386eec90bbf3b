//! HTTP sessions for jurisdiction sites.
//!
//! Every lookup gets a fresh [`reqwest::Client`] with its own cookie jar and
//! the same browser identity, so cookies never leak between lookups.

pub mod error;
pub mod factory;
pub mod fingerprint;
pub mod urls;

pub use error::{Result, SessionError};
pub use factory::SessionFactory;
pub use fingerprint::BrowserProfile;
pub use urls::join_url;
