//! Document queries for jurisdictions that only publish HTML.
//!
//! The matching rules live here, separate from the network flows, so they
//! can be exercised against fixed fixtures.
//!
//! [`scraper::Html`] is not `Send`; parse and extract inside synchronous
//! functions and hand owned results back to async code.

pub mod detail;
pub mod document;
pub mod results;

pub use detail::{choose_license, normalize_label, DetailPage, LicenseEntry, Standing};
pub use document::{text_of, Document};
pub use results::{indicates_no_results, ColumnLayout, ResultsPage, SummaryRow};
