//! The capability every jurisdiction handler implements.

use crate::context::LookupContext;
use crate::error::Result;
use async_trait::async_trait;
use licensure_core::{JurisdictionCode, LicenseRecord, LookupQuery};
use serde::Serialize;

/// How a strategy retrieves records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Public JSON API
    JsonApi,
    /// Plain HTML search form
    HtmlForm,
    /// HTML search form gated by a CAPTCHA
    CaptchaForm,
    /// No automation; points the caller at a portal
    Manual,
}

/// A jurisdiction's license lookup.
///
/// Every lookup returns at least one record: either the matches, or a single
/// `found=false` record (optionally carrying an explanatory `error`).
#[async_trait]
pub trait LicenseStrategy: Send + Sync {
    /// Jurisdiction this strategy serves
    fn state_code(&self) -> &JurisdictionCode;

    /// Portal a human can use when automation is unavailable; may be empty
    fn manual_lookup_url(&self) -> &str;

    /// Retrieval mechanism
    fn kind(&self) -> StrategyKind;

    /// Search by licensee name.
    async fn lookup_by_name(
        &self,
        ctx: &LookupContext,
        first: &str,
        last: &str,
    ) -> Result<Vec<LicenseRecord>>;

    /// Search by National Producer Number.
    async fn lookup_by_npn(&self, ctx: &LookupContext, npn: &str) -> Result<Vec<LicenseRecord>>;

    /// Search by jurisdiction license number.
    async fn lookup_by_license_number(
        &self,
        ctx: &LookupContext,
        number: &str,
    ) -> Result<Vec<LicenseRecord>>;

    /// Dispatch a [`LookupQuery`] to the matching operation.
    async fn lookup(&self, ctx: &LookupContext, query: &LookupQuery) -> Result<Vec<LicenseRecord>> {
        match query {
            LookupQuery::Name { first, last } => self.lookup_by_name(ctx, first, last).await,
            LookupQuery::Npn { npn } => self.lookup_by_npn(ctx, npn).await,
            LookupQuery::LicenseNumber { number } => {
                self.lookup_by_license_number(ctx, number).await
            }
        }
    }
}

/// The record returned for a search type the jurisdiction's form lacks.
pub(crate) fn unsupported(
    state: &JurisdictionCode,
    search: &str,
    manual_url: &str,
) -> Vec<LicenseRecord> {
    vec![LicenseRecord::not_found_with_error(
        state,
        format!("{state} does not support {search} search. Verify manually at {manual_url}"),
    )]
}

/// Substring match used by jurisdictions that only expose free-text status.
pub(crate) fn mentions_active(text: &str) -> bool {
    text.to_lowercase().contains("active")
}

/// Keep records that identify someone, at most `cap` of them, or the
/// single not-found sentinel when none remain.
pub(crate) fn finish(
    state: &JurisdictionCode,
    records: impl IntoIterator<Item = LicenseRecord>,
    cap: usize,
) -> Vec<LicenseRecord> {
    let records: Vec<LicenseRecord> = records
        .into_iter()
        .filter(|r| r.found && r.is_consistent())
        .take(cap)
        .collect();

    if records.is_empty() {
        vec![LicenseRecord::not_found(state)]
    } else {
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca() -> JurisdictionCode {
        JurisdictionCode::normalize("CA")
    }

    #[test]
    fn test_unsupported_names_portal() {
        let records = unsupported(&ca(), "NPN", "https://cdicloud.insurance.ca.gov/cal/");
        assert_eq!(records.len(), 1);
        assert!(!records[0].found);
        assert_eq!(
            records[0].error,
            "CA does not support NPN search. Verify manually at https://cdicloud.insurance.ca.gov/cal/"
        );
    }

    #[test]
    fn test_finish_caps_and_filters() {
        let mut named = LicenseRecord::found_in(&ca());
        named.full_name = "DOE, JANE".to_string();
        let anonymous = LicenseRecord::found_in(&ca());

        let records = finish(
            &ca(),
            std::iter::repeat(named).take(3).chain([anonymous]),
            2,
        );
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.full_name == "DOE, JANE"));
    }

    #[test]
    fn test_finish_empty_is_sentinel() {
        let records = finish(&ca(), Vec::new(), 5);
        assert_eq!(records, vec![LicenseRecord::not_found(&ca())]);
    }

    #[test]
    fn test_mentions_active() {
        assert!(mentions_active("Active"));
        assert!(mentions_active("LICENSE ACTIVE"));
        assert!(!mentions_active("Expired"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&StrategyKind::CaptchaForm).unwrap();
        assert_eq!(json, "\"captcha_form\"");
    }
}
