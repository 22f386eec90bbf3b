//! Manual fallback for jurisdictions without automation.

use crate::context::LookupContext;
use crate::error::Result;
use crate::strategy::{LicenseStrategy, StrategyKind};
use async_trait::async_trait;
use licensure_core::{JurisdictionCode, LicenseRecord};

/// Returns a single "verify manually" record and never touches the network.
#[derive(Debug, Clone)]
pub struct ManualStrategy {
    code: JurisdictionCode,
    url: String,
}

impl ManualStrategy {
    /// Create a fallback for `code`, pointing at `url` when one is known.
    pub fn new(code: JurisdictionCode, url: impl Into<String>) -> Self {
        Self {
            code,
            url: url.into(),
        }
    }

    /// Human-readable instruction carried in the record's `error`.
    #[must_use]
    pub fn instruction(&self) -> String {
        let mut message = format!("Automated lookup not available for {}.", self.code);
        if !self.url.is_empty() {
            message.push_str(" Please verify manually at ");
            message.push_str(&self.url);
        }
        message
    }

    /// The only record this strategy ever produces.
    #[must_use]
    pub fn record(&self) -> LicenseRecord {
        LicenseRecord::not_found_with_error(&self.code, self.instruction())
    }
}

#[async_trait]
impl LicenseStrategy for ManualStrategy {
    fn state_code(&self) -> &JurisdictionCode {
        &self.code
    }

    fn manual_lookup_url(&self) -> &str {
        &self.url
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Manual
    }

    async fn lookup_by_name(
        &self,
        _ctx: &LookupContext,
        _first: &str,
        _last: &str,
    ) -> Result<Vec<LicenseRecord>> {
        Ok(vec![self.record()])
    }

    async fn lookup_by_npn(&self, _ctx: &LookupContext, _npn: &str) -> Result<Vec<LicenseRecord>> {
        Ok(vec![self.record()])
    }

    async fn lookup_by_license_number(
        &self,
        _ctx: &LookupContext,
        _number: &str,
    ) -> Result<Vec<LicenseRecord>> {
        Ok(vec![self.record()])
    }
}
