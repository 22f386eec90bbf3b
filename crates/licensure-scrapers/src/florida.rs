//! Florida licensee search: plain HTML form with per-result detail pages.

use crate::context::LookupContext;
use crate::error::{LookupError, Result};
use crate::fetch::{fetch_text, ACCEPT_HTML};
use crate::html::{ColumnLayout, DetailPage, ResultsPage, SummaryRow};
use crate::strategy::{finish, LicenseStrategy, StrategyKind};
use async_trait::async_trait;
use licensure_core::{JurisdictionCode, LicenseRecord};
use licensure_session::{join_url, SessionFactory};
use reqwest::header::{ACCEPT, REFERER};
use reqwest::Client;
use tracing::{debug, info, warn};

const RESULTS: ColumnLayout = ColumnLayout {
    table: "table.table",
    min_cells: 2,
    name: 0,
    license_number: 1,
    license_type: None,
    status: None,
    name_link: true,
};

/// Search criteria for one Florida query. Unused criteria stay empty.
#[derive(Debug, Default, Clone, Copy)]
struct Criteria<'a> {
    first: &'a str,
    last: &'a str,
    license_number: &'a str,
    npn: &'a str,
}

impl Criteria<'_> {
    /// The complete search form. The server rejects payloads missing any
    /// declared field, so empty fields are sent too.
    fn form(&self) -> Vec<(&'static str, String)> {
        let fixed = |v: &str| v.to_string();
        vec![
            ("IndividualFNameFilter", self.first.trim().to_string()),
            ("IndividualLNameFilter", self.last.trim().to_string()),
            ("IndividualMNameFilter", String::new()),
            ("EmailAddressBeginContainFilter", fixed("1")),
            ("EmailFilter", String::new()),
            ("FirmNameBeginContainFilter", fixed("1")),
            ("FirmNameFilter", String::new()),
            ("ResidentStatusFilter", String::new()),
            ("FLLicenseNoFilter", self.license_number.trim().to_string()),
            ("NPNNoFilter", self.npn.trim().to_string()),
            ("LicenseStatusFilter", fixed("1")),
            ("LicenseCategoryFilter", String::new()),
            ("LicenseIssueDateFromFilter", String::new()),
            ("LicenseIssueDateToFilter", String::new()),
            ("OnlyLicWithNoQuApptFilter", fixed("false")),
            ("BusinessStateFilter", String::new()),
            ("BusinessCityFilter", String::new()),
            ("BusinessCountyFilter", String::new()),
            ("BusinessZipFilter", String::new()),
            ("CEDueDtFromFilter", String::new()),
            ("CEDueDtToFilter", String::new()),
            ("CEHrsNotMetFilter", fixed("false")),
            ("AppointingEntityTYCLFilter", String::new()),
            ("AppointingEntityStatusFilter", String::new()),
            ("AppointingEntityStatusDateFromFilter", String::new()),
            ("AppointingEntityStatusDateToFilter", String::new()),
            ("LicenseeSearchInfo.PagingInfo.SortBy", fixed("Name")),
            ("LicenseeSearchInfo.PagingInfo.SortDesc", fixed("False")),
            ("LicenseeSearchInfo.PagingInfo.CurrentPage", fixed("1")),
            ("AppointingEntityIdFilter", String::new()),
            ("AppointingEntityDisplayName", String::new()),
            ("TabLLValue", fixed("0")),
            ("TabCEValue", fixed("0")),
            ("TabAppValue", String::new()),
            (
                "hdnLApptEntitySearchListUrl",
                fixed("/Home/GetAppointingEntityListForSearch"),
            ),
            (
                "hdnLicenseeSearchListUrl",
                fixed("/Home/GetLicenseeSearchListPartialView"),
            ),
        ]
    }
}

/// Florida strategy: GET the search page for cookies, POST the full form,
/// then crawl each result's detail page in order.
#[derive(Debug, Clone)]
pub struct FloridaStrategy {
    code: JurisdictionCode,
    base_url: String,
    sessions: SessionFactory,
    max_results: usize,
}

impl FloridaStrategy {
    /// Create the strategy against `base_url`.
    pub fn new(base_url: impl Into<String>, sessions: SessionFactory, max_results: usize) -> Self {
        Self {
            code: JurisdictionCode::normalize("FL"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sessions,
            max_results,
        }
    }

    async fn search(
        &self,
        ctx: &LookupContext,
        criteria: Criteria<'_>,
    ) -> Result<Vec<LicenseRecord>> {
        let client = self
            .sessions
            .new_session()
            .map_err(LookupError::session(&self.code))?;

        let landing = client.get(&self.base_url).header(ACCEPT, ACCEPT_HTML);
        fetch_text(ctx, &self.code, "search_page", landing).await?;

        let submit = client
            .post(format!("{}/", self.base_url))
            .header(ACCEPT, ACCEPT_HTML)
            .header(REFERER, &self.base_url)
            .form(&criteria.form());
        let body = fetch_text(ctx, &self.code, "search", submit).await?;

        let rows = match RESULTS.parse(&body, self.max_results) {
            ResultsPage::NoResults => {
                info!(state = %self.code, "no licensees matched");
                return Ok(vec![LicenseRecord::not_found(&self.code)]);
            }
            ResultsPage::Rows(rows) => rows,
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(self.enrich(ctx, &client, row).await?);
        }

        let records = finish(&self.code, records, self.max_results);
        info!(
            state = %self.code,
            found = records.iter().filter(|r| r.found).count(),
            "Florida lookup complete"
        );
        Ok(records)
    }

    /// Build a record from a summary row and its detail page. A failed
    /// detail fetch keeps the summary and notes the failure; cancellation
    /// and deadline still abort the lookup.
    async fn enrich(
        &self,
        ctx: &LookupContext,
        client: &Client,
        row: SummaryRow,
    ) -> Result<LicenseRecord> {
        let mut record = LicenseRecord {
            full_name: row.full_name,
            license_number: row.license_number,
            ..LicenseRecord::found_in(&self.code)
        };

        let Some(href) = row.detail_href else {
            return Ok(record);
        };
        let url = match join_url(&self.base_url, &href) {
            Ok(url) => url,
            Err(e) => {
                warn!(state = %self.code, href = %href, error = %e, "bad detail link");
                record.error = format!("detail page: {e}");
                return Ok(record);
            }
        };

        debug!(state = %self.code, url = %url, "fetching detail page");
        let request = client
            .get(&url)
            .header(ACCEPT, ACCEPT_HTML)
            .header(REFERER, format!("{}/", self.base_url));

        match fetch_text(ctx, &self.code, "detail", request).await {
            Ok(body) => DetailPage::parse(&body).apply_to(&mut record),
            Err(e) if e.is_interrupted() => return Err(e),
            Err(e) => {
                warn!(state = %self.code, url = %url, error = %e, "detail page failed");
                record.error = format!("detail page: {e}");
            }
        }
        Ok(record)
    }
}

#[async_trait]
impl LicenseStrategy for FloridaStrategy {
    fn state_code(&self) -> &JurisdictionCode {
        &self.code
    }

    fn manual_lookup_url(&self) -> &str {
        &self.base_url
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::HtmlForm
    }

    async fn lookup_by_name(
        &self,
        ctx: &LookupContext,
        first: &str,
        last: &str,
    ) -> Result<Vec<LicenseRecord>> {
        debug!(state = %self.code, "Florida name lookup");
        self.search(
            ctx,
            Criteria {
                first,
                last,
                ..Criteria::default()
            },
        )
        .await
    }

    async fn lookup_by_npn(&self, ctx: &LookupContext, npn: &str) -> Result<Vec<LicenseRecord>> {
        debug!(state = %self.code, "Florida NPN lookup");
        self.search(
            ctx,
            Criteria {
                npn,
                ..Criteria::default()
            },
        )
        .await
    }

    async fn lookup_by_license_number(
        &self,
        ctx: &LookupContext,
        number: &str,
    ) -> Result<Vec<LicenseRecord>> {
        debug!(state = %self.code, "Florida license number lookup");
        self.search(
            ctx,
            Criteria {
                license_number: number,
                ..Criteria::default()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_declares_every_field() {
        let form = Criteria {
            first: " Jane ",
            last: "Doe",
            ..Criteria::default()
        }
        .form();

        assert_eq!(form.len(), 36);
        let get = |name: &str| {
            form.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("IndividualFNameFilter"), "Jane");
        assert_eq!(get("IndividualLNameFilter"), "Doe");
        assert_eq!(get("NPNNoFilter"), "");
        assert_eq!(get("LicenseStatusFilter"), "1");
        assert_eq!(get("LicenseeSearchInfo.PagingInfo.SortBy"), "Name");
        assert_eq!(
            get("hdnLicenseeSearchListUrl"),
            "/Home/GetLicenseeSearchListPartialView"
        );
    }

    #[test]
    fn test_npn_criteria() {
        let form = Criteria {
            npn: "1234567",
            ..Criteria::default()
        }
        .form();
        assert!(form.contains(&("NPNNoFilter", "1234567".to_string())));
        assert!(form.contains(&("IndividualLNameFilter", String::new())));
    }

    #[test]
    fn test_strategy_metadata() {
        let strategy = FloridaStrategy::new(
            "https://licenseesearch.fldfs.com/",
            SessionFactory::default(),
            5,
        );
        assert_eq!(strategy.state_code().as_str(), "FL");
        assert_eq!(strategy.manual_lookup_url(), "https://licenseesearch.fldfs.com");
        assert_eq!(strategy.kind(), StrategyKind::HtmlForm);
    }
}
