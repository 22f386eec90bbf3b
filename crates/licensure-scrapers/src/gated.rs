//! HTML search forms gated by a CAPTCHA.
//!
//! The flow is the same for every gated jurisdiction: fetch the search page
//! (cookies, site key, anti-forgery token), solve the CAPTCHA, POST the form
//! with the token, read the summary table. What differs per jurisdiction is
//! captured by [`GatedFormSite`].

use crate::context::LookupContext;
use crate::error::{LookupError, Result};
use crate::fetch::{fetch_text, ACCEPT_HTML};
use crate::html::document::selector;
use crate::html::{ColumnLayout, Document, ResultsPage};
use crate::strategy::{finish, mentions_active, unsupported, LicenseStrategy, StrategyKind};
use async_trait::async_trait;
use licensure_captcha::{CaptchaError, CaptchaSolver};
use licensure_core::{JurisdictionCode, LicenseRecord};
use licensure_session::SessionFactory;
use reqwest::header::{ACCEPT, REFERER};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the search page yields before the form can be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// CAPTCHA site key
    pub site_key: String,
    /// Anti-forgery token to echo back, if the page has one
    pub anti_forgery: Option<String>,
}

/// The jurisdiction-specific half of a gated form flow.
pub trait GatedFormSite: Send + Sync {
    /// Jurisdiction code
    fn state(&self) -> JurisdictionCode;

    /// URL of the search page; the form posts back to it
    fn search_url(&self) -> String;

    /// Portal named in unsupported and not-configured messages
    fn manual_url(&self) -> String;

    /// Read the site key and hidden fields from the search page.
    fn inspect(&self, page: &Document) -> std::result::Result<SearchPage, String>;

    /// The full POST payload.
    fn search_form(
        &self,
        first: &str,
        last: &str,
        token: &str,
        page: &SearchPage,
    ) -> Vec<(&'static str, String)>;

    /// Summary table columns.
    fn columns(&self) -> ColumnLayout;
}

/// California Department of Insurance individual name search.
#[derive(Debug, Clone)]
pub struct CaliforniaSite {
    base_url: String,
}

impl CaliforniaSite {
    /// Turnstile key the search page has historically carried.
    pub const KNOWN_SITE_KEY: &'static str = "0x4AAAAAAAeV7o-X_350Kljk";

    /// Create the site against `base_url` (e.g. `https://cdicloud.insurance.ca.gov/cal`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }
}

/// Texas Department of Insurance agent search.
#[derive(Debug, Clone)]
pub struct TexasSite {
    search_url: String,
}

impl TexasSite {
    /// Create the site against the search page URL.
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            search_url: search_url.into(),
        }
    }
}

impl GatedFormSite for CaliforniaSite {
    fn state(&self) -> JurisdictionCode {
        JurisdictionCode::normalize("CA")
    }

    fn search_url(&self) -> String {
        format!("{}/IndividualNameSearch", self.base_url)
    }

    fn manual_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    fn inspect(&self, page: &Document) -> std::result::Result<SearchPage, String> {
        let site_key = page
            .attr(&selector("[data-sitekey]"), "data-sitekey")
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| Self::KNOWN_SITE_KEY.to_string());
        Ok(SearchPage {
            site_key,
            anti_forgery: page.input_value("__RequestVerificationToken"),
        })
    }

    fn search_form(
        &self,
        first: &str,
        last: &str,
        token: &str,
        page: &SearchPage,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("SearchLastName", last.trim().to_string()),
            ("SearchFirstName", first.trim().to_string()),
            ("cf-turnstile-response", token.to_string()),
            (
                "__RequestVerificationToken",
                page.anti_forgery.clone().unwrap_or_default(),
            ),
        ]
    }

    fn columns(&self) -> ColumnLayout {
        ColumnLayout {
            table: "table",
            min_cells: 3,
            name: 0,
            license_number: 1,
            license_type: Some(2),
            status: Some(3),
            name_link: false,
        }
    }
}

impl GatedFormSite for TexasSite {
    fn state(&self) -> JurisdictionCode {
        JurisdictionCode::normalize("TX")
    }

    fn search_url(&self) -> String {
        self.search_url.clone()
    }

    fn manual_url(&self) -> String {
        self.search_url.clone()
    }

    fn inspect(&self, page: &Document) -> std::result::Result<SearchPage, String> {
        let site_key = page
            .input_value("captchaToken")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| "captchaToken input missing from search page".to_string())?;
        Ok(SearchPage {
            site_key,
            anti_forgery: None,
        })
    }

    fn search_form(
        &self,
        first: &str,
        last: &str,
        token: &str,
        _page: &SearchPage,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("perlastName", last.trim().to_string()),
            ("perfirstName", first.trim().to_string()),
            ("captchaToken", token.to_string()),
            ("search", "Search".to_string()),
        ]
    }

    fn columns(&self) -> ColumnLayout {
        ColumnLayout {
            table: "table",
            min_cells: 2,
            name: 0,
            license_number: 1,
            license_type: Some(3),
            status: Some(2),
            name_link: false,
        }
    }
}

/// Gated form strategy, generic over the jurisdiction's site details.
///
/// Without a solver the strategy never touches the network: it returns a
/// `found=false` record explaining why and where to verify manually.
pub struct CaptchaFormStrategy<S> {
    site: S,
    code: JurisdictionCode,
    search_url: String,
    manual_url: String,
    sessions: SessionFactory,
    solver: Option<Arc<dyn CaptchaSolver>>,
    max_results: usize,
}

impl<S: GatedFormSite> CaptchaFormStrategy<S> {
    /// Create the strategy. `solver` is `None` when no solving service is configured.
    pub fn new(
        site: S,
        sessions: SessionFactory,
        solver: Option<Arc<dyn CaptchaSolver>>,
        max_results: usize,
    ) -> Self {
        let code = site.state();
        let manual_url = site.manual_url();
        let search_url = site.search_url();
        Self {
            site,
            code,
            search_url,
            manual_url,
            sessions,
            solver,
            max_results,
        }
    }

    fn not_configured(&self) -> Vec<LicenseRecord> {
        vec![LicenseRecord::not_found_with_error(
            &self.code,
            format!(
                "{} requires CAPTCHA solving. {}. Verify manually at {}",
                self.code,
                CaptchaError::NotConfigured,
                self.manual_url
            ),
        )]
    }

    fn inspect_page(&self, body: &str) -> Result<SearchPage> {
        let document = Document::parse(body);
        self.site
            .inspect(&document)
            .map_err(|message| LookupError::parse(&self.code, "search_page", message))
    }

    async fn search_by_name(
        &self,
        ctx: &LookupContext,
        solver: &dyn CaptchaSolver,
        first: &str,
        last: &str,
    ) -> Result<Vec<LicenseRecord>> {
        let client = self
            .sessions
            .new_session()
            .map_err(LookupError::session(&self.code))?;
        let url = &self.search_url;

        let landing = client.get(url).header(ACCEPT, ACCEPT_HTML);
        let body = fetch_text(ctx, &self.code, "search_page", landing).await?;
        let page = self.inspect_page(&body)?;
        debug!(state = %self.code, site_key = %page.site_key, "search page loaded");

        let token = ctx
            .guard(&self.code, "captcha", async {
                solver
                    .solve(ctx.cancel_token(), url, &page.site_key)
                    .await
                    .map_err(|e| LookupError::captcha(&self.code, e))
            })
            .await?;

        let submit = client
            .post(url)
            .header(ACCEPT, ACCEPT_HTML)
            .header(REFERER, url)
            .form(&self.site.search_form(first, last, &token, &page));
        let body = fetch_text(ctx, &self.code, "search", submit).await?;

        let rows = match self.site.columns().parse(&body, self.max_results) {
            ResultsPage::NoResults => {
                info!(state = %self.code, "no licensees matched");
                return Ok(vec![LicenseRecord::not_found(&self.code)]);
            }
            ResultsPage::Rows(rows) => rows,
        };

        let records = finish(
            &self.code,
            rows.into_iter().map(|row| LicenseRecord {
                active: mentions_active(&row.status),
                full_name: row.full_name,
                license_number: row.license_number,
                license_type: row.license_type,
                status: row.status,
                ..LicenseRecord::found_in(&self.code)
            }),
            self.max_results,
        );
        info!(
            state = %self.code,
            found = records.iter().filter(|r| r.found).count(),
            "gated form lookup complete"
        );
        Ok(records)
    }
}

impl CaptchaFormStrategy<CaliforniaSite> {
    /// California strategy against `base_url`.
    pub fn california(
        base_url: impl Into<String>,
        sessions: SessionFactory,
        solver: Option<Arc<dyn CaptchaSolver>>,
        max_results: usize,
    ) -> Self {
        Self::new(CaliforniaSite::new(base_url), sessions, solver, max_results)
    }
}

impl CaptchaFormStrategy<TexasSite> {
    /// Texas strategy against `search_url`.
    pub fn texas(
        search_url: impl Into<String>,
        sessions: SessionFactory,
        solver: Option<Arc<dyn CaptchaSolver>>,
        max_results: usize,
    ) -> Self {
        Self::new(TexasSite::new(search_url), sessions, solver, max_results)
    }
}

#[async_trait]
impl<S: GatedFormSite> LicenseStrategy for CaptchaFormStrategy<S> {
    fn state_code(&self) -> &JurisdictionCode {
        &self.code
    }

    fn manual_lookup_url(&self) -> &str {
        &self.manual_url
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::CaptchaForm
    }

    async fn lookup_by_name(
        &self,
        ctx: &LookupContext,
        first: &str,
        last: &str,
    ) -> Result<Vec<LicenseRecord>> {
        let Some(solver) = self.solver.as_deref() else {
            warn!(state = %self.code, "CAPTCHA solver not configured, skipping lookup");
            return Ok(self.not_configured());
        };
        debug!(state = %self.code, "gated form name lookup");
        self.search_by_name(ctx, solver, first, last).await
    }

    async fn lookup_by_npn(&self, _ctx: &LookupContext, _npn: &str) -> Result<Vec<LicenseRecord>> {
        Ok(unsupported(&self.code, "NPN", &self.manual_url))
    }

    async fn lookup_by_license_number(
        &self,
        _ctx: &LookupContext,
        _number: &str,
    ) -> Result<Vec<LicenseRecord>> {
        Ok(unsupported(&self.code, "license number", &self.manual_url))
    }
}
