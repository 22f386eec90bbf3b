//! Jurisdiction routing: which strategy serves which code.

use crate::context::LookupContext;
use crate::error::Result;
use crate::florida::FloridaStrategy;
use crate::gated::CaptchaFormStrategy;
use crate::manual::ManualStrategy;
use crate::naic::NaicStrategy;
use crate::strategy::LicenseStrategy;
use licensure_captcha::{CapSolverClient, CaptchaSolver};
use licensure_core::{AppConfig, EndpointConfig, JurisdictionCode, LicenseRecord, LookupQuery};
use licensure_session::SessionFactory;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Jurisdictions with a flow of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bespoke {
    /// Florida HTML form
    Florida,
    /// California CAPTCHA-gated form
    California,
    /// Texas CAPTCHA-gated form
    Texas,
}

/// Where a code routes, before any strategy is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A bespoke strategy
    Bespoke(Bespoke),
    /// The shared JSON API
    JsonApi,
    /// A known manual-only portal
    ManualPortal(String),
    /// Unknown code; manual fallback with no URL
    Fallback,
}

const API_COVERED: [&str; 31] = [
    "AL", "AK", "AZ", "AR", "CT", "DE", "DC", "HI", "ID", "IL", "IA", "KS", "MA", "MD", "MO", "MT",
    "NE", "NH", "NJ", "NM", "NC", "ND", "OK", "OR", "RI", "SC", "SD", "TN", "VT", "WI", "WV",
];

const SIRCON: &str = "https://sircon.com/ComplianceExpress/";

const MANUAL_PORTALS: [(&str, &str); 17] = [
    ("CO", SIRCON),
    ("GA", SIRCON),
    ("IN", SIRCON),
    ("KY", "https://insurance.ky.gov/ppc/agentlookup.aspx"),
    ("LA", "https://www.ldi.la.gov/producers/agent-search"),
    ("ME", "https://www.maine.gov/pfr/insurance/licensee-search"),
    ("MI", "https://difs.state.mi.us/Licensees/"),
    ("MN", SIRCON),
    ("MS", "https://www.mid.ms.gov/licensing/agent-search.aspx"),
    ("NV", "https://doi.nv.gov/Licensing/Agent_Lookup/"),
    ("NY", "https://myportal.dfs.ny.gov/web/guest/individual-or-entity-look-up"),
    ("OH", "https://gateway.insurance.ohio.gov/UI/ODI.Agent.Public/"),
    ("PA", SIRCON),
    ("UT", "https://insurance.utah.gov/licensee-search/"),
    ("VA", "https://scc.virginia.gov/pages/Bureau-of-Insurance"),
    ("WA", "https://www.insurance.wa.gov/agent-broker-search"),
    ("WY", SIRCON),
];

/// Immutable routing tables, built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct JurisdictionTable {
    bespoke: BTreeMap<JurisdictionCode, Bespoke>,
    api_covered: BTreeSet<JurisdictionCode>,
    manual_portals: BTreeMap<JurisdictionCode, String>,
}

impl JurisdictionTable {
    /// An empty table; every code falls back to manual.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The production routing tables.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty()
            .with_bespoke("FL", Bespoke::Florida)
            .with_bespoke("CA", Bespoke::California)
            .with_bespoke("TX", Bespoke::Texas);
        for code in API_COVERED {
            table = table.with_api_covered(code);
        }
        for (code, url) in MANUAL_PORTALS {
            table = table.with_manual_portal(code, url);
        }
        table
    }

    /// Route `code` to a bespoke strategy.
    #[must_use]
    pub fn with_bespoke(mut self, code: &str, bespoke: Bespoke) -> Self {
        self.bespoke.insert(JurisdictionCode::normalize(code), bespoke);
        self
    }

    /// Add `code` to the API-covered set.
    #[must_use]
    pub fn with_api_covered(mut self, code: &str) -> Self {
        self.api_covered.insert(JurisdictionCode::normalize(code));
        self
    }

    /// Map `code` to a manual-only portal.
    #[must_use]
    pub fn with_manual_portal(mut self, code: &str, url: &str) -> Self {
        self.manual_portals
            .insert(JurisdictionCode::normalize(code), url.to_string());
        self
    }

    /// Resolve a normalized code. Bespoke flows win over the API set, which
    /// wins over manual portals; anything else falls back.
    #[must_use]
    pub fn route(&self, code: &JurisdictionCode) -> Route {
        if let Some(bespoke) = self.bespoke.get(code) {
            Route::Bespoke(*bespoke)
        } else if self.api_covered.contains(code) {
            Route::JsonApi
        } else if let Some(url) = self.manual_portals.get(code) {
            Route::ManualPortal(url.clone())
        } else {
            Route::Fallback
        }
    }

    /// Codes in the API-covered set, sorted.
    pub fn api_covered(&self) -> impl Iterator<Item = &JurisdictionCode> {
        self.api_covered.iter()
    }
}

/// Builds the strategy for a jurisdiction code.
///
/// Holds no mutable state; clone it or share it behind an `Arc` across
/// concurrent lookups.
#[derive(Clone)]
pub struct Registry {
    table: Arc<JurisdictionTable>,
    sessions: SessionFactory,
    solver: Option<Arc<dyn CaptchaSolver>>,
    endpoints: EndpointConfig,
    max_results: usize,
}

impl Registry {
    /// Create a registry from its parts.
    pub fn new(
        table: JurisdictionTable,
        sessions: SessionFactory,
        solver: Option<Arc<dyn CaptchaSolver>>,
        endpoints: EndpointConfig,
        max_results: usize,
    ) -> Self {
        Self {
            table: Arc::new(table),
            sessions,
            solver,
            endpoints,
            max_results,
        }
    }

    /// Create the standard registry from configuration. The CAPTCHA solver
    /// is only present when an API key is configured.
    pub fn from_config(config: &AppConfig) -> licensure_captcha::Result<Self> {
        let solver = CapSolverClient::from_config(&config.captcha)?
            .map(|client| Arc::new(client) as Arc<dyn CaptchaSolver>);
        info!(
            captcha = solver.is_some(),
            max_results = config.lookup.max_results,
            "registry configured"
        );

        Ok(Self::new(
            JurisdictionTable::standard(),
            SessionFactory::new(&config.session),
            solver,
            config.endpoints.clone(),
            config.lookup.max_results,
        ))
    }

    /// The routing tables.
    #[must_use]
    pub fn table(&self) -> &JurisdictionTable {
        &self.table
    }

    /// Strategy for a raw code. Never fails: the code is trimmed and
    /// uppercased, and unknown codes get the manual fallback.
    #[must_use]
    pub fn resolve(&self, code: &str) -> Arc<dyn LicenseStrategy> {
        let code = JurisdictionCode::normalize(code);
        let route = self.table.route(&code);
        debug!(state = %code, route = ?route, "resolved jurisdiction");

        match route {
            Route::Bespoke(Bespoke::Florida) => Arc::new(FloridaStrategy::new(
                &self.endpoints.florida_base_url,
                self.sessions.clone(),
                self.max_results,
            )),
            Route::Bespoke(Bespoke::California) => Arc::new(CaptchaFormStrategy::california(
                &self.endpoints.california_base_url,
                self.sessions.clone(),
                self.solver.clone(),
                self.max_results,
            )),
            Route::Bespoke(Bespoke::Texas) => Arc::new(CaptchaFormStrategy::texas(
                &self.endpoints.texas_search_url,
                self.sessions.clone(),
                self.solver.clone(),
                self.max_results,
            )),
            Route::JsonApi => Arc::new(NaicStrategy::new(
                code,
                &self.endpoints,
                self.sessions.clone(),
                self.max_results,
            )),
            Route::ManualPortal(url) => Arc::new(ManualStrategy::new(code, url)),
            Route::Fallback => Arc::new(ManualStrategy::new(code, "")),
        }
    }

    /// Resolve `code` and run `query` against it.
    pub async fn lookup(
        &self,
        ctx: &LookupContext,
        code: &str,
        query: &LookupQuery,
    ) -> Result<Vec<LicenseRecord>> {
        let strategy = self.resolve(code);
        info!(
            state = %strategy.state_code(),
            kind = ?strategy.kind(),
            query = query.kind(),
            "starting lookup"
        );
        strategy.lookup(ctx, query).await
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("table", &self.table)
            .field("solver", &self.solver.is_some())
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}
