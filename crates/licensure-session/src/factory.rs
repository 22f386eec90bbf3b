use crate::error::Result;
use crate::fingerprint::BrowserProfile;
use licensure_core::SessionConfig;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Factory for isolated HTTP sessions.
///
/// Cheap to clone and safe to share: it only holds immutable settings.
/// Each [`SessionFactory::new_session`] call builds a new client with an
/// empty cookie jar.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    profile: BrowserProfile,
    timeout: Duration,
    max_redirects: usize,
}

impl SessionFactory {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            profile: BrowserProfile::from_config(config),
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }

    /// Replace the browser identity.
    #[must_use]
    pub fn with_profile(mut self, profile: BrowserProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &BrowserProfile {
        &self.profile
    }

    /// Build a fresh client: own cookie store, browser headers, redirects followed.
    pub fn new_session(&self) -> Result<Client> {
        let client = Client::builder()
            .cookie_store(true)
            .default_headers(self.profile.default_headers()?)
            .redirect(Policy::limited(self.max_redirects))
            .timeout(self.timeout)
            .build()?;

        debug!(timeout_secs = self.timeout.as_secs(), "created new HTTP session");
        Ok(client)
    }
}

impl Default for SessionFactory {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}
