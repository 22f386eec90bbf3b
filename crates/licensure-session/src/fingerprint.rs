use crate::error::{Result, SessionError};
use licensure_core::SessionConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};

/// Fixed browser identity presented to jurisdiction sites.
///
/// The identity never varies between sessions; some sites tie their
/// anti-bot cookies to the client hints they saw on the first request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept_language: String,
    pub sec_ch_ua: String,
    pub platform: String,
}

impl BrowserProfile {
    /// Desktop Chrome 124 on Windows.
    pub fn chrome_124() -> Self {
        Self::from_config(&SessionConfig::default())
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            sec_ch_ua: r#""Chromium";v="124", "Google Chrome";v="124", "Not-A.Brand";v="99""#
                .to_string(),
            platform: r#""Windows""#.to_string(),
        }
    }

    /// Headers sent with every request of a session.
    pub fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("user-agent", &self.user_agent)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("accept-language", &self.accept_language)?,
        );
        headers.insert("sec-ch-ua", header_value("sec-ch-ua", &self.sec_ch_ua)?);
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert(
            "sec-ch-ua-platform",
            header_value("sec-ch-ua-platform", &self.platform)?,
        );
        Ok(headers)
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| SessionError::InvalidHeader {
        name,
        reason: e.to_string(),
    })
}
