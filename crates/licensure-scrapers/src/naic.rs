//! Lookups through the shared regulatory JSON API that serves most states.

use crate::context::LookupContext;
use crate::error::{LookupError, Result};
use crate::fetch::fetch_text;
use crate::strategy::{finish, mentions_active, LicenseStrategy, StrategyKind};
use async_trait::async_trait;
use licensure_core::{EndpointConfig, JurisdictionCode, LicenseRecord};
use licensure_session::SessionFactory;
use reqwest::header::{ACCEPT, ORIGIN, REFERER};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info};

const PORTAL_ORIGIN: &str = "https://sbs.naic.org";

/// JSON API strategy for jurisdictions in the API-covered set.
#[derive(Debug, Clone)]
pub struct NaicStrategy {
    code: JurisdictionCode,
    api_url: String,
    portal_url: String,
    sessions: SessionFactory,
    max_results: usize,
}

impl NaicStrategy {
    /// Create a strategy for one jurisdiction.
    pub fn new(
        code: JurisdictionCode,
        endpoints: &EndpointConfig,
        sessions: SessionFactory,
        max_results: usize,
    ) -> Self {
        Self {
            code,
            api_url: endpoints.naic_api_url.clone(),
            portal_url: endpoints.naic_portal_url.clone(),
            sessions,
            max_results,
        }
    }

    async fn search(
        &self,
        ctx: &LookupContext,
        criteria: &[(&'static str, &str)],
    ) -> Result<Vec<LicenseRecord>> {
        let client = self
            .sessions
            .new_session()
            .map_err(LookupError::session(&self.code))?;

        let mut params: Vec<(&str, &str)> = vec![
            ("jurisdiction", self.code.as_str()),
            ("searchType", "Licensee"),
            ("entityType", "IND"),
        ];
        params.extend(criteria.iter().map(|(k, v)| (*k, v.trim())));

        let request = client
            .get(&self.api_url)
            .query(&params)
            .header(ACCEPT, "application/json")
            .header(ORIGIN, PORTAL_ORIGIN)
            .header(REFERER, format!("{PORTAL_ORIGIN}/"));

        let body = fetch_text(ctx, &self.code, "search", request).await?;
        let records = map_response(&self.code, &body)?;
        let records = finish(&self.code, records, self.max_results);

        info!(
            state = %self.code,
            found = records.iter().filter(|r| r.found).count(),
            "NAIC lookup complete"
        );
        Ok(records)
    }
}

#[async_trait]
impl LicenseStrategy for NaicStrategy {
    fn state_code(&self) -> &JurisdictionCode {
        &self.code
    }

    fn manual_lookup_url(&self) -> &str {
        &self.portal_url
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::JsonApi
    }

    async fn lookup_by_name(
        &self,
        ctx: &LookupContext,
        first: &str,
        last: &str,
    ) -> Result<Vec<LicenseRecord>> {
        debug!(state = %self.code, "NAIC name lookup");
        self.search(ctx, &[("firstName", first), ("lastName", last)])
            .await
    }

    async fn lookup_by_npn(&self, ctx: &LookupContext, npn: &str) -> Result<Vec<LicenseRecord>> {
        debug!(state = %self.code, "NAIC NPN lookup");
        self.search(ctx, &[("npn", npn)]).await
    }

    async fn lookup_by_license_number(
        &self,
        ctx: &LookupContext,
        number: &str,
    ) -> Result<Vec<LicenseRecord>> {
        debug!(state = %self.code, "NAIC license number lookup");
        self.search(ctx, &[("licenseNumber", number)]).await
    }
}

/// One license object as the API returns it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiLicense {
    #[serde(deserialize_with = "loose_text")]
    name: String,
    #[serde(deserialize_with = "loose_text")]
    npn: String,
    #[serde(deserialize_with = "loose_text")]
    license_number: String,
    #[serde(deserialize_with = "loose_text")]
    license_type: String,
    #[serde(deserialize_with = "loose_text")]
    license_effective_date: String,
    #[serde(deserialize_with = "loose_text")]
    license_expiration_date: String,
    #[serde(deserialize_with = "loose_text")]
    loas: String,
    #[serde(deserialize_with = "loose_text")]
    residency: String,
    #[serde(deserialize_with = "loose_text")]
    business_address: String,
    #[serde(deserialize_with = "loose_text")]
    business_phone: String,
}

/// Accept strings, numbers, booleans and null for text fields.
fn loose_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Replace HTML line breaks (raw or entity-escaped) with newlines.
fn normalize_breaks(text: &str) -> String {
    const BREAKS: [&str; 6] = [
        "&lt;br/&gt;",
        "&lt;br /&gt;",
        "&lt;br&gt;",
        "<br/>",
        "<br />",
        "<br>",
    ];
    BREAKS
        .iter()
        .fold(text.to_string(), |acc, br| acc.replace(br, "\n"))
        .trim()
        .to_string()
}

impl ApiLicense {
    fn into_record(self, state: &JurisdictionCode) -> LicenseRecord {
        // The API has no separate status field; its license type carries it.
        let status = self.license_type.clone();
        LicenseRecord {
            active: mentions_active(&self.license_type),
            resident: self.residency.trim().eq_ignore_ascii_case("yes"),
            full_name: self.name,
            license_number: self.license_number,
            national_id: self.npn,
            license_type: self.license_type,
            status,
            expiration_date: self.license_expiration_date,
            issue_date: self.license_effective_date,
            loas: normalize_breaks(&self.loas),
            business_address: normalize_breaks(&self.business_address),
            business_phone: self.business_phone,
            ..LicenseRecord::found_in(state)
        }
    }
}

/// Classify an API response body.
///
/// An error envelope with a message is an error. A body that is not a
/// JSON array, or an empty array, is a single not-found record: the API
/// does not distinguish "no match" from "unexpected shape".
pub fn map_response(state: &JurisdictionCode, body: &str) -> Result<Vec<LicenseRecord>> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(state = %state, error = %e, "response is not JSON, treating as no match");
            return Ok(vec![LicenseRecord::not_found(state)]);
        }
    };

    if let Some(message) = value
        .get("UnexpectedError")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
    {
        return Err(LookupError::Api {
            state: state.to_string(),
            step: "search",
            message: message.to_string(),
        });
    }

    let licenses: Vec<ApiLicense> = match value {
        Value::Array(_) => match serde_json::from_value(value) {
            Ok(licenses) => licenses,
            Err(e) => {
                debug!(
                    state = %state,
                    error = %e,
                    "array holds no license objects, treating as no match"
                );
                return Ok(vec![LicenseRecord::not_found(state)]);
            }
        },
        _ => {
            debug!(state = %state, "response is not an array, treating as no match");
            return Ok(vec![LicenseRecord::not_found(state)]);
        }
    };

    if licenses.is_empty() {
        return Ok(vec![LicenseRecord::not_found(state)]);
    }

    Ok(licenses
        .into_iter()
        .map(|license| license.into_record(state))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wv() -> JurisdictionCode {
        JurisdictionCode::normalize("WV")
    }

    #[test]
    fn test_empty_array_is_not_found() {
        let records = map_response(&wv(), "[]").unwrap();
        assert_eq!(records, vec![LicenseRecord::not_found(&wv())]);
    }

    #[test]
    fn test_object_is_not_found() {
        let records = map_response(&wv(), r#"{"results": []}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].found);
    }

    #[test]
    fn test_garbage_is_not_found() {
        let records = map_response(&wv(), "<html>maintenance</html>").unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].found);
    }

    #[test]
    fn test_array_of_non_objects_is_not_found() {
        for body in [r#"["no match"]"#, "[null]", "[1, 2]"] {
            let records = map_response(&wv(), body).unwrap();
            assert_eq!(records, vec![LicenseRecord::not_found(&wv())], "body {body}");
        }
    }

    #[test]
    fn test_status_mirrors_license_type() {
        let records =
            map_response(&wv(), r#"[{"name": "DOE, JANE", "licenseType": "Producer - Expired"}]"#)
                .unwrap();
        assert_eq!(records[0].status, "Producer - Expired");
        assert!(!records[0].active);
    }

    #[test]
    fn test_error_envelope() {
        let err = map_response(&wv(), r#"{"UnexpectedError": "Invalid jurisdiction"}"#)
            .unwrap_err();
        assert!(
            matches!(err, LookupError::Api { ref message, .. } if message == "Invalid jurisdiction")
        );
    }

    #[test]
    fn test_blank_error_envelope_is_not_found() {
        let records = map_response(&wv(), r#"{"UnexpectedError": ""}"#).unwrap();
        assert!(!records[0].found);
    }

    #[test]
    fn test_maps_fields() {
        let body = r#"[{
            "name": "DOE, JANE Q",
            "npn": "1234567",
            "licenseNumber": 998877,
            "licenseType": "Insurance Producer - Active",
            "licenseEffectiveDate": "01/15/2019",
            "licenseExpirationDate": "01/31/2027",
            "loas": "Life<br/>Accident &amp; Health&lt;br/&gt;Variable Life",
            "residency": "yes",
            "businessAddress": "1 MAIN ST<br/>CHARLESTON, WV 25301",
            "businessPhone": "304-555-0100"
        }]"#;

        let records = map_response(&wv(), body).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert!(r.found);
        assert!(r.active);
        assert!(r.resident);
        assert_eq!(r.state, "WV");
        assert_eq!(r.full_name, "DOE, JANE Q");
        assert_eq!(r.national_id, "1234567");
        assert_eq!(r.license_number, "998877");
        assert_eq!(r.status, "Insurance Producer - Active");
        assert_eq!(r.issue_date, "01/15/2019");
        assert_eq!(r.expiration_date, "01/31/2027");
        assert_eq!(r.loas, "Life\nAccident &amp; Health\nVariable Life");
        assert_eq!(r.business_address, "1 MAIN ST\nCHARLESTON, WV 25301");
        assert_eq!(r.business_phone, "304-555-0100");
        assert!(r.is_life_licensed());
    }

    #[test]
    fn test_string_license_number_and_nulls() {
        let body = r#"[{"name": "ROE, RICHARD", "licenseNumber": "AB-12", "residency": null,
                        "licenseType": "Producer - Inactive Expired", "loas": null}]"#;
        let records = map_response(&wv(), body).unwrap();
        let r = &records[0];
        assert_eq!(r.license_number, "AB-12");
        assert!(!r.resident);
        assert!(r.loas.is_empty());
    }

    #[test]
    fn test_residency_must_be_yes() {
        let body = r#"[{"name": "ROE, RICHARD", "residency": "No"}]"#;
        let records = map_response(&wv(), body).unwrap();
        assert!(!records[0].resident);
        assert!(!records[0].active);
    }

    #[test]
    fn test_normalize_breaks() {
        assert_eq!(normalize_breaks("Life<br/>Health"), "Life\nHealth");
        assert_eq!(normalize_breaks("Life&lt;br/&gt;Health"), "Life\nHealth");
        assert_eq!(normalize_breaks("  Life  "), "Life");
    }
}
