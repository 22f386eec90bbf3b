//! The normalized license record and lookup queries.

use crate::types::JurisdictionCode;
use serde::{Deserialize, Serialize};

/// One license found for a query, or the single sentinel returned when
/// nothing was found.
///
/// Every text field uses the empty string for "unknown". When `found` is
/// false only `state` and `error` carry meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct LicenseRecord {
    /// Whether this record describes an actual license
    pub found: bool,
    /// Derived from the jurisdiction's status text
    pub active: bool,
    /// Derived from the jurisdiction's residency field
    pub resident: bool,
    /// Licensee name as the jurisdiction reports it
    pub full_name: String,
    /// Jurisdiction-issued license number
    pub license_number: String,
    /// National Producer Number
    pub national_id: String,
    /// Two-letter jurisdiction code
    pub state: String,
    /// License type or class
    pub license_type: String,
    /// Raw status text
    pub status: String,
    /// Expiration date as reported
    pub expiration_date: String,
    /// Issue or effective date as reported
    pub issue_date: String,
    /// Lines of authority, newline separated
    pub loas: String,
    /// Business address
    pub business_address: String,
    /// Business phone
    pub business_phone: String,
    /// Contact email
    pub email: String,
    /// County
    pub county: String,
    /// Manual-lookup instruction or partial-failure note
    pub error: String,
}

impl LicenseRecord {
    /// A `found=true` record for the given jurisdiction with every other
    /// field empty, to be filled in by the caller.
    #[must_use]
    pub fn found_in(state: &JurisdictionCode) -> Self {
        Self {
            found: true,
            state: state.to_string(),
            ..Self::default()
        }
    }

    /// The "no match" sentinel.
    #[must_use]
    pub fn not_found(state: &JurisdictionCode) -> Self {
        Self {
            found: false,
            state: state.to_string(),
            ..Self::default()
        }
    }

    /// A `found=false` record carrying an explanatory message.
    #[must_use]
    pub fn not_found_with_error(state: &JurisdictionCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::not_found(state)
        }
    }

    /// Whether the record satisfies the record invariant: a found record
    /// names a licensee or a license number.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.found || !self.full_name.is_empty() || !self.license_number.is_empty()
    }

    /// Returns true if the license is active and covers life insurance.
    ///
    /// Substring matching on "life" is sufficient for insurance license
    /// types and lines of authority.
    #[must_use]
    pub fn is_life_licensed(&self) -> bool {
        if !self.active {
            return false;
        }
        let haystack = format!(
            "{} {}",
            self.license_type.to_lowercase(),
            self.loas.to_lowercase()
        );
        haystack.contains("life")
    }
}

/// A lookup request against one jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum LookupQuery {
    /// Search by licensee name
    Name {
        /// First name
        first: String,
        /// Last name
        last: String,
    },
    /// Search by National Producer Number
    Npn {
        /// The NPN
        npn: String,
    },
    /// Search by jurisdiction license number
    LicenseNumber {
        /// The license number
        number: String,
    },
}

impl LookupQuery {
    /// Short label used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Name { .. } => "name",
            Self::Npn { .. } => "npn",
            Self::LicenseNumber { .. } => "license_number",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fl() -> JurisdictionCode {
        JurisdictionCode::normalize("FL")
    }

    #[test]
    fn test_not_found_sentinel() {
        let record = LicenseRecord::not_found(&fl());
        assert!(!record.found);
        assert_eq!(record.state, "FL");
        assert!(record.error.is_empty());
        assert!(record.is_consistent());
    }

    #[test]
    fn test_not_found_with_error() {
        let record = LicenseRecord::not_found_with_error(&fl(), "verify manually");
        assert!(!record.found);
        assert_eq!(record.error, "verify manually");
    }

    #[test]
    fn test_found_record_needs_identity() {
        let mut record = LicenseRecord::found_in(&fl());
        assert!(!record.is_consistent());

        record.license_number = "W123456".to_string();
        assert!(record.is_consistent());
    }

    #[test]
    fn test_is_life_licensed() {
        let mut record = LicenseRecord::found_in(&fl());
        record.full_name = "DOE, JANE".to_string();
        record.license_type = "Life & Health".to_string();
        assert!(!record.is_life_licensed(), "inactive licenses never count");

        record.active = true;
        assert!(record.is_life_licensed());

        record.license_type = "Property".to_string();
        record.loas = "Casualty\nLife".to_string();
        assert!(record.is_life_licensed());

        record.loas = "Casualty".to_string();
        assert!(!record.is_life_licensed());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut record = LicenseRecord::found_in(&fl());
        record.full_name = "DOE, JANE".to_string();
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["fullName"], "DOE, JANE");
        assert_eq!(json["nationalId"], "");
        assert_eq!(json["found"], true);
    }

    #[test]
    fn test_query_kind() {
        let query = LookupQuery::Npn {
            npn: "1234567".to_string(),
        };
        assert_eq!(query.kind(), "npn");

        let json = serde_json::to_value(&query).expect("serialize query");
        assert_eq!(json["by"], "npn");
    }
}
