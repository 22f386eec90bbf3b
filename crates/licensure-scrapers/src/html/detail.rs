//! Licensee detail pages: labeled fields plus titled panels of tables.
//!
//! A detail page looks like
//!
//! ```html
//! <div class="form-group"><label>NPN #:</label><div>1234567</div></div>
//! <div class="panel">
//!   <div class="panel-heading">Valid Licenses</div>
//!   <table><tbody><tr><td>Life &amp; Health</td><td>01/15/2019</td></tr></tbody></table>
//! </div>
//! ```
//!
//! Status comes from which panel a license sits in, not from a status
//! field. Expiration comes from the appointment panels.

use crate::html::document::{selector, text_of, Document};
use licensure_core::LicenseRecord;
use scraper::ElementRef;
use std::collections::HashMap;

/// Which license panel an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// Listed under a valid-licenses heading
    Valid,
    /// Listed under an invalid-licenses heading
    Invalid,
}

impl Standing {
    /// Status text reported on the record.
    #[must_use]
    pub fn as_status(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
        }
    }
}

/// One license row from a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseEntry {
    /// License type text
    pub license_type: String,
    /// Issue date text
    pub issue_date: String,
    /// Panel the row came from
    pub standing: Standing,
}

impl LicenseEntry {
    fn is_life_or_health(&self) -> bool {
        let lower = self.license_type.to_lowercase();
        lower.contains("life") || lower.contains("health")
    }
}

/// Lowercase a label into a lookup key: trailing colon dropped, spaces
/// become underscores, `#` becomes `num`.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('#', "num")
}

/// Pick the license to report.
///
/// Order: the first valid license whose type mentions life or health, then
/// the first valid license, then the first invalid license.
#[must_use]
pub fn choose_license<'a>(
    valid: &'a [LicenseEntry],
    invalid: &'a [LicenseEntry],
) -> Option<&'a LicenseEntry> {
    valid
        .iter()
        .find(|entry| entry.is_life_or_health())
        .or_else(|| valid.first())
        .or_else(|| invalid.first())
}

#[derive(Clone, Copy)]
enum PanelKind {
    Licenses(Standing),
    Appointments,
}

fn classify_heading(heading: &str) -> Option<PanelKind> {
    let heading = heading.to_lowercase();
    // "invalid license" contains "valid license"; test it first.
    if heading.contains("invalid license") {
        Some(PanelKind::Licenses(Standing::Invalid))
    } else if heading.contains("valid license") {
        Some(PanelKind::Licenses(Standing::Valid))
    } else if heading.contains("appointment") {
        Some(PanelKind::Appointments)
    } else {
        None
    }
}

/// Everything extracted from one detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPage {
    /// Labeled fields keyed by [`normalize_label`]
    pub fields: HashMap<String, String>,
    /// Rows from valid-license panels, in page order
    pub valid: Vec<LicenseEntry>,
    /// Rows from invalid-license panels, in page order
    pub invalid: Vec<LicenseEntry>,
    /// First non-empty expiration date from an appointment panel
    pub expiration: Option<String>,
}

impl DetailPage {
    /// Extract fields and panels from a detail page body.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let document = Document::parse(body);
        let mut page = Self::default();

        let group_selector = selector("div.form-group");
        let label_selector = selector("label");
        for group in document.select_all(&group_selector) {
            let Some(label) = group.select(&label_selector).next() else {
                continue;
            };
            let Some(value) = label.next_siblings().find_map(ElementRef::wrap) else {
                continue;
            };
            let value = text_of(value);
            if value.is_empty() {
                continue;
            }
            page.fields.insert(normalize_label(&text_of(label)), value);
        }

        let panel_selector = selector("div.panel");
        let heading_selector = selector("div.panel-heading");
        let row_selector = selector("table tbody tr");
        let cell_selector = selector("td");
        for panel in document.select_all(&panel_selector) {
            let Some(heading) = panel.select(&heading_selector).next() else {
                continue;
            };
            let Some(kind) = classify_heading(&text_of(heading)) else {
                continue;
            };

            for row in panel.select(&row_selector) {
                let cells: Vec<String> = row.select(&cell_selector).map(text_of).collect();
                match kind {
                    PanelKind::Licenses(standing) if cells.len() >= 2 => {
                        let entry = LicenseEntry {
                            license_type: cells[0].clone(),
                            issue_date: cells[1].clone(),
                            standing,
                        };
                        match standing {
                            Standing::Valid => page.valid.push(entry),
                            Standing::Invalid => page.invalid.push(entry),
                        }
                    }
                    PanelKind::Appointments if page.expiration.is_none() && cells.len() >= 3 => {
                        if !cells[2].is_empty() {
                            page.expiration = Some(cells[2].clone());
                        }
                    }
                    _ => {}
                }
            }
        }

        page
    }

    /// A labeled field, or the empty string.
    #[must_use]
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map_or("", String::as_str)
    }

    /// The license chosen by [`choose_license`].
    #[must_use]
    pub fn chosen_license(&self) -> Option<&LicenseEntry> {
        choose_license(&self.valid, &self.invalid)
    }

    /// Merge into a record built from a summary row. Summary values win for
    /// name and license number; everything else comes from the page.
    pub fn apply_to(&self, record: &mut LicenseRecord) {
        if record.full_name.is_empty() {
            record.full_name = self.field("full_name").to_string();
        }
        if record.license_number.is_empty() {
            let number = match self.field("license_num") {
                "" => self.field("license"),
                number => number,
            };
            record.license_number = number.to_string();
        }

        record.national_id = self.field("npn_num").to_string();
        record.email = self.field("email").to_string();
        record.business_phone = self.field("phone").to_string();
        record.business_address = self.field("business_address").to_string();
        record.county = self.field("county").to_string();
        record.expiration_date = self.expiration.clone().unwrap_or_default();

        if let Some(license) = self.chosen_license() {
            record.license_type = license.license_type.clone();
            record.issue_date = license.issue_date.clone();
            record.status = license.standing.as_status().to_string();
        }
        record.active = record.status.eq_ignore_ascii_case("VALID");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use licensure_core::JurisdictionCode;

    fn panel(heading: &str, rows: &[&[&str]]) -> String {
        let rows: String = rows
            .iter()
            .map(|cells| {
                let cells: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
                format!("<tr>{cells}</tr>")
            })
            .collect();
        format!(
            "<div class=\"panel panel-default\"><div class=\"panel-heading\">{heading}</div>\
             <div class=\"panel-body\"><table class=\"table\"><thead><tr><th>Type</th></tr></thead>\
             <tbody>{rows}</tbody></table></div></div>"
        )
    }

    fn page(parts: &[String]) -> String {
        format!("<html><body>{}</body></html>", parts.concat())
    }

    fn entry(license_type: &str, standing: Standing) -> LicenseEntry {
        LicenseEntry {
            license_type: license_type.to_string(),
            issue_date: String::new(),
            standing,
        }
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("NPN #:"), "npn_num");
        assert_eq!(normalize_label("  License #: "), "license_num");
        assert_eq!(normalize_label("Business Address:"), "business_address");
        assert_eq!(normalize_label("Email"), "email");
    }

    #[test]
    fn test_valid_beats_type_preference() {
        let body = page(&[
            panel("Invalid Licenses", &[&["Life", "01/01/2010"]]),
            panel("Valid Licenses", &[&["Property", "02/02/2020"]]),
        ]);
        let detail = DetailPage::parse(&body);

        assert_eq!(detail.invalid.len(), 1, "invalid panel must not land in valid bucket");
        let chosen = detail.chosen_license().unwrap();
        assert_eq!(chosen.license_type, "Property");
        assert_eq!(chosen.standing, Standing::Valid);
    }

    #[test]
    fn test_life_preferred_among_valid() {
        let body = page(&[panel(
            "Valid Licenses",
            &[&["Property", "02/02/2020"], &["Life", "03/03/2021"]],
        )]);
        let detail = DetailPage::parse(&body);
        assert_eq!(detail.chosen_license().unwrap().license_type, "Life");
    }

    #[test]
    fn test_choose_license_order() {
        let valid = [entry("Property", Standing::Valid), entry("Health", Standing::Valid)];
        let invalid = [entry("Life", Standing::Invalid)];

        assert_eq!(choose_license(&valid, &invalid).unwrap().license_type, "Health");
        assert_eq!(choose_license(&valid[..1], &invalid).unwrap().license_type, "Property");
        assert_eq!(choose_license(&[], &invalid).unwrap().license_type, "Life");
        assert!(choose_license(&[], &[]).is_none());
    }

    #[test]
    fn test_expiration_from_first_appointment_row() {
        let body = page(&[
            panel("Valid Licenses", &[&["Life", "01/01/2019"]]),
            panel(
                "Active Appointments",
                &[
                    &["ACME LIFE", "01/02/2019", ""],
                    &["ACME LIFE", "01/02/2019", "12/31/2026", "01/03/2019"],
                    &["OTHER CO", "01/02/2019", "06/30/2025", "01/03/2019"],
                ],
            ),
            panel(
                "Inactive Appointments",
                &[&["OLD CO", "01/02/2001", "01/01/2002"]],
            ),
        ]);
        let detail = DetailPage::parse(&body);
        assert_eq!(detail.expiration.as_deref(), Some("12/31/2026"));
    }

    #[test]
    fn test_labeled_fields() {
        let body = page(&[
            "<div class=\"form-group\"><label class=\"control-label\">NPN #:</label>\
             <div class=\"col-md-8\">1234567</div></div>"
                .to_string(),
            "<div class=\"form-group\"><label>Email:</label>\n  <div> jane@example.com </div></div>"
                .to_string(),
            "<div class=\"form-group\"><label>County:</label><div>DUVAL</div></div>".to_string(),
            "<div class=\"form-group\"><label>County:</label><div>  </div></div>".to_string(),
            "<div class=\"form-group\"><label>Orphan:</label></div>".to_string(),
        ]);
        let detail = DetailPage::parse(&body);

        assert_eq!(detail.field("npn_num"), "1234567");
        assert_eq!(detail.field("email"), "jane@example.com");
        assert_eq!(detail.field("county"), "DUVAL", "empty value must not overwrite");
        assert_eq!(detail.field("orphan"), "");
    }

    #[test]
    fn test_apply_to_record() {
        let body = page(&[
            "<div class=\"form-group\"><label>License #:</label><div>W999999</div></div>"
                .to_string(),
            "<div class=\"form-group\"><label>Phone:</label><div>(904) 555-0100</div></div>"
                .to_string(),
            "<div class=\"form-group\"><label>Business Address:</label><div>1 MAIN ST JACKSONVILLE, FL</div></div>"
                .to_string(),
            panel("Valid Licenses", &[&["2-15 Life Including Variable Annuity", "05/05/2015"]]),
            panel("Active Appointments", &[&["ACME", "05/06/2015", "09/30/2026"]]),
        ]);
        let detail = DetailPage::parse(&body);

        let mut record = LicenseRecord::found_in(&JurisdictionCode::normalize("FL"));
        record.full_name = "DOE, JANE".to_string();
        record.license_number = "W123456".to_string();
        detail.apply_to(&mut record);

        assert_eq!(record.license_number, "W123456", "summary value wins");
        assert_eq!(record.status, "VALID");
        assert!(record.active);
        assert_eq!(record.license_type, "2-15 Life Including Variable Annuity");
        assert_eq!(record.issue_date, "05/05/2015");
        assert_eq!(record.expiration_date, "09/30/2026");
        assert_eq!(record.business_phone, "(904) 555-0100");
        assert_eq!(record.business_address, "1 MAIN ST JACKSONVILLE, FL");
        assert!(record.is_life_licensed());
    }

    #[test]
    fn test_invalid_only_is_inactive() {
        let body = page(&[panel("Invalid Licenses", &[&["Life", "01/01/2010"]])]);
        let mut record = LicenseRecord::found_in(&JurisdictionCode::normalize("FL"));
        DetailPage::parse(&body).apply_to(&mut record);
        assert_eq!(record.status, "INVALID");
        assert!(!record.active);
    }
}
