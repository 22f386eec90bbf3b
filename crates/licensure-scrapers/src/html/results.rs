//! Search results pages: empty-result detection and summary rows.

use crate::html::document::{selector, text_of, Document};
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

/// Check a raw results body for a jurisdiction's "nothing matched" text.
///
/// Runs before any table lookup so renamed or missing table markup on an
/// empty result can't be mistaken for a parsing problem.
#[must_use]
pub fn indicates_no_results(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("no licensee") || lower.contains("no results")
}

/// Where a jurisdiction's summary table keeps each field.
#[derive(Debug, Clone, Copy)]
pub struct ColumnLayout {
    /// CSS selector for the results table
    pub table: &'static str,
    /// Rows with fewer cells are skipped
    pub min_cells: usize,
    /// Column holding the licensee name
    pub name: usize,
    /// Column holding the license number
    pub license_number: usize,
    /// Column holding the license type, if the table has one
    pub license_type: Option<usize>,
    /// Column holding the status, if the table has one
    pub status: Option<usize>,
    /// The name cell must contain a detail link; rows without one are skipped
    pub name_link: bool,
}

/// One row of a results table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRow {
    /// Licensee name
    pub full_name: String,
    /// License number
    pub license_number: String,
    /// License type, empty if the table has no such column
    pub license_type: String,
    /// Status text, empty if the table has no such column
    pub status: String,
    /// Link to the detail page, as written in the page
    pub detail_href: Option<String>,
}

/// Outcome of reading a results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsPage {
    /// The page said nothing matched
    NoResults,
    /// Rows read, in page order, capped
    Rows(Vec<SummaryRow>),
}

impl ColumnLayout {
    /// Read at most `cap` usable rows from a results page.
    #[must_use]
    pub fn parse(&self, body: &str, cap: usize) -> ResultsPage {
        if indicates_no_results(body) {
            debug!("results page reports no matches");
            return ResultsPage::NoResults;
        }

        let document = Document::parse(body);
        let Ok(table_selector) = Selector::parse(self.table) else {
            warn!(table = self.table, "invalid results table selector");
            return ResultsPage::Rows(Vec::new());
        };
        let row_selector = selector("tbody > tr");

        let Some(table) = document.select_first(&table_selector) else {
            warn!(table = self.table, "results table not found");
            return ResultsPage::Rows(Vec::new());
        };

        // Rows of tables nested inside a cell belong to that cell.
        let rows: Vec<SummaryRow> = table
            .select(&row_selector)
            .filter(|row| belongs_to(*row, table))
            .filter_map(|row| self.read_row(row))
            .take(cap)
            .collect();

        debug!(rows = rows.len(), "parsed results table");
        ResultsPage::Rows(rows)
    }

    fn read_row(&self, row: ElementRef<'_>) -> Option<SummaryRow> {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| cell.value().name() == "td")
            .collect();
        if cells.len() < self.min_cells.max(1) {
            return None;
        }
        let cell_text = |index: Option<usize>| {
            index
                .and_then(|i| cells.get(i))
                .map(|cell| text_of(*cell))
                .unwrap_or_default()
        };

        let (full_name, detail_href) = if self.name_link {
            let link = cells
                .get(self.name)?
                .select(&selector("a[href]"))
                .next()?;
            let href = link.value().attr("href")?.trim().to_string();
            (text_of(link), Some(href))
        } else {
            (cell_text(Some(self.name)), None)
        };

        let summary = SummaryRow {
            full_name,
            license_number: cell_text(Some(self.license_number)),
            license_type: cell_text(self.license_type),
            status: cell_text(self.status),
            detail_href,
        };

        if summary.full_name.is_empty() && summary.license_number.is_empty() {
            return None;
        }
        Some(summary)
    }
}

/// Whether `table` is the closest enclosing table of `row`.
fn belongs_to(row: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    row.ancestors()
        .find(|node| {
            node.value()
                .as_element()
                .is_some_and(|element| element.name() == "table")
        })
        .is_some_and(|node| node.id() == table.id())
}
