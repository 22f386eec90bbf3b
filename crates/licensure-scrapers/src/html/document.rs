//! A parsed page and the few queries the lookup flows need.

use scraper::{ElementRef, Html, Selector};

/// Parse a selector known at compile time.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full document. HTML parsing is lenient and never fails.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// First element matching `selector`.
    #[must_use]
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// All elements matching `selector`, in document order.
    pub fn select_all<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }

    /// Attribute of the first element matching `selector`.
    #[must_use]
    pub fn attr(&self, selector: &Selector, name: &str) -> Option<String> {
        self.select_first(selector)
            .and_then(|el| el.value().attr(name))
            .map(|v| v.trim().to_string())
    }

    /// `value` of the `<input>` named `name`, if present.
    #[must_use]
    pub fn input_value(&self, name: &str) -> Option<String> {
        let selector = Selector::parse(&format!("input[name=\"{name}\"]")).ok()?;
        self.attr(&selector, "value")
    }
}

/// Text content of an element with whitespace runs collapsed.
#[must_use]
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
