use crate::error::{Result, SessionError};
use url::Url;

/// Resolve a link found in a page against the page's base URL.
///
/// Absolute links are returned unchanged; relative ones are appended to
/// the base, keeping any path prefix the base carries.
pub fn join_url(base: &str, href: &str) -> Result<String> {
    let href = href.trim();
    if let Ok(absolute) = Url::parse(href) {
        return Ok(absolute.to_string());
    }

    let mut base =
        Url::parse(base).map_err(|e| SessionError::InvalidUrl(format!("{base}: {e}")))?;
    if !base.path().ends_with('/') && !href.starts_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let joined = if href.starts_with('/') {
        let prefix = base.path().trim_end_matches('/').to_string();
        let root_relative = href.trim_start_matches('/');
        let mut with_prefix = base.clone();
        with_prefix.set_path(&format!("{prefix}/"));
        with_prefix.join(root_relative)
    } else {
        base.join(href)
    };

    joined
        .map(|u| u.to_string())
        .map_err(|e| SessionError::InvalidUrl(format!("{href}: {e}")))
}
