//! DOI normalisation.

use once_cell::sync::Lazy;
use regex::Regex;

static RESOLVER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://doi\.org/").unwrap());

/// Strip a leading `https://doi.org/` (any case, http or https) and lower-case.
/// Empty input is `None`.
pub fn normalize_doi(doi: Option<&str>) -> Option<String> {
    let doi = doi?.trim();
    if doi.is_empty() {
        return None;
    }
    let bare = RESOLVER_PREFIX_RE.replace(doi, "").to_lowercase();
    if bare.is_empty() {
        None
    } else {
        Some(bare)
    }
}

/// Resolver link for a normalised DOI.
pub fn doi_url(doi: &str) -> String {
    format!("https://doi.org/{}", doi)
}
