//! Restricted surface classification.
//!
//! Internal and privileged pages (the browser's own settings, debugging
//! surfaces, new-tab and search pages, other extensions) never receive a
//! page-side listener, page effects, or a companion panel.

use heymic_protocols::types::TabInfo;
use url::Url;

/// Schemes restricted out of the box.
pub const DEFAULT_RESTRICTED_SCHEMES: &[&str] = &[
    "about",
    "brave",
    "chrome",
    "chrome-extension",
    "chrome-native",
    "chrome-search",
    "chrome-untrusted",
    "devtools",
    "edge",
    "opera",
    "view-source",
    "vivaldi",
];

/// Pure classifier deciding whether an address may host injected UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedSurfaceGuard {
    schemes: Vec<String>,
}

impl Default for RestrictedSurfaceGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RestrictedSurfaceGuard {
    pub fn new() -> Self {
        Self {
            schemes: DEFAULT_RESTRICTED_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Add schemes on top of the defaults. Accepts `name` or `name:`.
    pub fn with_extra_schemes<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for scheme in extra {
            let scheme = scheme
                .as_ref()
                .trim()
                .trim_end_matches(':')
                .to_ascii_lowercase();
            if !scheme.is_empty() && !self.schemes.contains(&scheme) {
                self.schemes.push(scheme);
            }
        }
        self
    }

    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    /// Is this address an internal/privileged surface?
    ///
    /// Absent or empty candidates are not restricted. Text that does not
    /// parse as a URL is still restricted when it starts with `scheme:` for
    /// one of the restricted schemes.
    pub fn is_restricted(&self, candidate: Option<&str>) -> bool {
        let Some(raw) = candidate.map(str::trim).filter(|s| !s.is_empty()) else {
            return false;
        };
        match Url::parse(raw) {
            Ok(parsed) => self.is_restricted_scheme(parsed.scheme()),
            Err(_) => self.matches_scheme_prefix(raw),
        }
    }

    /// A tab is restricted only when every address it reports is restricted.
    ///
    /// A tab navigating away from an internal page becomes eligible as soon
    /// as its pending address is an ordinary one. A tab reporting no address
    /// at all is not restricted.
    pub fn is_restricted_tab(&self, tab: &TabInfo) -> bool {
        let mut seen_any = false;
        for url in tab.candidate_urls() {
            seen_any = true;
            if !self.is_restricted(Some(url)) {
                return false;
            }
        }
        seen_any
    }

    fn is_restricted_scheme(&self, scheme: &str) -> bool {
        self.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }

    fn matches_scheme_prefix(&self, raw: &str) -> bool {
        let lower = raw.to_ascii_lowercase();
        self.schemes.iter().any(|scheme| {
            lower
                .strip_prefix(scheme.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
        })
    }
}
