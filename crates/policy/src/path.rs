//! Vault path normalization and allowlist matching.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// How an allowlist entry is matched against a candidate path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMatch {
    /// Plain string prefix: `Proj` admits `Project2/x`.
    #[default]
    Prefix,
    /// Prefix that must end on a segment boundary: `Project` admits
    /// `Project` and `Project/x`, but not `Project2/x`.
    Segment,
}

/// Normalize a vault-relative path.
///
/// Runs of `/` and `\` collapse to a single `/`, leading and trailing
/// separators are stripped, non-breaking spaces become plain spaces and the
/// result is NFC-composed. A path with nothing left normalizes to `/`.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut pending_sep = false;

    for c in path.chars() {
        match c {
            '/' | '\\' => pending_sep = true,
            _ => {
                if pending_sep && !out.is_empty() {
                    out.push('/');
                }
                pending_sep = false;
                out.push(match c {
                    '\u{00A0}' | '\u{202F}' => ' ',
                    other => other,
                });
            }
        }
    }

    if out.is_empty() {
        return "/".to_string();
    }
    out.nfc().collect()
}

/// Parsed list of allowed vault path prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathAllowlist {
    prefixes: Vec<String>,
    mode: PathMatch,
}

impl PathAllowlist {
    /// Parse a comma-separated allowlist. Blank segments are ignored.
    pub fn parse(spec: &str) -> Self {
        let prefixes = spec
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(normalize_path)
            .collect();

        Self {
            prefixes,
            mode: PathMatch::default(),
        }
    }

    /// Use a different matching mode.
    pub fn with_mode(mut self, mode: PathMatch) -> Self {
        self.mode = mode;
        self
    }

    /// No entries means no restriction.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether `path` falls under at least one entry.
    pub fn permits(&self, path: &str) -> bool {
        if self.is_empty() {
            return true;
        }

        let candidate = normalize_path(path);
        self.prefixes.iter().any(|prefix| match self.mode {
            PathMatch::Prefix => candidate.starts_with(prefix.as_str()),
            PathMatch::Segment => {
                candidate == *prefix
                    || candidate
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        })
    }
}

/// Check `path` against a comma-separated allowlist using plain prefix
/// matching. An empty or blank allowlist permits everything.
pub fn is_path_allowed(path: &str, allowed_paths: &str) -> bool {
    PathAllowlist::parse(allowed_paths).permits(path)
}
