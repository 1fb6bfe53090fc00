use crate::runtime::{Error, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;

pub trait Collation: Send + Sync {
    fn uri(&self) -> &str;
    fn compare(&self, a: &str, b: &str) -> core::cmp::Ordering;
    /// Key under which two strings that compare equal hash identically.
    fn key(&self, s: &str) -> String {
        s.to_string()
    }
}

pub use crate::consts::CODEPOINT_URI;
pub use crate::consts::SIMPLE_ACCENT_URI;
pub use crate::consts::SIMPLE_CASE_ACCENT_URI;
pub use crate::consts::SIMPLE_CASE_URI;

pub struct CodepointCollation;

impl Collation for CodepointCollation {
    fn uri(&self) -> &str {
        CODEPOINT_URI
    }
    fn compare(&self, a: &str, b: &str) -> core::cmp::Ordering {
        a.cmp(b)
    }
}

/// Simple case-insensitive collation
pub struct SimpleCaseCollation;

impl Collation for SimpleCaseCollation {
    fn uri(&self) -> &str {
        SIMPLE_CASE_URI
    }
    fn compare(&self, a: &str, b: &str) -> core::cmp::Ordering {
        self.key(a).cmp(&self.key(b))
    }
    fn key(&self, s: &str) -> String {
        s.to_lowercase()
    }
}

/// Simple accent-insensitive collation (NFD + remove combining marks)
pub struct SimpleAccentCollation;

impl Collation for SimpleAccentCollation {
    fn uri(&self) -> &str {
        SIMPLE_ACCENT_URI
    }
    fn compare(&self, a: &str, b: &str) -> core::cmp::Ordering {
        self.key(a).cmp(&self.key(b))
    }
    fn key(&self, s: &str) -> String {
        strip_marks(s)
    }
}

/// Simple case+accent-insensitive collation
pub struct SimpleCaseAccentCollation;

impl Collation for SimpleCaseAccentCollation {
    fn uri(&self) -> &str {
        SIMPLE_CASE_ACCENT_URI
    }
    fn compare(&self, a: &str, b: &str) -> core::cmp::Ordering {
        self.key(a).cmp(&self.key(b))
    }
    fn key(&self, s: &str) -> String {
        strip_marks(s).to_lowercase()
    }
}

fn strip_marks(s: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    use unicode_normalization::char::canonical_combining_class as ccc;
    s.nfd().filter(|&ch| ccc(ch) == 0).collect()
}

/// Wraps a collation so that strings differing only in letter case are
/// ordered with upper case (or lower case) first.
///
/// Strings are first compared case-blind under the base collation; only ties
/// are broken by the case of the first differing character, and remaining
/// ties fall back to the base collation proper.
pub struct CaseOrderCollation {
    base: Arc<dyn Collation>,
    upper_first: bool,
    uri: String,
}

impl CaseOrderCollation {
    pub fn new(base: Arc<dyn Collation>, upper_first: bool) -> Self {
        let uri = format!(
            "{}#{}",
            base.uri(),
            if upper_first { "upper-first" } else { "lower-first" }
        );
        Self { base, upper_first, uri }
    }
}

impl Collation for CaseOrderCollation {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn compare(&self, a: &str, b: &str) -> core::cmp::Ordering {
        use core::cmp::Ordering;
        let primary = self.base.compare(&a.to_lowercase(), &b.to_lowercase());
        if primary != Ordering::Equal {
            return primary;
        }
        for (x, y) in a.chars().zip(b.chars()) {
            if x == y {
                continue;
            }
            if x.is_uppercase() && y.is_lowercase() {
                return if self.upper_first { Ordering::Less } else { Ordering::Greater };
            }
            if x.is_lowercase() && y.is_uppercase() {
                return if self.upper_first { Ordering::Greater } else { Ordering::Less };
            }
        }
        self.base.compare(a, b)
    }

    fn key(&self, s: &str) -> String {
        self.base.key(s)
    }
}

/// Registry of available collations, keyed by their URI
pub struct CollationRegistry {
    by_uri: HashMap<String, Arc<dyn Collation>>,
}

impl Default for CollationRegistry {
    fn default() -> Self {
        let mut reg = Self {
            by_uri: HashMap::new(),
        };
        let def: Arc<dyn Collation> = Arc::new(CodepointCollation);
        reg.by_uri.insert(def.uri().to_string(), def);
        // Built-in simple collations
        reg.by_uri
            .insert(SIMPLE_CASE_URI.to_string(), Arc::new(SimpleCaseCollation));
        reg.by_uri.insert(
            SIMPLE_ACCENT_URI.to_string(),
            Arc::new(SimpleAccentCollation),
        );
        reg.by_uri.insert(
            SIMPLE_CASE_ACCENT_URI.to_string(),
            Arc::new(SimpleCaseAccentCollation),
        );
        reg
    }
}

impl CollationRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, uri: &str) -> Option<Arc<dyn Collation>> {
        self.by_uri.get(uri).cloned()
    }
    pub fn insert(&mut self, collation: Arc<dyn Collation>) {
        self.by_uri.insert(collation.uri().to_string(), collation);
    }
}

/// Resolve a possibly relative collation URI against the static base URI.
///
/// Absolute URIs are returned unchanged (not normalized) so they match the
/// registry keys verbatim.
pub fn expand_collation_uri(uri: &str, base_uri: Option<&str>) -> Result<String, Error> {
    if url::Url::parse(uri).is_ok() {
        return Ok(uri.to_string());
    }
    let Some(base) = base_uri else {
        return Err(Error::from_code(
            ErrorCode::FOCH0002,
            format!("relative collation URI without base URI: {uri}"),
        ));
    };
    let base = url::Url::parse(base).map_err(|e| {
        Error::from_code(ErrorCode::FOCH0002, format!("invalid base URI {base}: {e}"))
    })?;
    base.join(uri).map(|u| u.to_string()).map_err(|e| {
        Error::from_code(ErrorCode::FOCH0002, format!("cannot resolve collation URI {uri}: {e}"))
    })
}
