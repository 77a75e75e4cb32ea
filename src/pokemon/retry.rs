//! Base-Form Retry Module
//!
//! Hyphenated names often denote variants ("pikachu-gmax", "giratina-origin")
//! the entity endpoint does not know. When such a lookup comes back NotFound,
//! the retry policy falls back to the substring before the first hyphen — the
//! base form — with an explicit depth bound instead of open recursion.

// == Base Form Retry ==
/// Tagged retry policy: trigger = NotFound on a name containing the
/// separator; transform = take the substring before the first separator.
#[derive(Debug, Clone, Copy)]
pub struct BaseFormRetry {
    /// Maximum number of fallback attempts after the original lookup
    pub max_depth: usize,
}

impl Default for BaseFormRetry {
    fn default() -> Self {
        Self { max_depth: 1 }
    }
}

impl BaseFormRetry {
    const SEPARATOR: char = '-';

    /// The next query to attempt after `query` came back NotFound, or `None`
    /// when the policy does not apply (no separator, or depth exhausted).
    pub fn next_attempt(&self, query: &str, depth: usize) -> Option<String> {
        if depth >= self.max_depth {
            return None;
        }
        let base = query.split(Self::SEPARATOR).next()?;
        if base.is_empty() || base == query {
            return None;
        }
        Some(base.to_string())
    }
}
