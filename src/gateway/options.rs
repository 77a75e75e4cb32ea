//! Execute Options Module
//!
//! Explicit per-call configuration for the gateway, replacing the
//! duck-typed options object of a looser runtime.

use serde_json::Value;

use crate::error::Result;

/// Converts a raw database response into plain, cache-safe data.
pub type TransformFn<Raw> = Box<dyn FnOnce(Raw) -> Result<Value> + Send>;

// == Execute Options ==
/// Recognized options for one gateway call.
///
/// Raw database responses can carry live handles and are not safe to cache;
/// every cacheable read must pass through a transform that extracts plain
/// data. When no transform is given, the raw result is serialized as-is,
/// which is only correct for results that are already plain.
pub struct ExecuteOptions<Raw> {
    /// Consult and populate the short-lived result cache (reads only)
    pub use_cache: bool,
    /// Optional extraction of plain data from the raw result
    pub transform: Option<TransformFn<Raw>>,
}

impl<Raw> Default for ExecuteOptions<Raw> {
    fn default() -> Self {
        Self {
            use_cache: false,
            transform: None,
        }
    }
}

impl<Raw> ExecuteOptions<Raw> {
    /// Options for an uncached call with no transform.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Options for a cacheable read with no transform.
    pub fn cached() -> Self {
        Self {
            use_cache: true,
            transform: None,
        }
    }

    /// Sets the result transform.
    pub fn with_transform(
        mut self,
        transform: impl FnOnce(Raw) -> Result<Value> + Send + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let opts = ExecuteOptions::<Value>::default();
        assert!(!opts.use_cache);
        assert!(opts.transform.is_none());
    }

    #[test]
    fn test_cached_with_transform() {
        let opts = ExecuteOptions::<Vec<u32>>::cached()
            .with_transform(|ids| Ok(json!({ "count": ids.len() })));

        assert!(opts.use_cache);
        let transform = opts.transform.unwrap();
        assert_eq!(transform(vec![1, 2, 3]).unwrap(), json!({"count": 3}));
    }
}
