//! Catalog resolution of URIs dereferenced by a transformation.

use super::UriResolver;
use crate::{
    catalog::CatalogStore, error::UriResolutionError, error::catalog_debug,
    uri::resolve_reference,
};

/// Resolves `(href, base)` pairs through the `rewriteURI` entries of a catalog.
#[derive(Debug, Clone)]
pub struct UriResolutionAdapter {
    store: CatalogStore,
}

impl UriResolutionAdapter {
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    fn absolutize(&self, href: &str, base: Option<&str>) -> Result<String, UriResolutionError> {
        let base = base.filter(|base| !base.is_empty());
        catalog_debug!(self.store, 1, "Resolve href {href} base {}\n", base.unwrap_or("(none)"));
        resolve_reference(href, base)
    }

    /// Compute the absolute form of `href` against `base`, then rewrite it
    /// through the catalog.
    ///
    /// Returns the rewritten URI on a catalog hit, the absolute URI otherwise.
    /// An empty `base` counts as no base.
    pub fn resolve(&self, href: &str, base: Option<&str>) -> Result<String, UriResolutionError> {
        let absolute = self.absolutize(href, base)?;
        Ok(self
            .store
            .lookup_by_uri_prefix(&absolute)
            .unwrap_or(absolute))
    }

    /// Same as [`UriResolutionAdapter::resolve`], but returns `None` when the
    /// catalog has no matching entry.
    pub fn lookup(
        &self,
        href: &str,
        base: Option<&str>,
    ) -> Result<Option<String>, UriResolutionError> {
        let absolute = self.absolutize(href, base)?;
        Ok(self.store.lookup_by_uri_prefix(&absolute))
    }
}

impl UriResolver for UriResolutionAdapter {
    fn resolve_uri(&self, href: &str, base: Option<&str>) -> Result<String, UriResolutionError> {
        self.resolve(href, base)
    }
}
