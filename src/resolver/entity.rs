//! Catalog resolution of external identifiers met while parsing.

use super::{EntityResolver, ResolvedInput};
use crate::{catalog::CatalogStore, error::catalog_debug};

/// Resolves `(publicId, systemId)` pairs through a catalog.
#[derive(Debug, Clone)]
pub struct EntityResolutionAdapter {
    store: CatalogStore,
}

impl EntityResolutionAdapter {
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Do a complete resolution lookup of an External Identifier.
    ///
    /// The public identifier is looked up first, then the system identifier.
    /// Empty identifiers are treated as missing.
    ///
    /// Returns `None` if the catalog has no mapping for either identifier;
    /// the caller then falls back to its own resolution.
    #[doc(alias = "xmlACatalogResolve")]
    pub fn resolve_entity(
        &self,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Option<ResolvedInput> {
        let public_id = public_id.filter(|id| !id.is_empty());
        let system_id = system_id.filter(|id| !id.is_empty());
        match (public_id, system_id) {
            (None, None) => return None,
            (Some(pub_id), Some(sys_id)) => {
                catalog_debug!(self.store, 1, "Resolve: pubID {pub_id} sysID {sys_id}\n");
            }
            (Some(pub_id), None) => {
                catalog_debug!(self.store, 1, "Resolve: pubID {pub_id}\n");
            }
            (None, Some(sys_id)) => {
                catalog_debug!(self.store, 1, "Resolve: sysID {sys_id}\n");
            }
        }

        let target = public_id
            .and_then(|id| self.store.lookup_by_public_id(id))
            .or_else(|| system_id.and_then(|id| self.store.lookup_by_system_id(id)))?;
        Some(ResolvedInput {
            public_id: public_id.map(|id| id.to_owned()),
            system_id: target,
            original_system_id: system_id.map(|id| id.to_owned()),
        })
    }
}

impl EntityResolver for EntityResolutionAdapter {
    fn resolve_entity(
        &self,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Option<ResolvedInput> {
        EntityResolutionAdapter::resolve_entity(self, public_id, system_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;

    fn adapter() -> EntityResolutionAdapter {
        let mut builder = CatalogBuilder::new();
        builder
            .add_public_mapping("-//OASIS//DTD DocBook XML V4.5//EN", "file:///dtd/docbook.dtd")
            .add_system_mapping("http://example.org/doc.dtd", "file:///local/doc.dtd")
            .add_system_mapping("http://example.org/x.dtd", "file:///local/x.dtd");
        EntityResolutionAdapter::new(builder.build())
    }

    #[test]
    fn public_id_takes_precedence() {
        let resolved = adapter()
            .resolve_entity(
                Some("-//OASIS//DTD DocBook XML V4.5//EN"),
                Some("http://example.org/x.dtd"),
            )
            .unwrap();
        assert_eq!(resolved.system_id, "file:///dtd/docbook.dtd");
        assert_eq!(
            resolved.public_id.as_deref(),
            Some("-//OASIS//DTD DocBook XML V4.5//EN")
        );
        assert_eq!(
            resolved.original_system_id.as_deref(),
            Some("http://example.org/x.dtd")
        );
    }

    #[test]
    fn falls_back_to_the_system_id() {
        let adapter = adapter();
        let resolved = adapter
            .resolve_entity(Some("-//Unknown//EN"), Some("http://example.org/doc.dtd"))
            .unwrap();
        assert_eq!(resolved.system_id, "file:///local/doc.dtd");

        let resolved = adapter
            .resolve_entity(Some(""), Some("http://example.org/doc.dtd"))
            .unwrap();
        assert_eq!(resolved.public_id, None);
        assert_eq!(resolved.system_id, "file:///local/doc.dtd");
    }

    #[test]
    fn nothing_to_resolve() {
        let adapter = adapter();
        assert_eq!(adapter.resolve_entity(None, None), None);
        assert_eq!(adapter.resolve_entity(Some(""), Some("")), None);
        assert_eq!(
            adapter.resolve_entity(Some("-//Unknown//EN"), Some("http://example.org/none.dtd")),
            None
        );
    }
}
