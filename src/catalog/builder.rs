//! Construction of catalog stores.

use std::{fs::File, io::Read, path::Path};

use super::{CatalogEntry, CatalogEntryType, CatalogStore, XML_XML_DEFAULT_CATALOG, parser};
use crate::{
    error::{CatalogParseError, GenericError, catalog_debug, generic_error_default},
    uri::{path_to_uri, uri_to_path},
};

/// Accumulates catalog entries and freezes them into [`CatalogStore`]s.
///
/// Entries keep the order in which they were added, which is also their
/// precedence order.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    entries: Vec<CatalogEntry>,
    debug: i32,
    generic_error: GenericError,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder preloaded with the catalogs listed in `XML_CATALOG_FILES`.
    ///
    /// The variable holds a blank-separated list of files or `file:` URIs.
    /// If it is not set, the system default catalog is used.
    /// Listed catalogs that do not exist are skipped.
    /// If `XML_DEBUG_CATALOG` is set, debug traces are enabled.
    #[doc(alias = "xmlInitializeCatalog")]
    pub fn from_env() -> Result<Self, CatalogParseError> {
        let mut builder = Self::new();
        if std::env::var_os("XML_DEBUG_CATALOG").is_some() {
            builder.debug = 1;
        }

        let catalogs = std::env::var("XML_CATALOG_FILES")
            .ok()
            .unwrap_or_else(|| XML_XML_DEFAULT_CATALOG.to_owned());
        for catalog in catalogs.split_ascii_whitespace() {
            let Some(path) = uri_to_path(catalog) else {
                catalog_debug!(builder, 1, "Skipping non-local catalog {catalog}\n");
                continue;
            };
            if !path.is_file() {
                catalog_debug!(builder, 1, "Catalog {} not found\n", path.display());
                continue;
            }
            builder.load_file(&path)?;
        }
        Ok(builder)
    }

    /// Set the debug level of the catalogs built from now on.
    ///
    /// `0` disables the traces, `1` traces loads and lookups and `2` also
    /// traces every entry found while parsing.
    ///
    /// Returns the previous value of the debug level.
    #[doc(alias = "xmlCatalogSetDebug")]
    pub fn set_debug(&mut self, level: i32) -> i32 {
        let old = self.debug;
        self.debug = level.max(0);
        old
    }

    /// Set the handler receiving debug traces.
    ///
    /// `None` restores the default handler writing to the standard error.
    pub fn set_generic_error(&mut self, handler: Option<GenericError>) {
        self.generic_error = handler.unwrap_or(generic_error_default);
    }

    fn add(&mut self, kind: CatalogEntryType, key: &str, target: &str) -> &mut Self {
        catalog_debug!(self, 2, "Adding {}: '{key}' '{target}'\n", kind.element_name());
        self.entries.push(CatalogEntry::new(kind, key, target));
        self
    }

    /// Map the public identifier `public_id` to `target`.
    pub fn add_public_mapping(&mut self, public_id: &str, target: &str) -> &mut Self {
        self.add(CatalogEntryType::PublicIdentifier, public_id, target)
    }

    /// Map the system identifier `system_id` to `target`.
    pub fn add_system_mapping(&mut self, system_id: &str, target: &str) -> &mut Self {
        self.add(CatalogEntryType::SystemIdentifier, system_id, target)
    }

    /// Rewrite the URIs starting with `prefix` so that they start with `target`.
    pub fn add_uri_rewrite(&mut self, prefix: &str, target: &str) -> &mut Self {
        self.add(CatalogEntryType::UriRewrite, prefix, target)
    }

    /// Freeze the current entries into a store.
    ///
    /// The store is not affected by later changes to the builder.
    pub fn build(&self) -> CatalogStore {
        CatalogStore::new(self.entries.as_slice().into(), self.debug, self.generic_error)
    }

    /// Parse a serialized XML Catalog and append its entries.
    ///
    /// `base_uri` is the location of the document. Relative targets are
    /// resolved against it, or kept as written if it is `None`.
    ///
    /// On failure no entry of `content` is added.
    #[doc(alias = "xmlParseXMLCatalogFile")]
    pub fn load_from_serialized_form(
        &mut self,
        content: &[u8],
        base_uri: Option<&str>,
    ) -> Result<(), CatalogParseError> {
        catalog_debug!(self, 1, "Parsing catalog {}\n", base_uri.unwrap_or("(memory)"));
        let entries = match parser::parse_catalog(content, base_uri) {
            Ok(entries) => entries,
            Err(err) => {
                catalog_debug!(self, 1, "Failed to parse catalog: {err}\n");
                return Err(err);
            }
        };
        for entry in &entries {
            catalog_debug!(
                self,
                2,
                "Found {}: '{}' '{}'\n",
                entry.kind().element_name(),
                entry.key(),
                entry.target()
            );
        }
        catalog_debug!(self, 1, "{} entries added\n", entries.len());
        self.entries.extend(entries);
        Ok(())
    }

    /// Read a serialized XML Catalog from `reader` and append its entries.
    pub fn load_from_reader(
        &mut self,
        mut reader: impl Read,
        base_uri: Option<&str>,
    ) -> Result<(), CatalogParseError> {
        let mut content = vec![];
        reader.read_to_end(&mut content)?;
        self.load_from_serialized_form(&content, base_uri)
    }

    /// Load a catalog file. Its `file:` URI is the base of relative targets.
    #[doc(alias = "xmlLoadCatalog")]
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), CatalogParseError> {
        let path = path.as_ref();
        let base = path_to_uri(path)?;
        let file = File::open(path)?;
        self.load_from_reader(file, Some(&base))
    }

    /// Load a blank-separated list of catalog files, in order.
    ///
    /// Stops at the first file that fails to load. The catalogs loaded
    /// before it are kept.
    #[doc(alias = "xmlLoadCatalogs")]
    pub fn load_files(&mut self, paths: &str) -> Result<(), CatalogParseError> {
        for path in paths.split_ascii_whitespace() {
            self.load_file(path)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self {
            entries: vec![],
            debug: 0,
            generic_error: generic_error_default,
        }
    }
}
