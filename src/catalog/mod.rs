//! Immutable catalog of resolution entries.
//!
//! A [`CatalogStore`] is produced by a [`CatalogBuilder`] and never changes
//! afterwards. Clones share the same frozen entries, so a store can be handed
//! to any number of resolvers and threads.

pub mod builder;
mod parser;

#[cfg(feature = "output")]
use std::io::{self, Write};
use std::sync::Arc;

use const_format::concatcp;
#[cfg(feature = "output")]
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    SYSCONFDIR,
    error::{GenericError, catalog_debug, generic_error_default},
};

pub use builder::CatalogBuilder;

/// The namespace for the XML Catalogs elements.
pub const XML_CATALOGS_NAMESPACE: &str = "urn:oasis:names:tc:entity:xmlns:xml:catalog";
/// Catalog loaded when `XML_CATALOG_FILES` is not set.
pub const XML_XML_DEFAULT_CATALOG: &str = concatcp!("file://", SYSCONFDIR, "/xml/catalog");

#[cfg(feature = "output")]
const XML_CATALOGS_DOCTYPE: &str = r#"catalog PUBLIC "-//OASIS//DTD Entity Resolution XML Catalog V1.0//EN" "http://www.oasis-open.org/committees/entity/release/1.0/catalog.dtd""#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogEntryType {
    /// Maps a DTD public identifier. Matched by exact equality.
    PublicIdentifier,
    /// Maps a system identifier. Matched by exact equality.
    SystemIdentifier,
    /// Rewrites URIs starting with the key. Matched as a prefix.
    UriRewrite,
}

impl CatalogEntryType {
    /// Name of the catalog element that serializes this kind of entry.
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::PublicIdentifier => "public",
            Self::SystemIdentifier => "system",
            Self::UriRewrite => "rewriteURI",
        }
    }

    pub(crate) fn key_attribute(&self) -> &'static str {
        match self {
            Self::PublicIdentifier => "publicId",
            Self::SystemIdentifier => "systemId",
            Self::UriRewrite => "uriStartString",
        }
    }

    pub(crate) fn target_attribute(&self) -> &'static str {
        match self {
            Self::PublicIdentifier | Self::SystemIdentifier => "uri",
            Self::UriRewrite => "rewritePrefix",
        }
    }
}

/// One resolution rule of a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogEntry {
    kind: CatalogEntryType,
    key: String,
    target: String,
}

impl CatalogEntry {
    pub fn new(kind: CatalogEntryType, key: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            target: target.into(),
        }
    }

    pub fn kind(&self) -> CatalogEntryType {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// An ordered, read-only set of catalog entries.
///
/// Earlier entries take precedence over later ones with the same key.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    entries: Arc<[CatalogEntry]>,
    pub(crate) debug: i32,
    pub(crate) generic_error: GenericError,
}

impl CatalogStore {
    pub(crate) fn new(entries: Arc<[CatalogEntry]>, debug: i32, generic_error: GenericError) -> Self {
        Self {
            entries,
            debug,
            generic_error,
        }
    }

    fn find(&self, kind: CatalogEntryType, key: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind && entry.key == key)
    }

    /// Try to lookup the catalog local reference associated to a public ID.
    ///
    /// Returns the target of the first matching `public` entry.
    #[doc(alias = "xmlACatalogResolvePublic")]
    pub fn lookup_by_public_id(&self, public_id: &str) -> Option<String> {
        catalog_debug!(self, 1, "Resolve pubID {public_id}\n");
        let found = self.find(CatalogEntryType::PublicIdentifier, public_id);
        match found {
            Some(entry) => {
                catalog_debug!(self, 1, "Found public match {}\n", entry.target);
            }
            None => {
                catalog_debug!(self, 1, "No match for pubID {public_id}\n");
            }
        }
        found.map(|entry| entry.target.clone())
    }

    /// Try to lookup the catalog resource for a system ID.
    ///
    /// The comparison is exact and case-sensitive.
    #[doc(alias = "xmlACatalogResolveSystem")]
    pub fn lookup_by_system_id(&self, system_id: &str) -> Option<String> {
        catalog_debug!(self, 1, "Resolve sysID {system_id}\n");
        let found = self.find(CatalogEntryType::SystemIdentifier, system_id);
        match found {
            Some(entry) => {
                catalog_debug!(self, 1, "Found system match {system_id}, using {}\n", entry.target);
            }
            None => {
                catalog_debug!(self, 1, "No match for sysID {system_id}\n");
            }
        }
        found.map(|entry| entry.target.clone())
    }

    /// Rewrite `uri` with the first `rewriteURI` entry whose key is a prefix of it.
    ///
    /// The part of `uri` following the prefix is appended to the target.
    #[doc(alias = "xmlACatalogResolveURI")]
    pub fn lookup_by_uri_prefix(&self, uri: &str) -> Option<String> {
        catalog_debug!(self, 1, "Resolve URI {uri}\n");
        let ret = self
            .entries
            .iter()
            .filter(|entry| entry.kind == CatalogEntryType::UriRewrite)
            .find(|entry| uri.starts_with(entry.key.as_str()))
            .map(|entry| format!("{}{}", entry.target, &uri[entry.key.len()..]));
        match ret.as_deref() {
            Some(rewritten) => {
                catalog_debug!(self, 1, "Found URI match {uri}, using {rewritten}\n");
            }
            None => {
                catalog_debug!(self, 1, "No match for URI {uri}\n");
            }
        }
        ret
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries of the store, in precedence order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Serialize the store as an XML Catalog document.
    ///
    /// Loading the output again yields the same entries, in the same order.
    #[doc(alias = "xmlACatalogDump")]
    #[cfg(feature = "output")]
    pub fn dump(&self, out: impl Write) -> io::Result<()> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        writer.write_event(Event::DocType(BytesText::from_escaped(XML_CATALOGS_DOCTYPE)))?;
        let catalog = BytesStart::new("catalog").with_attributes([("xmlns", XML_CATALOGS_NAMESPACE)]);
        writer.write_event(Event::Start(catalog))?;
        for entry in self.entries.iter() {
            let mut node = BytesStart::new(entry.kind.element_name());
            node.push_attribute((entry.kind.key_attribute(), entry.key.as_str()));
            node.push_attribute((entry.kind.target_attribute(), entry.target.as_str()));
            writer.write_event(Event::Empty(node))?;
        }
        writer.write_event(Event::End(BytesEnd::new("catalog")))?;
        writer.into_inner().write_all(b"\n")
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self {
            entries: Arc::from([]),
            debug: 0,
            generic_error: generic_error_default,
        }
    }
}
