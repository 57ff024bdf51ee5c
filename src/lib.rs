//! OASIS XML Catalog resolution.
//!
//! Catalogs map public identifiers, system identifiers and URIs to local
//! resources, so documents and stylesheets can be processed without network
//! access.
//!
//! ```
//! use xcatalog::{CatalogBuilder, EntityResolutionAdapter, UriResolutionAdapter};
//!
//! let mut builder = CatalogBuilder::new();
//! builder
//!     .add_public_mapping("-//OASIS//DTD DocBook XML V4.5//EN", "file:///usr/share/xml/docbookx.dtd")
//!     .add_uri_rewrite("http://example.org/xsl/", "file:///opt/xsl/");
//! let store = builder.build();
//!
//! let entities = EntityResolutionAdapter::new(store.clone());
//! let resolved = entities
//!     .resolve_entity(Some("-//OASIS//DTD DocBook XML V4.5//EN"), None)
//!     .unwrap();
//! assert_eq!(resolved.system_id, "file:///usr/share/xml/docbookx.dtd");
//!
//! let uris = UriResolutionAdapter::new(store);
//! assert_eq!(
//!     uris.resolve("merger.xsl", Some("http://example.org/xsl/main.xsl")).unwrap(),
//!     "file:///opt/xsl/merger.xsl"
//! );
//! ```

pub mod catalog;
pub mod encoding;
pub mod error;
pub mod params;
pub mod resolver;
pub mod uri;

pub use catalog::{CatalogBuilder, CatalogEntry, CatalogEntryType, CatalogStore};
pub use error::{CatalogParseError, UriResolutionError};
pub use params::{ParamValue, QName, TransformParameters};
pub use resolver::{
    EntityResolutionAdapter, EntityResolver, ResolutionContext, ResolutionRequest, ResolvedInput,
    UriResolutionAdapter, UriResolver,
};

pub const SYSCONFDIR: &str = if let Some(sysconfdir) = option_env!("SYSCONFDIR") {
    sysconfdir
} else {
    "/etc"
};
