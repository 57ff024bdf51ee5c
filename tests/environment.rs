//! Loading catalogs from `XML_CATALOG_FILES`.
//!
//! The environment is process-wide, so everything lives in one test.

use std::fs;

use tempfile::TempDir;
use xcatalog::{CatalogBuilder, uri::path_to_uri};

#[test]
fn catalogs_from_environment() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("catalog.xml");
    fs::write(
        &catalog,
        r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
  <public publicId="-//Env//EN" uri="file:///env.dtd"/>
</catalog>"#,
    )
    .unwrap();
    let missing = dir.path().join("missing.xml");
    let catalog_uri = path_to_uri(&catalog).unwrap();

    // SAFETY: no other thread of this test binary reads the environment.
    unsafe {
        std::env::set_var(
            "XML_CATALOG_FILES",
            format!("{}\n  {catalog_uri}", missing.display()),
        );
        std::env::remove_var("XML_DEBUG_CATALOG");
    }
    let builder = CatalogBuilder::from_env().unwrap();
    assert_eq!(builder.len(), 1);
    assert_eq!(
        builder.build().lookup_by_public_id("-//Env//EN").as_deref(),
        Some("file:///env.dtd")
    );

    fs::write(&catalog, "<catalog/>").unwrap();
    assert!(CatalogBuilder::from_env().is_err());

    // SAFETY: same as above.
    unsafe {
        std::env::set_var("XML_CATALOG_FILES", "");
    }
    assert!(CatalogBuilder::from_env().unwrap().is_empty());
}
