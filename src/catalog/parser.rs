//! Reading of serialized XML Catalogs.

use quick_xml::{
    NsReader,
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
};

use super::{CatalogEntry, CatalogEntryType, XML_CATALOGS_NAMESPACE};
use crate::{
    encoding::decode_document,
    error::CatalogParseError,
    uri::{UriReference, build_uri},
};

/// Parse a serialized catalog into its entries, in document order.
///
/// Either every entry of the document is returned or an error is.
pub(crate) fn parse_catalog(
    content: &[u8],
    base_uri: Option<&str>,
) -> Result<Vec<CatalogEntry>, CatalogParseError> {
    let text = decode_document(content)?;
    let mut parser = CatalogParser::new(&text, base_uri);
    parser.parse()?;
    Ok(parser.entries)
}

/// Resolve `value` against `base`, or check that it is an URI reference
/// when there is no base.
fn absolutize(value: &str, base: Option<&str>) -> Option<String> {
    match base {
        Some(base) => build_uri(value, base),
        None => UriReference::parse(value).map(|_| value.to_owned()),
    }
}

/// State of an open element.
struct Frame {
    base: Option<String>,
    /// The content of the element is ignored.
    skip: bool,
}

impl Frame {
    fn skipped(base: Option<String>) -> Self {
        Self { base, skip: true }
    }
}

struct CatalogParser<'a> {
    reader: NsReader<&'a [u8]>,
    base_uri: Option<String>,
    frames: Vec<Frame>,
    seen_root: bool,
    entries: Vec<CatalogEntry>,
}

impl<'a> CatalogParser<'a> {
    fn new(text: &'a str, base_uri: Option<&str>) -> Self {
        Self {
            reader: NsReader::from_str(text),
            base_uri: base_uri.map(|base| base.to_owned()),
            frames: vec![],
            seen_root: false,
            entries: vec![],
        }
    }

    fn syntax(&self, message: impl ToString) -> CatalogParseError {
        CatalogParseError::Syntax {
            position: self.reader.buffer_position() as u64,
            message: message.to_string(),
        }
    }

    fn parse(&mut self) -> Result<(), CatalogParseError> {
        loop {
            match self.reader.read_event() {
                Ok(Event::Start(e)) => self.start_element(&e, false)?,
                Ok(Event::Empty(e)) => self.start_element(&e, true)?,
                Ok(Event::End(_)) => {
                    self.frames.pop();
                }
                Ok(Event::Text(e)) => {
                    if self.frames.is_empty() && !e.iter().all(|b| b.is_ascii_whitespace()) {
                        return Err(self.syntax("text outside of the root element"));
                    }
                }
                Ok(Event::CData(_)) if self.frames.is_empty() => {
                    return Err(self.syntax("CDATA section outside of the root element"));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    return Err(CatalogParseError::Syntax {
                        position: self.reader.error_position() as u64,
                        message: err.to_string(),
                    });
                }
            }
        }

        if !self.seen_root {
            return Err(CatalogParseError::NotCatalog { root: None });
        }
        if !self.frames.is_empty() {
            return Err(self.syntax("premature end of document"));
        }
        Ok(())
    }

    /// Returns whether the element is in the catalog namespace, and its local name.
    fn element_name(&self, e: &BytesStart) -> (bool, String) {
        let (ns, local) = self.reader.resolve_element(e.name());
        let in_catalog = matches!(
            ns,
            ResolveResult::Bound(Namespace(ns)) if ns == XML_CATALOGS_NAMESPACE.as_bytes()
        );
        (in_catalog, String::from_utf8_lossy(local.as_ref()).into_owned())
    }

    /// Fetch the unescaped value of the attribute whose qualified name is `name`.
    fn attribute(&self, e: &BytesStart, name: &str) -> Result<Option<String>, CatalogParseError> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.syntax(err))?;
            if attr.key.as_ref() == name.as_bytes() {
                let value = attr.unescape_value().map_err(|err| self.syntax(err))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    /// Compute the base in effect inside `e`.
    fn xml_base(
        &self,
        e: &BytesStart,
        element: &str,
        parent: Option<String>,
    ) -> Result<Option<String>, CatalogParseError> {
        let Some(value) = self.attribute(e, "xml:base")? else {
            return Ok(parent);
        };
        match absolutize(&value, parent.as_deref()) {
            Some(base) => Ok(Some(base)),
            None => Err(CatalogParseError::BrokenEntry {
                element: element.to_owned(),
                attribute: "xml:base",
                value,
            }),
        }
    }

    fn start_element(&mut self, e: &BytesStart, empty: bool) -> Result<(), CatalogParseError> {
        let parent = self
            .frames
            .last()
            .map(|frame| (frame.skip, frame.base.clone()));
        let frame = match parent {
            None => self.root(e)?,
            Some((true, base)) => Frame::skipped(base),
            Some((false, base)) => self.child(e, base)?,
        };
        if !empty {
            self.frames.push(frame);
        }
        Ok(())
    }

    fn root(&mut self, e: &BytesStart) -> Result<Frame, CatalogParseError> {
        if self.seen_root {
            return Err(self.syntax("extra content at the end of the document"));
        }
        self.seen_root = true;

        let (in_catalog, local) = self.element_name(e);
        if !in_catalog || local != "catalog" {
            return Err(CatalogParseError::NotCatalog {
                root: Some(String::from_utf8_lossy(e.name().as_ref()).into_owned()),
            });
        }
        let base = self.xml_base(e, "catalog", self.base_uri.clone())?;
        Ok(Frame { base, skip: false })
    }

    fn child(&mut self, e: &BytesStart, base: Option<String>) -> Result<Frame, CatalogParseError> {
        let (in_catalog, local) = self.element_name(e);
        if !in_catalog {
            // extension element
            return Ok(Frame::skipped(base));
        }

        let (kind, element, key_attribute, target_attribute) = match local.as_str() {
            "group" => {
                let base = self.xml_base(e, "group", base)?;
                return Ok(Frame { base, skip: false });
            }
            "public" => (CatalogEntryType::PublicIdentifier, "public", "publicId", "uri"),
            "system" => (CatalogEntryType::SystemIdentifier, "system", "systemId", "uri"),
            "uri" => (CatalogEntryType::UriRewrite, "uri", "name", "uri"),
            "rewriteURI" => (
                CatalogEntryType::UriRewrite,
                "rewriteURI",
                "uriStartString",
                "rewritePrefix",
            ),
            _ => return Err(CatalogParseError::UnknownElement { name: local.clone() }),
        };

        let base = self.xml_base(e, element, base)?;
        let key = self
            .attribute(e, key_attribute)?
            .ok_or(CatalogParseError::MissingAttribute {
                element,
                attribute: key_attribute,
            })?;
        let value = self
            .attribute(e, target_attribute)?
            .ok_or(CatalogParseError::MissingAttribute {
                element,
                attribute: target_attribute,
            })?;
        let Some(target) = absolutize(&value, base.as_deref()) else {
            return Err(CatalogParseError::BrokenEntry {
                element: element.to_owned(),
                attribute: target_attribute,
                value,
            });
        };
        self.entries.push(CatalogEntry::new(kind, key, target));
        Ok(Frame::skipped(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str, base: Option<&str>) -> Result<Vec<CatalogEntry>, CatalogParseError> {
        parse_catalog(content.as_bytes(), base)
    }

    fn summary(entries: &[CatalogEntry]) -> Vec<(CatalogEntryType, &str, &str)> {
        entries
            .iter()
            .map(|entry| (entry.kind(), entry.key(), entry.target()))
            .collect()
    }

    #[test]
    fn all_entry_kinds() {
        let entries = parse(
            r#"<?xml version="1.0"?>
<!DOCTYPE catalog PUBLIC "-//OASIS//DTD Entity Resolution XML Catalog V1.0//EN" "http://www.oasis-open.org/committees/entity/release/1.0/catalog.dtd">
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog" prefer="public">
  <!-- DocBook -->
  <public publicId="-//OASIS//DTD DocBook XML V4.5//EN" uri="docbook/docbookx.dtd"/>
  <system systemId="http://www.oasis-open.org/docbook/xml/4.5/docbookx.dtd" uri="docbook/docbookx.dtd"/>
  <uri name="http://example.org/style.xsl" uri="xsl/style.xsl"/>
  <rewriteURI uriStartString="http://example.org/base/" rewritePrefix="file:///local/"/>
</catalog>"#,
            Some("file:///usr/share/xml/catalog.xml"),
        )
        .unwrap();
        assert_eq!(
            summary(&entries),
            vec![
                (
                    CatalogEntryType::PublicIdentifier,
                    "-//OASIS//DTD DocBook XML V4.5//EN",
                    "file:///usr/share/xml/docbook/docbookx.dtd"
                ),
                (
                    CatalogEntryType::SystemIdentifier,
                    "http://www.oasis-open.org/docbook/xml/4.5/docbookx.dtd",
                    "file:///usr/share/xml/docbook/docbookx.dtd"
                ),
                (
                    CatalogEntryType::UriRewrite,
                    "http://example.org/style.xsl",
                    "file:///usr/share/xml/xsl/style.xsl"
                ),
                (
                    CatalogEntryType::UriRewrite,
                    "http://example.org/base/",
                    "file:///local/"
                ),
            ]
        );
    }

    #[test]
    fn groups_and_xml_base() {
        let entries = parse(
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog" xml:base="http://mirror.example.org/xml/">
  <group id="g1" xml:base="dtd/">
    <system systemId="a.dtd" uri="a.dtd"/>
    <system systemId="b.dtd" uri="b.dtd" xml:base="/other/"/>
  </group>
  <system systemId="c.dtd" uri="c.dtd"/>
</catalog>"#,
            Some("file:///etc/xml/catalog"),
        )
        .unwrap();
        assert_eq!(
            summary(&entries),
            vec![
                (
                    CatalogEntryType::SystemIdentifier,
                    "a.dtd",
                    "http://mirror.example.org/xml/dtd/a.dtd"
                ),
                (
                    CatalogEntryType::SystemIdentifier,
                    "b.dtd",
                    "http://mirror.example.org/other/b.dtd"
                ),
                (
                    CatalogEntryType::SystemIdentifier,
                    "c.dtd",
                    "http://mirror.example.org/xml/c.dtd"
                ),
            ]
        );
    }

    #[test]
    fn foreign_elements_are_skipped() {
        let entries = parse(
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog" xmlns:ext="http://example.org/ext">
  <ext:note>
    <ext:nextCatalog catalog="ignored.xml"/>
    <public xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog" publicId="-//HIDDEN//EN" uri="hidden.dtd"/>
  </ext:note>
  <public publicId="-//SEEN//EN" uri="seen.dtd"/>
</catalog>"#,
            None,
        )
        .unwrap();
        assert_eq!(
            summary(&entries),
            vec![(CatalogEntryType::PublicIdentifier, "-//SEEN//EN", "seen.dtd")]
        );
    }

    #[test]
    fn entities_in_attributes_are_expanded() {
        let entries = parse(
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
  <system systemId="http://example.org/a.dtd?x=1&amp;y=2" uri="a.dtd"/>
</catalog>"#,
            None,
        )
        .unwrap();
        assert_eq!(entries[0].key(), "http://example.org/a.dtd?x=1&y=2");
    }

    #[test]
    fn declared_encoding_is_honored() {
        let mut content = br#"<?xml version="1.0" encoding="ISO-8859-1"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
  <public publicId="-//Caf"#
            .to_vec();
        content.push(0xE9);
        content.extend_from_slice(br#"//EN" uri="cafe.dtd"/>
</catalog>"#);
        let entries = parse_catalog(&content, None).unwrap();
        assert_eq!(entries[0].key(), "-//Café//EN");
    }

    #[test]
    fn root_must_be_a_catalog() {
        let err = parse("<catalog/>", None).unwrap_err();
        assert!(matches!(
            err,
            CatalogParseError::NotCatalog { root: Some(ref root) } if root == "catalog"
        ));

        let err = parse(
            r#"<cat:group xmlns:cat="urn:oasis:names:tc:entity:xmlns:xml:catalog"/>"#,
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogParseError::NotCatalog { root: Some(ref root) } if root == "cat:group"
        ));

        let err = parse("<?xml version=\"1.0\"?>\n<!-- nothing -->\n", None).unwrap_err();
        assert!(matches!(err, CatalogParseError::NotCatalog { root: None }));
        let err = parse("", None).unwrap_err();
        assert!(matches!(err, CatalogParseError::NotCatalog { root: None }));
    }

    #[test]
    fn prefixed_catalog_root() {
        let entries = parse(
            r#"<c:catalog xmlns:c="urn:oasis:names:tc:entity:xmlns:xml:catalog">
  <c:uri name="urn:x-example:a" uri="file:///a.xml"/>
  <uri name="urn:x-example:b" uri="file:///b.xml"/>
</c:catalog>"#,
            None,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key(), "urn:x-example:a");
    }

    #[test]
    fn unsupported_elements() {
        let err = parse(
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
  <nextCatalog catalog="other.xml"/>
</catalog>"#,
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogParseError::UnknownElement { ref name } if name == "nextCatalog"
        ));
    }

    #[test]
    fn missing_attributes() {
        let err = parse(
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
  <rewriteURI rewritePrefix="file:///local/"/>
</catalog>"#,
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogParseError::MissingAttribute {
                element: "rewriteURI",
                attribute: "uriStartString"
            }
        ));
    }

    #[test]
    fn broken_targets() {
        let err = parse(
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
  <public publicId="-//A//EN" uri="bad%zz.dtd"/>
</catalog>"#,
            Some("file:///etc/xml/catalog"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogParseError::BrokenEntry { attribute: "uri", ref value, .. } if value == "bad%zz.dtd"
        ));

        let err = parse(
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
  <group xml:base="%%"><public publicId="-//A//EN" uri="a.dtd"/></group>
</catalog>"#,
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogParseError::BrokenEntry { ref element, attribute: "xml:base", .. } if element == "group"
        ));
    }

    #[test]
    fn malformed_documents() {
        for content in [
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog"><group></catalog>"#,
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog"><public publicId="-//A//EN" uri="a.dtd"/>"#,
            r#"<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog"/><catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog"/>"#,
            r#"junk<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog"/>"#,
        ] {
            let err = parse(content, None).unwrap_err();
            assert!(
                matches!(err, CatalogParseError::Syntax { .. }),
                "{content}: {err}"
            );
        }
    }
}
