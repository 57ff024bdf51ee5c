//! Error types reported by catalog loading and URI resolution.
//!
//! A lookup that finds nothing is not an error: lookups return `None` for that.

use std::{fmt::Display, io};

use crate::encoding::EncodingError;

/// Handler used to report debug traces of the catalog machinery.
///
/// Only invoked when the debug level of a catalog is greater than zero.
pub type GenericError = fn(&str);

/// Writes `msg` to the standard error as it is.
pub fn generic_error_default(msg: &str) {
    eprint!("{msg}");
}

/// Emits a debug trace through the handler of `$owner` when its debug level
/// reaches `$level`.
macro_rules! catalog_debug {
    ($owner:expr, $level:expr, $fmt:literal $(, $args:expr)* $(,)?) => {
        if $owner.debug >= $level {
            ($owner.generic_error)(&format!($fmt $(, $args)*));
        }
    };
}
pub(crate) use catalog_debug;

/// Failure to turn a serialized catalog into entries.
///
/// When a load fails with this error, no entry of the failing document has
/// been added to the builder.
#[derive(Debug)]
pub enum CatalogParseError {
    /// The document is empty, or its root is not a `catalog` element
    /// in the OASIS catalog namespace.
    NotCatalog { root: Option<String> },
    /// An entry element lacks one of its required attributes.
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    /// An element of the catalog namespace that is not supported.
    UnknownElement { name: String },
    /// The value of a target attribute could not be made into a URI.
    BrokenEntry {
        element: String,
        attribute: &'static str,
        value: String,
    },
    /// The document bytes could not be decoded.
    Encoding(EncodingError),
    /// The document is not well-formed XML.
    Syntax { position: u64, message: String },
    /// The document could not be read.
    Io(io::Error),
}

impl Display for CatalogParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCatalog { root: Some(root) } => {
                write!(f, "'{root}' is not an XML Catalog root element")
            }
            Self::NotCatalog { root: None } => write!(f, "document has no root element"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "{element} entry lacks '{attribute}'")
            }
            Self::UnknownElement { name } => write!(f, "unknown catalog element '{name}'"),
            Self::BrokenEntry {
                element,
                attribute,
                value,
            } => write!(f, "{element} entry '{attribute}' broken ?: {value}"),
            Self::Encoding(err) => write!(f, "{err}"),
            Self::Syntax { position, message } => {
                write!(f, "malformed catalog at byte {position}: {message}")
            }
            Self::Io(err) => write!(f, "failed to read catalog: {err}"),
        }
    }
}

impl std::error::Error for CatalogParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EncodingError> for CatalogParseError {
    fn from(value: EncodingError) -> Self {
        Self::Encoding(value)
    }
}

impl From<io::Error> for CatalogParseError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Failure to compute the absolute form of a URI reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriResolutionError {
    /// `href` is not a URI reference.
    InvalidReference { href: String },
    /// `base` is present but is not an absolute URI.
    InvalidBase { base: String },
    /// `href` is relative and no base URI was supplied.
    MissingBase { href: String },
}

impl Display for UriResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReference { href } => write!(f, "'{href}' is not a valid URI reference"),
            Self::InvalidBase { base } => write!(f, "base '{base}' is not an absolute URI"),
            Self::MissingBase { href } => {
                write!(f, "cannot resolve relative reference '{href}' without a base URI")
            }
        }
    }
}

impl std::error::Error for UriResolutionError {}
