//! Character encoding detection and decoding of serialized catalogs.
//!
//! Catalog documents are decoded to UTF-8 text before being parsed.
//! The encoding is chosen from the byte order mark if any, then from the
//! first bytes of the document, then from the `encoding` pseudo-attribute of
//! the XML declaration. Without any of them, UTF-8 is assumed.

use std::{borrow::Cow, fmt::Display, str::from_utf8};

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

/// Encodings that can be recognized from the first bytes of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlCharEncoding {
    /// Nothing could be detected.
    None,
    UTF8,
    UTF16LE,
    UTF16BE,
    UCS4LE,
    UCS4BE,
    UCS4_2143,
    UCS4_3412,
    EBCDIC,
}

impl XmlCharEncoding {
    pub fn get_name(&self) -> Option<&'static str> {
        match *self {
            Self::UTF8 => Some("UTF-8"),
            Self::UTF16LE | Self::UTF16BE => Some("UTF-16"),
            Self::UCS4LE | Self::UCS4BE | Self::UCS4_2143 | Self::UCS4_3412 => {
                Some("ISO-10646-UCS-4")
            }
            Self::EBCDIC => Some("EBCDIC"),
            Self::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The declared encoding is not known.
    Unknown { label: String },
    /// The detected encoding has no decoder.
    Unsupported { name: &'static str },
    /// Malformed byte sequence is found.
    ///
    /// `offset` is the position of the first malformed byte if it is known.
    Malformed {
        encoding: &'static str,
        offset: Option<usize>,
    },
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Encoding Error: ")?;
        match self {
            Self::Unknown { label } => write!(f, "Unknown encoding '{label}'"),
            Self::Unsupported { name } => write!(f, "Unsupported encoding {name}"),
            Self::Malformed {
                encoding,
                offset: Some(offset),
            } => write!(f, "Malformed {encoding} byte sequence occurs at {offset}"),
            Self::Malformed {
                encoding,
                offset: None,
            } => write!(f, "Malformed {encoding} byte sequence"),
        }
    }
}

impl std::error::Error for EncodingError {}

pub fn detect_encoding(input: &[u8]) -> XmlCharEncoding {
    match input {
        [0x00, 0x00, 0x00, 0x3C, ..] => XmlCharEncoding::UCS4BE,
        [0x3C, 0x00, 0x00, 0x00, ..] => XmlCharEncoding::UCS4LE,
        [0x00, 0x00, 0x3C, 0x00, ..] => XmlCharEncoding::UCS4_2143,
        [0x00, 0x3C, 0x00, 0x00, ..] => XmlCharEncoding::UCS4_3412,
        [0x4C, 0x6F, 0xA7, 0x94, ..] => XmlCharEncoding::EBCDIC,
        [0x3C, 0x3F, 0x78, 0x6D, ..] => XmlCharEncoding::UTF8,
        [0x3C, 0x00, 0x3F, 0x00, ..] => XmlCharEncoding::UTF16LE,
        [0x00, 0x3C, 0x00, 0x3F, ..] => XmlCharEncoding::UTF16BE,
        // UTF-8 BOM
        [0xEF, 0xBB, 0xBF, ..] => XmlCharEncoding::UTF8,
        // UTF-16 BOM (BE)
        [0xFE, 0xFF, ..] => XmlCharEncoding::UTF16BE,
        // UTF-16 BOM (LE)
        [0xFF, 0xFE, ..] => XmlCharEncoding::UTF16LE,
        _ => XmlCharEncoding::None,
    }
}

/// Extract the value of the `encoding` pseudo-attribute of the XML declaration.
///
/// Only meaningful for ASCII-compatible input.
fn declared_encoding(input: &[u8]) -> Option<&[u8]> {
    fn skip_blanks(mut cur: &[u8]) -> &[u8] {
        while let [b' ' | b'\t' | b'\r' | b'\n', rem @ ..] = cur {
            cur = rem;
        }
        cur
    }

    let rest = input.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|w| w == b"?>")?;
    let decl = &rest[..end];
    let pos = decl.windows(8).position(|w| w == b"encoding")?;
    let cur = skip_blanks(&decl[pos + 8..]);
    let cur = skip_blanks(cur.strip_prefix(b"=")?);
    let (&quote, cur) = cur.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = cur.iter().position(|&b| b == quote)?;
    Some(&cur[..len])
}

fn decode_strictly<'a>(
    encoding: &'static Encoding,
    input: &'a [u8],
) -> Result<Cow<'a, str>, EncodingError> {
    if encoding == UTF_8 {
        return from_utf8(input)
            .map(Cow::Borrowed)
            .map_err(|err| EncodingError::Malformed {
                encoding: UTF_8.name(),
                offset: Some(err.valid_up_to()),
            });
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(input)
        .ok_or(EncodingError::Malformed {
            encoding: encoding.name(),
            offset: None,
        })
}

/// Decode a whole serialized document into UTF-8 text.
///
/// The byte order mark, if any, is not included in the result.
pub fn decode_document(input: &[u8]) -> Result<Cow<'_, str>, EncodingError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(input) {
        return decode_strictly(encoding, &input[bom_len..]);
    }

    match detect_encoding(input) {
        XmlCharEncoding::UTF16LE => decode_strictly(UTF_16LE, input),
        XmlCharEncoding::UTF16BE => decode_strictly(UTF_16BE, input),
        enc @ (XmlCharEncoding::UCS4LE
        | XmlCharEncoding::UCS4BE
        | XmlCharEncoding::UCS4_2143
        | XmlCharEncoding::UCS4_3412
        | XmlCharEncoding::EBCDIC) => Err(EncodingError::Unsupported {
            name: enc.get_name().unwrap_or("unknown"),
        }),
        XmlCharEncoding::UTF8 | XmlCharEncoding::None => {
            let Some(label) = declared_encoding(input) else {
                return decode_strictly(UTF_8, input);
            };
            let encoding =
                Encoding::for_label(label).ok_or_else(|| EncodingError::Unknown {
                    label: String::from_utf8_lossy(label).into_owned(),
                })?;
            // The document is ASCII-compatible, so a declared UTF-16 cannot be right.
            if encoding == UTF_16LE || encoding == UTF_16BE {
                decode_strictly(UTF_8, input)
            } else {
                decode_strictly(encoding, input)
            }
        }
    }
}
