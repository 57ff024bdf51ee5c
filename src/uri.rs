//! Provide methods and data structures for handling URI references.
//!
//! Parsing follows the grammar of RFC 3986 and reference resolution follows
//! its section 5.2. Components are kept as written (percent-encoded octets are
//! not decoded), so recomposing a parsed reference gives back the input.

use std::{
    borrow::Cow,
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

use crate::error::UriResolutionError;

// `pct-encoded   = "%" HEXDIG HEXDIG`
fn starts_with_pct_encoded(p: &str) -> bool {
    let p = p.as_bytes();
    p.len() >= 3 && p[0] == b'%' && p[1].is_ascii_hexdigit() && p[2].is_ascii_hexdigit()
}

// `unreserved    = ALPHA / DIGIT / "-" / "." / "_" / "~"`
fn starts_with_unreserved(p: &str) -> bool {
    p.starts_with(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}

// `sub-delims    = "!" / "$" / "&" / "'" / "(" / ")" / "*" / "+" / "," / ";" / "="`
fn starts_with_sub_delims(p: &str) -> bool {
    p.starts_with(['!', '$', '&', '(', ')', '*', '+', ',', ';', '=', '\''])
}

// `pchar         = unreserved / pct-encoded / sub-delims / ":" / "@"`
fn starts_with_pchar(p: &str) -> bool {
    starts_with_unreserved(p)
        || starts_with_pct_encoded(p)
        || starts_with_sub_delims(p)
        || p.starts_with([':', '@'])
}

/// Skip one character, or a whole `pct-encoded` triplet.
fn skip_one(p: &str) -> &str {
    if p.starts_with('%') { &p[3..] } else { &p[1..] }
}

/// A parsed URI reference.
///
/// Every component borrows from the parsed string.
/// An undefined component is `None`, which differs from an empty one
/// (`"http://a/b?"` has an empty query, `"http://a/b"` has none).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriReference<'a> {
    pub scheme: Option<&'a str>,
    pub authority: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> UriReference<'a> {
    /// Parse an URI reference.
    ///
    /// ```text
    /// URI-reference = URI / relative-ref
    /// ```
    ///
    /// Returns `None` if `s` is neither an URI nor a relative reference.
    pub fn parse(s: &'a str) -> Option<Self> {
        // Try first to parse absolute refs, then fallback to relative if it fails.
        let mut uri = Self::default();
        if uri.parse3986_uri(s).is_some() {
            return Some(uri);
        }
        let mut uri = Self::default();
        uri.parse3986_relative_ref(s)?;
        Some(uri)
    }

    /// Check whether this reference has a scheme, that is, it is an URI.
    pub fn is_absolute(&self) -> bool {
        self.scheme.is_some()
    }

    /// Parse an URI scheme
    ///
    /// ```text
    /// ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
    /// ```
    fn parse3986_scheme(&mut self, s: &'a str) -> Option<&'a str> {
        if !s.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        let rem = s.trim_start_matches(|c: char| {
            c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'
        });
        self.scheme = Some(&s[..s.len() - rem.len()]);
        Some(rem)
    }

    /// Parse an authority part.
    ///
    /// ```text
    /// authority     = [ userinfo "@" ] host [ ":" port ]
    /// ```
    ///
    /// The authority is checked at the character level only.
    fn parse3986_authority(&mut self, s: &'a str) -> Option<&'a str> {
        let mut cur = s;
        while starts_with_unreserved(cur)
            || starts_with_pct_encoded(cur)
            || starts_with_sub_delims(cur)
            || cur.starts_with([':', '@', '[', ']'])
        {
            cur = skip_one(cur);
        }
        if !cur.is_empty() && !cur.starts_with(['/', '?', '#']) {
            return None;
        }
        self.authority = Some(&s[..s.len() - cur.len()]);
        Some(cur)
    }

    /// Parse a path, that is a sequence of segments separated by "/".
    ///
    /// ```text
    /// path-abempty  = *( "/" segment )
    /// path-absolute = "/" [ segment-nz *( "/" segment ) ]
    /// path-noscheme = segment-nz-nc *( "/" segment )
    /// path-rootless = segment-nz *( "/" segment )
    /// ```
    ///
    /// If `no_colon` is set, the first segment must not contain ":".
    fn parse3986_path(&mut self, s: &'a str, no_colon: bool) -> Option<&'a str> {
        let mut cur = s;
        let mut first_segment = true;
        while starts_with_pchar(cur) || cur.starts_with('/') {
            if cur.starts_with('/') {
                first_segment = false;
            } else if no_colon && first_segment && cur.starts_with(':') {
                return None;
            }
            cur = skip_one(cur);
        }
        self.path = &s[..s.len() - cur.len()];
        Some(cur)
    }

    /// Parse the query part of an URI
    ///
    /// ```text
    /// query         = *( pchar / "/" / "?" )
    /// ```
    fn parse3986_query(&mut self, s: &'a str) -> Option<&'a str> {
        let mut cur = s;
        while starts_with_pchar(cur) || cur.starts_with(['/', '?']) {
            cur = skip_one(cur);
        }
        self.query = Some(&s[..s.len() - cur.len()]);
        Some(cur)
    }

    /// Parse the fragment part of an URI
    ///
    /// ```text
    /// fragment      = *( pchar / "/" / "?" )
    /// ```
    ///
    /// # Note
    /// The strict syntax as defined by 3986 does not allow '[' and ']'
    /// in the fragment identifier but this is used very broadly for
    /// xpointer scheme selection, so we are allowing it here.
    fn parse3986_fragment(&mut self, s: &'a str) -> Option<&'a str> {
        let mut cur = s;
        while starts_with_pchar(cur) || cur.starts_with(['/', '?', '[', ']']) {
            cur = skip_one(cur);
        }
        self.fragment = Some(&s[..s.len() - cur.len()]);
        Some(cur)
    }

    /// Parse the trailing "?query" and "#fragment", then check that the whole
    /// input has been consumed.
    fn parse3986_tail(&mut self, mut s: &'a str) -> Option<()> {
        if let Some(rem) = s.strip_prefix('?') {
            s = self.parse3986_query(rem)?;
        }
        if let Some(rem) = s.strip_prefix('#') {
            s = self.parse3986_fragment(rem)?;
        }
        s.is_empty().then_some(())
    }

    /// Parse an URI
    ///
    /// ```text
    /// URI           = scheme ":" hier-part [ "?" query ] [ "#" fragment ]
    /// hier-part     = "//" authority path-abempty
    ///               / path-absolute
    ///               / path-rootless
    ///               / path-empty
    /// ```
    fn parse3986_uri(&mut self, s: &'a str) -> Option<()> {
        let mut s = self.parse3986_scheme(s)?;
        s = s.strip_prefix(':')?;
        if let Some(rem) = s.strip_prefix("//") {
            s = self.parse3986_authority(rem)?;
        }
        s = self.parse3986_path(s, false)?;
        self.parse3986_tail(s)
    }

    /// Parse a relative reference
    ///
    /// ```text
    /// relative-ref  = relative-part [ "?" query ] [ "#" fragment ]
    /// relative-part = "//" authority path-abempty
    ///               / path-absolute
    ///               / path-noscheme
    ///               / path-empty
    /// ```
    fn parse3986_relative_ref(&mut self, s: &'a str) -> Option<()> {
        let mut s = s;
        if let Some(rem) = s.strip_prefix("//") {
            s = self.parse3986_authority(rem)?;
            s = self.parse3986_path(s, false)?;
        } else {
            s = self.parse3986_path(s, true)?;
        }
        self.parse3986_tail(s)
    }
}

impl Display for UriReference<'_> {
    /// Recompose the reference, as described in RFC 3986 section 5.3.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(scheme) = self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(authority) = self.authority {
            write!(f, "//{authority}")?;
        }
        write!(f, "{}", self.path)?;
        if let Some(query) = self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

/// Remove the "." and ".." segments of a path,
/// as described in RFC 3986 section 5.2.4.
///
/// If `path` has no dot segments, it is returned as it is.
pub fn remove_dot_segments(path: &str) -> Cow<'_, str> {
    if !path.split('/').any(|seg| seg == "." || seg == "..") {
        return Cow::Borrowed(path);
    }

    fn pop_last_segment(output: &mut String) {
        match output.rfind('/') {
            Some(pos) => output.truncate(pos),
            None => output.clear(),
        }
    }

    let mut input = path;
    let mut output = String::with_capacity(path.len());
    while !input.is_empty() {
        if let Some(rem) = input.strip_prefix("../") {
            input = rem;
        } else if let Some(rem) = input.strip_prefix("./") {
            input = rem;
        } else if input.starts_with("/./") {
            input = &input[2..];
        } else if input == "/." {
            input = "/";
        } else if input.starts_with("/../") {
            input = &input[3..];
            pop_last_segment(&mut output);
        } else if input == "/.." {
            input = "/";
            pop_last_segment(&mut output);
        } else if input == "." || input == ".." {
            input = "";
        } else {
            let start = usize::from(input.starts_with('/'));
            let end = input[start..].find('/').map_or(input.len(), |pos| pos + start);
            output.push_str(&input[..end]);
            input = &input[end..];
        }
    }
    Cow::Owned(output)
}

/// Merge a relative-path reference with the path of the base URI,
/// as described in RFC 3986 section 5.2.3.
fn merge_paths(base: &UriReference, path: &str) -> String {
    if base.authority.is_some() && base.path.is_empty() {
        format!("/{path}")
    } else {
        let dir = base.path.rfind('/').map_or("", |pos| &base.path[..=pos]);
        format!("{dir}{path}")
    }
}

/// Transform `refe` into its target URI using `base`,
/// as described in RFC 3986 section 5.2.2.
///
/// `base` must be absolute; its fragment is ignored.
fn transform_reference(refe: &UriReference, base: &UriReference) -> String {
    let (scheme, authority, path, query) = if refe.scheme.is_some() {
        (refe.scheme, refe.authority, remove_dot_segments(refe.path), refe.query)
    } else if refe.authority.is_some() {
        (base.scheme, refe.authority, remove_dot_segments(refe.path), refe.query)
    } else if refe.path.is_empty() {
        (base.scheme, base.authority, Cow::Borrowed(base.path), refe.query.or(base.query))
    } else if refe.path.starts_with('/') {
        (base.scheme, base.authority, remove_dot_segments(refe.path), refe.query)
    } else {
        let merged = merge_paths(base, refe.path);
        let path = Cow::Owned(remove_dot_segments(&merged).into_owned());
        (base.scheme, base.authority, path, refe.query)
    };
    UriReference {
        scheme,
        authority,
        path: &path,
        query,
        fragment: refe.fragment,
    }
    .to_string()
}

/// Computes the absolute form of `href` using `base`.
///
/// An absolute `href` is returned as it is and `base` is not examined.
/// A relative `href` requires `base` to be an absolute URI.
///
/// # Examples
/// ```
/// use xcatalog::uri::resolve_reference;
///
/// let base = Some("http://a/b/c/d;p?q");
/// assert_eq!(resolve_reference("g", base).unwrap(), "http://a/b/c/g");
/// assert_eq!(resolve_reference("../g", base).unwrap(), "http://a/b/g");
/// assert_eq!(resolve_reference("http://x/y", None).unwrap(), "http://x/y");
/// assert!(resolve_reference("g", None).is_err());
/// ```
pub fn resolve_reference(href: &str, base: Option<&str>) -> Result<String, UriResolutionError> {
    let refe = UriReference::parse(href).ok_or_else(|| UriResolutionError::InvalidReference {
        href: href.to_owned(),
    })?;
    if refe.is_absolute() {
        return Ok(href.to_owned());
    }
    let base = base.ok_or_else(|| UriResolutionError::MissingBase {
        href: href.to_owned(),
    })?;
    let bas = UriReference::parse(base)
        .filter(|b| b.is_absolute())
        .ok_or_else(|| UriResolutionError::InvalidBase {
            base: base.to_owned(),
        })?;
    Ok(transform_reference(&refe, &bas))
}

/// Computes the final URI of `uri` relative to `base`, leniently.
///
/// Unlike [`resolve_reference`], a base that is not absolute is used as a
/// plain path prefix, so catalogs loaded from relative locations keep
/// relative targets.
///
/// Returns `None` if `uri` is not an URI reference.
pub fn build_uri(uri: &str, base: &str) -> Option<String> {
    let refe = UriReference::parse(uri)?;
    if refe.is_absolute() {
        return Some(uri.to_owned());
    }
    match UriReference::parse(base) {
        Some(bas) if bas.is_absolute() => Some(transform_reference(&refe, &bas)),
        Some(bas) if refe.authority.is_none() && !refe.path.starts_with('/') => {
            if refe.path.is_empty() {
                return Some(base.to_owned());
            }
            let dir = bas.path.rfind('/').map_or("", |pos| &bas.path[..=pos]);
            let path = format!("{dir}{}", refe.path);
            Some(
                UriReference {
                    path: &remove_dot_segments(&path),
                    query: refe.query,
                    fragment: refe.fragment,
                    ..Default::default()
                }
                .to_string(),
            )
        }
        _ => Some(uri.to_owned()),
    }
}

/// Escape the characters of a file path that may not appear in an URI path.
fn escape_path(path: &str) -> Cow<'_, str> {
    let keep = |b: u8| {
        b.is_ascii_alphanumeric()
            || matches!(
                b,
                b'-' | b'.' | b'_' | b'~' | b'/' | b'!' | b'$' | b'&' | b'\'' | b'(' | b')'
                    | b'*' | b'+' | b',' | b';' | b'=' | b':' | b'@'
            )
    };
    if path.bytes().all(keep) {
        return Cow::Borrowed(path);
    }
    let mut ret = String::with_capacity(path.len() + 8);
    for b in path.bytes() {
        if keep(b) {
            ret.push(b as char);
        } else {
            ret.push_str(&format!("%{b:02X}"));
        }
    }
    Cow::Owned(ret)
}

/// Constructs a `file:` URI for a local file.
///
/// Relative paths are made absolute against the current directory.
/// The path does not need to exist.
pub fn path_to_uri(path: impl AsRef<Path>) -> io::Result<String> {
    let path = path.as_ref();
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let path = path.to_string_lossy();
    #[cfg(target_os = "windows")]
    let path = Cow::<str>::Owned(format!("/{}", path.replace('\\', "/")));
    Ok(format!("file://{}", escape_path(&path)))
}

/// Decode the `pct-encoded` octets of `s`.
///
/// Returns `None` if the decoded octets are not UTF-8.
pub fn unescape_url(s: &str) -> Option<Cow<'_, str>> {
    if !s.contains('%') {
        return Some(Cow::Borrowed(s));
    }
    let mut out = Vec::with_capacity(s.len());
    let mut cur = s;
    while !cur.is_empty() {
        if starts_with_pct_encoded(cur) {
            out.push(u8::from_str_radix(&cur[1..3], 16).ok()?);
            cur = &cur[3..];
        } else {
            let len = cur.chars().next().map_or(1, char::len_utf8);
            out.extend_from_slice(&cur.as_bytes()[..len]);
            cur = &cur[len..];
        }
    }
    String::from_utf8(out).ok().map(Cow::Owned)
}

/// Converts a `file:` URI into a local path.
///
/// A string that is not an absolute URI is taken as a path already.
/// Returns `None` for URIs of other schemes or on a remote host.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let Some(parsed) = UriReference::parse(uri).filter(|u| u.is_absolute()) else {
        return Some(PathBuf::from(uri));
    };
    let scheme = parsed.scheme?;
    // drive letters such as "C:/catalog.xml"
    if scheme.len() == 1 {
        return Some(PathBuf::from(uri));
    }
    if !scheme.eq_ignore_ascii_case("file")
        || parsed
            .authority
            .is_some_and(|host| !host.is_empty() && host != "localhost")
    {
        return None;
    }
    let path = unescape_url(parsed.path)?;
    #[cfg(target_os = "windows")]
    let path = match path.as_bytes() {
        [b'/', _, b':', ..] => Cow::Owned(path[1..].to_owned()),
        _ => path,
    };
    Some(PathBuf::from(path.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_components() {
        let uri = UriReference::parse("http://user@example.org:8080/a/b?x=1#frag").unwrap();
        assert_eq!(uri.scheme, Some("http"));
        assert_eq!(uri.authority, Some("user@example.org:8080"));
        assert_eq!(uri.path, "/a/b");
        assert_eq!(uri.query, Some("x=1"));
        assert_eq!(uri.fragment, Some("frag"));
        assert_eq!(uri.to_string(), "http://user@example.org:8080/a/b?x=1#frag");

        let uri = UriReference::parse("urn:oasis:names:tc:entity:xmlns:xml:catalog").unwrap();
        assert_eq!(uri.scheme, Some("urn"));
        assert_eq!(uri.authority, None);
        assert_eq!(uri.path, "oasis:names:tc:entity:xmlns:xml:catalog");

        let uri = UriReference::parse("../sub/doc%20two.xml").unwrap();
        assert!(!uri.is_absolute());
        assert_eq!(uri.path, "../sub/doc%20two.xml");

        assert_eq!(UriReference::parse("").unwrap(), UriReference::default());
    }

    #[test]
    fn parse_rejects_invalid_references() {
        assert!(UriReference::parse("doc two.xml").is_none());
        assert!(UriReference::parse("1a:b").is_none());
        assert!(UriReference::parse("http://exa mple.org/").is_none());
        assert!(UriReference::parse("a#b#c").is_none());
        assert!(UriReference::parse("%zz").is_none());
    }

    // RFC 3986 section 5.4.
    #[test]
    fn resolve_reference_examples() {
        let base = Some("http://a/b/c/d;p?q");
        let cases = [
            ("g:h", "g:h"),
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            (";x", "http://a/b/c/;x"),
            ("", "http://a/b/c/d;p?q"),
            (".", "http://a/b/c/"),
            ("./", "http://a/b/c/"),
            ("..", "http://a/b/"),
            ("../", "http://a/b/"),
            ("../g", "http://a/b/g"),
            ("../..", "http://a/"),
            ("../../g", "http://a/g"),
            ("../../../g", "http://a/g"),
            ("/./g", "http://a/g"),
            ("/../g", "http://a/g"),
            ("g.", "http://a/b/c/g."),
            ("..g", "http://a/b/c/..g"),
            ("./../g", "http://a/b/g"),
            ("g/./h", "http://a/b/c/g/h"),
            ("g/../h", "http://a/b/c/h"),
            ("g;x=1/../y", "http://a/b/c/y"),
        ];
        for (href, expected) in cases {
            assert_eq!(resolve_reference(href, base).unwrap(), expected, "{href}");
        }
    }

    #[test]
    fn resolve_reference_errors() {
        assert_eq!(
            resolve_reference("doc.xml", None),
            Err(UriResolutionError::MissingBase {
                href: "doc.xml".to_owned()
            })
        );
        assert_eq!(
            resolve_reference("doc.xml", Some("relative/base.xml")),
            Err(UriResolutionError::InvalidBase {
                base: "relative/base.xml".to_owned()
            })
        );
        assert_eq!(
            resolve_reference("not a uri", Some("http://a/")),
            Err(UriResolutionError::InvalidReference {
                href: "not a uri".to_owned()
            })
        );
    }

    #[test]
    fn build_uri_is_lenient() {
        assert_eq!(
            build_uri("dtd/doc.dtd", "file:///etc/xml/catalog").as_deref(),
            Some("file:///etc/xml/dtd/doc.dtd")
        );
        assert_eq!(
            build_uri("doc.dtd", "catalogs/catalog.xml").as_deref(),
            Some("catalogs/doc.dtd")
        );
        assert_eq!(
            build_uri("../doc.dtd", "catalogs/sub/catalog.xml").as_deref(),
            Some("catalogs/doc.dtd")
        );
        assert_eq!(
            build_uri("http://x/doc.dtd", "whatever").as_deref(),
            Some("http://x/doc.dtd")
        );
        assert_eq!(build_uri("bad uri", "file:///a/"), None);
    }

    #[test]
    fn dot_segments() {
        assert!(matches!(remove_dot_segments("/a/b/c"), Cow::Borrowed("/a/b/c")));
        assert_eq!(remove_dot_segments("/a/b/c/./../../g"), "/a/g");
        assert_eq!(remove_dot_segments("mid/content=5/../6"), "mid/6");
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn file_paths_become_file_uris() {
        assert_eq!(
            path_to_uri("/etc/xml/catalog").unwrap(),
            "file:///etc/xml/catalog"
        );
        assert_eq!(
            path_to_uri("/tmp/my catalog.xml").unwrap(),
            "file:///tmp/my%20catalog.xml"
        );
        let uri = path_to_uri("catalog.xml").unwrap();
        assert!(uri.starts_with("file:///"));
        assert!(uri.ends_with("/catalog.xml"));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn file_uris_become_paths() {
        assert_eq!(
            uri_to_path("file:///etc/xml/catalog"),
            Some(PathBuf::from("/etc/xml/catalog"))
        );
        assert_eq!(
            uri_to_path("file://localhost/tmp/my%20catalog.xml"),
            Some(PathBuf::from("/tmp/my catalog.xml"))
        );
        assert_eq!(
            uri_to_path("catalogs/catalog.xml"),
            Some(PathBuf::from("catalogs/catalog.xml"))
        );
        assert_eq!(uri_to_path("http://example.org/catalog.xml"), None);
        assert_eq!(uri_to_path("file://remote/catalog.xml"), None);
    }

    #[test]
    fn unescape() {
        assert_eq!(unescape_url("a%20b%C3%A9").as_deref(), Some("a bé"));
        assert!(matches!(unescape_url("plain"), Some(Cow::Borrowed("plain"))));
        assert_eq!(unescape_url("%FF"), None);
    }
}
