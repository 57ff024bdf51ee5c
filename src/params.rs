//! Named parameters handed to a transformation engine.
//!
//! Values are opaque here: they are stored and iterated, never interpreted.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

/// A name qualified by an optional namespace URI.
///
/// The textual form is the Clark notation, `{namespace}local` or `local`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    namespace: Option<String>,
    local_name: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local_name: &str) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(|ns| ns.to_owned()),
            local_name: local_name.to_owned(),
        }
    }

    /// A name in no namespace.
    pub fn local(local_name: &str) -> Self {
        Self::new(None, local_name)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ns) = self.namespace.as_deref() {
            write!(f, "{{{ns}}}")?;
        }
        write!(f, "{}", self.local_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseQNameError {
    name: String,
}

impl Display for ParseQNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' is not a valid qualified name", self.name)
    }
}

impl std::error::Error for ParseQNameError {}

impl FromStr for QName {
    type Err = ParseQNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseQNameError { name: s.to_owned() };
        let (namespace, local_name) = match s.strip_prefix('{') {
            Some(rem) => {
                let (ns, local) = rem.split_once('}').ok_or_else(err)?;
                (Some(ns), local)
            }
            None => (None, s),
        };
        if local_name.is_empty()
            || local_name.contains(['{', '}', ':'])
            || local_name.contains(|c: char| c.is_whitespace())
        {
            return Err(err());
        }
        Ok(Self::new(namespace, local_name))
    }
}

/// The value of a transformation parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Boolean(bool),
    String(String),
    /// An URI, for example the location of a document to load.
    Uri(String),
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{value}"),
            Self::String(value) | Self::Uri(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Parameters of a transformation, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformParameters {
    params: BTreeMap<QName, ParamValue>,
}

impl TransformParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parameter `name`.
    ///
    /// Returns the previous value if the parameter was already set.
    pub fn set(&mut self, name: QName, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.params.insert(name, value.into())
    }

    pub fn get(&self, name: &QName) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn remove(&mut self, name: &QName) -> Option<ParamValue> {
        self.params.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QName, &ParamValue)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<'a> IntoIterator for &'a TransformParameters {
    type Item = (&'a QName, &'a ParamValue);
    type IntoIter = std::collections::btree_map::Iter<'a, QName, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
