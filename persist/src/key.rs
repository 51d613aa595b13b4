//! Member keys as declared by the `#[key(..)]` marker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one persisted member within a type.
///
/// Integer and string keys live in separate namespaces: `Index(1)` and
/// `Name("1")` are different keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MemberKey {
    Index(i64),
    Name(String),
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<i64> for MemberKey {
    fn from(i: i64) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for MemberKey {
    fn from(s: &str) -> Self {
        Self::Name(s.to_owned())
    }
}

impl From<String> for MemberKey {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}

/// The payload of a key marker: an optional integer key and an optional
/// string key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeySpec {
    pub index: Option<i64>,
    pub name: Option<&'static str>,
}

impl KeySpec {
    pub const fn index(index: i64) -> Self {
        Self {
            index: Some(index),
            name: None,
        }
    }

    pub const fn name(name: &'static str) -> Self {
        Self {
            index: None,
            name: Some(name),
        }
    }

    pub const fn both(index: i64, name: &'static str) -> Self {
        Self {
            index: Some(index),
            name: Some(name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.name.is_none()
    }

    /// All keys this marker registers, integer form first.
    pub fn keys(&self) -> impl Iterator<Item = MemberKey> + '_ {
        self.index
            .map(MemberKey::Index)
            .into_iter()
            .chain(self.name.map(MemberKey::from))
    }
}
