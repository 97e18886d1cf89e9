//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types and make the
//! code more self-documenting. `DealId` additionally absorbs the JSON
//! string-versus-number ambiguity at the deserialization boundary: the ledger
//! builder writes numeric ids while tracking links and checkout metadata
//! carry them as strings, and the two must compare equal.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A deal identifier, normalized to its string form.
///
/// Deal ids arrive as JSON numbers (from the ledger builder), as JSON strings
/// (from checkout metadata), and as URL path segments. All three normalize to
/// the same string, so `DealId` equality is the string-normalized comparison
/// used everywhere a deal is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DealId(String);

impl DealId {
    pub fn new(s: impl Into<String>) -> Self {
        DealId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DealId {
    fn from(s: String) -> Self {
        DealId(s)
    }
}

impl From<&str> for DealId {
    fn from(s: &str) -> Self {
        DealId(s.to_string())
    }
}

impl From<u64> for DealId {
    fn from(n: u64) -> Self {
        DealId(n.to_string())
    }
}

impl<'de> Deserialize<'de> for DealId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl de::Visitor<'_> for IdVisitor {
            type Value = DealId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer deal identifier")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DealId, E> {
                Ok(DealId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<DealId, E> {
                Ok(DealId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<DealId, E> {
                Ok(DealId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// A unique identifier for one click event, freshly generated per redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClickId(Uuid);

impl ClickId {
    /// Generates a fresh random click id.
    pub fn generate() -> Self {
        ClickId(Uuid::new_v4())
    }
}

impl fmt::Display for ClickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
