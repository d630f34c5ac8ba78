use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

/// An opaque locator identifying one object in the blob store.
///
/// Keys are minted once per upload as `{uuid-v4}/{original filename}` and
/// never reused: deleting an object retires its key forever.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Mint a fresh, globally unique key for an upload.
    ///
    /// The caller is responsible for handing in a flat filename (no path
    /// separators); the uuid prefix guarantees uniqueness even when the
    /// same file is uploaded twice.
    pub fn mint(file_name: &str) -> Self {
        Self(format!("{}/{}", Uuid::new_v4(), file_name))
    }

    /// Parse a key previously minted by [`ObjectKey::mint`] back from its
    /// stored string form.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidKey("key is empty".into()));
        }
        if s.starts_with('/') || s.ends_with('/') {
            return Err(StorageError::InvalidKey(
                "key must not start or end with '/'".into(),
            ));
        }
        if s.contains('\0') {
            return Err(StorageError::InvalidKey(
                "key must not contain null bytes".into(),
            ));
        }
        if s.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(StorageError::InvalidKey(
                "key must not contain empty or '..' segments".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments of the key, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
