use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::TypeError;

/// Content-addressed identifier for a remote object (blob, tree, or commit).
///
/// Tree and commit ids are assigned by the remote store and treated as
/// opaque. Blob ids follow Git's object format, so [`git_blob`](Self::git_blob)
/// can tell locally whether some content equals what a tree entry points at.
/// The only structural requirement is a non-empty hex string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.len() % 2 != 0 {
            return Err(TypeError::InvalidObjectId(s.to_string()));
        }
        hex::decode(trimmed).map_err(|e| TypeError::InvalidObjectId(format!("{s}: {e}")))?;
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Build an id from raw hash bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Git blob id of `content`: SHA-1 over `"blob <len>\0"` and the bytes.
    pub fn git_blob(content: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(format!("blob {}\0", content.len()).as_bytes());
        hasher.update(content);
        Self::from_bytes(&hasher.finalize())
    }

    /// Hex-encoded string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short hex representation (first 7 characters, as Git prints them).
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(7)]
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
