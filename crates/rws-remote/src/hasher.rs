use rws_types::ObjectId;

/// Domain-separated BLAKE3 hasher for tree and commit ids.
///
/// Used by [`InMemoryRemote`](crate::InMemoryRemote). Blob ids use the Git
/// blob format instead (see [`ObjectId::git_blob`]), so that local content
/// can be compared against tree entries.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for tree objects.
    pub const TREE: Self = Self {
        domain: "rws-tree-v1",
    };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self {
        domain: "rws-commit-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_bytes(hasher.finalize().as_bytes())
    }

    /// Hash a sequence of parts, each length-prefixed so boundaries matter.
    pub fn hash_parts<'a>(&self, parts: impl IntoIterator<Item = &'a [u8]>) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        ObjectId::from_bytes(hasher.finalize().as_bytes())
    }
}
