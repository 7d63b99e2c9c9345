use chedit_types::ObjectId;

/// Domain-separated BLAKE3 hasher.
///
/// The domain tag is hashed ahead of the payload so that a blob and a tree
/// with identical bytes never share an id.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    pub const BLOB: Self = Self::new("chedit-blob-v1");
    pub const TREE: Self = Self::new("chedit-tree-v1");
    pub const COMMIT: Self = Self::new("chedit-commit-v1");

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}
