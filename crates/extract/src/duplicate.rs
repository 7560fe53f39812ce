// ABOUTME: Duplicate detector: fingerprints rendered content and remembers what a run has seen.
// ABOUTME: Fingerprint storage is injected through the FingerprintStore trait.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What to do with posts whose content was already seen in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Mark and leave them out of the exported feeds.
    #[default]
    Skip,
    /// Mark but still export them.
    Include,
}

/// Storage for the fingerprints seen in a run.
pub trait FingerprintStore: Send + Sync {
    /// Records a fingerprint; returns false if it was already present.
    fn insert(&self, fingerprint: &str) -> bool;
    fn clear(&self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory fingerprint set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    seen: Mutex<HashSet<String>>,
}

impl FingerprintStore for MemoryStore {
    fn insert(&self, fingerprint: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.insert(fingerprint.to_string())
    }

    fn clear(&self) {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Hex SHA-256 of normalized content.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Flags content whose fingerprint was already seen.
pub struct DuplicateDetector {
    store: Box<dyn FingerprintStore>,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(Box::new(MemoryStore::default()))
    }
}

impl std::fmt::Debug for DuplicateDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateDetector")
            .field("seen", &self.store.len())
            .finish()
    }
}

impl DuplicateDetector {
    pub fn new(store: Box<dyn FingerprintStore>) -> Self {
        Self { store }
    }

    /// Records the content and returns true if it was seen before.
    pub fn is_duplicate(&self, content: &str) -> bool {
        self.check_fingerprint(&fingerprint(content))
    }

    /// Same as [`is_duplicate`](Self::is_duplicate) for a precomputed fingerprint.
    pub fn check_fingerprint(&self, fingerprint: &str) -> bool {
        !self.store.insert(fingerprint)
    }

    /// Forgets every fingerprint; called at the start of each run.
    pub fn reset(&self) {
        self.store.clear();
    }

    pub fn seen(&self) -> usize {
        self.store.len()
    }
}
