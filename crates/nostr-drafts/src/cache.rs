//! Content-addressed memo of emitted drafts.
//!
//! Rebuilding a structurally identical draft returns the stored one, so a
//! compose preview that re-renders keeps its original `created_at`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::draft::Draft;
use crate::events::{unix_timestamp, NostrTag};

type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

#[derive(Clone)]
pub struct DraftCache {
    entries: Arc<Mutex<HashMap<String, Draft>>>,
    clock: Clock,
}

impl Default for DraftCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DraftCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl DraftCache {
    pub fn new() -> Self {
        Self::with_clock(unix_timestamp)
    }

    /// Uses `clock` (unix seconds) to stamp newly created drafts.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(clock),
        }
    }

    /// Returns the stored draft for `(kind, content, tags)`, creating it with
    /// a fresh timestamp on first use. The first stored value wins.
    pub fn get_or_create(&self, kind: u16, content: String, tags: Vec<NostrTag>) -> Draft {
        let key = cache_key(kind, &content, &tags);
        let mut entries = self.lock();
        entries
            .entry(key)
            .or_insert_with(|| {
                debug!(kind, "Minting new draft timestamp");
                Draft {
                    kind,
                    content,
                    tags,
                    created_at: (self.clock)(),
                }
            })
            .clone()
    }

    pub fn invalidate(&self, draft: &Draft) -> bool {
        self.invalidate_parts(draft.kind, &draft.content, &draft.tags)
    }

    pub fn invalidate_parts(&self, kind: u16, content: &str, tags: &[NostrTag]) -> bool {
        let key = cache_key(kind, content, tags);
        self.lock().remove(&key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Draft>> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// SHA-256 over the length-prefixed kind, content and tag fields, hex encoded.
pub fn cache_key(kind: u16, content: &str, tags: &[NostrTag]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.to_be_bytes());
    update_field(&mut hasher, content);
    hasher.update((tags.len() as u64).to_be_bytes());
    for tag in tags {
        hasher.update((tag.values.len() as u64 + 1).to_be_bytes());
        update_field(&mut hasher, &tag.name);
        for value in &tag.values {
            update_field(&mut hasher, value);
        }
    }
    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}
