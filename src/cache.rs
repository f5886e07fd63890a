//! Process-wide render cache
//!
//! Maps a [`SourceDescriptor`] to the drawable previously rendered for it
//! so repeated requests skip re-parsing and re-rasterizing. The cache is a
//! clonable handle over shared state: create it once at process start and
//! hand clones to every widget instance that should share entries.
//!
//! Entries are never evicted or expired — the mapping lives for the
//! process lifetime, and bounding its memory is the embedding
//! application's responsibility (rasterized artifacts are cached here for
//! the same reason the external engine leaves raster caching to its
//! callers). Test isolation comes from constructing a fresh cache per
//! test rather than from a clear operation.

use crate::render::RenderedDrawable;
use crate::source::SourceDescriptor;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared mapping from source descriptor to rendered drawable.
///
/// All operations take `&self` and are safe under any number of
/// concurrent callers; the mapping behaves atomically — no caller ever
/// observes a partially-written entry, and a store under one key never
/// disturbs entries under other keys. At most one drawable is visible per
/// distinct descriptor; `store` overwrites, never merges.
///
/// # Examples
///
/// ```
/// use svgview::cache::RenderCache;
///
/// let cache = RenderCache::new();
/// let shared = cache.clone(); // same entries, different handle
/// assert!(shared.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct RenderCache {
  entries: Arc<Mutex<HashMap<SourceDescriptor, RenderedDrawable>>>,
}

impl RenderCache {
  /// Creates an empty cache
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the drawable stored for the descriptor, if any.
  ///
  /// Pure read; the returned drawable shares pixels with the entry.
  pub fn lookup(&self, key: &SourceDescriptor) -> Option<RenderedDrawable> {
    self
      .entries
      .lock()
      .ok()
      .and_then(|entries| entries.get(key).cloned())
  }

  /// Stores a drawable under the descriptor, replacing any previous entry
  pub fn store(&self, key: SourceDescriptor, value: RenderedDrawable) {
    if let Ok(mut entries) = self.entries.lock() {
      entries.insert(key, value);
    }
  }

  /// Whether an entry exists for the descriptor
  pub fn contains(&self, key: &SourceDescriptor) -> bool {
    self
      .entries
      .lock()
      .ok()
      .map(|entries| entries.contains_key(key))
      .unwrap_or(false)
  }

  /// Number of cached entries
  pub fn len(&self) -> usize {
    self.entries.lock().ok().map(|e| e.len()).unwrap_or(0)
  }

  /// Whether the cache holds no entries
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl std::fmt::Debug for RenderCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RenderCache")
      .field("len", &self.len())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::render::{ResvgEngine, VectorEngine};
  use crate::resolver::NoResolver;

  fn drawable() -> RenderedDrawable {
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="2" height="2"/>"#;
    ResvgEngine::new()
      .render(svg, &NoResolver)
      .expect("render fixture")
  }

  #[test]
  fn lookup_returns_the_stored_artifact() {
    let cache = RenderCache::new();
    let key = SourceDescriptor::Asset("logo.svg".to_string());
    assert!(cache.lookup(&key).is_none());
    assert!(!cache.contains(&key));

    let stored = drawable();
    cache.store(key.clone(), stored.clone());

    let found = cache.lookup(&key).expect("stored entry");
    assert!(found.ptr_eq(&stored), "expected the same artifact back");
    assert!(cache.contains(&key));
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn store_overwrites_per_key() {
    let cache = RenderCache::new();
    let key = SourceDescriptor::Resource(3);
    let first = drawable();
    let second = drawable();

    cache.store(key.clone(), first.clone());
    cache.store(key.clone(), second.clone());

    assert_eq!(cache.len(), 1);
    let found = cache.lookup(&key).expect("stored entry");
    assert!(found.ptr_eq(&second));
    assert!(!found.ptr_eq(&first));
  }

  #[test]
  fn clones_share_entries() {
    let cache = RenderCache::new();
    let shared = cache.clone();
    cache.store(SourceDescriptor::Resource(1), drawable());
    assert!(shared.contains(&SourceDescriptor::Resource(1)));
  }

  #[test]
  fn variants_with_equal_payloads_are_distinct_keys() {
    let cache = RenderCache::new();
    cache.store(SourceDescriptor::Asset("x".to_string()), drawable());
    assert!(!cache.contains(&SourceDescriptor::Locator("x".to_string())));
  }
}
