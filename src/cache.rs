//! Cached layouts keyed by dataset content, and per-session bindings to them.
//!
//! [`ElementCache`] maps a [`DatasetKey`] to an immutable [`CachedLayout`] shared through an [`Arc`].
//! Writes replace the entire layout, and invalidation really removes the entry.
//!
//! [`SessionStore`] replaces a single global "current dataset" with explicit per-session state.
//! Each session is bound to at most one dataset key, and a layout is released once no session refers to it.

use crate::{CachedLayout, LayoutError, LayoutParams, PoaGraph};
use crate::formats::DatasetRecord;

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use sha2::{Digest, Sha256};


//-----------------------------------------------------------------------------

/// Content identity of an uploaded dataset.
///
/// The key is a SHA-256 digest, so identical uploads map to the same cache entry.
///
/// # Examples
///
/// ```
/// use poagraph_view::DatasetKey;
///
/// let key = DatasetKey::from_bytes(b"");
/// let hex = key.to_string();
/// assert_eq!(hex, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
/// assert_eq!(hex.parse::<DatasetKey>(), Ok(key));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatasetKey([u8; 32]);

impl DatasetKey {
    /// Hashes raw uploaded bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        DatasetKey(digest.into())
    }

    /// Hashes the canonical JSON serialization of a dataset record.
    pub fn of(dataset: &DatasetRecord) -> Self {
        let mut hasher = Sha256::new();
        // Serializing plain records into a vector cannot fail.
        let bytes = serde_json::to_vec(dataset).unwrap_or_default();
        hasher.update(&bytes);
        DatasetKey(hasher.finalize().into())
    }

    /// Returns the digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for DatasetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for DatasetKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("Invalid dataset key: {}", s));
        }
        let mut result = [0u8; 32];
        for (i, byte) in result.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).map_err(|x| {
                format!("Invalid dataset key {}: {}", s, x)
            })?;
        }
        Ok(DatasetKey(result))
    }
}

//-----------------------------------------------------------------------------

/// A concurrent cache of laid-out graphs.
///
/// Layouts are immutable and shared, so any number of readers can use a layout while another thread replaces or invalidates the entry.
/// A reader that obtained a layout keeps it alive until it drops the [`Arc`].
///
/// # Examples
///
/// ```
/// use poagraph_view::{CachedLayout, DatasetKey, ElementCache};
/// use std::sync::Arc;
///
/// let cache = ElementCache::new();
/// let key = DatasetKey::from_bytes(b"dataset");
/// cache.put(key, CachedLayout::empty(key)).unwrap();
/// assert!(cache.get(key).is_ok());
///
/// let weak = Arc::downgrade(&cache.get(key).unwrap());
/// assert!(cache.invalidate(key).unwrap());
/// assert!(cache.get(key).unwrap_err().is_cache_miss());
/// // The layout was released.
/// assert!(weak.upgrade().is_none());
/// ```
#[derive(Debug, Default)]
pub struct ElementCache {
    layouts: RwLock<HashMap<DatasetKey, Arc<CachedLayout>>>,
}

impl ElementCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        ElementCache::default()
    }

    fn poisoned<T>(_: T) -> LayoutError {
        LayoutError::Lock(String::from("element cache"))
    }

    /// Stores the layout under the key, replacing any existing entry.
    ///
    /// Returns the stored layout.
    pub fn put(&self, key: DatasetKey, layout: CachedLayout) -> Result<Arc<CachedLayout>, LayoutError> {
        self.put_shared(key, Arc::new(layout))
    }

    /// Stores a shared layout under the key, replacing any existing entry.
    ///
    /// Returns the stored layout.
    pub fn put_shared(&self, key: DatasetKey, layout: Arc<CachedLayout>) -> Result<Arc<CachedLayout>, LayoutError> {
        let mut layouts = self.layouts.write().map_err(Self::poisoned)?;
        if layouts.insert(key, layout.clone()).is_some() {
            log::debug!("Replaced cached layout {}", key);
        } else {
            log::debug!("Cached layout {}", key);
        }
        Ok(layout)
    }

    /// Returns the layout for the key.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::CacheMiss`] if there is no layout for the key.
    pub fn get(&self, key: DatasetKey) -> Result<Arc<CachedLayout>, LayoutError> {
        let layouts = self.layouts.read().map_err(Self::poisoned)?;
        layouts.get(&key).cloned().ok_or(LayoutError::CacheMiss(key))
    }

    /// Returns `true` if the cache contains a layout for the key.
    pub fn contains(&self, key: DatasetKey) -> Result<bool, LayoutError> {
        let layouts = self.layouts.read().map_err(Self::poisoned)?;
        Ok(layouts.contains_key(&key))
    }

    /// Returns the cached layout for the key, or builds and caches it with `build`.
    ///
    /// Nothing is stored if `build` fails.
    /// The lock is not held while building, so concurrent callers may build the same layout; the last write wins.
    pub fn get_or_insert_with<F>(&self, key: DatasetKey, build: F) -> Result<Arc<CachedLayout>, LayoutError>
    where
        F: FnOnce() -> Result<CachedLayout, LayoutError>,
    {
        match self.get(key) {
            Ok(layout) => {
                log::debug!("Cache hit: {}", key);
                Ok(layout)
            },
            Err(LayoutError::CacheMiss(_)) => {
                log::debug!("Cache miss: {}", key);
                let layout = build()?;
                self.put(key, layout)
            },
            Err(err) => Err(err),
        }
    }

    /// Removes the layout for the key.
    ///
    /// Returns `true` if there was such a layout.
    /// The memory is released once all readers have dropped their references.
    pub fn invalidate(&self, key: DatasetKey) -> Result<bool, LayoutError> {
        let removed = {
            let mut layouts = self.layouts.write().map_err(Self::poisoned)?;
            let removed = layouts.remove(&key);
            if layouts.is_empty() {
                layouts.shrink_to_fit();
            }
            removed
        };
        if removed.is_some() {
            log::debug!("Invalidated cached layout {}", key);
        }
        Ok(removed.is_some())
    }

    /// Removes all layouts.
    pub fn clear(&self) -> Result<(), LayoutError> {
        let mut layouts = self.layouts.write().map_err(Self::poisoned)?;
        layouts.clear();
        layouts.shrink_to_fit();
        Ok(())
    }

    /// Returns the number of cached layouts.
    pub fn len(&self) -> Result<usize, LayoutError> {
        let layouts = self.layouts.read().map_err(Self::poisoned)?;
        Ok(layouts.len())
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> Result<bool, LayoutError> {
        Ok(self.len()? == 0)
    }

    /// Returns the cached keys in sorted order.
    pub fn keys(&self) -> Result<Vec<DatasetKey>, LayoutError> {
        let layouts = self.layouts.read().map_err(Self::poisoned)?;
        let mut result: Vec<DatasetKey> = layouts.keys().copied().collect();
        result.sort_unstable();
        Ok(result)
    }

    /// Returns the estimated heap size of all cached layouts in bytes.
    pub fn heap_size(&self) -> Result<usize, LayoutError> {
        let layouts = self.layouts.read().map_err(Self::poisoned)?;
        Ok(layouts.values().map(|layout| layout.heap_size()).sum())
    }
}

//-----------------------------------------------------------------------------

/// Per-session bindings to cached layouts.
///
/// Uploading a dataset binds the session to the content key of the dataset.
/// The previous binding of the session is dropped, and its layout is invalidated if no other session uses it.
/// Sessions uploading identical data share one layout.
///
/// # Examples
///
/// ```
/// use poagraph_view::{LayoutError, LayoutParams, SessionStore};
/// use poagraph_view::formats::{DatasetRecord, NodeRecord, SequenceRecord};
///
/// let store = SessionStore::new(LayoutParams::default());
/// let dataset = DatasetRecord {
///     nodes: vec![
///         NodeRecord { id: 0, column_id: 0, aligned_to_id: None, label: String::from("A") },
///         NodeRecord { id: 1, column_id: 1, aligned_to_id: None, label: String::from("C") },
///     ],
///     sequences: vec![SequenceRecord { id: 0, path: vec![0, 1] }],
///     tree: None,
/// };
///
/// let layout = store.upload("alice", &dataset).unwrap();
/// assert_eq!(layout.node_count(), 2);
/// assert_eq!(store.current("alice").unwrap().key(), layout.key());
/// assert_eq!(store.current("bob").unwrap_err(), LayoutError::UnknownSession(String::from("bob")));
///
/// store.close("alice").unwrap();
/// assert_eq!(store.cache().len().unwrap(), 0);
/// ```
#[derive(Debug)]
pub struct SessionStore {
    cache: ElementCache,
    params: LayoutParams,
    sessions: Mutex<HashMap<String, DatasetKey>>,
}

impl SessionStore {
    /// Creates an empty store that lays out graphs with the given parameters.
    pub fn new(params: LayoutParams) -> Self {
        SessionStore {
            cache: ElementCache::new(),
            params,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying cache.
    pub fn cache(&self) -> &ElementCache {
        &self.cache
    }

    /// Returns the layout parameters.
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    fn poisoned<T>(_: T) -> LayoutError {
        LayoutError::Lock(String::from("session store"))
    }

    /// Lays out the dataset and binds the session to it.
    ///
    /// Reuses the cached layout if the same content has been uploaded before.
    ///
    /// # Errors
    ///
    /// Passes through validation and layout errors.
    /// The previous binding of the session is kept in that case.
    pub fn upload(&self, session: &str, dataset: &DatasetRecord) -> Result<Arc<CachedLayout>, LayoutError> {
        let key = DatasetKey::of(dataset);
        let layout = self.cache.get_or_insert_with(key, || {
            let graph = PoaGraph::from_record(dataset)?;
            CachedLayout::build(key, &graph, &self.params)
        })?;

        let mut sessions = self.sessions.lock().map_err(Self::poisoned)?;
        // Another session may have released the key after we got the layout.
        if !self.cache.contains(key)? {
            self.cache.put_shared(key, layout.clone())?;
        }
        let previous = sessions.insert(session.to_string(), key);
        if let Some(previous) = previous {
            if previous != key {
                Self::release_if_unused(&self.cache, &sessions, previous)?;
            }
        }
        log::info!("Session {} bound to dataset {} ({} nodes)", session, key, layout.node_count());
        Ok(layout)
    }

    /// Returns the key bound to the session, if any.
    pub fn key(&self, session: &str) -> Result<Option<DatasetKey>, LayoutError> {
        let sessions = self.sessions.lock().map_err(Self::poisoned)?;
        Ok(sessions.get(session).copied())
    }

    /// Returns the layout bound to the session.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownSession`] if the session has no binding.
    /// Returns [`LayoutError::CacheMiss`] if the layout is no longer cached.
    pub fn current(&self, session: &str) -> Result<Arc<CachedLayout>, LayoutError> {
        let key = self.key(session)?.ok_or_else(|| LayoutError::UnknownSession(session.to_string()))?;
        self.cache.get(key)
    }

    /// Unbinds the session and releases its layout if no other session uses it.
    ///
    /// Returns `true` if the session was bound.
    pub fn close(&self, session: &str) -> Result<bool, LayoutError> {
        let mut sessions = self.sessions.lock().map_err(Self::poisoned)?;
        match sessions.remove(session) {
            Some(key) => {
                Self::release_if_unused(&self.cache, &sessions, key)?;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Returns the number of bound sessions.
    pub fn sessions(&self) -> Result<usize, LayoutError> {
        let sessions = self.sessions.lock().map_err(Self::poisoned)?;
        Ok(sessions.len())
    }

    fn release_if_unused(cache: &ElementCache, sessions: &HashMap<String, DatasetKey>, key: DatasetKey) -> Result<(), LayoutError> {
        if !sessions.values().any(|bound| *bound == key) {
            cache.invalidate(key)?;
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------
