//! Lazily loaded binary media.

use crate::ofd::OfdContainer;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Media bytes read from the package on first use and memoized.
///
/// Keys are upper-cased package paths. The lock is held across the read, so
/// a key is decoded at most once even under concurrent access. Clones share
/// the cache.
#[derive(Clone, Default)]
pub struct MediaStore {
    inner: Option<Arc<Mutex<MediaState>>>,
}

struct MediaState {
    container: OfdContainer,
    cache: HashMap<String, Bytes>,
}

impl MediaStore {
    pub(crate) fn new(container: OfdContainer) -> Self {
        Self {
            inner: Some(Arc::new(Mutex::new(MediaState {
                container,
                cache: HashMap::new(),
            }))),
        }
    }

    /// Returns the bytes of the entry at `path`, reading it on first use.
    pub fn load(&self, path: &str) -> Option<Bytes> {
        let inner = self.inner.as_ref()?;
        let key = path.to_uppercase();

        let mut state = inner.lock();
        if let Some(data) = state.cache.get(&key) {
            return Some(data.clone());
        }

        match state.container.read_binary(path) {
            Ok(data) => {
                let data = Bytes::from(data);
                state.cache.insert(key, data.clone());
                Some(data)
            }
            Err(e) => {
                log::warn!("cannot load media {path}: {e}");
                None
            }
        }
    }

    /// True if `path` names an entry of the package.
    pub fn contains(&self, path: &str) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.lock().container.contains(path))
    }

    /// Number of memoized entries.
    pub fn cached(&self) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.lock().cache.len())
    }
}

impl std::fmt::Debug for MediaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStore")
            .field("attached", &self.inner.is_some())
            .field("cached", &self.cached())
            .finish()
    }
}
