//! Root store shape and the shared container that owns it.
//!
//! The [`Store`] value is only ever replaced through [`StoreHandle::dispatch`],
//! which runs [`reduce`](crate::reducer::reduce) under the container's write
//! lock. Readers take snapshots or borrow the current value briefly; nothing
//! outside the reducer mutates the cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::action::Action;
use crate::model::{Author, AuthorId, Paper, PaperId};
use crate::reducer::reduce;

/// Full client state: backend location plus the collection cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub uri: UriState,
    pub db: DbCache,
}

impl Store {
    /// An empty, unsynced store pointed at `backend`.
    pub fn with_backend(backend: impl Into<String>) -> Self {
        Self {
            uri: UriState {
                backend: backend.into(),
            },
            db: DbCache::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriState {
    pub backend: String,
}

/// Client-held mirror of the backend collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbCache {
    pub synced: bool,
    #[serde(rename = "lastSynced")]
    pub last_synced: Option<DateTime<Utc>>,
    pub papers: HashMap<PaperId, Paper>,
    pub authors: HashMap<AuthorId, Author>,
}

/// Payload of `SET_SYNC_STATUS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub synced: bool,
    #[serde(rename = "lastSynced", default)]
    pub last_synced: Option<DateTime<Utc>>,
}

/// Shared, cloneable owner of the [`Store`].
///
/// Construct one per application (or per test) and pass it to every consumer.
#[derive(Clone)]
pub struct StoreHandle {
    tx: Arc<watch::Sender<Store>>,
}

impl StoreHandle {
    pub fn new(initial: Store) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Apply `action` to the current store. Dispatches are serialized.
    pub fn dispatch(&self, action: Action) {
        tracing::trace!(action = action.kind(), "dispatch");
        self.tx.send_modify(move |state| {
            let prev = std::mem::take(state);
            *state = reduce(prev, action);
        });
    }

    /// Clone of the current store.
    pub fn snapshot(&self) -> Store {
        self.tx.borrow().clone()
    }

    /// Run `f` against the current store without cloning it.
    ///
    /// Do not dispatch from inside `f`.
    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver that wakes whenever a dispatch produces a new store.
    pub fn subscribe(&self) -> watch::Receiver<Store> {
        self.tx.subscribe()
    }

    pub fn backend_uri(&self) -> String {
        self.read(|s| s.uri.backend.clone())
    }
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new(Store::default())
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.read(|s| {
            f.debug_struct("StoreHandle")
                .field("backend", &s.uri.backend)
                .field("synced", &s.db.synced)
                .field("papers", &s.db.papers.len())
                .field("authors", &s.db.authors.len())
                .finish()
        })
    }
}
