//! Key/value storage tiers backing the credential store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser exposes two tiers: `localStorage` (durable, shared across tabs)
//! and `sessionStorage` (scoped to one tab). Both are global mutable state with
//! no locking. The `StorageTier` trait lets the credential store run against
//! the real tiers in hydrate builds and against `MemoryStorage` in SSR and tests.
//!
//! TRADE-OFFS
//! ==========
//! Browser tiers look up `window.*Storage` on every call instead of caching a
//! handle, so a write from another tab is always visible to the next read.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A string key/value store with browser `Storage` semantics.
pub trait StorageTier {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// In-process tier used for server rendering and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl StorageTier for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items.borrow_mut().insert(key.to_owned(), value.to_owned());
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

/// Which browser tier a [`BrowserStorage`] reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TierKind {
    /// `localStorage`: survives restarts, shared by every tab.
    Durable,
    /// `sessionStorage`: cleared with the tab.
    Tab,
}

/// `window.localStorage` / `window.sessionStorage` adapter.
#[derive(Clone, Copy, Debug)]
pub struct BrowserStorage {
    kind: TierKind,
}

impl BrowserStorage {
    #[must_use]
    pub fn new(kind: TierKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub fn kind(&self) -> TierKind {
        self.kind
    }

    #[cfg(feature = "hydrate")]
    fn storage(&self) -> Option<web_sys::Storage> {
        let window = web_sys::window()?;
        let storage = match self.kind {
            TierKind::Durable => window.local_storage(),
            TierKind::Tab => window.session_storage(),
        };
        storage.unwrap_or_default()
    }
}

impl StorageTier for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        #[cfg(feature = "hydrate")]
        {
            self.storage()?.get_item(key).unwrap_or_default()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            None
        }
    }

    fn set_item(&self, key: &str, value: &str) {
        #[cfg(feature = "hydrate")]
        {
            let Some(storage) = self.storage() else {
                return;
            };
            if storage.set_item(key, value).is_err() {
                log::warn!("storage write failed: tier={:?} key={key}", self.kind);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (key, value);
        }
    }

    fn remove_item(&self, key: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(storage) = self.storage() {
                if storage.remove_item(key).is_err() {
                    log::warn!("storage remove failed: tier={:?} key={key}", self.kind);
                }
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
        }
    }
}

/// Load a JSON value stored under `key`.
///
/// Unparseable values read as absent.
pub fn load_json<T: DeserializeOwned>(tier: &dyn StorageTier, key: &str) -> Option<T> {
    let raw = tier.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("ignoring unparseable storage value: key={key} error={e}");
            None
        }
    }
}

/// Save `value` as JSON under `key`.
pub fn save_json<T: Serialize>(tier: &dyn StorageTier, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => tier.set_item(key, &raw),
        Err(e) => log::warn!("storage serialize failed: key={key} error={e}"),
    }
}
