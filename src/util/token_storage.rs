//! Durable access/refresh token persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! Only the session store writes through this module. The browser backend
//! keeps two string entries in `localStorage`; everything else about the
//! session (user identity included) is re-derived on load.
//!
//! TRADE-OFFS
//! ==========
//! Storage is best-effort: with no `window` or no `localStorage` (SSR,
//! native, privacy mode), `load` yields `None` and writes are dropped. Expiry
//! is never tracked here; the server reports it by rejecting a request.

#[cfg(test)]
#[path = "token_storage_test.rs"]
mod token_storage_test;

use std::cell::RefCell;
use std::collections::HashMap;

pub const DEFAULT_ACCESS_TOKEN_KEY: &str = "authToken";
pub const DEFAULT_REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Which of the two persisted credentials an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Storage entry names for each token kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    pub access: String,
    pub refresh: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self { access: DEFAULT_ACCESS_TOKEN_KEY.to_owned(), refresh: DEFAULT_REFRESH_TOKEN_KEY.to_owned() }
    }
}

impl StorageKeys {
    #[must_use]
    pub fn key(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

/// Token persistence backend. Implementations must never panic.
pub trait TokenStorage {
    fn save(&self, kind: TokenKind, value: &str);
    fn load(&self, kind: TokenKind) -> Option<String>;
    fn remove(&self, kind: TokenKind);
}

/// `localStorage`-backed persistence; inert outside a hydrated browser.
#[derive(Clone, Debug, Default)]
pub struct BrowserTokenStorage {
    keys: StorageKeys,
}

impl BrowserTokenStorage {
    #[must_use]
    pub fn new(keys: StorageKeys) -> Self {
        Self { keys }
    }

    #[cfg(feature = "hydrate")]
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl TokenStorage for BrowserTokenStorage {
    fn save(&self, kind: TokenKind, value: &str) {
        #[cfg(feature = "hydrate")]
        {
            let Some(storage) = Self::local_storage() else {
                return;
            };
            if storage.set_item(self.keys.key(kind), value).is_err() {
                log::warn!("token storage: failed to write {kind:?} token");
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (self.keys.key(kind), value);
        }
    }

    fn load(&self, kind: TokenKind) -> Option<String> {
        #[cfg(feature = "hydrate")]
        {
            let storage = Self::local_storage()?;
            storage.get_item(self.keys.key(kind)).ok().flatten()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = self.keys.key(kind);
            None
        }
    }

    fn remove(&self, kind: TokenKind) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(storage) = Self::local_storage() {
                if storage.remove_item(self.keys.key(kind)).is_err() {
                    log::warn!("token storage: failed to remove {kind:?} token");
                }
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = self.keys.key(kind);
        }
    }
}

/// In-process persistence for native consumers and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    values: RefCell<HashMap<TokenKind, String>>,
}

impl MemoryTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated as if a previous page load had saved tokens.
    #[must_use]
    pub fn seeded(access: Option<&str>, refresh: Option<&str>) -> Self {
        let storage = Self::default();
        if let Some(access) = access {
            storage.save(TokenKind::Access, access);
        }
        if let Some(refresh) = refresh {
            storage.save(TokenKind::Refresh, refresh);
        }
        storage
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn save(&self, kind: TokenKind, value: &str) {
        self.values.borrow_mut().insert(kind, value.to_owned());
    }

    fn load(&self, kind: TokenKind) -> Option<String> {
        self.values.borrow().get(&kind).cloned()
    }

    fn remove(&self, kind: TokenKind) {
        self.values.borrow_mut().remove(&kind);
    }
}
