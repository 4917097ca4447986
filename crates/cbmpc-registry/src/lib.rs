//! Handle registry (§4.1, C1): a process-wide table that hands the engine
//! an opaque token instead of a host pointer it cannot hold.
//!
//! Grounded on the "opaque token instead of raw pointer" idiom spec.md §9
//! describes directly, implemented with the same `parking_lot`-guarded
//! shared-map shape the teacher uses for its process-wide daemon state.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use cbmpc_types::{Error, Result};

/// An opaque, pointer-sized token. Zero is reserved as "no handle" and is
/// never issued by [`Registry::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    /// The reserved "no handle" sentinel.
    pub const NONE: Token = Token(0);

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

/// A concurrent, process-wide registry of opaque host values.
///
/// Safe for concurrent `register`/`lookup`/`free` from many tasks at once
/// (§4.1: "the registry must be safe for concurrent use").
pub struct Registry {
    table: RwLock<HashMap<u64, Entry>>,
    next: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }

    /// Allocates a fresh token and stores `value` under it.
    pub fn register<T: Any + Send + Sync>(&self, value: T) -> Token {
        let token = self.next.fetch_add(1, Ordering::Relaxed);
        debug_assert_ne!(token, 0, "token counter wrapped past u64::MAX");
        self.table.write().insert(token, Arc::new(value));
        Token(token)
    }

    /// Returns the value stored under `token`, downcast to `T`.
    ///
    /// Fails with [`Error::InvalidHandle`] if `token` is zero, unknown, or
    /// was stored with a different concrete type.
    pub fn lookup<T: Any + Send + Sync + Clone>(&self, token: Token) -> Result<T> {
        if token.is_none() {
            return Err(Error::InvalidHandle("handle is zero (no handle)".into()));
        }
        let entry = self
            .table
            .read()
            .get(&token.0)
            .cloned()
            .ok_or_else(|| Error::InvalidHandle(format!("unknown or freed handle {token}")))?;
        entry
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::InvalidHandle(format!("handle {token} has the wrong type")))
    }

    /// Returns the raw `Arc` stored under `token`, without requiring `T:
    /// Clone`. Useful for engine-opaque resources that are themselves
    /// `Arc`-shared rather than value types.
    pub fn lookup_any(&self, token: Token) -> Result<Arc<dyn Any + Send + Sync>> {
        if token.is_none() {
            return Err(Error::InvalidHandle("handle is zero (no handle)".into()));
        }
        self.table
            .read()
            .get(&token.0)
            .cloned()
            .ok_or_else(|| Error::InvalidHandle(format!("unknown or freed handle {token}")))
    }

    /// Removes the mapping for `token`. A no-op for zero or unknown tokens
    /// (§4.1: "Freeing an unknown or zero token is a no-op").
    pub fn free(&self, token: Token) {
        if token.is_none() {
            return;
        }
        self.table.write().remove(&token.0);
    }

    /// The number of live entries, for diagnostics and tests.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
