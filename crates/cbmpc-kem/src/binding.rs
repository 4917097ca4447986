//! Task-local KEM binding (§4.2, §9).
//!
//! The engine's callbacks run synchronously on the caller's own OS thread
//! (§9) — there is no async task boundary to cross — so a plain
//! `thread_local!` is the right storage, matching "whatever task-local
//! storage the target language provides" (§4.2). Binding is scoped: the
//! guard restores the previous binding on drop, so nested protocol runs
//! (a façade call inside another façade call on the same thread) compose
//! without leaking one call's KEM into another's.

use crate::Kem;
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CURRENT_KEM: RefCell<Option<Arc<dyn Kem>>> = const { RefCell::new(None) };
}

/// Binds `kem` as the current thread's KEM, returning a guard that
/// restores the previous binding when dropped.
#[must_use = "the binding is only in effect while this guard is alive"]
pub fn bind_kem(kem: Arc<dyn Kem>) -> ScopedKemGuard {
    let previous = CURRENT_KEM.with(|cell| cell.replace(Some(kem)));
    ScopedKemGuard { previous }
}

/// Returns the thread's currently bound KEM, if any.
pub fn current_kem() -> Option<Arc<dyn Kem>> {
    CURRENT_KEM.with(|cell| cell.borrow().clone())
}

/// RAII guard restoring the previous task-local KEM binding on drop.
pub struct ScopedKemGuard {
    previous: Option<Arc<dyn Kem>>,
}

impl Drop for ScopedKemGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_KEM.with(|cell| *cell.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RsaOaepKem;

    #[test]
    fn test_binding_is_visible_while_guard_lives() {
        assert!(current_kem().is_none());
        let kem: Arc<dyn Kem> = Arc::new(RsaOaepKem::new(2048));
        {
            let _guard = bind_kem(kem);
            assert!(current_kem().is_some());
        }
        assert!(current_kem().is_none());
    }

    #[test]
    fn test_nested_binding_restores_outer() {
        let outer: Arc<dyn Kem> = Arc::new(RsaOaepKem::new(2048));
        let inner: Arc<dyn Kem> = Arc::new(RsaOaepKem::new(3072));

        let _outer_guard = bind_kem(outer.clone());
        let outer_ek = current_kem()
            .expect("outer bound")
            .generate()
            .expect("generate")
            .1;
        {
            let _inner_guard = bind_kem(inner);
            let inner_ek = current_kem()
                .expect("inner bound")
                .generate()
                .expect("generate")
                .1;
            assert_ne!(outer_ek.len(), 0);
            assert_ne!(inner_ek.len(), 0);
        }
        // Outer binding must still be in effect.
        assert!(current_kem().is_some());
    }
}
