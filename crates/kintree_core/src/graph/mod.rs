//! Bounded multi-generation tree construction.
//!
//! # Responsibility
//! - Turn the flat relationship store into a bounded per-request view.
//! - Keep traversal deterministic and cycle-safe over untrusted edges.
//!
//! # Invariants
//! - Person ids are unique across one `TreeView`.
//! - Generation offsets are strictly layered: ancestors < 0 <
//!   descendants; spouses sit at 0.
//! - Cancellation is checked between generation layers, never mid-layer.

pub mod builder;
pub mod view;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared with the traversal.
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());

        token.cancel();
        assert!(other.is_cancelled());
    }
}
