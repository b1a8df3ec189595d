use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation signal scoped to a single search generation.
///
/// The controller creates one token per generation and keeps a clone; the
/// executor only ever reads it. Cancelling one generation's token has no
/// effect on any other token.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let seen_by_worker = token.clone();
        assert!(!seen_by_worker.is_cancelled());
        token.cancel();
        assert!(seen_by_worker.is_cancelled());
    }

    #[test]
    fn test_tokens_are_independent() {
        let old = CancellationToken::new();
        let new = CancellationToken::new();
        old.cancel();
        assert!(old.is_cancelled());
        assert!(!new.is_cancelled());
    }
}
