use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run-scoped cancellation flag, shared between the coordinator and the engine.
///
/// Once set it stays set.
#[derive(Clone, Debug, Default)]
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

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
