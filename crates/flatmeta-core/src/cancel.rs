use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{error::MetaError, Result};

/// Cooperative cancellation flag shared between the signal handler and blocking calls.
///
/// Setting it is a single atomic store, so it is safe to do from a signal handler.
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

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns [`MetaError::Cancelled`] once the token has been set.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MetaError::Cancelled)
        } else {
            Ok(())
        }
    }
}
