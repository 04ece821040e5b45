//! Build cancellation
//!
//! A [`CancellationToken`] is shared between the caller and a running build.
//! Workers call [`CancellationToken::check`] before scoring each tile, so a
//! request lands at the next tile boundary and the build returns
//! [`BuildError::Cancelled`] without producing a graph.

use super::{BuildError, BuildResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancel flag for one or more builds
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that every build holding this token stop at its next tile
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(BuildError::Cancelled)` once cancellation has been requested
    pub fn check(&self) -> BuildResult<()> {
        if self.is_cancelled() {
            Err(BuildError::Cancelled)
        } else {
            Ok(())
        }
    }
}
