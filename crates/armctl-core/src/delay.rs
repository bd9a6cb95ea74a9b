//! Cancellable waiting.
//!
//! The sequencer never calls `std::thread::sleep` directly. It waits through a
//! [`Delay`], which gives up as soon as the run's [`CancelToken`] is set.

use crate::error::Cancelled;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared stop flag, set from a signal handler or another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

pub trait Delay {
    /// Blocks for `duration` unless `cancel` is set first.
    fn sleep(&mut self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled>;
}

/// Wall-clock delay that polls the token every `slice`.
#[derive(Debug, Clone, Copy)]
pub struct ThreadDelay {
    slice: Duration,
}

impl ThreadDelay {
    pub fn new(slice: Duration) -> Self {
        Self { slice }
    }
}

impl Default for ThreadDelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(20))
    }
}

impl Delay for ThreadDelay {
    fn sleep(&mut self, duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
        cancel.check()?;
        // Past the clock's horizon only cancellation ends the wait.
        let deadline = Instant::now().checked_add(duration);
        loop {
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    self.slice.min(deadline - now)
                }
                None => self.slice,
            };
            std::thread::sleep(pause);
            cancel.check()?;
        }
    }
}
