//! CPU/GPU frame pacing
//!
//! The scene writes per-draw uniforms into a bounded ring of GPU-visible
//! buffers. Because the GPU consumes those buffers asynchronously, the
//! CPU must not rotate back onto a slot that is still in flight. The
//! [`FramePacer`] is a counting semaphore enforcing exactly that: one
//! permit is acquired per submitted frame and one is released by that
//! frame's completion callback.
//!
//! With a pool of `3 × drawable_count` the pacer only ever blocks when
//! the CPU runs a full three frames ahead of the GPU — the
//! triple-buffering lookahead. The acquire at the top of
//! [`Scene::render`](crate::scene::Scene::render) is the single blocking
//! point in the core.

use std::sync::{Condvar, Mutex};

use crate::render::{RenderError, RenderResult};

/// Counting semaphore pacing CPU uniform writes against GPU reads
///
/// Shared as `Arc<FramePacer>` between the submission thread (acquire)
/// and the backend's completion-callback thread (release). Releases are
/// capacity-checked: a release beyond the configured capacity reports
/// [`RenderError::PacerOverRelease`] rather than silently inflating the
/// pool and losing backpressure.
pub struct FramePacer {
    state: Mutex<usize>,
    available: Condvar,
    capacity: usize,
}

impl FramePacer {
    /// Create a pacer with `capacity` permits, all initially available
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(capacity),
            available: Condvar::new(),
            capacity,
        }
    }

    /// The configured permit count
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently available (diagnostic; racy by nature)
    pub fn available(&self) -> usize {
        *self.lock()
    }

    /// Block until a permit is available, then take it
    ///
    /// This is the backpressure point: if every pool slot is in flight on
    /// the GPU, the submission thread stalls here until a completion
    /// callback releases a slot. No timeout is enforced — a GPU stall
    /// manifests as this wait blocking indefinitely.
    pub fn acquire(&self) {
        let mut permits = self.lock();
        while *permits == 0 {
            permits = match self.available.wait(permits) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
        *permits -= 1;
    }

    /// Take a permit without blocking; returns false if none are free
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Return a permit, waking one blocked acquirer
    ///
    /// Called from the completion callback of each submitted frame.
    pub fn release(&self) -> RenderResult<()> {
        let mut permits = self.lock();
        if *permits >= self.capacity {
            return Err(RenderError::PacerOverRelease(*permits));
        }
        *permits += 1;
        self.available.notify_one();
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, usize> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
