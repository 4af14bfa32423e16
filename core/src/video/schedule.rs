use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::video::mode::RefreshRate;

/// Shared flag a host loop polls to learn its cadence was torn down.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One armed per-frame schedule.
///
/// A host loop keeps a clone and ticks at `frame_interval()` until the
/// token reports cancellation, then fetches the replacement.
#[derive(Clone, Debug)]
pub struct Cadence {
    refresh: RefreshRate,
    generation: u64,
    token: CancelToken,
}

impl Cadence {
    pub fn refresh(&self) -> RefreshRate {
        self.refresh
    }

    pub fn hz(&self) -> u32 {
        self.refresh.hz()
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.refresh.hz() as u64)
    }

    /// Increases by one with every `arm`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Holds at most one active [`Cadence`]. Changing rate is always a full
/// stop and restart.
#[derive(Debug, Default)]
pub struct FrameSchedule {
    active: Option<Cadence>,
    armed: u64,
}

impl FrameSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the active cadence, if any, and arm a new one.
    pub fn arm(&mut self, refresh: RefreshRate) -> &Cadence {
        self.cancel();
        self.armed += 1;
        debug!(hz = refresh.hz(), generation = self.armed, "frame cadence armed");
        self.active.insert(Cadence {
            refresh,
            generation: self.armed,
            token: CancelToken::new(),
        })
    }

    pub fn cancel(&mut self) {
        if let Some(cadence) = self.active.take() {
            cadence.token.cancel();
        }
    }

    pub fn active(&self) -> Option<&Cadence> {
        self.active.as_ref()
    }

    /// Total number of `arm` calls over the schedule's life.
    pub fn arm_count(&self) -> u64 {
        self.armed
    }
}
