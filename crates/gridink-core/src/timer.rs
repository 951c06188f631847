//! Delayed release for pointers that briefly leave the surface.

use crate::input::{PointerEvent, PointerId};
use kurbo::Point;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// How long a pointer may stay outside the surface before it counts as released.
pub const DEFAULT_RELEASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    pointer_id: PointerId,
    position: Point,
    deadline: Instant,
}

/// Single-slot timer: arming replaces any pending release, cancelling
/// clears it, and polling past the deadline yields one synthetic `Up`.
#[derive(Debug, Clone)]
pub struct ReleaseTimer {
    delay: Duration,
    pending: Option<PendingRelease>,
}

impl Default for ReleaseTimer {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_DELAY)
    }
}

impl ReleaseTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Start (or restart) the countdown for a pointer that left the surface.
    pub fn arm(&mut self, pointer_id: PointerId, position: Point, now: Instant) {
        self.pending = Some(PendingRelease {
            pointer_id,
            position,
            deadline: now + self.delay,
        });
    }

    /// Clear the pending release. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Fire the synthetic release once the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<PointerEvent> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;
        Some(PointerEvent::up(pending.pointer_id, pending.position))
    }
}
