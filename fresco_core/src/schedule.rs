// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update coalescing and deferred-work timers.
//!
//! The [`UpdateScheduler`] is the merge point for update requests: any
//! number of [`require_update`](crate::view::ViewTree::require_update)
//! calls between two ticks collapse into one pending flag set and at most
//! one scheduled tick, so N mutations in one turn produce one re-render,
//! not N.
//!
//! [`DebouncedTimer`] and [`ThrottledGate`] cover the two burst-input
//! shapes a canvas host deals with: resize/orientation events are
//! *debounced* (work runs once the burst goes quiet), scroll-driven work
//! is *throttled* (work runs at most once per interval). Canceling an
//! armed timer before it fires is the only cancellation surface in the
//! system; a cascade in flight always runs to completion.

use crate::flags::ViewFlags;
use crate::time::{Duration, HostTime};

/// A frame opportunity delivered by the backend's tick source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameStamp {
    /// Current host time when the tick was generated.
    pub now: HostTime,
    /// Monotonically increasing frame counter.
    pub frame_index: u64,
}

/// Coalesces update requests into single pending ticks.
///
/// `request` is idempotent per tick: the first call after a
/// [`take_tick`](Self::take_tick) reports that a tick must be scheduled;
/// further requests merge silently into the pending set.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateScheduler {
    pending: ViewFlags,
    scheduled: bool,
}

impl UpdateScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: ViewFlags::empty(),
            scheduled: false,
        }
    }

    /// Merges an update request into the pending set.
    ///
    /// Returns `true` when this request transitions the scheduler from
    /// idle to scheduled — i.e. the caller must arrange a tick. Returns
    /// `false` when a tick is already on its way.
    pub fn request(&mut self, flags: ViewFlags) -> bool {
        self.pending |= flags & ViewFlags::UPDATE_MASK;
        if self.scheduled || self.pending.is_empty() {
            false
        } else {
            self.scheduled = true;
            true
        }
    }

    /// Returns whether a tick is currently scheduled.
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Returns the pending flag set without consuming it.
    #[must_use]
    pub const fn pending(&self) -> ViewFlags {
        self.pending
    }

    /// Consumes the pending flag set at the start of a tick, returning
    /// the scheduler to idle so new requests schedule a fresh tick.
    pub fn take_tick(&mut self) -> ViewFlags {
        self.scheduled = false;
        let taken = self.pending;
        self.pending = ViewFlags::empty();
        taken
    }
}

/// Runs work once a burst of triggers has gone quiet.
///
/// Each [`arm`](Self::arm) pushes the deadline out by the configured
/// delay; [`fire_due`](Self::fire_due) reports (and disarms) once the
/// deadline passes without another arm.
#[derive(Clone, Copy, Debug)]
pub struct DebouncedTimer {
    delay: Duration,
    deadline: Option<HostTime>,
}

impl DebouncedTimer {
    /// Creates a disarmed timer with the given quiet-period delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms (or re-arms) the timer: the deadline becomes `now + delay`.
    pub fn arm(&mut self, now: HostTime) {
        self.deadline = now.checked_add(self.delay);
    }

    /// Disarms the timer before it fires.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns whether a deadline is pending.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the deadline has passed,
    /// disarming the timer.
    pub fn fire_due(&mut self, now: HostTime) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Admits work at most once per interval.
#[derive(Clone, Copy, Debug)]
pub struct ThrottledGate {
    interval: Duration,
    last: Option<HostTime>,
}

impl ThrottledGate {
    /// Creates a gate that admits at most once per `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns whether work may run now, recording the admission.
    pub fn admit(&mut self, now: HostTime) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Forgets the last admission so the next call is admitted.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_schedules_later_requests_merge() {
        let mut sched = UpdateScheduler::new();
        assert!(sched.request(ViewFlags::NEEDS_RENDER));
        assert!(!sched.request(ViewFlags::NEEDS_LAYOUT));
        assert!(!sched.request(ViewFlags::NEEDS_RENDER));
        assert!(sched.is_scheduled());
        assert_eq!(
            sched.pending(),
            ViewFlags::NEEDS_RENDER | ViewFlags::NEEDS_LAYOUT
        );
    }

    #[test]
    fn take_tick_resets_for_the_next_turn() {
        let mut sched = UpdateScheduler::new();
        let _ = sched.request(ViewFlags::NEEDS_ANIMATE);
        let taken = sched.take_tick();
        assert_eq!(taken, ViewFlags::NEEDS_ANIMATE);
        assert!(!sched.is_scheduled());
        assert_eq!(sched.pending(), ViewFlags::empty());

        // A fresh request schedules again.
        assert!(sched.request(ViewFlags::NEEDS_RENDER));
    }

    #[test]
    fn structural_bits_do_not_schedule() {
        let mut sched = UpdateScheduler::new();
        assert!(!sched.request(ViewFlags::CULLED | ViewFlags::MOUNTED));
        assert!(!sched.is_scheduled());
    }

    #[test]
    fn debounce_waits_for_quiet() {
        let mut timer = DebouncedTimer::new(Duration(100));
        timer.arm(HostTime(1000));
        assert!(!timer.fire_due(HostTime(1050)));

        // Burst continues; deadline pushes out.
        timer.arm(HostTime(1050));
        assert!(!timer.fire_due(HostTime(1100)));
        assert!(timer.fire_due(HostTime(1150)));

        // Fired once; stays quiet until re-armed.
        assert!(!timer.fire_due(HostTime(2000)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn debounce_cancel_prevents_firing() {
        let mut timer = DebouncedTimer::new(Duration(100));
        timer.arm(HostTime(1000));
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.fire_due(HostTime(5000)));
    }

    #[test]
    fn throttle_admits_once_per_interval() {
        let mut gate = ThrottledGate::new(Duration(16));
        assert!(gate.admit(HostTime(0)));
        assert!(!gate.admit(HostTime(10)));
        assert!(gate.admit(HostTime(16)));
        assert!(!gate.admit(HostTime(31)));

        gate.reset();
        assert!(gate.admit(HostTime(32)));
    }
}
