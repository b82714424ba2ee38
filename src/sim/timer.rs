//! Cooperative countdown scheduler
//!
//! Every timed phase (guess timer, result dwell, pre-round countdown) runs
//! through one `TimerController`. The host advances a logical millisecond
//! clock; due firings are then handed out one at a time by [`TimerController::poll`].
//! Because nothing is queued ahead of time, cancelling a timer while
//! handling an earlier firing removes every later firing of that timer.
//!
//! Each countdown ticks once per second and reports the new remaining
//! value. After the tick that reaches 0 the timer completes and is removed.

use std::time::Duration;

const TICK_MS: u64 = 1000;

/// Opaque reference to a scheduled countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// A firing handed to the owner of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFired<T> {
    /// One second elapsed, `remaining` seconds left
    Tick {
        handle: TimerHandle,
        tag: T,
        remaining: u32,
    },
    /// The countdown reached zero
    Complete { handle: TimerHandle, tag: T },
}

impl<T: Copy> TimerFired<T> {
    pub fn handle(&self) -> TimerHandle {
        match *self {
            TimerFired::Tick { handle, .. } | TimerFired::Complete { handle, .. } => handle,
        }
    }

    pub fn tag(&self) -> T {
        match *self {
            TimerFired::Tick { tag, .. } | TimerFired::Complete { tag, .. } => tag,
        }
    }
}

/// What's left of a paused countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PausedTimer<T> {
    pub tag: T,
    /// Whole seconds shown when paused
    pub remaining_secs: u32,
    /// Time until the next firing, already shortened by the elapsed part
    /// of the current second
    next_firing_ms: u64,
    completing: bool,
}

#[derive(Debug, Clone)]
struct Countdown<T> {
    handle: TimerHandle,
    tag: T,
    remaining: u32,
    /// Logical time of the next firing
    due_ms: u64,
    /// The zero tick has been delivered, completion is next
    completing: bool,
}

/// Single-threaded countdown scheduler
#[derive(Debug, Clone)]
pub struct TimerController<T> {
    /// Logical time of the firing currently being handled
    now_ms: u64,
    /// How far the host has advanced the clock
    horizon_ms: u64,
    next_id: u64,
    timers: Vec<Countdown<T>>,
}

impl<T> Default for TimerController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerController<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            horizon_ms: 0,
            next_id: 1,
            timers: Vec::new(),
        }
    }

    /// Current logical time
    pub fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms)
    }

    /// Start a countdown of `duration_secs` seconds.
    ///
    /// A zero duration completes on the next poll without ticking.
    pub fn schedule(&mut self, duration_secs: u32, tag: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;

        let zero = duration_secs == 0;
        self.timers.push(Countdown {
            handle,
            tag,
            remaining: duration_secs,
            due_ms: if zero { self.now_ms } else { self.now_ms + TICK_MS },
            completing: zero,
        });
        log::debug!("Timer {:?} scheduled for {}s", handle, duration_secs);
        handle
    }

    /// Stop a countdown. Nothing from it fires afterwards.
    ///
    /// Returns false if the handle was already finished or cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        before != self.timers.len()
    }

    /// Freeze a countdown.
    ///
    /// The time already spent in the current second is kept: a timer
    /// showing 37 resumes at 37 and reaches 36 after the rest of that
    /// second, not a full second later.
    pub fn pause(&mut self, handle: TimerHandle) -> Option<PausedTimer<T>> {
        let index = self.timers.iter().position(|t| t.handle == handle)?;
        let timer = self.timers.remove(index);
        let next_firing_ms = timer.due_ms.saturating_sub(self.now_ms);
        log::debug!(
            "Timer {:?} paused with {}s left, next firing in {}ms",
            handle,
            timer.remaining,
            next_firing_ms
        );
        Some(PausedTimer {
            tag: timer.tag,
            remaining_secs: timer.remaining,
            next_firing_ms,
            completing: timer.completing,
        })
    }

    /// Restart a paused countdown from exactly where it stopped
    pub fn resume(&mut self, paused: PausedTimer<T>) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(Countdown {
            handle,
            tag: paused.tag,
            remaining: paused.remaining_secs,
            due_ms: self.now_ms + paused.next_firing_ms,
            completing: paused.completing,
        });
        log::debug!(
            "Timer {:?} resumed with {}s left",
            handle,
            paused.remaining_secs
        );
        handle
    }

    /// Seconds left on a live countdown
    pub fn remaining(&self, handle: TimerHandle) -> Option<u32> {
        self.timers
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.remaining)
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    /// Number of live countdowns
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Move the host clock forward. Call [`poll`](Self::poll) until it
    /// returns `None` to deliver everything that became due.
    pub fn advance(&mut self, dt: Duration) {
        let dt_ms = u64::try_from(dt.as_millis()).unwrap_or(u64::MAX);
        self.horizon_ms = self.horizon_ms.saturating_add(dt_ms);
    }

    /// Deliver the earliest due firing, if any.
    ///
    /// Ties go to the timer scheduled first. The logical clock jumps to the
    /// firing's due time so anything scheduled while handling it starts from
    /// there rather than from the end of the advanced window.
    pub fn poll(&mut self) -> Option<TimerFired<T>>
    where
        T: Copy,
    {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= self.horizon_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.handle.0))
            .map(|(i, _)| i);

        let Some(index) = index else {
            self.now_ms = self.horizon_ms;
            return None;
        };

        let timer = &mut self.timers[index];
        self.now_ms = self.now_ms.max(timer.due_ms);
        let handle = timer.handle;
        let tag = timer.tag;

        if timer.completing {
            self.timers.remove(index);
            return Some(TimerFired::Complete { handle, tag });
        }

        timer.remaining -= 1;
        let remaining = timer.remaining;
        if remaining == 0 {
            timer.completing = true;
        } else {
            timer.due_ms += TICK_MS;
        }
        Some(TimerFired::Tick {
            handle,
            tag,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(timers: &mut TimerController<u8>) -> Vec<TimerFired<u8>> {
        let mut fired = Vec::new();
        while let Some(f) = timers.poll() {
            fired.push(f);
        }
        fired
    }

    fn ticks(fired: &[TimerFired<u8>]) -> Vec<u32> {
        fired
            .iter()
            .filter_map(|f| match f {
                TimerFired::Tick { remaining, .. } => Some(*remaining),
                TimerFired::Complete { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_ticks_once_per_second_then_completes() {
        let mut timers = TimerController::new();
        let h = timers.schedule(3, 7u8);

        timers.advance(Duration::from_millis(999));
        assert!(drain(&mut timers).is_empty());

        timers.advance(Duration::from_millis(1));
        assert_eq!(
            drain(&mut timers),
            vec![TimerFired::Tick {
                handle: h,
                tag: 7,
                remaining: 2
            }]
        );

        timers.advance(Duration::from_secs(2));
        let fired = drain(&mut timers);
        assert_eq!(ticks(&fired), vec![1, 0]);
        assert_eq!(fired.last(), Some(&TimerFired::Complete { handle: h, tag: 7 }));
        assert!(!timers.is_active(h));
    }

    #[test]
    fn test_large_advance_delivers_every_tick_in_order() {
        let mut timers = TimerController::new();
        timers.schedule(5, 1u8);
        timers.advance(Duration::from_secs(60));
        let fired = drain(&mut timers);
        assert_eq!(ticks(&fired), vec![4, 3, 2, 1, 0]);
        assert!(matches!(fired.last(), Some(TimerFired::Complete { .. })));
        assert_eq!(timers.now(), Duration::from_secs(60));
    }

    #[test]
    fn test_cancel_drops_already_due_firings() {
        let mut timers = TimerController::new();
        let h = timers.schedule(10, 0u8);
        timers.advance(Duration::from_secs(5));

        // Handle one firing, then cancel as a callback would
        assert!(timers.poll().is_some());
        assert!(timers.cancel(h));
        assert!(timers.poll().is_none());
        assert!(!timers.cancel(h));
    }

    #[test]
    fn test_cancel_between_zero_tick_and_completion() {
        let mut timers = TimerController::new();
        let h = timers.schedule(1, 0u8);
        timers.advance(Duration::from_secs(1));
        assert!(matches!(
            timers.poll(),
            Some(TimerFired::Tick { remaining: 0, .. })
        ));
        timers.cancel(h);
        assert!(timers.poll().is_none());
    }

    #[test]
    fn test_pause_resume_keeps_remaining_seconds() {
        let mut timers = TimerController::new();
        let h = timers.schedule(60, 0u8);
        timers.advance(Duration::from_millis(23_400));
        let fired = drain(&mut timers);
        assert_eq!(ticks(&fired).last(), Some(&37));

        let paused = timers.pause(h).unwrap();
        assert_eq!(paused.remaining_secs, 37);
        assert!(!timers.is_active(h));

        // Paused for a long while: nothing fires
        timers.advance(Duration::from_secs(600));
        assert!(drain(&mut timers).is_empty());

        let h2 = timers.resume(paused);
        assert_ne!(h, h2);
        assert_eq!(timers.remaining(h2), Some(37));
        timers.advance(Duration::from_secs(1));
        assert_eq!(ticks(&drain(&mut timers)), vec![36]);
    }

    #[test]
    fn test_pause_keeps_elapsed_part_of_second() {
        let mut timers = TimerController::new();
        let mut h = timers.schedule(10, 0u8);

        // Pausing every 0.9s must not hold the timer at 10
        for _ in 0..10 {
            timers.advance(Duration::from_millis(900));
            drain(&mut timers);
            let paused = timers.pause(h).unwrap();
            timers.advance(Duration::from_secs(5));
            assert!(drain(&mut timers).is_empty());
            h = timers.resume(paused);
        }
        // 9s of running time
        assert_eq!(timers.remaining(h), Some(1));

        timers.advance(Duration::from_secs(1));
        let fired = drain(&mut timers);
        assert_eq!(ticks(&fired), vec![0]);
        assert!(matches!(fired.last(), Some(TimerFired::Complete { .. })));
    }

    #[test]
    fn test_pause_between_zero_tick_and_completion() {
        let mut timers = TimerController::new();
        let h = timers.schedule(1, 4u8);
        timers.advance(Duration::from_secs(1));
        assert!(matches!(
            timers.poll(),
            Some(TimerFired::Tick { remaining: 0, .. })
        ));

        let paused = timers.pause(h).unwrap();
        assert_eq!(paused.remaining_secs, 0);
        let h = timers.resume(paused);
        assert_eq!(timers.poll(), Some(TimerFired::Complete { handle: h, tag: 4 }));
    }

    #[test]
    fn test_zero_duration_completes_without_tick() {
        let mut timers = TimerController::new();
        let h = timers.schedule(0, 3u8);
        assert_eq!(timers.poll(), Some(TimerFired::Complete { handle: h, tag: 3 }));
        assert!(timers.poll().is_none());
    }

    #[test]
    fn test_timer_scheduled_during_firing_starts_at_firing_time() {
        let mut timers = TimerController::new();
        timers.schedule(1, 1u8);
        timers.advance(Duration::from_millis(2500));

        let mut second = None;
        while let Some(f) = timers.poll() {
            if let TimerFired::Complete { tag: 1, .. } = f {
                // Completed at t=1s, so a 1s timer is due at t=2s
                second = Some(timers.schedule(1, 2u8));
            }
        }
        let second = second.unwrap();
        // t=2s already passed inside the window, so it ticked and completed
        assert!(!timers.is_active(second));
        assert_eq!(timers.now(), Duration::from_millis(2500));
    }

    #[test]
    fn test_simultaneous_timers_fire_in_schedule_order() {
        let mut timers = TimerController::new();
        let a = timers.schedule(2, 1u8);
        let b = timers.schedule(2, 2u8);
        timers.advance(Duration::from_secs(1));
        assert_eq!(timers.poll().map(|f| f.handle()), Some(a));
        assert_eq!(timers.poll().map(|f| f.handle()), Some(b));
        assert_eq!(timers.active_count(), 2);
    }
}
