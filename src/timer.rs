//! Countdown and stopwatch state machines.
//!
//! Neither timer owns a thread. The caller schedules ticks (see
//! [`crate::ticker::TickHandle`]) with the token returned by `start()` and
//! feeds each tick back through `tick()`. Ticks carrying a token from an
//! earlier run are ignored, so a schedule that outlives a reset can never
//! mutate the timer.
//!
//! ```text
//! Idle -> Running -> Complete
//!   ^        |          |
//!   +--------+----------+   reset()
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::ticker::TickToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Complete,
}

/// Display urgency derived from how much of the countdown is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
    Default,
    Warning,
    Danger,
}

impl Urgency {
    pub fn for_remaining(remaining_ms: u64, duration_ms: u64) -> Self {
        if duration_ms == 0 {
            return Urgency::Danger;
        }
        let percent_remaining = remaining_ms as f64 / duration_ms as f64 * 100.0;
        if percent_remaining <= 10.0 {
            Urgency::Danger
        } else if percent_remaining <= 25.0 {
            Urgency::Warning
        } else {
            Urgency::Default
        }
    }
}

/// Result of feeding one tick to a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belonged to a cancelled or finished run and was dropped.
    Stale,
    Running { elapsed_ms: u64 },
    /// Emitted exactly once per run, on the tick that reached the duration.
    Completed,
}

type CompletionCallback = Box<dyn FnMut() + Send>;
type TickCallback = Box<dyn FnMut(u64) + Send>;

/// Countdown towards a fixed duration.
pub struct Countdown<C: Clock> {
    clock: C,
    duration_ms: u64,
    elapsed_ms: u64,
    /// Clock reading that corresponds to elapsed == 0 for the current run.
    origin_ms: Option<u64>,
    state: TimerState,
    generation: u64,
    on_complete: Option<CompletionCallback>,
}

impl<C: Clock> Countdown<C> {
    pub fn new(clock: C, duration_ms: u64) -> Self {
        Self {
            clock,
            duration_ms,
            elapsed_ms: 0,
            origin_ms: None,
            state: TimerState::Idle,
            generation: 0,
            on_complete: None,
        }
    }

    pub fn with_on_complete<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.set_on_complete(f);
        self
    }

    /// Replace the completion callback. The callback in place when the
    /// completing tick arrives is the one that runs.
    pub fn set_on_complete<F>(&mut self, f: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.on_complete = Some(Box::new(f));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state == TimerState::Complete
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Elapsed sampled from the clock now rather than at the last tick,
    /// capped at the duration.
    pub fn current_elapsed_ms(&self) -> u64 {
        match self.origin_ms {
            Some(origin) => self
                .clock
                .now_ms()
                .saturating_sub(origin)
                .min(self.duration_ms),
            None => self.elapsed_ms,
        }
    }

    pub fn remaining_ms(&self) -> u64 {
        self.duration_ms.saturating_sub(self.elapsed_ms)
    }

    pub fn urgency(&self) -> Urgency {
        Urgency::for_remaining(self.remaining_ms(), self.duration_ms)
    }

    /// 0.0 .. 1.0 share of the duration already used.
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms as f64 / self.duration_ms as f64).min(1.0)
    }

    /// Token of the live run, if any.
    pub fn token(&self) -> Option<TickToken> {
        self.is_running().then(|| TickToken::new(self.generation))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin or resume from the current elapsed value. Returns the token
    /// ticks must carry, or `None` when already running or complete.
    pub fn start(&mut self) -> Option<TickToken> {
        if self.state != TimerState::Idle {
            return None;
        }
        let now = self.clock.now_ms();
        self.origin_ms = Some(now.saturating_sub(self.elapsed_ms));
        self.state = TimerState::Running;
        tracing::debug!(
            duration_ms = self.duration_ms,
            generation = self.generation,
            "countdown started"
        );
        Some(TickToken::new(self.generation))
    }

    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if self.state != TimerState::Running || token.generation() != self.generation {
            return TickOutcome::Stale;
        }
        let Some(origin) = self.origin_ms else {
            return TickOutcome::Stale;
        };

        let elapsed = self.clock.now_ms().saturating_sub(origin);
        if elapsed >= self.duration_ms {
            self.elapsed_ms = self.duration_ms;
            self.state = TimerState::Complete;
            self.origin_ms = None;
            self.generation += 1;
            tracing::debug!(duration_ms = self.duration_ms, "countdown complete");
            if let Some(on_complete) = self.on_complete.as_mut() {
                on_complete();
            }
            return TickOutcome::Completed;
        }

        self.elapsed_ms = elapsed;
        TickOutcome::Running {
            elapsed_ms: elapsed,
        }
    }

    /// Cancel the current run and return to a zeroed idle state.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.origin_ms = None;
        self.elapsed_ms = 0;
        self.state = TimerState::Idle;
    }
}

impl<C: Clock> fmt::Debug for Countdown<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("duration_ms", &self.duration_ms)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Uncapped timer that counts up until stopped.
pub struct Stopwatch<C: Clock> {
    clock: C,
    elapsed_ms: u64,
    origin_ms: Option<u64>,
    generation: u64,
    on_tick: Option<TickCallback>,
}

impl<C: Clock> Stopwatch<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            elapsed_ms: 0,
            origin_ms: None,
            generation: 0,
            on_tick: None,
        }
    }

    pub fn set_on_tick<F>(&mut self, f: F)
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.on_tick = Some(Box::new(f));
    }

    pub fn is_running(&self) -> bool {
        self.origin_ms.is_some()
    }

    /// Elapsed value as of the last tick or stop.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Elapsed value sampled from the clock right now.
    pub fn current_elapsed_ms(&self) -> u64 {
        match self.origin_ms {
            Some(origin) => self.clock.now_ms().saturating_sub(origin),
            None => self.elapsed_ms,
        }
    }

    pub fn start(&mut self) -> Option<TickToken> {
        if self.is_running() {
            return None;
        }
        let now = self.clock.now_ms();
        self.origin_ms = Some(now.saturating_sub(self.elapsed_ms));
        Some(TickToken::new(self.generation))
    }

    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if token.generation() != self.generation {
            return TickOutcome::Stale;
        }
        let Some(origin) = self.origin_ms else {
            return TickOutcome::Stale;
        };

        self.elapsed_ms = self.clock.now_ms().saturating_sub(origin);
        if let Some(on_tick) = self.on_tick.as_mut() {
            on_tick(self.elapsed_ms);
        }
        TickOutcome::Running {
            elapsed_ms: self.elapsed_ms,
        }
    }

    /// Stop counting, keeping the elapsed value. Pending ticks go stale.
    pub fn stop(&mut self) {
        if let Some(origin) = self.origin_ms.take() {
            self.elapsed_ms = self.clock.now_ms().saturating_sub(origin);
            self.generation += 1;
        }
    }

    pub fn reset(&mut self) {
        self.stop();
        self.elapsed_ms = 0;
    }
}

impl<C: Clock> fmt::Debug for Stopwatch<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("elapsed_ms", &self.elapsed_ms)
            .field("running", &self.is_running())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn countdown(duration_ms: u64) -> (ManualClock, Countdown<ManualClock>) {
        let clock = ManualClock::new();
        (clock.clone(), Countdown::new(clock, duration_ms))
    }

    #[test]
    fn starts_idle_with_full_remaining() {
        let (_clock, timer) = countdown(10_000);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.elapsed_ms(), 0);
        assert_eq!(timer.remaining_ms(), 10_000);
        assert_eq!(timer.token(), None);
    }

    #[test]
    fn tick_tracks_clock() {
        let (clock, mut timer) = countdown(10_000);
        let token = timer.start().unwrap();

        clock.advance(1_234);
        assert_eq!(timer.tick(token), TickOutcome::Running { elapsed_ms: 1_234 });
        assert_eq!(timer.remaining_ms(), 8_766);
        assert!(timer.is_running());
    }

    #[test]
    fn current_elapsed_samples_between_ticks() {
        let (clock, mut timer) = countdown(1_000);
        assert_eq!(timer.current_elapsed_ms(), 0);
        let token = timer.start().unwrap();
        clock.advance(300);
        timer.tick(token);
        clock.advance(50);
        assert_eq!(timer.elapsed_ms(), 300);
        assert_eq!(timer.current_elapsed_ms(), 350);
        clock.advance(10_000);
        assert_eq!(timer.current_elapsed_ms(), 1_000);
    }

    #[test]
    fn completion_fires_exactly_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let (clock, timer) = countdown(1_000);
        let mut timer = timer.with_on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let token = timer.start().unwrap();

        clock.advance(5_000);
        assert_eq!(timer.tick(token), TickOutcome::Completed);
        for _ in 0..10 {
            clock.advance(16);
            assert_eq!(timer.tick(token), TickOutcome::Stale);
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(timer.is_complete());
        assert_eq!(timer.elapsed_ms(), 1_000);
        assert_eq!(timer.remaining_ms(), 0);
    }

    #[test]
    fn completes_when_exactly_at_duration() {
        let (clock, mut timer) = countdown(500);
        let token = timer.start().unwrap();
        clock.advance(500);
        assert_eq!(timer.tick(token), TickOutcome::Completed);
    }

    #[test]
    fn latest_callback_is_used() {
        let which = Arc::new(AtomicUsize::new(0));
        let (clock, mut timer) = countdown(100);
        let first = Arc::clone(&which);
        timer.set_on_complete(move || first.store(1, Ordering::SeqCst));
        let second = Arc::clone(&which);
        timer.set_on_complete(move || second.store(2, Ordering::SeqCst));

        let token = timer.start().unwrap();
        clock.advance(100);
        timer.tick(token);
        assert_eq!(which.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn start_is_noop_while_running_or_complete() {
        let (clock, mut timer) = countdown(100);
        assert!(timer.start().is_some());
        assert!(timer.start().is_none());

        let token = timer.token().unwrap();
        clock.advance(200);
        timer.tick(token);
        assert!(timer.start().is_none());
        assert!(timer.is_complete());
    }

    #[test]
    fn reset_twice_is_idempotent() {
        let (clock, mut timer) = countdown(1_000);
        let token = timer.start().unwrap();
        clock.advance(300);
        timer.tick(token);

        timer.reset();
        let first = (timer.state(), timer.elapsed_ms(), timer.remaining_ms());
        timer.reset();
        let second = (timer.state(), timer.elapsed_ms(), timer.remaining_ms());

        assert_eq!(first, (TimerState::Idle, 0, 1_000));
        assert_eq!(first, second);
    }

    #[test]
    fn ticks_from_before_reset_are_stale() {
        let (clock, mut timer) = countdown(1_000);
        let old = timer.start().unwrap();
        timer.reset();
        let new = timer.start().unwrap();
        assert_ne!(old, new);

        clock.advance(400);
        assert_eq!(timer.tick(old), TickOutcome::Stale);
        assert_matches!(timer.tick(new), TickOutcome::Running { elapsed_ms: 400 });
    }

    #[test]
    fn restart_after_reset_counts_from_zero() {
        let (clock, mut timer) = countdown(1_000);
        let token = timer.start().unwrap();
        clock.advance(700);
        timer.tick(token);
        timer.reset();

        let token = timer.start().unwrap();
        clock.advance(100);
        assert_eq!(timer.tick(token), TickOutcome::Running { elapsed_ms: 100 });
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::for_remaining(1_000, 1_000), Urgency::Default);
        assert_eq!(Urgency::for_remaining(251, 1_000), Urgency::Default);
        assert_eq!(Urgency::for_remaining(250, 1_000), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(101, 1_000), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(100, 1_000), Urgency::Danger);
        assert_eq!(Urgency::for_remaining(0, 1_000), Urgency::Danger);
    }

    #[test]
    fn countdown_urgency_follows_remaining() {
        let (clock, mut timer) = countdown(10_000);
        let token = timer.start().unwrap();
        assert_eq!(timer.urgency(), Urgency::Default);

        clock.advance(8_000);
        timer.tick(token);
        assert_eq!(timer.urgency(), Urgency::Warning);

        clock.advance(1_500);
        timer.tick(token);
        assert_eq!(timer.urgency(), Urgency::Danger);
    }

    #[test]
    fn stopwatch_counts_until_stopped() {
        let clock = ManualClock::new();
        let mut watch = Stopwatch::new(clock.clone());
        let token = watch.start().unwrap();

        clock.advance(3_600_000);
        assert_eq!(
            watch.tick(token),
            TickOutcome::Running {
                elapsed_ms: 3_600_000
            }
        );

        clock.advance(500);
        watch.stop();
        assert_eq!(watch.elapsed_ms(), 3_600_500);
        assert!(!watch.is_running());

        clock.advance(10_000);
        assert_eq!(watch.tick(token), TickOutcome::Stale);
        assert_eq!(watch.current_elapsed_ms(), 3_600_500);
    }

    #[test]
    fn stopwatch_resumes_and_reports_ticks() {
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let clock = ManualClock::new();
        let mut watch = Stopwatch::new(clock.clone());
        watch.set_on_tick(move |ms| sink.store(ms as usize, Ordering::SeqCst));

        watch.start();
        clock.advance(200);
        watch.stop();

        clock.advance(1_000);
        let token = watch.start().unwrap();
        clock.advance(300);
        assert_eq!(watch.current_elapsed_ms(), 500);
        watch.tick(token);
        assert_eq!(seen.load(Ordering::SeqCst), 500);

        watch.reset();
        assert_eq!(watch.elapsed_ms(), 0);
        assert!(!watch.is_running());
    }
}
