//! Screen flow and key handling for one practice run.
//!
//! The `App` owns the [`SessionStore`] and the countdown driving the active
//! screen. It never sleeps or spawns threads itself; ticks are scheduled
//! through a [`TickScheduler`] and come back as [`AppEvent::Tick`].

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::clock::Clock;
use crate::phases::{current_phase, elapsed_minutes, phases_for, Phase, PhaseTracker};
use crate::report::SessionReport;
use crate::runtime::{AppEvent, TickScheduler};
use crate::session::{Lap, MainsSetup, PrelimsSetup, SessionStore};
use crate::ticker::TickHandle;
use crate::timer::{Countdown, TickOutcome};

/// What to practise, kept so the same run can be repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Practice {
    Prelims(PrelimsSetup),
    Mains(MainsSetup),
}

impl Practice {
    pub fn duration_ms(&self) -> u64 {
        let minutes = match self {
            Practice::Prelims(setup) => setup.ideal_time_minutes,
            Practice::Mains(setup) => setup.duration_minutes,
        };
        minutes as u64 * crate::session::MS_PER_MINUTE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    PrelimsTimer,
    PrelimsSummary,
    MainsTimer,
    MainsEnd,
}

impl AppState {
    pub fn is_timer(&self) -> bool {
        matches!(self, AppState::PrelimsTimer | AppState::MainsTimer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct App<C: Clock + Clone> {
    store: SessionStore<C>,
    practice: Practice,
    pub state: AppState,
    countdown: Countdown<C>,
    ticks: Option<TickHandle>,
    /// An "end this session?" prompt is showing on a timer screen.
    pub confirm_exit: bool,
    last_lap: Option<Lap>,
    phase_tracker: PhaseTracker,
    bell: bool,
    reports: Vec<SessionReport>,
}

impl<C: Clock + Clone> App<C> {
    pub fn new(store: SessionStore<C>, clock: C, practice: Practice) -> Self {
        let state = match practice {
            Practice::Prelims(_) => AppState::PrelimsTimer,
            Practice::Mains(_) => AppState::MainsTimer,
        };
        Self {
            countdown: Countdown::new(clock.clone(), practice.duration_ms()),
            store,
            practice,
            state,
            ticks: None,
            confirm_exit: false,
            last_lap: None,
            phase_tracker: PhaseTracker::new(),
            bell: false,
            reports: Vec::new(),
        }
    }

    /// Start the session for the configured practice and its countdown.
    pub fn begin<S: TickScheduler>(&mut self, scheduler: &S) {
        match self.practice {
            Practice::Prelims(setup) => {
                self.store.start_prelims_session(setup);
                self.state = AppState::PrelimsTimer;
            }
            Practice::Mains(setup) => {
                self.store.start_mains_session(setup);
                self.state = AppState::MainsTimer;
            }
        }
        self.confirm_exit = false;
        self.last_lap = None;
        self.phase_tracker = PhaseTracker::new();

        // reset rather than rebuild so tokens from the previous run stay stale
        self.ticks = None;
        self.countdown.reset();
        self.ticks = self.countdown.start().map(|token| scheduler.schedule(token));
        self.observe_phase(0);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &SessionStore<C> {
        &self.store
    }

    pub fn countdown(&self) -> &Countdown<C> {
        &self.countdown
    }

    pub fn last_lap(&self) -> Option<Lap> {
        self.last_lap
    }

    /// A tick schedule is live for the current screen.
    pub fn is_ticking(&self) -> bool {
        self.ticks.is_some()
    }

    /// Phases of the running Mains session.
    pub fn phases(&self) -> Option<[Phase; 3]> {
        let mains = self.store.mains();
        mains
            .kind()
            .map(|kind| phases_for(kind, mains.duration_minutes()))
    }

    pub fn current_phase(&self) -> Option<usize> {
        let phases = self.phases()?;
        current_phase(&phases, elapsed_minutes(self.countdown.elapsed_ms()))
    }

    /// Reports of every session finished so far, oldest first.
    pub fn reports(&self) -> &[SessionReport] {
        &self.reports
    }

    /// Returns true once after a phase change so the caller can ring the bell.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    // ── Events ───────────────────────────────────────────────────────

    pub fn handle<S: TickScheduler>(&mut self, event: AppEvent, scheduler: &S) -> Control {
        match event {
            AppEvent::Tick(token) => {
                match self.countdown.tick(token) {
                    TickOutcome::Stale => {}
                    TickOutcome::Running { elapsed_ms } => self.observe_phase(elapsed_ms),
                    TickOutcome::Completed => self.on_time_up(),
                }
                Control::Continue
            }
            AppEvent::Resize => Control::Continue,
            AppEvent::Key(key) => self.on_key(key, scheduler),
        }
    }

    fn on_key<S: TickScheduler>(&mut self, key: KeyEvent, scheduler: &S) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match self.state {
            state if state.is_timer() && self.confirm_exit => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.finish_early(),
                KeyCode::Char('n') | KeyCode::Esc => self.confirm_exit = false,
                _ => {}
            },
            AppState::PrelimsTimer => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => self.lap(),
                KeyCode::Esc | KeyCode::Char('q') => self.confirm_exit = true,
                _ => {}
            },
            AppState::MainsTimer => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.confirm_exit = true,
                _ => {}
            },
            AppState::PrelimsSummary | AppState::MainsEnd => match key.code {
                KeyCode::Char('r') => self.practise_again(scheduler),
                KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
                _ => {}
            },
        }
        Control::Continue
    }

    fn lap(&mut self) {
        let elapsed = self.countdown.current_elapsed_ms();
        match self.store.record_lap(elapsed) {
            Ok(lap) => {
                self.last_lap = Some(lap);
                if lap.is_last {
                    self.store.end_prelims_session();
                    self.show_results(AppState::PrelimsSummary);
                }
            }
            Err(err) => tracing::warn!(%err, "lap ignored"),
        }
    }

    fn on_time_up(&mut self) {
        match self.state {
            AppState::PrelimsTimer => {
                self.store.end_prelims_session();
                self.show_results(AppState::PrelimsSummary);
            }
            AppState::MainsTimer => {
                let target = self.store.mains().duration_ms();
                if let Err(err) = self.store.end_mains_session(target) {
                    tracing::warn!(%err, "could not close mains session");
                }
                self.show_results(AppState::MainsEnd);
            }
            AppState::PrelimsSummary | AppState::MainsEnd => {}
        }
    }

    fn finish_early(&mut self) {
        let elapsed = self.countdown.current_elapsed_ms();
        match self.state {
            AppState::PrelimsTimer => {
                match self.store.stop_prelims_session(elapsed) {
                    Ok(Some(lap)) => self.last_lap = Some(lap),
                    Ok(None) => {}
                    Err(err) => tracing::warn!(%err, "could not stop prelims session"),
                }
                self.show_results(AppState::PrelimsSummary);
            }
            AppState::MainsTimer => {
                if let Err(err) = self.store.end_mains_session(elapsed) {
                    tracing::warn!(%err, "could not close mains session");
                }
                self.show_results(AppState::MainsEnd);
            }
            AppState::PrelimsSummary | AppState::MainsEnd => {}
        }
    }

    /// Leave the timer screen. Dropping the handle cancels the schedule and
    /// resetting the countdown turns ticks already queued stale.
    fn show_results(&mut self, state: AppState) {
        self.ticks = None;
        if !self.countdown.is_complete() {
            let elapsed = self.countdown.current_elapsed_ms();
            self.countdown.reset();
            tracing::debug!(elapsed_ms = elapsed, "countdown stopped early");
        }
        self.confirm_exit = false;
        self.state = state;

        if let Some(report) = SessionReport::from_store(&self.store, Local::now()) {
            self.reports.push(report);
        }
    }

    fn practise_again<S: TickScheduler>(&mut self, scheduler: &S) {
        self.store.reset_session();
        self.begin(scheduler);
    }

    fn observe_phase(&mut self, elapsed_ms: u64) {
        if self.state != AppState::MainsTimer {
            return;
        }
        let Some(phases) = self.phases() else {
            return;
        };
        let current = current_phase(&phases, elapsed_minutes(elapsed_ms));
        if let Some(transition) = self.phase_tracker.observe(current) {
            tracing::info!(
                from = %phases[transition.from].name,
                to = %phases[transition.to].name,
                elapsed_ms,
                "phase changed"
            );
            self.bell = true;
        }
    }
}
