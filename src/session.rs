//! Session state store.
//!
//! One `SessionStore` is constructed by the application and handed to the
//! screens that need it. It holds at most one active practice mode at a time
//! plus the display name, which is persisted through a [`ConfigStore`] and
//! survives `reset_session`.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::analytics::{compute_stats, MainsOutcome, PrelimsStats};
use crate::clock::Clock;
use crate::config::{ConfigStore, DEFAULT_PRELIMS_MINUTES, DEFAULT_PRELIMS_QUESTIONS};
use crate::error::{ConfigError, Result, SessionError};

pub const MS_PER_MINUTE: u64 = 60_000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
pub enum PrelimsPaper {
    #[strum(serialize = "GS")]
    Gs,
    #[strum(serialize = "CSAT")]
    Csat,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
pub enum MainsType {
    #[value(name = "10m")]
    #[strum(serialize = "10 Marks")]
    TenMark,
    #[value(name = "15m")]
    #[strum(serialize = "15 Marks")]
    FifteenMark,
    #[strum(serialize = "Essay")]
    Essay,
}

impl MainsType {
    /// Short-answer types have a fixed writing time; essays take a custom one.
    pub fn fixed_duration_minutes(&self) -> Option<u32> {
        match self {
            MainsType::TenMark => Some(7),
            MainsType::FifteenMark => Some(12),
            MainsType::Essay => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionMode {
    Prelims,
    Mains,
}

/// Validated arguments for `start_prelims_session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrelimsSetup {
    pub paper: PrelimsPaper,
    pub total_questions: u32,
    pub ideal_time_minutes: u32,
}

impl PrelimsSetup {
    pub fn new(paper: PrelimsPaper, total_questions: u32, ideal_time_minutes: u32) -> Result<Self> {
        if total_questions == 0 {
            return Err(SessionError::InvalidSetup {
                field: "total_questions",
                message: "must be greater than zero".into(),
            });
        }
        if ideal_time_minutes == 0 {
            return Err(SessionError::InvalidSetup {
                field: "ideal_time_minutes",
                message: "must be greater than zero".into(),
            });
        }
        Ok(Self {
            paper,
            total_questions,
            ideal_time_minutes,
        })
    }

    /// Ideal seconds per question, as shown before a session starts.
    pub fn ideal_secs_per_question(&self) -> f64 {
        (self.ideal_time_minutes as f64 * 60.0) / self.total_questions as f64
    }
}

/// Validated arguments for `start_mains_session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainsSetup {
    pub kind: MainsType,
    pub duration_minutes: u32,
}

impl MainsSetup {
    /// `custom_minutes` is only accepted for essays.
    pub fn new(kind: MainsType, custom_minutes: Option<u32>, essay_default: u32) -> Result<Self> {
        let duration_minutes = match (kind.fixed_duration_minutes(), custom_minutes) {
            (Some(_), Some(_)) => {
                return Err(SessionError::InvalidSetup {
                    field: "duration_minutes",
                    message: format!("{kind} questions have a fixed duration"),
                })
            }
            (Some(fixed), None) => fixed,
            (None, custom) => custom.unwrap_or(essay_default),
        };
        if duration_minutes == 0 {
            return Err(SessionError::InvalidSetup {
                field: "duration_minutes",
                message: "must be greater than zero".into(),
            });
        }
        Ok(Self {
            kind,
            duration_minutes,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrelimsSession {
    paper: Option<PrelimsPaper>,
    total_questions: u32,
    ideal_time_minutes: u32,
    lap_times: Vec<u64>,
    current_question: u32,
    start_time: Option<u64>,
}

impl Default for PrelimsSession {
    fn default() -> Self {
        Self {
            paper: None,
            total_questions: DEFAULT_PRELIMS_QUESTIONS,
            ideal_time_minutes: DEFAULT_PRELIMS_MINUTES,
            lap_times: Vec::new(),
            current_question: 1,
            start_time: None,
        }
    }
}

impl PrelimsSession {
    pub fn paper(&self) -> Option<PrelimsPaper> {
        self.paper
    }

    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    pub fn ideal_time_minutes(&self) -> u32 {
        self.ideal_time_minutes
    }

    pub fn duration_ms(&self) -> u64 {
        self.ideal_time_minutes as u64 * MS_PER_MINUTE
    }

    pub fn lap_times(&self) -> &[u64] {
        &self.lap_times
    }

    pub fn last_lap(&self) -> Option<u64> {
        self.lap_times.last().copied()
    }

    pub fn current_question(&self) -> u32 {
        self.current_question
    }

    pub fn questions_answered(&self) -> usize {
        self.lap_times.len()
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn is_active(&self) -> bool {
        self.start_time.is_some()
    }

    /// The question being worked on is the final one.
    pub fn on_last_question(&self) -> bool {
        self.current_question == self.total_questions
    }

    pub fn all_answered(&self) -> bool {
        self.current_question > self.total_questions
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainsSession {
    kind: Option<MainsType>,
    duration_minutes: u32,
    start_time: Option<u64>,
    end_time: Option<u64>,
}

impl MainsSession {
    pub fn kind(&self) -> Option<MainsType> {
        self.kind
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_minutes as u64 * MS_PER_MINUTE
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<u64> {
        self.end_time
    }
}

/// A lap accepted by `record_lap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lap {
    pub question: u32,
    pub time_ms: u64,
    /// This lap answered the final question of the session.
    pub is_last: bool,
}

pub struct SessionStore<C: Clock> {
    clock: C,
    names: Box<dyn ConfigStore>,
    name: Option<String>,
    mode: Option<SessionMode>,
    prelims: PrelimsSession,
    mains: MainsSession,
}

impl<C: Clock> SessionStore<C> {
    pub fn new<S: ConfigStore + 'static>(clock: C, names: S) -> Self {
        Self {
            clock,
            names: Box::new(names),
            name: None,
            mode: None,
            prelims: PrelimsSession::default(),
            mains: MainsSession::default(),
        }
    }

    // ── Name preference ─────────────────────────────────────────────

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn load_name_from_storage(&mut self) {
        if let Some(stored) = self.names.load().name {
            self.name = Some(stored);
        }
    }

    /// Set or clear the display name and persist it. The in-memory value is
    /// updated even when persisting fails. An unreadable stored config is
    /// left untouched.
    pub fn set_name(&mut self, name: Option<String>) -> Result<(), ConfigError> {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.name = name.clone();

        let mut cfg = self.names.try_load()?;
        cfg.name = name;
        self.names.save(&cfg)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Option<SessionMode> {
        self.mode
    }

    pub fn prelims(&self) -> &PrelimsSession {
        &self.prelims
    }

    pub fn mains(&self) -> &MainsSession {
        &self.mains
    }

    /// Summary statistics for the current Prelims lap history.
    pub fn prelims_stats(&self) -> Option<PrelimsStats> {
        if self.mode != Some(SessionMode::Prelims) {
            return None;
        }
        Some(compute_stats(
            &self.prelims.lap_times,
            self.prelims.total_questions,
            self.prelims.ideal_time_minutes,
        ))
    }

    pub fn mains_outcome(&self) -> Option<MainsOutcome> {
        if self.mode != Some(SessionMode::Mains) {
            return None;
        }
        Some(MainsOutcome::evaluate(
            self.mains.duration_minutes,
            self.mains.end_time,
        ))
    }

    // ── Prelims actions ─────────────────────────────────────────────

    pub fn start_prelims_session(&mut self, setup: PrelimsSetup) {
        self.mains = MainsSession::default();
        self.prelims = PrelimsSession {
            paper: Some(setup.paper),
            total_questions: setup.total_questions,
            ideal_time_minutes: setup.ideal_time_minutes,
            lap_times: Vec::new(),
            current_question: 1,
            start_time: Some(self.clock.now_ms()),
        };
        self.mode = Some(SessionMode::Prelims);
        tracing::info!(
            paper = %setup.paper,
            questions = setup.total_questions,
            minutes = setup.ideal_time_minutes,
            "prelims session started"
        );
    }

    /// Record the question just finished. `elapsed_ms` is cumulative since
    /// the session started; the lap is the part not covered by earlier laps.
    pub fn record_lap(&mut self, elapsed_ms: u64) -> Result<Lap> {
        if self.mode != Some(SessionMode::Prelims) || !self.prelims.is_active() {
            return Err(SessionError::NoActiveSession { mode: "prelims" });
        }
        if self.prelims.all_answered() {
            tracing::warn!(
                total = self.prelims.total_questions,
                "lap rejected, every question already answered"
            );
            return Err(SessionError::AllQuestionsAnswered {
                total: self.prelims.total_questions,
            });
        }

        let previous_total: u64 = self.prelims.lap_times.iter().sum();
        let time_ms = elapsed_ms.saturating_sub(previous_total);
        let question = self.prelims.current_question;
        let is_last = self.prelims.on_last_question();

        self.prelims.lap_times.push(time_ms);
        self.prelims.current_question += 1;
        tracing::debug!(question, time_ms, is_last, "lap recorded");

        Ok(Lap {
            question,
            time_ms,
            is_last,
        })
    }

    pub fn end_prelims_session(&mut self) {
        if self.prelims.start_time.take().is_some() {
            tracing::info!(
                answered = self.prelims.lap_times.len(),
                total = self.prelims.total_questions,
                "prelims session ended"
            );
        }
    }

    /// Early exit: the question in progress is lapped first when any remain,
    /// then the session ends.
    pub fn stop_prelims_session(&mut self, elapsed_ms: u64) -> Result<Option<Lap>> {
        let lap = if self.prelims.is_active() && !self.prelims.all_answered() {
            Some(self.record_lap(elapsed_ms)?)
        } else {
            None
        };
        self.end_prelims_session();
        Ok(lap)
    }

    // ── Mains actions ───────────────────────────────────────────────

    pub fn start_mains_session(&mut self, setup: MainsSetup) {
        self.prelims = PrelimsSession::default();
        self.mains = MainsSession {
            kind: Some(setup.kind),
            duration_minutes: setup.duration_minutes,
            start_time: Some(self.clock.now_ms()),
            end_time: None,
        };
        self.mode = Some(SessionMode::Mains);
        tracing::info!(
            kind = %setup.kind,
            minutes = setup.duration_minutes,
            "mains session started"
        );
    }

    /// Record how long the session actually ran, whether it reached the
    /// target or was finished early.
    pub fn end_mains_session(&mut self, actual_elapsed_ms: u64) -> Result<()> {
        if self.mode != Some(SessionMode::Mains) {
            return Err(SessionError::NoActiveSession { mode: "mains" });
        }
        self.mains.end_time = Some(actual_elapsed_ms);
        tracing::info!(
            actual_ms = actual_elapsed_ms,
            target_ms = self.mains.duration_ms(),
            "mains session ended"
        );
        Ok(())
    }

    // ── Reset ───────────────────────────────────────────────────────

    /// Clear everything except the display name.
    pub fn reset_session(&mut self) {
        self.mode = None;
        self.prelims = PrelimsSession::default();
        self.mains = MainsSession::default();
        tracing::debug!("session reset");
    }
}

impl<C: Clock> fmt::Debug for SessionStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("prelims", &self.prelims)
            .field("mains", &self.mains)
            .finish_non_exhaustive()
    }
}
