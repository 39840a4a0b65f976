//! Pacing analytics for finished sessions.
//!
//! Everything here is a pure function of its inputs.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::session::MS_PER_MINUTE;
use crate::util::mean;

/// Upper bound (inclusive) of `time / ideal` for a question to count as good.
pub const GOOD_RATIO: f64 = 1.0;
/// Upper bound (inclusive) for warning; anything above is danger.
pub const WARNING_RATIO: f64 = 1.5;

pub const DEFAULT_HEATMAP_COLUMNS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionStatus {
    Good,
    Warning,
    Danger,
}

impl QuestionStatus {
    pub fn classify(time_ms: u64, ideal_time_ms: f64) -> Self {
        let ratio = time_ms as f64 / ideal_time_ms;
        if ratio <= GOOD_RATIO {
            QuestionStatus::Good
        } else if ratio <= WARNING_RATIO {
            QuestionStatus::Warning
        } else {
            QuestionStatus::Danger
        }
    }

    pub fn legend(&self) -> &'static str {
        match self {
            QuestionStatus::Good => "Within ideal",
            QuestionStatus::Warning => "Slightly over",
            QuestionStatus::Danger => "Over time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionStat {
    pub question_number: u32,
    pub time_ms: u64,
    pub status: QuestionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Insight {
    ExcellentPace,
    TooManyOverruns,
    TightBuffer,
    GoodConsistency,
    HighAverage,
    KeepRefining,
}

impl Insight {
    pub fn message(&self) -> &'static str {
        match self {
            Insight::ExcellentPace => {
                "Excellent pace. You have ample time for revision and OMR marking."
            }
            Insight::TooManyOverruns => {
                "Too many questions took longer than ideal. Focus on time management for difficult questions."
            }
            Insight::TightBuffer => {
                "Tight on OMR buffer. Practice faster decision-making on uncertain questions."
            }
            Insight::GoodConsistency => "Good consistency. Maintain this pace in the actual exam.",
            Insight::HighAverage => {
                "Average time per question is high. Consider skipping difficult questions faster."
            }
            Insight::KeepRefining => {
                "Decent practice session. Keep refining your time allocation strategy."
            }
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrelimsStats {
    pub total_questions: u32,
    pub questions_answered: usize,
    pub avg_time_ms: f64,
    pub total_time_spent_ms: u64,
    /// Planned time left over after the answered questions. Negative on overrun.
    pub omr_buffer_ms: i64,
    pub ideal_time_per_question_ms: f64,
    pub question_stats: Vec<QuestionStat>,
    pub good_count: usize,
    pub warning_count: usize,
    pub danger_count: usize,
    pub insight: Insight,
}

impl PrelimsStats {
    /// Question cells grouped into heatmap rows of `columns` cells.
    pub fn heatmap_rows(&self, columns: usize) -> impl Iterator<Item = &[QuestionStat]> {
        self.question_stats.chunks(columns.max(1))
    }

    pub fn avg_ratio(&self) -> f64 {
        self.avg_time_ms / self.ideal_time_per_question_ms
    }
}

/// Summarise Prelims laps against the planned pace.
///
/// `total_questions` and `ideal_time_minutes` must be non-zero; setup
/// validation guarantees this before a session can start.
pub fn compute_stats(lap_times: &[u64], total_questions: u32, ideal_time_minutes: u32) -> PrelimsStats {
    debug_assert!(total_questions > 0 && ideal_time_minutes > 0);

    let ideal_time_total_ms = ideal_time_minutes as u64 * MS_PER_MINUTE;
    let ideal_time_per_question_ms = ideal_time_total_ms as f64 / total_questions as f64;

    let total_time_spent_ms: u64 = lap_times.iter().sum();
    let avg_time_ms = mean(lap_times).unwrap_or(0.0);
    let omr_buffer_ms = ideal_time_total_ms as i64 - total_time_spent_ms as i64;

    let question_stats: Vec<QuestionStat> = lap_times
        .iter()
        .enumerate()
        .map(|(index, &time_ms)| QuestionStat {
            question_number: index as u32 + 1,
            time_ms,
            status: QuestionStatus::classify(time_ms, ideal_time_per_question_ms),
        })
        .collect();

    let counts: HashMap<QuestionStatus, usize> =
        question_stats.iter().map(|q| q.status).counts();
    let count = |status: QuestionStatus| counts.get(&status).copied().unwrap_or(0);
    let good_count = count(QuestionStatus::Good);
    let warning_count = count(QuestionStatus::Warning);
    let danger_count = count(QuestionStatus::Danger);

    let insight = select_insight(
        avg_time_ms / ideal_time_per_question_ms,
        omr_buffer_ms,
        good_count,
        danger_count,
        question_stats.len(),
    );

    PrelimsStats {
        total_questions,
        questions_answered: lap_times.len(),
        avg_time_ms,
        total_time_spent_ms,
        omr_buffer_ms,
        ideal_time_per_question_ms,
        question_stats,
        good_count,
        warning_count,
        danger_count,
        insight,
    }
}

// First matching rule wins.
fn select_insight(
    avg_ratio: f64,
    omr_buffer_ms: i64,
    good_count: usize,
    danger_count: usize,
    answered: usize,
) -> Insight {
    let minutes = |m: i64| m * MS_PER_MINUTE as i64;
    let answered = answered as f64;

    if avg_ratio <= 0.8 && omr_buffer_ms > minutes(10) {
        Insight::ExcellentPace
    } else if danger_count as f64 > answered * 0.3 {
        Insight::TooManyOverruns
    } else if omr_buffer_ms < minutes(5) {
        Insight::TightBuffer
    } else if good_count as f64 > answered * 0.7 {
        Insight::GoodConsistency
    } else if avg_ratio > 1.2 {
        Insight::HighAverage
    } else {
        Insight::KeepRefining
    }
}

/// Mains ending relative to the target duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MainsVerdict {
    /// Within a second of the target either way.
    OnTime,
    Overrun,
    FinishedEarly,
}

impl MainsVerdict {
    pub fn title(&self) -> &'static str {
        match self {
            MainsVerdict::OnTime => "Perfect Timing!",
            MainsVerdict::Overrun => "Time Overrun",
            MainsVerdict::FinishedEarly => "Finished Early",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            MainsVerdict::OnTime => "You finished right on time. Excellent discipline.",
            MainsVerdict::Overrun => "Practice structuring your answer to stay within time.",
            MainsVerdict::FinishedEarly => "Great pace! Use extra time to review or add depth.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MainsOutcome {
    pub target_ms: u64,
    pub actual_ms: u64,
    /// `actual - target`; positive means overrun.
    pub difference_ms: i64,
    pub verdict: MainsVerdict,
}

impl MainsOutcome {
    /// A session without a recorded end counts as having run the full target.
    pub fn evaluate(duration_minutes: u32, end_time_ms: Option<u64>) -> Self {
        let target_ms = duration_minutes as u64 * MS_PER_MINUTE;
        let actual_ms = end_time_ms.unwrap_or(target_ms);
        let difference_ms = actual_ms as i64 - target_ms as i64;

        let verdict = if difference_ms.abs() < 1_000 {
            MainsVerdict::OnTime
        } else if difference_ms > 0 {
            MainsVerdict::Overrun
        } else {
            MainsVerdict::FinishedEarly
        };

        Self {
            target_ms,
            actual_ms,
            difference_ms,
            verdict,
        }
    }
}
