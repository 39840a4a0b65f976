//! Outline / Write / Conclude milestones for Mains answer writing.

use crate::session::{MainsType, MS_PER_MINUTE};

const ESSAY_OUTLINE_SHARE: f64 = 0.15;
const ESSAY_WRITE_END_SHARE: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PhaseName {
    Outline,
    Write,
    Conclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub name: PhaseName,
    pub start_min: u32,
    pub end_min: u32,
}

impl Phase {
    const fn new(name: PhaseName, start_min: u32, end_min: u32) -> Self {
        Self {
            name,
            start_min,
            end_min,
        }
    }

    /// Half-open `[start, end)` membership.
    pub fn contains(&self, elapsed_minutes: f64) -> bool {
        elapsed_minutes >= self.start_min as f64 && elapsed_minutes < self.end_min as f64
    }
}

const TEN_MARK_PHASES: [Phase; 3] = [
    Phase::new(PhaseName::Outline, 0, 2),
    Phase::new(PhaseName::Write, 2, 5),
    Phase::new(PhaseName::Conclude, 5, 7),
];

const FIFTEEN_MARK_PHASES: [Phase; 3] = [
    Phase::new(PhaseName::Outline, 0, 3),
    Phase::new(PhaseName::Write, 3, 10),
    Phase::new(PhaseName::Conclude, 10, 12),
];

/// Phases for a Mains session. Short answers use fixed boundaries; essays
/// are split 15% / 70% / 15%, rounded to whole minutes.
pub fn phases_for(kind: MainsType, duration_minutes: u32) -> [Phase; 3] {
    match kind {
        MainsType::TenMark => TEN_MARK_PHASES,
        MainsType::FifteenMark => FIFTEEN_MARK_PHASES,
        MainsType::Essay => {
            let d = duration_minutes as f64;
            let outline_end = (d * ESSAY_OUTLINE_SHARE).round() as u32;
            let write_end = (d * ESSAY_WRITE_END_SHARE).round() as u32;
            [
                Phase::new(PhaseName::Outline, 0, outline_end),
                Phase::new(PhaseName::Write, outline_end, write_end),
                Phase::new(PhaseName::Conclude, write_end, duration_minutes),
            ]
        }
    }
}

/// Index of the phase containing `elapsed_minutes`. `None` once the session
/// has reached its end, which callers treat as complete.
pub fn current_phase(phases: &[Phase], elapsed_minutes: f64) -> Option<usize> {
    phases.iter().position(|p| p.contains(elapsed_minutes))
}

pub fn elapsed_minutes(elapsed_ms: u64) -> f64 {
    elapsed_ms as f64 / MS_PER_MINUTE as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseProgress {
    Past,
    Active,
    Upcoming,
}

impl PhaseProgress {
    /// With no current phase every marker reads as upcoming.
    pub fn of(index: usize, current: Option<usize>) -> Self {
        match current {
            Some(c) if c == index => PhaseProgress::Active,
            Some(c) if c > index => PhaseProgress::Past,
            _ => PhaseProgress::Upcoming,
        }
    }
}

/// Guidance line shown under the phase markers.
pub fn phase_hint(phases: &[Phase; 3], elapsed_ms: u64) -> &'static str {
    let outline_end = phases[0].end_min as u64 * MS_PER_MINUTE;
    let write_end = phases[1].end_min as u64 * MS_PER_MINUTE;
    if elapsed_ms < outline_end {
        "Structure your answer"
    } else if elapsed_ms < write_end {
        "Write your main content"
    } else {
        "Conclude and review"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: usize,
    pub to: usize,
}

/// Remembers the last observed phase and reports moves between phases.
/// Entering the first phase, or leaving the last one, is not a transition.
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    previous: Option<usize>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, current: Option<usize>) -> Option<PhaseTransition> {
        let transition = match (self.previous, current) {
            (Some(from), Some(to)) if from != to => Some(PhaseTransition { from, to }),
            _ => None,
        };
        self.previous = current;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(phases: &[Phase; 3]) -> Vec<(u32, u32)> {
        phases.iter().map(|p| (p.start_min, p.end_min)).collect()
    }

    #[test]
    fn ten_mark_phases_are_fixed() {
        let phases = phases_for(MainsType::TenMark, 99);
        assert_eq!(bounds(&phases), vec![(0, 2), (2, 5), (5, 7)]);
        assert_eq!(
            phases.map(|p| p.name),
            [PhaseName::Outline, PhaseName::Write, PhaseName::Conclude]
        );
    }

    #[test]
    fn fifteen_mark_phases_are_fixed() {
        let phases = phases_for(MainsType::FifteenMark, 12);
        assert_eq!(bounds(&phases), vec![(0, 3), (3, 10), (10, 12)]);
    }

    #[test]
    fn essay_phases_are_proportional() {
        let phases = phases_for(MainsType::Essay, 180);
        assert_eq!(bounds(&phases), vec![(0, 27), (27, 153), (153, 180)]);
    }

    #[test]
    fn essay_phases_round_and_stay_contiguous() {
        for d in 1..=300 {
            let phases = phases_for(MainsType::Essay, d);
            assert_eq!(phases[0].start_min, 0);
            assert_eq!(phases[0].end_min, phases[1].start_min);
            assert_eq!(phases[1].end_min, phases[2].start_min);
            assert_eq!(phases[2].end_min, d);
        }
        // 10 * 0.15 = 1.5 rounds up, 10 * 0.85 = 8.5 rounds up
        assert_eq!(bounds(&phases_for(MainsType::Essay, 10)), vec![(0, 2), (2, 9), (9, 10)]);
    }

    #[test]
    fn current_phase_uses_half_open_intervals() {
        let phases = phases_for(MainsType::TenMark, 7);
        assert_eq!(current_phase(&phases, 0.0), Some(0));
        assert_eq!(current_phase(&phases, 1.99), Some(0));
        assert_eq!(current_phase(&phases, 2.0), Some(1));
        assert_eq!(current_phase(&phases, 6.5), Some(2));
        assert_eq!(current_phase(&phases, 7.0), None);
        assert_eq!(current_phase(&phases, elapsed_minutes(300_000)), Some(2));
    }

    #[test]
    fn progress_markers() {
        assert_eq!(PhaseProgress::of(0, Some(1)), PhaseProgress::Past);
        assert_eq!(PhaseProgress::of(1, Some(1)), PhaseProgress::Active);
        assert_eq!(PhaseProgress::of(2, Some(1)), PhaseProgress::Upcoming);
        assert_eq!(PhaseProgress::of(0, None), PhaseProgress::Upcoming);
    }

    #[test]
    fn hints_follow_phase_boundaries() {
        let phases = phases_for(MainsType::FifteenMark, 12);
        assert_eq!(phase_hint(&phases, 0), "Structure your answer");
        assert_eq!(phase_hint(&phases, 3 * 60_000), "Write your main content");
        assert_eq!(phase_hint(&phases, 10 * 60_000), "Conclude and review");
        assert_eq!(phase_hint(&phases, 12 * 60_000), "Conclude and review");
    }

    #[test]
    fn tracker_reports_only_moves_between_phases() {
        let mut tracker = PhaseTracker::new();
        assert_eq!(tracker.observe(Some(0)), None);
        assert_eq!(tracker.observe(Some(0)), None);
        assert_eq!(
            tracker.observe(Some(1)),
            Some(PhaseTransition { from: 0, to: 1 })
        );
        assert_eq!(tracker.observe(None), None);
        assert_eq!(tracker.observe(Some(2)), None);
    }
}
