use chrono::{DateTime, Local};
use serde::Serialize;

use crate::analytics::{MainsOutcome, PrelimsStats};
use crate::clock::Clock;
use crate::session::{MainsType, PrelimsPaper, SessionMode, SessionStore};

/// Snapshot of a finished session, printed with `--json` on exit.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SessionReport {
    Prelims {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        paper: Option<PrelimsPaper>,
        finished_at: DateTime<Local>,
        stats: PrelimsStats,
    },
    Mains {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        kind: Option<MainsType>,
        duration_minutes: u32,
        finished_at: DateTime<Local>,
        outcome: MainsOutcome,
    },
}

impl SessionReport {
    pub fn from_store<C: Clock>(
        store: &SessionStore<C>,
        finished_at: DateTime<Local>,
    ) -> Option<Self> {
        let name = store.name().map(str::to_owned);
        match store.mode()? {
            SessionMode::Prelims => Some(SessionReport::Prelims {
                name,
                paper: store.prelims().paper(),
                finished_at,
                stats: store.prelims_stats()?,
            }),
            SessionMode::Mains => Some(SessionReport::Mains {
                name,
                kind: store.mains().kind(),
                duration_minutes: store.mains().duration_minutes(),
                finished_at,
                outcome: store.mains_outcome()?,
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
