use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cook_time::CookTime;
use crate::food::FoodKind;

/// How a cook session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookOutcome {
    /// The countdown reached zero.
    Completed,
    /// The stop button was pressed.
    Stopped,
}

impl std::fmt::Display for CookOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CookOutcome::Completed => write!(f, "Cook completed!"),
            CookOutcome::Stopped => write!(f, "Cooking stopped."),
        }
    }
}

/// Bookkeeping for the cook session currently running.
///
/// Exists exactly while the appliance is cooking. The heat rate is fixed when
/// the session starts, so later power changes do not affect it.
#[derive(Debug, Clone)]
pub struct CookSession {
    pub id: Uuid,
    pub cancel: CancellationToken,
    pub heat_rate: f64,
    pub preset: CookTime,
    pub ticks: u32,
    pub started_at: DateTime<Utc>,
}

impl CookSession {
    pub fn new(preset: CookTime, heat_rate: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
            heat_rate,
            preset,
            ticks: 0,
            started_at: Utc::now(),
        }
    }

    /// Close the session and produce its record. Signals the countdown to exit.
    pub fn finish(self, outcome: CookOutcome, food: Option<FoodKind>) -> CookRecord {
        self.cancel.cancel();
        CookRecord::new(&self, outcome, food)
    }
}

/// Summary of a finished cook session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookRecord {
    pub session_id: Uuid,
    pub food: Option<FoodKind>,
    pub preset_secs: u32,
    pub ticks: u32,
    pub heat_rate: f64,
    pub outcome: CookOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl CookRecord {
    fn new(session: &CookSession, outcome: CookOutcome, food: Option<FoodKind>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session.id,
            food,
            preset_secs: session.preset.as_secs(),
            ticks: session.ticks,
            heat_rate: session.heat_rate,
            outcome,
            started_at: session.started_at,
            finished_at: now,
            duration_ms: (now - session.started_at).num_milliseconds(),
        }
    }

    /// Total heat delivered to the food during the session.
    pub fn heat_delivered(&self) -> f64 {
        f64::from(self.ticks) * self.heat_rate
    }
}
