use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of an evaluation, either for the campaign as a whole or for a
/// single evaluator within it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationStatus::Pending => write!(f, "pending"),
            EvaluationStatus::InProgress => write!(f, "in_progress"),
            EvaluationStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One evaluation campaign visible to the current user.
///
/// Created and mutated only by the remote service; the client treats it as
/// read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEvaluation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// The evaluation form this campaign is built on.
    pub form_id: String,
    #[serde(default)]
    pub target: Option<f64>,
    /// Weighting factor for the leader's contribution.
    pub leader_weight: f64,
    /// Weighting factor for the team's contribution.
    pub team_weight: f64,
    /// Weighting factor for other contributions.
    pub other_weight: f64,
    #[serde(default)]
    pub status: EvaluationStatus,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
