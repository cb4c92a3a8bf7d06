use serde::{Deserialize, Serialize};

use super::evaluation::EvaluationStatus;

/// Assignment of a user as evaluator within an evaluation campaign, together
/// with that user's progress.
///
/// The remote sheet names the campaign column `avaliacao_id`; it is exposed
/// here as `evaluation_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorRecord {
    pub user_id: String,
    #[serde(rename = "avaliacao_id")]
    pub evaluation_id: String,
    pub status: EvaluationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_wire_column_name() {
        let value = json!({
            "user_id": "user-9",
            "avaliacao_id": "eval-1",
            "status": "in_progress"
        });

        let record: EvaluatorRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.user_id, "user-9");
        assert_eq!(record.evaluation_id, "eval-1");
        assert_eq!(record.status, EvaluationStatus::InProgress);
    }

    #[test]
    fn test_serialize_round_trips_to_wire_name() {
        let record = EvaluatorRecord {
            user_id: "user-9".into(),
            evaluation_id: "eval-1".into(),
            status: EvaluationStatus::Completed,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["avaliacao_id"], "eval-1");
        assert!(value.get("evaluation_id").is_none());
    }
}
