use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::models::ClimbModel;

fn default_attempts() -> i32 {
    1
}

/// Request payload for logging a climb. The climb is filed under the
/// user's session on `date`, which is created on first use.
#[derive(Debug, Clone, Deserialize)]
pub struct LogClimbRequest {
    pub date: NaiveDate,
    pub grade: String,
    #[serde(default = "default_attempts")]
    pub attempts: i32,
    #[serde(default)]
    pub sent: bool,
    pub load: f64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogClimbResponse {
    pub message: String,
    pub climb: ClimbModel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_climb_request_defaults() {
        let request: LogClimbRequest =
            serde_json::from_str(r#"{"date": "2024-05-04", "grade": "V3", "load": 4}"#).unwrap();

        assert_eq!(request.date, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(request.attempts, 1);
        assert!(!request.sent);
        assert_eq!(request.load, 4.0);
        assert!(request.notes.is_empty());
    }

    #[test]
    fn test_log_climb_request_rejects_bad_date() {
        let result: Result<LogClimbRequest, _> =
            serde_json::from_str(r#"{"date": "05/04/2024", "grade": "V3", "load": 4}"#);
        assert!(result.is_err());
    }
}
