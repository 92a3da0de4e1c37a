use serde::{Deserialize, Serialize};

/// Snapshot of a booking as reported by the backend. Each poll returns a
/// fresh copy; nothing is merged client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingStatus {
    pub booking_id: String,
    pub status: BookingState,
    /// Ranked by the backend, best match first. Only meaningful once the
    /// booking is completed.
    #[serde(default)]
    pub results: Vec<BookingResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn best_result(&self) -> Option<&BookingResult> {
        self.results.first()
    }

    pub fn find_result(&self, provider_id: &str) -> Option<&BookingResult> {
        self.results.iter().find(|r| r.provider_id == provider_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl BookingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Pending => "pending",
            BookingState::Processing => "processing",
            BookingState::Completed => "completed",
            BookingState::Failed => "failed",
        }
    }

    /// `completed` and `failed` never change again; polling stops on them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingState::Completed | BookingState::Failed)
    }
}

impl std::fmt::Display for BookingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider offer found by the calling agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingResult {
    pub provider_id: String,
    pub provider_name: String,
    pub phone: String,
    pub address: String,
    /// 0 to 5 stars.
    pub rating: f64,
    /// Miles.
    pub distance: f64,
    /// Minutes.
    pub travel_time: u32,
    pub availability_date: String,
    pub availability_time: String,
    pub score: f64,
}

impl BookingResult {
    pub fn availability(&self) -> String {
        format!("{} at {}", self.availability_date, self.availability_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETED: &str = r#"{
        "booking_id": "b-1",
        "status": "completed",
        "results": [
            {"provider_id":"p-1","provider_name":"Bright Smiles","phone":"+15550001","address":"1 Main St","rating":4.8,"distance":1.2,"travel_time":6,"availability_date":"Tuesday, March 04","availability_time":"9:00 AM","score":91},
            {"provider_id":"p-2","provider_name":"Downtown Dental","phone":"+15550002","address":"2 Main St","rating":4.1,"distance":3.5,"travel_time":14,"availability_date":"Friday, March 07","availability_time":"2:00 PM","score":77}
        ]
    }"#;

    #[test]
    fn test_parse_completed_status_keeps_order() {
        let status: BookingStatus = serde_json::from_str(COMPLETED).unwrap();
        assert_eq!(status.status, BookingState::Completed);
        assert!(status.is_terminal());
        let scores: Vec<f64> = status.results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![91.0, 77.0]);
        assert_eq!(status.best_result().unwrap().provider_id, "p-1");
        assert_eq!(status.find_result("p-2").unwrap().provider_name, "Downtown Dental");
    }

    #[test]
    fn test_parse_processing_without_results() {
        let json = r#"{"booking_id":"b-2","status":"processing","message":"AI agents are calling providers..."}"#;
        let status: BookingStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, BookingState::Processing);
        assert!(!status.is_terminal());
        assert!(status.results.is_empty());
        assert!(status.best_result().is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!BookingState::Pending.is_terminal());
        assert!(!BookingState::Processing.is_terminal());
        assert!(BookingState::Completed.is_terminal());
        assert!(BookingState::Failed.is_terminal());
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let json = r#"{"booking_id":"b-3","status":"calling","results":[]}"#;
        assert!(serde_json::from_str::<BookingStatus>(json).is_err());
    }
}
