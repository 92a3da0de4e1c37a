use serde::{Deserialize, Serialize};

use super::booking::BookingResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingConfirmation {
    pub status: ConfirmationState,
    pub booking_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    /// The offer that was committed to, when the backend echoes it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<BookingResult>,
}

impl BookingConfirmation {
    pub fn is_confirmed(&self) -> bool {
        self.status == ConfirmationState::Confirmed
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationState {
    Confirmed,
    Failed,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confirmation_with_provider() {
        let json = r#"{
            "status": "confirmed",
            "booking_id": "b-1",
            "message": "Booking confirmed at Bright Smiles!",
            "calendar_event_id": "evt-9",
            "provider": {"provider_id":"p-1","provider_name":"Bright Smiles","phone":"+15550001","address":"1 Main St","rating":4.8,"distance":1.2,"travel_time":6,"availability_date":"Tuesday, March 04","availability_time":"9:00 AM","score":91}
        }"#;
        let confirmation: BookingConfirmation = serde_json::from_str(json).unwrap();
        assert!(confirmation.is_confirmed());
        assert_eq!(confirmation.calendar_event_id.as_deref(), Some("evt-9"));
        let provider = confirmation.provider.unwrap();
        assert_eq!(provider.availability(), "Tuesday, March 04 at 9:00 AM");
    }

    #[test]
    fn test_parse_failed_confirmation() {
        let json = r#"{"status":"failed","booking_id":"b-1","message":"provider hung up"}"#;
        let confirmation: BookingConfirmation = serde_json::from_str(json).unwrap();
        assert!(!confirmation.is_confirmed());
        assert!(confirmation.calendar_event_id.is_none());
        assert!(confirmation.provider.is_none());
    }
}
