use serde::{Deserialize, Serialize};

use crate::errors::BookingError;

/// What the user wants booked. Sent once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub service_type: String,
    pub timeframe: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

/// Ranking hints for the backend. Weights are relative and do not have to
/// sum to 1.0.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_weight: Option<f64>,
    /// Concrete availability windows, e.g. taken from a calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_slots: Option<String>,
}

impl BookingRequest {
    pub fn new(
        service_type: impl Into<String>,
        timeframe: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            service_type: service_type.into(),
            timeframe: timeframe.into(),
            location: location.into(),
            preferences: None,
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        for (field, value) in [
            ("service_type", &self.service_type),
            ("timeframe", &self.timeframe),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                return Err(BookingError::InvalidRequest(format!("{field} is required")));
            }
        }

        if let Some(prefs) = &self.preferences {
            prefs.validate()?;
        }

        Ok(())
    }
}

impl Preferences {
    pub fn validate(&self) -> Result<(), BookingError> {
        for (field, weight) in [
            ("rating_weight", self.rating_weight),
            ("distance_weight", self.distance_weight),
            ("availability_weight", self.availability_weight),
        ] {
            if let Some(w) = weight {
                if !w.is_finite() || w < 0.0 {
                    return Err(BookingError::InvalidRequest(format!(
                        "{field} must be a non-negative number, got {w}"
                    )));
                }
            }
        }
        Ok(())
    }
}
