pub mod booking;
pub mod confirmation;
pub mod request;

pub use booking::{BookingResult, BookingState, BookingStatus};
pub use confirmation::{BookingConfirmation, ConfirmationState, HealthStatus};
pub use request::{BookingRequest, Preferences};
