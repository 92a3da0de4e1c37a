pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use config::ClientConfig;
pub use errors::{BookingError, Result};
pub use services::auth::{StaticToken, TokenProvider};
pub use services::client::BookingClient;
pub use services::polling::StatusPoller;
