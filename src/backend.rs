use crate::types::{BookingHandoff, Ground};
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Booking store unavailable: {0}")]
    Unavailable(String),
    #[error("Slot {}:00 - {}:00 is already reserved", .start_hour, .start_hour + 1)]
    SlotTaken { start_hour: u32 },
    #[error("Ground {0} does not exist")]
    UnknownGround(Uuid),
    #[error("Stored record can't be read: {0}")]
    InvalidRecord(String),
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// Where grounds and their reservations live.
pub trait BookingBackend: Clone + Send + Sync + 'static {
    fn grounds(&self) -> Result<Vec<Ground>, BackendError>;
    fn ground(&self, id: Uuid) -> Result<Option<Ground>, BackendError>;
    fn add_ground(&self, ground: Ground) -> Result<(), BackendError>;
    /// Whether a pending or confirmed booking covers `start_hour` on `date`.
    fn is_reserved(&self, ground_id: Uuid, date: NaiveDate, start_hour: u32)
        -> Result<bool, BackendError>;
    /// Books every selected slot or none of them.
    fn create_booking(&self, handoff: &BookingHandoff) -> Result<Vec<Uuid>, BackendError>;
}

/// Availability of `ground_id` as seen by the backend, in the shape slot
/// generation expects.
pub fn availability_oracle<B: BookingBackend>(
    backend: &B,
    ground_id: Uuid,
) -> impl Fn(NaiveDate, u32) -> Result<bool, BackendError> + '_ {
    move |date, start_hour| {
        backend
            .is_reserved(ground_id, date, start_hour)
            .map(|reserved| !reserved)
    }
}
