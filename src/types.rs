use crate::opening_hours::OpeningHours;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a slot within a single day. Derived from the start hour, so it
/// is only meaningful together with the date the slot was generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(u32);

impl SlotId {
    pub const fn from_start_hour(start_hour: u32) -> Self {
        Self(start_hour)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: SlotId,
    pub start_hour: u32,
    pub end_hour: u32,
    pub available: bool,
    pub selected: bool,
}

impl TimeSlot {
    pub fn new(start_hour: u32, available: bool) -> Self {
        Self {
            id: SlotId::from_start_hour(start_hour),
            start_hour,
            end_hour: start_hour + 1,
            available,
            selected: false,
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00 - {}:00", self.start_hour, self.end_hour)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ground {
    pub id: Uuid,
    pub name: String,
    pub price_per_hour: u64,
    pub opening_hours: OpeningHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedSlot {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl From<&TimeSlot> for SelectedSlot {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            start_hour: slot.start_hour,
            end_hour: slot.end_hour,
        }
    }
}

/// What a finished draft hands over to booking creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingHandoff {
    pub ground_id: Uuid,
    pub date: NaiveDate,
    pub selected_slots: Vec<SelectedSlot>,
    pub total_price: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Pending and confirmed bookings hold their slots.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub ground_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
    pub status: BookingStatus,
    pub total_price: u64,
}

impl Booking {
    pub fn covers(&self, ground_id: Uuid, date: NaiveDate, hour: u32) -> bool {
        self.status.is_active()
            && self.ground_id == ground_id
            && self.booking_date == date
            && self.start_hour <= hour
            && hour < self.end_hour
    }
}
