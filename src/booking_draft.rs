use crate::{
    availability::{compute_total, generate_slots, selected_count, toggle_slot_selection},
    opening_hours::OpeningHours,
    types::{BookingHandoff, Ground, SelectedSlot, SlotId, TimeSlot},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftState {
    NoDateSelected,
    SlotsGenerated,
    SlotsPartiallySelected,
    ReadyToSubmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Please select at least one time slot")]
    NoSlotsSelected,
    #[error("Please select a date first")]
    NoDateSelected,
}

impl DraftError {
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoSlotsSelected => "NoSlotsSelected",
            Self::NoDateSelected => "NoDateSelected",
        }
    }
}

/// In-progress slot selection of one ground for one date.
///
/// Choosing a date always regenerates the slots and drops every selection,
/// since slot ids are only unique within a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    ground_id: Uuid,
    price_per_hour: u64,
    opening_hours: OpeningHours,
    date: Option<NaiveDate>,
    slots: Vec<TimeSlot>,
    total_price: u64,
    state: DraftState,
}

impl BookingDraft {
    pub fn new(ground: &Ground) -> Self {
        Self {
            ground_id: ground.id,
            price_per_hour: ground.price_per_hour,
            opening_hours: ground.opening_hours,
            date: None,
            slots: vec![],
            total_price: 0,
            state: DraftState::NoDateSelected,
        }
    }

    /// Regenerates the slots for `date`. The draft is left untouched when the
    /// oracle fails.
    pub fn choose_date<F, E>(
        &mut self,
        date: NaiveDate,
        oracle: F,
        now: NaiveDateTime,
    ) -> Result<(), E>
    where
        F: FnMut(NaiveDate, u32) -> Result<bool, E>,
    {
        let window = self.opening_hours.window_for(date);
        let slots = generate_slots(date, window, oracle, now)?;
        debug!(ground_id = %self.ground_id, %date, slots = slots.len(), "Generated slots");

        self.date = Some(date);
        self.slots = slots;
        self.total_price = 0;
        self.state = DraftState::SlotsGenerated;
        Ok(())
    }

    pub fn toggle_slot(&mut self, slot_id: SlotId) {
        if self.date.is_none() {
            return;
        }
        self.slots = toggle_slot_selection(&self.slots, slot_id);
        self.total_price = compute_total(&self.slots, self.price_per_hour);
        self.state = match selected_count(&self.slots) {
            0 => DraftState::SlotsGenerated,
            _ => DraftState::SlotsPartiallySelected,
        };
    }

    /// Toggles `slot_id` only if `date` is still the active date. Returns
    /// whether the toggle was applied.
    pub fn toggle_slot_for(&mut self, date: NaiveDate, slot_id: SlotId) -> bool {
        if self.date != Some(date) {
            debug!(%date, %slot_id, "Ignoring toggle for stale date");
            return false;
        }
        self.toggle_slot(slot_id);
        true
    }

    /// Marks the draft ready and returns what booking creation needs.
    pub fn proceed(&mut self) -> Result<BookingHandoff, DraftError> {
        let date = match (self.state, self.date) {
            (DraftState::NoDateSelected, _) | (_, None) => return Err(DraftError::NoDateSelected),
            (DraftState::SlotsGenerated, _) => return Err(DraftError::NoSlotsSelected),
            (_, Some(date)) => date,
        };

        self.state = DraftState::ReadyToSubmit;
        Ok(BookingHandoff {
            ground_id: self.ground_id,
            date,
            selected_slots: self.selected_slots().map(SelectedSlot::from).collect(),
            total_price: self.total_price,
        })
    }

    pub fn selected_slots(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter().filter(|slot| slot.selected)
    }

    pub const fn ground_id(&self) -> Uuid {
        self.ground_id
    }

    pub const fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub const fn price_per_hour(&self) -> u64 {
        self.price_per_hour
    }

    pub const fn total_price(&self) -> u64 {
        self.total_price
    }

    pub const fn state(&self) -> DraftState {
        self.state
    }
}
