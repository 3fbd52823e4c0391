//! Slot generation, selection and pricing for a single day of a ground.
//!
//! Everything here is pure: the current moment and the reservation state are
//! passed in, and every operation returns a fresh slot list.

use crate::{
    opening_hours::OperatingWindow,
    types::{SlotId, TimeSlot},
};
use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// Produces the bookable one-hour slots of `date`.
///
/// On the calendar day of `now` only slots starting strictly after the
/// current hour are offered. `oracle` answers whether a slot is still free;
/// its errors are returned as they are.
pub fn generate_slots<F, E>(
    date: NaiveDate,
    window: OperatingWindow,
    mut oracle: F,
    now: NaiveDateTime,
) -> Result<Vec<TimeSlot>, E>
where
    F: FnMut(NaiveDate, u32) -> Result<bool, E>,
{
    let first_hour = if date == now.date() {
        window.open_hour.max(now.hour() + 1)
    } else {
        window.open_hour
    };

    (first_hour..window.close_hour)
        .map(|hour| Ok(TimeSlot::new(hour, oracle(date, hour)?)))
        .collect()
}

/// Flips the selection of `slot_id`. Unavailable and unknown slots are left
/// alone.
pub fn toggle_slot_selection(slots: &[TimeSlot], slot_id: SlotId) -> Vec<TimeSlot> {
    slots
        .iter()
        .map(|slot| {
            let mut slot = slot.clone();
            if slot.id == slot_id && slot.available {
                slot.selected = !slot.selected;
            }
            slot
        })
        .collect()
}

pub fn selected_count(slots: &[TimeSlot]) -> usize {
    slots.iter().filter(|slot| slot.selected).count()
}

pub fn compute_total(slots: &[TimeSlot], price_per_hour: u64) -> u64 {
    price_per_hour * selected_count(slots) as u64
}
