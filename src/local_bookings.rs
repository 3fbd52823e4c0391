use crate::{
    backend::{BackendError, BookingBackend},
    opening_hours::OpeningHours,
    types::{Booking, BookingHandoff, BookingStatus, Ground},
};
use chrono::NaiveDate;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct LocalBookings {
    grounds: Arc<Mutex<HashMap<Uuid, Ground>>>,
    bookings: Arc<Mutex<HashMap<Uuid, Booking>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, BackendError> {
    mutex.lock().map_err(|_| {
        let err = "In-memory booking store is poisoned";
        error!(err);
        BackendError::Unavailable(err.into())
    })
}

impl LocalBookings {
    pub fn insert_example_grounds(&self) -> Result<(), BackendError> {
        self.add_ground(Ground {
            id: Uuid::new_v4(),
            name: "Green Valley Football Ground".into(),
            price_per_hour: 1200,
            opening_hours: OpeningHours::default(),
        })
    }

    #[cfg(test)]
    fn bookings(&self) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = lock(&self.bookings).unwrap().values().cloned().collect();
        bookings.sort_unstable_by_key(|booking| (booking.booking_date, booking.start_hour));
        bookings
    }
}

impl BookingBackend for LocalBookings {
    fn grounds(&self) -> Result<Vec<Ground>, BackendError> {
        let mut grounds: Vec<Ground> = lock(&self.grounds)?.values().cloned().collect();
        grounds.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Ok(grounds)
    }

    fn ground(&self, id: Uuid) -> Result<Option<Ground>, BackendError> {
        Ok(lock(&self.grounds)?.get(&id).cloned())
    }

    fn add_ground(&self, ground: Ground) -> Result<(), BackendError> {
        info!(id = %ground.id, name = %ground.name, "Adding ground");
        lock(&self.grounds)?.insert(ground.id, ground);
        Ok(())
    }

    fn is_reserved(
        &self,
        ground_id: Uuid,
        date: NaiveDate,
        start_hour: u32,
    ) -> Result<bool, BackendError> {
        Ok(lock(&self.bookings)?
            .values()
            .any(|booking| booking.covers(ground_id, date, start_hour)))
    }

    fn create_booking(&self, handoff: &BookingHandoff) -> Result<Vec<Uuid>, BackendError> {
        let price_per_hour = self
            .ground(handoff.ground_id)?
            .ok_or(BackendError::UnknownGround(handoff.ground_id))?
            .price_per_hour;

        let mut bookings = lock(&self.bookings)?;
        if let Some(taken) = handoff.selected_slots.iter().find(|slot| {
            bookings
                .values()
                .any(|booking| booking.covers(handoff.ground_id, handoff.date, slot.start_hour))
        }) {
            let err = BackendError::SlotTaken {
                start_hour: taken.start_hour,
            };
            error!(%err, ground_id = %handoff.ground_id, date = %handoff.date);
            return Err(err);
        }

        let ids = handoff
            .selected_slots
            .iter()
            .map(|slot| {
                let id = Uuid::new_v4();
                bookings.insert(
                    id,
                    Booking {
                        id,
                        ground_id: handoff.ground_id,
                        booking_date: handoff.date,
                        start_hour: slot.start_hour,
                        end_hour: slot.end_hour,
                        status: BookingStatus::Pending,
                        total_price: price_per_hour,
                    },
                );
                id
            })
            .collect();
        Ok(ids)
    }
}
