use crate::{
    backend::{BackendError, BookingBackend},
    opening_hours::{OpeningHours, OperatingWindow},
    schema::{bookings, grounds},
    types::{BookingHandoff, BookingStatus, Ground},
};
use chrono::{NaiveDate, NaiveTime};
use diesel::{
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    ConnectionError, PgConnection,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};
use uuid::Uuid;

const ACTIVE_STATUSES: [&str; 2] = [
    BookingStatus::Pending.as_str(),
    BookingStatus::Confirmed.as_str(),
];

#[derive(Queryable)]
struct GroundRow {
    id: Uuid,
    name: String,
    price_per_hour: i64,
    weekday_hours: String,
    weekend_hours: String,
}

impl TryFrom<GroundRow> for Ground {
    type Error = BackendError;

    fn try_from(row: GroundRow) -> Result<Self, Self::Error> {
        let parse = |hours: &str| {
            hours
                .parse::<OperatingWindow>()
                .map_err(|err| BackendError::InvalidRecord(format!("ground {}: {err}", row.id)))
        };
        Ok(Self {
            id: row.id,
            price_per_hour: u64::try_from(row.price_per_hour).map_err(|_| {
                BackendError::InvalidRecord(format!("ground {}: negative price", row.id))
            })?,
            opening_hours: OpeningHours {
                weekdays: parse(&row.weekday_hours)?,
                weekends: parse(&row.weekend_hours)?,
            },
            name: row.name,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = grounds)]
struct NewGround {
    id: Uuid,
    name: String,
    price_per_hour: i64,
    weekday_hours: String,
    weekend_hours: String,
}

#[derive(Insertable)]
#[diesel(table_name = bookings)]
struct NewBooking {
    id: Uuid,
    ground_id: Uuid,
    booking_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: String,
    total_price: i64,
}

fn to_price_column(price: u64) -> Result<i64, BackendError> {
    i64::try_from(price).map_err(|_| BackendError::InvalidRecord(format!("price {price} too large")))
}

// 24:00 is stored as 00:00.
fn hour_to_time(hour: u32) -> Result<NaiveTime, BackendError> {
    NaiveTime::from_hms_opt(hour % 24, 0, 0)
        .ok_or_else(|| BackendError::InvalidRecord(format!("hour {hour}")))
}

#[derive(Clone)]
pub struct DatabaseInterface {
    connection: Arc<Mutex<PgConnection>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, ConnectionError> {
        let connection = PgConnection::establish(database_url)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, PgConnection>, BackendError> {
        self.connection.lock().map_err(|_| {
            let err = "Database connection is poisoned";
            error!(err);
            BackendError::Unavailable(err.into())
        })
    }

    fn slot_reserved(
        connection: &mut PgConnection,
        ground_id: Uuid,
        date: NaiveDate,
        start_hour: u32,
    ) -> Result<bool, BackendError> {
        let slot_start = hour_to_time(start_hour)?;
        let overlapping: i64 = bookings::table
            .filter(bookings::ground_id.eq(ground_id))
            .filter(bookings::booking_date.eq(date))
            .filter(bookings::status.eq_any(ACTIVE_STATUSES))
            .filter(bookings::start_time.le(slot_start))
            .filter(
                bookings::end_time
                    .gt(slot_start)
                    .or(bookings::end_time.eq(NaiveTime::MIN)),
            )
            .count()
            .get_result(connection)?;
        Ok(overlapping > 0)
    }
}

impl BookingBackend for DatabaseInterface {
    fn grounds(&self) -> Result<Vec<Ground>, BackendError> {
        let mut connection = self.connection()?;
        grounds::table
            .order(grounds::name)
            .load::<GroundRow>(&mut *connection)?
            .into_iter()
            .map(Ground::try_from)
            .collect()
    }

    fn ground(&self, id: Uuid) -> Result<Option<Ground>, BackendError> {
        let mut connection = self.connection()?;
        grounds::table
            .find(id)
            .first::<GroundRow>(&mut *connection)
            .optional()?
            .map(Ground::try_from)
            .transpose()
    }

    fn add_ground(&self, ground: Ground) -> Result<(), BackendError> {
        let new_ground = NewGround {
            id: ground.id,
            price_per_hour: to_price_column(ground.price_per_hour)?,
            weekday_hours: ground.opening_hours.weekdays.to_string(),
            weekend_hours: ground.opening_hours.weekends.to_string(),
            name: ground.name,
        };
        let mut connection = self.connection()?;
        diesel::insert_into(grounds::table)
            .values(&new_ground)
            .execute(&mut *connection)?;
        info!(id = %new_ground.id, name = %new_ground.name, "Added ground");
        Ok(())
    }

    fn is_reserved(
        &self,
        ground_id: Uuid,
        date: NaiveDate,
        start_hour: u32,
    ) -> Result<bool, BackendError> {
        let mut connection = self.connection()?;
        Self::slot_reserved(&mut connection, ground_id, date, start_hour)
    }

    fn create_booking(&self, handoff: &BookingHandoff) -> Result<Vec<Uuid>, BackendError> {
        let mut connection = self.connection()?;
        connection.transaction(|connection| {
            let price_per_hour: i64 = grounds::table
                .find(handoff.ground_id)
                .select(grounds::price_per_hour)
                .first(connection)
                .optional()?
                .ok_or(BackendError::UnknownGround(handoff.ground_id))?;

            let mut ids = Vec::with_capacity(handoff.selected_slots.len());
            for slot in &handoff.selected_slots {
                let start_hour = slot.start_hour;
                if Self::slot_reserved(connection, handoff.ground_id, handoff.date, start_hour)? {
                    return Err(BackendError::SlotTaken { start_hour });
                }

                let booking = NewBooking {
                    id: Uuid::new_v4(),
                    ground_id: handoff.ground_id,
                    booking_date: handoff.date,
                    start_time: hour_to_time(start_hour)?,
                    end_time: hour_to_time(slot.end_hour)?,
                    status: BookingStatus::Pending.as_str().into(),
                    total_price: price_per_hour,
                };
                diesel::insert_into(bookings::table)
                    .values(&booking)
                    .execute(connection)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            BackendError::SlotTaken { start_hour }
                        }
                        err => err.into(),
                    })?;
                ids.push(booking.id);
            }
            Ok(ids)
        })
    }
}
