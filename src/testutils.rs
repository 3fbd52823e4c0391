use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    backend::{BackendError, BookingBackend},
    configuration::Configuration,
    types::{BookingHandoff, Ground},
};

pub struct MockBookingBackendInner {
    pub store_available: AtomicBool,
    pub calls_to_grounds: AtomicU64,
    pub calls_to_ground: AtomicU64,
    pub calls_to_is_reserved: AtomicU64,
    pub calls_to_create_booking: AtomicU64,
    pub grounds: Mutex<HashMap<Uuid, Ground>>,
    pub reserved: Mutex<HashSet<(Uuid, NaiveDate, u32)>>,
    pub handoffs: Mutex<Vec<BookingHandoff>>,
}

#[derive(Clone)]
pub struct MockBookingBackend(pub Arc<MockBookingBackendInner>);

impl MockBookingBackendInner {
    fn new() -> Self {
        Self {
            store_available: AtomicBool::new(true),
            calls_to_grounds: AtomicU64::default(),
            calls_to_ground: AtomicU64::default(),
            calls_to_is_reserved: AtomicU64::default(),
            calls_to_create_booking: AtomicU64::default(),
            grounds: Mutex::default(),
            reserved: Mutex::default(),
            handoffs: Mutex::default(),
        }
    }
}

impl MockBookingBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBookingBackendInner::new()))
    }

    pub fn reserve(&self, ground_id: Uuid, date: NaiveDate, start_hour: u32) {
        self.0
            .reserved
            .lock()
            .unwrap()
            .insert((ground_id, date, start_hour));
    }

    fn result(&self) -> Result<(), BackendError> {
        match self.0.store_available.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(BackendError::Unavailable("Supposed to fail".into())),
        }
    }
}

impl BookingBackend for MockBookingBackend {
    fn grounds(&self) -> Result<Vec<Ground>, BackendError> {
        self.0.calls_to_grounds.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.grounds.lock().unwrap().values().cloned().collect())
    }

    fn ground(&self, id: Uuid) -> Result<Option<Ground>, BackendError> {
        self.0.calls_to_ground.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.grounds.lock().unwrap().get(&id).cloned())
    }

    fn add_ground(&self, ground: Ground) -> Result<(), BackendError> {
        self.0.grounds.lock().unwrap().insert(ground.id, ground);
        Ok(())
    }

    fn is_reserved(
        &self,
        ground_id: Uuid,
        date: NaiveDate,
        start_hour: u32,
    ) -> Result<bool, BackendError> {
        self.0.calls_to_is_reserved.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self
            .0
            .reserved
            .lock()
            .unwrap()
            .contains(&(ground_id, date, start_hour)))
    }

    fn create_booking(&self, handoff: &BookingHandoff) -> Result<Vec<Uuid>, BackendError> {
        self.0
            .calls_to_create_booking
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        self.0.handoffs.lock().unwrap().push(handoff.clone());
        Ok(handoff
            .selected_slots
            .iter()
            .map(|_| Uuid::new_v4())
            .collect())
    }
}

#[derive(Clone)]
pub struct TestConfiguration {
    pub booking_horizon_days: u32,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            booking_horizon_days: 30,
        }
    }
}

impl Configuration for TestConfiguration {
    fn port(&self) -> u16 {
        0
    }

    fn database_url(&self) -> Option<String> {
        None
    }

    fn booking_horizon_days(&self) -> u32 {
        self.booking_horizon_days
    }
}
