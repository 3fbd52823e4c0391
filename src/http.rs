use crate::{
    backend::{availability_oracle, BackendError, BookingBackend},
    booking_draft::{BookingDraft, DraftError, DraftState},
    configuration::Configuration,
    types::{Ground, SelectedSlot, SlotId, TimeSlot},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

#[derive(Clone)]
pub struct AppState<T: BookingBackend, C: Configuration> {
    backend: T,
    configuration: C,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotsQuery {
    date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotsResponse {
    ground_id: Uuid,
    date: NaiveDate,
    state: DraftState,
    price_per_hour: u64,
    total_price: u64,
    slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct BookingRequest {
    ground_id: Uuid,
    date: NaiveDate,
    #[validate(length(max = 24))]
    hours: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookingResponse {
    booking_ids: Vec<Uuid>,
    total_price: u64,
    selected_slots: Vec<SelectedSlot>,
}

#[derive(Debug)]
enum ApiError {
    UnknownGround(Uuid),
    DateOutOfRange(NaiveDate),
    SlotsUnavailable(Vec<u32>),
    Invalid(ValidationErrors),
    Draft(DraftError),
    Backend(BackendError),
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        Self::Draft(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::UnknownGround(id) => (
                StatusCode::NOT_FOUND,
                "UnknownGround",
                format!("Ground {id} does not exist"),
            ),
            Self::DateOutOfRange(date) => (
                StatusCode::BAD_REQUEST,
                "DateOutOfRange",
                format!("{date} is outside of the booking horizon"),
            ),
            Self::SlotsUnavailable(hours) => (
                StatusCode::CONFLICT,
                "SlotUnavailable",
                format!("Slots starting at {hours:?} can't be booked"),
            ),
            Self::Invalid(errors) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                errors.to_string(),
            ),
            Self::Draft(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.name(), err.to_string()),
            Self::Backend(err) => {
                let (status, error) = match err {
                    BackendError::SlotTaken { .. } => (StatusCode::CONFLICT, "SlotTaken"),
                    BackendError::UnknownGround(_) => (StatusCode::NOT_FOUND, "UnknownGround"),
                    BackendError::InvalidRecord(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "InvalidRecord")
                    }
                    _ => (StatusCode::SERVICE_UNAVAILABLE, "StoreUnavailable"),
                };
                error!(%err, "Booking backend failed");
                (status, error, err.to_string())
            }
        };
        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

pub fn create_app<T: BookingBackend, C: Configuration>(backend: T, configuration: C) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/grounds", get(get_grounds::<T, C>))
        .route("/grounds/:id/slots", get(get_slots::<T, C>))
        .route("/bookings", post(create_booking::<T, C>))
        .with_state(AppState {
            backend,
            configuration,
        })
        .layer(cors)
}

/// Builds a fresh draft of `ground_id` for `date` against the current
/// reservations.
fn open_draft<T: BookingBackend, C: Configuration>(
    state: &AppState<T, C>,
    ground_id: Uuid,
    date: NaiveDate,
) -> Result<BookingDraft, ApiError> {
    let now = Local::now().naive_local();
    let today = now.date();
    let last_day = today.checked_add_days(Days::new(
        state.configuration.booking_horizon_days().into(),
    ));
    if date < today || last_day.is_some_and(|last_day| date > last_day) {
        warn!(%date, "Date outside of the booking horizon");
        return Err(ApiError::DateOutOfRange(date));
    }

    let ground = state
        .backend
        .ground(ground_id)?
        .ok_or(ApiError::UnknownGround(ground_id))?;
    let mut draft = BookingDraft::new(&ground);
    draft.choose_date(date, availability_oracle(&state.backend, ground_id), now)?;
    Ok(draft)
}

async fn get_grounds<T: BookingBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
) -> Result<Json<Vec<Ground>>, ApiError> {
    Ok(Json(state.backend.grounds()?))
}

async fn get_slots<T: BookingBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(ground_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, ApiError> {
    let draft = open_draft(&state, ground_id, query.date)?;
    if draft.slots().is_empty() {
        info!(%ground_id, date = %query.date, "No available slots for this date");
    }

    Ok(Json(SlotsResponse {
        ground_id,
        date: query.date,
        state: draft.state(),
        price_per_hour: draft.price_per_hour(),
        total_price: draft.total_price(),
        slots: draft.slots().to_vec(),
    }))
}

async fn create_booking<T: BookingBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    request.validate().map_err(ApiError::Invalid)?;
    let hours: BTreeSet<u32> = request.hours.iter().copied().collect();

    let mut draft = open_draft(&state, request.ground_id, request.date)?;
    for &hour in &hours {
        draft.toggle_slot_for(request.date, SlotId::from_start_hour(hour));
    }

    let unavailable: Vec<u32> = hours
        .iter()
        .copied()
        .filter(|&hour| !draft.selected_slots().any(|slot| slot.start_hour == hour))
        .collect();
    if !unavailable.is_empty() {
        warn!(ground_id = %request.ground_id, date = %request.date, ?unavailable, "Requested slots not bookable");
        return Err(ApiError::SlotsUnavailable(unavailable));
    }

    let handoff = draft.proceed()?;
    let booking_ids = state.backend.create_booking(&handoff)?;
    let slots: Vec<String> = draft.selected_slots().map(ToString::to_string).collect();
    info!(
        ground_id = %handoff.ground_id,
        date = %handoff.date,
        slots = %slots.join(", "),
        total_price = handoff.total_price,
        "Booking created"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking_ids,
            total_price: handoff.total_price,
            selected_slots: handoff.selected_slots,
        }),
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        opening_hours::{OpeningHours, OperatingWindow},
        testutils::{MockBookingBackend, TestConfiguration},
    };
    use chrono::{Duration, Timelike};
    use reqwest::Client;
    use serde_json::Value;
    use std::sync::atomic::Ordering;
    use tokio::task::JoinHandle;

    fn ground() -> Ground {
        Ground {
            id: Uuid::new_v4(),
            name: "Green Valley Football Ground".into(),
            price_per_hour: 1200,
            opening_hours: OpeningHours::uniform(OperatingWindow::new(6, 22)),
        }
    }

    fn day(offset: i64) -> NaiveDate {
        Local::now().date_naive() + Duration::days(offset)
    }

    async fn init() -> (JoinHandle<()>, MockBookingBackend, String, Ground) {
        let mock_backend = MockBookingBackend::new();
        let ground = ground();
        mock_backend.add_ground(ground.clone()).unwrap();

        let app = create_app(mock_backend.clone(), TestConfiguration::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (server, mock_backend, address, ground)
    }

    #[tokio::test]
    async fn test_get_grounds() {
        let (server, mock_backend, address, ground) = init().await;

        let response = Client::new()
            .get(format!("{address}/grounds"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), StatusCode::OK.as_u16());
        let grounds: Vec<Ground> = response.json().await.unwrap();
        assert_eq!(grounds, [ground]);
        assert_eq!(mock_backend.0.calls_to_grounds.load(Ordering::SeqCst), 1);
        server.abort();
    }

    #[tokio::test]
    async fn test_get_slots_for_future_date() {
        let (server, mock_backend, address, ground) = init().await;
        mock_backend.reserve(ground.id, day(2), 18);

        let response = Client::new()
            .get(format!("{address}/grounds/{}/slots?date={}", ground.id, day(2)))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), StatusCode::OK.as_u16());
        let slots: SlotsResponse = response.json().await.unwrap();
        assert_eq!(slots.state, DraftState::SlotsGenerated);
        assert_eq!(slots.price_per_hour, 1200);
        assert_eq!(slots.total_price, 0);
        assert_eq!(slots.slots.len(), 16);
        for slot in &slots.slots {
            assert_eq!(slot.available, slot.start_hour != 18);
            assert!(!slot.selected);
        }
        assert_eq!(mock_backend.0.calls_to_is_reserved.load(Ordering::SeqCst), 16);
        server.abort();
    }

    #[tokio::test]
    async fn test_get_slots_for_today_only_offers_later_hours() {
        let (server, _, address, ground) = init().await;
        let current_hour = Local::now().hour();

        let response = Client::new()
            .get(format!("{address}/grounds/{}/slots?date={}", ground.id, day(0)))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), StatusCode::OK.as_u16());
        let slots: SlotsResponse = response.json().await.unwrap();
        assert!(slots.slots.len() <= 16);
        assert!(slots.slots.iter().all(|slot| slot.start_hour > current_hour));
        server.abort();
    }

    #[test_case::test_case(true, 30, true, StatusCode::OK)]
    #[test_case::test_case(false, 2, true, StatusCode::NOT_FOUND)]
    #[test_case::test_case(true, 31, true, StatusCode::BAD_REQUEST)]
    #[test_case::test_case(true, -1, true, StatusCode::BAD_REQUEST)]
    #[test_case::test_case(true, 2, false, StatusCode::SERVICE_UNAVAILABLE)]
    #[tokio::test]
    async fn test_get_slots_status(
        known_ground: bool,
        day_offset: i64,
        store_available: bool,
        status_code: StatusCode,
    ) {
        let (server, mock_backend, address, ground) = init().await;
        mock_backend
            .0
            .store_available
            .store(store_available, Ordering::SeqCst);
        let ground_id = if known_ground { ground.id } else { Uuid::new_v4() };

        let response = Client::new()
            .get(format!(
                "{address}/grounds/{ground_id}/slots?date={}",
                day(day_offset)
            ))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), status_code.as_u16());
        server.abort();
    }

    #[tokio::test]
    async fn test_create_booking() {
        let (server, mock_backend, address, ground) = init().await;
        let request = BookingRequest {
            ground_id: ground.id,
            date: day(2),
            hours: vec![19, 18, 19],
        };

        let response = Client::new()
            .post(format!("{address}/bookings"))
            .json(&request)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), StatusCode::CREATED.as_u16());
        let booking: BookingResponse = response.json().await.unwrap();
        assert_eq!(booking.booking_ids.len(), 2);
        assert_eq!(booking.total_price, 2400);
        assert_eq!(
            booking.selected_slots,
            [
                SelectedSlot { start_hour: 18, end_hour: 19 },
                SelectedSlot { start_hour: 19, end_hour: 20 },
            ]
        );

        let handoffs = mock_backend.0.handoffs.lock().unwrap();
        assert_eq!(handoffs.len(), 1);
        assert_eq!(handoffs[0].ground_id, ground.id);
        assert_eq!(handoffs[0].date, day(2));
        assert_eq!(handoffs[0].total_price, 2400);
        drop(handoffs);
        server.abort();
    }

    #[test_case::test_case(vec![], StatusCode::UNPROCESSABLE_ENTITY, "NoSlotsSelected")]
    #[test_case::test_case(vec![18], StatusCode::CONFLICT, "SlotUnavailable")]
    #[test_case::test_case(vec![3, 19], StatusCode::CONFLICT, "SlotUnavailable")]
    #[test_case::test_case((0..25).collect(), StatusCode::BAD_REQUEST, "InvalidRequest")]
    #[tokio::test]
    async fn test_create_booking_rejected(
        hours: Vec<u32>,
        status_code: StatusCode,
        error: &str,
    ) {
        let (server, mock_backend, address, ground) = init().await;
        mock_backend.reserve(ground.id, day(2), 18);
        let request = BookingRequest {
            ground_id: ground.id,
            date: day(2),
            hours,
        };

        let response = Client::new()
            .post(format!("{address}/bookings"))
            .json(&request)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), status_code.as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], error);
        assert_eq!(
            mock_backend.0.calls_to_create_booking.load(Ordering::SeqCst),
            0
        );
        server.abort();
    }

    #[tokio::test]
    async fn test_create_booking_with_store_down() {
        let (server, mock_backend, address, ground) = init().await;
        mock_backend.0.store_available.store(false, Ordering::SeqCst);
        let request = BookingRequest {
            ground_id: ground.id,
            date: day(2),
            hours: vec![18],
        };

        let response = Client::new()
            .post(format!("{address}/bookings"))
            .json(&request)
            .send()
            .await
            .unwrap();

        assert_eq!(
            response.status().as_u16(),
            StatusCode::SERVICE_UNAVAILABLE.as_u16()
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "StoreUnavailable");
        server.abort();
    }
}
