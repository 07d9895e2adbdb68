use super::*;

use chrono::Duration;

use crate::clients::MockHotelClient;
use crate::storage::MockReservationStore;

fn future(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

struct Fixture {
    saga: ReservationSaga,
    store: Arc<MockReservationStore>,
    hotel: Arc<MockHotelClient>,
}

fn fixture() -> Fixture {
    let store = Arc::new(MockReservationStore::new());
    let hotel = Arc::new(MockHotelClient::new());
    let saga = ReservationSaga::new(store.clone(), hotel.clone());
    Fixture { saga, store, hotel }
}

fn intent(request_id: Option<&str>) -> NewReservation {
    NewReservation {
        user_id: Uuid::new_v4(),
        room_id: Uuid::new_v4(),
        start_date: future(1),
        end_date: future(3),
        request_id: request_id.map(str::to_string),
    }
}

#[tokio::test]
async fn test_happy_path_confirms() {
    let f = fixture();

    let reservation = f.saga.create_reservation(intent(Some("req-a"))).await.unwrap();

    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert_eq!(reservation.request_id, "req-a");
    assert_eq!(f.hotel.hold_count(), 1);
    assert_eq!(f.hotel.confirm_count(), 1);
    assert_eq!(f.hotel.release_count(), 0);

    let stored = f.store.get_by_request_id("req-a").await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);
}

#[tokio::test]
async fn test_generates_request_id_when_absent() {
    let f = fixture();

    let reservation = f.saga.create_reservation(intent(None)).await.unwrap();

    assert!(!reservation.request_id.is_empty());
    assert_eq!(reservation.status, ReservationStatus::Confirmed);
}

#[tokio::test]
async fn test_validation_fails_fast() {
    let f = fixture();

    let mut bad = intent(Some("req-a"));
    bad.end_date = bad.start_date;
    let result = f.saga.create_reservation(bad).await;

    assert!(matches!(result, Err(SagaError::Validation(_))));
    // No saga entered: no rows, no hotel calls.
    assert!(f.store.is_empty().await);
    assert_eq!(f.hotel.hold_count(), 0);
}

#[tokio::test]
async fn test_past_start_date_fails_fast() {
    let f = fixture();

    let mut bad = intent(Some("req-a"));
    bad.start_date = future(-1);
    let result = f.saga.create_reservation(bad).await;

    assert!(matches!(result, Err(SagaError::Validation(_))));
}

#[tokio::test]
async fn test_conflict_at_hold_cancels_with_compensation() {
    let f = fixture();
    f.hotel
        .fail_hold_with(HotelClientError::Conflict("dates conflict".into()))
        .await;

    let reservation = f.saga.create_reservation(intent(Some("req-b"))).await.unwrap();

    assert_eq!(reservation.status, ReservationStatus::Cancelled);
    assert_eq!(f.hotel.confirm_count(), 0);
    // Compensation runs even when the hold itself failed; the release is
    // a no-op server-side but closes the window where a hold landed and
    // the 409 was a response lost in transit.
    assert_eq!(f.hotel.release_count(), 1);

    let stored = f.store.get_by_request_id("req-b").await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Cancelled);
}

#[tokio::test]
async fn test_confirm_failure_triggers_release_and_cancels() {
    let f = fixture();
    f.hotel
        .fail_confirm_with(HotelClientError::Transport("HTTP 500 - boom".into()))
        .await;

    let reservation = f.saga.create_reservation(intent(Some("req-c"))).await.unwrap();

    assert_eq!(reservation.status, ReservationStatus::Cancelled);
    assert_eq!(f.hotel.hold_count(), 1);
    assert_eq!(f.hotel.release_count(), 1);
}

#[tokio::test]
async fn test_compensation_failure_is_swallowed() {
    let f = fixture();
    f.hotel
        .fail_confirm_with(HotelClientError::Transport("HTTP 500 - boom".into()))
        .await;
    f.hotel
        .fail_release_with(HotelClientError::Transport("HTTP 500 - boom".into()))
        .await;

    let reservation = f.saga.create_reservation(intent(Some("req-d"))).await.unwrap();

    // The release failure never propagates; the reservation is still
    // driven to CANCELLED and the hotel sweeper reclaims the hold.
    assert_eq!(reservation.status, ReservationStatus::Cancelled);
    let stored = f.store.get_by_request_id("req-d").await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Cancelled);
}

#[tokio::test]
async fn test_replay_returns_original_without_hotel_calls() {
    let f = fixture();

    let first = f.saga.create_reservation(intent(Some("req-e"))).await.unwrap();
    assert_eq!(f.hotel.hold_count(), 1);

    let mut replay_intent = intent(Some("req-e"));
    replay_intent.start_date = future(5);
    replay_intent.end_date = future(7);
    let replay = f.saga.create_reservation(replay_intent).await.unwrap();

    assert_eq!(replay.id, first.id);
    assert_eq!(replay.status, first.status);
    // The replay issued zero additional hotel calls.
    assert_eq!(f.hotel.hold_count(), 1);
    assert_eq!(f.hotel.confirm_count(), 1);
}

#[tokio::test]
async fn test_replay_with_now_past_dates_returns_original() {
    // A client re-POSTs the identical original body days later because
    // the first response was lost; by then the stay dates are in the
    // past. The probe keys on request identity, so the replay still
    // returns the original terminal row instead of a validation error.
    let f = fixture();

    let first = f.saga.create_reservation(intent(Some("req-late"))).await.unwrap();
    assert_eq!(first.status, ReservationStatus::Confirmed);
    assert_eq!(f.hotel.hold_count(), 1);

    let mut stale_replay = intent(Some("req-late"));
    stale_replay.start_date = future(-10);
    stale_replay.end_date = future(-8);
    let replay = f.saga.create_reservation(stale_replay).await.unwrap();

    assert_eq!(replay.id, first.id);
    assert_eq!(replay.status, ReservationStatus::Confirmed);
    assert_eq!(f.hotel.hold_count(), 1);
    assert_eq!(f.hotel.confirm_count(), 1);
}

#[tokio::test]
async fn test_replay_after_cancellation_returns_cancelled() {
    let f = fixture();
    f.hotel
        .fail_hold_with(HotelClientError::Conflict("dates conflict".into()))
        .await;

    let first = f.saga.create_reservation(intent(Some("req-f"))).await.unwrap();
    assert_eq!(first.status, ReservationStatus::Cancelled);

    let replay = f.saga.create_reservation(intent(Some("req-f"))).await.unwrap();
    assert_eq!(replay.id, first.id);
    assert_eq!(replay.status, ReservationStatus::Cancelled);
    assert_eq!(f.hotel.hold_count(), 1);
}

#[tokio::test]
async fn test_concurrent_duplicates_create_one_row() {
    let f = fixture();

    let a = f.saga.create_reservation(intent(Some("req-g")));
    let b = f.saga.create_reservation(intent(Some("req-g")));
    let (ra, rb) = tokio::join!(a, b);

    let ra = ra.unwrap();
    let rb = rb.unwrap();
    assert_eq!(ra.id, rb.id);
    assert_eq!(f.store.len().await, 1);
    // At most one hold reached the hotel for this request_id.
    assert!(f.hotel.hold_count() <= 1);
}

#[tokio::test]
async fn test_never_returns_pending() {
    let f = fixture();
    f.hotel
        .fail_hold_with(HotelClientError::Transport("connection refused".into()))
        .await;

    let reservation = f.saga.create_reservation(intent(Some("req-h"))).await.unwrap();
    assert!(reservation.status.is_terminal());
}
