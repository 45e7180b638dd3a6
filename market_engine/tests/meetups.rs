//! Meetup negotiation tests: the versioned proposal chain, dual confirmation, reschedules and
//! cancellation, all against a real SQLite database.
mod support;

use chrono::{Duration, Utc};
use market_engine::{
    db_types::{MeetupStatus, OrderId, Party, PaymentMethod, TransactionMethod},
    meetup_objects::{MeetupUpdateRequest, NewMeetupRequest},
    order_objects::PlaceOrderRequest,
    traits::{MeetupApiError, MeetupManagement},
    MeetupApi,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};
use support::{calculator, new_test_db, seed_listing, BUYER, SELLER, STRANGER};

/// Seeds a listing and places a meet-up order on it, returning the order id.
async fn place_meetup_order(db: &SqliteDatabase) -> OrderId {
    let listing = seed_listing(db, calculator(5)).await;
    let api = OrderFlowApi::new(db.clone());
    let request = PlaceOrderRequest::new(listing.id, 1, TransactionMethod::MeetUp, PaymentMethod::Cash);
    let order = api.place_order(BUYER, request).await.unwrap();
    order.id
}

fn tomorrow() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

#[tokio::test]
async fn proposing_a_meetup_preconfirms_the_proposer() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    let request = NewMeetupRequest::new(tomorrow()).at_location("Library steps");
    let version = api.create_meetup(BUYER, order_id, request).await.unwrap();
    assert_eq!(version.status, MeetupStatus::Pending);
    assert_eq!(version.proposed_by, Party::Buyer);
    assert!(version.is_confirmed_by(Party::Buyer));
    assert!(!version.is_confirmed_by(Party::Seller));
    assert!(version.is_current);
    assert_eq!(version.location.as_deref(), Some("Library steps"));
}

#[tokio::test]
async fn online_orders_do_not_get_meetups() {
    let db = new_test_db().await;
    let listing = seed_listing(&db, calculator(5)).await;
    let order_api = OrderFlowApi::new(db.clone());
    let request = PlaceOrderRequest::new(listing.id, 1, TransactionMethod::Online, PaymentMethod::Gcash);
    let order = order_api.place_order(BUYER, request).await.unwrap();

    let api = MeetupApi::new(db.clone());
    let err = api.create_meetup(BUYER, order.id, NewMeetupRequest::new(tomorrow())).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::MeetupNotRequired(_)));
    assert_eq!(err.error_code(), "INVALID_METHOD");
}

#[tokio::test]
async fn an_order_has_at_most_one_meetup_chain() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap();
    let err = api.create_meetup(SELLER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::MeetupAlreadyExists(_)));
    assert_eq!(err.error_code(), "CONFLICT");
}

#[tokio::test]
async fn both_parties_must_confirm() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap();

    // The buyer proposed, so the buyer's confirmation alone does not settle it.
    let version = api.confirm_meetup(BUYER, order_id).await.unwrap();
    assert_eq!(version.status, MeetupStatus::Pending);

    let version = api.confirm_meetup(SELLER, order_id).await.unwrap();
    assert_eq!(version.status, MeetupStatus::Confirmed);
    assert!(version.is_confirmed_by(Party::Buyer));
    assert!(version.is_confirmed_by(Party::Seller));
}

#[tokio::test]
async fn rescheduling_voids_prior_confirmations() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow()).at_location("Library steps")).await.unwrap();
    api.confirm_meetup(SELLER, order_id).await.unwrap();

    let new_time = tomorrow() + Duration::hours(3);
    let update = MeetupUpdateRequest::default().reschedule(new_time);
    let version = api.update_meetup(SELLER, order_id, update).await.unwrap();
    assert_eq!(version.status, MeetupStatus::Rescheduled);
    assert_eq!(version.proposed_by, Party::Seller);
    assert!(!version.is_confirmed_by(Party::Buyer));
    assert!(!version.is_confirmed_by(Party::Seller));
    // Fields not supplied carry forward from the retired version.
    assert_eq!(version.location.as_deref(), Some("Library steps"));

    // The chain now has two versions, exactly one of them current.
    let history = api.meetup_history(BUYER, order_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|v| v.is_current).count(), 1);
    assert_eq!(history[0].id, version.id);

    // Confirmation works on the new version as usual.
    api.confirm_meetup(BUYER, order_id).await.unwrap();
    let settled = api.confirm_meetup(SELLER, order_id).await.unwrap();
    assert_eq!(settled.status, MeetupStatus::Confirmed);
}

#[tokio::test]
async fn editing_details_in_place_keeps_confirmations() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap();
    api.confirm_meetup(SELLER, order_id).await.unwrap();

    let update = MeetupUpdateRequest::default().at_location("Cafeteria").with_remarks("wearing a red cap");
    let version = api.update_meetup(BUYER, order_id, update).await.unwrap();
    assert_eq!(version.status, MeetupStatus::Confirmed);
    assert!(version.is_confirmed_by(Party::Buyer));
    assert!(version.is_confirmed_by(Party::Seller));
    assert_eq!(version.location.as_deref(), Some("Cafeteria"));
    assert_eq!(version.remarks.as_deref(), Some("wearing a red cap"));

    // An in-place edit appends no version.
    let history = api.meetup_history(BUYER, order_id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn an_empty_update_is_rejected() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap();
    let err = api.update_meetup(BUYER, order_id, MeetupUpdateRequest::default()).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::EmptyUpdate));
}

#[tokio::test]
async fn cancellation_is_terminal_for_the_chain() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap();
    let version = api.cancel_meetup(SELLER, order_id, Some("Out of town this week".to_string())).await.unwrap();
    assert_eq!(version.status, MeetupStatus::Cancelled);
    assert_eq!(version.cancellation_reason.as_deref(), Some("Out of town this week"));

    // No further negotiation on a cancelled chain.
    let err = api.confirm_meetup(BUYER, order_id).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::MeetupCancelled(_)));
    assert_eq!(err.error_code(), "CONFLICT");

    let update = MeetupUpdateRequest::default().reschedule(tomorrow());
    let err = api.update_meetup(BUYER, order_id, update).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::MeetupCancelled(_)));

    let err = api.cancel_meetup(BUYER, order_id, None).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::MeetupCancelled(_)));
}

#[tokio::test]
async fn confirming_a_retired_version_conflicts() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    let first = api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap();
    let update = MeetupUpdateRequest::default().reschedule(tomorrow() + Duration::hours(2));
    api.update_meetup(SELLER, order_id, update).await.unwrap();

    // Acting on the retired version directly mimics a client that lost a reschedule race.
    let err = db.confirm_meetup_version(first.id, Party::Seller).await.unwrap_err();
    let flow_err = OrderFlowError::from(err);
    assert!(matches!(flow_err, OrderFlowError::MeetupNotCurrent));
    assert_eq!(flow_err.error_code(), "CONFLICT");
}

#[tokio::test]
async fn confirmation_lands_only_on_a_version_that_is_still_current() {
    let db = new_test_db().await;
    // Race a confirmation against a reschedule, repeatedly. Whichever way the race falls, a
    // successful confirmation must report the version as current at the moment it landed; the
    // loser must surface as a stale-version conflict, never a confirmed-but-retired row.
    for _ in 0..10 {
        let order_id = place_meetup_order(&db).await;
        let api = MeetupApi::new(db.clone());
        let first = api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap();

        let confirm = {
            let db = db.clone();
            async move { db.confirm_meetup_version(first.id, Party::Seller).await }
        };
        let reschedule = {
            let db = db.clone();
            let new_time = tomorrow() + Duration::hours(1);
            async move { db.reschedule_meetup(order_id, new_time, None, None, Party::Buyer).await }
        };
        let (confirmed, rescheduled) = tokio::join!(tokio::spawn(confirm), tokio::spawn(reschedule));
        rescheduled.unwrap().unwrap();
        match confirmed.unwrap() {
            Ok(version) => {
                assert!(version.is_current, "confirmation must not land on a retired version");
                assert_eq!(version.status, MeetupStatus::Confirmed);
            },
            Err(e) => assert!(matches!(e, MeetupApiError::VersionNotCurrent(_))),
        }
    }
}

#[tokio::test]
async fn strangers_cannot_touch_the_chain() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    api.create_meetup(BUYER, order_id, NewMeetupRequest::new(tomorrow())).await.unwrap();
    let err = api.confirm_meetup(STRANGER, order_id).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::AccessDenied));
    let err = api.meetup_history(STRANGER, order_id).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::AccessDenied));
    let err = api.current_meetup(STRANGER, order_id).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::AccessDenied));
}

#[tokio::test]
async fn orders_without_a_chain_have_no_current_meetup() {
    let db = new_test_db().await;
    let order_id = place_meetup_order(&db).await;
    let api = MeetupApi::new(db.clone());

    let err = api.current_meetup(BUYER, order_id).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::MeetupNotFound(_)));
    assert_eq!(err.error_code(), "NOT_FOUND");
}
