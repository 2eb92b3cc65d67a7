use chrono::{Duration, Utc};

use campus_domain::id::StudentId;
use campus_payments::domain::types::PaymentStatus;
use campus_payments::error::PaymentsServiceError;
use uuid::Uuid;

use crate::helpers::{FEE, Harness, KEY_ID, MockGateway, test_event};

fn student() -> StudentId {
    StudentId(Uuid::new_v4())
}

#[tokio::test]
async fn should_create_order_and_persist_created_payment() {
    let h = Harness::new();
    h.store
        .add_event(test_event(1, FEE, Some(10), Utc::now() + Duration::days(2)));
    let s = student();

    let order = h.order(s, 1, FEE).await.unwrap();

    assert_eq!(order.amount.minor(), FEE);
    assert_eq!(order.currency, "INR");
    assert_eq!(order.key_id, KEY_ID);
    assert_eq!(order.event_name, "Event 1");
    assert!(order.receipt.starts_with("ev1-"));

    let payments = h.store.payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].order_id, order.order_id);
    assert_eq!(payments[0].status, PaymentStatus::Created);
    assert_eq!(payments[0].student_id, s);
    assert!(payments[0].payment_id.is_none());

    // Seats are only taken at commit time.
    assert_eq!(h.store.event(1).registered_count, 0);

    let sent = h.gateway.last_order().unwrap();
    assert_eq!(sent.amount.minor(), FEE);
    assert_eq!(sent.receipt, order.receipt);
}

#[tokio::test]
async fn should_reject_amount_that_differs_from_fee() {
    let h = Harness::new();
    h.store
        .add_event(test_event(1, FEE, None, Utc::now() + Duration::days(2)));

    for amount in [FEE - 1, FEE + 1, 0, -FEE] {
        let result = h.order(student(), 1, amount).await;
        assert!(
            matches!(result, Err(PaymentsServiceError::InvalidAmount)),
            "amount {amount}: expected InvalidAmount, got {result:?}"
        );
    }
    assert_eq!(h.gateway.orders_created(), 0);
}

#[tokio::test]
async fn should_return_not_found_for_missing_inactive_or_past_event() {
    let h = Harness::new();
    let mut inactive = test_event(2, FEE, None, Utc::now() + Duration::days(2));
    inactive.is_active = false;
    h.store.add_event(inactive);
    h.store
        .add_event(test_event(3, FEE, None, Utc::now() - Duration::hours(1)));

    for event_id in [1, 2, 3] {
        let result = h.order(student(), event_id, FEE).await;
        assert!(
            matches!(result, Err(PaymentsServiceError::EventNotFound)),
            "event {event_id}: expected EventNotFound, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_reject_second_order_after_registration() {
    let h = Harness::new();
    h.store
        .add_event(test_event(1, FEE, None, Utc::now() + Duration::days(2)));
    let s = student();
    h.register(s, 1).await.unwrap();

    let result = h.order(s, 1, FEE).await;
    assert!(
        matches!(result, Err(PaymentsServiceError::AlreadyRegistered)),
        "expected AlreadyRegistered, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_free_event_orders() {
    let h = Harness::new();
    h.store
        .add_event(test_event(1, 0, None, Utc::now() + Duration::days(2)));

    let result = h.order(student(), 1, 0).await;
    assert!(matches!(result, Err(PaymentsServiceError::InvalidAmount)));
    assert_eq!(h.gateway.orders_created(), 0);
}

#[tokio::test]
async fn should_reject_foreign_currency() {
    let h = Harness::new();
    h.store
        .add_event(test_event(1, FEE, None, Utc::now() + Duration::days(2)));

    let result = h
        .order_usecase()
        .execute(campus_payments::usecase::order::CreateOrderInput {
            student_id: student(),
            event_id: campus_domain::id::EventId(1),
            amount: FEE,
            currency: Some("USD".to_owned()),
            requested_at: Utc::now(),
        })
        .await;
    assert!(matches!(result, Err(PaymentsServiceError::InvalidAmount)));
}

#[tokio::test]
async fn should_leave_no_payment_row_when_gateway_fails() {
    let h = Harness::with_gateway(MockGateway::unavailable());
    h.store
        .add_event(test_event(1, FEE, None, Utc::now() + Duration::days(2)));

    let result = h.order(student(), 1, FEE).await;
    assert!(
        matches!(result, Err(PaymentsServiceError::Gateway { status: Some(502) })),
        "expected Gateway 502, got {result:?}"
    );
    assert!(h.store.payments().is_empty());
}

#[tokio::test]
async fn should_fail_with_config_error_without_credentials() {
    let h = Harness::new();
    h.store
        .add_event(test_event(1, FEE, None, Utc::now() + Duration::days(2)));
    let mut usecase = h.order_usecase();
    usecase.credentials = None;

    let result = usecase
        .execute(campus_payments::usecase::order::CreateOrderInput {
            student_id: student(),
            event_id: campus_domain::id::EventId(1),
            amount: FEE,
            currency: None,
            requested_at: Utc::now(),
        })
        .await;
    assert!(matches!(result, Err(PaymentsServiceError::Config(_))));
    assert_eq!(h.gateway.orders_created(), 0);
}

#[tokio::test]
async fn should_register_two_then_turn_away_third_without_gateway_call() {
    let h = Harness::new();
    h.store
        .add_event(test_event(1, FEE, Some(2), Utc::now() + Duration::days(2)));
    let (a, b, c) = (student(), student(), student());

    h.register(a, 1).await.unwrap();
    assert_eq!(h.store.event(1).registered_count, 1);
    h.register(b, 1).await.unwrap();
    assert_eq!(h.store.event(1).registered_count, 2);

    let orders_before = h.gateway.orders_created();
    let result = h.order(c, 1, FEE).await;
    assert!(
        matches!(result, Err(PaymentsServiceError::EventFull)),
        "expected EventFull, got {result:?}"
    );
    assert_eq!(h.gateway.orders_created(), orders_before);
    assert_eq!(h.store.registrations().len(), 2);
}

#[tokio::test]
async fn should_reuse_payment_row_when_retry_gets_same_gateway_order() {
    let h = Harness::with_gateway(MockGateway::deduping());
    h.store
        .add_event(test_event(1, FEE, Some(10), Utc::now() + Duration::days(2)));
    let s = student();
    let requested_at = Utc::now();
    let input = || campus_payments::usecase::order::CreateOrderInput {
        student_id: s,
        event_id: campus_domain::id::EventId(1),
        amount: FEE,
        currency: None,
        requested_at,
    };

    let first = h.order_usecase().execute(input()).await.unwrap();
    let retry = h.order_usecase().execute(input()).await.unwrap();

    assert_eq!(first.order_id, retry.order_id);
    assert_eq!(first.receipt, retry.receipt);
    assert_eq!(h.gateway.orders_created(), 2);
    let payments = h.store.payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].order_id, first.order_id);
    assert_eq!(payments[0].status, PaymentStatus::Created);
}
