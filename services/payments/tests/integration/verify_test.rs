use chrono::{Duration, Utc};
use uuid::Uuid;

use campus_domain::id::{EventId, StudentId};
use campus_payments::domain::signature;
use campus_payments::domain::types::PaymentStatus;
use campus_payments::error::PaymentsServiceError;
use campus_payments::usecase::verify::VerifyPaymentInput;

use crate::helpers::{FEE, Harness, SECRET, settle, test_event, test_student};

fn student() -> StudentId {
    StudentId(Uuid::new_v4())
}

fn harness_with_event(max: Option<i32>) -> Harness {
    let h = Harness::new();
    h.store
        .add_event(test_event(1, FEE, max, Utc::now() + Duration::days(2)));
    h
}

#[tokio::test]
async fn should_commit_registration_for_captured_payment() {
    let h = harness_with_event(Some(5));
    let contact = test_student("Asha");
    h.store.add_student(contact.clone());

    let order = h.order(contact.id, 1, FEE).await.unwrap();
    h.gateway
        .settle_payment("pay_A", &order.order_id, "captured", FEE);

    let output = h
        .verify(contact.id, 1, &order.order_id, "pay_A")
        .await
        .unwrap();

    assert!(!output.replayed);
    assert_eq!(output.registration.payment_id.as_deref(), Some("pay_A"));
    assert_eq!(output.registration.amount_paid.minor(), FEE);
    assert_eq!(h.store.event(1).registered_count, 1);

    let payments = h.store.payments();
    assert_eq!(payments[0].status, PaymentStatus::Captured);
    assert_eq!(payments[0].payment_id.as_deref(), Some("pay_A"));
    assert_eq!(payments[0].method.as_deref(), Some("upi"));

    settle().await;
    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "asha@campus.local");
    assert!(sent[0].subject.contains("Event 1"));
}

#[tokio::test]
async fn should_return_same_registration_when_callback_is_replayed() {
    let h = harness_with_event(Some(5));
    let s = student();
    let order = h.order(s, 1, FEE).await.unwrap();
    h.gateway
        .settle_payment("pay_A", &order.order_id, "captured", FEE);

    let first = h.verify(s, 1, &order.order_id, "pay_A").await.unwrap();
    let second = h.verify(s, 1, &order.order_id, "pay_A").await.unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(first.registration.id, second.registration.id);
    assert_eq!(h.store.registrations().len(), 1);
    assert_eq!(h.store.event(1).registered_count, 1);
    let captured = h
        .store
        .payments()
        .iter()
        .filter(|p| p.status == PaymentStatus::Captured)
        .count();
    assert_eq!(captured, 1);
}

#[tokio::test]
async fn should_reject_tampered_callbacks_before_any_read_or_write() {
    let h = harness_with_event(None);
    let s = student();
    let order = h.order(s, 1, FEE).await.unwrap();
    h.gateway
        .settle_payment("pay_A", &order.order_id, "captured", FEE);
    let calls_before = h.store.calls();

    let good = signature::sign(&order.order_id, "pay_A", SECRET);
    let cases = [
        ("wrong order_id", "order_forged".to_owned(), "pay_A".to_owned(), good.clone()),
        ("wrong payment_id", order.order_id.clone(), "pay_B".to_owned(), good.clone()),
        ("truncated signature", order.order_id.clone(), "pay_A".to_owned(), good[..good.len() - 2].to_owned()),
        ("wrong secret", order.order_id.clone(), "pay_A".to_owned(), signature::sign(&order.order_id, "pay_A", "other")),
        ("not hex", order.order_id.clone(), "pay_A".to_owned(), "zz".repeat(32)),
    ];

    for (name, order_id, payment_id, sig) in cases {
        let result = h
            .verify_usecase()
            .execute(VerifyPaymentInput {
                student_id: s,
                event_id: EventId(1),
                order_id,
                payment_id,
                signature: sig,
                received_at: Utc::now(),
            })
            .await;
        assert!(
            matches!(result, Err(PaymentsServiceError::InvalidSignature)),
            "{name}: expected InvalidSignature, got {result:?}"
        );
    }

    assert_eq!(h.store.calls(), calls_before, "no repository access");
    assert_eq!(h.gateway.fetches(), 0, "no gateway fetch");
    assert!(h.store.registrations().is_empty());
}

#[tokio::test]
async fn should_reject_missing_fields() {
    let h = harness_with_event(None);
    let result = h
        .verify_usecase()
        .execute(VerifyPaymentInput {
            student_id: student(),
            event_id: EventId(1),
            order_id: "order_1".to_owned(),
            payment_id: String::new(),
            signature: "ab".to_owned(),
            received_at: Utc::now(),
        })
        .await;
    assert!(matches!(
        result,
        Err(PaymentsServiceError::MissingField("payment_id"))
    ));
}

#[tokio::test]
async fn should_not_mutate_when_payment_not_captured() {
    let h = harness_with_event(None);
    let s = student();
    let order = h.order(s, 1, FEE).await.unwrap();
    h.gateway
        .settle_payment("pay_A", &order.order_id, "authorized", FEE);

    let result = h.verify(s, 1, &order.order_id, "pay_A").await;
    assert!(
        matches!(result, Err(PaymentsServiceError::PaymentNotCaptured)),
        "expected PaymentNotCaptured, got {result:?}"
    );
    assert_eq!(h.store.payments()[0].status, PaymentStatus::Created);
    assert!(h.store.registrations().is_empty());
}

#[tokio::test]
async fn should_reject_gateway_payment_for_another_order() {
    let h = harness_with_event(None);
    let s = student();
    let order = h.order(s, 1, FEE).await.unwrap();
    h.gateway
        .settle_payment("pay_A", "order_someone_else", "captured", FEE);

    let result = h.verify(s, 1, &order.order_id, "pay_A").await;
    assert!(matches!(result, Err(PaymentsServiceError::PaymentMismatch)));
    assert!(h.store.registrations().is_empty());
}

#[tokio::test]
async fn should_reject_short_capture() {
    let h = harness_with_event(None);
    let s = student();
    let order = h.order(s, 1, FEE).await.unwrap();
    h.gateway
        .settle_payment("pay_A", &order.order_id, "captured", FEE - 100);

    let result = h.verify(s, 1, &order.order_id, "pay_A").await;
    assert!(matches!(result, Err(PaymentsServiceError::PaymentMismatch)));
    assert_eq!(h.store.event(1).registered_count, 0);
}

#[tokio::test]
async fn should_keep_payment_created_when_gateway_fetch_fails() {
    let h = harness_with_event(None);
    let s = student();
    let order = h.order(s, 1, FEE).await.unwrap();

    // Gateway does not know the payment yet: 404 surfaces as upstream failure.
    let result = h.verify(s, 1, &order.order_id, "pay_A").await;
    assert!(matches!(
        result,
        Err(PaymentsServiceError::Gateway { status: Some(404) })
    ));
    assert_eq!(h.store.payments()[0].status, PaymentStatus::Created);

    // A repeated callback once the gateway has it succeeds.
    h.gateway
        .settle_payment("pay_A", &order.order_id, "captured", FEE);
    let output = h.verify(s, 1, &order.order_id, "pay_A").await.unwrap();
    assert!(!output.replayed);
}

#[tokio::test]
async fn should_grant_single_seat_to_exactly_one_of_two_concurrent_callbacks() {
    let h = harness_with_event(Some(1));
    let (a, b) = (student(), student());
    let order_a = h.order(a, 1, FEE).await.unwrap();
    let order_b = h.order(b, 1, FEE).await.unwrap();
    h.gateway
        .settle_payment("pay_A", &order_a.order_id, "captured", FEE);
    h.gateway
        .settle_payment("pay_B", &order_b.order_id, "captured", FEE);

    let (ra, rb) = futures::join!(
        h.verify(a, 1, &order_a.order_id, "pay_A"),
        h.verify(b, 1, &order_b.order_id, "pay_B"),
    );

    let results = [ra, rb];
    let committed = results.iter().filter(|r| r.is_ok()).count();
    let lost = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(PaymentsServiceError::CapacityLostAfterCapture { .. })
            )
        })
        .count();
    assert_eq!(committed, 1);
    assert_eq!(lost, 1);
    assert_eq!(h.store.event(1).registered_count, 1);
    assert_eq!(h.store.registrations().len(), 1);

    // The loser's payment was rolled back, still awaiting reconciliation.
    let created = h
        .store
        .payments()
        .iter()
        .filter(|p| p.status == PaymentStatus::Created)
        .count();
    assert_eq!(created, 1);
}

#[tokio::test]
async fn should_skip_email_when_student_has_no_contact() {
    let h = harness_with_event(None);
    let s = student();
    h.register(s, 1).await.unwrap();

    settle().await;
    assert!(h.mailer.sent().is_empty());
    assert_eq!(h.store.registrations().len(), 1);
}
