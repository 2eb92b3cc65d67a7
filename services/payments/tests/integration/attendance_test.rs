use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use campus_domain::id::{EventId, StudentId};
use campus_payments::domain::token::RECORD_TOKEN_PREFIX;
use campus_payments::domain::types::{Registration, RegistrationPaymentStatus};
use campus_payments::error::PaymentsServiceError;
use campus_payments::usecase::attendance::ScanAttendanceInput;

use crate::helpers::{FEE, Harness, money, settle, test_event, test_student};

fn student() -> StudentId {
    StudentId(Uuid::new_v4())
}

/// Paid event a day out, with one registered student.
async fn registered() -> (Harness, StudentId, DateTime<Utc>) {
    let h = Harness::new();
    let event_date = Utc::now() + Duration::days(1);
    h.store.add_event(test_event(1, FEE, None, event_date));
    let s = student();
    h.register(s, 1).await.unwrap();
    (h, s, event_date)
}

#[tokio::test]
async fn should_mark_attendance_with_fresh_token() {
    let (h, s, t) = registered().await;

    let record = h.scan(s, 1, "ATT_front_gate", t).await.unwrap();

    assert!(record.qr_token.starts_with(RECORD_TOKEN_PREFIX));
    assert_ne!(record.qr_token, "ATT_front_gate");
    assert_eq!(record.marked_by, "operator");
    assert_eq!(record.scan_time, t);
    assert_eq!(h.store.attendance().len(), 1);
}

#[tokio::test]
async fn should_record_self_service_origin() {
    let (h, s, t) = registered().await;
    let record = h.scan(s, 1, "QR_app_7f3a", t).await.unwrap();
    assert_eq!(record.marked_by, "self");
}

#[tokio::test]
async fn should_enforce_inclusive_two_hour_window() {
    let two_hours = Duration::hours(2);
    let one_sec = Duration::seconds(1);

    let (h, s, t) = registered().await;
    let result = h.scan(s, 1, "ATT_x", t - two_hours - one_sec).await;
    assert!(
        matches!(result, Err(PaymentsServiceError::WindowClosed)),
        "T-2h-1s: expected WindowClosed, got {result:?}"
    );
    let result = h.scan(s, 1, "ATT_x", t + two_hours + one_sec).await;
    assert!(
        matches!(result, Err(PaymentsServiceError::WindowClosed)),
        "T+2h+1s: expected WindowClosed, got {result:?}"
    );
    assert!(h.store.attendance().is_empty());

    h.scan(s, 1, "ATT_x", t - two_hours + one_sec).await.unwrap();
}

#[tokio::test]
async fn should_reject_second_scan_and_keep_single_record() {
    let (h, s, t) = registered().await;

    h.scan(s, 1, "ATT_x", t).await.unwrap();
    let second = h.scan(s, 1, "QR_y", t + Duration::minutes(5)).await;

    assert!(
        matches!(second, Err(PaymentsServiceError::AlreadyMarked)),
        "expected AlreadyMarked, got {second:?}"
    );
    assert_eq!(h.store.attendance().len(), 1);
}

#[tokio::test]
async fn should_reject_wrong_qr_type_first() {
    let h = Harness::new();
    let result = h
        .scan_usecase()
        .execute(ScanAttendanceInput {
            student_id: student(),
            qr_type: "ticket".to_owned(),
            event_id: EventId(404),
            token: "ATT_x".to_owned(),
            scanned_at: Utc::now(),
        })
        .await;
    assert!(matches!(result, Err(PaymentsServiceError::InvalidQrType)));
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn should_return_not_found_for_inactive_event() {
    let h = Harness::new();
    let mut event = test_event(1, 0, None, Utc::now());
    event.is_active = false;
    h.store.add_event(event);

    let result = h.scan(student(), 1, "ATT_x", Utc::now()).await;
    assert!(matches!(result, Err(PaymentsServiceError::EventNotFound)));
}

#[tokio::test]
async fn should_require_paid_registration_for_paid_event() {
    let h = Harness::new();
    let t = Utc::now();
    h.store.add_event(test_event(1, FEE, None, t));

    // No registration at all.
    let result = h.scan(student(), 1, "ATT_x", t).await;
    assert!(matches!(result, Err(PaymentsServiceError::PaymentRequired)));

    // Registration that never got paid.
    let s = student();
    h.store.add_registration(Registration {
        id: Uuid::new_v4(),
        event_id: EventId(1),
        student_id: s,
        payment_status: RegistrationPaymentStatus::Unpaid,
        payment_id: None,
        amount_paid: money(0),
        created_at: t,
    });
    let result = h.scan(s, 1, "ATT_x", t).await;
    assert!(matches!(result, Err(PaymentsServiceError::PaymentRequired)));
    assert!(h.store.attendance().is_empty());
}

#[tokio::test]
async fn should_allow_free_event_without_registration() {
    let h = Harness::new();
    let t = Utc::now();
    h.store.add_event(test_event(1, 0, None, t));

    let record = h.scan(student(), 1, "QR_walk_in", t).await.unwrap();
    assert_eq!(record.marked_by, "self");
}

#[tokio::test]
async fn should_reject_unrecognized_token_after_payment_check() {
    let (h, s, t) = registered().await;
    for token in ["", "ATT_", "TICKET_42", "att_lowercase"] {
        let result = h.scan(s, 1, token, t).await;
        assert!(
            matches!(result, Err(PaymentsServiceError::InvalidToken)),
            "token {token:?}: expected InvalidToken, got {result:?}"
        );
    }
    assert!(h.store.attendance().is_empty());
}

#[tokio::test]
async fn should_send_attendance_email() {
    let h = Harness::new();
    let t = Utc::now();
    h.store.add_event(test_event(1, 0, None, t));
    let contact = test_student("Ravi");
    h.store.add_student(contact.clone());

    let record = h.scan(contact.id, 1, "ATT_x", t).await.unwrap();

    settle().await;
    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ravi@campus.local");
    assert!(sent[0].html_body.contains(&record.qr_token));
}
