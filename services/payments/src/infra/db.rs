use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QuerySelect, SqlErr, TransactionError,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use campus_domain::id::{EventId, StudentId};
use campus_domain::money::Money;
use campus_payments_schema::{attendance_records, events, payments, registrations, students};

use crate::domain::commit::{CommitPlan, plan_commit};
use crate::domain::repository::{
    AttendanceRepository, EventRepository, PaymentRepository, RegistrationRepository,
    StudentDirectory,
};
use crate::domain::types::{
    AttendanceRecord, AttendanceStatus, CaptureCommit, CommitOutcome, Event, Payment,
    PaymentStatus, Registration, RegistrationPaymentStatus, StudentContact,
};
use crate::error::PaymentsServiceError;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ── Event repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEventRepository {
    pub db: DatabaseConnection,
}

impl EventRepository for DbEventRepository {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, PaymentsServiceError> {
        let model = events::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find event by id")?;
        model.map(event_from_model).transpose()
    }
}

fn event_from_model(model: events::Model) -> Result<Event, PaymentsServiceError> {
    Ok(Event {
        id: EventId(model.id),
        name: model.name,
        location: model.location,
        event_date: model.event_date,
        fee: Money::from_minor(model.fee_minor).context("event fee")?,
        max_participants: model.max_participants,
        registered_count: model.registered_count,
        is_active: model.is_active,
    })
}

// ── Payment repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPaymentRepository {
    pub db: DatabaseConnection,
}

impl PaymentRepository for DbPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<bool, PaymentsServiceError> {
        let inserted = payments::ActiveModel {
            id: Set(payment.id),
            student_id: Set(payment.student_id.0),
            event_id: Set(payment.event_id.0),
            order_id: Set(payment.order_id.clone()),
            payment_id: Set(payment.payment_id.clone()),
            amount_minor: Set(payment.amount.minor()),
            currency: Set(payment.currency.clone()),
            status: Set(payment.status.as_str().to_owned()),
            method: Set(payment.method.clone()),
            receipt: Set(payment.receipt.clone()),
            failure_reason: Set(payment.failure_reason.clone()),
            created_at: Set(payment.created_at),
            updated_at: Set(payment.updated_at),
        }
        .insert(&self.db)
        .await;
        match inserted {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(anyhow::Error::new(e).context("create payment").into()),
        }
    }

    async fn find_by_order(
        &self,
        order_id: &str,
        student_id: StudentId,
    ) -> Result<Option<Payment>, PaymentsServiceError> {
        let model = payments::Entity::find()
            .filter(payments::Column::OrderId.eq(order_id))
            .filter(payments::Column::StudentId.eq(student_id.0))
            .one(&self.db)
            .await
            .context("find payment by order")?;
        model.map(payment_from_model).transpose()
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<bool, PaymentsServiceError> {
        let result = payments::Entity::update_many()
            .col_expr(
                payments::Column::Status,
                Expr::value(PaymentStatus::Failed.as_str()),
            )
            .col_expr(
                payments::Column::FailureReason,
                Expr::value(reason.map(str::to_owned)),
            )
            .col_expr(payments::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(payments::Column::Id.eq(id))
            .filter(payments::Column::Status.eq(PaymentStatus::Created.as_str()))
            .exec(&self.db)
            .await
            .context("mark payment failed")?;
        Ok(result.rows_affected > 0)
    }
}

fn payment_from_model(model: payments::Model) -> Result<Payment, PaymentsServiceError> {
    let status = PaymentStatus::parse(&model.status)
        .with_context(|| format!("unknown payment status {:?}", model.status))?;
    Ok(Payment {
        id: model.id,
        student_id: StudentId(model.student_id),
        event_id: EventId(model.event_id),
        order_id: model.order_id,
        payment_id: model.payment_id,
        amount: Money::from_minor(model.amount_minor).context("payment amount")?,
        currency: model.currency,
        status,
        method: model.method,
        receipt: model.receipt,
        failure_reason: model.failure_reason,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Registration repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRegistrationRepository {
    pub db: DatabaseConnection,
}

impl RegistrationRepository for DbRegistrationRepository {
    async fn find(
        &self,
        event_id: EventId,
        student_id: StudentId,
    ) -> Result<Option<Registration>, PaymentsServiceError> {
        let model = registrations::Entity::find()
            .filter(registrations::Column::EventId.eq(event_id.0))
            .filter(registrations::Column::StudentId.eq(student_id.0))
            .one(&self.db)
            .await
            .context("find registration")?;
        model.map(registration_from_model).transpose()
    }

    async fn commit_capture(
        &self,
        commit: &CaptureCommit,
    ) -> Result<CommitOutcome, PaymentsServiceError> {
        let result = self
            .db
            .transaction::<_, CommitOutcome, PaymentsServiceError>(|txn| {
                let commit = commit.clone();
                Box::pin(async move { commit_in_txn(txn, &commit).await })
            })
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            // Lost a same-student race on the unique index: the winner may have
            // committed this very payment.
            Err(TransactionError::Transaction(PaymentsServiceError::AlreadyRegistered)) => {
                match self.find(commit.event_id, commit.student_id).await? {
                    Some(existing)
                        if existing.payment_id.as_deref() == Some(commit.payment_id.as_str()) =>
                    {
                        Ok(CommitOutcome::Replayed(existing))
                    }
                    _ => Err(PaymentsServiceError::AlreadyRegistered),
                }
            }
            Err(TransactionError::Transaction(e)) => Err(e),
            Err(TransactionError::Connection(e)) => {
                Err(anyhow::Error::new(e).context("commit capture").into())
            }
        }
    }
}

/// Runs inside the commit transaction. Any `Err` rolls everything back.
async fn commit_in_txn(
    txn: &DatabaseTransaction,
    commit: &CaptureCommit,
) -> Result<CommitOutcome, PaymentsServiceError> {
    // Row lock serializes every commit for this event until the transaction ends.
    let event = events::Entity::find_by_id(commit.event_id.0)
        .lock_exclusive()
        .one(txn)
        .await
        .context("lock event row")?
        .ok_or(PaymentsServiceError::EventNotFound)
        .and_then(event_from_model)?;

    let payment = payments::Entity::find()
        .filter(payments::Column::OrderId.eq(commit.order_id.as_str()))
        .filter(payments::Column::StudentId.eq(commit.student_id.0))
        .one(txn)
        .await
        .context("load payment for commit")?
        .map(payment_from_model)
        .transpose()?;

    let existing = registrations::Entity::find()
        .filter(registrations::Column::EventId.eq(commit.event_id.0))
        .filter(registrations::Column::StudentId.eq(commit.student_id.0))
        .one(txn)
        .await
        .context("load registration for commit")?
        .map(registration_from_model)
        .transpose()?;

    let payment = match plan_commit(commit, &event, payment.as_ref(), existing.as_ref())? {
        CommitPlan::Replay(registration) => return Ok(CommitOutcome::Replayed(registration)),
        CommitPlan::Insert => payment.ok_or(PaymentsServiceError::PaymentNotFound)?,
    };

    let captured = payments::Entity::update_many()
        .col_expr(
            payments::Column::Status,
            Expr::value(PaymentStatus::Captured.as_str()),
        )
        .col_expr(
            payments::Column::PaymentId,
            Expr::value(Some(commit.payment_id.clone())),
        )
        .col_expr(payments::Column::Method, Expr::value(commit.method.clone()))
        .col_expr(payments::Column::UpdatedAt, Expr::value(commit.committed_at))
        .filter(payments::Column::Id.eq(payment.id))
        .filter(payments::Column::Status.ne(PaymentStatus::Captured.as_str()))
        .exec(txn)
        .await
        .context("capture payment")?;
    if captured.rows_affected != 1 {
        return Err(PaymentsServiceError::PaymentClosed);
    }

    let registration = Registration {
        id: Uuid::now_v7(),
        event_id: commit.event_id,
        student_id: commit.student_id,
        payment_status: RegistrationPaymentStatus::Paid,
        payment_id: Some(commit.payment_id.clone()),
        amount_paid: commit.amount,
        created_at: commit.committed_at,
    };
    registrations::ActiveModel {
        id: Set(registration.id),
        event_id: Set(registration.event_id.0),
        student_id: Set(registration.student_id.0),
        payment_status: Set(registration.payment_status.as_str().to_owned()),
        payment_id: Set(registration.payment_id.clone()),
        amount_paid_minor: Set(registration.amount_paid.minor()),
        created_at: Set(registration.created_at),
    }
    .insert(txn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            PaymentsServiceError::AlreadyRegistered
        } else {
            anyhow::Error::new(e).context("insert registration").into()
        }
    })?;

    // Conditional increment: the capacity check and the write are one statement.
    let seat = events::Entity::update_many()
        .col_expr(
            events::Column::RegisteredCount,
            Expr::col(events::Column::RegisteredCount).add(1),
        )
        .filter(events::Column::Id.eq(commit.event_id.0))
        .filter(
            Condition::any()
                .add(events::Column::MaxParticipants.is_null())
                .add(
                    Expr::col(events::Column::RegisteredCount)
                        .lt(Expr::col(events::Column::MaxParticipants)),
                ),
        )
        .exec(txn)
        .await
        .context("take event seat")?;
    if seat.rows_affected != 1 {
        return Err(PaymentsServiceError::CapacityLostAfterCapture {
            order_id: commit.order_id.clone(),
            payment_id: commit.payment_id.clone(),
        });
    }

    Ok(CommitOutcome::Committed(registration))
}

fn registration_from_model(
    model: registrations::Model,
) -> Result<Registration, PaymentsServiceError> {
    let payment_status = RegistrationPaymentStatus::parse(&model.payment_status)
        .with_context(|| format!("unknown registration status {:?}", model.payment_status))?;
    Ok(Registration {
        id: model.id,
        event_id: EventId(model.event_id),
        student_id: StudentId(model.student_id),
        payment_status,
        payment_id: model.payment_id,
        amount_paid: Money::from_minor(model.amount_paid_minor).context("amount paid")?,
        created_at: model.created_at,
    })
}

// ── Attendance repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAttendanceRepository {
    pub db: DatabaseConnection,
}

impl AttendanceRepository for DbAttendanceRepository {
    async fn find(
        &self,
        event_id: EventId,
        student_id: StudentId,
    ) -> Result<Option<AttendanceRecord>, PaymentsServiceError> {
        let model = attendance_records::Entity::find()
            .filter(attendance_records::Column::EventId.eq(event_id.0))
            .filter(attendance_records::Column::StudentId.eq(student_id.0))
            .one(&self.db)
            .await
            .context("find attendance record")?;
        model.map(attendance_from_model).transpose()
    }

    async fn insert(&self, record: &AttendanceRecord) -> Result<(), PaymentsServiceError> {
        attendance_records::ActiveModel {
            id: Set(record.id),
            event_id: Set(record.event_id.0),
            student_id: Set(record.student_id.0),
            qr_token: Set(record.qr_token.clone()),
            status: Set(record.status.as_str().to_owned()),
            scan_time: Set(record.scan_time),
            marked_by: Set(record.marked_by.clone()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PaymentsServiceError::AlreadyMarked
            } else {
                anyhow::Error::new(e).context("insert attendance record").into()
            }
        })?;
        Ok(())
    }
}

fn attendance_from_model(
    model: attendance_records::Model,
) -> Result<AttendanceRecord, PaymentsServiceError> {
    let status = AttendanceStatus::parse(&model.status)
        .with_context(|| format!("unknown attendance status {:?}", model.status))?;
    Ok(AttendanceRecord {
        id: model.id,
        event_id: EventId(model.event_id),
        student_id: StudentId(model.student_id),
        qr_token: model.qr_token,
        status,
        scan_time: model.scan_time,
        marked_by: model.marked_by,
    })
}

// ── Student directory ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbStudentDirectory {
    pub db: DatabaseConnection,
}

impl StudentDirectory for DbStudentDirectory {
    async fn find_contact(
        &self,
        id: StudentId,
    ) -> Result<Option<StudentContact>, PaymentsServiceError> {
        let model = students::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find student contact")?;
        Ok(model.map(|m| StudentContact {
            id: StudentId(m.id),
            name: m.name,
            email: m.email,
        }))
    }
}
