use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use campus_auth_types::identity::IdentityHeaders;
use campus_core::response::success;
use campus_domain::id::EventId;

use crate::error::PaymentsServiceError;
use crate::state::AppState;
use crate::usecase::attendance::{ScanAttendanceInput, ScanAttendanceUseCase};

// ── POST /attendance/scan ────────────────────────────────────────────────────

/// Decoded QR payload. The student comes from the identity headers, not from here.
#[derive(Deserialize)]
pub struct ScanRequest {
    #[serde(rename = "type", default)]
    pub qr_type: String,
    /// Scanned token.
    #[serde(default)]
    pub id: String,
    pub event_id: Option<i32>,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub attendance_token: String,
    pub event_id: i32,
    #[serde(serialize_with = "campus_core::serde::to_rfc3339_ms")]
    pub scan_time: chrono::DateTime<Utc>,
    pub marked_by: String,
}

pub async fn scan_attendance(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<ScanRequest>, PaymentsServiceError>,
) -> Result<Response, PaymentsServiceError> {
    let event_id = body
        .event_id
        .ok_or(PaymentsServiceError::MissingField("event_id"))?;

    let usecase = ScanAttendanceUseCase {
        events: state.event_repo(),
        attendance: state.attendance_repo(),
        registrations: state.registration_repo(),
        students: state.student_directory(),
        notifier: state.mailer.clone(),
    };
    let record = usecase
        .execute(ScanAttendanceInput {
            student_id: identity.student_id(),
            qr_type: body.qr_type,
            event_id: EventId(event_id),
            token: body.id,
            scanned_at: Utc::now(),
        })
        .await?;

    Ok(success(
        StatusCode::CREATED,
        "attendance marked",
        ScanResponse {
            attendance_token: record.qr_token,
            event_id: record.event_id.0,
            scan_time: record.scan_time,
            marked_by: record.marked_by,
        },
    ))
}
