//! Best-effort confirmation emails.
//!
//! Sending happens on a spawned task after the database work is committed, so a
//! slow or failing mail relay never delays, fails or reverses the request.

use tracing::{info, warn};

use crate::domain::repository::{Notifier, StudentDirectory};
use crate::domain::types::{AttendanceRecord, EmailMessage, Event, Registration, StudentContact};
use campus_domain::id::StudentId;

/// Hand a message to the notifier without waiting for it.
pub fn dispatch<N: Notifier>(notifier: &N, message: EmailMessage) {
    let notifier = notifier.clone();
    tokio::spawn(async move {
        let report = notifier.send(&message).await;
        if report.success {
            info!(to = %message.to, subject = %message.subject, "confirmation email sent");
        } else {
            warn!(
                to = %message.to,
                subject = %message.subject,
                error = report.error.as_deref().unwrap_or("unknown"),
                "confirmation email failed"
            );
        }
    });
}

/// Look up the recipient. Lookup failures are logged and skip the email.
pub async fn recipient<S: StudentDirectory>(
    students: &S,
    student_id: StudentId,
) -> Option<StudentContact> {
    match students.find_contact(student_id).await {
        Ok(Some(contact)) => Some(contact),
        Ok(None) => {
            warn!(%student_id, "no contact on file, skipping confirmation email");
            None
        }
        Err(e) => {
            warn!(%student_id, error = %e, "contact lookup failed, skipping confirmation email");
            None
        }
    }
}

pub fn registration_email(
    contact: &StudentContact,
    event: &Event,
    registration: &Registration,
) -> EmailMessage {
    let payment_id = registration.payment_id.as_deref().unwrap_or("-");
    EmailMessage {
        to: contact.email.clone(),
        subject: format!("Registration confirmed: {}", event.name),
        html_body: format!(
            "<p>Hi {name},</p>\
             <p>Your seat for <strong>{event}</strong> is confirmed.</p>\
             <ul>\
             <li>Venue: {location}</li>\
             <li>Date: {date}</li>\
             <li>Amount paid: {amount}</li>\
             <li>Payment ID: {payment_id}</li>\
             </ul>",
            name = escape_html(&contact.name),
            event = escape_html(&event.name),
            location = escape_html(&event.location),
            date = event.event_date.format("%d %b %Y, %H:%M UTC"),
            amount = registration.amount_paid,
            payment_id = escape_html(payment_id),
        ),
    }
}

pub fn attendance_email(
    contact: &StudentContact,
    event: &Event,
    record: &AttendanceRecord,
) -> EmailMessage {
    EmailMessage {
        to: contact.email.clone(),
        subject: format!("Attendance recorded: {}", event.name),
        html_body: format!(
            "<p>Hi {name},</p>\
             <p>You were marked present at <strong>{event}</strong> at {time}.</p>\
             <p>Reference: {token}</p>",
            name = escape_html(&contact.name),
            event = escape_html(&event.name),
            time = record.scan_time.format("%H:%M UTC, %d %b %Y"),
            token = record.qr_token,
        ),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
