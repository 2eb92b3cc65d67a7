//! Attendance QR token scheme.
//!
//! KNOWN WEAK POINT: scanned tokens are accepted on prefix alone. Nothing proves
//! the code was issued by us; a signed token format would be the real fix.

use uuid::Uuid;

/// Type tag every attendance QR payload must carry.
pub const ATTENDANCE_QR_TYPE: &str = "attendance";

/// Prefix of codes printed by event operators.
pub const OPERATOR_TOKEN_PREFIX: &str = "ATT_";

/// Prefix of codes generated in the student's own app.
pub const SELF_SERVICE_TOKEN_PREFIX: &str = "QR_";

/// Prefix of tokens minted for stored attendance records. Never accepted as a scan.
pub const RECORD_TOKEN_PREFIX: &str = "ATR_";

/// Who issued the scanned code. Stored as `marked_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Operator,
    SelfService,
}

impl TokenOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::SelfService => "self",
        }
    }
}

/// Classify a scanned token. `None` for anything outside the accepted prefixes
/// or with nothing after the prefix.
pub fn classify(token: &str) -> Option<TokenOrigin> {
    let token = token.trim();
    if let Some(rest) = token.strip_prefix(OPERATOR_TOKEN_PREFIX) {
        return (!rest.is_empty()).then_some(TokenOrigin::Operator);
    }
    if let Some(rest) = token.strip_prefix(SELF_SERVICE_TOKEN_PREFIX) {
        return (!rest.is_empty()).then_some(TokenOrigin::SelfService);
    }
    None
}

/// Fresh token identifying one attendance mark.
pub fn mint_attendance_token() -> String {
    format!("{RECORD_TOKEN_PREFIX}{}", Uuid::new_v4().simple())
}
