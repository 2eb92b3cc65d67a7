//! Auth types shared across campus services.
//!
//! Sessions are terminated by the portal gateway; services only see the
//! identity it injects. Provides the `IdentityHeaders` extractor.

pub mod identity;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-campus-user-id";

/// Header carrying the authenticated user's role (0 = student, 1 = coordinator, 2 = admin).
pub const USER_ROLE_HEADER: &str = "x-campus-user-role";
