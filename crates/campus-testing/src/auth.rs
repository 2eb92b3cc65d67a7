//! Mock identity helpers for integration tests.
//!
//! Services behind the portal gateway receive `x-campus-user-id` + `x-campus-user-role`
//! headers injected by the gateway. In tests, `MockAuth` builds these headers directly
//! so no real session is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use campus_auth_types::{USER_ID_HEADER, USER_ROLE_HEADER};

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub user_role: u8,
}

impl MockAuth {
    pub fn new(user_id: Uuid, user_role: u8) -> Self {
        Self { user_id, user_role }
    }

    /// A random student identity (role 0).
    pub fn student() -> Self {
        Self::new(Uuid::new_v4(), 0)
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_str(&self.user_role.to_string()).unwrap(),
        );
        map
    }
}
