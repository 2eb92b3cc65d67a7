use sea_orm::DatabaseConnection;

use crate::domain::types::GatewayCredentials;
use crate::infra::db::{
    DbAttendanceRepository, DbEventRepository, DbPaymentRepository, DbRegistrationRepository,
    DbStudentDirectory,
};
use crate::infra::gateway::HttpGateway;
use crate::infra::mailer::Mailer;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub gateway: HttpGateway,
    /// Same credentials the gateway client was built with. The secret keys callback signatures.
    pub credentials: Option<GatewayCredentials>,
    pub mailer: Mailer,
    pub currency: String,
}

impl AppState {
    pub fn event_repo(&self) -> DbEventRepository {
        DbEventRepository {
            db: self.db.clone(),
        }
    }

    pub fn payment_repo(&self) -> DbPaymentRepository {
        DbPaymentRepository {
            db: self.db.clone(),
        }
    }

    pub fn registration_repo(&self) -> DbRegistrationRepository {
        DbRegistrationRepository {
            db: self.db.clone(),
        }
    }

    pub fn attendance_repo(&self) -> DbAttendanceRepository {
        DbAttendanceRepository {
            db: self.db.clone(),
        }
    }

    pub fn student_directory(&self) -> DbStudentDirectory {
        DbStudentDirectory {
            db: self.db.clone(),
        }
    }
}
