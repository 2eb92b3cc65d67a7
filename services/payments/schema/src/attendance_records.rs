use sea_orm::entity::prelude::*;

/// Presence at an event. Absence is the lack of a row.
/// Unique on `(event_id, student_id)`; `qr_token` is globally unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: i32,
    pub student_id: Uuid,
    /// Token minted when attendance was marked (not the scanned token).
    #[sea_orm(unique)]
    pub qr_token: String,
    pub status: String,
    pub scan_time: chrono::DateTime<chrono::Utc>,
    pub marked_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id"
    )]
    Event,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
