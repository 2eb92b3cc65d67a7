use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AttendanceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttendanceRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::EventId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::StudentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::QrToken)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::Status)
                            .string()
                            .not_null()
                            .default("present"),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::ScanTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::MarkedBy)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AttendanceRecords::Table, AttendanceRecords::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Race guard against concurrent double scans.
        manager
            .create_index(
                Index::create()
                    .table(AttendanceRecords::Table)
                    .col(AttendanceRecords::EventId)
                    .col(AttendanceRecords::StudentId)
                    .unique()
                    .name("uq_attendance_records_event_id_student_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AttendanceRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AttendanceRecords {
    Table,
    Id,
    EventId,
    StudentId,
    QrToken,
    Status,
    ScanTime,
    MarkedBy,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
}
