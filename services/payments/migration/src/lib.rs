use sea_orm_migration::prelude::*;

mod m20261016_000001_create_students;
mod m20261016_000002_create_events;
mod m20261016_000003_create_payments;
mod m20261016_000004_create_registrations;
mod m20261016_000005_create_attendance_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261016_000001_create_students::Migration),
            Box::new(m20261016_000002_create_events::Migration),
            Box::new(m20261016_000003_create_payments::Migration),
            Box::new(m20261016_000004_create_registrations::Migration),
            Box::new(m20261016_000005_create_attendance_records::Migration),
        ]
    }
}
