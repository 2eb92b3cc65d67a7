use sea_orm_migration::prelude::*;

use campus_payments_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
