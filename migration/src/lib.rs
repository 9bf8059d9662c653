pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20261018_000001_masks_table;
mod m20261018_000002_logs_table;
mod m20261018_000003_options_table;

pub use m20261018_000001_masks_table::create_masks_table;
pub use m20261018_000002_logs_table::create_logs_table;
pub use m20261018_000003_options_table::create_options_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261018_000001_masks_table::Migration),
            Box::new(m20261018_000002_logs_table::Migration),
            Box::new(m20261018_000003_options_table::Migration),
        ]
    }
}
