//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_user_credentials;
mod m20250301_000003_create_contacts;
mod m20250301_000004_create_tokens;
mod m20250301_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_user_credentials::Migration),
            Box::new(m20250301_000003_create_contacts::Migration),
            Box::new(m20250301_000004_create_tokens::Migration),
            // Indexes should always be applied last
            Box::new(m20250301_000005_add_indexes::Migration),
        ]
    }
}
