pub use sea_orm_migration::prelude::*;

mod m2025_10_20_000001_create_users;
mod m2025_10_20_000002_create_interests;
mod m2025_10_20_000003_create_api_keys;
mod m2025_10_20_000004_create_saved_articles;
mod m2025_10_20_000005_create_admin_logs;
mod m2025_10_20_000006_create_sessions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            // `users` first: every other table holds a foreign key to it.
            Box::new(m2025_10_20_000001_create_users::Migration),
            Box::new(m2025_10_20_000002_create_interests::Migration),
            Box::new(m2025_10_20_000003_create_api_keys::Migration),
            Box::new(m2025_10_20_000004_create_saved_articles::Migration),
            Box::new(m2025_10_20_000005_create_admin_logs::Migration),
            Box::new(m2025_10_20_000006_create_sessions::Migration),
        ]
    }
}
