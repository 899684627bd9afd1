pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users_and_profiles;
mod m20250901_000002_create_round_settings;
mod m20250901_000003_create_raffle;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users_and_profiles::Migration),
            Box::new(m20250901_000002_create_round_settings::Migration),
            Box::new(m20250901_000003_create_raffle::Migration),
        ]
    }
}
