pub use sea_orm_migration::prelude::*;

mod m20260201_000000_accounts_and_workspaces;
mod m20260201_010000_posts;
mod m20260201_020000_comments_and_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260201_000000_accounts_and_workspaces::Migration),
            Box::new(m20260201_010000_posts::Migration),
            Box::new(m20260201_020000_comments_and_audit_logs::Migration),
        ]
    }
}
