use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // accounts (profile rows written by the identity provider hook)
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("accounts"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(Alias::new("email")))
                    .col(string(Alias::new("display_name")))
                    .col(
                        ColumnDef::new(Alias::new("global_role"))
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // workspaces
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("workspaces"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(Alias::new("name")))
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // memberships
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("memberships"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(Alias::new("account_id")))
                    .col(string(Alias::new("workspace_id")))
                    .col(string(Alias::new("role")))
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_memberships_account")
                            .from(Alias::new("memberships"), Alias::new("account_id"))
                            .to(Alias::new("accounts"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_memberships_workspace")
                            .from(Alias::new("memberships"), Alias::new("workspace_id"))
                            .to(Alias::new("workspaces"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One role per (account, workspace)
        manager
            .create_index(
                Index::create()
                    .name("idx_memberships_account_workspace")
                    .table(Alias::new("memberships"))
                    .col(Alias::new("account_id"))
                    .col(Alias::new("workspace_id"))
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("memberships")).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Alias::new("workspaces")).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Alias::new("accounts")).to_owned())
            .await?;

        Ok(())
    }
}
