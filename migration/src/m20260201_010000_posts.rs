use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // social_accounts
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("social_accounts"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(Alias::new("workspace_id")))
                    .col(string(Alias::new("platform")))
                    .col(string(Alias::new("name")))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_social_accounts_workspace")
                            .from(Alias::new("social_accounts"), Alias::new("workspace_id"))
                            .to(Alias::new("workspaces"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // posts
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("posts"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(Alias::new("workspace_id")))
                    .col(string_null(Alias::new("social_account_id")))
                    .col(string_null(Alias::new("platform")))
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .string()
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Alias::new("approval_status"))
                            .string()
                            .not_null()
                            .default("none"),
                    )
                    .col(string_null(Alias::new("approved_by")))
                    .col(timestamp_null(Alias::new("approved_at")))
                    .col(integer(Alias::new("order_index")).default(0))
                    .col(json_null(Alias::new("content")))
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_workspace")
                            .from(Alias::new("posts"), Alias::new("workspace_id"))
                            .to(Alias::new("workspaces"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_social_account")
                            .from(Alias::new("posts"), Alias::new("social_account_id"))
                            .to(Alias::new("social_accounts"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_workspace")
                    .table(Alias::new("posts"))
                    .col(Alias::new("workspace_id"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("posts")).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Alias::new("social_accounts")).to_owned())
            .await?;

        Ok(())
    }
}
