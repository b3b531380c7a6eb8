use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // comments are append-only
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("comments"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(Alias::new("post_id")))
                    .col(string(Alias::new("workspace_id")))
                    .col(string_null(Alias::new("author_id")))
                    .col(text(Alias::new("content")))
                    .col(boolean(Alias::new("is_internal")).default(false))
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_post")
                            .from(Alias::new("comments"), Alias::new("post_id"))
                            .to(Alias::new("posts"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // audit_logs: the auto-increment id doubles as append order
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("audit_logs"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string(Alias::new("workspace_id")))
                    .col(string(Alias::new("entity_type")))
                    .col(string(Alias::new("entity_id")))
                    .col(string(Alias::new("action")))
                    .col(json(Alias::new("details")))
                    .col(string(Alias::new("acting_account_id")))
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_entity")
                    .table(Alias::new("audit_logs"))
                    .col(Alias::new("entity_type"))
                    .col(Alias::new("entity_id"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("audit_logs")).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Alias::new("comments")).to_owned())
            .await?;

        Ok(())
    }
}
