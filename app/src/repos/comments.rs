use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::{
    models::comment::{self, ActiveModel, Entity as CommentEntity, Model as Comment},
    utils::ids::generate_id,
};

pub struct CommentsRepo {
    db: DatabaseConnection,
}

impl CommentsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        post_id: &str,
        workspace_id: &str,
        author_id: Option<String>,
        content: String,
        is_internal: bool,
    ) -> Result<Comment, DbErr> {
        let comment = ActiveModel {
            id: Set(generate_id()),
            post_id: Set(post_id.to_string()),
            workspace_id: Set(workspace_id.to_string()),
            author_id: Set(author_id),
            content: Set(content),
            is_internal: Set(is_internal),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };

        comment.insert(&self.db).await
    }

    pub async fn get_for_post(
        &self,
        post_id: &str,
        include_internal: bool,
    ) -> Result<Vec<Comment>, DbErr> {
        let mut query = CommentEntity::find().filter(comment::Column::PostId.eq(post_id));
        if !include_internal {
            query = query.filter(comment::Column::IsInternal.eq(false));
        }

        query
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
    }
}
