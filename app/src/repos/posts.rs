use sea_orm::{
    prelude::DateTime, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder,
};

use crate::{
    models::post::{self, ActiveModel, ApprovalStatus, Entity as PostEntity, Model as Post, PostStatus},
    services::scope::Selector,
};

pub struct PostsRepo {
    db: DatabaseConnection,
}

impl PostsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, post_id: &str) -> Result<Post, DbErr> {
        Self::find_in(&self.db, post_id).await
    }

    pub async fn find_in<C: ConnectionTrait>(conn: &C, post_id: &str) -> Result<Post, DbErr> {
        PostEntity::find_by_id(post_id.to_string())
            .one(conn)
            .await?
            .ok_or(DbErr::RecordNotFound(format!("post {}", post_id)))
    }

    /// Posts in grid order. `within` restricts to the given workspaces.
    pub async fn list(
        &self,
        within: Option<Vec<String>>,
        selector: &Selector,
    ) -> Result<Vec<Post>, DbErr> {
        let mut query = PostEntity::find();
        if let Some(ids) = within {
            query = query.filter(post::Column::WorkspaceId.is_in(ids));
        }
        if let Some(workspace_id) = &selector.workspace_id {
            query = query.filter(post::Column::WorkspaceId.eq(workspace_id.as_str()));
        }
        if let Some(platform) = &selector.platform {
            query = query.filter(post::Column::Platform.eq(platform.as_str()));
        }
        if let Some(id) = &selector.social_account_id {
            query = query.filter(post::Column::SocialAccountId.eq(id.as_str()));
        }

        query
            .order_by_asc(post::Column::OrderIndex)
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await
    }

    /// Record a verdict on a post still awaiting review.
    ///
    /// Single conditional UPDATE: matches only while the post is
    /// `sent_to_client` with no verdict. Returns whether a row changed.
    pub async fn record_verdict<C: ConnectionTrait>(
        conn: &C,
        post_id: &str,
        verdict: ApprovalStatus,
        approved_by: Option<String>,
        approved_at: Option<DateTime>,
    ) -> Result<bool, DbErr> {
        let changes = ActiveModel {
            approval_status: Set(verdict),
            approved_by: Set(approved_by),
            approved_at: Set(approved_at),
            ..Default::default()
        };

        let result = PostEntity::update_many()
            .set(changes)
            .filter(post::Column::Id.eq(post_id))
            .filter(post::Column::Status.eq(PostStatus::SentToClient))
            .filter(post::Column::ApprovalStatus.eq(ApprovalStatus::AwaitingReview))
            .exec(conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Put a post back in front of the client and clear its verdict.
    /// Published posts are never reopened.
    pub async fn reopen_for_review<C: ConnectionTrait>(
        conn: &C,
        post_id: &str,
    ) -> Result<bool, DbErr> {
        let changes = ActiveModel {
            status: Set(PostStatus::SentToClient),
            approval_status: Set(ApprovalStatus::AwaitingReview),
            approved_by: Set(None),
            approved_at: Set(None),
            ..Default::default()
        };

        let result = PostEntity::update_many()
            .set(changes)
            .filter(post::Column::Id.eq(post_id))
            .filter(post::Column::Status.ne(PostStatus::Published))
            .exec(conn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
