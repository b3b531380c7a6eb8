use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    models::social_account::{self, Entity as SocialAccountEntity, Model as SocialAccount},
    services::scope::Selector,
};

pub struct SocialAccountsRepo {
    db: DatabaseConnection,
}

impl SocialAccountsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        within: Option<Vec<String>>,
        selector: &Selector,
    ) -> Result<Vec<SocialAccount>, DbErr> {
        let mut query = SocialAccountEntity::find();
        if let Some(ids) = within {
            query = query.filter(social_account::Column::WorkspaceId.is_in(ids));
        }
        if let Some(workspace_id) = &selector.workspace_id {
            query = query.filter(social_account::Column::WorkspaceId.eq(workspace_id.as_str()));
        }
        if let Some(platform) = &selector.platform {
            query = query.filter(social_account::Column::Platform.eq(platform.as_str()));
        }
        if let Some(id) = &selector.social_account_id {
            query = query.filter(social_account::Column::Id.eq(id.as_str()));
        }

        query
            .order_by_asc(social_account::Column::Name)
            .order_by_asc(social_account::Column::Id)
            .all(&self.db)
            .await
    }
}
