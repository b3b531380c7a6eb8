use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::models::workspace::{self, Entity as WorkspaceEntity, Model as Workspace};

pub struct WorkspacesRepo {
    db: DatabaseConnection,
}

impl WorkspacesRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// `within` restricts the query to the given ids; `None` means unrestricted.
    pub async fn list(
        &self,
        within: Option<Vec<String>>,
        workspace_id: Option<&str>,
    ) -> Result<Vec<Workspace>, DbErr> {
        let mut query = WorkspaceEntity::find();
        if let Some(ids) = within {
            query = query.filter(workspace::Column::Id.is_in(ids));
        }
        if let Some(id) = workspace_id {
            query = query.filter(workspace::Column::Id.eq(id));
        }

        query
            .order_by_asc(workspace::Column::Name)
            .order_by_asc(workspace::Column::Id)
            .all(&self.db)
            .await
    }
}
