use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder,
};

use crate::models::audit_log::{self, ActiveModel, Entity as AuditLogEntity, Model as AuditLog};

/// Insert-only access to `audit_logs`.
pub struct AuditLogsRepo {
    db: DatabaseConnection,
}

pub struct NewAuditLog {
    pub workspace_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub details: serde_json::Value,
    pub acting_account_id: String,
}

impl AuditLogsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn insert<C: ConnectionTrait>(conn: &C, entry: NewAuditLog) -> Result<AuditLog, DbErr> {
        let row = ActiveModel {
            workspace_id: Set(entry.workspace_id),
            entity_type: Set(entry.entity_type),
            entity_id: Set(entry.entity_id),
            action: Set(entry.action),
            details: Set(entry.details),
            acting_account_id: Set(entry.acting_account_id),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        row.insert(conn).await
    }

    pub async fn create(&self, entry: NewAuditLog) -> Result<AuditLog, DbErr> {
        Self::insert(&self.db, entry).await
    }

    /// Entries for one entity in append order.
    pub async fn get_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditLog>, DbErr> {
        AuditLogEntity::find()
            .filter(audit_log::Column::EntityType.eq(entity_type))
            .filter(audit_log::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_log::Column::Id)
            .all(&self.db)
            .await
    }
}
