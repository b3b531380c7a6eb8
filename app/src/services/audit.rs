use std::time::Duration;

use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde_json::Value;

use crate::{
    core::error::{bounded, CoreError, StoreCall},
    models::audit_log::Model as AuditLog,
    repos::audit_logs::{AuditLogsRepo, NewAuditLog},
    services::{roles::Capabilities, scope::WorkspaceScoped},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Post,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Approved,
    ChangesRequested,
    SentToClient,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::ChangesRequested => "changes_requested",
            Self::SentToClient => "sent_to_client",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub workspace_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: AuditAction,
    pub details: Value,
    pub acting_account_id: String,
}

impl From<AuditEntry> for NewAuditLog {
    fn from(entry: AuditEntry) -> Self {
        Self {
            workspace_id: entry.workspace_id,
            entity_type: entry.entity_type.as_str().to_string(),
            entity_id: entry.entity_id,
            action: entry.action.as_str().to_string(),
            details: entry.details,
            acting_account_id: entry.acting_account_id,
        }
    }
}

impl WorkspaceScoped for AuditLog {
    fn workspace_id(&self) -> &str {
        &self.workspace_id
    }
}

/// Append-only log of privileged actions, ordered by append time.
pub struct AuditTrail {
    db: DatabaseConnection,
    timeout: Duration,
}

impl AuditTrail {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    pub async fn append(&self, entry: AuditEntry) -> Result<AuditLog, CoreError> {
        let repo = AuditLogsRepo::new(self.db.clone());
        bounded(self.timeout, StoreCall::Write, async {
            repo.create(entry.into()).await.map_err(CoreError::from_write)
        })
        .await
    }

    /// Append as part of a caller-owned transaction, so the entry commits
    /// or rolls back together with the change it records.
    pub async fn append_within<C: ConnectionTrait>(
        conn: &C,
        entry: AuditEntry,
    ) -> Result<AuditLog, CoreError> {
        AuditLogsRepo::insert(conn, entry.into())
            .await
            .map_err(CoreError::from_write)
    }

    /// Entries for one entity the caller can see, in append order.
    pub async fn entries_for(
        &self,
        caps: &Capabilities,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Vec<AuditLog>, CoreError> {
        let repo = AuditLogsRepo::new(self.db.clone());
        let entries = bounded(self.timeout, StoreCall::Read, async {
            repo.get_for_entity(entity_type.as_str(), entity_id)
                .await
                .map_err(CoreError::from_load)
        })
        .await?;

        Ok(entries
            .into_iter()
            .filter(|entry| caps.has_access_to_workspace(entry.workspace_id()))
            .collect())
    }
}
