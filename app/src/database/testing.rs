//! In-memory SQLite store with the production migrations applied.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection,
};

use crate::models::{
    account::{self, GlobalRole},
    membership::{self, WorkspaceRole},
    post::{self, ApprovalStatus, PostStatus},
    social_account, workspace,
};

use super::connect::run_migrations;

pub async fn memory_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    // every pooled connection would otherwise open its own empty database
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.expect("connect sqlite");
    run_migrations(&db).await.expect("run migrations");
    db
}

pub async fn seed_account(db: &DatabaseConnection, id: &str, role: GlobalRole) -> account::Model {
    account::ActiveModel {
        id: Set(id.to_string()),
        email: Set(format!("{}@agency.test", id)),
        display_name: Set(id.to_uppercase()),
        global_role: Set(role),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .expect("seed account")
}

pub async fn seed_workspace(db: &DatabaseConnection, id: &str) -> workspace::Model {
    workspace::ActiveModel {
        id: Set(id.to_string()),
        name: Set(format!("Workspace {}", id)),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .expect("seed workspace")
}

pub async fn seed_membership(
    db: &DatabaseConnection,
    account_id: &str,
    workspace_id: &str,
    role: WorkspaceRole,
) -> membership::Model {
    membership::ActiveModel {
        id: Set(format!("{}:{}", account_id, workspace_id)),
        account_id: Set(account_id.to_string()),
        workspace_id: Set(workspace_id.to_string()),
        role: Set(role),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .expect("seed membership")
}

pub async fn seed_social_account(
    db: &DatabaseConnection,
    id: &str,
    workspace_id: &str,
    platform: &str,
) -> social_account::Model {
    social_account::ActiveModel {
        id: Set(id.to_string()),
        workspace_id: Set(workspace_id.to_string()),
        platform: Set(platform.to_string()),
        name: Set(format!("@{}", id)),
    }
    .insert(db)
    .await
    .expect("seed social account")
}

pub async fn seed_post(
    db: &DatabaseConnection,
    id: &str,
    workspace_id: &str,
    status: PostStatus,
) -> post::Model {
    post::ActiveModel {
        id: Set(id.to_string()),
        workspace_id: Set(workspace_id.to_string()),
        social_account_id: Set(None),
        platform: Set(None),
        status: Set(status),
        approval_status: Set(ApprovalStatus::AwaitingReview),
        approved_by: Set(None),
        approved_at: Set(None),
        order_index: Set(0),
        content: Set(None),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .expect("seed post")
}

/// An agency with one admin, one account manager, one approver and one
/// viewer, all scoped to workspace `w1`, plus a second workspace `w2`.
pub async fn seed_agency(db: &DatabaseConnection) {
    seed_account(db, "admin", GlobalRole::Admin).await;
    seed_account(db, "manager", GlobalRole::User).await;
    seed_account(db, "approver", GlobalRole::User).await;
    seed_account(db, "viewer", GlobalRole::User).await;
    seed_workspace(db, "w1").await;
    seed_workspace(db, "w2").await;
    seed_membership(db, "manager", "w1", WorkspaceRole::AccountManager).await;
    seed_membership(db, "approver", "w1", WorkspaceRole::ClientApprover).await;
    seed_membership(db, "viewer", "w1", WorkspaceRole::ClientViewer).await;
}
