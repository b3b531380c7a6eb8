use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Serialize;

use crate::{
    core::{
        error::{bounded, CoreError, StoreCall},
        state::AppState,
    },
    middlewares::auth::Session,
    models::{social_account::Model as SocialAccount, workspace::Model as Workspace},
    repos::{social_accounts::SocialAccountsRepo, workspaces::WorkspacesRepo},
    services::scope::{scope, Selector},
    utils::response::APIError,
};

#[derive(Debug, Serialize)]
pub struct WorkspaceListResponse {
    workspaces: Vec<Workspace>,
}

#[derive(Debug, Serialize)]
pub struct SocialAccountListResponse {
    social_accounts: Vec<SocialAccount>,
}

pub async fn list_workspaces(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(selector): Query<Selector>,
) -> Result<Json<WorkspaceListResponse>, APIError> {
    let caps = &session.capabilities;
    let within = caps.workspace_restriction();
    if within.as_ref().is_some_and(|ids| ids.is_empty()) {
        return Ok(Json(WorkspaceListResponse { workspaces: vec![] }));
    }

    let repo = WorkspacesRepo::new(state.database.clone());
    let workspaces = bounded(state.store_timeout(), StoreCall::Read, async {
        repo.list(within, selector.workspace_id.as_deref())
            .await
            .map_err(CoreError::from_load)
    })
    .await?;

    Ok(Json(WorkspaceListResponse {
        workspaces: scope(workspaces, caps, &selector),
    }))
}

pub async fn list_social_accounts(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(selector): Query<Selector>,
) -> Result<Json<SocialAccountListResponse>, APIError> {
    let caps = &session.capabilities;
    let within = caps.workspace_restriction();
    if within.as_ref().is_some_and(|ids| ids.is_empty()) {
        return Ok(Json(SocialAccountListResponse {
            social_accounts: vec![],
        }));
    }

    let repo = SocialAccountsRepo::new(state.database.clone());
    let social_accounts = bounded(state.store_timeout(), StoreCall::Read, async {
        repo.list(within, &selector)
            .await
            .map_err(CoreError::from_load)
    })
    .await?;

    Ok(Json(SocialAccountListResponse {
        social_accounts: scope(social_accounts, caps, &selector),
    }))
}
