use axum::{Extension, Json};
use serde::Serialize;

use crate::{
    middlewares::auth::Session, models::account::Model as Account, services::roles::Grant,
};

/// Navigation payload. The flags here gate UI sections only; every action
/// is re-authorized against its workspace.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub account: Account,
    pub is_admin: bool,
    pub is_account_manager: bool,
    pub is_client: bool,
    pub primary_client_workspace: Option<String>,
    pub memberships: Vec<Grant>,
}

pub async fn get_me(Extension(session): Extension<Session>) -> Json<MeResponse> {
    let caps = &session.capabilities;

    Json(MeResponse {
        is_admin: caps.is_admin(),
        is_account_manager: caps.is_account_manager(),
        is_client: caps.is_client(),
        primary_client_workspace: caps.primary_client_workspace().map(str::to_string),
        memberships: caps.grants().to_vec(),
        account: session.account,
    })
}
