use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{
    core::state::AppState,
    handlers::workspaces::{list_social_accounts, list_workspaces},
};

pub fn workspace_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_workspaces))
}

pub fn social_account_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_social_accounts))
}
