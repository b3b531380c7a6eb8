pub mod posts;
pub mod workspaces;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use crate::{
    core::state::AppState,
    handlers::me::get_me,
    middlewares::auth::require_auth,
    routes::{
        posts::post_routes,
        workspaces::{social_account_routes, workspace_routes},
    },
    utils::global_error_handler::global_error_handler,
};

pub fn create_routers(state: Arc<AppState>) -> Router<()> {
    let protected_routes = Router::new()
        .route("/me", get(get_me))
        .nest("/workspaces", workspace_routes())
        .nest("/social-accounts", social_account_routes())
        .nest("/posts", post_routes())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", protected_routes)
        .fallback(global_error_handler)
        .with_state(state)
}
