use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    core::state::AppState,
    handlers::posts::{
        approve_post, list_audit, list_comments, list_posts, request_changes, return_for_review,
    },
};

pub fn post_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_posts))
        .route("/:post_id/approve", post(approve_post))
        .route("/:post_id/request-changes", post(request_changes))
        .route("/:post_id/return-for-review", post(return_for_review))
        .route("/:post_id/comments", get(list_comments))
        .route("/:post_id/audit", get(list_audit))
}
