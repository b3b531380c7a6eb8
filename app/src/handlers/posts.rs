use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    core::{
        error::{bounded, CoreError, StoreCall},
        state::AppState,
    },
    middlewares::auth::Session,
    models::{
        audit_log::Model as AuditLog, comment::Model as Comment, post::Model as Post,
    },
    repos::{comments::CommentsRepo, posts::PostsRepo},
    services::{
        approval::{review_affordance, ApprovalOutcome, ReviewAffordance},
        audit::EntityType,
        scope::{scope, Selector},
    },
    utils::response::APIError,
};

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    post: Post,
    review: ReviewAffordance,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    posts: Vec<PostView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestChangesRequest {
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    entries: Vec<AuditLog>,
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(selector): Query<Selector>,
) -> Result<Json<PostListResponse>, APIError> {
    let caps = &session.capabilities;
    let within = caps.workspace_restriction();
    if within.as_ref().is_some_and(|ids| ids.is_empty()) {
        return Ok(Json(PostListResponse { posts: vec![] }));
    }

    let repo = PostsRepo::new(state.database.clone());
    let posts = bounded(state.store_timeout(), StoreCall::Read, async {
        repo.list(within, &selector)
            .await
            .map_err(CoreError::from_load)
    })
    .await?;

    let posts = scope(posts, caps, &selector)
        .into_iter()
        .map(|post| PostView {
            review: review_affordance(&post, caps),
            post,
        })
        .collect();

    Ok(Json(PostListResponse { posts }))
}

pub async fn approve_post(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
) -> Result<Json<ApprovalOutcome>, APIError> {
    let outcome = state
        .approvals()
        .approve(&session.capabilities, &post_id)
        .await?;

    Ok(Json(outcome))
}

pub async fn request_changes(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
    body: Bytes,
) -> Result<Json<ApprovalOutcome>, APIError> {
    let payload = parse_request_changes(&body)?;

    let outcome = state
        .approvals()
        .request_changes(&session.capabilities, &post_id, payload.reason.as_deref())
        .await?;

    Ok(Json(outcome))
}

/// An empty body means no reason; any other body must be a valid payload.
fn parse_request_changes(body: &[u8]) -> Result<RequestChangesRequest, APIError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RequestChangesRequest::default());
    }

    let Json(payload) = Json::<RequestChangesRequest>::from_bytes(body).map_err(|rejection| {
        warn!("Rejected request changes payload: {}", rejection.body_text());
        APIError::BadRequest(rejection.body_text())
    })?;

    Ok(payload)
}

pub async fn return_for_review(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, APIError> {
    let post = state
        .approvals()
        .return_for_review(&session.capabilities, &post_id)
        .await?;

    Ok(Json(post))
}

async fn load_visible_post(
    state: &AppState,
    session: &Session,
    post_id: &str,
) -> Result<Post, CoreError> {
    let repo = PostsRepo::new(state.database.clone());
    let post = bounded(state.store_timeout(), StoreCall::Read, async {
        repo.get(post_id).await.map_err(CoreError::from_load)
    })
    .await?;

    // indistinguishable from a missing post
    if !session.capabilities.can_view(&post.workspace_id) {
        warn!(
            "Account {} has no access to post {}",
            session.account.id, post.id
        );
        return Err(CoreError::NotFound(format!("post {}", post_id)));
    }

    Ok(post)
}

/// Internal comments are only listed to managers of the post's workspace.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
) -> Result<Json<CommentListResponse>, APIError> {
    let post = load_visible_post(&state, &session, &post_id).await?;
    let include_internal = session.capabilities.can_manage(&post.workspace_id);

    let repo = CommentsRepo::new(state.database.clone());
    let comments = bounded(state.store_timeout(), StoreCall::Read, async {
        repo.get_for_post(&post.id, include_internal)
            .await
            .map_err(CoreError::from_load)
    })
    .await?;

    Ok(Json(CommentListResponse { comments }))
}

pub async fn list_audit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
) -> Result<Json<AuditListResponse>, APIError> {
    let post = load_visible_post(&state, &session, &post_id).await?;

    let entries = state
        .audit_trail()
        .entries_for(&session.capabilities, EntityType::Post, &post.id)
        .await?;

    Ok(Json(AuditListResponse { entries }))
}
