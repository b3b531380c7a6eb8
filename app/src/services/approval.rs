//! Review lifecycle of a post.
//!
//! ```text
//!   sent_to_client ──approve──────────▶ approved
//!   (awaiting review) ──request changes─▶ changes_requested
//!   approved / changes_requested ──return for review──▶ sent_to_client
//! ```
//!
//! This is the only writer of `approval_status`, `approved_by` and
//! `approved_at`. Each verdict is one transaction holding a conditional
//! UPDATE and its audit entry. Repeating the verdict a post already carries
//! succeeds without changing the post and is audited again. A conflicting
//! verdict on an already reviewed post fails with `InvalidState`.

use std::time::Duration;

use chrono::Utc;
use sea_orm::{prelude::DateTime, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    core::error::{bounded, CoreError, StoreCall},
    models::{
        audit_log::Model as AuditLog,
        comment::Model as Comment,
        post::{ApprovalStatus, Model as Post, PostStatus},
    },
    repos::{comments::CommentsRepo, posts::PostsRepo},
    services::{
        audit::{AuditAction, AuditEntry, AuditTrail, EntityType},
        roles::Capabilities,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    ChangesRequested,
}

impl Verdict {
    pub fn approval_status(&self) -> ApprovalStatus {
        match self {
            Self::Approved => ApprovalStatus::Approved,
            Self::ChangesRequested => ApprovalStatus::ChangesRequested,
        }
    }

    fn action(&self) -> AuditAction {
        match self {
            Self::Approved => AuditAction::Approved,
            Self::ChangesRequested => AuditAction::ChangesRequested,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Applied,
    /// The post already carried this verdict.
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub post: Post,
    pub transition: Transition,
    pub audit_entry: AuditLog,
    /// Reason comment, when one was requested and its append succeeded.
    pub comment: Option<Comment>,
}

/// What a review UI may offer for one post. Mirrors the preconditions of
/// `ApprovalService::submit`, so `Controls` is never shown for an action
/// that would fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewAffordance {
    Hidden,
    Controls,
    Approved {
        approved_by: Option<String>,
        approved_at: Option<DateTime>,
    },
    ChangesRequested,
}

pub fn review_affordance(post: &Post, caps: &Capabilities) -> ReviewAffordance {
    match post.approval_status {
        ApprovalStatus::Approved => ReviewAffordance::Approved {
            approved_by: post.approved_by.clone(),
            approved_at: post.approved_at,
        },
        ApprovalStatus::ChangesRequested => ReviewAffordance::ChangesRequested,
        ApprovalStatus::AwaitingReview
            if post.status == PostStatus::SentToClient && caps.can_approve(&post.workspace_id) =>
        {
            ReviewAffordance::Controls
        }
        ApprovalStatus::AwaitingReview => ReviewAffordance::Hidden,
    }
}

fn normalize_reason(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct ApprovalService {
    db: DatabaseConnection,
    timeout: Duration,
}

impl ApprovalService {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    pub async fn approve(
        &self,
        caps: &Capabilities,
        post_id: &str,
    ) -> Result<ApprovalOutcome, CoreError> {
        self.submit(caps, post_id, Verdict::Approved, None).await
    }

    pub async fn request_changes(
        &self,
        caps: &Capabilities,
        post_id: &str,
        reason: Option<&str>,
    ) -> Result<ApprovalOutcome, CoreError> {
        self.submit(caps, post_id, Verdict::ChangesRequested, reason)
            .await
    }

    /// Record a client verdict on a post.
    ///
    /// Fails with `Unauthorized` unless the caller can approve in the post's
    /// workspace, and with `InvalidState` unless the post is `sent_to_client`
    /// and either unreviewed or already carrying the same verdict. A reason
    /// is only used for `ChangesRequested`; after the verdict commits it is
    /// also appended as a client-visible comment on a best-effort basis.
    pub async fn submit(
        &self,
        caps: &Capabilities,
        post_id: &str,
        verdict: Verdict,
        reason: Option<&str>,
    ) -> Result<ApprovalOutcome, CoreError> {
        let post = self.load_post(post_id).await?;

        if !caps.can_approve(&post.workspace_id) {
            warn!(
                "Account {} may not review post {} in workspace {}",
                caps.account_id(),
                post.id,
                post.workspace_id
            );
            return Err(CoreError::Unauthorized);
        }

        let reason = match verdict {
            Verdict::Approved => None,
            Verdict::ChangesRequested => normalize_reason(reason),
        };

        let (post, transition, audit_entry) = bounded(
            self.timeout,
            StoreCall::Write,
            self.commit_verdict(&post, verdict, reason.as_deref(), caps.account_id()),
        )
        .await?;

        info!(
            "Post {} in workspace {} reviewed by {}: {} ({:?})",
            post.id,
            post.workspace_id,
            caps.account_id(),
            verdict.approval_status().as_str(),
            transition
        );

        let comment = match &reason {
            Some(reason) => self.append_reason(&post, reason, caps.account_id()).await,
            None => None,
        };

        Ok(ApprovalOutcome {
            post,
            transition,
            audit_entry,
            comment,
        })
    }

    async fn commit_verdict(
        &self,
        post: &Post,
        verdict: Verdict,
        reason: Option<&str>,
        actor: &str,
    ) -> Result<(Post, Transition, AuditLog), CoreError> {
        let txn = self.db.begin().await.map_err(CoreError::from_write)?;

        let (approved_by, approved_at) = match verdict {
            Verdict::Approved => (Some(actor.to_string()), Some(Utc::now().naive_utc())),
            Verdict::ChangesRequested => (None, None),
        };
        let applied = PostsRepo::record_verdict(
            &txn,
            &post.id,
            verdict.approval_status(),
            approved_by,
            approved_at,
        )
        .await
        .map_err(CoreError::from_write)?;

        let current = PostsRepo::find_in(&txn, &post.id)
            .await
            .map_err(CoreError::from_write)?;

        let transition = if applied {
            Transition::Applied
        } else if current.status == PostStatus::SentToClient
            && current.approval_status == verdict.approval_status()
        {
            Transition::Unchanged
        } else {
            txn.rollback().await.map_err(CoreError::from_write)?;
            return Err(CoreError::InvalidState(format!(
                "post {} is {:?} with approval status {}",
                current.id,
                current.status,
                current.approval_status.as_str()
            )));
        };

        let details = match verdict {
            Verdict::Approved => json!({ "approved_by": actor }),
            Verdict::ChangesRequested => json!({ "reason": reason, "requested_by": actor }),
        };
        let audit_entry = AuditTrail::append_within(
            &txn,
            AuditEntry {
                workspace_id: current.workspace_id.clone(),
                entity_type: EntityType::Post,
                entity_id: current.id.clone(),
                action: verdict.action(),
                details,
                acting_account_id: actor.to_string(),
            },
        )
        .await?;

        txn.commit().await.map_err(CoreError::from_write)?;

        Ok((current, transition, audit_entry))
    }

    /// Best effort: a failure here never undoes the verdict.
    async fn append_reason(&self, post: &Post, reason: &str, actor: &str) -> Option<Comment> {
        let repo = CommentsRepo::new(self.db.clone());
        let result = bounded(self.timeout, StoreCall::Write, async {
            repo.create(
                &post.id,
                &post.workspace_id,
                Some(actor.to_string()),
                format!("Changes requested: {}", reason),
                false,
            )
            .await
            .map_err(CoreError::from_write)
        })
        .await;

        match result {
            Ok(comment) => Some(comment),
            Err(err) => {
                warn!(
                    "Verdict on post {} committed but reason comment failed: {}",
                    post.id, err
                );
                None
            }
        }
    }

    /// Start a new review round: back to `sent_to_client` with the verdict
    /// cleared. Account managers of the workspace and admins only; published
    /// posts cannot be reopened.
    pub async fn return_for_review(
        &self,
        caps: &Capabilities,
        post_id: &str,
    ) -> Result<Post, CoreError> {
        let post = self.load_post(post_id).await?;

        if !caps.can_manage(&post.workspace_id) {
            warn!(
                "Account {} may not return post {} for review",
                caps.account_id(),
                post.id
            );
            return Err(CoreError::Unauthorized);
        }

        let post = bounded(
            self.timeout,
            StoreCall::Write,
            self.commit_reopen(&post.id, caps.account_id()),
        )
        .await?;

        info!(
            "Post {} in workspace {} returned for review by {}",
            post.id,
            post.workspace_id,
            caps.account_id()
        );
        Ok(post)
    }

    async fn commit_reopen(&self, post_id: &str, actor: &str) -> Result<Post, CoreError> {
        let txn = self.db.begin().await.map_err(CoreError::from_write)?;

        let before = PostsRepo::find_in(&txn, post_id)
            .await
            .map_err(CoreError::from_write)?;
        let reopened = PostsRepo::reopen_for_review(&txn, post_id)
            .await
            .map_err(CoreError::from_write)?;
        if !reopened {
            txn.rollback().await.map_err(CoreError::from_write)?;
            return Err(CoreError::InvalidState(format!(
                "post {} is {:?}",
                post_id, before.status
            )));
        }

        AuditTrail::append_within(
            &txn,
            AuditEntry {
                workspace_id: before.workspace_id.clone(),
                entity_type: EntityType::Post,
                entity_id: before.id.clone(),
                action: AuditAction::SentToClient,
                details: json!({
                    "sent_by": actor,
                    "previous_approval_status": before.approval_status.as_str(),
                }),
                acting_account_id: actor.to_string(),
            },
        )
        .await?;

        let after = PostsRepo::find_in(&txn, post_id)
            .await
            .map_err(CoreError::from_write)?;
        txn.commit().await.map_err(CoreError::from_write)?;

        Ok(after)
    }

    async fn load_post(&self, post_id: &str) -> Result<Post, CoreError> {
        let repo = PostsRepo::new(self.db.clone());
        bounded(self.timeout, StoreCall::Read, async {
            repo.get(post_id).await.map_err(CoreError::from_load)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::ConnectionTrait;
    use serde_json::Value;

    use super::*;
    use crate::{
        database::testing::{memory_db, seed_agency, seed_post},
        models::{account::GlobalRole, membership::WorkspaceRole},
        repos::{audit_logs::AuditLogsRepo, comments::CommentsRepo},
        services::{
            directory::{load_capabilities, StoreMembershipSource},
            roles::tests::membership,
        },
    };

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn setup() -> (DatabaseConnection, ApprovalService) {
        let db = memory_db().await;
        seed_agency(&db).await;
        seed_post(&db, "p1", "w1", PostStatus::SentToClient).await;
        let service = ApprovalService::new(db.clone(), TIMEOUT);
        (db, service)
    }

    async fn caps(db: &DatabaseConnection, account_id: &str) -> Capabilities {
        let source = StoreMembershipSource::new(db.clone(), TIMEOUT);
        load_capabilities(&source, account_id).await.unwrap()
    }

    async fn audit_for(db: &DatabaseConnection, post_id: &str) -> Vec<AuditLog> {
        AuditLogsRepo::new(db.clone())
            .get_for_entity("post", post_id)
            .await
            .unwrap()
    }

    async fn comments_for(db: &DatabaseConnection, post_id: &str) -> Vec<Comment> {
        CommentsRepo::new(db.clone())
            .get_for_post(post_id, true)
            .await
            .unwrap()
    }

    async fn post(db: &DatabaseConnection, post_id: &str) -> Post {
        PostsRepo::new(db.clone()).get(post_id).await.unwrap()
    }

    #[tokio::test]
    async fn test_approve_without_reason() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;

        let outcome = service.approve(&approver, "p1").await.unwrap();

        assert_eq!(outcome.transition, Transition::Applied);
        assert_eq!(outcome.post.approval_status, ApprovalStatus::Approved);
        assert_eq!(outcome.post.approved_by.as_deref(), Some("approver"));
        assert!(outcome.post.approved_at.is_some());
        assert!(outcome.comment.is_none());

        let audit = audit_for(&db, "p1").await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "approved");
        assert_eq!(audit[0].details, json!({ "approved_by": "approver" }));
        assert_eq!(audit[0].acting_account_id, "approver");
        assert!(comments_for(&db, "p1").await.is_empty());
    }

    #[tokio::test]
    async fn test_request_changes_with_reason_appends_comment() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;

        let outcome = service
            .request_changes(&approver, "p1", Some("fix the caption"))
            .await
            .unwrap();

        assert_eq!(outcome.post.approval_status, ApprovalStatus::ChangesRequested);
        assert!(outcome.post.approved_by.is_none());

        let audit = audit_for(&db, "p1").await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "changes_requested");
        assert_eq!(
            audit[0].details,
            json!({ "reason": "fix the caption", "requested_by": "approver" })
        );

        let comments = comments_for(&db, "p1").await;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "Changes requested: fix the caption");
        assert!(!comments[0].is_internal);
        assert_eq!(comments[0].workspace_id, "w1");
    }

    #[tokio::test]
    async fn test_blank_reason_adds_no_comment() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;

        let outcome = service
            .request_changes(&approver, "p1", Some("   "))
            .await
            .unwrap();

        assert!(outcome.comment.is_none());
        assert_eq!(audit_for(&db, "p1").await[0].details["reason"], Value::Null);
        assert!(comments_for(&db, "p1").await.is_empty());
    }

    #[tokio::test]
    async fn test_viewer_cannot_approve() {
        let (db, service) = setup().await;
        let viewer = caps(&db, "viewer").await;

        let err = service.approve(&viewer, "p1").await.unwrap_err();

        assert_eq!(err, CoreError::Unauthorized);
        assert_eq!(post(&db, "p1").await.approval_status, ApprovalStatus::AwaitingReview);
        assert!(audit_for(&db, "p1").await.is_empty());
    }

    #[tokio::test]
    async fn test_approver_cannot_review_other_workspace() {
        let (db, service) = setup().await;
        seed_post(&db, "p2", "w2", PostStatus::SentToClient).await;
        let approver = caps(&db, "approver").await;

        let err = service.approve(&approver, "p2").await.unwrap_err();
        assert_eq!(err, CoreError::Unauthorized);
    }

    #[tokio::test]
    async fn test_admin_approves_without_membership() {
        let (db, service) = setup().await;
        seed_post(&db, "p2", "w2", PostStatus::SentToClient).await;
        let admin = caps(&db, "admin").await;

        let outcome = service.approve(&admin, "p2").await.unwrap();
        assert_eq!(outcome.post.approval_status, ApprovalStatus::Approved);
        assert_eq!(outcome.audit_entry.workspace_id, "w2");
    }

    #[tokio::test]
    async fn test_repeat_approval_is_audited_but_unchanged() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;
        let admin = caps(&db, "admin").await;

        let first = service.approve(&approver, "p1").await.unwrap();
        let second = service.approve(&admin, "p1").await.unwrap();

        assert_eq!(second.transition, Transition::Unchanged);
        assert_eq!(second.post.approval_status, ApprovalStatus::Approved);
        // the original approver and timestamp stand
        assert_eq!(second.post.approved_by.as_deref(), Some("approver"));
        assert_eq!(second.post.approved_at, first.post.approved_at);
        assert_eq!(audit_for(&db, "p1").await.len(), 2);
    }

    #[tokio::test]
    async fn test_conflicting_verdict_is_invalid_state() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;

        service.approve(&approver, "p1").await.unwrap();
        let err = service
            .request_changes(&approver, "p1", Some("too late"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidState(_)));
        assert_eq!(post(&db, "p1").await.approval_status, ApprovalStatus::Approved);
        assert_eq!(audit_for(&db, "p1").await.len(), 1);
        assert!(comments_for(&db, "p1").await.is_empty());
    }

    #[tokio::test]
    async fn test_post_not_sent_to_client_is_invalid_state() {
        let (db, service) = setup().await;
        seed_post(&db, "draft", "w1", PostStatus::Draft).await;
        let approver = caps(&db, "approver").await;

        let err = service.approve(&approver, "draft").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        assert!(audit_for(&db, "draft").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;

        let err = service.approve(&approver, "nope").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_conflicting_verdicts_resolve_to_one() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;
        let admin = caps(&db, "admin").await;

        // the test pool has a single connection, so the two transactions run
        // back to back and the loser takes the conditional-update miss path
        let (approved, rejected) = tokio::join!(
            service.approve(&approver, "p1"),
            service.request_changes(&admin, "p1", Some("swap the image")),
        );

        let winner = match (&approved, &rejected) {
            (Ok(_), Err(CoreError::InvalidState(_))) => ApprovalStatus::Approved,
            (Err(CoreError::InvalidState(_)), Ok(_)) => ApprovalStatus::ChangesRequested,
            other => panic!("expected exactly one winner, got {:?}", other),
        };

        assert_eq!(post(&db, "p1").await.approval_status, winner);
        let audit = audit_for(&db, "p1").await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, winner.as_str());
    }

    #[tokio::test]
    async fn test_failed_audit_insert_rolls_back_verdict() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;
        db.execute_unprepared("DROP TABLE audit_logs").await.unwrap();

        let err = service.approve(&approver, "p1").await.unwrap_err();

        assert!(matches!(err, CoreError::WriteError(_)));
        let current = post(&db, "p1").await;
        assert_eq!(current.approval_status, ApprovalStatus::AwaitingReview);
        assert!(current.approved_by.is_none());
        assert!(current.approved_at.is_none());
    }

    #[tokio::test]
    async fn test_failed_reason_comment_keeps_verdict() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;
        db.execute_unprepared("DROP TABLE comments").await.unwrap();

        let outcome = service
            .request_changes(&approver, "p1", Some("fix the caption"))
            .await
            .unwrap();

        assert_eq!(outcome.transition, Transition::Applied);
        assert!(outcome.comment.is_none());
        assert_eq!(post(&db, "p1").await.approval_status, ApprovalStatus::ChangesRequested);

        let audit = audit_for(&db, "p1").await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].details["reason"], "fix the caption");
    }

    #[tokio::test]
    async fn test_every_record_stays_in_post_workspace() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;
        let manager = caps(&db, "manager").await;

        service.request_changes(&approver, "p1", Some("shorter")).await.unwrap();
        service.return_for_review(&manager, "p1").await.unwrap();
        service.approve(&approver, "p1").await.unwrap();

        let audit = audit_for(&db, "p1").await;
        assert_eq!(audit.len(), 3);
        assert!(audit.iter().all(|e| e.workspace_id == "w1"));
        assert!(comments_for(&db, "p1").await.iter().all(|c| c.workspace_id == "w1"));
    }

    #[tokio::test]
    async fn test_return_for_review_starts_new_round() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;
        let manager = caps(&db, "manager").await;

        service.approve(&approver, "p1").await.unwrap();
        let reopened = service.return_for_review(&manager, "p1").await.unwrap();

        assert_eq!(reopened.status, PostStatus::SentToClient);
        assert_eq!(reopened.approval_status, ApprovalStatus::AwaitingReview);
        assert!(reopened.approved_by.is_none());
        assert!(reopened.approved_at.is_none());

        let audit = audit_for(&db, "p1").await;
        assert_eq!(audit[1].action, "sent_to_client");
        assert_eq!(audit[1].details["previous_approval_status"], "approved");

        let outcome = service
            .request_changes(&approver, "p1", None)
            .await
            .unwrap();
        assert_eq!(outcome.transition, Transition::Applied);
    }

    #[tokio::test]
    async fn test_only_managers_return_for_review() {
        let (db, service) = setup().await;
        let approver = caps(&db, "approver").await;

        let err = service.return_for_review(&approver, "p1").await.unwrap_err();
        assert_eq!(err, CoreError::Unauthorized);
    }

    #[tokio::test]
    async fn test_published_post_is_not_reopened() {
        let (db, service) = setup().await;
        seed_post(&db, "live", "w1", PostStatus::Published).await;
        let manager = caps(&db, "manager").await;

        let err = service.return_for_review(&manager, "live").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        assert!(audit_for(&db, "live").await.is_empty());
    }

    fn sample_post(status: PostStatus, approval_status: ApprovalStatus) -> Post {
        Post {
            id: "p1".into(),
            workspace_id: "w1".into(),
            social_account_id: None,
            platform: None,
            status,
            approval_status,
            approved_by: Some("approver".into()),
            approved_at: None,
            order_index: 0,
            content: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_affordance_mirrors_preconditions() {
        let approver = Capabilities::resolve(
            "approver",
            GlobalRole::User,
            &[membership("approver", "w1", WorkspaceRole::ClientApprover)],
        );
        let viewer = Capabilities::resolve(
            "viewer",
            GlobalRole::User,
            &[membership("viewer", "w1", WorkspaceRole::ClientViewer)],
        );

        let awaiting = sample_post(PostStatus::SentToClient, ApprovalStatus::AwaitingReview);
        assert_eq!(review_affordance(&awaiting, &approver), ReviewAffordance::Controls);
        assert_eq!(review_affordance(&awaiting, &viewer), ReviewAffordance::Hidden);

        let draft = sample_post(PostStatus::Draft, ApprovalStatus::AwaitingReview);
        assert_eq!(review_affordance(&draft, &approver), ReviewAffordance::Hidden);

        let approved = sample_post(PostStatus::SentToClient, ApprovalStatus::Approved);
        assert_eq!(
            review_affordance(&approved, &viewer),
            ReviewAffordance::Approved {
                approved_by: Some("approver".into()),
                approved_at: None,
            }
        );

        let changes = sample_post(PostStatus::SentToClient, ApprovalStatus::ChangesRequested);
        assert_eq!(review_affordance(&changes, &approver), ReviewAffordance::ChangesRequested);
    }
}
