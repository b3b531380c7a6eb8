//! Membership Directory: loads an account's profile and memberships and
//! keeps the resulting `Capabilities` in step with the identity session.
//!
//! Every identity change starts a new reload generation. The previous
//! in-flight reload is cancelled, the published snapshot drops back to
//! `Loading` straight away, and a finished load is only published if its
//! generation is still the latest one.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures_util::future::try_join;
use sea_orm::DatabaseConnection;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    core::{
        error::{bounded, CoreError, StoreCall},
        identity::{IdentityEvent, IdentitySession},
    },
    models::{account::GlobalRole, membership::Model as Membership},
    repos::{accounts::AccountsRepo, memberships::MembershipsRepo},
    services::roles::Capabilities,
};

/// Read side of the external store used to build capabilities.
#[async_trait]
pub trait MembershipSource: Send + Sync {
    /// Fails with `NotFound` when no profile row exists yet.
    async fn load_profile(&self, account_id: &str) -> Result<GlobalRole, CoreError>;

    async fn load_memberships(&self, account_id: &str) -> Result<Vec<Membership>, CoreError>;
}

pub struct StoreMembershipSource {
    db: DatabaseConnection,
    timeout: Duration,
}

impl StoreMembershipSource {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl MembershipSource for StoreMembershipSource {
    async fn load_profile(&self, account_id: &str) -> Result<GlobalRole, CoreError> {
        let repo = AccountsRepo::new(self.db.clone());
        bounded(self.timeout, StoreCall::Read, async {
            repo.get(account_id)
                .await
                .map(|account| account.global_role)
                .map_err(CoreError::from_load)
        })
        .await
    }

    async fn load_memberships(&self, account_id: &str) -> Result<Vec<Membership>, CoreError> {
        let repo = MembershipsRepo::new(self.db.clone());
        bounded(self.timeout, StoreCall::Read, async {
            repo.get_for_account(account_id)
                .await
                .map_err(CoreError::from_load)
        })
        .await
    }
}

/// Load profile and memberships concurrently and resolve capabilities.
pub async fn load_capabilities(
    source: &dyn MembershipSource,
    account_id: &str,
) -> Result<Capabilities, CoreError> {
    let (global_role, memberships) = try_join(
        source.load_profile(account_id),
        source.load_memberships(account_id),
    )
    .await?;

    Ok(Capabilities::resolve(account_id, global_role, &memberships))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryState {
    SignedOut,
    Loading,
    Ready(Arc<Capabilities>),
    Failed(CoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub generation: u64,
    /// Identity epoch this snapshot was loaded for.
    pub epoch: u64,
    pub account_id: Option<String>,
    pub state: DirectoryState,
}

#[derive(Default)]
struct Pending {
    event: IdentityEvent,
    cancel: Option<CancellationToken>,
}

struct Inner {
    source: Arc<dyn MembershipSource>,
    published: watch::Sender<DirectorySnapshot>,
    pending: Mutex<Pending>,
    identity: Option<watch::Receiver<IdentityEvent>>,
}

impl Inner {
    fn publish(&self, generation: u64, result: Result<Capabilities, CoreError>) {
        self.published.send_if_modified(|snapshot| {
            if snapshot.generation != generation {
                debug!(
                    "Dropping directory load {} superseded by {}",
                    generation, snapshot.generation
                );
                return false;
            }

            snapshot.state = match result {
                Ok(capabilities) => DirectoryState::Ready(Arc::new(capabilities)),
                Err(err) => {
                    warn!(
                        "Directory load failed for {:?}: {}",
                        snapshot.account_id, err
                    );
                    DirectoryState::Failed(err)
                }
            };
            true
        });
    }
}

#[derive(Clone)]
pub struct MembershipDirectory {
    inner: Arc<Inner>,
}

impl MembershipDirectory {
    /// A directory driven by explicit `reload` calls.
    pub fn new(source: Arc<dyn MembershipSource>) -> Self {
        Self::build(source, None)
    }

    fn build(
        source: Arc<dyn MembershipSource>,
        identity: Option<watch::Receiver<IdentityEvent>>,
    ) -> Self {
        let (published, _) = watch::channel(DirectorySnapshot {
            generation: 0,
            epoch: 0,
            account_id: None,
            state: DirectoryState::SignedOut,
        });

        Self {
            inner: Arc::new(Inner {
                source,
                published,
                pending: Mutex::new(Pending::default()),
                identity,
            }),
        }
    }

    /// Subscribe to the session and reload on every identity change.
    pub fn spawn(
        session: &IdentitySession,
        source: Arc<dyn MembershipSource>,
    ) -> (Self, JoinHandle<()>) {
        let mut changes = session.on_identity_change();
        let directory = Self::build(source, Some(session.on_identity_change()));
        let worker = directory.clone();

        let handle = tokio::spawn(async move {
            let initial = changes.borrow_and_update().clone();
            worker.reload(initial).await;

            while changes.changed().await.is_ok() {
                let event = changes.borrow_and_update().clone();
                worker.reload(event).await;
            }
            debug!("Identity session closed, directory worker exiting");
        });

        (directory, handle)
    }

    /// Start a new load generation for `event`, cancelling any in-flight one.
    /// Returns the new generation.
    pub async fn reload(&self, event: IdentityEvent) -> u64 {
        let mut pending = self.inner.pending.lock().await;
        if let Some(cancel) = pending.cancel.take() {
            cancel.cancel();
        }

        let generation = self.inner.published.borrow().generation + 1;
        let account_id = event.identity.as_ref().map(|i| i.account_id.clone());
        let state = if account_id.is_some() {
            DirectoryState::Loading
        } else {
            DirectoryState::SignedOut
        };
        self.inner.published.send_replace(DirectorySnapshot {
            generation,
            epoch: event.epoch,
            account_id: account_id.clone(),
            state,
        });
        pending.event = event;

        let Some(account_id) = account_id else {
            info!("Directory cleared after sign-out");
            return generation;
        };

        let cancel = CancellationToken::new();
        pending.cancel = Some(cancel.clone());
        let inner = self.inner.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Directory load {} for {} cancelled", generation, account_id);
                }
                result = load_capabilities(inner.source.as_ref(), &account_id) => {
                    inner.publish(generation, result);
                }
            }
        });

        generation
    }

    /// Reload for the current identity after a membership mutation.
    pub async fn refresh(&self) -> u64 {
        let event = self.inner.pending.lock().await.event.clone();
        self.reload(event).await
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        self.inner.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DirectorySnapshot> {
        self.inner.published.subscribe()
    }

    /// Capabilities that may be trusted right now: loaded, and loaded for
    /// the identity the session currently holds.
    pub fn capabilities(&self) -> Option<Arc<Capabilities>> {
        let snapshot = self.inner.published.borrow();

        if let Some(identity) = &self.inner.identity {
            if identity.borrow().epoch != snapshot.epoch {
                return None;
            }
        }

        match &snapshot.state {
            DirectoryState::Ready(capabilities) => Some(capabilities.clone()),
            _ => None,
        }
    }

    /// Wait for the current generation to settle.
    pub async fn ready(&self) -> Result<Arc<Capabilities>, CoreError> {
        let mut published = self.inner.published.subscribe();
        let snapshot = published
            .wait_for(|s| s.state != DirectoryState::Loading)
            .await
            .map_err(|_| CoreError::LoadError("directory closed".to_string()))?
            .clone();

        match snapshot.state {
            DirectoryState::Ready(capabilities) => Ok(capabilities),
            DirectoryState::Failed(err) => Err(err),
            DirectoryState::SignedOut | DirectoryState::Loading => Err(CoreError::Unauthorized),
        }
    }
}
