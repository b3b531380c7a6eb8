use tokio::sync::watch;
use tracing::info;

use crate::utils::jwt::Claims;

/// The authenticated account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: String,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            account_id: claims.sub,
            email: claims.email,
        }
    }
}

/// One identity transition. `epoch` increases on every sign-in and sign-out,
/// so signing back in as the same account is still a distinct event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityEvent {
    pub epoch: u64,
    pub identity: Option<Identity>,
}

/// Holds the current identity and broadcasts every change to subscribers.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    current: watch::Sender<IdentityEvent>,
}

impl Default for IdentitySession {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentitySession {
    pub fn new() -> Self {
        let (current, _) = watch::channel(IdentityEvent::default());
        Self { current }
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().identity.clone()
    }

    pub fn epoch(&self) -> u64 {
        self.current.borrow().epoch
    }

    /// Subscribe to identity changes. The receiver starts out marked as seen.
    pub fn on_identity_change(&self) -> watch::Receiver<IdentityEvent> {
        self.current.subscribe()
    }

    pub fn sign_in(&self, identity: Identity) {
        info!("Identity changed to account {}", identity.account_id);
        self.current.send_modify(|event| {
            event.epoch += 1;
            event.identity = Some(identity);
        });
    }

    pub fn sign_out(&self) {
        self.current.send_modify(|event| {
            if let Some(identity) = event.identity.take() {
                info!("Account {} signed out", identity.account_id);
            }
            event.epoch += 1;
        });
    }
}
