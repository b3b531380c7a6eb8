use serde::Deserialize;

use crate::{
    models::{
        membership::Model as Membership, post::Model as Post,
        social_account::Model as SocialAccount, workspace::Model as Workspace,
    },
    services::roles::Capabilities,
};

/// Caller-chosen narrowing. Never widens beyond the caller's memberships.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Selector {
    pub workspace_id: Option<String>,
    pub platform: Option<String>,
    pub social_account_id: Option<String>,
}

/// Rows that belong to exactly one workspace.
///
/// Selector dimensions a row type does not carry are not applicable to it,
/// so the default `matches_*` implementations admit every value.
pub trait WorkspaceScoped {
    fn workspace_id(&self) -> &str;

    fn matches_platform(&self, _platform: &str) -> bool {
        true
    }

    fn matches_social_account(&self, _social_account_id: &str) -> bool {
        true
    }
}

impl WorkspaceScoped for Workspace {
    fn workspace_id(&self) -> &str {
        &self.id
    }
}

impl WorkspaceScoped for Membership {
    fn workspace_id(&self) -> &str {
        &self.workspace_id
    }
}

impl WorkspaceScoped for SocialAccount {
    fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    fn matches_platform(&self, platform: &str) -> bool {
        self.platform == platform
    }

    fn matches_social_account(&self, social_account_id: &str) -> bool {
        self.id == social_account_id
    }
}

impl WorkspaceScoped for Post {
    fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    fn matches_platform(&self, platform: &str) -> bool {
        self.platform.as_deref() == Some(platform)
    }

    fn matches_social_account(&self, social_account_id: &str) -> bool {
        self.social_account_id.as_deref() == Some(social_account_id)
    }
}

/// Whether one row is visible to the caller under the selector.
pub fn admits<T: WorkspaceScoped>(row: &T, caps: &Capabilities, selector: &Selector) -> bool {
    let workspace_id = row.workspace_id();

    if !caps.has_access_to_workspace(workspace_id) {
        return false;
    }
    if let Some(wanted) = &selector.workspace_id {
        if wanted != workspace_id {
            return false;
        }
    }
    if let Some(platform) = &selector.platform {
        if !row.matches_platform(platform) {
            return false;
        }
    }
    if let Some(social_account_id) = &selector.social_account_id {
        if !row.matches_social_account(social_account_id) {
            return false;
        }
    }

    true
}

/// Stable filter: keeps the input's relative order.
pub fn scope<T: WorkspaceScoped>(rows: Vec<T>, caps: &Capabilities, selector: &Selector) -> Vec<T> {
    rows.into_iter()
        .filter(|row| admits(row, caps, selector))
        .collect()
}
