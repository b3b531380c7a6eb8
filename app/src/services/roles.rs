//! Effective capabilities of an account.
//!
//! `Capabilities` is a pure projection over an account's global role and its
//! workspace memberships. Two kinds of answers come out of it:
//!
//! - coarse booleans (`is_account_manager`, `is_client`,
//!   `primary_client_workspace`) that only decide whether a section of the
//!   UI exists at all;
//! - workspace-parameterized checks (`can_approve`, `can_manage`,
//!   `has_access_to_workspace`) that decide whether an action on one specific
//!   workspace may succeed.
//!
//! Authorization decisions must only ever use the second kind.

use serde::Serialize;

use crate::models::{
    account::GlobalRole,
    membership::{Model as Membership, WorkspaceRole},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub workspace_id: String,
    pub role: WorkspaceRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    account_id: String,
    global_role: GlobalRole,
    grants: Vec<Grant>,
}

impl Capabilities {
    /// Memberships keep their load order; `primary_client_workspace` depends on it.
    pub fn resolve(account_id: &str, global_role: GlobalRole, memberships: &[Membership]) -> Self {
        let grants = memberships
            .iter()
            .filter(|m| m.account_id == account_id)
            .map(|m| Grant {
                workspace_id: m.workspace_id.clone(),
                role: m.role,
            })
            .collect();

        Self {
            account_id: account_id.to_string(),
            global_role,
            grants,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn global_role(&self) -> GlobalRole {
        self.global_role
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    pub fn is_admin(&self) -> bool {
        self.global_role == GlobalRole::Admin
    }

    /// Navigation gating only.
    pub fn is_account_manager(&self) -> bool {
        self.is_admin()
            || self
                .grants
                .iter()
                .any(|g| g.role == WorkspaceRole::AccountManager)
    }

    /// Navigation gating only.
    pub fn is_client(&self) -> bool {
        self.grants.iter().any(|g| g.role.is_client())
    }

    /// Role held in one workspace, if any.
    pub fn workspace_role(&self, workspace_id: &str) -> Option<WorkspaceRole> {
        self.grants
            .iter()
            .find(|g| g.workspace_id == workspace_id)
            .map(|g| g.role)
    }

    pub fn can_approve(&self, workspace_id: &str) -> bool {
        self.is_admin() || self.workspace_role(workspace_id) == Some(WorkspaceRole::ClientApprover)
    }

    /// Account-manager actions on one workspace, e.g. returning a post for review.
    pub fn can_manage(&self, workspace_id: &str) -> bool {
        self.is_admin() || self.workspace_role(workspace_id) == Some(WorkspaceRole::AccountManager)
    }

    pub fn has_access_to_workspace(&self, workspace_id: &str) -> bool {
        self.is_admin() || self.grants.iter().any(|g| g.workspace_id == workspace_id)
    }

    /// Read access to one workspace's posts, comments and audit entries.
    pub fn can_view(&self, workspace_id: &str) -> bool {
        self.has_access_to_workspace(workspace_id)
    }

    /// Workspaces the account holds a membership in, in membership order.
    pub fn workspace_ids(&self) -> Vec<String> {
        self.grants.iter().map(|g| g.workspace_id.clone()).collect()
    }

    /// First client workspace in membership order. A UI default, never an
    /// authorization input: clients may belong to several workspaces.
    pub fn primary_client_workspace(&self) -> Option<&str> {
        if self.is_admin() {
            return None;
        }

        self.grants
            .iter()
            .find(|g| g.role.is_client())
            .map(|g| g.workspace_id.as_str())
    }

    /// Workspaces the caller is restricted to, or `None` for admins.
    pub fn workspace_restriction(&self) -> Option<Vec<String>> {
        if self.is_admin() {
            return None;
        }

        Some(self.workspace_ids())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Utc;

    use super::*;

    pub(crate) fn membership(account_id: &str, workspace_id: &str, role: WorkspaceRole) -> Membership {
        Membership {
            id: format!("{}:{}", account_id, workspace_id),
            account_id: account_id.to_string(),
            workspace_id: workspace_id.to_string(),
            role,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_admin_can_approve_any_workspace_without_memberships() {
        let caps = Capabilities::resolve("a1", GlobalRole::Admin, &[]);

        for workspace in ["w1", "w2", "anything"] {
            assert!(caps.can_approve(workspace));
            assert!(caps.can_manage(workspace));
            assert!(caps.has_access_to_workspace(workspace));
        }
        assert!(caps.is_account_manager());
        assert!(!caps.is_client());
        assert_eq!(caps.workspace_restriction(), None);
    }

    #[test]
    fn test_approver_is_scoped_to_their_workspace() {
        let memberships = vec![membership("a1", "w1", WorkspaceRole::ClientApprover)];
        let caps = Capabilities::resolve("a1", GlobalRole::User, &memberships);

        assert!(caps.can_approve("w1"));
        assert!(!caps.can_approve("w2"));
        assert!(!caps.can_manage("w1"));
        assert!(caps.is_client());
        assert!(!caps.is_account_manager());
    }

    #[test]
    fn test_no_memberships_has_no_access() {
        let caps = Capabilities::resolve("a1", GlobalRole::User, &[]);

        assert!(!caps.has_access_to_workspace("w1"));
        assert!(!caps.is_client());
        assert_eq!(caps.primary_client_workspace(), None);
        assert_eq!(caps.workspace_restriction(), Some(vec![]));
    }

    #[test]
    fn test_mixed_roles_are_evaluated_per_workspace() {
        let memberships = vec![
            membership("a1", "w1", WorkspaceRole::AccountManager),
            membership("a1", "w2", WorkspaceRole::ClientViewer),
            membership("a1", "w3", WorkspaceRole::ClientApprover),
        ];
        let caps = Capabilities::resolve("a1", GlobalRole::User, &memberships);

        // coarse flags see every role held anywhere
        assert!(caps.is_account_manager());
        assert!(caps.is_client());

        // managing w1 does not grant anything in w2
        assert!(caps.can_manage("w1"));
        assert!(!caps.can_manage("w2"));
        assert!(!caps.can_approve("w1"));
        assert!(!caps.can_approve("w2"));
        assert!(caps.can_approve("w3"));
        assert!(caps.can_view("w2"));
        assert!(!caps.can_view("w4"));
        assert_eq!(caps.primary_client_workspace(), Some("w2"));
        assert_eq!(caps.workspace_ids(), vec!["w1", "w2", "w3"]);
    }

    #[test]
    fn test_memberships_of_other_accounts_are_ignored() {
        let memberships = vec![membership("someone-else", "w1", WorkspaceRole::ClientApprover)];
        let caps = Capabilities::resolve("a1", GlobalRole::User, &memberships);

        assert!(!caps.can_approve("w1"));
        assert!(!caps.has_access_to_workspace("w1"));
    }

    #[test]
    fn test_admin_has_no_primary_client_workspace() {
        let memberships = vec![membership("a1", "w1", WorkspaceRole::ClientViewer)];
        let caps = Capabilities::resolve("a1", GlobalRole::Admin, &memberships);

        assert_eq!(caps.primary_client_workspace(), None);
    }
}
