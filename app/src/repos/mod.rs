pub mod accounts;
pub mod audit_logs;
pub mod comments;
pub mod memberships;
pub mod posts;
pub mod social_accounts;
pub mod workspaces;
