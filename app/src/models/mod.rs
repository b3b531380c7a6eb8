pub mod account;
pub mod audit_log;
pub mod comment;
pub mod membership;
pub mod post;
pub mod social_account;
pub mod workspace;
