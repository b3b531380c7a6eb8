pub mod me;
pub mod posts;
pub mod workspaces;
