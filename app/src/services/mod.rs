pub mod approval;
pub mod audit;
pub mod directory;
pub mod roles;
pub mod scope;
