pub mod global_error_handler;
pub mod ids;
pub mod jwt;
pub mod response;
