pub mod auth;
pub mod paths;
