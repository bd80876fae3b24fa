pub mod auth;
pub mod health;
pub mod matrix;
pub mod projects;
pub mod registry;
pub mod sessions;
