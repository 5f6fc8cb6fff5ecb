pub mod auth;
pub mod backup;
pub mod health;
pub mod student;
pub mod upload;
pub mod user;
