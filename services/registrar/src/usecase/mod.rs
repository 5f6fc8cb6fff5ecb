pub mod auth;
pub mod backup;
pub mod seed;
pub mod student;
pub mod upload;
pub mod user;
