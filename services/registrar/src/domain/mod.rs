pub mod backup;
pub mod repository;
pub mod types;
