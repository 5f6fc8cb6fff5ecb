pub mod credential;
pub mod db;
pub mod file_store;
