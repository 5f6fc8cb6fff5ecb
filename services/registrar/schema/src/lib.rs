//! sea-orm entities for the registrar database.

pub mod grades;
pub mod students;
pub mod users;
