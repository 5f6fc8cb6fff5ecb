//! Versioned JSON snapshot of the registrar store.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use registrar_core::serde::{option_to_rfc3339_ms, to_rfc3339_ms};
use registrar_domain::student::{GraduateDetails, StudentCategory};
use registrar_domain::user::UserRole;

use crate::domain::types::{
    GradeInput, NewStudent, Student, StudentData, UserRecord, stored_time,
};

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub version: &'static str,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub timestamp: DateTime<Utc>,
    pub data: SnapshotData,
}

#[derive(Debug, Serialize)]
pub struct SnapshotData {
    pub users: Vec<SnapshotUser>,
    pub students: Vec<SnapshotStudent>,
}

/// Full account row. `password` is the stored hash.
#[derive(Debug, Serialize)]
pub struct SnapshotUser {
    pub id: i32,
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub email: String,
    pub full_name: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "option_to_rfc3339_ms")]
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserRecord> for SnapshotUser {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password: user.password_hash,
            role: user.role,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

/// Student row with its grades. Unknown fields such as a legacy `password`
/// or per-grade `id`/`student_id` are ignored on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotStudent {
    pub id: i32,
    #[serde(default)]
    pub title: String,
    pub username: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub category: StudentCategory,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    pub owner_id: i32,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(flatten)]
    pub graduate: GraduateDetails,
    #[serde(default)]
    pub grades: Vec<SnapshotGrade>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotGrade {
    pub subject: String,
    pub grade: String,
}

impl From<Student> for SnapshotStudent {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            title: student.title,
            username: student.username,
            attachments: student.attachments,
            category: student.category,
            first_name: student.first_name,
            middle_name: student.middle_name,
            last_name: student.last_name,
            owner_id: student.owner_id,
            created_at: student.created_at,
            updated_at: student.updated_at,
            grade_level: student.grade_level,
            graduate: student.graduate,
            grades: student
                .grades
                .into_iter()
                .map(|g| SnapshotGrade {
                    subject: g.subject,
                    grade: g.grade,
                })
                .collect(),
        }
    }
}

impl SnapshotStudent {
    /// Insert request recreating this student under its original id and timestamps.
    pub fn into_new_student(self) -> NewStudent {
        NewStudent {
            id: Some(self.id),
            owner_id: self.owner_id,
            data: StudentData {
                username: self.username,
                first_name: self.first_name,
                middle_name: self.middle_name,
                last_name: self.last_name,
                category: self.category,
                attachments: self.attachments,
                grade_level: self.grade_level,
                graduate: self.graduate,
            }
            .normalized(),
            created_at: stored_time(self.created_at),
            updated_at: stored_time(self.updated_at),
            grades: self
                .grades
                .into_iter()
                .map(|g| GradeInput {
                    subject: g.subject,
                    grade: g.grade,
                })
                .collect(),
        }
    }
}

/// Body of `POST /restore`. Every level is optional so that a missing
/// section is reported as an invalid backup rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct RestoreRequest {
    pub version: Option<String>,
    pub data: Option<RestoreData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RestoreData {
    /// Accounts are never restored; only their presence is checked.
    pub users: Option<Vec<IgnoredAny>>,
    pub students: Option<Vec<SnapshotStudent>>,
}
