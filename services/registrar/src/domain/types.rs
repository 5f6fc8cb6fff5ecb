use std::fmt;

use chrono::{DateTime, Duration, SubsecRound, Utc};

use registrar_domain::student::{GraduateDetails, StudentCategory, student_title};
use registrar_domain::user::UserRole;

/// Stored registrar account, including its credential hash.
///
/// Never leaves the service as-is; convert to [`UserProfile`] first.
#[derive(Clone)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("created_at", &self.created_at)
            .field("last_login", &self.last_login)
            .finish()
    }
}

/// Account as returned to clients: a [`UserRecord`] without its secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub role: UserRole,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            role: record.role,
            email: record.email,
            full_name: record.full_name,
            created_at: record.created_at,
            last_login: record.last_login,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub role: Option<UserRole>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.role.is_none()
            && self.email.is_none()
            && self.full_name.is_none()
    }

    /// Whether applying these changes would take admin rights away from `current`.
    pub fn demotes(&self, current: UserRole) -> bool {
        current.is_admin() && self.role.is_some_and(|role| !role.is_admin())
    }
}

/// Whether deleting or demoting `target` leaves no admin behind.
///
/// `admins` holds the ids of every admin row as read (and locked) in the same
/// transaction as the target.
pub fn removes_last_admin(admins: &[i32], target: i32, target_role: UserRole) -> bool {
    target_role.is_admin() && !admins.iter().any(|&id| id != target)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub id: i32,
    pub student_id: i32,
    pub subject: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeInput {
    pub subject: String,
    pub grade: String,
}

/// Student record with its grades, ordered by grade id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i32,
    pub title: String,
    pub username: String,
    pub attachments: Vec<String>,
    pub category: StudentCategory,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub grade_level: Option<String>,
    pub graduate: GraduateDetails,
    pub grades: Vec<Grade>,
}

/// Scalar columns written on every student create, update, and restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentData {
    pub username: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub category: StudentCategory,
    pub attachments: Vec<String>,
    pub grade_level: Option<String>,
    pub graduate: GraduateDetails,
}

impl StudentData {
    /// Apply the graduate-only field policy for the current category.
    pub fn normalized(mut self) -> Self {
        self.graduate = self.graduate.for_category(self.category);
        self
    }

    pub fn title(&self) -> String {
        student_title(&self.first_name, &self.last_name, &self.username)
    }
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    /// Explicit primary key; `None` lets the store assign one.
    pub id: Option<i32>,
    pub owner_id: i32,
    pub data: StudentData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub grades: Vec<GradeInput>,
}

#[derive(Debug, Clone)]
pub struct StudentUpdate {
    pub data: StudentData,
    pub updated_at: DateTime<Utc>,
    /// `Some` replaces the whole grade set; `None` keeps the stored grades.
    pub grades: Option<Vec<GradeInput>>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub owner_id: Option<i32>,
    pub category: Option<StudentCategory>,
    /// Case-insensitive substring over title, username, and names.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudentStats {
    pub total: u64,
    pub active: u64,
    pub graduate: u64,
    pub inactive: u64,
}

impl StudentStats {
    pub fn from_counts(counts: impl IntoIterator<Item = (StudentCategory, u64)>) -> Self {
        counts
            .into_iter()
            .fold(Self::default(), |mut stats, (category, n)| {
                stats.total += n;
                match category {
                    StudentCategory::Active => stats.active += n,
                    StudentCategory::Graduate => stats.graduate += n,
                    StudentCategory::Inactive => stats.inactive += n,
                }
                stats
            })
    }
}

/// Payload carried on the student notification bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentNotice {
    Saved(Student),
    Removed { id: i32 },
}

impl StudentNotice {
    pub fn student_id(&self) -> i32 {
        match self {
            Self::Saved(student) => student.id,
            Self::Removed { id } => *id,
        }
    }
}

/// Timestamps are stored and serialized at millisecond precision, so a value
/// read back from a backup equals the one that was written.
pub fn stored_time(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

/// Next `updated_at` for a record last written at `previous`: the current time,
/// bumped one millisecond past `previous` when the clock has not advanced.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = stored_time(previous) + Duration::milliseconds(1);
    let now = stored_time(now);
    if now < floor { floor } else { now }
}
