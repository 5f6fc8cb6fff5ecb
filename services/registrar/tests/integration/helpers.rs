use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};

use registrar::domain::repository::{
    CredentialStore, FileStore, StudentRepository, UserRepository,
};
use registrar::domain::types::{
    Grade, GradeInput, NewStudent, NewUser, Student, StudentData, StudentFilter, StudentNotice,
    StudentUpdate, UserChanges, UserRecord, removes_last_admin,
};
use registrar::error::RegistrarError;
use registrar_domain::student::{GraduateDetails, StudentCategory};
use registrar_domain::user::UserRole;
use registrar_events::{EventBus, StudentChange};

// ── MockUserRepo ─────────────────────────────────────────────────────────────

pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<UserRecord>>>,
    pub fail_touch_last_login: bool,
}

impl MockUserRepo {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
            fail_touch_last_login: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns a shared handle to the internal user list for post-execution inspection.
    pub fn users_handle(&self) -> Arc<Mutex<Vec<UserRecord>>> {
        Arc::clone(&self.users)
    }
}

impl UserRepository for MockUserRepo {
    async fn list(&self) -> Result<Vec<UserRecord>, RegistrarError> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, RegistrarError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RegistrarError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<UserRecord, RegistrarError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(RegistrarError::UsernameTaken);
        }
        let record = UserRecord {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            created_at: user.created_at,
            last_login: None,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<UserRecord, RegistrarError> {
        let mut users = self.users.lock().unwrap();
        let admins = admin_ids(&users);
        if let Some(ref username) = changes.username {
            if users.iter().any(|u| u.id != id && &u.username == username) {
                return Err(RegistrarError::UsernameTaken);
            }
        }
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RegistrarError::UserNotFound)?;
        if changes.demotes(user.role) && removes_last_admin(&admins, id, user.role) {
            return Err(RegistrarError::LastAdmin);
        }
        if let Some(ref username) = changes.username {
            user.username = username.clone();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(ref email) = changes.email {
            user.email = email.clone();
        }
        if let Some(ref full_name) = changes.full_name {
            user.full_name = full_name.clone();
        }
        Ok(user.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), RegistrarError> {
        let mut users = self.users.lock().unwrap();
        let target = users
            .iter()
            .find(|u| u.id == id)
            .ok_or(RegistrarError::UserNotFound)?;
        if removes_last_admin(&admin_ids(&users), id, target.role) {
            return Err(RegistrarError::LastAdmin);
        }
        users.retain(|u| u.id != id);
        Ok(())
    }

    async fn set_password_hash(&self, id: i32, hash: &str) -> Result<bool, RegistrarError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = hash.to_owned();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), RegistrarError> {
        if self.fail_touch_last_login {
            return Err(RegistrarError::Internal(anyhow::anyhow!("connection reset")));
        }
        if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

fn admin_ids(users: &[UserRecord]) -> Vec<i32> {
    users
        .iter()
        .filter(|u| u.role.is_admin())
        .map(|u| u.id)
        .collect()
}

// ── MockStudentRepo ──────────────────────────────────────────────────────────

#[derive(Default)]
struct StudentTable {
    students: Vec<Student>,
    next_id: i32,
    next_grade_id: i32,
    insert_calls: usize,
    sequence_syncs: usize,
}

/// In-memory student store emulating an auto-increment id sequence that is
/// not advanced by inserts carrying an explicit id.
pub struct MockStudentRepo {
    table: Arc<Mutex<StudentTable>>,
    /// Zero-based `insert` call that fails.
    pub fail_insert_at: Option<usize>,
}

impl MockStudentRepo {
    pub fn new(students: Vec<Student>) -> Self {
        let next_grade_id = students
            .iter()
            .flat_map(|s| s.grades.iter().map(|g| g.id))
            .max()
            .unwrap_or(0)
            + 1;
        let next_id = students.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        Self {
            table: Arc::new(Mutex::new(StudentTable {
                students,
                next_id,
                next_grade_id,
                ..Default::default()
            })),
            fail_insert_at: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_insert_at = Some(call);
        self
    }

    pub fn share(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            fail_insert_at: self.fail_insert_at,
        }
    }

    pub fn snapshot(&self) -> Vec<Student> {
        let mut students = self.table.lock().unwrap().students.clone();
        students.sort_by_key(|s| s.id);
        students
    }

    pub fn sequence_syncs(&self) -> usize {
        self.table.lock().unwrap().sequence_syncs
    }
}

fn build_grades(table: &mut StudentTable, student_id: i32, inputs: &[GradeInput]) -> Vec<Grade> {
    inputs
        .iter()
        .map(|g| {
            let id = table.next_grade_id;
            table.next_grade_id += 1;
            Grade {
                id,
                student_id,
                subject: g.subject.clone(),
                grade: g.grade.clone(),
            }
        })
        .collect()
}

fn apply_data(student: &mut Student, data: &StudentData) {
    student.title = data.title();
    student.username = data.username.clone();
    student.first_name = data.first_name.clone();
    student.middle_name = data.middle_name.clone();
    student.last_name = data.last_name.clone();
    student.category = data.category;
    student.attachments = data.attachments.clone();
    student.grade_level = data.grade_level.clone();
    student.graduate = data.graduate.clone();
}

impl StudentRepository for MockStudentRepo {
    async fn list(&self, filter: &StudentFilter) -> Result<Vec<Student>, RegistrarError> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut students: Vec<Student> = self
            .table
            .lock()
            .unwrap()
            .students
            .iter()
            .filter(|s| filter.owner_id.is_none_or(|owner| s.owner_id == owner))
            .filter(|s| filter.category.is_none_or(|c| s.category == c))
            .filter(|s| {
                search.as_deref().is_none_or(|needle| {
                    [&s.title, &s.username, &s.first_name, &s.last_name]
                        .iter()
                        .any(|v| v.to_lowercase().contains(needle))
                })
            })
            .cloned()
            .collect();
        students.sort_by_key(|s| std::cmp::Reverse(s.id));
        Ok(students)
    }

    async fn list_all(&self) -> Result<Vec<Student>, RegistrarError> {
        Ok(self.snapshot())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Student>, RegistrarError> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn insert(&self, new: &NewStudent) -> Result<Student, RegistrarError> {
        let mut table = self.table.lock().unwrap();
        let call = table.insert_calls;
        table.insert_calls += 1;
        if self.fail_insert_at == Some(call) {
            return Err(RegistrarError::Internal(anyhow::anyhow!(
                "insert student: connection reset"
            )));
        }
        let id = match new.id {
            Some(id) => id,
            None => {
                let id = table.next_id;
                table.next_id += 1;
                id
            }
        };
        if table.students.iter().any(|s| s.id == id) {
            return Err(RegistrarError::Internal(anyhow::anyhow!(
                "duplicate key value violates unique constraint \"students_pkey\""
            )));
        }
        let grades = build_grades(&mut table, id, &new.grades);
        let mut student = Student {
            id,
            title: String::new(),
            username: String::new(),
            attachments: vec![],
            category: new.data.category,
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
            owner_id: new.owner_id,
            created_at: new.created_at,
            updated_at: new.updated_at,
            grade_level: None,
            graduate: GraduateDetails::default(),
            grades,
        };
        apply_data(&mut student, &new.data);
        table.students.push(student.clone());
        Ok(student)
    }

    async fn update(
        &self,
        id: i32,
        update: &StudentUpdate,
    ) -> Result<Option<Student>, RegistrarError> {
        let mut table = self.table.lock().unwrap();
        let replacement = update
            .grades
            .as_ref()
            .map(|inputs| build_grades(&mut table, id, inputs));
        let Some(student) = table.students.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        apply_data(student, &update.data);
        student.updated_at = update.updated_at;
        if let Some(grades) = replacement {
            student.grades = grades;
        }
        Ok(Some(student.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, RegistrarError> {
        let mut table = self.table.lock().unwrap();
        let before = table.students.len();
        table.students.retain(|s| s.id != id);
        Ok(table.students.len() < before)
    }

    async fn delete_all(&self) -> Result<Vec<i32>, RegistrarError> {
        let mut table = self.table.lock().unwrap();
        let mut ids: Vec<i32> = table.students.drain(..).map(|s| s.id).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn count_by_category(
        &self,
        owner_id: Option<i32>,
    ) -> Result<Vec<(StudentCategory, u64)>, RegistrarError> {
        let table = self.table.lock().unwrap();
        Ok(StudentCategory::ALL
            .into_iter()
            .map(|category| {
                let n = table
                    .students
                    .iter()
                    .filter(|s| s.category == category)
                    .filter(|s| owner_id.is_none_or(|owner| s.owner_id == owner))
                    .count() as u64;
                (category, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect())
    }

    async fn sync_id_sequence(&self) -> Result<(), RegistrarError> {
        let mut table = self.table.lock().unwrap();
        table.next_id = table.students.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        table.sequence_syncs += 1;
        Ok(())
    }
}

// ── FakeCredentialStore ──────────────────────────────────────────────────────

/// Reversible stand-in for bcrypt: `hash("x") == "hashed:x"`.
#[derive(Clone, Copy, Default)]
pub struct FakeCredentialStore;

impl CredentialStore for FakeCredentialStore {
    async fn hash(&self, plaintext: &str) -> Result<String, RegistrarError> {
        Ok(format!("hashed:{plaintext}"))
    }

    async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, RegistrarError> {
        Ok(hash == format!("hashed:{plaintext}"))
    }
}

// ── MockFileStore ────────────────────────────────────────────────────────────

pub struct MockFileStore {
    pub stored: Arc<Mutex<Vec<(String, Bytes)>>>,
    /// Zero-based `store` call that fails.
    pub fail_at: Option<usize>,
}

impl MockFileStore {
    pub fn new() -> Self {
        Self {
            stored: Arc::new(Mutex::new(vec![])),
            fail_at: None,
        }
    }

    pub fn stored_handle(&self) -> Arc<Mutex<Vec<(String, Bytes)>>> {
        Arc::clone(&self.stored)
    }
}

impl FileStore for MockFileStore {
    async fn store(&self, file_name: &str, bytes: Bytes) -> Result<String, RegistrarError> {
        let mut stored = self.stored.lock().unwrap();
        if self.fail_at == Some(stored.len()) {
            return Err(RegistrarError::Internal(anyhow::anyhow!("disk full")));
        }
        stored.push((file_name.to_owned(), bytes));
        Ok(format!("/uploads/{}-{file_name}", stored.len()))
    }
}

// ── Event recording ──────────────────────────────────────────────────────────

pub type EventLog = Arc<Mutex<Vec<(StudentChange, StudentNotice)>>>;

/// A bus with one subscriber that records every student change.
pub fn recording_bus() -> (EventBus<StudentNotice>, EventLog) {
    let bus = EventBus::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    bus.on_student_change(move |change, notice: &StudentNotice| {
        sink.lock().unwrap().push((change, notice.clone()));
        Ok(())
    })
    .detach();
    (bus, log)
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, 8, 0, 0).unwrap()
}

pub fn test_user(id: i32, username: &str, role: UserRole) -> UserRecord {
    UserRecord {
        id,
        username: username.to_owned(),
        password_hash: format!("hashed:{username}-pass"),
        role,
        email: format!("{username}@school.edu"),
        full_name: username.to_uppercase(),
        created_at: at(1),
        last_login: None,
    }
}

pub fn test_student(id: i32, username: &str, first: &str, last: &str) -> Student {
    let data = StudentData {
        username: username.to_owned(),
        first_name: first.to_owned(),
        middle_name: String::new(),
        last_name: last.to_owned(),
        category: StudentCategory::Active,
        attachments: vec![],
        grade_level: None,
        graduate: GraduateDetails::default(),
    };
    Student {
        id,
        title: data.title(),
        username: data.username,
        attachments: data.attachments,
        category: data.category,
        first_name: data.first_name,
        middle_name: data.middle_name,
        last_name: data.last_name,
        owner_id: 1,
        created_at: at(2),
        updated_at: at(2),
        grade_level: None,
        graduate: GraduateDetails::default(),
        grades: vec![],
    }
}

pub fn grade(subject: &str, value: &str) -> GradeInput {
    GradeInput {
        subject: subject.to_owned(),
        grade: value.to_owned(),
    }
}
