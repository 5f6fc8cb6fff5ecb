use chrono::Utc;

use registrar_domain::student::{GraduateDetails, StudentCategory};
use registrar_events::{EventBus, StudentChange};

use crate::domain::repository::StudentRepository;
use crate::domain::types::{
    GradeInput, NewStudent, Student, StudentData, StudentFilter, StudentNotice, StudentStats,
    StudentUpdate, next_updated_at, stored_time,
};
use crate::error::RegistrarError;

/// Client-supplied student fields, shared by create and update.
#[derive(Debug, Clone)]
pub struct StudentInput {
    pub username: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub category: StudentCategory,
    pub attachments: Vec<String>,
    pub grade_level: Option<String>,
    pub graduate: GraduateDetails,
    /// `Some` replaces the grade set; `None` leaves it as stored.
    pub grades: Option<Vec<GradeInput>>,
}

impl StudentInput {
    fn validate(self) -> Result<(StudentData, Option<Vec<GradeInput>>), RegistrarError> {
        for (field, value) in [
            ("username", &self.username),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.trim().is_empty() {
                return Err(RegistrarError::MissingField(field));
            }
        }
        let data = StudentData {
            username: self.username,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            category: self.category,
            attachments: self.attachments,
            grade_level: self.grade_level,
            graduate: self.graduate,
        }
        .normalized();
        Ok((data, self.grades))
    }
}

pub(crate) fn publish(
    events: &EventBus<StudentNotice>,
    change: StudentChange,
    notice: StudentNotice,
) {
    let report = events.trigger_student_change(change, &notice);
    tracing::debug!(
        event = change.event_name(),
        student_id = notice.student_id(),
        delivered = report.delivered,
        failed = report.failed,
        "student change published"
    );
}

// ── ListStudents ─────────────────────────────────────────────────────────────

pub struct ListStudentsUseCase<R: StudentRepository> {
    pub repo: R,
}

impl<R: StudentRepository> ListStudentsUseCase<R> {
    pub async fn execute(&self, filter: StudentFilter) -> Result<Vec<Student>, RegistrarError> {
        self.repo.list(&filter).await
    }
}

// ── GetStudent ───────────────────────────────────────────────────────────────

pub struct GetStudentUseCase<R: StudentRepository> {
    pub repo: R,
}

impl<R: StudentRepository> GetStudentUseCase<R> {
    pub async fn execute(&self, student_id: i32) -> Result<Student, RegistrarError> {
        self.repo
            .find_by_id(student_id)
            .await?
            .ok_or(RegistrarError::StudentNotFound)
    }
}

// ── StudentStats ─────────────────────────────────────────────────────────────

pub struct StudentStatsUseCase<R: StudentRepository> {
    pub repo: R,
}

impl<R: StudentRepository> StudentStatsUseCase<R> {
    pub async fn execute(&self, owner_id: Option<i32>) -> Result<StudentStats, RegistrarError> {
        let counts = self.repo.count_by_category(owner_id).await?;
        Ok(StudentStats::from_counts(counts))
    }
}

// ── CreateStudent ────────────────────────────────────────────────────────────

pub struct CreateStudentUseCase<R: StudentRepository> {
    pub repo: R,
    pub events: EventBus<StudentNotice>,
}

impl<R: StudentRepository> CreateStudentUseCase<R> {
    pub async fn execute(
        &self,
        owner_id: i32,
        input: StudentInput,
    ) -> Result<Student, RegistrarError> {
        let (data, grades) = input.validate()?;
        let now = stored_time(Utc::now());
        let student = self
            .repo
            .insert(&NewStudent {
                id: None,
                owner_id,
                data,
                created_at: now,
                updated_at: now,
                grades: grades.unwrap_or_default(),
            })
            .await?;
        publish(
            &self.events,
            StudentChange::Created,
            StudentNotice::Saved(student.clone()),
        );
        Ok(student)
    }
}

// ── UpdateStudent ────────────────────────────────────────────────────────────

pub struct UpdateStudentUseCase<R: StudentRepository> {
    pub repo: R,
    pub events: EventBus<StudentNotice>,
}

impl<R: StudentRepository> UpdateStudentUseCase<R> {
    pub async fn execute(
        &self,
        student_id: i32,
        input: StudentInput,
    ) -> Result<Student, RegistrarError> {
        let (data, grades) = input.validate()?;
        let current = self
            .repo
            .find_by_id(student_id)
            .await?
            .ok_or(RegistrarError::StudentNotFound)?;
        let update = StudentUpdate {
            data,
            updated_at: next_updated_at(current.updated_at, Utc::now()),
            grades,
        };
        let student = self
            .repo
            .update(student_id, &update)
            .await?
            .ok_or(RegistrarError::StudentNotFound)?;
        publish(
            &self.events,
            StudentChange::Updated,
            StudentNotice::Saved(student.clone()),
        );
        Ok(student)
    }
}

// ── DeleteStudent ────────────────────────────────────────────────────────────

pub struct DeleteStudentUseCase<R: StudentRepository> {
    pub repo: R,
    pub events: EventBus<StudentNotice>,
}

impl<R: StudentRepository> DeleteStudentUseCase<R> {
    pub async fn execute(&self, student_id: i32) -> Result<(), RegistrarError> {
        if !self.repo.delete(student_id).await? {
            return Err(RegistrarError::StudentNotFound);
        }
        publish(
            &self.events,
            StudentChange::Deleted,
            StudentNotice::Removed { id: student_id },
        );
        Ok(())
    }
}
