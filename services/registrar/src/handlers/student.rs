use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use registrar_domain::student::{GraduateDetails, StudentCategory};

use crate::domain::types::{Grade, GradeInput, Student, StudentFilter, StudentStats};
use crate::error::RegistrarError;
use crate::state::AppState;
use crate::usecase::student::{
    CreateStudentUseCase, DeleteStudentUseCase, GetStudentUseCase, ListStudentsUseCase,
    StudentInput, StudentStatsUseCase, UpdateStudentUseCase,
};

#[derive(Serialize)]
pub struct GradeResponse {
    pub id: i32,
    pub subject: String,
    pub grade: String,
    pub student_id: i32,
}

impl From<Grade> for GradeResponse {
    fn from(grade: Grade) -> Self {
        Self {
            id: grade.id,
            subject: grade.subject,
            grade: grade.grade,
            student_id: grade.student_id,
        }
    }
}

#[derive(Serialize)]
pub struct StudentResponse {
    pub id: i32,
    pub title: String,
    pub username: String,
    pub attachments: Vec<String>,
    pub category: StudentCategory,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub owner_id: i32,
    #[serde(serialize_with = "registrar_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "registrar_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub grade_level: Option<String>,
    #[serde(flatten)]
    pub graduate: GraduateDetails,
    pub grades: Vec<GradeResponse>,
}

impl From<Student> for StudentResponse {
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
            grades: student.grades.into_iter().map(GradeResponse::from).collect(),
        }
    }
}

#[derive(Deserialize)]
pub struct GradeRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grade: String,
}

/// Body of `POST /students` and `PUT /students/{id}`. Server-managed fields
/// (`id`, `title`, timestamps) are ignored when present.
#[derive(Deserialize)]
pub struct StudentRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub category: Option<StudentCategory>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(flatten)]
    pub graduate: GraduateDetails,
    #[serde(default)]
    pub grades: Option<Vec<GradeRequest>>,
    #[serde(default, alias = "ownerId")]
    pub owner_id: Option<i32>,
}

impl StudentRequest {
    fn into_input(self) -> StudentInput {
        StudentInput {
            username: self.username,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            category: self.category.unwrap_or(StudentCategory::Active),
            attachments: self.attachments,
            grade_level: self.grade_level,
            graduate: self.graduate,
            grades: self.grades.map(|grades| {
                grades
                    .into_iter()
                    .map(|g| GradeInput {
                        subject: g.subject,
                        grade: g.grade,
                    })
                    .collect()
            }),
        }
    }
}

// ── GET /students ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StudentListQuery {
    #[serde(alias = "ownerId")]
    pub owner_id: Option<i32>,
    pub search: Option<String>,
    /// A category name, or `All` for no filter.
    pub status: Option<String>,
}

pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Vec<StudentResponse>>, RegistrarError> {
    let category = match query.status.as_deref() {
        None | Some("") | Some("All") => None,
        Some(status) => match status.parse::<StudentCategory>() {
            Ok(category) => Some(category),
            // No stored student can carry an unknown category.
            Err(_) => return Ok(Json(Vec::new())),
        },
    };
    let usecase = ListStudentsUseCase {
        repo: state.student_repo(),
    };
    let students = usecase
        .execute(StudentFilter {
            owner_id: query.owner_id,
            category,
            search: query.search,
        })
        .await?;
    Ok(Json(students.into_iter().map(StudentResponse::from).collect()))
}

// ── GET /students/stats ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StudentStatsQuery {
    #[serde(alias = "ownerId")]
    pub owner_id: Option<i32>,
}

#[derive(Serialize)]
pub struct StudentStatsResponse {
    pub total: u64,
    #[serde(rename = "Active")]
    pub active: u64,
    #[serde(rename = "Graduate")]
    pub graduate: u64,
    #[serde(rename = "Inactive")]
    pub inactive: u64,
}

impl From<StudentStats> for StudentStatsResponse {
    fn from(stats: StudentStats) -> Self {
        Self {
            total: stats.total,
            active: stats.active,
            graduate: stats.graduate,
            inactive: stats.inactive,
        }
    }
}

pub async fn student_stats(
    State(state): State<AppState>,
    Query(query): Query<StudentStatsQuery>,
) -> Result<Json<StudentStatsResponse>, RegistrarError> {
    let usecase = StudentStatsUseCase {
        repo: state.student_repo(),
    };
    let stats = usecase.execute(query.owner_id).await?;
    Ok(Json(stats.into()))
}

// ── GET /students/{id} ───────────────────────────────────────────────────────

pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> Result<Json<StudentResponse>, RegistrarError> {
    let usecase = GetStudentUseCase {
        repo: state.student_repo(),
    };
    let student = usecase.execute(student_id).await?;
    Ok(Json(student.into()))
}

// ── POST /students ───────────────────────────────────────────────────────────

pub async fn create_student(
    State(state): State<AppState>,
    Json(body): Json<StudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), RegistrarError> {
    let owner_id = body
        .owner_id
        .ok_or(RegistrarError::MissingField("owner_id"))?;
    let usecase = CreateStudentUseCase {
        repo: state.student_repo(),
        events: state.student_events.clone(),
    };
    let student = usecase.execute(owner_id, body.into_input()).await?;
    Ok((StatusCode::CREATED, Json(student.into())))
}

// ── PUT /students/{id} ───────────────────────────────────────────────────────

pub async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
    Json(body): Json<StudentRequest>,
) -> Result<Json<StudentResponse>, RegistrarError> {
    let usecase = UpdateStudentUseCase {
        repo: state.student_repo(),
        events: state.student_events.clone(),
    };
    let student = usecase.execute(student_id, body.into_input()).await?;
    Ok(Json(student.into()))
}

// ── DELETE /students/{id} ────────────────────────────────────────────────────

pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> Result<StatusCode, RegistrarError> {
    let usecase = DeleteStudentUseCase {
        repo: state.student_repo(),
        events: state.student_events.clone(),
    };
    usecase.execute(student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
