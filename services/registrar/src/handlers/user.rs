use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use registrar_domain::user::UserRole;

use crate::domain::types::{UserChanges, UserProfile};
use crate::error::RegistrarError;
use crate::state::AppState;
use crate::usecase::user::{
    ChangePasswordInput, ChangePasswordUseCase, CreateUserInput, CreateUserUseCase,
    DeleteUserUseCase, ListUsersUseCase, UpdateUserUseCase,
};

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub role: UserRole,
    pub email: String,
    pub full_name: String,
    #[serde(serialize_with = "registrar_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "registrar_core::serde::option_to_rfc3339_ms")]
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

// ── GET /users ───────────────────────────────────────────────────────────────

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, RegistrarError> {
    let usecase = ListUsersUseCase {
        repo: state.user_repo(),
    };
    let users = usecase.execute().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

// ── POST /users ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<UserRole>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), RegistrarError> {
    let usecase = CreateUserUseCase {
        repo: state.user_repo(),
        credentials: state.credentials(),
    };
    let user = usecase
        .execute(CreateUserInput {
            username: body.username,
            password: body.password,
            role: body.role,
            email: body.email,
            full_name: body.full_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── PUT /users/{id} ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub role: Option<UserRole>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, RegistrarError> {
    let usecase = UpdateUserUseCase {
        repo: state.user_repo(),
    };
    let user = usecase
        .execute(
            user_id,
            UserChanges {
                username: body.username,
                role: body.role,
                email: body.email,
                full_name: body.full_name,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

// ── DELETE /users/{id} ───────────────────────────────────────────────────────

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, RegistrarError> {
    let usecase = DeleteUserUseCase {
        repo: state.user_repo(),
    };
    usecase.execute(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PUT /users/{id}/password ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default, alias = "currentPassword")]
    pub current_password: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, RegistrarError> {
    let usecase = ChangePasswordUseCase {
        repo: state.user_repo(),
        credentials: state.credentials(),
    };
    usecase
        .execute(
            user_id,
            ChangePasswordInput {
                current_password: body.current_password,
                new_password: body.new_password,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
