use std::collections::HashMap;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, Condition,
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr, Statement, TransactionError, TransactionTrait,
    sea_query::{Expr, Func},
};

use registrar_domain::student::{GraduateDetails, StudentCategory};
use registrar_domain::user::UserRole;
use registrar_schema::{grades, students, users};

use crate::domain::repository::{StudentRepository, UserRepository};
use crate::domain::types::{
    Grade, GradeInput, NewStudent, NewUser, Student, StudentData, StudentFilter, StudentUpdate,
    UserChanges, UserRecord, removes_last_admin,
};
use crate::error::RegistrarError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn list(&self) -> Result<Vec<UserRecord>, RegistrarError> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .context("list users")?;
        let records = models
            .into_iter()
            .map(user_from_model)
            .collect::<anyhow::Result<_>>()?;
        Ok(records)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, RegistrarError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model).transpose()?)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RegistrarError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?;
        Ok(model.map(user_from_model).transpose()?)
    }

    async fn create(&self, user: &NewUser) -> Result<UserRecord, RegistrarError> {
        let model = users::ActiveModel {
            id: NotSet,
            username: Set(user.username.clone()),
            password: Set(user.password_hash.clone()),
            role: Set(user.role.as_str().to_owned()),
            email: Set(user.email.clone()),
            full_name: Set(user.full_name.clone()),
            created_at: Set(user.created_at),
            last_login: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_violation_or(e, "create user"))?;
        Ok(user_from_model(model)?)
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<UserRecord, RegistrarError> {
        let changes = changes.clone();
        self.db
            .transaction::<_, UserRecord, RegistrarError>(|txn| {
                Box::pin(async move {
                    let admins = if changes.role.is_some() {
                        lock_admins(txn).await?
                    } else {
                        Vec::new()
                    };
                    let current = users::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .context("find user for update")?
                        .ok_or(RegistrarError::UserNotFound)?;
                    let role = parse_role(&current.role)?;
                    if changes.demotes(role) && removes_last_admin(&admins, id, role) {
                        return Err(RegistrarError::LastAdmin);
                    }

                    let mut am: users::ActiveModel = current.into();
                    if let Some(username) = changes.username {
                        am.username = Set(username);
                    }
                    if let Some(role) = changes.role {
                        am.role = Set(role.as_str().to_owned());
                    }
                    if let Some(email) = changes.email {
                        am.email = Set(email);
                    }
                    if let Some(full_name) = changes.full_name {
                        am.full_name = Set(full_name);
                    }
                    let model = am
                        .update(txn)
                        .await
                        .map_err(|e| unique_violation_or(e, "update user"))?;
                    Ok(user_from_model(model)?)
                })
            })
            .await
            .map_err(|e| from_transaction(e, "update user transaction"))
    }

    async fn delete(&self, id: i32) -> Result<(), RegistrarError> {
        self.db
            .transaction::<_, (), RegistrarError>(|txn| {
                Box::pin(async move {
                    let admins = lock_admins(txn).await?;
                    let target = users::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .context("find user for delete")?
                        .ok_or(RegistrarError::UserNotFound)?;
                    if removes_last_admin(&admins, id, parse_role(&target.role)?) {
                        return Err(RegistrarError::LastAdmin);
                    }
                    users::Entity::delete_by_id(id)
                        .exec(txn)
                        .await
                        .context("delete user")?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| from_transaction(e, "delete user transaction"))
    }

    async fn set_password_hash(&self, id: i32, hash: &str) -> Result<bool, RegistrarError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Password, Expr::value(hash))
            .filter(users::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("set password hash")?;
        Ok(result.rows_affected > 0)
    }

    async fn touch_last_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), RegistrarError> {
        users::Entity::update_many()
            .col_expr(users::Column::LastLogin, Expr::value(at))
            .filter(users::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("touch last login")?;
        Ok(())
    }
}

/// `SELECT ... FOR UPDATE` over every admin row. Concurrent demotions and
/// deletions queue here, so at most one of them can remove the last admin.
async fn lock_admins(txn: &DatabaseTransaction) -> Result<Vec<i32>, RegistrarError> {
    let admins = users::Entity::find()
        .filter(users::Column::Role.eq(UserRole::Admin.as_str()))
        .order_by_asc(users::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await
        .context("lock admin rows")?;
    Ok(admins.into_iter().map(|admin| admin.id).collect())
}

fn parse_role(role: &str) -> anyhow::Result<UserRole> {
    role.parse().context("stored user role")
}

fn user_from_model(model: users::Model) -> anyhow::Result<UserRecord> {
    Ok(UserRecord {
        role: parse_role(&model.role)?,
        id: model.id,
        username: model.username,
        password_hash: model.password,
        email: model.email,
        full_name: model.full_name,
        created_at: model.created_at,
        last_login: model.last_login,
    })
}

fn unique_violation_or(err: DbErr, context: &'static str) -> RegistrarError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RegistrarError::UsernameTaken,
        _ => anyhow::Error::new(err).context(context).into(),
    }
}

fn missing_owner_or(err: DbErr, context: &'static str) -> RegistrarError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => RegistrarError::UserNotFound,
        _ => anyhow::Error::new(err).context(context).into(),
    }
}

fn from_transaction(err: TransactionError<RegistrarError>, context: &'static str) -> RegistrarError {
    match err {
        TransactionError::Connection(e) => anyhow::Error::new(e).context(context).into(),
        TransactionError::Transaction(e) => e,
    }
}

// ── Student repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbStudentRepository {
    pub db: DatabaseConnection,
}

impl StudentRepository for DbStudentRepository {
    async fn list(&self, filter: &StudentFilter) -> Result<Vec<Student>, RegistrarError> {
        let mut query = students::Entity::find().order_by_desc(students::Column::Id);
        if let Some(owner_id) = filter.owner_id {
            query = query.filter(students::Column::OwnerId.eq(owner_id));
        }
        if let Some(category) = filter.category {
            query = query.filter(students::Column::Category.eq(category.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                query = query.filter(search_condition(search));
            }
        }
        let models = query.all(&self.db).await.context("list students")?;
        with_grades(&self.db, models).await
    }

    async fn list_all(&self) -> Result<Vec<Student>, RegistrarError> {
        let models = students::Entity::find()
            .order_by_asc(students::Column::Id)
            .all(&self.db)
            .await
            .context("list all students")?;
        with_grades(&self.db, models).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Student>, RegistrarError> {
        let model = students::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find student by id")?;
        match model {
            Some(model) => {
                let grades = grades_of(&self.db, id).await?;
                Ok(Some(student_from_model(model, grades)?))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, student: &NewStudent) -> Result<Student, RegistrarError> {
        let student = student.clone();
        self.db
            .transaction::<_, Student, RegistrarError>(|txn| {
                Box::pin(async move {
                    let mut am = student_active_model(&student.data);
                    am.id = student.id.map_or(NotSet, Set);
                    am.owner_id = Set(student.owner_id);
                    am.created_at = Set(student.created_at);
                    am.updated_at = Set(student.updated_at);
                    let model = am
                        .insert(txn)
                        .await
                        .map_err(|e| missing_owner_or(e, "insert student"))?;
                    let grades = insert_grades(txn, model.id, &student.grades).await?;
                    Ok(student_from_model(model, grades)?)
                })
            })
            .await
            .map_err(|e| from_transaction(e, "insert student transaction"))
    }

    async fn update(
        &self,
        id: i32,
        update: &StudentUpdate,
    ) -> Result<Option<Student>, RegistrarError> {
        let update = update.clone();
        self.db
            .transaction::<_, Option<Student>, RegistrarError>(|txn| {
                Box::pin(async move {
                    let exists = students::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock student for update")?
                        .is_some();
                    if !exists {
                        return Ok(None);
                    }

                    let mut am = student_active_model(&update.data);
                    am.id = Set(id);
                    am.updated_at = Set(update.updated_at);
                    let model = am.update(txn).await.context("update student")?;

                    let grades = match &update.grades {
                        Some(replacement) => {
                            grades::Entity::delete_many()
                                .filter(grades::Column::StudentId.eq(id))
                                .exec(txn)
                                .await
                                .context("clear student grades")?;
                            insert_grades(txn, id, replacement).await?
                        }
                        None => grades_of(txn, id).await?,
                    };
                    Ok(Some(student_from_model(model, grades)?))
                })
            })
            .await
            .map_err(|e| from_transaction(e, "update student transaction"))
    }

    async fn delete(&self, id: i32) -> Result<bool, RegistrarError> {
        self.db
            .transaction::<_, bool, RegistrarError>(|txn| {
                Box::pin(async move {
                    grades::Entity::delete_many()
                        .filter(grades::Column::StudentId.eq(id))
                        .exec(txn)
                        .await
                        .context("delete student grades")?;
                    let result = students::Entity::delete_by_id(id)
                        .exec(txn)
                        .await
                        .context("delete student")?;
                    Ok(result.rows_affected > 0)
                })
            })
            .await
            .map_err(|e| from_transaction(e, "delete student transaction"))
    }

    async fn delete_all(&self) -> Result<Vec<i32>, RegistrarError> {
        self.db
            .transaction::<_, Vec<i32>, RegistrarError>(|txn| {
                Box::pin(async move {
                    let ids: Vec<i32> = students::Entity::find()
                        .select_only()
                        .column(students::Column::Id)
                        .order_by_asc(students::Column::Id)
                        .lock_exclusive()
                        .into_tuple()
                        .all(txn)
                        .await
                        .context("lock all students")?;
                    grades::Entity::delete_many()
                        .exec(txn)
                        .await
                        .context("delete all grades")?;
                    students::Entity::delete_many()
                        .exec(txn)
                        .await
                        .context("delete all students")?;
                    Ok(ids)
                })
            })
            .await
            .map_err(|e| from_transaction(e, "delete all students transaction"))
    }

    async fn count_by_category(
        &self,
        owner_id: Option<i32>,
    ) -> Result<Vec<(StudentCategory, u64)>, RegistrarError> {
        let mut query = students::Entity::find()
            .select_only()
            .column(students::Column::Category)
            .column_as(Expr::col(students::Column::Id).count(), "count")
            .group_by(students::Column::Category);
        if let Some(owner_id) = owner_id {
            query = query.filter(students::Column::OwnerId.eq(owner_id));
        }
        let rows: Vec<(String, i64)> = query
            .into_tuple()
            .all(&self.db)
            .await
            .context("count students by category")?;
        let counts = rows
            .into_iter()
            .map(|(category, count)| {
                let category = category
                    .parse::<StudentCategory>()
                    .context("stored student category")?;
                Ok((category, u64::try_from(count).unwrap_or_default()))
            })
            .collect::<anyhow::Result<_>>()?;
        Ok(counts)
    }

    async fn sync_id_sequence(&self) -> Result<(), RegistrarError> {
        let backend = self.db.get_database_backend();
        self.db
            .execute(Statement::from_string(
                backend,
                "SELECT setval(pg_get_serial_sequence('students', 'id'), \
                 COALESCE((SELECT MAX(id) FROM students), 0) + 1, false)",
            ))
            .await
            .context("sync student id sequence")?;
        Ok(())
    }
}

/// Case-insensitive substring match over the searchable student columns.
fn search_condition(search: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
    [
        students::Column::Title,
        students::Column::Username,
        students::Column::FirstName,
        students::Column::LastName,
    ]
    .into_iter()
    .fold(Condition::any(), |cond, column| {
        cond.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.as_str()))
    })
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn student_active_model(data: &StudentData) -> students::ActiveModel {
    let GraduateDetails {
        last_school_year,
        contact_number,
        so_number,
        date_issued,
        series_year,
        lrn,
    } = data.graduate.clone();
    students::ActiveModel {
        id: NotSet,
        title: Set(data.title()),
        username: Set(data.username.clone()),
        attachments: Set(serde_json::Value::from(data.attachments.clone())),
        category: Set(data.category.as_str().to_owned()),
        first_name: Set(data.first_name.clone()),
        middle_name: Set(data.middle_name.clone()),
        last_name: Set(data.last_name.clone()),
        owner_id: NotSet,
        created_at: NotSet,
        updated_at: NotSet,
        grade_level: Set(data.grade_level.clone()),
        last_school_year: Set(last_school_year),
        contact_number: Set(contact_number),
        so_number: Set(so_number),
        date_issued: Set(date_issued),
        series_year: Set(series_year),
        lrn: Set(lrn),
    }
}

async fn insert_grades(
    txn: &DatabaseTransaction,
    student_id: i32,
    inputs: &[GradeInput],
) -> Result<Vec<Grade>, RegistrarError> {
    let mut inserted = Vec::with_capacity(inputs.len());
    for input in inputs {
        let model = grades::ActiveModel {
            id: NotSet,
            subject: Set(input.subject.clone()),
            grade: Set(input.grade.clone()),
            student_id: Set(student_id),
        }
        .insert(txn)
        .await
        .context("insert grade")?;
        inserted.push(grade_from_model(model));
    }
    Ok(inserted)
}

async fn grades_of<C: ConnectionTrait>(conn: &C, student_id: i32) -> Result<Vec<Grade>, RegistrarError> {
    let models = grades::Entity::find()
        .filter(grades::Column::StudentId.eq(student_id))
        .order_by_asc(grades::Column::Id)
        .all(conn)
        .await
        .context("load student grades")?;
    Ok(models.into_iter().map(grade_from_model).collect())
}

/// Attach grades to a page of students with one batched query.
async fn with_grades<C: ConnectionTrait>(
    conn: &C,
    models: Vec<students::Model>,
) -> Result<Vec<Student>, RegistrarError> {
    let mut by_student: HashMap<i32, Vec<Grade>> = HashMap::new();
    if !models.is_empty() {
        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let rows = grades::Entity::find()
            .filter(grades::Column::StudentId.is_in(ids))
            .order_by_asc(grades::Column::Id)
            .all(conn)
            .await
            .context("load grades for students")?;
        for row in rows {
            by_student
                .entry(row.student_id)
                .or_default()
                .push(grade_from_model(row));
        }
    }
    let students = models
        .into_iter()
        .map(|model| {
            let grades = by_student.remove(&model.id).unwrap_or_default();
            student_from_model(model, grades)
        })
        .collect::<anyhow::Result<_>>()?;
    Ok(students)
}

fn grade_from_model(model: grades::Model) -> Grade {
    Grade {
        id: model.id,
        student_id: model.student_id,
        subject: model.subject,
        grade: model.grade,
    }
}

fn student_from_model(model: students::Model, grades: Vec<Grade>) -> anyhow::Result<Student> {
    let category = model
        .category
        .parse::<StudentCategory>()
        .context("stored student category")?;
    let attachments: Vec<String> =
        serde_json::from_value(model.attachments).context("stored student attachments")?;
    Ok(Student {
        id: model.id,
        title: model.title,
        username: model.username,
        attachments,
        category,
        first_name: model.first_name,
        middle_name: model.middle_name,
        last_name: model.last_name,
        owner_id: model.owner_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
        grade_level: model.grade_level,
        graduate: GraduateDetails {
            last_school_year: model.last_school_year,
            contact_number: model.contact_number,
            so_number: model.so_number,
            date_issued: model.date_issued,
            series_year: model.series_year,
            lrn: model.lrn,
        },
        grades,
    })
}
