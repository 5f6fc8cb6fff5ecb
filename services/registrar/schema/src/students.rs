use sea_orm::entity::prelude::*;

/// Student record owned by a registrar account.
///
/// `attachments` is a JSON array of upload paths.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub username: String,
    pub attachments: Json,
    pub category: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub owner_id: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub grade_level: Option<String>,
    pub last_school_year: Option<String>,
    pub contact_number: Option<String>,
    pub so_number: Option<String>,
    pub date_issued: Option<String>,
    pub series_year: Option<String>,
    pub lrn: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::grades::Entity")]
    Grades,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::grades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
