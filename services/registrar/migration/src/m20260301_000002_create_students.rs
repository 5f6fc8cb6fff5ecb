use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Students::Title).string().not_null())
                    .col(ColumnDef::new(Students::Username).string().not_null())
                    .col(
                        ColumnDef::new(Students::Attachments)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Students::Category).string().not_null())
                    .col(ColumnDef::new(Students::FirstName).string().not_null())
                    .col(
                        ColumnDef::new(Students::MiddleName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Students::LastName).string().not_null())
                    .col(ColumnDef::new(Students::OwnerId).integer().not_null())
                    .col(
                        ColumnDef::new(Students::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Students::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Students::GradeLevel).string().null())
                    .col(ColumnDef::new(Students::LastSchoolYear).string().null())
                    .col(ColumnDef::new(Students::ContactNumber).string().null())
                    .col(ColumnDef::new(Students::SoNumber).string().null())
                    .col(ColumnDef::new(Students::DateIssued).string().null())
                    .col(ColumnDef::new(Students::SeriesYear).string().null())
                    .col(ColumnDef::new(Students::Lrn).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Students::Table, Students::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Students::Table)
                    .col(Students::OwnerId)
                    .name("idx_students_owner_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_students_owner_id").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Students {
    Table,
    Id,
    Title,
    Username,
    Attachments,
    Category,
    FirstName,
    MiddleName,
    LastName,
    OwnerId,
    CreatedAt,
    UpdatedAt,
    GradeLevel,
    LastSchoolYear,
    ContactNumber,
    SoNumber,
    DateIssued,
    SeriesYear,
    Lrn,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
