use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010002_create_courses"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("courses"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("title")).string_len(200).not_null())
                    .col(ColumnDef::new(Alias::new("code")).string_len(20).not_null().unique_key())
                    .col(ColumnDef::new(Alias::new("slug")).string().not_null().unique_key())
                    .col(ColumnDef::new(Alias::new("description")).text().not_null().default(""))
                    .col(ColumnDef::new(Alias::new("category")).string_len(100).not_null().default(""))
                    .col(ColumnDef::new(Alias::new("thumbnail")).string().null())
                    .col(ColumnDef::new(Alias::new("creator_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("is_approved")).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Alias::new("submission_status"))
                            .enumeration(
                                Alias::new("course_submission_status"),
                                vec![
                                    Alias::new("draft"),
                                    Alias::new("pending"),
                                    Alias::new("approved"),
                                    Alias::new("rejected"),
                                ],
                            )
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Alias::new("feedback")).text().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("courses"), Alias::new("creator_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("courses")).to_owned())
            .await
    }
}
