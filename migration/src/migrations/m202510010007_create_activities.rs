use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010007_create_activities"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("activities"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("lesson_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("title")).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Alias::new("activity_type"))
                            .enumeration(
                                Alias::new("activity_type"),
                                vec![
                                    Alias::new("quiz"),
                                    Alias::new("sandbox"),
                                    Alias::new("assignment"),
                                ],
                            )
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("instructions")).text().not_null().default(""))
                    .col(ColumnDef::new(Alias::new("max_score")).integer().not_null().default(100))
                    .col(ColumnDef::new(Alias::new("due_date")).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("activities"), Alias::new("lesson_id"))
                            .to(Alias::new("lessons"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("activities")).to_owned())
            .await
    }
}
