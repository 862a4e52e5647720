use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Role is stored as plain text ("admin", "ga", "employee")
        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(uuid(Employee::Id).primary_key())
                    .col(string_len(Employee::Name, 100).not_null())
                    .col(string_len(Employee::Username, 50).not_null().unique_key())
                    .col(string_len(Employee::PasswordHash, 255).not_null())
                    .col(string_len(Employee::Role, 20).not_null())
                    .col(string_len(Employee::Division, 100).not_null().default(""))
                    .col(string_len(Employee::Position, 100).not_null().default(""))
                    .col(string_len(Employee::Contact, 50).not_null().default(""))
                    .col(
                        timestamp_with_time_zone(Employee::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Employee::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Employee {
    Table,
    Id,
    Name,
    Username,
    PasswordHash,
    Role,
    Division,
    Position,
    Contact,
    CreatedAt,
    UpdatedAt,
}
