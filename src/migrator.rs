//! Embedded schema migrations.
//!
//! Referential rules between applications and items are enforced by the
//! services (deletion guard, ledger row replacement), not by database
//! foreign keys, so the schema stays portable between SQLite and Postgres.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_items::Migration),
            Box::new(m20240101_000002_create_rental_applications::Migration),
            Box::new(m20240101_000003_create_application_items::Migration),
        ]
    }
}

mod m20240101_000001_create_items {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_items"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::InitialStock).integer().not_null())
                        .col(ColumnDef::new(Items::CurrentStock).integer().not_null())
                        .col(
                            ColumnDef::new(Items::Price)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Items::Unit).string().not_null())
                        .col(ColumnDef::new(Items::Description).text())
                        .col(ColumnDef::new(Items::ImageUrl).string())
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Items::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_items_name")
                        .table(Items::Table)
                        .col(Items::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Items {
        Table,
        Id,
        Name,
        InitialStock,
        CurrentStock,
        Price,
        Unit,
        Description,
        ImageUrl,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_rental_applications {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_rental_applications"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RentalApplications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RentalApplications::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::ApplicantName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::StudentId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RentalApplications::Phone).string().not_null())
                        .col(ColumnDef::new(RentalApplications::AccountInfo).string())
                        .col(
                            ColumnDef::new(RentalApplications::RentalDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::ReturnDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::TotalItemCost)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::Deposit)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::ApplicationDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RentalApplications::RentalStaff).string())
                        .col(ColumnDef::new(RentalApplications::ReturnStaff).string())
                        .col(ColumnDef::new(RentalApplications::ActualReturnDate).date())
                        .col(
                            ColumnDef::new(RentalApplications::DepositRefunded)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::UpdatedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(RentalApplications::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rental_applications_student_id")
                        .table(RentalApplications::Table)
                        .col(RentalApplications::StudentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rental_applications_status")
                        .table(RentalApplications::Table)
                        .col(RentalApplications::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RentalApplications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum RentalApplications {
        Table,
        Id,
        ApplicantName,
        StudentId,
        Phone,
        AccountInfo,
        RentalDate,
        ReturnDate,
        TotalItemCost,
        Deposit,
        TotalAmount,
        Status,
        ApplicationDate,
        RentalStaff,
        ReturnStaff,
        ActualReturnDate,
        DepositRefunded,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20240101_000003_create_application_items {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_application_items"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ApplicationItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ApplicationItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ApplicationItems::ApplicationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ApplicationItems::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(ApplicationItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("uniq_application_items_application_item")
                        .table(ApplicationItems::Table)
                        .col(ApplicationItems::ApplicationId)
                        .col(ApplicationItems::ItemId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_application_items_item_id")
                        .table(ApplicationItems::Table)
                        .col(ApplicationItems::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ApplicationItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ApplicationItems {
        Table,
        Id,
        ApplicationId,
        ItemId,
        Quantity,
    }
}
