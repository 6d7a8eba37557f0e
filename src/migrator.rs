use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_clients_table::Migration),
            Box::new(m20240101_000002_create_qualities_table::Migration),
            Box::new(m20240101_000003_create_reports_table::Migration),
            Box::new(m20240101_000004_create_report_items_table::Migration),
        ]
    }
}

mod m20240101_000001_create_clients_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_clients_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Clients::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Clients::Name)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Clients::Address).text().not_null())
                        .col(
                            ColumnDef::new(Clients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Clients::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Clients {
        Table,
        Id,
        Name,
        Address,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_qualities_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_qualities_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Qualities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Qualities::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Qualities::Name)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Qualities::Denier).integer().not_null())
                        .col(ColumnDef::new(Qualities::Blend).string_len(50).not_null())
                        .col(ColumnDef::new(Qualities::ShadeNumber).string_len(50).null())
                        .col(
                            ColumnDef::new(Qualities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Qualities::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Qualities::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Qualities {
        Table,
        Id,
        Name,
        Denier,
        Blend,
        ShadeNumber,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_reports_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_reports_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Reports::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Reports::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Reports::ClientId).integer().not_null())
                        .col(ColumnDef::new(Reports::ChallanNo).integer().not_null())
                        .col(ColumnDef::new(Reports::ReportDate).date().not_null())
                        .col(ColumnDef::new(Reports::QualityName).string_len(50).not_null())
                        .col(ColumnDef::new(Reports::Denier).integer().not_null())
                        .col(ColumnDef::new(Reports::Blend).string_len(50).not_null())
                        .col(ColumnDef::new(Reports::LotNumber).integer().not_null())
                        .col(ColumnDef::new(Reports::ShadeNumber).string_len(50).null())
                        .col(ColumnDef::new(Reports::VehicleNo).string_len(30).null())
                        .col(ColumnDef::new(Reports::DriverName).string_len(100).null())
                        .col(ColumnDef::new(Reports::Destination).string_len(200).null())
                        .col(ColumnDef::new(Reports::Purpose).string_len(200).null())
                        .col(ColumnDef::new(Reports::TotalBags).integer().not_null())
                        .col(
                            ColumnDef::new(Reports::TotalGrossWeight)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reports::TotalTareWeight)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reports::TotalNetWeight)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Reports::TotalCones).integer().not_null())
                        .col(
                            ColumnDef::new(Reports::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reports::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reports_client_id")
                                .from(Reports::Table, Reports::ClientId)
                                .to(Clients::Table, Clients::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reports_client_id")
                        .table(Reports::Table)
                        .col(Reports::ClientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reports_report_date")
                        .table(Reports::Table)
                        .col(Reports::ReportDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reports_quality_name")
                        .table(Reports::Table)
                        .col(Reports::QualityName)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reports::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Reports {
        Table,
        Id,
        ClientId,
        ChallanNo,
        ReportDate,
        QualityName,
        Denier,
        Blend,
        LotNumber,
        ShadeNumber,
        VehicleNo,
        DriverName,
        Destination,
        Purpose,
        TotalBags,
        TotalGrossWeight,
        TotalTareWeight,
        TotalNetWeight,
        TotalCones,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Clients {
        Table,
        Id,
    }
}

mod m20240101_000004_create_report_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_report_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReportItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReportItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ReportItems::ReportId).integer().not_null())
                        .col(ColumnDef::new(ReportItems::BagNo).integer().not_null())
                        .col(
                            ColumnDef::new(ReportItems::QualityName)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReportItems::Denier).integer().not_null())
                        .col(ColumnDef::new(ReportItems::Blend).string_len(50).not_null())
                        .col(ColumnDef::new(ReportItems::LotNumber).integer().not_null())
                        .col(
                            ColumnDef::new(ReportItems::ShadeNumber)
                                .string_len(50)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ReportItems::GrossWeight)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReportItems::TareWeight)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReportItems::NetWeight)
                                .decimal_len(10, 3)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReportItems::Cones).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_report_items_report_id")
                                .from(ReportItems::Table, ReportItems::ReportId)
                                .to(Reports::Table, Reports::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_report_items_report_id")
                        .table(ReportItems::Table)
                        .col(ReportItems::ReportId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_report_items_quality_name")
                        .table(ReportItems::Table)
                        .col(ReportItems::QualityName)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReportItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ReportItems {
        Table,
        Id,
        ReportId,
        BagNo,
        QualityName,
        Denier,
        Blend,
        LotNumber,
        ShadeNumber,
        GrossWeight,
        TareWeight,
        NetWeight,
        Cones,
    }

    #[derive(DeriveIden)]
    enum Reports {
        Table,
        Id,
    }
}
