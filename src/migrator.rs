use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_rm_receivings_table::Migration),
            Box::new(m20250101_000002_create_hold_materials_table::Migration),
            Box::new(m20250101_000003_create_batch_trackings_table::Migration),
            Box::new(m20250101_000004_create_batch_sequences_table::Migration),
            Box::new(m20250101_000005_create_packing_tables::Migration),
            Box::new(m20250101_000006_create_masterlist_table::Migration),
            Box::new(m20250101_000007_create_shop_floor_tables::Migration),
        ]
    }
}

// Weights are stored as NUMERIC(12,2). On SQLite this maps to REAL affinity.

mod m20250101_000001_create_rm_receivings_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_rm_receivings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RmReceivings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RmReceivings::Uid)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RmReceivings::Date).date().not_null())
                        .col(ColumnDef::new(RmReceivings::Supplier).string().not_null())
                        .col(ColumnDef::new(RmReceivings::Grade).string().not_null())
                        .col(ColumnDef::new(RmReceivings::Dia).string().not_null())
                        .col(ColumnDef::new(RmReceivings::Customer).string().not_null())
                        .col(ColumnDef::new(RmReceivings::Standard).string().not_null())
                        .col(ColumnDef::new(RmReceivings::Heatno).string().not_null())
                        .col(
                            ColumnDef::new(RmReceivings::RecivingWeightKg)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RmReceivings::HoldWeightKg)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RmReceivings::Remaining)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(RmReceivings::RackNo).string().not_null())
                        .col(ColumnDef::new(RmReceivings::Location).string().not_null())
                        .col(
                            ColumnDef::new(RmReceivings::TypeOfMaterial)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RmReceivings::CostPerKg)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(RmReceivings::InvoiceNo).string().not_null())
                        .col(ColumnDef::new(RmReceivings::Milltc).string().null())
                        .col(ColumnDef::new(RmReceivings::Spectro).string().null())
                        .col(
                            ColumnDef::new(RmReceivings::SsbInspectionReport)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(RmReceivings::CustomerApproval)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(RmReceivings::VerifiedBy).string().not_null())
                        .col(
                            ColumnDef::new(RmReceivings::ApprovalStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RmReceivings::Comments).text().null())
                        .col(
                            ColumnDef::new(RmReceivings::Status)
                                .string()
                                .not_null()
                                .default("open"),
                        )
                        .col(
                            ColumnDef::new(RmReceivings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RmReceivings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_rm_receivings_heatno")
                        .table(RmReceivings::Table)
                        .col(RmReceivings::Heatno)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_rm_receivings_status")
                        .table(RmReceivings::Table)
                        .col(RmReceivings::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RmReceivings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum RmReceivings {
        Table,
        Uid,
        Date,
        Supplier,
        Grade,
        Dia,
        Customer,
        Standard,
        Heatno,
        RecivingWeightKg,
        HoldWeightKg,
        Remaining,
        RackNo,
        Location,
        TypeOfMaterial,
        CostPerKg,
        InvoiceNo,
        Milltc,
        Spectro,
        SsbInspectionReport,
        CustomerApproval,
        VerifiedBy,
        ApprovalStatus,
        Comments,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000002_create_hold_materials_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_hold_materials_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(HoldMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(HoldMaterials::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(HoldMaterials::RmReceivingUid).uuid().null())
                        .col(
                            ColumnDef::new(HoldMaterials::BatchId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(HoldMaterials::Component).string().not_null())
                        .col(ColumnDef::new(HoldMaterials::Customer).string().not_null())
                        .col(
                            ColumnDef::new(HoldMaterials::SlugWeight)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(HoldMaterials::Supplier).string().not_null())
                        .col(ColumnDef::new(HoldMaterials::Grade).string().not_null())
                        .col(ColumnDef::new(HoldMaterials::Standard).string().not_null())
                        .col(ColumnDef::new(HoldMaterials::Heatno).string().not_null())
                        .col(ColumnDef::new(HoldMaterials::Dia).string().not_null())
                        .col(ColumnDef::new(HoldMaterials::RackNo).string().not_null())
                        .col(
                            ColumnDef::new(HoldMaterials::Pieces)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(HoldMaterials::HoldMaterialQtyKg)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(HoldMaterials::IssueQtyKg)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(HoldMaterials::Remaining)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(HoldMaterials::Line).string().not_null())
                        .col(ColumnDef::new(HoldMaterials::VerifiedBy).string().not_null())
                        .col(
                            ColumnDef::new(HoldMaterials::Status)
                                .string()
                                .not_null()
                                .default("open"),
                        )
                        .col(
                            ColumnDef::new(HoldMaterials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_hold_materials_rm_receiving_uid")
                                .from(HoldMaterials::Table, HoldMaterials::RmReceivingUid)
                                .to(RmReceivings::Table, RmReceivings::Uid)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_hold_materials_rm_receiving_uid")
                        .table(HoldMaterials::Table)
                        .col(HoldMaterials::RmReceivingUid)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_hold_materials_component")
                        .table(HoldMaterials::Table)
                        .col(HoldMaterials::Component)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(HoldMaterials::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum HoldMaterials {
        Table,
        Id,
        RmReceivingUid,
        BatchId,
        Component,
        Customer,
        SlugWeight,
        Supplier,
        Grade,
        Standard,
        Heatno,
        Dia,
        RackNo,
        Pieces,
        HoldMaterialQtyKg,
        IssueQtyKg,
        Remaining,
        Line,
        VerifiedBy,
        Status,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum RmReceivings {
        Table,
        Uid,
    }
}

mod m20250101_000003_create_batch_trackings_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_batch_trackings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BatchTrackings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BatchTrackings::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BatchTrackings::HoldMaterialId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BatchTrackings::IssueId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(BatchTrackings::Customer).string().not_null())
                        .col(ColumnDef::new(BatchTrackings::Standard).string().not_null())
                        .col(ColumnDef::new(BatchTrackings::Component).string().not_null())
                        .col(ColumnDef::new(BatchTrackings::Grade).string().not_null())
                        .col(ColumnDef::new(BatchTrackings::Dia).string().not_null())
                        .col(ColumnDef::new(BatchTrackings::Heatno).string().not_null())
                        .col(ColumnDef::new(BatchTrackings::RackNo).string().not_null())
                        .col(
                            ColumnDef::new(BatchTrackings::IssueBarQty)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BatchTrackings::IssueQtyKg)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(BatchTrackings::Line).string().not_null())
                        .col(ColumnDef::new(BatchTrackings::Supplier).string().not_null())
                        .col(
                            ColumnDef::new(BatchTrackings::VerifiedBy)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BatchTrackings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_batch_trackings_hold_material_id")
                                .from(BatchTrackings::Table, BatchTrackings::HoldMaterialId)
                                .to(HoldMaterials::Table, HoldMaterials::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_batch_trackings_hold_material_id")
                        .table(BatchTrackings::Table)
                        .col(BatchTrackings::HoldMaterialId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BatchTrackings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BatchTrackings {
        Table,
        Id,
        HoldMaterialId,
        IssueId,
        Customer,
        Standard,
        Component,
        Grade,
        Dia,
        Heatno,
        RackNo,
        IssueBarQty,
        IssueQtyKg,
        Line,
        Supplier,
        VerifiedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum HoldMaterials {
        Table,
        Id,
    }
}

mod m20250101_000004_create_batch_sequences_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_batch_sequences_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BatchSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BatchSequences::SeqKey)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BatchSequences::LastValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BatchSequences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BatchSequences {
        Table,
        SeqKey,
        LastValue,
    }
}

mod m20250101_000005_create_packing_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_packing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PackingLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PackingLocations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PackingLocations::Code)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(PackingLocations::Description)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PackingTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PackingTransactions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PackingTransactions::MaterialId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PackingTransactions::LocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PackingTransactions::SlugWeight)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PackingTransactions::Qty)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PackingTransactions::TransactionType)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PackingTransactions::VerifiedBy)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PackingTransactions::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_packing_transactions_material_id")
                                .from(PackingTransactions::Table, PackingTransactions::MaterialId)
                                .to(HoldMaterials::Table, HoldMaterials::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_packing_transactions_location_id")
                                .from(PackingTransactions::Table, PackingTransactions::LocationId)
                                .to(PackingLocations::Table, PackingLocations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_packing_transactions_material_location")
                        .table(PackingTransactions::Table)
                        .col(PackingTransactions::MaterialId)
                        .col(PackingTransactions::LocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_packing_transactions_timestamp")
                        .table(PackingTransactions::Table)
                        .col(PackingTransactions::Timestamp)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PackingTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PackingLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PackingLocations {
        Table,
        Id,
        Code,
        Description,
    }

    #[derive(DeriveIden)]
    enum PackingTransactions {
        Table,
        Id,
        MaterialId,
        LocationId,
        SlugWeight,
        Qty,
        TransactionType,
        VerifiedBy,
        Timestamp,
    }

    #[derive(DeriveIden)]
    enum HoldMaterials {
        Table,
        Id,
    }
}

mod m20250101_000006_create_masterlist_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000006_create_masterlist_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MasterlistComponents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MasterlistComponents::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Component)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::PartName)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Customer)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Supplier)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::DrawingSrNumber)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Standard)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Grade)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::SlugWeight)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Dia)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::HtProcess)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::RunningStatus)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Op10Time)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Op10Target)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Op20Time)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::Op20Target)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::ParentComponentId)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MasterlistComponents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_masterlist_components_parent")
                                .from(
                                    MasterlistComponents::Table,
                                    MasterlistComponents::ParentComponentId,
                                )
                                .to(MasterlistComponents::Table, MasterlistComponents::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_masterlist_components_component")
                        .table(MasterlistComponents::Table)
                        .col(MasterlistComponents::Component)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MasterlistComponents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum MasterlistComponents {
        Table,
        Id,
        Component,
        PartName,
        Customer,
        Supplier,
        DrawingSrNumber,
        Standard,
        Grade,
        SlugWeight,
        Dia,
        HtProcess,
        RunningStatus,
        #[sea_orm(iden = "op_10_time")]
        Op10Time,
        #[sea_orm(iden = "op_10_target")]
        Op10Target,
        #[sea_orm(iden = "op_20_time")]
        Op20Time,
        #[sea_orm(iden = "op_20_target")]
        Op20Target,
        ParentComponentId,
        CreatedAt,
    }
}

mod m20250101_000007_create_shop_floor_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000007_create_shop_floor_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProcessTags::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProcessTags::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProcessTags::TagUid)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ProcessTags::GeneratedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProcessTags::GeneratedBy).string().not_null())
                        .col(
                            ColumnDef::new(ProcessTags::CurrentProcess)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProcessTags::NextProcess).string().not_null())
                        .col(ColumnDef::new(ProcessTags::Qty).integer().not_null())
                        .col(ColumnDef::new(ProcessTags::Grade).string().not_null())
                        .col(ColumnDef::new(ProcessTags::HeatNo).string().not_null())
                        .col(ColumnDef::new(ProcessTags::Customer).string().not_null())
                        .col(ColumnDef::new(ProcessTags::Component).string().not_null())
                        .col(ColumnDef::new(ProcessTags::BatchId).string().not_null())
                        .col(
                            ColumnDef::new(ProcessTags::Status)
                                .string_len(10)
                                .not_null()
                                .default("ok"),
                        )
                        .col(
                            ColumnDef::new(ProcessTags::IsPrinted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProcessTags::PrintedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_process_tags_batch_id")
                        .table(ProcessTags::Table)
                        .col(ProcessTags::BatchId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductionEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionEntries::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductionEntries::Stage).string().not_null())
                        .col(
                            ColumnDef::new(ProductionEntries::BatchNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionEntries::Component)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionEntries::Production)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionEntries::Rejections)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ProductionEntries::Setup).string().null())
                        .col(
                            ColumnDef::new(ProductionEntries::RecordedBy)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionEntries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_entries_stage_batch")
                        .table(ProductionEntries::Table)
                        .col(ProductionEntries::Stage)
                        .col(ProductionEntries::BatchNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProcessTags::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProcessTags {
        Table,
        Id,
        TagUid,
        GeneratedAt,
        GeneratedBy,
        CurrentProcess,
        NextProcess,
        Qty,
        Grade,
        HeatNo,
        Customer,
        Component,
        BatchId,
        Status,
        IsPrinted,
        PrintedAt,
    }

    #[derive(DeriveIden)]
    enum ProductionEntries {
        Table,
        Id,
        Stage,
        BatchNumber,
        Component,
        Production,
        Rejections,
        Setup,
        RecordedBy,
        CreatedAt,
    }
}
