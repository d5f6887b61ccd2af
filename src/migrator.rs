use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_food_items_table::Migration)]
    }
}

mod m20240101_000001_create_food_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_food_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FoodItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FoodItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(FoodItems::Name).string().not_null())
                        .col(ColumnDef::new(FoodItems::Category).string().not_null())
                        .col(ColumnDef::new(FoodItems::PurchaseDate).date().not_null())
                        .col(ColumnDef::new(FoodItems::ExpiryDate).date().not_null())
                        .col(ColumnDef::new(FoodItems::Location).string().not_null())
                        .col(ColumnDef::new(FoodItems::Quantity).double().not_null())
                        .col(ColumnDef::new(FoodItems::Unit).string().not_null())
                        .col(ColumnDef::new(FoodItems::Memo).string().null())
                        .col(ColumnDef::new(FoodItems::CreatedAt).date_time().not_null())
                        .col(ColumnDef::new(FoodItems::UpdatedAt).date_time().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FoodItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum FoodItems {
        Table,
        Id,
        Name,
        Category,
        PurchaseDate,
        ExpiryDate,
        Location,
        Quantity,
        Unit,
        Memo,
        CreatedAt,
        UpdatedAt,
    }
}
