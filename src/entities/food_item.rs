use chrono::NaiveDate;
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{Category, QuantityUnit, StorageLocation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "food_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub category: Category,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub location: StorageLocation,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub memo: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
