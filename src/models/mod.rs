//! Shared domain types: the closed category/location/unit sets.
//!
//! These are the single canonical definitions used by the store's
//! validation, the persistence layer, and every HTTP caller. Stored as text
//! in the database via `DeriveActiveEnum`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Food category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    #[sea_orm(string_value = "vegetable")]
    Vegetable,
    #[sea_orm(string_value = "fruit")]
    Fruit,
    #[sea_orm(string_value = "meat")]
    Meat,
    #[sea_orm(string_value = "seafood")]
    Seafood,
    #[sea_orm(string_value = "eggs")]
    Eggs,
    #[sea_orm(string_value = "dairy")]
    Dairy,
    #[sea_orm(string_value = "grain")]
    Grain,
    #[sea_orm(string_value = "condiment")]
    Condiment,
    #[sea_orm(string_value = "sauce")]
    Sauce,
    #[sea_orm(string_value = "side_dish")]
    SideDish,
    #[sea_orm(string_value = "instant_food")]
    InstantFood,
    #[sea_orm(string_value = "bread")]
    Bread,
    #[sea_orm(string_value = "dessert")]
    Dessert,
    #[sea_orm(string_value = "beverage")]
    Beverage,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Where an item is kept.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StorageLocation {
    #[default]
    #[sea_orm(string_value = "refrigerated")]
    Refrigerated,
    #[sea_orm(string_value = "frozen")]
    Frozen,
    #[sea_orm(string_value = "room_temperature")]
    RoomTemperature,
}

/// Unit a quantity is counted in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuantityUnit {
    #[default]
    #[sea_orm(string_value = "count")]
    Count,
    #[sea_orm(string_value = "gram")]
    Gram,
    #[sea_orm(string_value = "kilogram")]
    Kilogram,
    #[sea_orm(string_value = "milliliter")]
    Milliliter,
    #[sea_orm(string_value = "liter")]
    Liter,
    #[sea_orm(string_value = "pack")]
    Pack,
    #[sea_orm(string_value = "bottle")]
    Bottle,
}
