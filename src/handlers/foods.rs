use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::food_item;
use crate::errors::ServiceError;
use crate::freshness::{self, FreshnessStatus};
use crate::models::{Category, QuantityUnit, StorageLocation};
use crate::services::foods::{FoodPatch, NewFood};
use crate::{ApiResponse, AppState};

/// A food record as returned to callers, with the derived freshness fields
/// recomputed against today's date.
#[derive(Debug, Serialize, ToSchema)]
pub struct FoodResponse {
    pub id: i32,
    pub name: String,
    pub category: Category,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub location: StorageLocation,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub memo: Option<String>,
    /// Derived triage label, never stored
    pub status: FreshnessStatus,
    /// Signed days until expiry; negative once past
    pub days_until_expiry: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<food_item::Model> for FoodResponse {
    fn from(model: food_item::Model) -> Self {
        let today = freshness::today();
        Self {
            status: freshness::classify(model.expiry_date, today),
            days_until_expiry: freshness::days_until_expiry(model.expiry_date, today),
            id: model.id,
            name: model.name,
            category: model.category,
            purchase_date: model.purchase_date,
            expiry_date: model.expiry_date,
            location: model.location,
            quantity: model.quantity,
            unit: model.unit,
            memo: model.memo,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFoodRequest {
    pub name: String,
    pub category: Category,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub location: StorageLocation,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: QuantityUnit,
    #[serde(default)]
    pub memo: Option<String>,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateFoodRequest {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub purchase_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub location: Option<StorageLocation>,
    pub quantity: Option<f64>,
    pub unit: Option<QuantityUnit>,
    pub memo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteFoodResponse {
    pub deleted: bool,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ExpiringQuery {
    /// Look-ahead window in days; defaults to the near-expiry window
    #[serde(default = "default_window")]
    pub days: u32,
}

fn default_window() -> u32 {
    freshness::NEAR_EXPIRY_WINDOW_DAYS as u32
}

/// Create the foods router
pub fn foods_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_foods).post(create_food))
        .route("/expiring", get(list_expiring))
        .route("/expired", get(list_expired))
        .route(
            "/:id",
            get(get_food).put(update_food).delete(delete_food),
        )
}

/// Create a food record
#[utoipa::path(
    post,
    path = "/api/v1/foods",
    request_body = CreateFoodRequest,
    responses(
        (status = 201, description = "Food record created", body = FoodResponse),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse)
    ),
    tag = "foods"
)]
pub async fn create_food(
    State(state): State<AppState>,
    Json(payload): Json<CreateFoodRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .services
        .foods
        .add(NewFood {
            name: payload.name,
            category: payload.category,
            purchase_date: payload.purchase_date,
            expiry_date: payload.expiry_date,
            location: payload.location,
            quantity: payload.quantity,
            unit: payload.unit,
            memo: payload.memo,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(FoodResponse::from(record))),
    ))
}

/// List all food records, ascending by expiry date
#[utoipa::path(
    get,
    path = "/api/v1/foods",
    responses(
        (status = 200, description = "Food records returned", body = [FoodResponse])
    ),
    tag = "foods"
)]
pub async fn list_foods(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state.services.foods.list_all().await?;
    let foods: Vec<FoodResponse> = records.into_iter().map(FoodResponse::from).collect();

    Ok(Json(ApiResponse::success(foods)))
}

/// Fetch one food record
#[utoipa::path(
    get,
    path = "/api/v1/foods/{id}",
    params(("id" = i32, Path, description = "Food record id")),
    responses(
        (status = 200, description = "Food record returned", body = FoodResponse),
        (status = 404, description = "No such record", body = crate::errors::ErrorResponse)
    ),
    tag = "foods"
)]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .services
        .foods
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("food record {id} not found")))?;

    Ok(Json(ApiResponse::success(FoodResponse::from(record))))
}

/// Update a subset of a food record's fields
#[utoipa::path(
    put,
    path = "/api/v1/foods/{id}",
    params(("id" = i32, Path, description = "Food record id")),
    request_body = UpdateFoodRequest,
    responses(
        (status = 200, description = "Food record updated", body = FoodResponse),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such record", body = crate::errors::ErrorResponse)
    ),
    tag = "foods"
)]
pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateFoodRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let patch = FoodPatch {
        name: payload.name,
        category: payload.category,
        purchase_date: payload.purchase_date,
        expiry_date: payload.expiry_date,
        location: payload.location,
        quantity: payload.quantity,
        unit: payload.unit,
        memo: payload.memo.map(Some),
    };

    let record = state
        .services
        .foods
        .update(id, patch)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("food record {id} not found")))?;

    Ok(Json(ApiResponse::success(FoodResponse::from(record))))
}

/// Delete a food record
#[utoipa::path(
    delete,
    path = "/api/v1/foods/{id}",
    params(("id" = i32, Path, description = "Food record id")),
    responses(
        (status = 200, description = "Deletion outcome returned", body = DeleteFoodResponse)
    ),
    tag = "foods"
)]
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let deleted = state.services.foods.delete(id).await?;

    Ok(Json(ApiResponse::success(DeleteFoodResponse { deleted })))
}

/// List records expiring within the given window, ascending by expiry date
#[utoipa::path(
    get,
    path = "/api/v1/foods/expiring",
    params(ExpiringQuery),
    responses(
        (status = 200, description = "Expiring food records returned", body = [FoodResponse])
    ),
    tag = "foods"
)]
pub async fn list_expiring(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state.services.foods.expiring_within(query.days).await?;
    let foods: Vec<FoodResponse> = records.into_iter().map(FoodResponse::from).collect();

    Ok(Json(ApiResponse::success(foods)))
}

/// List expired records, most recently expired first
#[utoipa::path(
    get,
    path = "/api/v1/foods/expired",
    responses(
        (status = 200, description = "Expired food records returned", body = [FoodResponse])
    ),
    tag = "foods"
)]
pub async fn list_expired(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state.services.foods.expired().await?;
    let foods: Vec<FoodResponse> = records.into_iter().map(FoodResponse::from).collect();

    Ok(Json(ApiResponse::success(foods)))
}
