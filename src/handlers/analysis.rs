use axum::{
    extract::State,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::freshness::{self, FreshnessStatus};
use crate::models::{Category, StorageLocation};
use crate::services::recognition::{FoodPhotoAnalysis, ShelfLifeEstimate, UNCERTAIN_CONFIDENCE};
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzePhotoRequest {
    /// Base64-encoded image bytes (raw base64, no data-URL prefix)
    pub image_base64: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzePhotoResponse {
    pub analysis: FoodPhotoAnalysis,
    /// True when confidence is too low for the result to be auto-applied
    pub uncertain: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShelfLifeRequest {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default)]
    pub location: StorageLocation,
}

fn default_category() -> Category {
    Category::Other
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct RecipeRequest {
    /// Ingredients to cook with; when omitted, the names of all non-expired
    /// stored items are used, soonest expiry first
    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub recipes: String,
}

/// Create the analysis router
pub fn analysis_router() -> Router<AppState> {
    Router::new()
        .route("/photo", post(analyze_photo))
        .route("/shelf-life", post(estimate_shelf_life))
}

/// Create the recipes router
pub fn recipes_router() -> Router<AppState> {
    Router::new().route("/", post(suggest_recipes))
}

/// Analyse a food photograph
#[utoipa::path(
    post,
    path = "/api/v1/analysis/photo",
    request_body = AnalyzePhotoRequest,
    responses(
        (status = 200, description = "Analysis returned", body = AnalyzePhotoResponse),
        (status = 400, description = "Invalid image payload", body = crate::errors::ErrorResponse),
        (status = 502, description = "AI collaborator failure", body = crate::errors::ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn analyze_photo(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzePhotoRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let image = BASE64.decode(payload.image_base64.trim()).map_err(|e| {
        ServiceError::ValidationError(format!("invalid base64 image payload: {e}"))
    })?;

    let analysis = state
        .services
        .recognition
        .analyze_food_photo(&image, &payload.mime_type)
        .await?;

    let uncertain = analysis.confidence <= UNCERTAIN_CONFIDENCE;

    Ok(Json(ApiResponse::success(AnalyzePhotoResponse {
        analysis,
        uncertain,
    })))
}

/// Estimate shelf life for a named food
#[utoipa::path(
    post,
    path = "/api/v1/analysis/shelf-life",
    request_body = ShelfLifeRequest,
    responses(
        (status = 200, description = "Estimate returned", body = ShelfLifeEstimate)
    ),
    tag = "analysis"
)]
pub async fn estimate_shelf_life(
    State(state): State<AppState>,
    Json(payload): Json<ShelfLifeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let estimate = state
        .services
        .recognition
        .estimate_shelf_life(&payload.name, payload.category, payload.location)
        .await;

    Ok(Json(ApiResponse::success(estimate)))
}

/// Suggest recipes from given or stored ingredients
#[utoipa::path(
    post,
    path = "/api/v1/recipes",
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe suggestions returned", body = RecipeResponse),
        (status = 502, description = "AI collaborator failure", body = crate::errors::ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn suggest_recipes(
    State(state): State<AppState>,
    Json(payload): Json<RecipeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let ingredients = if payload.ingredients.is_empty() {
        // list_all is ascending by expiry, so soonest-expiring names lead
        let today = freshness::today();
        state
            .services
            .foods
            .list_all()
            .await?
            .into_iter()
            .filter(|food| freshness::classify(food.expiry_date, today) != FreshnessStatus::Expired)
            .map(|food| food.name)
            .collect()
    } else {
        payload.ingredients
    };

    let recipes = state
        .services
        .recognition
        .suggest_recipes(&ingredients)
        .await?;

    Ok(Json(ApiResponse::success(RecipeResponse { recipes })))
}
