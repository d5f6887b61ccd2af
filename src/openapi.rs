use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::foods::create_food,
        crate::handlers::foods::list_foods,
        crate::handlers::foods::get_food,
        crate::handlers::foods::update_food,
        crate::handlers::foods::delete_food,
        crate::handlers::foods::list_expiring,
        crate::handlers::foods::list_expired,
        crate::handlers::analysis::analyze_photo,
        crate::handlers::analysis::estimate_shelf_life,
        crate::handlers::analysis::suggest_recipes,
        crate::handlers::calendar::sync_calendar,
        crate::handlers::calendar::clear_calendar_events,
    ),
    components(schemas(
        crate::handlers::foods::FoodResponse,
        crate::handlers::foods::CreateFoodRequest,
        crate::handlers::foods::UpdateFoodRequest,
        crate::handlers::foods::DeleteFoodResponse,
        crate::handlers::analysis::AnalyzePhotoRequest,
        crate::handlers::analysis::AnalyzePhotoResponse,
        crate::handlers::analysis::ShelfLifeRequest,
        crate::handlers::analysis::RecipeRequest,
        crate::handlers::analysis::RecipeResponse,
        crate::handlers::calendar::CalendarSyncResponse,
        crate::handlers::calendar::ClearEventsResponse,
        crate::services::recognition::FoodPhotoAnalysis,
        crate::services::recognition::ShelfLifeEstimate,
        crate::models::Category,
        crate::models::StorageLocation,
        crate::models::QuantityUnit,
        crate::freshness::FreshnessStatus,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "foods", description = "Food inventory and expiry triage"),
        (name = "analysis", description = "AI-assisted intake"),
        (name = "calendar", description = "Expiry reminders in a remote calendar")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
