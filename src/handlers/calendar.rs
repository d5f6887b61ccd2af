use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::events::Event;
use crate::freshness;
use crate::{ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarSyncResponse {
    pub synced: u32,
    pub failed: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearEventsResponse {
    pub deleted: u32,
}

/// Create the calendar router
pub fn calendar_router() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync_calendar))
        .route("/events", delete(clear_calendar_events))
}

/// Mirror all non-expired records into the remote calendar
#[utoipa::path(
    post,
    path = "/api/v1/calendar/sync",
    responses(
        (status = 200, description = "Sync outcome returned", body = CalendarSyncResponse)
    ),
    tag = "calendar"
)]
pub async fn sync_calendar(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let today = freshness::today();
    let foods: Vec<_> = state
        .services
        .foods
        .list_all()
        .await?
        .into_iter()
        .filter(|food| food.expiry_date >= today)
        .collect();

    let (synced, failed) = state.services.calendar.sync_foods(&foods).await;

    state
        .event_sender
        .send(Event::CalendarSynced { synced, failed })
        .await
        .map_err(ServiceError::EventError)?;

    Ok(Json(ApiResponse::success(CalendarSyncResponse {
        synced,
        failed,
    })))
}

/// Remove every reminder event this service created
#[utoipa::path(
    delete,
    path = "/api/v1/calendar/events",
    responses(
        (status = 200, description = "Deletion count returned", body = ClearEventsResponse),
        (status = 502, description = "Calendar collaborator failure", body = crate::errors::ErrorResponse)
    ),
    tag = "calendar"
)]
pub async fn clear_calendar_events(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let deleted = state.services.calendar.delete_expiry_events().await?;

    Ok(Json(ApiResponse::success(ClearEventsResponse { deleted })))
}
