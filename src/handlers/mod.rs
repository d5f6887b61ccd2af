pub mod analysis;
pub mod calendar;
pub mod foods;
pub mod health;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub foods: crate::services::foods::FoodService,
    pub recognition: Arc<crate::services::recognition::RecognitionService>,
    pub calendar: Arc<crate::services::calendar::CalendarService>,
}

impl AppServices {
    /// Build the services container from the shared pool and configuration.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let foods = crate::services::foods::FoodService::new(db_pool, event_sender);
        let recognition = Arc::new(crate::services::recognition::RecognitionService::new(
            config.ai.clone(),
        )?);
        let calendar = Arc::new(crate::services::calendar::CalendarService::new(
            config.calendar.clone(),
        )?);

        Ok(Self {
            foods,
            recognition,
            calendar,
        })
    }
}
