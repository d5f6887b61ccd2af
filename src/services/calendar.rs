//! Expiry reminders mirrored into a remote calendar (Google Calendar v3).
//!
//! Auth is the OAuth2 refresh-token grant: client id/secret and a refresh
//! token come from configuration, and access tokens are refreshed on demand
//! and cached until shortly before they expire. Bulk operations never
//! propagate individual event failures; they count them.

use chrono::{DateTime, Duration as TimeDelta, Utc};
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthUrl, ClientId, ClientSecret, RefreshToken,
    TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::config::CalendarConfig;
use crate::entities::food_item;
use crate::errors::ServiceError;

/// Marker appended to every event description this service creates. Bulk
/// delete removes only events carrying it.
pub const EVENT_MARKER: &str = "Added automatically by fridge-api";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
const DELETE_LOOKAHEAD_DAYS: i64 = 365;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct EventResource {
    id: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventResource>,
}

/// Service mirroring expiry dates as remote reminder events.
pub struct CalendarService {
    http: Client,
    config: CalendarConfig,
    token: Mutex<Option<CachedToken>>,
}

impl CalendarService {
    pub fn new(config: CalendarConfig) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build calendar HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    fn credential(&self, value: &Option<String>, what: &str) -> Result<String, ServiceError> {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::CollaboratorError(format!("calendar {what} is not configured"))
            })
    }

    /// A valid access token, refreshed through the OAuth2 refresh-token
    /// grant when the cached one is missing or about to expire.
    async fn access_token(&self) -> Result<String, ServiceError> {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Utc::now() + TimeDelta::seconds(TOKEN_EXPIRY_MARGIN_SECS) {
                return Ok(cached.access_token.clone());
            }
        }

        let client_id = self.credential(&self.config.client_id, "client id")?;
        let client_secret = self.credential(&self.config.client_secret, "client secret")?;
        let refresh_token = self.credential(&self.config.refresh_token, "refresh token")?;

        let oauth = BasicClient::new(
            ClientId::new(client_id),
            Some(ClientSecret::new(client_secret)),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())
                .map_err(|e| ServiceError::InternalError(format!("invalid auth URL: {e}")))?,
            Some(
                TokenUrl::new(self.config.token_url.clone())
                    .map_err(|e| ServiceError::InternalError(format!("invalid token URL: {e}")))?,
            ),
        );

        let token = oauth
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                ServiceError::CollaboratorError(format!("calendar token refresh failed: {e}"))
            })?;

        let access_token = token.access_token().secret().clone();
        let ttl = token
            .expires_in()
            .and_then(|d| TimeDelta::from_std(d).ok())
            .unwrap_or_else(|| TimeDelta::seconds(3600));

        *guard = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Utc::now() + ttl,
        });

        info!("calendar access token refreshed");

        Ok(access_token)
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.base_url.trim_end_matches('/'),
            self.config.calendar_id
        )
    }

    /// Create one all-day reminder event on the record's expiry date, with
    /// popups one and three days ahead. Returns the remote event id.
    #[instrument(skip(self, food), fields(food_id = %food.id))]
    pub async fn create_expiry_event(
        &self,
        food: &food_item::Model,
    ) -> Result<String, ServiceError> {
        let access_token = self.access_token().await?;
        let event_date = food.expiry_date.to_string();

        let description = format!(
            "Refrigerator expiry reminder\n\n\
             Food: {}\n\
             Category: {}\n\
             Storage: {}\n\
             Quantity: {} {}\n\
             Expires: {}\n\n\
             {}",
            food.name,
            food.category,
            food.location,
            food.quantity,
            food.unit,
            food.expiry_date,
            EVENT_MARKER
        );

        let body = json!({
            "summary": format!("Expiry: {}", food.name),
            "description": description,
            "start": { "date": event_date },
            "end": { "date": event_date },
            "reminders": {
                "useDefault": false,
                "overrides": [
                    { "method": "popup", "minutes": 24 * 60 },
                    { "method": "popup", "minutes": 3 * 24 * 60 },
                ],
            },
            "colorId": "11",
        });

        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ServiceError::CollaboratorError(format!("calendar event creation failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, %detail, "calendar provider rejected event creation");
            return Err(ServiceError::CollaboratorError(format!(
                "calendar provider returned {status}"
            )));
        }

        let event: EventResource = response.json().await.map_err(|e| {
            ServiceError::CollaboratorError(format!("malformed calendar response: {e}"))
        })?;

        Ok(event.id)
    }

    /// Mirror every given record as a reminder event, reporting
    /// `(success_count, fail_count)`. Individual failures are logged and
    /// counted, never propagated.
    #[instrument(skip(self, foods))]
    pub async fn sync_foods(&self, foods: &[food_item::Model]) -> (u32, u32) {
        let mut synced = 0;
        let mut failed = 0;

        for food in foods {
            match self.create_expiry_event(food).await {
                Ok(event_id) => {
                    info!(food_id = %food.id, %event_id, "expiry event created");
                    synced += 1;
                }
                Err(err) => {
                    warn!(food_id = %food.id, error = %err, "expiry event creation failed");
                    failed += 1;
                }
            }
        }

        (synced, failed)
    }

    /// Remove every upcoming event this service created, identified by the
    /// marker string in the event description. Returns the count removed.
    #[instrument(skip(self))]
    pub async fn delete_expiry_events(&self) -> Result<u32, ServiceError> {
        let access_token = self.access_token().await?;

        let now = Utc::now();
        let time_min = now.to_rfc3339();
        let time_max = (now + TimeDelta::days(DELETE_LOOKAHEAD_DAYS)).to_rfc3339();

        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(&access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("q", EVENT_MARKER),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await
            .map_err(|e| {
                ServiceError::CollaboratorError(format!("calendar event listing failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::CollaboratorError(format!(
                "calendar provider returned {status}"
            )));
        }

        let listing: EventList = response.json().await.map_err(|e| {
            ServiceError::CollaboratorError(format!("malformed calendar listing: {e}"))
        })?;

        let mut deleted = 0;
        for event in listing.items {
            let ours = event
                .description
                .as_deref()
                .is_some_and(|d| d.contains(EVENT_MARKER));
            if !ours {
                continue;
            }

            let url = format!("{}/{}", self.events_url(), event.id);
            match self.http.delete(url).bearer_auth(&access_token).send().await {
                Ok(response) if response.status().is_success() => deleted += 1,
                Ok(response) => {
                    warn!(event_id = %event.id, status = %response.status(), "calendar event deletion rejected");
                }
                Err(err) => {
                    warn!(event_id = %event.id, error = %err, "calendar event deletion failed");
                }
            }
        }

        info!(%deleted, "expiry events removed from calendar");

        Ok(deleted)
    }
}
