//! Photo analysis, shelf-life estimation, and recipe suggestion through an
//! OpenAI-compatible chat-completions collaborator.
//!
//! The collaborator is opaque: it receives a prompt (plus an optional image
//! data URL) and returns text, from which JSON is extracted when a
//! structured answer was requested. Failures here never touch store state.

use std::str::FromStr;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, instrument, warn};
use utoipa::ToSchema;

use crate::config::AiConfig;
use crate::errors::ServiceError;
use crate::models::{Category, StorageLocation};

/// Confidence at or below which an analysis must not be auto-applied.
pub const UNCERTAIN_CONFIDENCE: i64 = 50;

const ANALYSIS_MAX_TOKENS: u32 = 1024;
const SHELF_LIFE_MAX_TOKENS: u32 = 512;
const RECIPE_MAX_TOKENS: u32 = 2048;

/// Structured result of analysing a food photograph.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FoodPhotoAnalysis {
    pub name: String,
    pub category: Category,
    /// Days of shelf life remaining, counted from today
    pub estimated_shelf_life_days: i64,
    pub location: StorageLocation,
    pub quantity: f64,
    /// Recognition confidence, 0-100
    pub confidence: i64,
    /// Date read off the packaging, when one was visible
    pub detected_date: Option<NaiveDate>,
}

/// Shelf-life estimate for a named food.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShelfLifeEstimate {
    pub estimated_days: i64,
    pub min_days: i64,
    pub max_days: i64,
    pub advice: String,
}

impl ShelfLifeEstimate {
    /// Fixed estimate used whenever the collaborator cannot be reached or
    /// its answer cannot be parsed.
    pub fn fallback() -> Self {
        Self {
            estimated_days: 7,
            min_days: 5,
            max_days: 10,
            advice: "Using a typical storage window.".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPhotoAnalysis {
    name: String,
    category: String,
    estimated_shelf_life_days: i64,
    location: String,
    #[serde(default)]
    quantity: Option<f64>,
    confidence: i64,
    #[serde(default)]
    detected_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawShelfLife {
    estimated_days: i64,
    min_days: i64,
    max_days: i64,
    #[serde(default)]
    advice: Option<String>,
}

/// Service wrapping the AI collaborator.
pub struct RecognitionService {
    http: Client,
    config: AiConfig,
}

impl RecognitionService {
    pub fn new(config: AiConfig) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build AI HTTP client: {e}"))
            })?;

        Ok(Self { http, config })
    }

    fn api_key(&self) -> Result<&str, ServiceError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ServiceError::CollaboratorError("AI provider API key is not configured".to_string())
            })
    }

    /// One chat-completion round trip; returns the raw reply text.
    async fn chat(&self, content: Value, max_tokens: u32) -> Result<String, ServiceError> {
        let api_key = self.api_key()?;

        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": max_tokens,
        });

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::CollaboratorError(format!("AI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, %detail, "AI provider returned an error");
            return Err(ServiceError::CollaboratorError(format!(
                "AI provider returned {status}"
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            ServiceError::CollaboratorError(format!("malformed AI response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ServiceError::CollaboratorError("AI response contained no content".to_string())
            })
    }

    /// Extract metadata for the food visible in a photograph.
    #[instrument(skip(self, image))]
    pub async fn analyze_food_photo(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<FoodPhotoAnalysis, ServiceError> {
        let data_url = format!("data:{};base64,{}", mime_type, BASE64.encode(image));
        let prompt = photo_analysis_prompt();

        let content = json!([
            { "type": "text", "text": prompt },
            { "type": "image_url", "image_url": { "url": data_url } },
        ]);

        let reply = self.chat(content, ANALYSIS_MAX_TOKENS).await?;
        let raw: RawPhotoAnalysis =
            serde_json::from_str(extract_json(&reply)).map_err(|e| {
                warn!(error = %e, reply = %reply, "unparseable photo analysis");
                ServiceError::CollaboratorError(format!("could not parse photo analysis: {e}"))
            })?;

        Ok(FoodPhotoAnalysis {
            category: Category::from_str(&raw.category).unwrap_or(Category::Other),
            location: StorageLocation::from_str(&raw.location).unwrap_or_default(),
            quantity: raw.quantity.unwrap_or(1.0),
            detected_date: raw
                .detected_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            name: raw.name,
            estimated_shelf_life_days: raw.estimated_shelf_life_days,
            confidence: raw.confidence,
        })
    }

    /// Estimate how long a food keeps. Never fails: any transport or parse
    /// problem yields the fixed fallback estimate.
    #[instrument(skip(self))]
    pub async fn estimate_shelf_life(
        &self,
        name: &str,
        category: Category,
        location: StorageLocation,
    ) -> ShelfLifeEstimate {
        match self.request_shelf_life(name, category, location).await {
            Ok(estimate) => estimate,
            Err(err) => {
                warn!(food = %name, error = %err, "shelf-life estimation failed, using fallback");
                ShelfLifeEstimate::fallback()
            }
        }
    }

    async fn request_shelf_life(
        &self,
        name: &str,
        category: Category,
        location: StorageLocation,
    ) -> Result<ShelfLifeEstimate, ServiceError> {
        let prompt = format!(
            "Food name: {name}\n\
             Category: {category}\n\
             Storage: {location}\n\n\
             Estimate the typical shelf life of this food.\n\n\
             Reply with JSON only, no other text:\n\
             {{\n\
                 \"estimated_days\": expected shelf life in days (number),\n\
                 \"min_days\": minimum keeping time in days (number),\n\
                 \"max_days\": maximum keeping time in days (number),\n\
                 \"advice\": \"one or two short sentences of storage advice\"\n\
             }}"
        );

        let reply = self
            .chat(Value::String(prompt), SHELF_LIFE_MAX_TOKENS)
            .await?;

        let raw: RawShelfLife = serde_json::from_str(extract_json(&reply)).map_err(|e| {
            ServiceError::CollaboratorError(format!("could not parse shelf-life estimate: {e}"))
        })?;

        Ok(ShelfLifeEstimate {
            estimated_days: raw.estimated_days,
            min_days: raw.min_days,
            max_days: raw.max_days,
            advice: raw
                .advice
                .unwrap_or_else(|| "Using a typical storage window.".to_string()),
        })
    }

    /// Suggest recipes for the given ingredients. An empty list
    /// short-circuits without calling the collaborator.
    #[instrument(skip(self))]
    pub async fn suggest_recipes(&self, ingredients: &[String]) -> Result<String, ServiceError> {
        if ingredients.is_empty() {
            return Ok("The refrigerator has no ingredients to cook with.".to_string());
        }

        let prompt = format!(
            "The refrigerator holds these ingredients:\n{}\n\n\
             Suggest 3 recipes that can be made from them. For each recipe give:\n\
             1. Dish name\n\
             2. Main ingredients used (from the list above)\n\
             3. Short preparation steps (3-4 steps)\n\
             4. Estimated cooking time\n\n\
             Prefer recipes that use the ingredients closest to their expiry date first.",
            ingredients.join(", ")
        );

        self.chat(Value::String(prompt), RECIPE_MAX_TOKENS).await
    }
}

/// Pull a JSON payload out of a model reply that may wrap it in markdown
/// fences.
fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }
    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }
    text.trim()
}

fn photo_analysis_prompt() -> String {
    format!(
        "Analyze the food visible in this image.\n\n\
         Important: if a date is printed anywhere in the image, read it with OCR and use it to \
         compute the actual remaining shelf life.\n\n\
         Egg-specific rule: the number stamped on an egg shell is the laying date (MMDD); \
         refrigerated eggs keep for 40 days from that date.\n\n\
         Date format examples:\n\
         - Milk carton \"2024.12.15\" means the expiry date is December 15\n\
         - \"25/12/20\" means 2025-12-20\n\n\
         Reply with JSON only, no other text:\n\
         {{\n\
             \"name\": \"specific food name\",\n\
             \"category\": \"one of: {categories}\",\n\
             \"estimated_shelf_life_days\": days remaining from today (number),\n\
             \"location\": \"one of: refrigerated, frozen, room_temperature\",\n\
             \"quantity\": count of items visible (number, count precisely),\n\
             \"confidence\": recognition confidence 0-100 (number),\n\
             \"detected_date\": \"date read from the image as YYYY-MM-DD, or null\"\n\
         }}\n\n\
         If several of the same food are visible, count them precisely into quantity.\n\
         If the image does not show food, set confidence to 0.",
        categories = "vegetable, fruit, meat, seafood, eggs, dairy, grain, condiment, sauce, \
                      side_dish, instant_food, bread, dessert, beverage, other"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"estimated_days\": 7}\n```\nEnjoy!";
        assert_eq!(extract_json(reply), "{\"estimated_days\": 7}");
    }

    #[test]
    fn extracts_json_from_bare_fence() {
        let reply = "```\n{\"estimated_days\": 7}\n```";
        assert_eq!(extract_json(reply), "{\"estimated_days\": 7}");
    }

    #[test]
    fn passes_raw_json_through() {
        let reply = "  {\"estimated_days\": 7}\n";
        assert_eq!(extract_json(reply), "{\"estimated_days\": 7}");
    }

    #[test]
    fn analysis_defaults_unknown_category_to_other() {
        let raw = r#"{
            "name": "mystery jar",
            "category": "pickled things",
            "estimated_shelf_life_days": 30,
            "location": "refrigerated",
            "confidence": 80
        }"#;
        let parsed: RawPhotoAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(
            Category::from_str(&parsed.category).unwrap_or(Category::Other),
            Category::Other
        );
        assert_eq!(parsed.quantity, None);
    }
}
