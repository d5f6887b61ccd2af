//! Fridge API Library
//!
//! Core functionality for the fridge-api service: durable food inventory
//! with expiry triage, AI-assisted intake, and calendar reminders.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod freshness;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// All `/api/v1` routes
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/foods", handlers::foods::foods_router())
        .nest("/analysis", handlers::analysis::analysis_router())
        .nest("/recipes", handlers::analysis::recipes_router())
        .nest("/calendar", handlers::calendar::calendar_router())
}
