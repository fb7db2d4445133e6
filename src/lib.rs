//! Scout: web search service for chat front-ends.
//!
//! Wraps the [`scout_search`] pipeline in an HTTP service:
//! query → SearXNG → concurrent headless scrape → aggregated JSON response.
//!
//! # Architecture
//!
//! - **Config**: [`ServiceConfig`] loaded from TOML with `SCOUT_*` overrides
//! - **Server**: [`SearchServer`] exposes `POST /search` and `GET /health`
//!   via `axum`
//! - **Pipeline**: [`scout_search::SearchOrchestrator`] over a Chromium
//!   renderer in production, or the fixture renderer in tests

pub mod config;
pub mod error;
pub mod server;

pub use config::{ServerConfig, ServiceConfig};
pub use error::{Result, ServiceError};
pub use server::{SearchRequest, SearchServer};
