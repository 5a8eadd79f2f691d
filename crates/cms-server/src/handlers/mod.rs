//! HTTP handlers for the CMS API, one module per domain.

pub mod ai;
pub mod analytics;
pub mod blueprints;
pub mod forms;
pub mod health;
pub mod leads;
pub mod pages;

pub use health::{api_health, health_check};
