//! Configuration loaded from environment variables.
//!
//! Each section is parsed with `envy` under its own prefix.

mod ai;
mod app;
mod database;
mod mail;

pub use ai::AiConfig;
pub use app::AppConfig;
pub use database::DatabaseConfig;
pub use mail::{split_recipients, MailConfig};
