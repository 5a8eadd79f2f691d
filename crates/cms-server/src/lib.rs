//! Studio CMS server library.
//!
//! Backend for a bilingual (English/Arabic) marketing site:
//!
//! - **Pages**: block-based pages with per-locale titles, slugs and SEO
//! - **Blueprints**: reusable field schemas, including dynamic forms
//! - **Leads**: public lead capture with rate limiting and a CRM timeline
//! - **Forms**: dynamic form submissions with mail and CRM follow-ups
//! - **Analytics**: GA4, Search Console, Tag Manager, Business Profile and
//!   YouTube properties synced into Postgres
//! - **AI**: Groq-backed content generation for the editors
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`content`]: Locale resolution and block rendering
//! - [`db`]: Database connectivity, models and queries
//! - [`error`]: Error types with Axum integration
//! - [`handlers`]: HTTP route handlers
//! - [`services`]: Business logic per domain
//! - [`state`]: Shared application state

pub mod auth;
pub mod config;
pub mod content;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod rate_limit;
pub mod result_ext;
pub mod services;
pub mod state;
pub mod validation;

pub use error::{AppError, AppResult};
pub use result_ext::ResultExt;
