//! Service layer for the CMS.
//!
//! Services hold the business rules and sit between the handlers and the
//! database queries.

pub mod ai;
pub mod analytics;
pub mod blueprint;
pub mod form;
pub mod lead;
pub mod page;
pub mod sync;

pub use ai::AiService;
pub use analytics::AnalyticsService;
pub use blueprint::BlueprintService;
pub use form::FormService;
pub use lead::LeadService;
pub use page::PageService;
