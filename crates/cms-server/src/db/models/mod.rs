//! Row models and request/response types for the `cms` schema.

pub mod blueprint;
pub mod form;
pub mod lead;
pub mod metrics;
pub mod page;
pub mod property;

pub use blueprint::*;
pub use form::*;
pub use lead::*;
pub use metrics::*;
pub use page::*;
pub use property::*;
