//! Studio CMS connectors.
//!
//! Clients for the external systems the CMS pulls from or calls out to:
//! the Google analytics APIs behind one [`SyncSource`] seam, and the Groq
//! chat endpoint used for content generation. Nothing here touches the
//! database.

pub mod auth;
pub mod error;
pub mod google;
pub mod groq;
pub mod records;
pub mod source;
pub mod window;
pub mod writer;

pub use auth::{ServiceAccountAuth, ServiceAccountKey, StaticToken, TokenSource};
pub use error::ConnectorError;
pub use groq::{ChatCompletion, GroqClient};
pub use records::{RecordKey, SourceKind, SyncRecord};
pub use source::{build_source, SyncSource};
pub use window::DateWindow;
pub use writer::ContentWriter;
