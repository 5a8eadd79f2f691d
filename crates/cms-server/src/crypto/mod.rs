//! Credential sealing for analytics properties.

pub mod sealer;

pub use sealer::CredentialSealer;
