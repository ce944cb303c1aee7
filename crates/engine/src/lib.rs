// polysync-engine library entry point.

pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod intake;
pub mod provider;
pub mod save;
pub mod security;
pub mod store;

pub use error::{EngineError, ProviderError, StoreError, ValidationError};
