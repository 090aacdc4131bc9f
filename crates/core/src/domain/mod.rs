// Domain Layer - pure data model, no machinery

pub mod error;
pub mod message;
pub mod settings;

// Re-exports
pub use error::DomainError;
pub use message::{MessageContext, MessageId, QueueEntry};
pub use settings::QueueSettings;
