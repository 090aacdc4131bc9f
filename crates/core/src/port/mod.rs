// Port Layer - capabilities the engine consumes from the application

pub mod key_selector;
pub mod message_handler;
pub mod message_source;

use std::sync::Arc;

// Re-exports
pub use key_selector::{Identified, KeySelector};
pub use message_handler::{FnMessageHandler, HandlerError, MessageHandler};
pub use message_source::{FnMessageSource, MessageSource, SourceError};

/// Equality comparer used by the replenisher to drop duplicate candidates.
///
/// Compares whole messages, not ids; `None` disables dedup entirely.
pub type MessageComparer<M> = Arc<dyn Fn(&M, &M) -> bool + Send + Sync>;
