// Conveyor - in-process concurrent message queue engine.
// No infrastructure dependencies: the embedder supplies the message source
// and handler, the engine supplies the buffer, scheduler and worker pool.

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{
    PullReplenisher, QueueBuilder, QueueCore, QueueEngine, RecurringTaskScheduler, ReplenishPolicy,
    WorkerPool,
};
pub use domain::{MessageContext, MessageId, QueueEntry, QueueSettings};
pub use error::{QueueError, Result};
pub use port::{HandlerError, Identified, KeySelector, MessageHandler, MessageSource, SourceError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
