// Application Layer - the queue machinery

pub mod builder;
pub mod engine;
pub mod queue;
pub mod replenish;
pub mod scheduler;
pub mod worker;

// Re-exports
pub use builder::QueueBuilder;
pub use engine::QueueEngine;
pub use queue::QueueCore;
pub use replenish::{PullReplenisher, ReplenishPolicy};
pub use scheduler::RecurringTaskScheduler;
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken, WorkerPool};
