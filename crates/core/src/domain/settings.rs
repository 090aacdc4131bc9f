// Queue settings

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Sizing knobs for a queue.
///
/// `max_queued` is the high-water mark the replenisher refills toward (and
/// the hard capacity bound for push-style queues); `min_queued` is the
/// low-water mark below which replenishment triggers. `min_queued` and
/// `max_queued` are deliberately not cross-validated against each other:
/// a `min_queued` above `max_queued` is a caller error that silently
/// suppresses replenishment, not something the engine reinterprets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Number of worker loops draining the queue
    pub worker_count: usize,
    /// High-water mark
    pub max_queued: usize,
    /// Low-water mark
    pub min_queued: usize,
}

impl QueueSettings {
    pub fn new(worker_count: usize, max_queued: usize, min_queued: usize) -> Self {
        Self {
            worker_count,
            max_queued,
            min_queued,
        }
    }

    /// Reject zero values. Called by the builder before anything is spawned.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(DomainError::InvalidSetting {
                field: "worker_count",
                value: self.worker_count,
            });
        }
        if self.max_queued == 0 {
            return Err(DomainError::InvalidSetting {
                field: "max_queued",
                value: self.max_queued,
            });
        }
        if self.min_queued == 0 {
            return Err(DomainError::InvalidSetting {
                field: "min_queued",
                value: self.min_queued,
            });
        }
        Ok(())
    }
}
