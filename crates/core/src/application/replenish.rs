// Pull replenishment policy.
//
// Invoked on the scheduler's cadence; refills the buffer toward the
// high-water mark whenever it drains below the low-water mark, skipping
// candidates already queued or in flight.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::application::queue::QueueCore;
use crate::domain::{QueueEntry, QueueSettings};
use crate::port::{KeySelector, MessageComparer, MessageSource};

/// Produces more work when asked. The engine runs whichever policy it was
/// constructed with; engines without one (push queues) simply never ask.
#[async_trait]
pub trait ReplenishPolicy: Send + Sync {
    async fn run_cycle(&self);
}

/// The source-driven policy behind pull queues.
pub struct PullReplenisher<M> {
    core: Arc<QueueCore<M>>,
    source: Arc<dyn MessageSource<M>>,
    key_selector: KeySelector<M>,
    comparer: Option<MessageComparer<M>>,
    settings: QueueSettings,
}

impl<M> PullReplenisher<M> {
    pub fn new(
        core: Arc<QueueCore<M>>,
        source: Arc<dyn MessageSource<M>>,
        key_selector: KeySelector<M>,
        comparer: Option<MessageComparer<M>>,
        settings: QueueSettings,
    ) -> Self {
        Self {
            core,
            source,
            key_selector,
            comparer,
            settings,
        }
    }
}

#[async_trait]
impl<M> ReplenishPolicy for PullReplenisher<M>
where
    M: Clone + Send + Sync + 'static,
{
    async fn run_cycle(&self) {
        let low = self.settings.min_queued;
        let high = self.settings.max_queued;
        let current = self.core.queue_count();
        if current >= low {
            return;
        }
        // Signed on purpose: min above max is a caller error the engine
        // does not reinterpret, it just ends up asking for nothing
        let want = high as i64 - current as i64;
        if want <= 0 {
            return;
        }

        let mut snapshot = self.core.processing_snapshot();
        let candidates = match self.source.get_list(want as usize).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(error = %e, "pull message error");
                return;
            }
        };
        if candidates.is_empty() {
            return;
        }

        let pulled = candidates.len();
        let mut enqueued = 0usize;
        for message in candidates {
            let id = self.key_selector.select(&message);
            if let Some(comparer) = &self.comparer {
                if snapshot.iter().any(|seen| comparer(&message, &seen.message)) {
                    warn!(message_id = %id, "message already queued or handling, ignoring enqueue");
                    continue;
                }
            }
            let entry = QueueEntry::new(id, message);
            // Later candidates in this batch dedup against this one too
            snapshot.push(entry.clone());
            self.core.add(entry).await;
            enqueued += 1;
        }

        info!(
            pulled,
            enqueued,
            ignored = pulled - enqueued,
            "pulled messages from source"
        );
    }
}
