// Queue engine - composes the core, the scheduler, the worker pool and an
// optional replenishment policy behind one start/stop lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::application::queue::QueueCore;
use crate::application::replenish::ReplenishPolicy;
use crate::application::scheduler::RecurringTaskScheduler;
use crate::application::worker::WorkerPool;
use crate::domain::{MessageContext, MessageId, QueueEntry, QueueSettings};
use crate::error::{QueueError, Result};
use crate::port::{KeySelector, MessageHandler};

/// Scheduler task name for the pull cycle
pub(crate) const PULL_TASK: &str = "queue.pull-messages";
/// Worker pool name; workers log as `queue.consume[i]`
pub(crate) const CONSUME_POOL: &str = "queue.consume";

/// A running (or startable) queue: bounded buffer, worker pool, and - for
/// pull configurations - a scheduled replenishment policy.
///
/// Built by [`crate::application::builder::QueueBuilder`]; the
/// configuration is immutable once built.
pub struct QueueEngine<M> {
    settings: QueueSettings,
    core: Arc<QueueCore<M>>,
    handler: Arc<dyn MessageHandler<M>>,
    key_selector: KeySelector<M>,
    scheduler: RecurringTaskScheduler,
    pool: WorkerPool,
    policy: Option<(Arc<dyn ReplenishPolicy>, Duration)>,
    started: AtomicBool,
}

impl<M> std::fmt::Debug for QueueEngine<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEngine")
            .field("settings", &self.settings)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl<M> QueueEngine<M>
where
    M: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        settings: QueueSettings,
        core: Arc<QueueCore<M>>,
        handler: Arc<dyn MessageHandler<M>>,
        key_selector: KeySelector<M>,
        policy: Option<(Arc<dyn ReplenishPolicy>, Duration)>,
    ) -> Self {
        let pool = WorkerPool::new(settings.worker_count);
        Self {
            settings,
            core,
            handler,
            key_selector,
            scheduler: RecurringTaskScheduler::new(),
            pool,
            policy,
            started: AtomicBool::new(false),
        }
    }

    /// Start pulling (when configured) and processing messages.
    ///
    /// May be called at most once per engine; a second call fails with
    /// [`QueueError::InvalidState`]. Must run inside a tokio runtime.
    pub fn start(&self) -> Result<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(QueueError::InvalidState(
                "start() must only be called once".to_string(),
            ));
        }

        if let Some((policy, interval)) = &self.policy {
            let policy = Arc::clone(policy);
            self.scheduler.start_task(
                PULL_TASK,
                move || {
                    let policy = Arc::clone(&policy);
                    async move {
                        policy.run_cycle().await;
                        Ok(())
                    }
                },
                *interval,
                *interval,
            );
        }

        let core = Arc::clone(&self.core);
        let handler = Arc::clone(&self.handler);
        self.pool.start(CONSUME_POOL, move |mut token| {
            let core = Arc::clone(&core);
            let handler = Arc::clone(&handler);
            async move {
                // Only the idle wait races the stop signal; a message
                // already taken is always processed to completion
                let entry = tokio::select! {
                    entry = core.take() => entry,
                    _ = token.wait() => return,
                };
                consume_one(&core, &handler, entry).await;
            }
        });

        Ok(())
    }

    /// Stop pulling and signal every worker to exit after its current
    /// iteration. Idempotent; in-progress handler calls finish.
    pub fn stop(&self) {
        self.scheduler.stop_task(PULL_TASK);
        self.pool.stop();
    }

    /// Enqueue a single message, awaiting free space when the buffer is at
    /// capacity. Returns the id the message was enqueued under.
    pub async fn enqueue(&self, message: M) -> MessageId {
        let id = self.key_selector.select(&message);
        self.core.add(QueueEntry::new(id.clone(), message)).await;
        id
    }

    /// Point-in-time buffered length.
    pub fn queue_count(&self) -> usize {
        self.core.queue_count()
    }

    /// Number of messages currently being handled.
    pub fn in_flight_count(&self) -> usize {
        self.core.in_flight_count()
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }
}

/// One worker iteration after a successful take: register the entry as in
/// flight, run the handler isolated from panics, always unregister.
async fn consume_one<M>(
    core: &Arc<QueueCore<M>>,
    handler: &Arc<dyn MessageHandler<M>>,
    entry: QueueEntry<M>,
) where
    M: Clone + Send + Sync + 'static,
{
    let id = entry.id.clone();
    if !core.register_in_flight(&entry) {
        warn!(message_id = %id, "message already handling, ignoring");
        return;
    }

    let handler = Arc::clone(handler);
    let context = MessageContext::new(entry.id, entry.message);
    match tokio::spawn(async move { handler.handle(context).await }).await {
        Ok(Ok(())) => {
            debug!(message_id = %id, "message handled");
        }
        Ok(Err(e)) => {
            error!(message_id = %id, error = %e, "message handling failed");
        }
        Err(join_err) => {
            if join_err.is_panic() {
                error!(message_id = %id, "message handler panicked");
            } else {
                error!(message_id = %id, "message handling cancelled");
            }
        }
    }

    if !core.remove_in_flight(&id) {
        debug!(message_id = %id, "in-flight entry already removed");
    }
}
