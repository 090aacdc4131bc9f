// Worker pool - fixed number of independent drain loops

mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

#[derive(Default)]
struct PoolState {
    running: bool,
    shutdown: Option<ShutdownSender>,
}

/// Fixed-size pool of detached worker loops, each running the same
/// per-iteration body until stopped.
///
/// The body receives a [`ShutdownToken`] so it can race its blocking
/// dequeue against the stop signal; work already picked up runs to
/// completion. Worker tasks are detached: [`WorkerPool::stop`] signals
/// them and returns without joining.
pub struct WorkerPool {
    size: usize,
    state: Mutex<PoolState>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(PoolState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().expect("pool state lock poisoned")
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Spin up exactly `size` worker loops. Starting an already-running
    /// pool is a no-op.
    pub fn start<F, Fut>(&self, name: &str, body: F)
    where
        F: Fn(ShutdownToken) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state();
        if state.running {
            debug!(pool = %name, "worker pool already running, ignoring start");
            return;
        }

        let (sender, token) = shutdown_channel();
        for i in 0..self.size {
            let worker_name = format!("{name}[{i}]");
            let token = token.clone();
            let body = body.clone();
            tokio::spawn(async move {
                info!(worker = %worker_name, "worker started");
                loop {
                    if token.is_shutdown() {
                        break;
                    }
                    body(token.clone()).await;
                }
                info!(worker = %worker_name, "worker stopped");
            });
        }

        state.shutdown = Some(sender);
        state.running = true;
        info!(pool = %name, workers = self.size, "worker pool started");
    }

    /// Signal every worker to exit after its current iteration. Idempotent;
    /// never interrupts a handler mid-call.
    pub fn stop(&self) {
        let mut state = self.state();
        if let Some(sender) = state.shutdown.take() {
            sender.shutdown();
            info!("worker pool stop requested");
        }
        state.running = false;
    }
}
