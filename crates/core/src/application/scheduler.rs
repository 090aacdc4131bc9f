// Recurring task scheduler.
//
// Each named task gets its own spawned loop: sleep the due time, run the
// action, sleep the period, repeat. Re-arming only after the action has
// completed means two invocations of the same task never overlap; strict
// periodicity is traded for that guarantee.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::application::worker::{shutdown_channel, ShutdownSender};
use crate::error::QueueError;

struct TaskHandle {
    shutdown: ShutdownSender,
}

/// Runs named callbacks on a fixed period, serialized per task and
/// independently stoppable by name.
#[derive(Default)]
pub struct RecurringTaskScheduler {
    // Coarse lock: registration and removal are rare next to execution
    tasks: Mutex<HashMap<String, TaskHandle>>,
}

impl RecurringTaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<String, TaskHandle>> {
        self.tasks.lock().expect("task table lock poisoned")
    }

    /// Register and arm a recurring task.
    ///
    /// Duplicate registration is silently ignored: the first registration
    /// wins. The task fires once after `due_time`, then every `period`
    /// after each completed run. Action errors and panics are logged and
    /// the task is re-armed; only [`RecurringTaskScheduler::stop_task`]
    /// removes it.
    pub fn start_task<F, Fut>(
        &self,
        name: impl Into<String>,
        action: F,
        due_time: Duration,
        period: Duration,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), QueueError>> + Send + 'static,
    {
        let name = name.into();
        let mut tasks = self.tasks();
        if tasks.contains_key(&name) {
            debug!(task = %name, "task already registered, ignoring");
            return;
        }

        let (shutdown, mut token) = shutdown_channel();
        let task_name = name.clone();
        tokio::spawn(async move {
            debug!(task = %task_name, due_ms = due_time.as_millis() as u64, period_ms = period.as_millis() as u64, "task armed");
            tokio::select! {
                _ = sleep(due_time) => {}
                _ = token.wait() => return,
            }
            loop {
                if token.is_shutdown() {
                    break;
                }
                // Isolated in its own task so a panicking action cannot
                // take the schedule down with it
                match tokio::spawn(action()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(
                            task = %task_name,
                            due_ms = due_time.as_millis() as u64,
                            period_ms = period.as_millis() as u64,
                            error = %e,
                            "scheduled task failed"
                        );
                    }
                    Err(join_err) if join_err.is_panic() => {
                        error!(
                            task = %task_name,
                            due_ms = due_time.as_millis() as u64,
                            period_ms = period.as_millis() as u64,
                            "scheduled task panicked"
                        );
                    }
                    // Cancellation mid-action races a stop; benign
                    Err(_) => break,
                }
                tokio::select! {
                    _ = sleep(period) => {}
                    _ = token.wait() => break,
                }
            }
            debug!(task = %task_name, "task stopped");
        });

        tasks.insert(name.clone(), TaskHandle { shutdown });
        info!(task = %name, "task registered");
    }

    /// Disarm and remove a task. Idempotent; stopping a task exactly while
    /// its action runs lets the action finish.
    pub fn stop_task(&self, name: &str) {
        if let Some(task) = self.tasks().remove(name) {
            task.shutdown.shutdown();
            info!(task = %name, "task unregistered");
        }
    }

    /// Whether a task with this name is currently registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.tasks().contains_key(name)
    }
}
