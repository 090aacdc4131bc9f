// Queue core: FIFO buffer plus in-flight registry.
//
// Both live behind one mutex held only for short critical sections; waiting
// (empty buffer on take, full buffer on add) happens on Notify, never while
// holding the lock. A Notified future is always created before the state
// check, so a wakeup between check and await is not lost.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::domain::{MessageId, QueueEntry};

struct CoreState<M> {
    buffered: VecDeque<QueueEntry<M>>,
    in_flight: HashMap<MessageId, M>,
}

/// Bounded FIFO of `{id, message}` pairs plus the registry of messages
/// currently owned by a worker.
///
/// `capacity: Some(n)` makes [`QueueCore::add`] await free space (push
/// configuration); `None` leaves the buffer unbounded (pull configuration,
/// where the replenisher already sizes batches against the high-water mark).
pub struct QueueCore<M> {
    capacity: Option<usize>,
    state: Mutex<CoreState<M>>,
    item_added: Notify,
    space_freed: Notify,
}

impl<M> QueueCore<M> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            state: Mutex::new(CoreState {
                buffered: VecDeque::new(),
                in_flight: HashMap::new(),
            }),
            item_added: Notify::new(),
            space_freed: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, CoreState<M>> {
        // Lock is only held for short non-panicking sections
        self.state.lock().expect("queue state lock poisoned")
    }

    /// Append an entry, awaiting free space when the buffer is bounded and
    /// at capacity.
    pub async fn add(&self, entry: QueueEntry<M>) {
        loop {
            let freed = self.space_freed.notified();
            {
                let mut state = self.state();
                let has_space = match self.capacity {
                    Some(capacity) => state.buffered.len() < capacity,
                    None => true,
                };
                if has_space {
                    state.buffered.push_back(entry);
                    drop(state);
                    self.item_added.notify_waiters();
                    return;
                }
            }
            freed.await;
        }
    }

    /// Remove and return the oldest entry, awaiting one if the buffer is
    /// empty.
    ///
    /// Cancel safe: the entry is popped synchronously under the lock, so a
    /// cancelled `take` never loses an entry.
    pub async fn take(&self) -> QueueEntry<M> {
        loop {
            let added = self.item_added.notified();
            {
                let mut state = self.state();
                if let Some(entry) = state.buffered.pop_front() {
                    drop(state);
                    self.space_freed.notify_waiters();
                    return entry;
                }
            }
            added.await;
        }
    }

    /// Point-in-time buffered length; an estimate under concurrent mutation.
    pub fn queue_count(&self) -> usize {
        self.state().buffered.len()
    }

    /// Number of messages currently owned by workers.
    pub fn in_flight_count(&self) -> usize {
        self.state().in_flight.len()
    }

    /// Record an entry as being handled. Returns false when the id is
    /// already registered; the caller drops the entry without handling it.
    pub fn register_in_flight(&self, entry: &QueueEntry<M>) -> bool
    where
        M: Clone,
    {
        let mut state = self.state();
        if state.in_flight.contains_key(&entry.id) {
            return false;
        }
        state
            .in_flight
            .insert(entry.id.clone(), entry.message.clone());
        true
    }

    /// Remove a handled entry from the registry. Returns false when the id
    /// was not registered (double removal); not fatal.
    pub fn remove_in_flight(&self, id: &MessageId) -> bool {
        self.state().in_flight.remove(id).is_some()
    }

    /// Copy of buffered plus in-flight entries, for the replenisher's dedup
    /// check. Best-effort and non-atomic: entries may be added or completed
    /// between the snapshot and its use. The consistency goal is "reduce
    /// duplicate work", not "prevent it".
    pub fn processing_snapshot(&self) -> Vec<QueueEntry<M>>
    where
        M: Clone,
    {
        let state = self.state();
        let mut snapshot: Vec<QueueEntry<M>> = state.buffered.iter().cloned().collect();
        snapshot.extend(
            state
                .in_flight
                .iter()
                .map(|(id, message)| QueueEntry::new(id.clone(), message.clone())),
        );
        snapshot
    }
}
