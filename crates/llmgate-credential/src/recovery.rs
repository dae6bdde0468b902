//! Passive recovery queue: a `BinaryHeap` of deadlines woken by `Notify`,
//! drained by one background task. Rather than flipping a credential
//! straight back to fully healthy, this queue only demotes `unhealthy` to
//! `degraded`; one retry attempt has to succeed before `record_success`
//! restores `healthy`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::SystemTime;

use llmgate_catalog::{CredentialHealth, CredentialId};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::{sleep_until, Instant};

use crate::events::{CredentialEvent, EventHub};

/// Keyed by credential id so a credential can only have one pending probe;
/// a new `schedule` call replaces the old deadline.
pub struct RecoveryQueue {
    heap: Mutex<BinaryHeap<Reverse<(Instant, CredentialId)>>>,
    scheduled: Mutex<HashMap<CredentialId, Instant>>,
    notify: Notify,
}

impl RecoveryQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            heap: Mutex::new(BinaryHeap::new()),
            scheduled: Mutex::new(HashMap::new()),
            notify: Notify::new(),
        })
    }

    pub async fn schedule(&self, credential_id: CredentialId, at: Instant) {
        {
            let mut scheduled = self.scheduled.lock().await;
            scheduled.insert(credential_id, at);
        }
        {
            let mut heap = self.heap.lock().await;
            heap.push(Reverse((at, credential_id)));
        }
        self.notify.notify_one();
    }

    /// Spawns the background loop. `states` is the live health map the
    /// dispatch path reads; `demote` is called with the write lock already
    /// dropped so it can re-take it as needed.
    pub fn spawn_recover_task(
        self: Arc<Self>,
        states: Arc<RwLock<HashMap<CredentialId, (CredentialHealth, u32)>>>,
        events: EventHub,
    ) {
        tokio::spawn(async move {
            loop {
                let next = {
                    let heap = self.heap.lock().await;
                    heap.peek().map(|Reverse((t, id))| (*t, *id))
                };

                match next {
                    None => {
                        self.notify.notified().await;
                        continue;
                    }
                    Some((deadline, _)) => sleep_until(deadline).await,
                }

                let now = Instant::now();
                let mut due = Vec::new();
                {
                    let mut heap = self.heap.lock().await;
                    while let Some(Reverse((t, id))) = heap.peek().copied() {
                        if t > now {
                            break;
                        }
                        heap.pop();
                        due.push((t, id));
                    }
                }
                if due.is_empty() {
                    continue;
                }

                let mut scheduled = self.scheduled.lock().await;
                let mut guard = states.write().await;
                for (t, id) in due {
                    // A later `schedule` call for the same credential replaces
                    // the deadline; a stale heap entry whose scheduled time
                    // has moved on is skipped.
                    if scheduled.get(&id) != Some(&t) {
                        continue;
                    }
                    scheduled.remove(&id);

                    if let Some((CredentialHealth::Unhealthy, failures)) = guard.get(&id).copied() {
                        guard.insert(id, (CredentialHealth::Degraded, failures));
                        drop(guard);
                        events
                            .emit(CredentialEvent::PassiveRecoveryProbe {
                                at: SystemTime::now(),
                                credential_id: id,
                            })
                            .await;
                        guard = states.write().await;
                    }
                }
            }
        });
    }
}
