//! Operational events emitted on credential health transitions: a
//! broadcast channel for live subscribers plus a pluggable sink list for
//! durable consumers (audit log, metrics).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::SystemTime;

use llmgate_catalog::{CredentialHealth, CredentialId};
use tokio::sync::{broadcast, RwLock};

#[derive(Debug, Clone)]
pub enum CredentialEvent {
    HealthChanged {
        at: SystemTime,
        credential_id: CredentialId,
        from: CredentialHealth,
        to: CredentialHealth,
        consecutive_failures: u32,
    },
    PassiveRecoveryProbe {
        at: SystemTime,
        credential_id: CredentialId,
    },
}

pub trait EventSink: Send + Sync {
    fn write<'a>(&'a self, event: &'a CredentialEvent) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

#[derive(Clone)]
pub struct EventHub {
    inner: Arc<Inner>,
}

struct Inner {
    tx: broadcast::Sender<CredentialEvent>,
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
}

impl EventHub {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self {
            inner: Arc::new(Inner {
                tx,
                sinks: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CredentialEvent> {
        self.inner.tx.subscribe()
    }

    pub async fn add_sink(&self, sink: Arc<dyn EventSink>) {
        self.inner.sinks.write().await.push(sink);
    }

    pub async fn emit(&self, event: CredentialEvent) {
        let _ = self.inner.tx.send(event.clone());
        let sinks = self.inner.sinks.read().await.clone();
        for sink in sinks {
            let event_ref = event.clone();
            tokio::spawn(async move {
                sink.write(&event_ref).await;
            });
        }
    }
}
