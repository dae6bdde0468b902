//! Background health monitor: a process-wide periodic task that
//! probes every enabled provider's adapter and writes the result into the
//! shared provider-health map `DispatchEngine` reads on the routing path.
//!
//! Lifecycle follows the same shape as the credential recovery queue's
//! spawned loop: a `tokio::spawn`ed task consulted by the request path
//! through shared state, generalized here with an explicit stop signal
//! since this task must be stoppable at service shutdown.

use std::sync::Arc;
use std::time::Duration;

use llmgate_catalog::CatalogView;
use llmgate_dispatch::DispatchEngine;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Runs the periodic provider health sweep. Cheap to clone; the
/// inner state lives behind `Arc`s shared with whatever spawned the task.
pub struct HealthMonitor {
    catalog: Arc<CatalogView>,
    engine: Arc<DispatchEngine>,
    interval: Duration,
    max_concurrency: usize,
}

/// Returned by `start`; `stop` cancels the loop's root token and waits for
/// it to exit before returning.
pub struct HealthMonitorHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl HealthMonitorHandle {
    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.join.await;
    }
}

impl HealthMonitor {
    pub fn new(catalog: Arc<CatalogView>, engine: Arc<DispatchEngine>) -> Self {
        Self {
            catalog,
            engine,
            interval: DEFAULT_INTERVAL,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Starts the loop as a child of `parent`.
    pub fn start(self, parent: &CancellationToken) -> HealthMonitorHandle {
        let token = parent.child_token();
        let loop_token = token.clone();
        let catalog = self.catalog;
        let engine = self.engine;
        let interval = self.interval;
        let max_concurrency = self.max_concurrency;

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately; that's fine here (unlike an SSE
            // heartbeat, the first sweep should happen right at startup).
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        run_sweep(&catalog, &engine, max_concurrency, &loop_token).await;
                    }
                }
            }
        });

        HealthMonitorHandle { token, join }
    }
}

async fn run_sweep(
    catalog: &Arc<CatalogView>,
    engine: &Arc<DispatchEngine>,
    max_concurrency: usize,
    token: &CancellationToken,
) {
    let snapshot = catalog.load();
    let provider_ids: Vec<_> = snapshot
        .providers
        .iter()
        .filter(|p| p.enabled)
        .map(|p| p.id)
        .collect();
    if provider_ids.is_empty() {
        return;
    }

    let semaphore = Arc::new(Semaphore::new(max_concurrency.min(provider_ids.len()).max(1)));
    let mut tasks = Vec::with_capacity(provider_ids.len());
    for provider_id in provider_ids {
        if token.is_cancelled() {
            break;
        }
        let semaphore = semaphore.clone();
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return;
            };
            if let Err(err) = engine.provider_health_check(provider_id).await {
                tracing::warn!(provider_id, error = %err, "health check failed");
            }
        }));
    }

    for task in tasks {
        let _ = task.await;
    }
}
