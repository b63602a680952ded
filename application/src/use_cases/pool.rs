//! Client pool: warmed session clients with exclusive checkout.
//!
//! The pool owns N slots, each pairing a session client with a
//! [`SlotState`]. It is the only component with cross-slot visibility.
//!
//! # Algorithms
//!
//! - **Warmup**: slots are initialized in batches of `warmup_batch_size`,
//!   concurrently within a batch, with `stagger_delay` between batches.
//! - **Acquire**: atomic claim of the first `ready && !busy` slot; when none
//!   is free, poll until the deadline computed at entry.
//! - **Execute**: run a closure against a leased client; session/auth
//!   failures take the slot out of rotation.
//! - **Health check**: re-initialize unhealthy slots, then replace idle
//!   sessions older than `session_max_age`.
//!
//! Slot flags live behind a per-slot `std::sync::Mutex` that is never held
//! across an `.await`.

use crate::client::{ClientError, SessionClient};
use crate::config::PoolParams;
use crate::ports::transport::{TransportError, TransportFactory};
use abra_domain::{ExhaustionPolicy, SlotPhase, SlotState, StructuredResult};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors surfaced by the pool
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("No healthy clients available")]
    Unavailable,

    #[error("Queue timeout after {0:?}: all clients busy")]
    Timeout(Duration),

    #[error("No clients could be initialized")]
    NoClientsInitialized,

    #[error("Pool is shut down")]
    ShutDown,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// What the pool needs from a session client.
#[async_trait]
pub trait PooledSession: Send + Sync + 'static {
    async fn ensure_session(&self) -> Result<(), ClientError>;

    async fn reset_session(&self);

    async fn send_prompt(&self, prompt: &str) -> Result<StructuredResult, ClientError>;

    async fn close(&self) -> Result<(), ClientError>;
}

#[async_trait]
impl PooledSession for SessionClient {
    async fn ensure_session(&self) -> Result<(), ClientError> {
        SessionClient::ensure_session(self).await
    }

    async fn reset_session(&self) {
        SessionClient::reset_session(self).await
    }

    async fn send_prompt(&self, prompt: &str) -> Result<StructuredResult, ClientError> {
        SessionClient::send_prompt(self, prompt).await
    }

    async fn close(&self) -> Result<(), ClientError> {
        SessionClient::close(self).await
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub size: usize,
    pub ready: usize,
    pub busy: usize,
    pub initializing: usize,
    pub served: u64,
}

/// Outcome of one health-check pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub reinitialized: usize,
    pub refreshed: usize,
    pub failed: usize,
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

struct PoolSlot<C> {
    id: usize,
    client: Arc<C>,
    state: Mutex<SlotState>,
}

impl<C> PoolSlot<C> {
    fn with_state<R>(&self, f: impl FnOnce(&mut SlotState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

struct PoolInner<C> {
    slots: Vec<PoolSlot<C>>,
    params: PoolParams,
    served: AtomicU64,
    waits: AtomicU64,
    shut_down: AtomicBool,
}

impl<C: PooledSession> PoolInner<C> {
    fn count(&self, pred: impl Fn(&SlotState) -> bool) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.with_state(|s| pred(s)))
            .count()
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn ready_count(&self) -> usize {
        self.count(|s| s.ready)
    }

    fn release(&self, slot_id: usize) {
        if let Some(slot) = self.slots.get(slot_id) {
            slot.with_state(|s| s.release());
        }

        let served = self.served.fetch_add(1, Ordering::SeqCst) + 1;
        if served % 10 == 0 {
            info!(
                "Progress: {} completed, {} busy",
                served,
                self.count(|s| s.busy)
            );
        }
    }

    async fn init_slot(&self, slot: &PoolSlot<C>) -> bool {
        if !slot.with_state(|s| s.begin_init()) {
            return false;
        }

        match slot.client.ensure_session().await {
            Ok(()) => {
                slot.with_state(|s| s.finish_init(now()));
                info!(client = slot.id, "Client ready");
                true
            }
            Err(e) => {
                slot.with_state(|s| s.fail_init());
                warn!(client = slot.id, "Client warmup failed: {}", e);
                false
            }
        }
    }

    async fn health_check(&self) -> HealthReport {
        let mut report = HealthReport::default();

        let unhealthy: Vec<&PoolSlot<C>> = self
            .slots
            .iter()
            .filter(|slot| slot.with_state(|s| s.needs_reinit()))
            .collect();
        if !unhealthy.is_empty() {
            info!("Health check: {} client(s) need re-init", unhealthy.len());
        }
        for slot in unhealthy {
            if self.is_shut_down() {
                return report;
            }
            if !slot.with_state(|s| s.begin_reinit()) {
                continue;
            }
            slot.client.reset_session().await;
            match slot.client.ensure_session().await {
                Ok(()) => {
                    slot.with_state(|s| s.finish_init(now()));
                    info!(client = slot.id, "Client re-initialized");
                    report.reinitialized += 1;
                }
                Err(e) => {
                    slot.with_state(|s| s.fail_init());
                    warn!(client = slot.id, "Client re-init failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        let max_age = self.params.session_max_age;
        let checked_at = now();
        let stale: Vec<&PoolSlot<C>> = self
            .slots
            .iter()
            .filter(|slot| slot.with_state(|s| s.is_stale(checked_at, max_age)))
            .collect();
        if !stale.is_empty() {
            info!(
                "Proactive refresh: {} client(s) with stale sessions",
                stale.len()
            );
        }
        for slot in stale {
            if self.is_shut_down() {
                return report;
            }
            // Marks the slot busy so acquire cannot hand it out mid-refresh
            if !slot.with_state(|s| s.begin_refresh(now(), max_age)) {
                continue;
            }
            slot.client.reset_session().await;
            match slot.client.ensure_session().await {
                Ok(()) => {
                    slot.with_state(|s| s.finish_refresh(now()));
                    info!(client = slot.id, "Client session refreshed");
                    report.refreshed += 1;
                }
                Err(e) => {
                    slot.with_state(|s| s.fail_refresh());
                    warn!(client = slot.id, "Client refresh failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

/// Exclusive checkout of one slot. Returns the slot to the pool on drop.
pub struct PoolLease<C: PooledSession> {
    inner: Arc<PoolInner<C>>,
    slot_id: usize,
    client: Arc<C>,
}

impl<C: PooledSession> PoolLease<C> {
    pub fn slot_id(&self) -> usize {
        self.slot_id
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }
}

impl<C: PooledSession> Drop for PoolLease<C> {
    fn drop(&mut self) {
        self.inner.release(self.slot_id);
    }
}

/// Pool of warmed session clients.
pub struct ClientPool<C: PooledSession> {
    inner: Arc<PoolInner<C>>,
    cancel: CancellationToken,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl ClientPool<SessionClient> {
    /// Build `params.size` session clients, one transport per slot.
    pub fn with_factory(
        factory: &dyn TransportFactory,
        params: PoolParams,
        exhaustion: ExhaustionPolicy,
    ) -> Result<Self, TransportError> {
        let clients = (0..params.size)
            .map(|id| {
                let transport = factory.create(Some(id))?;
                Ok(SessionClient::new(transport, Some(id))
                    .with_exhaustion_policy(exhaustion.clone()))
            })
            .collect::<Result<Vec<_>, TransportError>>()?;
        Ok(Self::new(clients, params))
    }
}

impl<C: PooledSession> ClientPool<C> {
    /// Wrap the given clients as cold slots. `params.size` is ignored in
    /// favor of `clients.len()`.
    pub fn new(clients: Vec<C>, params: PoolParams) -> Self {
        let slots = clients
            .into_iter()
            .enumerate()
            .map(|(id, client)| PoolSlot {
                id,
                client: Arc::new(client),
                state: Mutex::new(SlotState::new()),
            })
            .collect();

        Self {
            inner: Arc::new(PoolInner {
                slots,
                params,
                served: AtomicU64::new(0),
                waits: AtomicU64::new(0),
                shut_down: AtomicBool::new(false),
            }),
            cancel: CancellationToken::new(),
            health_task: Mutex::new(None),
        }
    }

    pub fn size(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn params(&self) -> &PoolParams {
        &self.inner.params
    }

    /// Initialize every slot in staggered batches and start the health loop.
    ///
    /// Returns the number of ready slots. Fails only when none came up.
    pub async fn warmup(&self) -> Result<usize, PoolError> {
        let size = self.size();
        let batch_size = self.inner.params.warmup_batch_size.max(1);
        let total_batches = size.div_ceil(batch_size);
        info!(
            "Warming up {} clients (batches of {})...",
            size, batch_size
        );

        let started = Instant::now();
        let mut ready = 0;
        for (index, batch) in self.inner.slots.chunks(batch_size).enumerate() {
            let first = index * batch_size;
            info!(
                "Batch {}/{}: initializing clients {}-{}",
                index + 1,
                total_batches,
                first,
                first + batch.len() - 1
            );

            let results = join_all(batch.iter().map(|slot| self.inner.init_slot(slot))).await;
            ready += results.into_iter().filter(|ok| *ok).count();

            if index + 1 < total_batches {
                tokio::time::sleep(self.inner.params.stagger_delay).await;
            }
        }

        if ready == 0 {
            return Err(PoolError::NoClientsInitialized);
        }

        info!(
            "Warmup complete: {}/{} clients ready in {:.1}s",
            ready,
            size,
            started.elapsed().as_secs_f64()
        );
        self.spawn_health_loop();
        Ok(ready)
    }

    fn spawn_health_loop(&self) {
        let mut task = self
            .health_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        let inner = self.inner.clone();
        let cancel = self.cancel.clone();
        let interval = inner.params.health_check_interval;
        *task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                // A pass runs to completion; shutdown is honored between slots
                let report = inner.health_check().await;
                if report != HealthReport::default() {
                    debug!(
                        "Health check: {} re-initialized, {} refreshed, {} failed",
                        report.reinitialized, report.refreshed, report.failed
                    );
                }
            }
        }));
    }

    fn try_claim(&self) -> Option<PoolLease<C>> {
        self.inner
            .slots
            .iter()
            .find(|slot| slot.with_state(|s| s.try_claim()))
            .map(|slot| PoolLease {
                inner: self.inner.clone(),
                slot_id: slot.id,
                client: slot.client.clone(),
            })
    }

    /// Claim a free slot, waiting up to `timeout` (default `queue_timeout`).
    ///
    /// Fails immediately with [`PoolError::Unavailable`] when nothing is free
    /// and no slot is ready at all. Waiters are not served in FIFO order.
    pub async fn acquire(&self, timeout: Option<Duration>) -> Result<PoolLease<C>, PoolError> {
        if self.inner.is_shut_down() {
            return Err(PoolError::ShutDown);
        }

        let timeout = timeout.unwrap_or(self.inner.params.queue_timeout);
        let started = Instant::now();
        // Far-future deadline when the timeout does not fit
        let deadline = started
            .checked_add(timeout)
            .unwrap_or_else(|| started + Duration::from_secs(86_400 * 365 * 30));

        if let Some(lease) = self.try_claim() {
            return Ok(lease);
        }

        let ready = self.inner.ready_count();
        if ready == 0 {
            return Err(PoolError::Unavailable);
        }

        let waits = self.inner.waits.fetch_add(1, Ordering::SeqCst) + 1;
        if waits <= 3 || waits % 10 == 1 {
            info!("All {} clients busy, waiting for release...", ready);
        }

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(PoolError::Timeout(timeout));
            }
            if let Some(lease) = self.try_claim() {
                return Ok(lease);
            }
            let poll = self.inner.params.poll_interval.min(deadline - now);
            tokio::time::sleep(poll).await;
        }
    }

    /// Return a lease to the pool. Equivalent to dropping it.
    pub fn release(&self, lease: PoolLease<C>) {
        drop(lease);
    }

    /// Run `f` against a leased client.
    ///
    /// A session/auth failure marks the slot unhealthy and clears the
    /// client's session before the error is returned. The lease is released
    /// on every path.
    pub async fn execute<T, F, Fut>(&self, f: F) -> Result<T, PoolError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        self.execute_with_timeout(None, f).await
    }

    pub async fn execute_with_timeout<T, F, Fut>(
        &self,
        timeout: Option<Duration>,
        f: F,
    ) -> Result<T, PoolError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let lease = self.acquire(timeout).await?;
        match f(lease.client().clone()).await {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_session_failure() {
                    warn!(
                        client = lease.slot_id(),
                        "Session error, marking unhealthy: {}", e
                    );
                    if let Some(slot) = self.inner.slots.get(lease.slot_id()) {
                        slot.with_state(|s| s.mark_unhealthy());
                    }
                    lease.client().reset_session().await;
                }
                Err(PoolError::Client(e))
            }
        }
    }

    /// Run one health-check pass now.
    pub async fn health_check(&self) -> HealthReport {
        self.inner.health_check().await
    }

    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            size: self.size(),
            ready: 0,
            busy: 0,
            initializing: 0,
            served: self.inner.served.load(Ordering::SeqCst),
        };
        for slot in &self.inner.slots {
            slot.with_state(|s| {
                stats.ready += usize::from(s.ready);
                stats.busy += usize::from(s.busy);
                stats.initializing += usize::from(s.initializing);
            });
        }
        stats
    }

    pub fn phases(&self) -> Vec<SlotPhase> {
        self.inner
            .slots
            .iter()
            .map(|slot| slot.with_state(|s| s.phase()))
            .collect()
    }

    /// Stop the health loop and close every client.
    pub async fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.cancel.cancel();

        let task = self
            .health_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!("Health check task ended abnormally: {}", e);
        }

        let stats = self.stats();
        info!(
            "Shutdown. {}/{} clients were healthy. {} requests served.",
            stats.ready, stats.size, stats.served
        );

        for slot in &self.inner.slots {
            if let Err(e) = slot.client.close().await {
                debug!(client = slot.id, "Close failed: {}", e);
            }
        }
    }
}

impl<C: PooledSession> Drop for ClientPool<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
