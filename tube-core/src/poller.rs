use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::PollError;
use crate::ingest::Ingestor;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Run a pass as soon as the scheduler starts instead of after one interval.
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4 * 3600),
            run_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PassReport {
    pub count: usize,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PassStatus {
    pub is_updating: bool,
    pub last_result: Option<PassReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    Busy,
}

/// At most one ingest pass at a time.
#[derive(Debug, Clone, Default)]
pub struct PassGuard {
    lock: Arc<Mutex<()>>,
    running: Arc<AtomicBool>,
    last_result: Arc<RwLock<Option<PassReport>>>,
}

/// Held for the duration of one pass; clears the busy flag on drop.
struct PassPermit {
    _lock: OwnedMutexGuard<()>,
    running: Arc<AtomicBool>,
}

impl Drop for PassPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl PassGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn status(&self) -> PassStatus {
        PassStatus {
            is_updating: self.is_busy(),
            last_result: self.last_result.read().await.clone(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn try_acquire(&self) -> Option<PassPermit> {
        let lock = Arc::clone(&self.lock).try_lock_owned().ok()?;
        self.running.store(true, Ordering::SeqCst);
        Some(PassPermit {
            _lock: lock,
            running: Arc::clone(&self.running),
        })
    }

    async fn run_with(&self, permit: PassPermit, ingestor: &Ingestor) -> usize {
        let count = ingestor.ingest_pass().await;
        *self.last_result.write().await = Some(PassReport {
            count,
            finished_at: Utc::now(),
        });
        drop(permit);
        count
    }

    /// Runs one pass unless another is outstanding, in which case it returns
    /// `None` without touching any state.
    pub async fn run_exclusive(&self, ingestor: &Ingestor) -> Option<usize> {
        let Some(permit) = self.try_acquire() else {
            info!("ingest pass already running, skipping");
            return None;
        };
        Some(self.run_with(permit, ingestor).await)
    }
}

pub struct SchedulerHandle {
    cancel_tx: broadcast::Sender<()>,
    trigger_tx: mpsc::Sender<oneshot::Sender<TriggerOutcome>>,
    guard: PassGuard,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Asks the loop for an immediate pass. `Busy` means one was already
    /// running and nothing new was started.
    pub async fn trigger(&self) -> Result<TriggerOutcome, PollError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.trigger_tx
            .send(reply_tx)
            .await
            .map_err(|_| PollError::TriggerChannelClosed)?;
        reply_rx.await.map_err(|_| PollError::TriggerChannelClosed)
    }

    pub async fn status(&self) -> PassStatus {
        self.guard.status().await
    }

    pub fn guard(&self) -> &PassGuard {
        &self.guard
    }

    /// Stops the loop and waits for an in-flight pass to finish writing.
    pub async fn stop(self) -> Result<(), PollError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(PollError::from)
    }
}

pub fn spawn_scheduler(ingestor: Arc<Ingestor>, config: SchedulerConfig) -> SchedulerHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let (trigger_tx, mut trigger_rx) = mpsc::channel::<oneshot::Sender<TriggerOutcome>>(4);
    let guard = PassGuard::new();
    let loop_guard = guard.clone();

    let join = tokio::spawn(async move {
        let start = if config.run_on_start {
            tokio::time::Instant::now()
        } else {
            tokio::time::Instant::now() + config.interval
        };
        let mut ticker = tokio::time::interval_at(start, config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("scheduler shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    start_pass(&mut in_flight, &ingestor, &loop_guard);
                }
                Some(reply) = trigger_rx.recv() => {
                    info!("manual check requested");
                    let outcome = start_pass(&mut in_flight, &ingestor, &loop_guard);
                    let _ = reply.send(outcome);
                }
            }
        }

        if let Some(pass) = in_flight {
            if let Err(err) = pass.await {
                warn!(error = %err, "ingest pass task failed");
            }
        }
    });

    SchedulerHandle {
        cancel_tx,
        trigger_tx,
        guard,
        join,
    }
}

fn start_pass(
    in_flight: &mut Option<JoinHandle<()>>,
    ingestor: &Arc<Ingestor>,
    guard: &PassGuard,
) -> TriggerOutcome {
    let Some(permit) = guard.try_acquire() else {
        info!("ingest pass already running, skipping");
        return TriggerOutcome::Busy;
    };
    let ingestor = Arc::clone(ingestor);
    let guard = guard.clone();
    *in_flight = Some(tokio::spawn(async move {
        guard.run_with(permit, &ingestor).await;
    }));
    TriggerOutcome::Started
}
