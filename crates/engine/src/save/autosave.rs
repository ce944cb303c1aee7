// Periodic autosave loop.
//
// Fires a periodic save trigger on a fixed cadence, dirty or not. Each tick's
// save runs in its own task so a slow write never shifts the cadence; ticks
// that land while that write is in flight are dropped by the coordinator.
// Shutdown waits for tick saves already started.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::save::SaveOutcome;

/// Something the autosave loop can ask to persist itself.
pub trait PeriodicSave: Send + Sync + 'static {
    fn periodic_save(&self) -> impl Future<Output = Result<SaveOutcome, EngineError>> + Send;
}

/// Handle for the autosave background task.
/// Dropping the handle cancels the task.
pub struct AutosaveHandle {
    task: tokio::task::JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl AutosaveHandle {
    /// Stop ticking and wait for any tick save still running.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(error) = (&mut self.task).await {
            warn!(%error, "autosave task ended abnormally");
        }
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn start_autosave<T: PeriodicSave>(target: Arc<T>, interval: Duration) -> AutosaveHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(autosave_loop(target, interval, shutdown_rx));
    info!(interval_ms = interval.as_millis() as u64, "autosave started");
    AutosaveHandle { task, shutdown_tx }
}

async fn autosave_loop<T: PeriodicSave>(
    target: Arc<T>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticks = JoinSet::new();
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let target = target.clone();
                ticks.spawn(async move {
                    match target.periodic_save().await {
                        Ok(SaveOutcome::Saved { at }) => debug!(%at, "autosave complete"),
                        Ok(SaveOutcome::Dropped) => debug!("autosave tick dropped, save in flight"),
                        Err(error) => warn!(%error, "autosave failed"),
                    }
                });
            }
            Some(_) = ticks.join_next(), if !ticks.is_empty() => {}
            _ = shutdown_rx.changed() => {
                debug!(pending = ticks.len(), "autosave loop shutting down");
                while ticks.join_next().await.is_some() {}
                return;
            }
        }
    }
}
