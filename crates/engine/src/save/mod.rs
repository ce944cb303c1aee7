// Save coordination: at most one persistence write in flight per document.
//
// Idle --mutation--> Dirty
// Idle|Dirty --trigger--> Saving --write ok--> Idle (or Dirty if mutated meanwhile)
// Saving --trigger--> Saving (trigger dropped, never queued)
// Saving --write failed--> Dirty
//
// The state lock is only held to flip flags; the write itself runs unlocked.

pub mod autosave;

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::StoreError;

pub use autosave::{start_autosave, AutosaveHandle, PeriodicSave};

/// What asked for the save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveTrigger {
    Manual,
    Periodic,
    /// Persisting after a chat exchange.
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    Idle,
    Saving,
    Dirty,
}

/// Process-local save status shown by the editing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub in_flight: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub dirty: bool,
}

impl SaveState {
    pub fn phase(&self) -> SavePhase {
        if self.in_flight {
            SavePhase::Saving
        } else if self.dirty {
            SavePhase::Dirty
        } else {
            SavePhase::Idle
        }
    }

    /// Status line, e.g. `Last saved: 14:03:27 • Saving...`.
    pub fn indicator(&self) -> String {
        let mut text = match self.last_saved_at {
            Some(at) => format!("Last saved: {}", at.with_timezone(&Local).format("%H:%M:%S")),
            None => "Not saved yet".to_string(),
        };
        if self.in_flight {
            text.push_str(" • Saving...");
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SaveOutcome {
    Saved { at: DateTime<Utc> },
    /// Another save was already in flight.
    Dropped,
}

#[derive(Debug, Default)]
struct Inner {
    in_flight: bool,
    dirty: bool,
    last_saved_at: Option<DateTime<Utc>>,
    /// Bumped on every mutation.
    revision: u64,
}

impl Inner {
    fn snapshot(&self) -> SaveState {
        SaveState { in_flight: self.in_flight, last_saved_at: self.last_saved_at, dirty: self.dirty }
    }
}

/// Proof that this caller owns the in-flight slot.
#[derive(Debug)]
#[must_use]
pub struct SaveTicket {
    trigger: SaveTrigger,
    revision: u64,
}

pub struct SaveCoordinator {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SaveState>,
}

impl Default for SaveCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveCoordinator {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(SaveState::default());
        Self { inner: Mutex::new(Inner::default()), state_tx }
    }

    pub fn state(&self) -> SaveState {
        self.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.state_tx.subscribe()
    }

    /// Record a content or chat mutation.
    pub fn mark_dirty(&self) {
        let mut inner = self.lock();
        inner.revision += 1;
        inner.dirty = true;
        self.publish(&inner);
    }

    /// Claim the in-flight slot. `None` means a save is already running and
    /// this trigger is dropped.
    pub fn begin(&self, trigger: SaveTrigger) -> Option<SaveTicket> {
        let mut inner = self.lock();
        if inner.in_flight {
            debug!(?trigger, "save already in flight, dropping trigger");
            return None;
        }
        inner.in_flight = true;
        self.publish(&inner);
        debug!(?trigger, revision = inner.revision, "save started");
        Some(SaveTicket { trigger, revision: inner.revision })
    }

    /// Release the slot with the write's result.
    pub fn finish(
        &self,
        ticket: SaveTicket,
        result: Result<(), StoreError>,
    ) -> Result<DateTime<Utc>, StoreError> {
        let mut inner = self.lock();
        inner.in_flight = false;
        let outcome = match result {
            Ok(()) => {
                let now = Utc::now();
                inner.last_saved_at = Some(now);
                inner.dirty = inner.revision != ticket.revision;
                info!(trigger = ?ticket.trigger, still_dirty = inner.dirty, "save finished");
                Ok(now)
            }
            Err(error) => {
                inner.dirty = true;
                warn!(trigger = ?ticket.trigger, %error, "save failed, keeping changes dirty");
                Err(error)
            }
        };
        self.publish(&inner);
        outcome
    }

    /// Run `write` under the in-flight slot. The closure is only invoked when
    /// the slot was free, so it should snapshot state when called.
    pub async fn run<F, Fut>(&self, trigger: SaveTrigger, write: F) -> Result<SaveOutcome, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let Some(ticket) = self.begin(trigger) else {
            return Ok(SaveOutcome::Dropped);
        };
        let result = write().await;
        self.finish(ticket, result).map(|at| SaveOutcome::Saved { at })
    }

    /// Resolve once no save is in flight.
    pub async fn wait_idle(&self) {
        let mut state_rx = self.subscribe();
        let _ = state_rx.wait_for(|state| !state.in_flight).await;
    }

    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.snapshot());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
