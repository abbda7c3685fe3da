//! Debounced autosave state machine
//!
//! Pure bookkeeping: the session actor feeds it mutation, timer and
//! completion events and asks it what to do next. Time is passed in, which
//! keeps the machine deterministic under test.
//!
//! ```text
//!   mutation            deadline reached          store finished
//! Idle ───────► PendingSave ───────────────► Saving ───────────────► Idle
//!               ▲    │ mutation: reset timer   │ mutation: follow_up
//!               │    ▼                         │
//!               └────┘◄────────────────────────┘ follow_up pending
//! ```

use crate::error::SaveError;
use std::time::Duration;
use tokio::time::Instant;

/// Where the scheduler currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Nothing scheduled
    Idle,
    /// A save fires at `deadline` unless another mutation pushes it back
    PendingSave {
        /// When the save fires
        deadline: Instant,
    },
    /// A store call is in flight
    Saving {
        /// A mutation arrived after the in-flight snapshot was taken
        follow_up: bool,
    },
}

/// Summary of [`SaveState`] without timer detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStateKind {
    /// Nothing scheduled
    Idle,
    /// Waiting for quiescence
    Pending,
    /// Store in flight
    Saving,
}

impl From<SaveState> for SaveStateKind {
    fn from(state: SaveState) -> Self {
        match state {
            SaveState::Idle => Self::Idle,
            SaveState::PendingSave { .. } => Self::Pending,
            SaveState::Saving { .. } => Self::Saving,
        }
    }
}

/// What a finished store did to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveCompletion {
    /// Revision that was in flight
    pub revision: u64,
    /// Whether the store succeeded
    pub succeeded: bool,
    /// Whether another save is now scheduled
    pub rescheduled: bool,
}

/// Debounce scheduler for one document
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    window: Duration,
    state: SaveState,
    revision: u64,
    saved_revision: u64,
    in_flight: Option<u64>,
    last_mutation: Option<Instant>,
    flush_requested: bool,
    armed: bool,
    last_error: Option<SaveError>,
}

impl AutosaveScheduler {
    /// Quiescence window of the reference client
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(2000);

    /// Create an idle scheduler with the given quiescence window
    #[inline]
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: SaveState::Idle,
            revision: 0,
            saved_revision: 0,
            in_flight: None,
            last_mutation: None,
            flush_requested: false,
            armed: true,
            last_error: None,
        }
    }

    /// Create a scheduler that counts mutations but never schedules a save
    /// until [`arm`](Self::arm) or [`request_flush`](Self::request_flush)
    #[inline]
    #[must_use]
    pub fn disarmed(window: Duration) -> Self {
        Self {
            armed: false,
            ..Self::new(window)
        }
    }

    /// Whether mutations schedule saves on their own
    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Start scheduling saves; unsaved edits get a deadline one window after
    /// the last mutation
    pub fn arm(&mut self, now: Instant) {
        if self.armed {
            return;
        }
        self.armed = true;
        if self.has_unsaved_changes() && self.state == SaveState::Idle {
            let deadline = self.last_mutation.map_or(now, |at| at + self.window).max(now);
            self.state = SaveState::PendingSave { deadline };
        }
        tracing::debug!(revision = self.revision, "autosave armed");
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> SaveState {
        self.state
    }

    /// Monotonic mutation counter
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Last revision known to be stored
    #[inline]
    #[must_use]
    pub fn saved_revision(&self) -> u64 {
        self.saved_revision
    }

    /// Some mutation has not reached the store yet
    #[inline]
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Error of the most recent failed save, cleared by the next success
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&SaveError> {
        self.last_error.as_ref()
    }

    /// When the pending save fires, if one is pending
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SaveState::PendingSave { deadline } => Some(deadline),
            SaveState::Idle | SaveState::Saving { .. } => None,
        }
    }

    /// Whether a pending save should fire at `now`
    #[inline]
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Record a document mutation at `now`
    pub fn note_mutation(&mut self, now: Instant) {
        self.revision += 1;
        self.last_mutation = Some(now);
        if !self.armed {
            tracing::trace!(revision = self.revision, "mutation noted, autosave disarmed");
            return;
        }
        self.state = match self.state {
            SaveState::Idle | SaveState::PendingSave { .. } => {
                let deadline = if self.flush_requested { now } else { now + self.window };
                SaveState::PendingSave { deadline }
            }
            SaveState::Saving { .. } => SaveState::Saving { follow_up: true },
        };
        tracing::trace!(revision = self.revision, state = ?self.state, "mutation noted");
    }

    /// Ask for everything up to the current revision to be saved right away
    ///
    /// Arms a disarmed scheduler. Returns `false` when there is nothing to
    /// wait for.
    pub fn request_flush(&mut self, now: Instant) -> bool {
        self.armed = true;
        match self.state {
            SaveState::Saving { .. } => {
                if self.in_flight != Some(self.revision) {
                    self.state = SaveState::Saving { follow_up: true };
                    self.flush_requested = true;
                }
                true
            }
            SaveState::Idle | SaveState::PendingSave { .. } => {
                if !self.has_unsaved_changes() {
                    return false;
                }
                self.flush_requested = true;
                self.state = SaveState::PendingSave { deadline: now };
                true
            }
        }
    }

    /// Move a pending save into flight
    ///
    /// Returns the revision the caller must snapshot, or `None` if no save is
    /// pending.
    pub fn begin_save(&mut self) -> Option<u64> {
        match self.state {
            SaveState::PendingSave { .. } => {
                self.state = SaveState::Saving { follow_up: false };
                self.in_flight = Some(self.revision);
                self.flush_requested = false;
                tracing::debug!(revision = self.revision, "autosave started");
                Some(self.revision)
            }
            SaveState::Idle | SaveState::Saving { .. } => None,
        }
    }

    /// Record the outcome of the in-flight store at `now`
    ///
    /// On failure the unsaved flag stays set. Without a queued follow-up the
    /// scheduler goes back to `Idle` and waits for the next edit or a manual
    /// save; nothing retries on its own.
    pub fn finish_save(&mut self, outcome: Result<(), SaveError>, now: Instant) -> SaveCompletion {
        let follow_up = matches!(self.state, SaveState::Saving { follow_up: true });
        let revision = self.in_flight.take().unwrap_or(self.revision);

        let succeeded = match outcome {
            Ok(()) => {
                self.saved_revision = self.saved_revision.max(revision);
                self.last_error = None;
                true
            }
            Err(error) => {
                tracing::warn!(%error, revision, "autosave failed; changes kept as unsaved");
                self.last_error = Some(error);
                self.flush_requested = false;
                false
            }
        };

        let rescheduled = follow_up && self.has_unsaved_changes();
        self.state = if rescheduled {
            let deadline = if self.flush_requested {
                now
            } else {
                self.last_mutation.map_or(now, |at| at + self.window).max(now)
            };
            SaveState::PendingSave { deadline }
        } else {
            SaveState::Idle
        };

        SaveCompletion {
            revision,
            succeeded,
            rescheduled,
        }
    }
}

impl Default for AutosaveScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}
