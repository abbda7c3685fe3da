//! The editing session task and its handle
//!
//! One task owns the document, the selection and the autosave scheduler.
//! Handles talk to it over a bounded channel, so every mutation, timer tick
//! and store completion is processed in a single order and the document is
//! never shared.

use crate::autosave::{AutosaveScheduler, SaveStateKind};
use crate::config::SessionConfig;
use crate::error::{Result, SaveError, SessionError};
use crate::interaction::{Gesture, GestureOutcome, InteractionController, Selection};
use crate::load::{load_document, LoadReport};
use crate::render::{RenderAdapter, RenderView};
use std::sync::Arc;
use storyboard_codec::CryptoCodec;
use storyboard_gateway::{
    DocumentId, PersistenceError, PersistenceGateway, RecordId, StoreRequest,
};
use storyboard_graph::{GraphDocument, GraphError, SerializableDocument};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant};

/// Snapshot of the save state for a status indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveIndicator {
    /// Scheduler state
    pub state: SaveStateKind,
    /// Edits exist that are not stored yet
    pub unsaved_changes: bool,
    /// Mutations applied so far
    pub revision: u64,
    /// Last revision known stored
    pub saved_revision: u64,
    /// Most recent save failure, cleared by a successful save
    pub last_error: Option<SaveError>,
    /// Record written by the most recent successful save
    pub last_record: Option<RecordId>,
    /// Edits are stored on their own; `false` after a recovery load until
    /// the first manual save
    pub autosave_armed: bool,
}

/// Final state of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReport {
    /// Document the session edited
    pub document_id: DocumentId,
    /// Every edit reached the store
    pub saved: bool,
    /// Mutations applied over the session's lifetime
    pub revision: u64,
    /// Successful store calls
    pub saves: u64,
    /// Last save failure, if the session ended with one
    pub last_error: Option<SaveError>,
}

enum Command {
    Apply {
        gesture: Gesture,
        reply: oneshot::Sender<std::result::Result<GestureOutcome, GraphError>>,
    },
    SaveNow {
        reply: oneshot::Sender<std::result::Result<(), SaveError>>,
    },
    Status {
        reply: oneshot::Sender<SaveIndicator>,
    },
    Export {
        reply: oneshot::Sender<SerializableDocument>,
    },
    Selection {
        reply: oneshot::Sender<Selection>,
    },
    View {
        reply: oneshot::Sender<RenderView>,
    },
    Close {
        reply: oneshot::Sender<CloseReport>,
    },
}

/// Cloneable handle to a running session
///
/// When the last handle is dropped the session flushes unsaved changes and
/// stops. That flush needs a live runtime; call [`SessionHandle::close`]
/// before shutting the runtime down to be sure it completes.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    document_id: DocumentId,
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Document this session edits
    #[inline]
    #[must_use]
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Apply one gesture
    ///
    /// # Errors
    /// `SessionError::Graph` if the gesture was rejected,
    /// `SessionError::Closed` if the session is gone
    pub async fn apply(&self, gesture: Gesture) -> Result<GestureOutcome> {
        let outcome = self
            .request(|reply| Command::Apply { gesture, reply })
            .await?;
        Ok(outcome?)
    }

    /// Store everything edited so far and wait for the result
    ///
    /// Returns at once if nothing is unsaved. After a recovery load this is
    /// what overwrites the stored copy and turns autosave back on.
    ///
    /// # Errors
    /// `SessionError::Save` if the store failed
    pub async fn save_now(&self) -> Result<()> {
        let outcome = self.request(|reply| Command::SaveNow { reply }).await?;
        Ok(outcome?)
    }

    /// Current save indicator
    ///
    /// # Errors
    /// `SessionError::Closed` if the session is gone
    pub async fn status(&self) -> Result<SaveIndicator> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Plain serialized copy of the document
    ///
    /// # Errors
    /// `SessionError::Closed` if the session is gone
    pub async fn export(&self) -> Result<SerializableDocument> {
        self.request(|reply| Command::Export { reply }).await
    }

    /// Current selection
    ///
    /// # Errors
    /// `SessionError::Closed` if the session is gone
    pub async fn selection(&self) -> Result<Selection> {
        self.request(|reply| Command::Selection { reply }).await
    }

    /// What a renderer would draw right now
    ///
    /// # Errors
    /// `SessionError::Closed` if the session is gone
    pub async fn render_view(&self) -> Result<RenderView> {
        self.request(|reply| Command::View { reply }).await
    }

    /// Finish the in-flight save, flush pending edits and stop the session
    ///
    /// # Errors
    /// `SessionError::Closed` if the session already stopped
    pub async fn close(self) -> Result<CloseReport> {
        self.request(|reply| Command::Close { reply }).await
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

/// A session that has been opened
#[derive(Debug)]
pub struct OpenedSession {
    /// Handle for issuing commands
    pub handle: SessionHandle,
    /// How the initial document was obtained
    pub report: LoadReport,
    /// The session task; resolves once the session stops
    pub task: JoinHandle<CloseReport>,
}

/// Entry point for editing sessions
#[derive(Debug, Clone, Copy)]
pub struct Session;

impl Session {
    /// Load the document and start a session without a renderer
    ///
    /// When the stored copy could not be used (see
    /// [`LoadSource::is_recovery`](crate::LoadSource::is_recovery)) the session
    /// starts with autosave disarmed: edits are kept as unsaved and nothing
    /// is written, on close included, until [`SessionHandle::save_now`].
    ///
    /// # Errors
    /// `SessionError::Config` if `config` is invalid. Load problems are not
    /// errors; see [`LoadReport`].
    pub async fn open(
        config: SessionConfig,
        codec: CryptoCodec,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> Result<OpenedSession> {
        Self::start(config, codec, gateway, None).await
    }

    /// Load the document and start a session that draws through `renderer`
    ///
    /// The renderer gets one frame right after the load.
    ///
    /// # Errors
    /// As [`Session::open`]
    pub async fn open_with_renderer(
        config: SessionConfig,
        codec: CryptoCodec,
        gateway: Arc<dyn PersistenceGateway>,
        renderer: Box<dyn RenderAdapter>,
    ) -> Result<OpenedSession> {
        Self::start(config, codec, gateway, Some(renderer)).await
    }

    async fn start(
        config: SessionConfig,
        codec: CryptoCodec,
        gateway: Arc<dyn PersistenceGateway>,
        renderer: Option<Box<dyn RenderAdapter>>,
    ) -> Result<OpenedSession> {
        config.validate()?;

        let document_id = config.document_id.clone();
        let (document, report) = load_document(gateway.as_ref(), &codec, &document_id).await;
        tracing::info!(
            document = %document_id,
            gateway = gateway.name(),
            source = %report.source,
            "session opened"
        );

        let autosave = if report.source.is_recovery() {
            tracing::warn!(
                document = %document_id,
                "stored copy unusable; autosave disarmed until a manual save"
            );
            AutosaveScheduler::disarmed(config.debounce())
        } else {
            AutosaveScheduler::new(config.debounce())
        };

        let (tx, rx) = mpsc::channel(config.command_buffer);
        let mut task = SessionTask {
            autosave,
            config,
            codec,
            gateway,
            renderer,
            document,
            controller: InteractionController::new(),
            in_flight: None,
            waiters: Vec::new(),
            commands: rx,
            last_record: None,
            saves: 0,
        };
        task.redraw();

        Ok(OpenedSession {
            handle: SessionHandle {
                document_id,
                commands: tx,
            },
            report,
            task: tokio::spawn(task.run()),
        })
    }
}

type StoreTask = JoinHandle<std::result::Result<RecordId, PersistenceError>>;

struct FlushWaiter {
    target: u64,
    reply: oneshot::Sender<std::result::Result<(), SaveError>>,
}

struct SessionTask {
    config: SessionConfig,
    codec: CryptoCodec,
    gateway: Arc<dyn PersistenceGateway>,
    renderer: Option<Box<dyn RenderAdapter>>,
    document: GraphDocument,
    controller: InteractionController,
    autosave: AutosaveScheduler,
    in_flight: Option<StoreTask>,
    waiters: Vec<FlushWaiter>,
    commands: mpsc::Receiver<Command>,
    last_record: Option<RecordId>,
    saves: u64,
}

impl SessionTask {
    async fn run(mut self) -> CloseReport {
        loop {
            let deadline = self.autosave.deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Close { reply }) => {
                        let report = self.shutdown().await;
                        let _ = reply.send(report.clone());
                        return report;
                    }
                    Some(command) => self.handle(command),
                    None => {
                        tracing::debug!(document = %self.config.document_id, "all handles dropped");
                        return self.shutdown().await;
                    }
                },
                () = until(deadline) => self.start_save(),
                outcome = join_store(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.complete_save(outcome);
                }
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Apply { gesture, reply } => {
                let result = self.controller.apply(&mut self.document, gesture);
                match &result {
                    Ok(outcome) => {
                        if outcome.mutated() {
                            self.autosave.note_mutation(Instant::now());
                        }
                        if outcome.needs_redraw() {
                            self.redraw();
                        }
                    }
                    Err(error) => tracing::debug!(%error, "gesture rejected"),
                }
                let _ = reply.send(result);
            }
            Command::SaveNow { reply } => {
                let target = self.autosave.revision();
                if self.autosave.request_flush(Instant::now()) {
                    self.waiters.push(FlushWaiter { target, reply });
                } else {
                    let _ = reply.send(Ok(()));
                }
            }
            Command::Status { reply } => {
                let _ = reply.send(self.indicator());
            }
            Command::Export { reply } => {
                let _ = reply.send(self.document.serialize());
            }
            Command::Selection { reply } => {
                let _ = reply.send(self.controller.selection().clone());
            }
            Command::View { reply } => {
                let _ = reply.send(RenderView::build(&self.document, self.controller.selection()));
            }
            Command::Close { .. } => {}
        }
    }

    fn start_save(&mut self) {
        let Some(revision) = self.autosave.begin_save() else {
            return;
        };

        let blob = match self.codec.encrypt(&self.document.serialize()) {
            Ok(blob) => blob,
            Err(error) => {
                self.complete_save(Err(error.into()));
                return;
            }
        };

        tracing::debug!(document = %self.config.document_id, revision, "storing snapshot");
        let gateway = Arc::clone(&self.gateway);
        let document_id = self.config.document_id.clone();
        let request = StoreRequest::new(self.config.title.clone(), blob.into_string());
        self.in_flight = Some(tokio::spawn(async move {
            gateway.store(&document_id, request).await
        }));
    }

    fn complete_save(&mut self, outcome: std::result::Result<RecordId, SaveError>) {
        let (result, failure) = match outcome {
            Ok(record) => {
                self.saves += 1;
                self.last_record = Some(record);
                (Ok(()), None)
            }
            Err(error) => (Err(error.clone()), Some(error)),
        };

        let completion = self.autosave.finish_save(result, Instant::now());
        if completion.succeeded {
            tracing::info!(
                document = %self.config.document_id,
                revision = completion.revision,
                record = ?self.last_record,
                "storyboard saved"
            );
        }
        self.resolve_waiters(failure.as_ref());
    }

    fn resolve_waiters(&mut self, failure: Option<&SaveError>) {
        let saved = self.autosave.saved_revision();
        for waiter in std::mem::take(&mut self.waiters) {
            if waiter.target <= saved {
                let _ = waiter.reply.send(Ok(()));
            } else if let Some(error) = failure {
                let _ = waiter.reply.send(Err(error.clone()));
            } else {
                self.waiters.push(waiter);
            }
        }
    }

    async fn shutdown(&mut self) -> CloseReport {
        if let Some(task) = self.in_flight.take() {
            let outcome = settle(task.await);
            self.complete_save(outcome);
        }

        let flush = self.config.flush_on_close && self.autosave.is_armed();
        if flush && self.autosave.has_unsaved_changes() {
            tracing::debug!(document = %self.config.document_id, "flushing on close");
            self.autosave.request_flush(Instant::now());
            self.start_save();
            if let Some(task) = self.in_flight.take() {
                let outcome = settle(task.await);
                self.complete_save(outcome);
            }
        }

        let unsaved = self.autosave.has_unsaved_changes();
        for waiter in std::mem::take(&mut self.waiters) {
            let reply = if unsaved { Err(SaveError::Closed) } else { Ok(()) };
            let _ = waiter.reply.send(reply);
        }

        if unsaved {
            tracing::warn!(document = %self.config.document_id, "session closed with unsaved changes");
        } else {
            tracing::info!(document = %self.config.document_id, saves = self.saves, "session closed");
        }

        CloseReport {
            document_id: self.config.document_id.clone(),
            saved: !unsaved,
            revision: self.autosave.revision(),
            saves: self.saves,
            last_error: self.autosave.last_error().cloned(),
        }
    }

    fn indicator(&self) -> SaveIndicator {
        SaveIndicator {
            state: self.autosave.state().into(),
            unsaved_changes: self.autosave.has_unsaved_changes(),
            revision: self.autosave.revision(),
            saved_revision: self.autosave.saved_revision(),
            last_error: self.autosave.last_error().cloned(),
            last_record: self.last_record.clone(),
            autosave_armed: self.autosave.is_armed(),
        }
    }

    fn redraw(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.draw(&RenderView::build(&self.document, self.controller.selection()));
        }
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn join_store(task: &mut Option<StoreTask>) -> std::result::Result<RecordId, SaveError> {
    match task.as_mut() {
        Some(handle) => settle(handle.await),
        None => std::future::pending().await,
    }
}

fn settle(
    joined: std::result::Result<std::result::Result<RecordId, PersistenceError>, JoinError>,
) -> std::result::Result<RecordId, SaveError> {
    match joined {
        Ok(stored) => stored.map_err(SaveError::from),
        Err(error) => Err(SaveError::Aborted(error.to_string())),
    }
}
