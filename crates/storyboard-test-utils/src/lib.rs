//! Testing utilities for the storyboard workspace
//!
//! Gateway and renderer doubles plus small document fixtures.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storyboard_codec::{CryptoCodec, StoryboardKey};
use storyboard_gateway::{
    DocumentId, InMemoryGateway, PersistedBlob, PersistenceError, PersistenceGateway, RecordId,
    StoreRequest,
};
use storyboard_graph::{GraphDocument, NodeId, NodeKind, SerializableDocument};
use storyboard_session::{RenderAdapter, RenderView};
use tokio::time::Instant;

/// One `store` call seen by [`RecordingGateway`]
#[derive(Debug, Clone)]
pub struct StoreCall {
    pub at: Instant,
    pub document: DocumentId,
    pub title: String,
    pub data: String,
    pub succeeded: bool,
}

/// In-memory gateway that records every store and can be told to fail or stall
#[derive(Debug, Default)]
pub struct RecordingGateway {
    inner: InMemoryGateway,
    calls: Mutex<Vec<StoreCall>>,
    failing: AtomicBool,
    fetch_failing: AtomicBool,
    delay: Mutex<Duration>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make subsequent stores fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make subsequent fetches fail
    pub fn set_fetch_failing(&self, failing: bool) {
        self.fetch_failing.store(failing, Ordering::SeqCst);
    }

    /// Hold each store for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn insert_raw(&self, document: &DocumentId, data: impl Into<String>) {
        self.inner.insert_raw(document, data);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn successful_stores(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.succeeded).count()
    }

    /// Decrypt the latest successfully stored blob
    pub fn last_stored(&self, codec: &CryptoCodec) -> Option<SerializableDocument> {
        let calls = self.calls.lock();
        let call = calls.iter().rev().find(|c| c.succeeded)?;
        Some(codec.decrypt(&call.data).unwrap())
    }
}

#[async_trait]
impl PersistenceGateway for RecordingGateway {
    async fn fetch_latest(
        &self,
        document: &DocumentId,
    ) -> Result<Option<PersistedBlob>, PersistenceError> {
        if self.fetch_failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Transport("injected fetch failure".into()));
        }
        self.inner.fetch_latest(document).await
    }

    async fn store(
        &self,
        document: &DocumentId,
        request: StoreRequest,
    ) -> Result<RecordId, PersistenceError> {
        let at = Instant::now();
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failing = self.failing.load(Ordering::SeqCst);
        let mut call = StoreCall {
            at,
            document: document.clone(),
            title: request.title.clone(),
            data: request.data.clone(),
            succeeded: false,
        };
        let result = if failing {
            Err(PersistenceError::Transport("injected store failure".into()))
        } else {
            self.inner.store(document, request).await
        };
        call.succeeded = result.is_ok();
        self.calls.lock().push(call);
        result
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Renderer that keeps every frame it is given
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    frames: Arc<Mutex<Vec<RenderView>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<RenderView> {
        self.frames.lock().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn last_frame(&self) -> Option<RenderView> {
        self.frames.lock().last().cloned()
    }

    pub fn boxed(&self) -> Box<dyn RenderAdapter> {
        Box::new(self.clone())
    }
}

impl RenderAdapter for RecordingRenderer {
    fn draw(&mut self, view: &RenderView) {
        self.frames.lock().push(view.clone());
    }
}

/// Deterministic key for tests
pub fn test_key() -> StoryboardKey {
    StoryboardKey::from_bytes([7; 32])
}

pub fn test_codec() -> CryptoCodec {
    CryptoCodec::new(test_key())
}

pub fn document_id(raw: &str) -> DocumentId {
    DocumentId::parse(raw).unwrap()
}

/// Source, evidence and theory nodes with two edges
pub struct InvestigationFixture {
    pub document: GraphDocument,
    pub source: NodeId,
    pub evidence: NodeId,
    pub theory: NodeId,
}

pub fn investigation_fixture() -> InvestigationFixture {
    let mut document = GraphDocument::new();
    let source = document
        .add_node("Whistleblower X", NodeKind::Source, "first contact 2024-02-11")
        .unwrap();
    let evidence = document
        .add_node("Leaked Memo", NodeKind::Evidence, "")
        .unwrap();
    let theory = document
        .add_node("Procurement fraud", NodeKind::Theory, "")
        .unwrap();
    document.add_edge(&source, &evidence, "provided").unwrap();
    document.add_edge(&evidence, &theory, "supports").unwrap();
    InvestigationFixture {
        document,
        source,
        evidence,
        theory,
    }
}

/// Encrypt `document` and seed it into `gateway` under `id`
pub fn seed(gateway: &RecordingGateway, id: &DocumentId, document: &SerializableDocument) {
    let blob = test_codec().encrypt(document).unwrap();
    gateway.insert_raw(id, blob.into_string());
}
