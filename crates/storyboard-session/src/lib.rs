//! Storyboard Editing Session
//!
//! Couples a [`storyboard_graph::GraphDocument`] to encrypted persistence:
//! gestures mutate the document, a debounced scheduler saves it through a
//! [`storyboard_gateway::PersistenceGateway`], and a [`RenderAdapter`] is told
//! what to draw.
//!
//! # Core Concepts
//!
//! - [`Session`] / [`SessionHandle`]: a task owning the document, driven over a channel
//! - [`InteractionController`]: gestures and the single-selection model
//! - [`AutosaveScheduler`]: waits for 2 s of quiet, never overlaps stores
//! - [`LoadReport`]: how the initial document was obtained; loading never fails
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use storyboard_codec::{CryptoCodec, StoryboardKey};
//! use storyboard_gateway::InMemoryGateway;
//! use storyboard_graph::NodeKind;
//! use storyboard_session::{Gesture, Session, SessionConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Arc::new(InMemoryGateway::new());
//! let codec = CryptoCodec::new(StoryboardKey::generate());
//! let opened = Session::open(SessionConfig::default(), codec, gateway.clone()).await?;
//!
//! let handle = opened.handle;
//! handle.apply(Gesture::create_node("Harbour CCTV", NodeKind::Evidence, "")).await?;
//! let report = handle.close().await?;
//!
//! assert!(report.saved);
//! assert_eq!(gateway.store_count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

mod autosave;
mod config;
mod error;
mod interaction;
mod load;
mod render;
mod session;

pub use autosave::{AutosaveScheduler, SaveCompletion, SaveState, SaveStateKind};
pub use config::SessionConfig;
pub use error::{ConfigError, Result, SaveError, SessionError};
pub use interaction::{
    Gesture, GestureOutcome, InteractionController, Mutation, Selection, DEFAULT_EDGE_LABEL,
};
pub use load::{load_document, LoadReport, LoadSource};
pub use render::{NodeStyle, RenderAdapter, RenderEdge, RenderNode, RenderView, EDGE_COLOR};
pub use session::{CloseReport, OpenedSession, SaveIndicator, Session, SessionHandle};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::Arc;
    use storyboard_codec::{CryptoCodec, StoryboardKey};
    use storyboard_gateway::{InMemoryGateway, PersistenceGateway};
    use storyboard_graph::NodeKind;

    #[tokio::test(start_paused = true)]
    async fn edits_reach_the_store_after_quiet_period() {
        let gateway = Arc::new(InMemoryGateway::new());
        let key = StoryboardKey::generate();
        let config = SessionConfig::default();
        let id = config.document_id.clone();
        let opened = Session::open(config, CryptoCodec::new(key.clone()), gateway.clone())
            .await
            .unwrap();
        let handle = opened.handle;

        let a = handle
            .apply(Gesture::create_node("Whistleblower X", NodeKind::Source, ""))
            .await
            .unwrap()
            .created_node()
            .cloned()
            .unwrap();
        let b = handle
            .apply(Gesture::create_node("Leaked Memo", NodeKind::Evidence, ""))
            .await
            .unwrap()
            .created_node()
            .cloned()
            .unwrap();
        handle.apply(Gesture::connect(a, b, None)).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        let status = handle.status().await.unwrap();
        assert!(!status.unsaved_changes);
        assert_eq!(gateway.store_count(), 1);

        let blob = gateway.fetch_latest(&id).await.unwrap().unwrap();
        let stored: storyboard_graph::SerializableDocument =
            CryptoCodec::new(key).decrypt(&blob.data).unwrap();
        assert_eq!(stored.nodes.len(), 2);
        assert_eq!(stored.edges[0].label, DEFAULT_EDGE_LABEL);
    }
}
