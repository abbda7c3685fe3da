//! Subcommand implementations

use crate::config::CliConfig;
use anyhow::{bail, Context};
use clap::ArgMatches;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storyboard_codec::{CryptoCodec, StoryboardKey};
use storyboard_gateway::{
    DirectoryGateway, DocumentId, HttpGateway, PersistenceGateway, RecordId,
    StoreRequest,
};
use storyboard_graph::{export_file_name, GraphDocument, NodeId, NodeKind};
use storyboard_session::{
    load_document, Gesture, LoadSource, Session, SessionConfig, SessionHandle,
};

/// Where and how to reach one document
pub(crate) struct Target {
    pub(crate) gateway: Arc<dyn PersistenceGateway>,
    pub(crate) codec: CryptoCodec,
    pub(crate) session: SessionConfig,
}

impl Target {
    pub(crate) fn document_id(&self) -> &DocumentId {
        &self.session.document_id
    }
}

/// Combine the config file with command-line overrides
pub(crate) fn resolve_target(args: &ArgMatches) -> anyhow::Result<Target> {
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => CliConfig::from_path(path)?,
        None => CliConfig::default(),
    };

    let session = match (config.session, args.get_one::<String>("document")) {
        (Some(session), None) => session,
        (session, Some(raw)) => session
            .unwrap_or_default()
            .with_document_id(DocumentId::parse(raw.as_str())?),
        (None, None) => bail!("no document given; pass --document or set [session] in the config"),
    };
    let gateway: Arc<dyn PersistenceGateway> = if let Some(url) = args.get_one::<String>("backend") {
        let mut remote = config.gateway.unwrap_or_default().with_base_url(url.as_str());
        if let Some(token) = args.get_one::<String>("token") {
            remote = remote.with_bearer_token(token.as_str());
        }
        Arc::new(HttpGateway::new(&remote)?)
    } else if let Some(store) = args.get_one::<PathBuf>("store").or(config.store.as_ref()) {
        Arc::new(DirectoryGateway::new(store.clone()))
    } else if let Some(remote) = config.gateway.as_ref() {
        Arc::new(HttpGateway::new(remote)?)
    } else {
        bail!("no storage given; pass --store or --backend, or set one in the config");
    };

    let key = match (
        args.get_one::<String>("key"),
        args.get_one::<String>("passphrase"),
    ) {
        (Some(hex), _) => StoryboardKey::from_hex(hex)?,
        (None, Some(passphrase)) => {
            StoryboardKey::from_passphrase(passphrase, session.document_id.as_str())?
        }
        (None, None) => bail!("no key given; pass --key or --passphrase"),
    };

    Ok(Target {
        gateway,
        codec: CryptoCodec::new(key),
        session,
    })
}

/// Fresh random key, hex-encoded
pub(crate) fn keygen() -> String {
    StoryboardKey::generate().to_hex()
}

/// What `inspect` prints
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Inspection {
    pub(crate) document: DocumentId,
    pub(crate) source: LoadSource,
    pub(crate) nodes: usize,
    pub(crate) edges: usize,
    pub(crate) by_kind: Vec<(NodeKind, usize)>,
    pub(crate) notices: Vec<String>,
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Document: {}", self.document)?;
        writeln!(f, "Source:   {}", self.source)?;
        writeln!(f, "Nodes:    {}", self.nodes)?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "  {kind:<9} {count}")?;
        }
        write!(f, "Edges:    {}", self.edges)?;
        for notice in &self.notices {
            write!(f, "\nNotice:   {notice}")?;
        }
        Ok(())
    }
}

pub(crate) async fn inspect(target: &Target) -> anyhow::Result<Inspection> {
    let (document, report) =
        load_document(target.gateway.as_ref(), &target.codec, target.document_id()).await;
    let by_kind = NodeKind::ALL
        .into_iter()
        .map(|kind| (kind, document.nodes().filter(|n| n.kind == kind).count()))
        .collect();
    Ok(Inspection {
        document: target.document_id().clone(),
        notices: report.notices(),
        source: report.source,
        nodes: document.node_count(),
        edges: document.edge_count(),
        by_kind,
    })
}

/// Where `export` writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportDestination {
    Stdout,
    File(PathBuf),
    /// `storyboard_<today>.json` inside the given directory
    Dated(PathBuf),
}

/// Decrypt the stored document and write it as pretty JSON
///
/// Returns the written path, or `None` for stdout.
pub(crate) async fn export(
    target: &Target,
    destination: ExportDestination,
) -> anyhow::Result<Option<PathBuf>> {
    let (document, report) =
        load_document(target.gateway.as_ref(), &target.codec, target.document_id()).await;
    if report.source.is_recovery() {
        bail!("{}", report.source);
    }
    for notice in report.notices() {
        eprintln!("notice: {notice}");
    }

    let json = document.serialize().to_pretty_json()?;
    let path = match destination {
        ExportDestination::Stdout => {
            println!("{json}");
            return Ok(None);
        }
        ExportDestination::File(path) => path,
        ExportDestination::Dated(dir) => {
            dir.join(export_file_name(chrono::Local::now().date_naive()))
        }
    };
    std::fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        nodes = document.node_count(),
        edges = document.edge_count(),
        "exported storyboard"
    );
    Ok(Some(path))
}

/// Validate a JSON export, encrypt it and store it as the latest copy
pub(crate) async fn import(target: &Target, file: &Path) -> anyhow::Result<RecordId> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("{} is not JSON", file.display()))?;
    let restored = GraphDocument::from_value(value)?;
    for warning in &restored.warnings {
        eprintln!("notice: {warning}");
    }

    let blob = target.codec.encrypt(&restored.document.serialize())?;
    let record = target
        .gateway
        .store(
            target.document_id(),
            StoreRequest::new(target.session.title.clone(), blob.into_string()),
        )
        .await?;
    tracing::info!(
        document = %target.document_id(),
        record = %record,
        nodes = restored.document.node_count(),
        "imported storyboard"
    );
    Ok(record)
}

/// Arguments of `add-node`
#[derive(Debug, Clone)]
pub(crate) struct NewNode {
    pub(crate) label: String,
    pub(crate) kind: NodeKind,
    pub(crate) notes: String,
    pub(crate) connect_from: Option<NodeId>,
    pub(crate) edge_label: Option<String>,
}

/// Open a session, add the node (and edge), and close it to flush
///
/// Nothing is added unless the edge source exists. A failure after the node
/// went in still closes the session so the outcome is settled before
/// returning.
pub(crate) async fn add_node(target: Target, node: NewNode) -> anyhow::Result<NodeId> {
    let opened = Session::open(target.session, target.codec, target.gateway).await?;
    let handle = opened.handle;
    if opened.report.source.is_recovery() {
        handle.close().await?;
        bail!("refusing to overwrite: {}", opened.report.source);
    }

    if let Some(source) = &node.connect_from {
        let document = handle.export().await?;
        if !document.nodes.iter().any(|n| &n.id == source) {
            handle.close().await?;
            bail!("cannot connect from unknown node {source}");
        }
    }

    let id = match add_to_session(&handle, node).await {
        Ok(id) => id,
        Err(error) => {
            let report = handle.close().await?;
            return Err(error.context(format!(
                "add-node aborted after {} edit(s), saved: {}",
                report.revision, report.saved
            )));
        }
    };

    let report = handle.close().await?;
    if let Some(error) = report.last_error {
        bail!("node added but not saved: {error}");
    }
    Ok(id)
}

async fn add_to_session(handle: &SessionHandle, node: NewNode) -> anyhow::Result<NodeId> {
    let outcome = handle
        .apply(Gesture::create_node(node.label, node.kind, node.notes))
        .await?;
    let id = outcome
        .created_node()
        .cloned()
        .context("session did not report the new node")?;

    if let Some(source) = node.connect_from {
        handle
            .apply(Gesture::connect(source, id.clone(), node.edge_label))
            .await?;
    }
    Ok(id)
}
