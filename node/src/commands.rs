//! Subcommand handlers. Each writes its report to `out`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use snipshare_files::{
    ActionLog, ChannelDispatch, FanoutDispatch, FileIngestSession, FilesAction, FilesDispatch,
    IngestFile, IngestReceipt, MemoryFileStore, StateDispatch, StoreHandle,
};
use snipshare_links::{
    decode_addresses, decode_prefill, edit_link, Location, Route, RouteStateMachine, ShareLink,
};
use snipshare_p2p::NodeAddressBook;
use snipshare_types::{detect_language, format_bytes, SupportedLanguage};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use url::Url;

use crate::settings::AppConfig;

/// Input of the `snippet` subcommand.
#[derive(Debug, Clone)]
pub struct SnippetArgs {
    pub filename: String,
    pub language: Option<SupportedLanguage>,
    pub source: SnippetSource,
}

#[derive(Debug, Clone)]
pub enum SnippetSource {
    Inline(String),
    File(PathBuf),
}

/// Everything a command needs from the running node.
pub struct Node {
    base_url: Url,
    addresses: NodeAddressBook,
    session: FileIngestSession<MemoryFileStore>,
    state: StateDispatch,
    progress: Mutex<UnboundedReceiver<FilesAction>>,
}

impl Node {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let addresses = NodeAddressBook::from_addresses(config.peer_addresses());
        let store = Arc::new(MemoryFileStore::with_chunk_size(config.read_chunk_size));
        let state = StateDispatch::new();
        let (channel, progress) = ChannelDispatch::new();
        let dispatch = FanoutDispatch::new(vec![Arc::new(state.clone()), Arc::new(channel)]);
        let session = FileIngestSession::new(StoreHandle::ready(store), Arc::new(dispatch));
        Ok(Self {
            base_url,
            addresses,
            session,
            state,
            progress: Mutex::new(progress),
        })
    }

    /// Actions dispatched by the ingest session since the last call.
    fn drain_progress(&self) -> Vec<FilesAction> {
        let mut progress = self.progress.lock();
        let mut actions = Vec::new();
        while let Ok(action) = progress.try_recv() {
            actions.push(action);
        }
        actions
    }

    fn share_url(&self, receipt: &IngestReceipt) -> Url {
        ShareLink::for_node(receipt.content_id.clone(), &self.addresses).to_url(&self.base_url)
    }

    fn edit_url(&self, code: &str, filename: &str) -> Url {
        let mut url = self.base_url.clone();
        let fragment = edit_link(code, filename);
        url.set_fragment(Some(fragment.trim_start_matches('#')));
        url
    }

    /// `share <PATH>...`
    pub async fn share(&self, paths: &[PathBuf], out: &mut impl Write) -> Result<()> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let content = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            files.push(IngestFile::new(file_name(path)?, content));
        }

        let receipt = self.session.add_files(files).await?;
        info!(
            content_id = %receipt.content_id,
            tracked = self.state.snapshot().files.len(),
            "shared {} file(s)",
            receipt.files.len()
        );

        writeln!(out, "{}", self.share_url(&receipt))?;
        for action in self.drain_progress() {
            if let FilesAction::AddStart(file) = action {
                writeln!(
                    out,
                    "  {}  {}  {}",
                    file.name,
                    format_bytes(file.size),
                    detect_language(&file.name)
                )?;
            }
        }
        Ok(())
    }

    /// `snippet --filename <NAME> ...`
    pub async fn snippet(&self, args: SnippetArgs, out: &mut impl Write) -> Result<()> {
        let code = match &args.source {
            SnippetSource::Inline(code) => code.clone(),
            SnippetSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        };
        let filename = snippet_filename(&args.filename, args.language);

        let receipt = self.session.add_snippet(&code, &filename).await?;
        self.drain_progress();
        let stored_name = receipt
            .files
            .first()
            .map(|file| file.name.clone())
            .unwrap_or(filename);
        info!(content_id = %receipt.content_id, file = %stored_name, "snippet shared");

        writeln!(out, "share: {}", self.share_url(&receipt))?;
        writeln!(out, "edit:  {}", self.edit_url(&code, &stored_name))?;
        writeln!(
            out,
            "  {}  {}  {}",
            stored_name,
            format_bytes(code.len() as u64),
            args.language.unwrap_or_else(|| detect_language(&stored_name))
        )?;
        Ok(())
    }

    /// `open <LINK>`
    pub fn open(&self, link: &str, out: &mut impl Write) -> Result<()> {
        let log = ActionLog::new();
        let state = StateDispatch::new();
        let sinks: Vec<Arc<dyn FilesDispatch>> =
            vec![Arc::new(log.clone()), Arc::new(state.clone())];
        let mut routes = RouteStateMachine::new(Arc::new(FanoutDispatch::new(sinks)));
        let route = routes.observe(link);
        let location = Location::parse(link);

        writeln!(out, "route: {route}")?;
        match route {
            Route::Download => {
                for action in log.take() {
                    match action {
                        FilesAction::FetchStart(request) => {
                            writeln!(out, "fetch_start {}", request.content_id)?;
                            for provider in &request.providers {
                                writeln!(out, "  provider {provider}")?;
                            }
                        }
                        other => writeln!(out, "{}", other.kind())?,
                    }
                }
                let addresses = decode_addresses(&location);
                writeln!(out, "addresses: {}", addresses.len())?;
                writeln!(out, "pending fetches: {}", state.snapshot().files_to_fetch.len())?;
            }
            Route::Add => {
                if let Some(prefill) = decode_prefill(&location) {
                    writeln!(out, "filename: {}", prefill.filename)?;
                    writeln!(out, "language: {}", detect_language(&prefill.filename))?;
                    writeln!(out, "code:")?;
                    writeln!(out, "{}", prefill.code)?;
                }
            }
            Route::Manage => {}
        }
        Ok(())
    }

    /// `addresses`
    pub fn addresses(&self, out: &mut impl Write) -> Result<()> {
        let known = self.addresses.snapshot();
        writeln!(out, "known addresses: {}", known.len())?;
        for address in &known {
            writeln!(out, "  [{}] {}", address.class(), address)?;
        }

        let selected = self.addresses.share_addresses();
        writeln!(out, "shared in links: {}", selected.len())?;
        for address in &selected {
            writeln!(out, "  {address}")?;
        }
        Ok(())
    }
}

/// Append the language's default extension to a bare filename.
pub fn snippet_filename(filename: &str, language: Option<SupportedLanguage>) -> String {
    match language {
        Some(language) if !filename.contains('.') => {
            format!("{filename}{}", language.default_extension())
        }
        _ => filename.to_string(),
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}
