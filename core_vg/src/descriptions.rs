//! Long-form legend descriptions.
//!
//! Descriptions are fetched off the session thread. Every request bumps a
//! generation counter and results carry the generation they were requested
//! under, so a slow fetch for an old selection never replaces the current one.

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use serde::Serialize;
use thiserror::Error;
use vg_runtime::format_code;
use vg_schema::{Description, LegendChain, LegendEntry, RawCode};

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("no description for link code {0}")]
    NotFound(RawCode),
    #[error("failed to read description from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse description {link_code}: {source}")]
    Parse {
        link_code: RawCode,
        #[source]
        source: serde_json::Error,
    },
}

/// Lookup of description assets by link code.
pub trait DescriptionService: Send + Sync + 'static {
    fn fetch(&self, link_code: RawCode) -> Result<Description, DescriptionError>;
}

/// Serves `descriptions/<linkCode>.json` from a local asset directory.
#[derive(Debug, Clone)]
pub struct DirectoryDescriptionService {
    root: PathBuf,
}

impl DirectoryDescriptionService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, link_code: RawCode) -> PathBuf {
        self.root
            .join("descriptions")
            .join(format!("{link_code}.json"))
    }
}

impl DescriptionService for DirectoryDescriptionService {
    fn fetch(&self, link_code: RawCode) -> Result<Description, DescriptionError> {
        let path = self.path_for(link_code);
        let contents = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DescriptionError::NotFound(link_code)
            } else {
                DescriptionError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        Description::from_json_str(&contents)
            .map_err(|source| DescriptionError::Parse { link_code, source })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDescriptionService {
    entries: HashMap<RawCode, Description>,
}

impl MemoryDescriptionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, link_code: RawCode, description: Description) -> Self {
        self.entries.insert(link_code, description);
        self
    }
}

impl DescriptionService for MemoryDescriptionService {
    fn fetch(&self, link_code: RawCode) -> Result<Description, DescriptionError> {
        self.entries
            .get(&link_code)
            .cloned()
            .ok_or(DescriptionError::NotFound(link_code))
    }
}

/// `images/<file>` relative to the directory of `base_url`.
pub fn resolve_asset_url(base_url: &str, image: &str) -> String {
    let directory = match base_url.rfind('/') {
        Some(index) => &base_url[..=index],
        None => "",
    };
    format!("{directory}images/{image}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DescriptionBody {
    Loaded {
        image_url: Option<String>,
        text: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptionView {
    pub code_text: String,
    pub name: String,
    pub link_code: RawCode,
    pub body: DescriptionBody,
}

impl DescriptionView {
    fn fetch(service: &dyn DescriptionService, base_url: &str, entry: &LegendEntry) -> Option<Self> {
        let code = entry.code?;
        let link_code = entry.link_code?;
        let body = match service.fetch(link_code) {
            Ok(description) => DescriptionBody::Loaded {
                image_url: description
                    .image
                    .as_deref()
                    .map(|image| resolve_asset_url(base_url, image)),
                text: description.text,
            },
            Err(err) => {
                tracing::warn!(
                    target: "vegmap::descriptions",
                    link_code,
                    error = %err,
                    "description.fetch_failed"
                );
                DescriptionBody::Failed {
                    error: err.to_string(),
                }
            }
        };
        Some(Self {
            code_text: format_code(code),
            name: entry.name.clone(),
            link_code,
            body,
        })
    }
}

/// Descriptions for every described entry of one legend chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendDescriptions {
    pub generation: u64,
    pub current: Option<DescriptionView>,
    pub ancestors: Vec<DescriptionView>,
}

impl LegendDescriptions {
    pub fn fetch(
        service: &dyn DescriptionService,
        base_url: &str,
        chain: &LegendChain,
        generation: u64,
    ) -> Self {
        let mut views = chain
            .described()
            .iter()
            .filter_map(|entry| DescriptionView::fetch(service, base_url, entry));
        let current = views.next();
        Self {
            generation,
            current,
            ancestors: views.collect(),
        }
    }

    pub fn failures(&self) -> usize {
        self.current
            .iter()
            .chain(self.ancestors.iter())
            .filter(|view| matches!(view.body, DescriptionBody::Failed { .. }))
            .count()
    }
}

/// Fire-and-forget description fetches with last-request-wins delivery.
/// Every request gets its own fetch thread; results come back over one
/// channel.
pub struct DescriptionLoader {
    service: Arc<dyn DescriptionService>,
    base_url: String,
    sender: Sender<LegendDescriptions>,
    receiver: Receiver<LegendDescriptions>,
    generation: u64,
}

impl DescriptionLoader {
    pub fn new(service: Arc<dyn DescriptionService>, base_url: impl Into<String>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            service,
            base_url: base_url.into(),
            sender,
            receiver,
            generation: 0,
        }
    }

    /// Starts fetching descriptions for `chain` and supersedes every earlier
    /// request. Returns the generation of the new request.
    pub fn request(&mut self, chain: &LegendChain) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let service = Arc::clone(&self.service);
        let base_url = self.base_url.clone();
        let sender = self.sender.clone();
        let entries = chain.described().len();
        let chain = chain.clone();

        thread::spawn(move || {
            let loaded = LegendDescriptions::fetch(service.as_ref(), &base_url, &chain, generation);
            // The loader may have been dropped; nobody is waiting then.
            let _ = sender.send(loaded);
        });

        tracing::debug!(
            target: "vegmap::descriptions",
            generation,
            entries,
            "description.requested"
        );
        generation
    }

    /// Marks every in-flight request stale, e.g. after a deselect.
    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    fn accept(&self, loaded: LegendDescriptions) -> Option<LegendDescriptions> {
        if loaded.generation == self.generation {
            Some(loaded)
        } else {
            tracing::debug!(
                target: "vegmap::descriptions",
                stale = loaded.generation,
                current = self.generation,
                "description.discarded=stale"
            );
            None
        }
    }

    /// Non-blocking: the current request's result if it has arrived.
    pub fn poll(&mut self) -> Option<LegendDescriptions> {
        let mut latest = None;
        while let Ok(loaded) = self.receiver.try_recv() {
            if let Some(accepted) = self.accept(loaded) {
                latest = Some(accepted);
            }
        }
        latest
    }

    /// Blocks until the current request completes or `timeout` elapses.
    pub fn wait_latest(&mut self, timeout: Duration) -> Option<LegendDescriptions> {
        // A timeout too large to represent waits without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let received = match deadline {
                Some(deadline) => self
                    .receiver
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(loaded) => {
                    if let Some(accepted) = self.accept(loaded) {
                        return Some(accepted);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }
}
