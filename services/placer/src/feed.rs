//! Sources of desired updates.
//!
//! Diffing the target image against the live canvas happens outside this
//! crate. Whatever does it hands the scheduler a channel of
//! [`DesiredUpdate`]s through [`UpdateSource`]; the channel is bounded, so the
//! producer stalls while the scheduler works through its backlog.

use std::path::PathBuf;

use async_trait::async_trait;
use pixfleet_canvas::{CanvasPoint, DesiredUpdate};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::PlacerError;

/// Default capacity of the update channel.
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// Producer of desired updates.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Start producing updates for an image anchored at `anchor`.
    ///
    /// The returned channel closes when the source is exhausted or when
    /// `shutdown` flips to `true`.
    async fn start(
        &self,
        anchor: CanvasPoint,
        shutdown: watch::Receiver<bool>,
    ) -> Result<mpsc::Receiver<DesiredUpdate>, PlacerError>;
}

/// Reads image-relative updates from a JSON-lines file.
///
/// Each non-blank line that does not start with `#` holds one update, e.g.
/// `{"x": 3, "y": 7, "color": "dark blue"}`.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
    capacity: usize,
}

impl JsonLinesSource {
    /// Create a source for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            capacity: DEFAULT_FEED_CAPACITY,
        }
    }

    /// Override the channel capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

#[async_trait]
impl UpdateSource for JsonLinesSource {
    async fn start(
        &self,
        anchor: CanvasPoint,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<mpsc::Receiver<DesiredUpdate>, PlacerError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let updates = parse_updates(&contents, anchor);

        info!(
            path = %self.path.display(),
            count = updates.len(),
            "Loaded update feed"
        );

        let (tx, rx) = mpsc::channel(self.capacity);
        tokio::spawn(async move {
            for update in updates {
                tokio::select! {
                    sent = tx.send(update) => {
                        if sent.is_err() {
                            debug!("Update receiver dropped");
                            return;
                        }
                    }
                    true = async { shutdown.wait_for(|stop| *stop).await.is_ok() } => {
                        debug!("Update feed stopped by shutdown");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Parse JSON-lines updates and translate them by `anchor`.
///
/// Malformed lines and lines whose translated coordinate overflows are
/// logged and skipped.
pub fn parse_updates(contents: &str, anchor: CanvasPoint) -> Vec<DesiredUpdate> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match serde_json::from_str::<DesiredUpdate>(line) {
                Ok(update) => {
                    let relative = update.point;
                    let translated = update.offset(anchor);
                    if translated.is_none() {
                        warn!(
                            line = i + 1,
                            point = %relative,
                            anchor = %anchor,
                            "Skipping update outside coordinate range"
                        );
                    }
                    translated
                }
                Err(e) => {
                    warn!(line = i + 1, error = %e, "Skipping malformed update");
                    None
                }
            }
        })
        .collect()
}
