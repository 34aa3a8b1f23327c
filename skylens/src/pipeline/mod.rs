//! Fetch/dispatch pipeline.
//!
//! The concurrency backbone: a fixed set of long-lived background
//! workers feed one shared results queue, and a single-consumer
//! [`EventDispatcher`] drains it once per foreground tick.
//!
//! # Architecture
//!
//! ```text
//! telemetry poller ──┐
//! url fetcher ───────┼──► results queue ──► EventDispatcher ──► domain state
//! tile job runner ───┘                      (single consumer)    (single writer)
//! outbound notifier (no results)
//! ```
//!
//! Request queues are the only data shared across threads. All domain
//! state (tracks, maps, observer, landmarks, alignment model) is owned
//! by the dispatcher and mutated only between ticks, so none of it
//! needs a lock. Within one worker, requests are handled strictly in
//! enqueue order; across workers there is no ordering guarantee and the
//! dispatcher tolerates any interleaving.

mod dispatcher;
mod events;
mod workers;

pub use dispatcher::EventDispatcher;
pub use events::{FetchKind, QueryExtent, ResultEvent, UrlRequest};
pub use workers::{PipelineConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TELEMETRY_URL, NOTIFY_DELAY};

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tokio::sync::watch;

use crate::fetch::HttpClient;
use crate::mosaic::TileJob;

/// Current wall-clock time as seconds since the Unix epoch.
///
/// Telemetry timestamps are unix seconds; extrapolation compares
/// against the same clock.
pub fn unix_time_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Senders for scheduling work on the background workers.
///
/// Cheap to clone; every queue accepts writes from multiple producers.
/// Enqueueing is fire-and-forget: a send after the matching worker has
/// exited (process shutdown) is silently dropped.
#[derive(Debug, Clone)]
pub struct PipelineHandles {
    extent: watch::Sender<Option<QueryExtent>>,
    urls: Sender<UrlRequest>,
    tiles: Sender<TileJob>,
    notifications: Sender<String>,
    webhook: watch::Sender<Option<String>>,
}

impl PipelineHandles {
    /// Replaces the telemetry query extent; only the latest value is
    /// ever fetched against.
    pub fn set_query_extent(&self, extent: QueryExtent) {
        let _ = self.extent.send(Some(extent));
    }

    /// Schedules a generic URL fetch.
    pub fn fetch_url(&self, request: UrlRequest) {
        let _ = self.urls.send(request);
    }

    /// Schedules a tile mosaic job.
    pub fn run_tile_job(&self, job: TileJob) {
        let _ = self.tiles.send(job);
    }

    /// Queues an outbound notification message.
    pub fn notify(&self, message: impl Into<String>) {
        let _ = self.notifications.send(message.into());
    }

    /// Sets or clears the outbound webhook destination.
    pub fn set_webhook(&self, url: Option<String>) {
        let _ = self.webhook.send(url);
    }
}

/// A running worker set plus the channel ends the foreground needs.
pub struct Pipeline {
    /// Senders for scheduling work.
    pub handles: PipelineHandles,
    /// The shared results queue consumed by the dispatcher.
    pub results: Receiver<ResultEvent>,
    results_sender: Sender<ResultEvent>,
}

impl Pipeline {
    /// Spawns the four background workers.
    ///
    /// Workers run for the process lifetime; they are not signaled to
    /// stop. Dropping the returned `Pipeline` closes the request queues
    /// and the workers wind down as their receives fail.
    pub fn spawn(client: Arc<dyn HttpClient>, config: PipelineConfig) -> Self {
        let (results_sender, results) = mpsc::channel();
        let (extent_tx, extent_rx) = watch::channel(None);
        let (urls_tx, urls_rx) = mpsc::channel();
        let (tiles_tx, tiles_rx) = mpsc::channel();
        let (notify_tx, notify_rx) = mpsc::channel();
        let (webhook_tx, webhook_rx) = watch::channel(None);

        {
            let client = Arc::clone(&client);
            let results = results_sender.clone();
            let config = config.clone();
            thread::spawn(move || workers::telemetry_poller(client, extent_rx, results, config));
        }
        {
            let client = Arc::clone(&client);
            let results = results_sender.clone();
            thread::spawn(move || workers::url_fetcher(client, urls_rx, results));
        }
        {
            let client = Arc::clone(&client);
            let results = results_sender.clone();
            thread::spawn(move || workers::tile_job_runner(client, tiles_rx, results));
        }
        {
            let client = Arc::clone(&client);
            thread::spawn(move || workers::notifier(client, notify_rx, webhook_rx, config));
        }

        Self {
            handles: PipelineHandles {
                extent: extent_tx,
                urls: urls_tx,
                tiles: tiles_tx,
                notifications: notify_tx,
                webhook: webhook_tx,
            },
            results,
            results_sender,
        }
    }

    /// A producer handle for the shared results queue.
    ///
    /// External collaborators outside this pipeline (a scanner callback
    /// or a test harness) can enqueue events that the dispatcher will
    /// apply on its next tick.
    pub fn result_sender(&self) -> Sender<ResultEvent> {
        self.results_sender.clone()
    }
}
