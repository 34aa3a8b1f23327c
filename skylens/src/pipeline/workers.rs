//! Background worker loops.
//!
//! Four long-lived threads, each blocking only on its own inbound queue
//! or on network I/O. Workers never touch domain state; everything they
//! produce travels through the shared results queue to the dispatcher.
//! They run until the process exits (or the results receiver is
//! dropped, which ends a worker's send loop).

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::fetch::HttpClient;
use crate::mosaic::{run_tile_job, TileJob};

use super::events::{FetchKind, QueryExtent, ResultEvent, UrlRequest};

/// Default telemetry endpoint template; `{lamin}`/`{lamax}`/`{lomin}`/
/// `{lomax}` are replaced with the current query extent.
pub const DEFAULT_TELEMETRY_URL: &str =
    "https://opensky-network.org/api/states/all?lamin={lamin}&lamax={lamax}&lomin={lomin}&lomax={lomax}";

/// Seconds between telemetry polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(8);

/// Pause after each outbound notification, to stay under the remote
/// rate limit.
pub const NOTIFY_DELAY: Duration = Duration::from_millis(200);

/// How long the telemetry poller naps while no extent is set yet.
const EXTENT_WAIT: Duration = Duration::from_millis(100);

/// Tunables for the worker set.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub telemetry_url_template: String,
    pub poll_interval: Duration,
    pub notify_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            telemetry_url_template: DEFAULT_TELEMETRY_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            notify_delay: NOTIFY_DELAY,
        }
    }
}

fn telemetry_url(template: &str, extent: &QueryExtent) -> String {
    template
        .replace("{lamin}", &extent.min_lat.to_string())
        .replace("{lamax}", &extent.max_lat.to_string())
        .replace("{lomin}", &extent.min_lon.to_string())
        .replace("{lomax}", &extent.max_lon.to_string())
}

/// Telemetry poller: one fetch per interval against the endpoint
/// parameterized by the newest query extent.
///
/// Blocks until an initial extent appears on the watch channel. An
/// extent update arriving mid-interval is picked up for the very next
/// fetch; intermediate values are skipped, not queued.
pub(super) fn telemetry_poller(
    client: Arc<dyn HttpClient>,
    extent_rx: watch::Receiver<Option<QueryExtent>>,
    results: Sender<ResultEvent>,
    config: PipelineConfig,
) {
    info!("telemetry poller started");

    loop {
        let Some(extent) = *extent_rx.borrow() else {
            thread::sleep(EXTENT_WAIT);
            continue;
        };

        let url = telemetry_url(&config.telemetry_url_template, &extent);
        match client.get(&url) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(document) => {
                    if results.send(ResultEvent::TelemetryBatch(document)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "telemetry response did not parse"),
            },
            Err(e) => warn!(error = %e, "telemetry fetch failed"),
        }

        thread::sleep(config.poll_interval);
    }
}

/// Generic URL fetcher: drains its queue, one blocking fetch each, no
/// retry. Failures become `FetchFailed` events and the loop moves on.
pub(super) fn url_fetcher(
    client: Arc<dyn HttpClient>,
    requests: Receiver<UrlRequest>,
    results: Sender<ResultEvent>,
) {
    info!("url fetcher started");

    while let Ok(request) = requests.recv() {
        info!(url = %request.url, kind = ?request.kind, tag = %request.tag, "fetching url");

        let event = match client.get(&request.url) {
            Ok(bytes) => match request.kind {
                FetchKind::ConfigDocument => match String::from_utf8(bytes) {
                    Ok(text) => ResultEvent::ConfigDocument {
                        text,
                        source_url: request.tag,
                    },
                    Err(e) => {
                        warn!(url = %request.url, error = %e, "config document is not UTF-8");
                        continue;
                    }
                },
                FetchKind::MapImage => ResultEvent::MapImage {
                    map_id: request.tag,
                    bytes,
                },
            },
            Err(error) => {
                warn!(url = %request.url, %error, "url fetch failed");
                ResultEvent::FetchFailed {
                    url: request.url,
                    error,
                }
            }
        };

        if results.send(event).is_err() {
            return;
        }
    }
}

/// Tile job runner: one job fully processed, progress events included,
/// before the next starts.
pub(super) fn tile_job_runner(
    client: Arc<dyn HttpClient>,
    jobs: Receiver<TileJob>,
    results: Sender<ResultEvent>,
) {
    info!("tile job runner started");

    while let Ok(job) = jobs.recv() {
        let map_id = job.map_id.clone();
        let progress_sender = results.clone();

        let outcome = run_tile_job(&job, client.as_ref(), |percent| {
            let _ = progress_sender.send(ResultEvent::TileProgress {
                map_id: map_id.clone(),
                percent,
            });
        });

        match outcome {
            Ok(image) => {
                if results
                    .send(ResultEvent::MosaicReady { map_id, image })
                    .is_err()
                {
                    return;
                }
            }
            Err(e) => warn!(map = %map_id, error = %e, "tile job failed"),
        }
    }
}

/// Outbound notifier: posts each queued message to the configured
/// webhook, best-effort. Without a configured webhook, messages are
/// logged and dropped.
pub(super) fn notifier(
    client: Arc<dyn HttpClient>,
    messages: Receiver<String>,
    webhook_rx: watch::Receiver<Option<String>>,
    config: PipelineConfig,
) {
    info!("notifier started");

    while let Ok(message) = messages.recv() {
        let webhook = webhook_rx.borrow().clone();
        let Some(url) = webhook else {
            info!(message = %message, "no webhook configured, dropping message");
            continue;
        };

        let body = serde_json::json!({ "content": message }).to_string();
        if let Err(e) = client.post_json(&url, &body) {
            warn!(error = %e, "notification post failed");
        }

        thread::sleep(config.notify_delay);
    }
}
