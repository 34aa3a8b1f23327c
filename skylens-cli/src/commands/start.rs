//! Start command - run the pipeline and tick the dispatcher.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

use skylens::fetch::ReqwestClient;
use skylens::pipeline::{unix_time_now, EventDispatcher, Pipeline, PipelineConfig, UrlRequest};
use skylens::track::TrackCounts;

use crate::error::CliError;

/// Arguments for the start command.
pub struct StartArgs {
    pub config: String,
    pub interval: u64,
    pub solve_after: Option<u64>,
}

/// Run the start command. Loops until the process is terminated.
pub fn run(args: StartArgs) -> Result<(), CliError> {
    let client = Arc::new(ReqwestClient::new()?);
    let pipeline = Pipeline::spawn(client, PipelineConfig::default());

    let handles = pipeline.handles.clone();
    let mut dispatcher = EventDispatcher::new(handles, pipeline.results);

    // A URL config goes through the fetch worker like any other; a
    // local file applies immediately.
    if args.config.starts_with("http://") || args.config.starts_with("https://") {
        info!(url = %args.config, "fetching configuration");
        dispatcher
            .handles()
            .fetch_url(UrlRequest::config(&args.config));
    } else {
        let text = std::fs::read_to_string(&args.config)?;
        let source = format!("file://{}", args.config);
        dispatcher.apply_config_text(&text, &source);
        if dispatcher.maps().current().is_none() {
            return Err(CliError::Config(format!(
                "{} did not define any usable map",
                args.config
            )));
        }
    }

    println!("skylens started; polling telemetry (ctrl-c to stop)");

    let mut last_counts = TrackCounts::default();
    let mut last_progress: Option<f32> = None;
    let mut ticks = 0u64;

    loop {
        let now = unix_time_now();
        dispatcher.tick(now);
        ticks += 1;

        if let Some(map) = dispatcher.maps().current_name() {
            let progress = dispatcher.maps().progress(map);
            if progress != last_progress {
                if let Some(percent) = progress {
                    println!("map '{map}': mosaic {percent:.0}% assembled");
                } else if last_progress.is_some() {
                    println!("map '{map}': mosaic ready");
                }
                last_progress = progress;
            }
        }

        let counts = dispatcher.counts();
        if counts != last_counts {
            println!(
                "aircraft: {} tracked, {} on map, {} late, {} missing, {} on ground",
                counts.total, counts.on_map, counts.late, counts.missing, counts.on_ground
            );
            last_counts = counts;
        }

        if args.solve_after == Some(ticks) {
            let solution = dispatcher.solve_alignment();
            println!(
                "alignment: tx {:.3} tz {:.3} rot {:.3} deg (energy {:.3})",
                solution.translation.x,
                solution.translation.z,
                solution.rotation_deg,
                solution.energy
            );
        }

        thread::sleep(Duration::from_secs(args.interval.max(1)));
    }
}
