//! End-to-end pipeline tests: real worker threads, mock HTTP.

use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use skylens::fetch::{FetchError, HttpClient};
use skylens::pipeline::{EventDispatcher, Pipeline, PipelineConfig, ResultEvent};

/// Mock HTTP client that routes requests by URL.
struct RoutedHttp<F>(F);

impl<F> HttpClient for RoutedHttp<F>
where
    F: Fn(&str) -> Result<Vec<u8>, FetchError> + Send + Sync,
{
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (self.0)(url)
    }

    fn post_json(&self, _url: &str, _body: &str) -> Result<(), FetchError> {
        Ok(())
    }
}

fn spawn_pipeline<F>(route: F) -> Pipeline
where
    F: Fn(&str) -> Result<Vec<u8>, FetchError> + Send + Sync + 'static,
{
    Pipeline::spawn(Arc::new(RoutedHttp(route)), PipelineConfig::default())
}

fn telemetry_doc(address: &str, timestamp: i64, lat: f64) -> serde_json::Value {
    serde_json::json!({ "states": [[
        address, "TEST123", null, timestamp, null,
        4.9, lat, 1000.0, false, 200.0, 90.0, 0.0, null, null, null
    ]] })
}

fn tile_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(256, 256, image::Rgb([10, 200, 30]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

const TILES_CONFIG: &str = r#"{
    "maps": [{
        "name": "nl",
        "lat_range": [52.30, 52.40],
        "lon_range": [4.85, 4.95],
        "image_source": {
            "type": "tiles",
            "zoom": 10,
            "tile_servers": ["http://tiles.test/{zoom}/{x}/{y}.png"]
        }
    }]
}"#;

#[test]
fn dispatcher_applies_multi_producer_events_exactly_once() {
    let pipeline = spawn_pipeline(|_| Err(FetchError::Request("offline".to_string())));
    let handles = pipeline.handles.clone();
    let sender = pipeline.result_sender();
    let mut dispatcher = EventDispatcher::new(handles, pipeline.results);

    // Three producer threads, each sending an ordered burst for its own
    // aircraft.
    let producers: Vec<_> = ["aaa111", "bbb222", "ccc333"]
        .into_iter()
        .map(|address| {
            let sender = sender.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    sender
                        .send(ResultEvent::TelemetryBatch(telemetry_doc(
                            address,
                            1_000 + i,
                            52.0,
                        )))
                        .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    // One tick drains all 30 events.
    let applied = dispatcher.tick(1_100.0);
    assert_eq!(applied, 30);
    assert_eq!(dispatcher.tracks().len(), 3);

    // Per-producer enqueue order preserved: the newest timestamp of
    // each burst is the one a track ends up on.
    for address in ["aaa111", "bbb222", "ccc333"] {
        let track = dispatcher.tracks().get(address).unwrap();
        assert_eq!(track.last_sample().unwrap().timestamp, 1_009);
    }

    // Nothing left behind; events are consumed exactly once.
    assert_eq!(dispatcher.tick(1_100.0), 0);

    // Re-sending an already-applied batch is drained but idempotent.
    sender
        .send(ResultEvent::TelemetryBatch(telemetry_doc("aaa111", 1_009, 53.0)))
        .unwrap();
    assert_eq!(dispatcher.tick(1_100.0), 1);
    let track = dispatcher.tracks().get("aaa111").unwrap();
    assert_eq!(track.last_sample().unwrap().lat, 52.0);
}

#[test]
fn tile_job_produces_mosaic_end_to_end() {
    let pipeline = spawn_pipeline(|url| {
        if url.starts_with("http://tiles.test/") {
            Ok(tile_png())
        } else {
            Err(FetchError::Request(format!("unexpected url {url}")))
        }
    });
    let handles = pipeline.handles.clone();
    let mut dispatcher = EventDispatcher::new(handles, pipeline.results);

    dispatcher.apply_config_text(TILES_CONFIG, "test://config");
    let map = dispatcher.maps().current_name().unwrap().to_string();

    // The tile runner works in the background; poll until the mosaic
    // arrives.
    let deadline = Instant::now() + Duration::from_secs(10);
    while dispatcher.maps().image(&map).is_none() {
        assert!(Instant::now() < deadline, "mosaic never arrived");
        dispatcher.tick(0.0);
        thread::sleep(Duration::from_millis(20));
    }

    let raster = dispatcher.maps().image(&map).unwrap();
    // TGA header: 18 bytes, 24-bit uncompressed true-color.
    assert_eq!(raster[2], 2);
    assert_eq!(raster[16], 24);
    let width = u16::from_le_bytes([raster[12], raster[13]]) as usize;
    let height = u16::from_le_bytes([raster[14], raster[15]]) as usize;
    assert_eq!(raster.len(), 18 + width * height * 3);
    // Tile-aligned: whole multiples of the tile size on both axes.
    assert_eq!(width % 256, 0);
    assert_eq!(height % 256, 0);

    // A fetched pixel made it through the BGR conversion.
    assert_eq!(&raster[18..21], &[30, 200, 10]);
}

#[test]
fn failed_tiles_leave_blank_regions_but_mosaic_arrives() {
    // Fail every second tile by column parity.
    let pipeline = spawn_pipeline(|url| {
        let col: u64 = url
            .trim_start_matches("http://tiles.test/10/")
            .split('/')
            .next()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        if col % 2 == 0 {
            Err(FetchError::Status {
                status: 503,
                url: url.to_string(),
            })
        } else {
            Ok(tile_png())
        }
    });
    let handles = pipeline.handles.clone();
    let mut dispatcher = EventDispatcher::new(handles, pipeline.results);

    dispatcher.apply_config_text(TILES_CONFIG, "test://config");
    let map = dispatcher.maps().current_name().unwrap().to_string();

    let deadline = Instant::now() + Duration::from_secs(10);
    while dispatcher.maps().image(&map).is_none() {
        assert!(Instant::now() < deadline, "mosaic never arrived");
        dispatcher.tick(0.0);
        thread::sleep(Duration::from_millis(20));
    }

    // The mosaic arrived despite failures, full size, with blank (zero)
    // regions where fetches failed and image data where they worked.
    let raster = dispatcher.maps().image(&map).unwrap();
    let pixels = &raster[18..];
    assert!(pixels.iter().any(|&b| b == 0));
    assert!(pixels.iter().any(|&b| b == 200));
}
