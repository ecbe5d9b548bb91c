// Integration tests for shopscrape
// These tests run the whole pipeline against a local image server

pub mod pipeline_tests;
pub mod logging_tests;

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use shopscrape::{AppConfig, Record, RecordSet};
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Test configuration for integration tests
pub fn get_test_config(base_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.scraper.url = "https://scrapeme.live/shop/".to_string();
    config.output.base_dir = base_dir.to_path_buf();
    config.downloads.request_timeout_secs = 5;
    config
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
}

/// Serves `/img/{file}` with the given status for each entry.
pub async fn start_image_server(images: &[(&str, u16)]) -> MockServer {
    let server = MockServer::start().await;
    for (file, status) in images {
        Mock::given(method("GET"))
            .and(path(format!("/img/{}", file)))
            .respond_with(ResponseTemplate::new(*status).set_body_bytes(PNG_BYTES.to_vec()))
            .expect(1)
            .mount(&server)
            .await;
    }
    server
}

/// Bulbasaur, Ivysaur (404) and Mr. Mime, all served from `server`.
pub fn sample_records(server: &MockServer) -> RecordSet {
    RecordSet::new(vec![
        Record::new("Bulbasaur #1", "£63.00", format!("{}/img/bulbasaur-1.png", server.uri())),
        Record::new("Ivysaur", "£87.00", format!("{}/img/ivysaur.png", server.uri())),
        Record::new("Mr. Mime <3", "£1 & up", format!("{}/img/122.png?resize=350", server.uri())),
    ])
}

pub async fn sample_server() -> MockServer {
    start_image_server(&[("bulbasaur-1.png", 200), ("ivysaur.png", 404), ("122.png", 200)]).await
}

pub fn write_input(dir: &Path, records: &RecordSet) -> std::path::PathBuf {
    let input = dir.join("input.json");
    std::fs::write(&input, serde_json::to_string(records).unwrap()).unwrap();
    input
}

/// In-memory log sink for asserting on emitted lines.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
