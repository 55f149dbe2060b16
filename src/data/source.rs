//! Raw CSV retrieval from the published sheet (or a local file).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::blocking::Client;

use crate::error::{PipelineError, PipelineResult};

/// Published customer segmentation sheet (CSV export).
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRZgNxyt--8_BClE5Aa371WTaNJ38f0lhiGeGAUre2LEhrzeIHQtSYxvBaMnJnAbodWhgitFfqPmUj2/pub?output=csv";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can produce the raw CSV document.
pub trait CsvSource {
    fn fetch(&self) -> PipelineResult<String>;

    /// Human-readable origin, used in logs and report headers.
    fn describe(&self) -> String;
}

impl<S: CsvSource + ?Sized> CsvSource for Box<S> {
    fn fetch(&self) -> PipelineResult<String> {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

pub struct SheetClient {
    client: Client,
    url: String,
}

impl SheetClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::DataUnavailable(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CsvSource for SheetClient {
    fn fetch(&self) -> PipelineResult<String> {
        info!("fetching customer data from {}", self.url);
        let started = Instant::now();

        let resp = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/csv")
            .send()
            .map_err(|e| PipelineError::DataUnavailable(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(PipelineError::DataUnavailable(format!(
                "request failed with status {}",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| PipelineError::DataUnavailable(format!("failed to read response body: {e}")))?;

        info!(
            "fetched {} bytes in {} ms",
            body.len(),
            started.elapsed().as_millis()
        );
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Local CSV file, read through the same normalizer as the remote sheet.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CsvSource for FileSource {
    fn fetch(&self) -> PipelineResult<String> {
        debug!("reading customer data from {}", self.path.display());
        std::fs::read_to_string(&self.path).map_err(|e| {
            PipelineError::DataUnavailable(format!("failed to read '{}': {e}", self.path.display()))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one HTTP response on an ephemeral port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "{status_line}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/sheet.csv")
    }

    #[test]
    fn fetch_returns_body_on_success() {
        let url = serve_once("HTTP/1.1 200 OK", "a,b\n1,2\n");
        let client = SheetClient::new(url, Duration::from_secs(5)).unwrap();
        assert_eq!(client.fetch().unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn non_success_status_is_data_unavailable() {
        let url = serve_once("HTTP/1.1 404 Not Found", "gone");
        let client = SheetClient::new(url, Duration::from_secs(5)).unwrap();
        match client.fetch() {
            Err(PipelineError::DataUnavailable(msg)) => assert!(msg.contains("404"), "{msg}"),
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn connection_failure_is_data_unavailable() {
        // Bind then drop to get a port with nothing listening.
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let client = SheetClient::new(format!("http://{addr}/"), Duration::from_secs(2)).unwrap();
        assert!(matches!(client.fetch(), Err(PipelineError::DataUnavailable(_))));
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let source = FileSource::new("/definitely/not/here.csv");
        assert!(matches!(source.fetch(), Err(PipelineError::DataUnavailable(_))));
    }
}
