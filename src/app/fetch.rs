// LogPoller - app/fetch.rs
//
// The fetch seam: `SnapshotSource` produces one snapshot per call.
// `HttpSource` issues a plain GET (no body, no extra headers) with a blocking
// reqwest client, because the poll loop runs on std threads.
//
// Failure mapping:
//   - send/connect failure      -> FetchError::Network
//   - request timeout           -> FetchError::Timeout
//   - non-2xx status            -> FetchError::Server
//   - unreadable body           -> FetchError::Body
//   - body over the size cap    -> FetchError::BodyTooLarge
// Non-UTF-8 bytes are decoded lossily.

use crate::core::model::LogSnapshot;
use crate::util::constants::MAX_SNAPSHOT_BYTES;
use crate::util::error::FetchError;
use reqwest::blocking::Client;
use reqwest::Url;
use std::io::Read;
use std::time::Duration;

pub use crate::util::endpoint::parse_endpoint;

/// Something that can produce the current log snapshot.
pub trait SnapshotSource {
    /// Fetch the full current snapshot.
    fn fetch(&self) -> Result<LogSnapshot, FetchError>;

    /// Where snapshots come from, for logs and the status bar.
    fn endpoint(&self) -> &str;
}

/// Fetches snapshots over HTTP. Cheap to clone; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: Url,
    endpoint: String,
    timeout: Duration,
}

impl HttpSource {
    /// Build a source for `endpoint` with a per-request `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let url = parse_endpoint(endpoint)?;
        let endpoint = url.to_string();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("logpoller/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network {
                endpoint: endpoint.clone(),
                reason: format!("could not build HTTP client: {e}"),
            })?;
        tracing::debug!(endpoint = %endpoint, timeout_ms = timeout.as_millis() as u64, "HTTP source ready");
        Ok(Self {
            client,
            url,
            endpoint,
            timeout,
        })
    }

    fn send_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                endpoint: self.endpoint.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            FetchError::Network {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        }
    }
}

impl SnapshotSource for HttpSource {
    fn fetch(&self) -> Result<LogSnapshot, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Server {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > MAX_SNAPSHOT_BYTES as u64 {
                return Err(FetchError::BodyTooLarge {
                    endpoint: self.endpoint.clone(),
                    size: len as usize,
                    max_size: MAX_SNAPSHOT_BYTES,
                });
            }
        }

        // Read at most one byte past the cap so an unannounced oversized
        // body is detected without buffering all of it.
        let mut body = Vec::new();
        response
            .take(MAX_SNAPSHOT_BYTES as u64 + 1)
            .read_to_end(&mut body)
            .map_err(|e| FetchError::Body {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;
        if body.len() > MAX_SNAPSHOT_BYTES {
            return Err(FetchError::BodyTooLarge {
                endpoint: self.endpoint.clone(),
                size: body.len(),
                max_size: MAX_SNAPSHOT_BYTES,
            });
        }

        Ok(LogSnapshot::new(String::from_utf8_lossy(&body).into_owned()))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
