//! `GET {base_url}/users/{handle}` over a blocking `ureq` agent.
//!
//! The agent applies separate connect, read and write timeouts. A request
//! whose connection cannot be established is retried once, immediately;
//! nothing is retried once a connection has succeeded.

use super::{FetchError, ProfileSource};
use crate::config::ProfileConfig;
use crate::model::{Profile, UserPayload};
use async_trait::async_trait;
use std::error::Error as _;
use std::io;
use tracing::{debug, trace, warn};
use url::Url;

#[derive(Clone)]
pub struct HttpProfileSource {
    agent: ureq::Agent,
    base_url: String,
    retry_on_connection_failure: bool,
}

impl HttpProfileSource {
    #[must_use]
    pub fn new(config: &ProfileConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout())
            .timeout_read(config.read_timeout())
            .timeout_write(config.write_timeout())
            .user_agent(&config.user_agent)
            .build();

        Self {
            agent,
            base_url: config.base_url.clone(),
            retry_on_connection_failure: config.retry_on_connection_failure,
        }
    }

    /// Absolute URL for `handle`'s profile. The handle is percent-encoded as
    /// a single path segment.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the configured base URL cannot
    /// carry a path, or `handle` is empty, `.` or `..`.
    pub fn user_url(&self, handle: &str) -> Result<String, FetchError> {
        if matches!(handle, "" | "." | "..") {
            return Err(FetchError::Transport(format!("invalid profile handle {handle:?}")));
        }
        let mut url = Url::parse(&self.base_url).map_err(|error| {
            FetchError::Transport(format!("invalid base url {}: {error}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| FetchError::Transport(format!("base url {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push("users")
            .push(handle);
        Ok(url.to_string())
    }

    fn fetch_blocking(&self, url: &str) -> Result<Profile, FetchError> {
        let response = send_with_retry(self.retry_on_connection_failure, url, || self.send(url))
            .map_err(|error| classify_error(url, error))?;
        decode_response(url, response)
    }

    fn send(&self, url: &str) -> Result<ureq::Response, ureq::Error> {
        debug!(url, "--> GET");
        self.agent
            .get(url)
            .set("Accept", "application/vnd.github+json")
            .call()
    }
}

impl std::fmt::Debug for HttpProfileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProfileSource")
            .field("base_url", &self.base_url)
            .field("retry_on_connection_failure", &self.retry_on_connection_failure)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn fetch_profile(&self, handle: &str) -> Result<Profile, FetchError> {
        let source = self.clone();
        let url = self.user_url(handle)?;
        tokio::task::spawn_blocking(move || source.fetch_blocking(&url))
            .await
            .map_err(|error| FetchError::Transport(format!("profile request did not complete: {error}")))?
    }
}

fn decode_response(url: &str, response: ureq::Response) -> Result<Profile, FetchError> {
    let status = response.status();
    let body = response
        .into_string()
        .map_err(|error| classify_io(url, &error))?;
    debug!(url, status, bytes = body.len(), "<-- response");
    trace!(url, body = %body, "response body");

    let payload: UserPayload =
        serde_json::from_str(&body).map_err(|error| FetchError::Decode(error.to_string()))?;
    Ok(payload.into())
}

/// Run `attempt`; run it exactly once more if no connection could be made.
fn send_with_retry(
    retry_on_connection_failure: bool,
    url: &str,
    mut attempt: impl FnMut() -> Result<ureq::Response, ureq::Error>,
) -> Result<ureq::Response, ureq::Error> {
    match attempt() {
        Err(error) if retry_on_connection_failure && is_connection_failure(&error) => {
            warn!(url, error = %error, "connection failed, retrying once");
            attempt()
        }
        other => other,
    }
}

fn is_connection_failure(error: &ureq::Error) -> bool {
    matches!(
        error,
        ureq::Error::Transport(transport) if transport.kind() == ureq::ErrorKind::ConnectionFailed
    )
}

fn classify_error(url: &str, error: ureq::Error) -> FetchError {
    match error {
        ureq::Error::Status(status, response) => FetchError::Status {
            url: url.to_string(),
            status,
            reason: response.status_text().to_string(),
        },
        ureq::Error::Transport(transport) => {
            let io_kind = transport
                .source()
                .and_then(|source| source.downcast_ref::<io::Error>())
                .map(io::Error::kind);

            if matches!(io_kind, Some(io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)) {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else if transport.kind() == ureq::ErrorKind::ConnectionFailed {
                FetchError::Connect {
                    url: url.to_string(),
                    reason: transport
                        .message()
                        .map_or_else(|| transport.kind().to_string(), ToString::to_string),
                }
            } else {
                FetchError::Transport(transport.to_string())
            }
        }
    }
}

fn classify_io(url: &str, error: &io::Error) -> FetchError {
    match error.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FetchError::Timeout {
            url: url.to_string(),
        },
        _ => FetchError::Transport(format!("failed to read response from {url}: {error}")),
    }
}
