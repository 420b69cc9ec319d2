//! Server-sent events transport for the push channel.

use futures::Stream;
use reqwest::header::{ACCEPT, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use url::Url;

use super::{PushError, Subscription};
use crate::config::ClientConfig;

/// Event name used when a block carries no `event:` field.
const DEFAULT_EVENT: &str = "message";

/// One event as it came off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub event: String,
    pub data: String,
}

/// Connects to the backend's SSE endpoint.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: reqwest::Client,
    url: Url,
}

impl SseTransport {
    /// Create a transport for the configured push URL.
    ///
    /// The connection has no overall timeout; it stays open until the
    /// server closes it or the consumer drops the stream.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.push_url.clone(),
        })
    }

    /// Open a subscription and stream its events.
    ///
    /// Reconnection is left to the caller: the stream ends when the
    /// connection does.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the endpoint answers non-2xx.
    #[instrument(skip(self, token), fields(scope = %subscription.scope_param()))]
    pub async fn connect(
        &self,
        subscription: &Subscription,
        token: Option<&SecretString>,
    ) -> Result<impl Stream<Item = Result<RawEvent, PushError>> + Send + 'static, PushError> {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("scope", &subscription.scope_param());

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"));
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status(status.as_u16()));
        }
        debug!("Push channel connected");

        Ok(async_stream::stream! {
            use futures::StreamExt;

            let mut buffer: Vec<u8> = Vec::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        buffer.extend_from_slice(&chunk);

                        while let Some(block) = extract_sse_event(&mut buffer) {
                            match String::from_utf8(block) {
                                Ok(text) => {
                                    if let Some(event) = parse_sse_event(&text) {
                                        yield Ok(event);
                                    }
                                }
                                Err(e) => {
                                    yield Err(PushError::Stream(format!("Invalid UTF-8: {e}")));
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(PushError::Stream(e.to_string()));
                        break;
                    }
                }
            }
        })
    }
}

/// Pop the next complete event block off `buffer`.
///
/// Blocks end at a blank line; `\r\n` line endings are accepted.
fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let (end, separator_len) = find_separator(buffer)?;
    let rest = buffer.split_off(end + separator_len);
    let mut block = std::mem::replace(buffer, rest);
    block.truncate(end);
    Some(block)
}

fn find_separator(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Parse one event block into a `RawEvent`.
///
/// Comment lines (`:`) and `id:`/`retry:` fields are skipped. Multiple
/// `data:` lines are joined with newlines. Blocks without data yield `None`.
fn parse_sse_event(block: &str) -> Option<RawEvent> {
    let mut event = None;
    let mut data: Option<String> = None;

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);

        match field {
            "event" => event = Some(value.to_string()),
            "data" => match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_string()),
            },
            _ => {}
        }
    }

    Some(RawEvent {
        event: event.unwrap_or_else(|| DEFAULT_EVENT.to_string()),
        data: data?,
    })
}
