//! The push connection itself.
//!
//! The stream carries credentials as a `token` query parameter because the
//! browser transport it was designed for cannot set request headers.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Url;

use crate::config::ClientConfig;
use crate::error::{BellbookError, Result};
use crate::http::status_to_error;

/// Non-empty text lines read from an open push connection. An `Err` item or
/// the end of the stream means the connection is gone.
pub type EventLines = BoxStream<'static, Result<String>>;

/// Opens push connections.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Resolve once the connection is open, or fail.
    async fn connect(&self, access_token: &str) -> Result<EventLines>;
}

/// `GET {base}/events/stream?token=...` over HTTP.
pub struct HttpPushTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpPushTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: config.streaming_client()?,
            url: config.endpoint("/events/stream"),
        })
    }

    fn stream_url(&self, access_token: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| BellbookError::Configuration(format!("invalid stream URL: {e}")))?;
        url.query_pairs_mut().append_pair("token", access_token);
        Ok(url)
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn connect(&self, access_token: &str) -> Result<EventLines> {
        let resp = self
            .client
            .get(self.stream_url(access_token)?)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }

        Ok(split_lines(resp.bytes_stream()))
    }
}

/// Longest line accepted before the connection is treated as broken.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Reassemble `\n`/`\r\n`-terminated lines from arbitrarily split chunks.
/// Blank lines are skipped and an unterminated tail is dropped when the
/// chunks run out.
pub fn split_lines<S, B, E>(chunks: S) -> EventLines
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<BellbookError> + Send + 'static,
{
    let lines = async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    let err: BellbookError = e.into();
                    yield Err(err);
                    break;
                }
            };
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                let line = String::from_utf8_lossy(&raw).trim().to_string();
                if !line.is_empty() {
                    yield Ok(line);
                }
            }

            if buffer.len() > MAX_LINE_BYTES {
                yield Err(BellbookError::Stream(format!(
                    "event line exceeds {MAX_LINE_BYTES} bytes"
                )));
                break;
            }
        }
    };

    Box::pin(lines)
}

/// Extract the JSON payload from one line: SSE `data:` lines and bare JSON
/// lines carry one; comments (`:keepalive`) and other SSE fields do not.
pub fn event_payload(line: &str) -> Option<&str> {
    if line.starts_with(':') {
        return None;
    }
    if let Some(data) = line.strip_prefix("data:") {
        let data = data.trim_start();
        return (!data.is_empty()).then_some(data);
    }
    if ["event:", "id:", "retry:"].iter().any(|f| line.starts_with(f)) {
        return None;
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_from_sse_data_line() {
        assert_eq!(
            event_payload(r#"data: {"type":"connected"}"#),
            Some(r#"{"type":"connected"}"#)
        );
        assert_eq!(event_payload(r#"data:{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn bare_json_lines_pass_through() {
        assert_eq!(
            event_payload(r#"{"type":"message.new"}"#),
            Some(r#"{"type":"message.new"}"#)
        );
    }

    #[test]
    fn comments_and_fields_carry_no_payload() {
        assert_eq!(event_payload(": keepalive"), None);
        assert_eq!(event_payload("event: message"), None);
        assert_eq!(event_payload("id: 7"), None);
        assert_eq!(event_payload("retry: 3000"), None);
        assert_eq!(event_payload("data:"), None);
    }

    #[test]
    fn token_travels_as_encoded_query_parameter() {
        let transport =
            HttpPushTransport::new(&ClientConfig::new().with_base_url("http://host/api")).unwrap();
        let url = transport.stream_url("a.b+c/d").unwrap();
        assert_eq!(url.path(), "/api/events/stream");
        assert_eq!(url.query(), Some("token=a.b%2Bc%2Fd"));
    }

    fn chunks(parts: Vec<&'static [u8]>) -> Vec<Result<&'static [u8]>> {
        parts.into_iter().map(Ok).collect()
    }

    #[tokio::test]
    async fn lines_reassemble_across_chunk_boundaries() {
        let lines: Vec<String> = split_lines(futures::stream::iter(chunks(vec![
            &b"data: {\"a\":1}\r"[..],
            &b"\n: ka\n\nda"[..],
            &b"ta: x\n"[..],
            &b"unterminated"[..],
        ])))
        .map(|line| line.unwrap())
        .collect()
        .await;

        assert_eq!(lines, vec![r#"data: {"a":1}"#, ": ka", "data: x"]);
    }

    #[tokio::test]
    async fn overlong_line_ends_the_stream_with_an_error() {
        static HALF: [u8; MAX_LINE_BYTES / 2 + 1] = [b'x'; MAX_LINE_BYTES / 2 + 1];
        let items: Vec<Result<String>> = split_lines(futures::stream::iter(chunks(vec![
            &b"data: ok\n"[..],
            &HALF[..],
            &HALF[..],
            &b"\n"[..],
        ])))
        .collect()
        .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "data: ok");
        assert!(matches!(items[1], Err(BellbookError::Stream(_))));
    }

    #[tokio::test]
    async fn chunk_error_is_yielded_then_stream_ends() {
        let items: Vec<Result<String>> = split_lines(futures::stream::iter(vec![
            Ok(&b"data: one\n"[..]),
            Err(BellbookError::Stream("reset".into())),
            Ok(&b"data: two\n"[..]),
        ]))
        .collect()
        .await;

        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }
}
