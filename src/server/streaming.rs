//! Byte-transparent SSE relay to the caller.
//!
//! The upstream body is piped chunk-for-chunk: no parsing of `data:` lines,
//! no re-framing, no buffering. Downstream clients depend on raw pass-through
//! timing and framing, so nothing here may coalesce or rewrite chunks.

use std::convert::Infallible;
use std::fmt::Display;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::Stream;
use prometheus::IntCounter;
use tokio_stream::StreamExt;
use tracing::warn;

/// Trailing blank line appended once the upstream stream ends, for clients
/// that expect an explicit terminator.
const STREAM_SENTINEL: &[u8] = b"\n\n";

/// Wrap an upstream byte stream for relaying.
///
/// Read errors are logged and swallowed: the relay has already committed a
/// 200 and whatever bytes arrived, so the only remaining signal is closing
/// the connection. The terminator sentinel is appended after the last chunk,
/// truncation included.
pub fn sentinel_terminated<S, E>(
    upstream: S,
    request_id: String,
    aborts: IntCounter,
) -> impl Stream<Item = Result<Bytes, Infallible>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    upstream
        .map_while(move |chunk| match chunk {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                aborts.inc();
                warn!(
                    request_id = request_id,
                    error = %err,
                    "Upstream stream failed mid-relay"
                );
                None
            }
        })
        .map(Ok)
        .chain(tokio_stream::once(Ok(Bytes::from_static(STREAM_SENTINEL))))
}

/// Build the streaming response.
///
/// SSE-compatible headers are committed before any body bytes are known,
/// then the upstream body is relayed verbatim.
pub fn relay_sse_response(
    upstream: reqwest::Response,
    request_id: String,
    aborts: IntCounter,
) -> Response {
    let body = Body::from_stream(sentinel_terminated(
        upstream.bytes_stream(),
        request_id,
        aborts,
    ));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .header(header::CONNECTION, "keep-alive")
        .body(body)
        .expect("static response parts are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abort_counter() -> IntCounter {
        IntCounter::new("test_aborts", "test").unwrap()
    }

    async fn collect(
        chunks: Vec<Result<Bytes, String>>,
        aborts: IntCounter,
    ) -> Vec<Bytes> {
        let stream = sentinel_terminated(tokio_stream::iter(chunks), "test".to_string(), aborts);
        tokio::pin!(stream);

        let mut out = Vec::new();
        while let Some(Ok(chunk)) = stream.next().await {
            out.push(chunk);
        }
        out
    }

    #[tokio::test]
    async fn test_sentinel_appended_after_clean_end() {
        let aborts = abort_counter();
        let out = collect(
            vec![
                Ok(Bytes::from_static(b"data: A\n\n")),
                Ok(Bytes::from_static(b"data: B\n\n")),
            ],
            aborts.clone(),
        )
        .await;

        assert_eq!(
            out,
            vec![
                Bytes::from_static(b"data: A\n\n"),
                Bytes::from_static(b"data: B\n\n"),
                Bytes::from_static(b"\n\n"),
            ]
        );
        assert_eq!(aborts.get(), 0);
    }

    #[tokio::test]
    async fn test_error_truncates_but_still_terminates() {
        let aborts = abort_counter();
        let out = collect(
            vec![
                Ok(Bytes::from_static(b"data: A\n\n")),
                Err("connection reset".to_string()),
                Ok(Bytes::from_static(b"data: B\n\n")),
            ],
            aborts.clone(),
        )
        .await;

        // Chunks after the failure are never relayed; the terminator is.
        assert_eq!(
            out,
            vec![
                Bytes::from_static(b"data: A\n\n"),
                Bytes::from_static(b"\n\n"),
            ]
        );
        assert_eq!(aborts.get(), 1);
    }

    #[tokio::test]
    async fn test_empty_stream_yields_only_sentinel() {
        let out = collect(vec![], abort_counter()).await;
        assert_eq!(out, vec![Bytes::from_static(b"\n\n")]);
    }
}
