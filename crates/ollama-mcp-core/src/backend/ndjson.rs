//! Newline-delimited JSON decoding for streamed `/api/chat` replies

use futures::{future, Stream, StreamExt};
use std::io;
use std::sync::Arc;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;

use super::error::{BackendError, BackendResult};
use super::traits::ChunkStream;
use super::wire::WireChatChunk;
use crate::logging::Logger;
use crate::types::StreamChunk;
use crate::log_warn;

/// Decode one NDJSON line; blank and malformed lines yield nothing
fn parse_line(line: &str, logger: &dyn Logger) -> Option<BackendResult<StreamChunk>> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }

    match serde_json::from_str::<WireChatChunk>(text) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                return Some(Err(BackendError::stream(error)));
            }
            Some(Ok(StreamChunk {
                text: chunk.content().to_string(),
                done: chunk.done,
            }))
        }
        Err(e) => {
            log_warn!(logger, "[ndjson] Skipping malformed stream line: {} ({})", text, e);
            None
        }
    }
}

/// Recover the backend error tunnelled through the reader's `io::Error`
fn transport_error(err: io::Error) -> BackendError {
    if !err.get_ref().is_some_and(|inner| inner.is::<BackendError>()) {
        return BackendError::Io(err);
    }
    match err.into_inner().map(|inner| inner.downcast::<BackendError>()) {
        Some(Ok(backend)) => *backend,
        Some(Err(other)) => BackendError::Io(io::Error::other(other)),
        None => BackendError::stream("transport failed"),
    }
}

fn line_error(err: LinesCodecError) -> BackendError {
    match err {
        LinesCodecError::Io(e) => transport_error(e),
        other => BackendError::stream(other.to_string()),
    }
}

/// Turn a raw byte stream into a lazy stream of chat chunks
///
/// Lines may be split across (or packed into) arbitrary byte frames; a
/// final unterminated line is still decoded. A transport error ends the
/// stream after being yielded.
pub fn decode_chat_stream<S, B, E>(bytes: S, logger: Arc<dyn Logger>) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<BackendError> + Send + 'static,
{
    let frames = bytes.map(|frame| {
        frame
            .map(io::Cursor::new)
            .map_err(|e| io::Error::other(Into::<BackendError>::into(e)))
    });
    let lines = FramedRead::new(StreamReader::new(frames), LinesCodec::new());

    Box::pin(
        lines
            .scan(false, |failed, line| {
                let item = if *failed {
                    None
                } else {
                    *failed = line.is_err();
                    Some(line)
                };
                future::ready(item)
            })
            .filter_map(move |line| {
                future::ready(match line {
                    Ok(text) => parse_line(&text, logger.as_ref()),
                    Err(e) => Some(Err(line_error(e))),
                })
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::collect_reply;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use futures::stream;

    fn frames(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, io::Error>> + Send + 'static {
        let owned: Vec<Result<Vec<u8>, io::Error>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    fn line(content: &str, done: bool) -> String {
        format!(
            "{{\"model\":\"llama3.2\",\"message\":{{\"role\":\"assistant\",\"content\":\"{}\"}},\"done\":{}}}\n",
            content, done
        )
    }

    #[tokio::test]
    async fn test_lines_split_across_frames() {
        let body = format!("{}{}{}", line("Hel", false), line("lo", false), line("", true));
        let (a, b) = body.split_at(17);
        let (b, c) = b.split_at(40);

        let decoded = decode_chat_stream(frames(&[a, b, c]), Arc::new(NoOpLogger));
        assert_eq!(collect_reply(decoded).await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_many_lines_in_one_frame() {
        let body = format!("{}{}", line("a", false), line("b", true));
        let chunks: Vec<_> = decode_chat_stream(frames(&[&body]), Arc::new(NoOpLogger))
            .collect()
            .await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].as_ref().unwrap(), &StreamChunk::last("b"));
    }

    #[tokio::test]
    async fn test_malformed_line_is_logged_and_skipped() {
        let logger = Arc::new(MemoryLogger::new());
        let body = format!("{}{{not json\n{}", line("one ", false), line("two", true));

        let decoded = decode_chat_stream(frames(&[&body]), logger.clone());
        assert_eq!(collect_reply(decoded).await.unwrap(), "one two");
        assert!(logger.contains(LogLevel::Warn, "malformed"));
    }

    #[tokio::test]
    async fn test_error_line_becomes_error() {
        let body = format!("{}{{\"error\":\"model runner crashed\"}}\n", line("partial", false));
        let decoded = decode_chat_stream(frames(&[&body]), Arc::new(NoOpLogger));
        let err = collect_reply(decoded).await.unwrap_err();
        assert!(err.to_string().contains("model runner crashed"));
    }

    #[tokio::test]
    async fn test_unterminated_last_line_is_flushed() {
        let body = line("tail", true);
        let trimmed = body.trim_end();
        let decoded = decode_chat_stream(frames(&[trimmed]), Arc::new(NoOpLogger));
        assert_eq!(collect_reply(decoded).await.unwrap(), "tail");
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let parts: Vec<Result<Vec<u8>, io::Error>> = vec![
            Ok(line("ok", false).into_bytes()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(line("never", true).into_bytes()),
        ];
        let chunks: Vec<_> = decode_chat_stream(stream::iter(parts), Arc::new(NoOpLogger))
            .collect()
            .await;
        assert_eq!(chunks.len(), 2);
        assert!(matches!(chunks[1], Err(BackendError::Io(_))));
    }

    #[tokio::test]
    async fn test_crlf_lines() {
        let body = format!("{}\r\n{}", line("a", false).trim_end(), line("b", true));
        let decoded = decode_chat_stream(frames(&[&body]), Arc::new(NoOpLogger));
        assert_eq!(collect_reply(decoded).await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn test_backend_transport_error_keeps_its_variant() {
        let parts: Vec<Result<Vec<u8>, BackendError>> = vec![
            Ok(line("ok", false).into_bytes()),
            Err(BackendError::api(502, "bad gateway")),
        ];
        let chunks: Vec<_> = decode_chat_stream(stream::iter(parts), Arc::new(NoOpLogger))
            .collect()
            .await;
        assert_eq!(chunks.len(), 2);
        assert!(matches!(chunks[1], Err(BackendError::Api { status: 502, .. })));
    }
}
