//! Server-Sent Events (SSE) framing for streaming responses.
//!
//! Both supported APIs stream `data:` events.  This module turns a raw byte stream into
//! one [`SseEvent`] per blank-line-delimited block and leaves payload decoding to the
//! backend that knows the JSON shape.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::STREAM_BYTES;
use crate::{Error, Result};

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if the server sent one.
    pub event: Option<String>,
    /// All `data:` lines of the event joined with `\n`.
    pub data: String,
}

/// Process a stream of bytes into a stream of server-sent events.
///
/// Carriage returns are dropped so `\r\n` framing behaves like `\n`.  Comment lines and
/// blocks without a `data:` field are skipped.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<SseEvent>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    let stream = byte_stream.map(|result| {
        result.map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    // Undecoded; a chunk may end inside a multi-byte character.
    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer),
        move |(mut stream, mut buffer)| async move {
            loop {
                while let Some(block) = take_block(&mut buffer) {
                    match parse_block(&block) {
                        Ok(Some(event)) => return Some((Ok(event), (stream, buffer))),
                        Ok(None) => continue,
                        Err(e) => return Some((Err(e), (stream, buffer))),
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer)));
                    }
                    None => {
                        // Flush a trailing event the server did not terminate.
                        if buffer.iter().all(u8::is_ascii_whitespace) {
                            return None;
                        }
                        let block = std::mem::take(&mut buffer);
                        return match parse_block(&block) {
                            Ok(Some(event)) => Some((Ok(event), (stream, buffer))),
                            Ok(None) => None,
                            Err(e) => Some((Err(e), (stream, buffer))),
                        };
                    }
                }
            }
        },
    )
}

/// Removes and returns the bytes of the first complete event, without its delimiter.
fn take_block(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buffer.windows(2).position(|w| w == b"\n\n")?;
    let block = buffer[..pos].to_vec();
    buffer.drain(..pos + 2);
    Some(block)
}

fn parse_block(block: &[u8]) -> Result<Option<SseEvent>> {
    let text = std::str::from_utf8(block)?;
    let mut event = None;
    let mut data: Option<String> = None;

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
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

    Ok(data.map(|data| SseEvent { event, data }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn events_from(chunks: Vec<&'static [u8]>) -> impl Stream<Item = Result<SseEvent>> {
        let chunks: Vec<std::result::Result<Bytes, reqwest::Error>> = chunks
            .into_iter()
            .map(|chunk| Ok(Bytes::from_static(chunk)))
            .collect();
        process_sse(stream::iter(chunks))
    }

    #[tokio::test]
    async fn parse_single_data_event() {
        let mut events = Box::pin(events_from(vec![b"data: {\"a\":1}\n\n"]));
        let event = events.next().await.unwrap().unwrap();
        assert_eq!(event.data, "{\"a\":1}");
        assert_eq!(event.event, None);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn parse_multiple_events() {
        let mut events = Box::pin(events_from(vec![b"data: one\n\ndata:two\n\n"]));
        assert_eq!(events.next().await.unwrap().unwrap().data, "one");
        assert_eq!(events.next().await.unwrap().unwrap().data, "two");
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_split_event() {
        let mut events = Box::pin(events_from(vec![b"event: chunk\nda", b"ta: hi\n", b"\n"]));
        let event = events.next().await.unwrap().unwrap();
        assert_eq!(event.event.as_deref(), Some("chunk"));
        assert_eq!(event.data, "hi");
    }

    #[tokio::test]
    async fn handle_crlf_framing() {
        let mut events = Box::pin(events_from(vec![b"data: a\r\n\r\ndata: b\r\n\r\n"]));
        assert_eq!(events.next().await.unwrap().unwrap().data, "a");
        assert_eq!(events.next().await.unwrap().unwrap().data, "b");
    }

    #[tokio::test]
    async fn handle_utf8_split_across_chunks() {
        // "🎮" is F0 9F 8E AE
        let mut events = Box::pin(events_from(vec![b"data: \xF0\x9F", b"\x8E\xAE\n\n"]));
        assert_eq!(events.next().await.unwrap().unwrap().data, "🎮");
    }

    #[tokio::test]
    async fn skip_comments_and_empty_blocks() {
        let mut events = Box::pin(events_from(vec![b": keepalive\n\nid: 7\n\ndata: x\n\n"]));
        assert_eq!(events.next().await.unwrap().unwrap().data, "x");
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn multiline_data_is_joined() {
        let mut events = Box::pin(events_from(vec![b"data: a\ndata: b\n\n"]));
        assert_eq!(events.next().await.unwrap().unwrap().data, "a\nb");
    }

    #[tokio::test]
    async fn flush_unterminated_trailing_event() {
        let mut events = Box::pin(events_from(vec![b"data: last"]));
        assert_eq!(events.next().await.unwrap().unwrap().data, "last");
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_error() {
        let mut events = Box::pin(events_from(vec![b"data: \xFF\xFE\n\n"]));
        assert!(events.next().await.unwrap().is_err());
    }
}
