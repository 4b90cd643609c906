//! Accumulates streamed text fragments into a complete reply while passing them through.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

use crate::Error;

/// A stream wrapper that concatenates fragments into the final reply.
///
/// This allows rendering each fragment as it arrives while simultaneously building the
/// full text.  When the inner stream is fully drained, the concatenation of every
/// fragment (in delivery order) is sent via the oneshot channel returned by `new()`.
/// If the inner stream yields an error, that error is sent instead.
///
/// # Example
///
/// ```
/// use futures::{StreamExt, stream};
/// use gamechat::AccumulatingStream;
///
/// # tokio_test::block_on(async {
/// let fragments = stream::iter(vec![Ok("Try ".to_string()), Ok("Celeste!".to_string())]);
/// let (mut acc, text) = AccumulatingStream::new(fragments);
/// while let Some(fragment) = acc.next().await {
///     print!("{}", fragment.unwrap());
/// }
/// assert_eq!(text.await.unwrap().unwrap(), "Try Celeste!");
/// # });
/// ```
pub struct AccumulatingStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>,
    text_tx: Option<tokio::sync::oneshot::Sender<Result<String, Error>>>,
    text: String,
}

impl AccumulatingStream {
    /// Wraps a fragment stream.
    ///
    /// Returns the stream and a receiver that will contain the accumulated text once the
    /// stream is fully drained.
    pub fn new<S>(stream: S) -> (Self, tokio::sync::oneshot::Receiver<Result<String, Error>>)
    where
        S: Stream<Item = Result<String, Error>> + Send + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let this = Self {
            inner: Box::pin(stream),
            text_tx: Some(tx),
            text: String::new(),
        };
        (this, rx)
    }

    /// The text accumulated so far.
    pub fn partial(&self) -> &str {
        &self.text
    }
}

impl Stream for AccumulatingStream {
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                self.text.push_str(&fragment);
                Poll::Ready(Some(Ok(fragment)))
            }
            Poll::Ready(Some(Err(e))) => {
                if let Some(tx) = self.text_tx.take() {
                    let _ = tx.send(Err(e.clone()));
                }
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if let Some(tx) = self.text_tx.take() {
                    let text = std::mem::take(&mut self.text);
                    let _ = tx.send(Ok(text));
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{StreamExt, stream};

    async fn drain(fragments: Vec<Result<String, Error>>) -> (Vec<String>, Result<String, Error>) {
        let (mut acc, rx) = AccumulatingStream::new(stream::iter(fragments));
        let mut seen = Vec::new();
        while let Some(item) = acc.next().await {
            match item {
                Ok(fragment) => seen.push(fragment),
                Err(_) => break,
            }
        }
        drop(acc);
        let text = rx.await.unwrap_or_else(|_| Err(Error::streaming("dropped", None)));
        (seen, text)
    }

    #[tokio::test]
    async fn concatenation_of_fragments_equals_accumulated_text() {
        let cases: Vec<Vec<&str>> = vec![
            vec![],
            vec!["Try ", "Hollow Knight!"],
            vec!["", "a", "", "b"],
            vec!["🎮", " GG ", "\n", "wp"],
        ];
        for case in cases {
            let fragments = case.iter().map(|s| Ok(s.to_string())).collect();
            let (seen, text) = drain(fragments).await;
            assert_eq!(seen.concat(), text.unwrap());
        }
    }

    #[tokio::test]
    async fn error_is_delivered_to_receiver() {
        let fragments = vec![
            Ok("partial".to_string()),
            Err(Error::streaming("connection reset", None)),
            Ok("never".to_string()),
        ];
        let (seen, text) = drain(fragments).await;
        assert_eq!(seen, vec!["partial".to_string()]);
        let err = text.unwrap_err();
        assert_eq!(err.message(), "connection reset");
    }

    #[tokio::test]
    async fn partial_tracks_progress() {
        let (mut acc, _rx) = AccumulatingStream::new(stream::iter(vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
        ]));
        acc.next().await;
        assert_eq!(acc.partial(), "a");
        acc.next().await;
        assert_eq!(acc.partial(), "ab");
    }
}
