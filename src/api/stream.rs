//! Turning a streamed response body into text chunks.
//!
//! Network chunk boundaries don't respect UTF-8: a multi-byte character can
//! arrive split across two chunks.  [`Utf8Decoder`] holds back an incomplete
//! trailing sequence until the rest arrives.

use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use super::error::ApiError;

/// Text chunks of a streamed response, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<String, ApiError>>;

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Feed raw bytes, get back everything that is now complete.  Invalid
    /// sequences become U+FFFD.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.push_str(s);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete tail, wait for more bytes.
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

/// Adapt a byte stream (e.g. `reqwest::Response::bytes_stream`) into a
/// stream of non-empty text chunks.  The stream ends after the first error.
pub fn decode_utf8<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, ApiError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<ApiError> + Send,
{
    let bytes = Box::pin(bytes);
    stream::unfold(
        (bytes, Utf8Decoder::default(), false),
        |(mut bytes, mut decoder, done)| async move {
            if done {
                return None;
            }
            loop {
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        let text = decoder.push(chunk.as_ref());
                        if !text.is_empty() {
                            return Some((Ok(text), (bytes, decoder, false)));
                        }
                    }
                    Some(Err(e)) => return Some((Err(e.into()), (bytes, decoder, true))),
                    None => {
                        let tail = decoder.finish();
                        if tail.is_empty() {
                            return None;
                        }
                        return Some((Ok(tail), (bytes, decoder, true)));
                    }
                }
            }
        },
    )
}
