//! Decoder for the backend's line-oriented event stream.
//!
//! Every event is one line of JSON, optionally prefixed with `data:`. Blank
//! lines are ignored and `data: [DONE]` marks the end of the stream. JSON
//! payloads never span lines.

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::{stream, StreamExt};
use serde::de::DeserializeOwned;
use std::pin::Pin;

use crate::ClientError;

pub const DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

/// What to do with the `[DONE]` sentinel line. It never produces a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentinelPolicy {
    /// End the stream at the sentinel and drop the body.
    #[default]
    Terminate,
    /// Skip the sentinel and keep reading until the server closes the body.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Done,
    Payload(&'a str),
}

pub fn classify(line: &str) -> Line<'_> {
    let line = line.trim();
    let payload = line
        .strip_prefix(DATA_PREFIX)
        .map(str::trim_start)
        .unwrap_or(line);

    if payload.is_empty() {
        Line::Blank
    } else if payload == DONE_SENTINEL {
        Line::Done
    } else {
        Line::Payload(payload)
    }
}

/// Accumulates body chunks and hands out complete lines. Bytes are only
/// decoded once a whole line is present, so a UTF-8 sequence split across two
/// chunks survives.
#[derive(Debug, Default)]
struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let line = self.buf.split_to(pos + 1);
        Some(decode_line(&line[..pos]))
    }

    /// Trailing text without a final newline.
    fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = self.buf.split();
        Some(decode_line(&rest))
    }

    fn clear(&mut self) {
        self.buf.clear();
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

struct Decoder<S> {
    body: Pin<Box<S>>,
    lines: LineBuffer,
    policy: SentinelPolicy,
    exhausted: bool,
}

impl<S, E> Decoder<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<ClientError>,
{
    async fn next_fragment<T: DeserializeOwned>(&mut self) -> Option<Result<T, ClientError>> {
        loop {
            let line = match self.lines.next_line() {
                Some(line) => line,
                None if self.exhausted => return None,
                None => match self.body.next().await {
                    Some(Ok(chunk)) => {
                        self.lines.push(&chunk);
                        continue;
                    }
                    Some(Err(e)) => {
                        self.exhausted = true;
                        self.lines.clear();
                        return Some(Err(e.into()));
                    }
                    None => {
                        self.exhausted = true;
                        match self.lines.finish() {
                            Some(line) => line,
                            None => return None,
                        }
                    }
                },
            };

            match classify(&line) {
                Line::Blank => continue,
                Line::Done => match self.policy {
                    SentinelPolicy::Terminate => {
                        self.exhausted = true;
                        self.lines.clear();
                        return None;
                    }
                    SentinelPolicy::Ignore => continue,
                },
                Line::Payload(payload) => match serde_json::from_str::<T>(payload) {
                    Ok(value) => return Some(Ok(value)),
                    Err(e) => {
                        tracing::warn!(line = %payload, error = %e, "skipping undecodable stream line");
                        continue;
                    }
                },
            }
        }
    }
}

/// Turn a response body into a stream of decoded fragments, in line order.
///
/// A line that fails to decode is logged and skipped. A read error on the
/// body is yielded once as the last item; fragments yielded before it stay
/// valid.
pub fn decode<T, S, E>(body: S, policy: SentinelPolicy) -> impl Stream<Item = Result<T, ClientError>>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<ClientError>,
{
    let decoder = Decoder {
        body: Box::pin(body),
        lines: LineBuffer::default(),
        policy,
        exhausted: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        let item = decoder.next_fragment::<T>().await?;
        Some((item, decoder))
    })
}
