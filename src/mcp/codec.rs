// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Newline-delimited transport framing.
//!
//! Splits the raw byte stream into lines with a hard per-line size ceiling:
//! a line that exceeds the ceiling before a newline arrives is discarded
//! with a diagnostic instead of being buffered indefinitely. On stream end
//! any non-empty remainder is flushed as a final line.

use crate::engine_core::constants::limits;
use anyhow::Result;
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::warn;

pub struct LineCodec {
    /// Set while skipping the tail of an oversized line.
    discarding: bool,
    discarded: usize,
}

impl LineCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            discarding: false,
            discarded: 0,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = anyhow::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            if self.discarding {
                match src.iter().position(|&b| b == b'\n') {
                    Some(i) => {
                        self.discarded += i + 1;
                        src.advance(i + 1);
                        warn!(
                            bytes = self.discarded,
                            "dropped oversized line exceeding {} byte limit",
                            limits::MAX_LINE_BYTES
                        );
                        self.discarding = false;
                        self.discarded = 0;
                        continue;
                    }
                    None => {
                        self.discarded += src.len();
                        src.clear();
                        return Ok(None);
                    }
                }
            }

            match src.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    let mut line = src.split_to(i + 1);
                    line.truncate(i);
                    if line.last() == Some(&b'\r') {
                        line.truncate(line.len() - 1);
                    }
                    // Lossy conversion keeps fail-open forwarding possible
                    // even for lines that are not valid UTF-8.
                    return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
                }
                None if src.len() > limits::MAX_LINE_BYTES => {
                    self.discarding = true;
                    self.discarded = src.len();
                    src.clear();
                }
                None => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if self.discarding {
            warn!(
                bytes = self.discarded + src.len(),
                "dropped oversized trailing line at stream end"
            );
            src.clear();
            self.discarding = false;
            return Ok(None);
        }

        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                // Final partial line without a trailing newline.
                let rest = src.split();
                Ok(Some(String::from_utf8_lossy(&rest).into_owned()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(Some(line)) = codec.decode(buf) {
            out.push(line);
        }
        out
    }

    #[test]
    fn splits_lines_and_strips_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("one\r\ntwo\nthree");
        assert_eq!(decode_all(&mut codec, &mut buf), vec!["one", "two"]);
        // Remainder stays buffered until more data or EOF.
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("three".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn partial_lines_accumulate_across_chunks() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(r#"{"jsonrpc":"#);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"\"2.0\"}\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(r#"{"jsonrpc":"2.0"}"#.to_string())
        );
    }

    #[test]
    fn oversized_line_is_dropped_and_stream_recovers() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&vec![b'x'; limits::MAX_LINE_BYTES + 2]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        // The tail of the oversized line plus a healthy follow-up.
        buf.extend_from_slice(b"tail\nhealthy\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("healthy".to_string()));
    }

    #[test]
    fn invalid_utf8_is_lossy_not_fatal() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"\xff\xfe garbage\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.contains("garbage"));
    }
}
