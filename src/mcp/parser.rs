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

//! Protocol message classification.
//!
//! Turns one complete line into a single message, a batch, or a
//! pass-through marker. Anything that is not valid JSON-RPC 2.0 is
//! `NotProtocol`: the caller must forward the original raw line unchanged so
//! a firewall bug never breaks non-protocol traffic.

use crate::engine_core::constants::jsonrpc;
use crate::engine_core::models::JsonRpcMessage;
use serde_json::Value;

#[derive(Debug)]
pub enum ParsedLine {
    /// Blank line; produce nothing.
    Empty,
    Message(Box<JsonRpcMessage>),
    Batch(Vec<JsonRpcMessage>),
    /// Not valid JSON or missing the protocol version marker.
    NotProtocol,
}

pub fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParsedLine::Empty;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return ParsedLine::NotProtocol;
    };

    match value {
        Value::Object(_) => match parse_message(value) {
            Some(msg) => ParsedLine::Message(Box::new(msg)),
            None => ParsedLine::NotProtocol,
        },
        Value::Array(items) => {
            if items.is_empty() {
                return ParsedLine::NotProtocol;
            }
            let mut messages = Vec::with_capacity(items.len());
            for item in items {
                match parse_message(item) {
                    Some(msg) => messages.push(msg),
                    // One bad element poisons the batch; pass the whole
                    // line through untouched.
                    None => return ParsedLine::NotProtocol,
                }
            }
            ParsedLine::Batch(messages)
        }
        _ => ParsedLine::NotProtocol,
    }
}

fn parse_message(value: Value) -> Option<JsonRpcMessage> {
    let msg: JsonRpcMessage = serde_json::from_value(value).ok()?;
    (msg.jsonrpc == jsonrpc::VERSION).then_some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_request() {
        let line = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"read_file"}}"#;
        match parse_line(line) {
            ParsedLine::Message(msg) => {
                assert_eq!(msg.method.as_deref(), Some("tools/call"));
                assert_eq!(msg.id, Some(serde_json::json!(1)));
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn parses_a_batch() {
        let line = r#"[{"jsonrpc":"2.0","id":1,"method":"a"},{"jsonrpc":"2.0","method":"b"}]"#;
        match parse_line(line) {
            ParsedLine::Batch(msgs) => {
                assert_eq!(msgs.len(), 2);
                assert!(msgs[1].id.is_none());
            }
            other => panic!("expected batch, got {:?}", other),
        }
    }

    #[test]
    fn blank_lines_produce_nothing() {
        assert!(matches!(parse_line(""), ParsedLine::Empty));
        assert!(matches!(parse_line("   \t"), ParsedLine::Empty));
    }

    #[test]
    fn non_protocol_lines_pass_through() {
        assert!(matches!(parse_line("not json at all"), ParsedLine::NotProtocol));
        assert!(matches!(parse_line("42"), ParsedLine::NotProtocol));
        assert!(matches!(parse_line(r#""a string""#), ParsedLine::NotProtocol));
        // Valid JSON object, wrong protocol version marker.
        assert!(matches!(
            parse_line(r#"{"jsonrpc":"1.0","method":"x"}"#),
            ParsedLine::NotProtocol
        ));
        assert!(matches!(
            parse_line(r#"{"method":"x"}"#),
            ParsedLine::NotProtocol
        ));
    }

    #[test]
    fn batch_with_bad_element_passes_through_whole() {
        let line = r#"[{"jsonrpc":"2.0","id":1,"method":"a"},{"nope":true}]"#;
        assert!(matches!(parse_line(line), ParsedLine::NotProtocol));
        assert!(matches!(parse_line("[]"), ParsedLine::NotProtocol));
    }
}
