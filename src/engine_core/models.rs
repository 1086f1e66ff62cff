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

//! Domain models for the mcp-warden firewall.
//!
//! Pure data structures representing wire messages, rules, and decisions.
//! This module is free of I/O side effects.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserialize a field so that an explicit JSON `null` survives as
/// `Some(Value::Null)`. A plain `Option<Value>` would collapse `"id": null`
/// (a legal response id) into the same shape as a missing `id`.
fn some_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// One JSON-RPC 2.0 wire message. Requests and notifications carry `method`;
/// responses carry `result` or `error`. Notifications have no `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    pub jsonrpc: String,
    #[serde(default, deserialize_with = "some_value")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, deserialize_with = "some_value")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcMessage {
    /// A message with `result` or `error` is a response by protocol
    /// definition.
    pub fn is_response(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }

    /// Tool name for `tools/call` requests, when present and well-formed.
    pub fn tool_name(&self) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
    }

    /// The `arguments` object of a `tools/call` request.
    pub fn tool_arguments(&self) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get("arguments"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Action taken on an inbound (client -> server) message.
///
/// `Ask` has no interactive channel at proxy time and behaves as
/// allow-with-warning. This is a known product limitation, preserved
/// deliberately rather than silently upgraded to deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Allow,
    Deny,
    Ask,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Deny => "deny",
            RuleAction::Ask => "ask",
        }
    }
}

/// Action taken on an outbound (server -> client) response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundAction {
    Allow,
    Deny,
    Redact,
    LogOnly,
}

impl OutboundAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundAction::Allow => "allow",
            OutboundAction::Deny => "deny",
            OutboundAction::Redact => "redact",
            OutboundAction::LogOnly => "log_only",
        }
    }
}

/// Matcher applied to a single argument value. All present fields must be
/// satisfied (AND), which makes the set of active conditions exhaustively
/// checkable instead of the first-truthy-field semantics of older configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgumentMatcher {
    /// Glob pattern tested against the value (non-strings are serialized).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Regular expression tested against the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Path boundary check: matches when the value resolves OUTSIDE this
    /// directory. Supports `${HOME}`, `${PROJECT_DIR}` and a leading `~/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_under: Option<String>,
    /// Matches when the value contains a detectable secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<bool>,
}

/// Match predicate of a request-side rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleMatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Tool-name glob; implies `method: tools/call` when no method is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Argument-key -> matcher. The key `_any_value` applies the matcher to
    /// every value anywhere in the (nested) argument tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<std::collections::BTreeMap<String, ArgumentMatcher>>,
}

/// One request-side rule. Rules are evaluated in declared order; the first
/// satisfied rule wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(rename = "match")]
    pub match_: RuleMatch,
    pub action: RuleAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Match predicate of a response-side rule. All present fields are ANDed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboundMatch {
    /// Tool glob, correlated from the original request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<bool>,
    /// Case-insensitive substrings the response text must contain (any of).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_contains: Option<Vec<String>>,
    /// Case-insensitive regexes the response text must match (any of).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_contains_regex: Option<Vec<String>>,
    /// Serialized result/error byte size strictly exceeding this threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_size_exceeds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundRule {
    pub name: String,
    #[serde(rename = "match")]
    pub match_: OutboundMatch,
    pub action: OutboundAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A secret-detection pattern. The optional entropy threshold is applied to
/// the exact matched substring to filter repetitive false positives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretPattern {
    pub name: String,
    pub regex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy_threshold: Option<f64>,
}

/// Result of request-side rule evaluation. `rule: None` means the configured
/// default action applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: RuleAction,
    pub rule: Option<String>,
    pub message: Option<String>,
}

/// Result of response-side rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundDecision {
    pub action: OutboundAction,
    pub rule: Option<String>,
    pub message: Option<String>,
}
