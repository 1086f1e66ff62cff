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

//! mcp-warden constants - single source of truth for all configuration values.
//!
//! Centralizes magic numbers, error codes, and protocol strings to ensure
//! consistency and maintainability.

/// JSON-RPC 2.0 error codes
pub mod jsonrpc {
    /// Protocol version marker required on every message
    pub const VERSION: &str = "2.0";
    /// Invalid request (standard JSON-RPC); used for policy denials
    pub const ERROR_INVALID_REQUEST: i32 = -32600;
}

/// MCP protocol methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Transport limits (DoS protection)
pub mod limits {
    /// Maximum allowed line size before a newline (10 MiB). Longer lines are
    /// discarded rather than buffered indefinitely.
    pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;
    /// Maximum recursion depth for scanning/matching over untrusted nested
    /// structures. Past this bound the subtree is treated as a conservative
    /// match instead of being recursed into.
    pub const MAX_SCAN_DEPTH: usize = 64;
}

/// Policy evaluation constants
pub mod policy {
    /// Special argument key applying a matcher to every value in the tree
    pub const ANY_VALUE_KEY: &str = "_any_value";
    /// Pseudo-pattern name reported when the scan depth bound is hit
    pub const DEPTH_LIMIT_PATTERN: &str = "depth-limit";
}

/// Proxy lifecycle constants
pub mod proxy {
    use std::time::Duration;

    /// Prefix on all synthetic error messages and stderr diagnostics
    pub const LOG_PREFIX: &str = "[mcp-warden]";
    /// Default redaction marker substituted over each detected secret span
    pub const REDACTION_MARKER: &str = "[REDACTED BY MCP-WARDEN]";
    /// Marker carried by synthetic blocked-content responses
    pub const BLOCKED_MARKER: &str = "[BLOCKED BY MCP-WARDEN]";
    /// Fallback denial message when a rule has none
    pub const DEFAULT_DENY_MESSAGE: &str = "Blocked by policy";
    /// Time-to-live of a request/response correlation entry
    pub const REQUEST_CONTEXT_TTL: Duration = Duration::from_secs(300);
    /// Grace period between a forwarded termination signal and SIGKILL
    pub const KILL_GRACE_PERIOD: Duration = Duration::from_secs(5);
}
