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

//! Configuration document for mcp-warden.
//!
//! A versioned YAML document holding global settings, ordered request rules,
//! ordered outbound rules, and secret patterns. Immutable once loaded and
//! validated; the proxy owns it for the lifetime of one session.

use crate::engine_core::constants::proxy;
use crate::engine_core::errors::WardenError;
use crate::engine_core::models::{OutboundAction, OutboundRule, Rule, RuleAction, SecretPattern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn parse_safe(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// How much of a request's arguments lands in the audit log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogArgs {
    #[default]
    Full,
    None,
}

/// How denied-request arguments are represented in the audit log. Raw values
/// of denied requests are never logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactedArgsMode {
    #[default]
    None,
    Hash,
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_dir: String,
    pub log_level: LogLevel,
    pub default_action: RuleAction,
    pub log_args: LogArgs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_default_action: Option<OutboundAction>,
    pub log_redacted: RedactedArgsMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redaction_marker: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: "~/.mcp-warden/logs".to_string(),
            log_level: LogLevel::Info,
            default_action: RuleAction::Allow,
            log_args: LogArgs::Full,
            outbound_default_action: None,
            log_redacted: RedactedArgsMode::None,
            redaction_marker: None,
        }
    }
}

impl Settings {
    pub fn redaction_marker(&self) -> &str {
        self.redaction_marker
            .as_deref()
            .unwrap_or(proxy::REDACTION_MARKER)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsSection {
    #[serde(default)]
    pub patterns: Vec<SecretPattern>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub outbound_rules: Vec<OutboundRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<SecretsSection>,
}

fn default_version() -> u32 {
    SUPPORTED_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            settings: Settings::default(),
            rules: Vec::new(),
            outbound_rules: Vec::new(),
            secrets: None,
        }
    }
}

impl Config {
    /// Load a configuration document. An explicit path must exist and parse;
    /// without one, `~/.mcp-warden/config.yml` is used when present, else the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, WardenError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let Some(default) = Self::default_path() else {
                    return Ok(Self::default());
                };
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            WardenError::ConfigurationError(format!(
                "failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_yaml_ng::from_str(&content).map_err(|e| {
            WardenError::ConfigurationError(format!(
                "failed to parse config '{}': {}",
                path.display(),
                e
            ))
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".mcp-warden").join("config.yml"))
    }

    /// Configured secret patterns, or the built-in set when the document
    /// carries no `secrets` section.
    pub fn secret_patterns(&self) -> Vec<SecretPattern> {
        match self.secrets {
            Some(ref section) => section.patterns.clone(),
            None => default_secret_patterns(),
        }
    }

    /// True when any response-side policy is configured at all. Without one
    /// the proxy runs in pass-through mode for responses.
    pub fn has_outbound_policy(&self) -> bool {
        !self.outbound_rules.is_empty() || self.settings.outbound_default_action.is_some()
    }
}

/// Built-in secret patterns covering common API keys and tokens.
pub fn default_secret_patterns() -> Vec<SecretPattern> {
    let pattern = |name: &str, regex: &str, entropy_threshold: Option<f64>| SecretPattern {
        name: name.to_string(),
        regex: regex.to_string(),
        entropy_threshold,
    };

    vec![
        pattern("aws-access-key", "AKIA[0-9A-Z]{16}", None),
        pattern("aws-secret-key", "[A-Za-z0-9/+=]{40}", Some(4.5)),
        pattern(
            "github-token",
            "(gh[ps]_[A-Za-z0-9_]{36,}|github_pat_[A-Za-z0-9_]{22,})",
            None,
        ),
        pattern("openai-key", "sk-[A-Za-z0-9]{20,}", None),
        pattern("anthropic-key", "sk-ant-[A-Za-z0-9-]{20,}", None),
        pattern("stripe-key", "(sk|pk|rk)_(test|live)_[A-Za-z0-9]{24,}", None),
        pattern(
            "private-key-header",
            "-----BEGIN (RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----",
            None,
        ),
        pattern(
            "jwt-token",
            "eyJ[A-Za-z0-9_-]{10,}\\.[A-Za-z0-9_-]{10,}\\.[A-Za-z0-9_-]{10,}",
            None,
        ),
        pattern("slack-token", "xox[bpoas]-[A-Za-z0-9-]+", None),
        pattern("database-url", "(postgres|mysql|mongodb|redis)://[^\\s]+", None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_document() {
        let yaml = r#"
version: 1
settings:
  log_dir: /tmp/warden-logs
  log_level: debug
  default_action: allow
  outbound_default_action: allow
rules:
  - name: block-ssh-keys
    match:
      method: tools/call
      tool: "*"
      arguments:
        _any_value:
          regex: "(\\.ssh/|id_rsa|id_ed25519)"
    action: deny
    message: "Blocked: access to SSH keys"
outbound_rules:
  - name: redact-secrets
    match:
      secrets: true
    action: redact
secrets:
  patterns:
    - name: aws-access-key
      regex: "AKIA[0-9A-Z]{16}"
    - name: generic
      regex: "[A-Za-z0-9/+=]{40}"
      entropy_threshold: 4.5
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.settings.log_level, LogLevel::Debug);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].name, "block-ssh-keys");
        assert_eq!(config.rules[0].action, RuleAction::Deny);
        assert_eq!(config.outbound_rules.len(), 1);
        assert_eq!(
            config.outbound_rules[0].action,
            OutboundAction::Redact
        );
        assert_eq!(config.secret_patterns().len(), 2);
        assert!(config.has_outbound_policy());
    }

    #[test]
    fn missing_sections_default() {
        let config: Config = serde_yaml_ng::from_str("version: 1").unwrap();
        assert_eq!(config.settings.default_action, RuleAction::Allow);
        assert!(config.rules.is_empty());
        assert!(!config.has_outbound_policy());
        // No secrets section: the built-in pattern set applies.
        assert_eq!(config.secret_patterns().len(), 10);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let yaml = r#"
rules:
  - name: broken
    match:
      method: tools/call
    action: explode
"#;
        assert!(serde_yaml_ng::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn default_marker_is_used_unless_overridden() {
        let config = Config::default();
        assert_eq!(config.settings.redaction_marker(), proxy::REDACTION_MARKER);

        let custom = Config {
            settings: Settings {
                redaction_marker: Some("***".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(custom.settings.redaction_marker(), "***");
    }
}
