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

//! Decision audit logger.
//!
//! Every policy decision produces one structured record, emitted through
//! `tracing` (stderr) and appended as a JSON line to a daily log file.
//! A file write error degrades to stderr-only logging; it never takes the
//! proxy down. Denied requests never log raw argument values.

use crate::config::{LogArgs, LogLevel, RedactedArgsMode, Settings};
use crate::engine::secrets::RedactionMatch;
use crate::utils::{paths, time};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// One audit record. Field names are part of the log-file format.
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub ts: String,
    pub session: String,
    pub direction: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    pub action: &'static str,
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redacted_patterns: Option<Vec<String>>,
}

pub struct DecisionLogger {
    session_id: String,
    level: LogLevel,
    log_args: LogArgs,
    log_redacted: RedactedArgsMode,
    log_dir: Option<PathBuf>,
    current: Option<(String, File)>,
}

impl DecisionLogger {
    pub fn new(settings: &Settings) -> Self {
        let dir = PathBuf::from(paths::expand_path(&settings.log_dir));
        let log_dir = match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                warn!("cannot create log dir '{}': {}; logging to stderr only", dir.display(), e);
                None
            }
        };

        Self {
            session_id: Uuid::new_v4().to_string(),
            level: settings.log_level,
            log_args: settings.log_args,
            log_redacted: settings.log_redacted,
            log_dir,
            current: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Build the `args` field for a record. Raw values of denied requests
    /// never reach the log; at most a digest does.
    pub fn prepare_args(&self, args: Option<&Value>, denied: bool) -> Option<Value> {
        let args = args?;
        if self.log_args == LogArgs::None {
            return None;
        }
        if !denied {
            return Some(args.clone());
        }
        match self.log_redacted {
            RedactedArgsMode::None => None,
            RedactedArgsMode::Hash => {
                let serialized = serde_json::to_string(args).unwrap_or_default();
                let digest = Sha256::digest(serialized.as_bytes());
                Some(serde_json::json!({ "sha256": hex::encode(digest) }))
            }
            RedactedArgsMode::Full => Some(args.clone()),
        }
    }

    pub fn entry(&self, direction: Direction, action: &'static str) -> LogEntry {
        LogEntry {
            ts: time::now_rfc3339(),
            session: self.session_id.clone(),
            direction: direction.as_str(),
            method: None,
            tool: None,
            server: None,
            action,
            rule: None,
            message: None,
            args: None,
            redacted_patterns: None,
        }
    }

    pub fn log(&mut self, entry: LogEntry) {
        let entry_level = level_for(entry.action, entry.direction);
        if (entry_level as u8) < (self.level as u8) {
            return;
        }

        match entry_level {
            LogLevel::Warn | LogLevel::Error => warn!(
                target: "audit",
                action = entry.action,
                direction = entry.direction,
                method = entry.method.as_deref().unwrap_or(""),
                tool = entry.tool.as_deref().unwrap_or(""),
                rule = entry.rule.as_deref().unwrap_or(""),
                detail = entry.message.as_deref().unwrap_or(""),
                "decision"
            ),
            LogLevel::Info => info!(
                target: "audit",
                action = entry.action,
                direction = entry.direction,
                method = entry.method.as_deref().unwrap_or(""),
                tool = entry.tool.as_deref().unwrap_or(""),
                rule = entry.rule.as_deref().unwrap_or(""),
                "decision"
            ),
            LogLevel::Debug => debug!(
                target: "audit",
                action = entry.action,
                direction = entry.direction,
                rule = entry.rule.as_deref().unwrap_or(""),
                "decision"
            ),
        }

        self.append_to_file(&entry);
    }

    fn append_to_file(&mut self, entry: &LogEntry) {
        let Some(ref dir) = self.log_dir else {
            return;
        };

        let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let needs_reopen = !matches!(self.current, Some((ref d, _)) if *d == date);
        if needs_reopen {
            let path = dir.join(format!("{}.jsonl", date));
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => self.current = Some((date, file)),
                Err(e) => {
                    warn!("log write error on '{}': {}; degrading to stderr only", path.display(), e);
                    self.log_dir = None;
                    self.current = None;
                    return;
                }
            }
        }

        if let Some((_, ref mut file)) = self.current {
            let line = match serde_json::to_string(entry) {
                Ok(l) => l,
                Err(_) => return,
            };
            if writeln!(file, "{}", line).is_err() {
                warn!("log write failed; degrading to stderr only");
                self.log_dir = None;
                self.current = None;
            }
        }
    }
}

/// `pattern:count` labels for the audit record.
pub fn redaction_pattern_names(matches: &[RedactionMatch]) -> Vec<String> {
    matches
        .iter()
        .map(|m| format!("{}:{}", m.pattern, m.count))
        .collect()
}

fn level_for(action: &str, direction: &str) -> LogLevel {
    match action {
        "deny" | "redact" => LogLevel::Warn,
        "allow" if direction == "outbound" => LogLevel::Debug,
        _ => LogLevel::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn logger_with(log_args: LogArgs, log_redacted: RedactedArgsMode) -> DecisionLogger {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            log_dir: dir.path().to_string_lossy().into_owned(),
            log_args,
            log_redacted,
            ..Default::default()
        };
        DecisionLogger::new(&settings)
    }

    #[test]
    fn denied_args_are_omitted_by_default() {
        let logger = logger_with(LogArgs::Full, RedactedArgsMode::None);
        let args = json!({"path": "/home/u/.ssh/id_rsa"});
        assert_eq!(logger.prepare_args(Some(&args), true), None);
        assert_eq!(logger.prepare_args(Some(&args), false), Some(args));
    }

    #[test]
    fn denied_args_can_be_hashed() {
        let logger = logger_with(LogArgs::Full, RedactedArgsMode::Hash);
        let args = json!({"path": "secret"});
        let prepared = logger.prepare_args(Some(&args), true).unwrap();
        let digest = prepared["sha256"].as_str().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(!prepared.to_string().contains("secret"));
    }

    #[test]
    fn log_args_none_suppresses_everything() {
        let logger = logger_with(LogArgs::None, RedactedArgsMode::Full);
        let args = json!({"path": "/tmp/x"});
        assert_eq!(logger.prepare_args(Some(&args), false), None);
        assert_eq!(logger.prepare_args(Some(&args), true), None);
    }

    #[test]
    fn entries_land_in_the_daily_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            log_dir: dir.path().to_string_lossy().into_owned(),
            log_level: LogLevel::Debug,
            ..Default::default()
        };
        let mut logger = DecisionLogger::new(&settings);

        let mut entry = logger.entry(Direction::Inbound, "deny");
        entry.method = Some("tools/call".to_string());
        entry.rule = Some("block-ssh-keys".to_string());
        logger.log(entry);

        let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let content =
            std::fs::read_to_string(dir.path().join(format!("{}.jsonl", date))).unwrap();
        let record: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(record["action"], "deny");
        assert_eq!(record["rule"], "block-ssh-keys");
        assert_eq!(record["direction"], "inbound");
    }
}
