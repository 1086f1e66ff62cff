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

// Comprehensive configuration validation - fail-fast at load time, before
// any engine is constructed or any message is processed.

use crate::config::{Config, SUPPORTED_VERSION};
use crate::engine_core::errors::WardenError;
use crate::engine_core::models::{ArgumentMatcher, OutboundRule, Rule, SecretPattern};
use globset::Glob;
use regex::Regex;
use std::collections::HashSet;

/// Validates the configuration document for structural correctness, regex
/// safety, and semantic consistency.
pub struct PolicyValidator;

impl PolicyValidator {
    /// Validate a loaded configuration. Call before constructing engines.
    pub fn validate(config: &Config) -> Result<(), WardenError> {
        if config.version != SUPPORTED_VERSION {
            return Err(WardenError::ConfigurationError(format!(
                "unsupported config version {} (expected {})",
                config.version, SUPPORTED_VERSION
            )));
        }

        let mut names = HashSet::new();
        for (idx, rule) in config.rules.iter().enumerate() {
            Self::validate_rule(rule, idx, &mut names)?;
        }

        let mut outbound_names = HashSet::new();
        for (idx, rule) in config.outbound_rules.iter().enumerate() {
            Self::validate_outbound_rule(rule, idx, &mut outbound_names)?;
        }

        for pattern in &config.secret_patterns() {
            Self::validate_secret_pattern(pattern)?;
        }

        Ok(())
    }

    fn validate_rule(
        rule: &Rule,
        idx: usize,
        names: &mut HashSet<String>,
    ) -> Result<(), WardenError> {
        let context = format!("rule #{} ('{}')", idx + 1, rule.name);

        if rule.name.is_empty() {
            return Err(WardenError::ConfigurationError(format!(
                "rule #{}: name cannot be empty",
                idx + 1
            )));
        }
        if !names.insert(rule.name.clone()) {
            return Err(WardenError::ConfigurationError(format!(
                "{}: duplicate rule name",
                context
            )));
        }

        if let Some(ref tool) = rule.match_.tool {
            Self::validate_glob(tool, &context)?;
        }

        if let Some(ref arguments) = rule.match_.arguments {
            for (key, matcher) in arguments {
                Self::validate_matcher(matcher, key, &context)?;
            }
        }

        Ok(())
    }

    fn validate_matcher(
        matcher: &ArgumentMatcher,
        key: &str,
        context: &str,
    ) -> Result<(), WardenError> {
        let active = matcher.pattern.is_some()
            || matcher.regex.is_some()
            || matcher.not_under.is_some()
            || matcher.secrets.is_some();
        if !active {
            return Err(WardenError::ConfigurationError(format!(
                "{}: matcher for '{}' declares no conditions",
                context, key
            )));
        }

        if let Some(ref pattern) = matcher.pattern {
            Self::validate_glob(pattern, context)?;
        }
        if let Some(ref regex) = matcher.regex {
            Self::validate_regex(regex, context)?;
        }
        if let Some(ref not_under) = matcher.not_under {
            if not_under.is_empty() {
                return Err(WardenError::ConfigurationError(format!(
                    "{}: not_under cannot be empty",
                    context
                )));
            }
        }

        Ok(())
    }

    fn validate_outbound_rule(
        rule: &OutboundRule,
        idx: usize,
        names: &mut HashSet<String>,
    ) -> Result<(), WardenError> {
        let context = format!("outbound rule #{} ('{}')", idx + 1, rule.name);

        if rule.name.is_empty() {
            return Err(WardenError::ConfigurationError(format!(
                "outbound rule #{}: name cannot be empty",
                idx + 1
            )));
        }
        if !names.insert(rule.name.clone()) {
            return Err(WardenError::ConfigurationError(format!(
                "{}: duplicate rule name",
                context
            )));
        }

        let m = &rule.match_;
        let has_field = m.tool.is_some()
            || m.server.is_some()
            || m.secrets.is_some()
            || m.response_contains.is_some()
            || m.response_contains_regex.is_some()
            || m.response_size_exceeds.is_some();
        if !has_field {
            return Err(WardenError::ConfigurationError(format!(
                "{}: must declare at least one match field",
                context
            )));
        }

        if let Some(ref tool) = m.tool {
            Self::validate_glob(tool, &context)?;
        }
        if let Some(ref server) = m.server {
            Self::validate_glob(server, &context)?;
        }
        if let Some(ref regexes) = m.response_contains_regex {
            for regex in regexes {
                Self::validate_regex(regex, &context)?;
            }
        }
        if let Some(size) = m.response_size_exceeds {
            if size == 0 {
                return Err(WardenError::ConfigurationError(format!(
                    "{}: response_size_exceeds must be positive",
                    context
                )));
            }
        }

        Ok(())
    }

    fn validate_secret_pattern(pattern: &SecretPattern) -> Result<(), WardenError> {
        let context = format!("secret pattern '{}'", pattern.name);

        if pattern.name.is_empty() {
            return Err(WardenError::ConfigurationError(
                "secret pattern name cannot be empty".to_string(),
            ));
        }
        Self::validate_regex(&pattern.regex, &context)?;

        if let Some(threshold) = pattern.entropy_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(WardenError::ConfigurationError(format!(
                    "{}: entropy threshold must be a non-negative number",
                    context
                )));
            }
        }

        Ok(())
    }

    fn validate_glob(pattern: &str, context: &str) -> Result<(), WardenError> {
        Glob::new(pattern).map(|_| ()).map_err(|e| {
            WardenError::ConfigurationError(format!(
                "{}: invalid glob '{}': {}",
                context, pattern, e
            ))
        })
    }

    fn validate_regex(pattern: &str, context: &str) -> Result<(), WardenError> {
        Regex::new(pattern).map_err(|e| {
            WardenError::ConfigurationError(format!(
                "{}: invalid regex '{}': {}",
                context, pattern, e
            ))
        })?;

        if has_redos_risk(pattern) {
            return Err(WardenError::ConfigurationError(format!(
                "{}: potentially unsafe regex (ReDoS risk): '{}' - avoid nested quantifiers like (a+)+",
                context, pattern
            )));
        }

        Ok(())
    }
}

/// Detect regexes prone to catastrophic backtracking.
///
/// Catches a quantified group containing a quantifier (`(a+)+`, `(.*)+`) and
/// quantified alternation groups (`(a|a)+`). This is a conservative shape
/// heuristic, not a soundness proof: some catastrophic patterns can slip
/// through and some safe patterns are rejected. For a security control a
/// false positive is acceptable; a false negative is not.
pub fn has_redos_risk(pattern: &str) -> bool {
    // A quantified group containing a quantifier, e.g. (a+)+ (a*)* (.+)*
    let nested_quantifier =
        Regex::new(r"\([^)]*[+*][^)]*\)[+*{]").expect("heuristic regex is valid");
    if nested_quantifier.is_match(pattern) {
        return true;
    }

    // Alternation inside a quantified group, e.g. (a|a)+
    let quantified_alternation =
        Regex::new(r"\([^)]*\|[^)]*\)[+*]").expect("heuristic regex is valid");
    quantified_alternation.is_match(pattern)
}
