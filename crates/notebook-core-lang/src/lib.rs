#![warn(missing_docs)]
//! `notebook-core-lang` - data-driven configuration for `notebook-core-lsp`.
//!
//! The settings system itself lives in the host. This crate only describes the read-only inputs
//! the completion and diagnostics algorithms consume, how they deserialize from JSON settings,
//! and their compiled forms.

use notebook_core::DiagnosticSeverity;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading or compiling configuration.
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    /// The settings payload was not valid JSON or had the wrong shape.
    Json(#[from] serde_json::Error),

    #[error("regex compile error for pattern '{pattern}': {message}")]
    /// An ignore-message pattern failed to compile.
    InvalidPattern {
        /// The regex pattern string.
        pattern: String,
        /// The compiler error message.
        message: String,
    },
}

/// Diagnostics settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    /// Diagnostic codes (stringified) that are never shown.
    pub ignore_codes: BTreeSet<String>,
    /// Regular expressions; a diagnostic whose message matches any of them is never shown.
    #[serde(alias = "ignoreMessagesPatterns")]
    pub ignore_message_patterns: Vec<String>,
    /// Severity assumed for diagnostics that do not carry one.
    pub default_severity: DiagnosticSeverity,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            ignore_codes: BTreeSet::new(),
            ignore_message_patterns: Vec::new(),
            default_severity: DiagnosticSeverity::Warning,
        }
    }
}

impl DiagnosticsConfig {
    /// Compile message patterns into a [`DiagnosticFilter`].
    pub fn compile(&self) -> Result<DiagnosticFilter, ConfigError> {
        let ignore_messages = self
            .ignore_message_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|err| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DiagnosticFilter {
            ignore_codes: self.ignore_codes.clone(),
            ignore_messages,
            default_severity: self.default_severity,
        })
    }
}

/// Compiled diagnostics settings.
#[derive(Debug, Clone)]
pub struct DiagnosticFilter {
    ignore_codes: BTreeSet<String>,
    ignore_messages: Vec<Regex>,
    default_severity: DiagnosticSeverity,
}

impl DiagnosticFilter {
    /// Returns `true` if a diagnostic with this code/message must be dropped.
    pub fn is_ignored(&self, code: Option<&str>, message: &str) -> bool {
        if code.is_some_and(|code| self.ignore_codes.contains(code)) {
            return true;
        }
        !message.is_empty() && self.ignore_messages.iter().any(|re| re.is_match(message))
    }

    /// Severity assumed for diagnostics that do not carry one.
    pub fn default_severity(&self) -> DiagnosticSeverity {
        self.default_severity
    }
}

impl Default for DiagnosticFilter {
    fn default() -> Self {
        Self {
            ignore_codes: BTreeSet::new(),
            ignore_messages: Vec::new(),
            default_severity: DiagnosticSeverity::Warning,
        }
    }
}

/// Completion settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    /// Characters that trigger completion when typed. Empty means "use the server's list".
    pub trigger_characters: Vec<String>,
}

impl CompletionConfig {
    /// Configured trigger characters, or the server-advertised ones when none are configured.
    pub fn effective_trigger_characters<'a>(&'a self, server: &'a [String]) -> &'a [String] {
        if self.trigger_characters.is_empty() {
            server
        } else {
            &self.trigger_characters
        }
    }

    /// Returns `true` if `character` is a trigger character.
    pub fn is_trigger_character(&self, character: &str, server: &[String]) -> bool {
        !character.is_empty()
            && self
                .effective_trigger_characters(server)
                .iter()
                .any(|c| c == character)
    }

    /// Returns `true` if the last character of `inserted_text` should trigger completion.
    pub fn should_trigger_after(&self, inserted_text: &str, server: &[String]) -> bool {
        let Some(last) = inserted_text.chars().last() else {
            return false;
        };
        let mut buf = [0u8; 4];
        self.is_trigger_character(last.encode_utf8(&mut buf), server)
    }
}

/// All settings consumed by `notebook-core-lsp`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LspSettings {
    /// Completion settings.
    pub completion: CompletionConfig,
    /// Diagnostics settings.
    pub diagnostics: DiagnosticsConfig,
}

impl LspSettings {
    /// Parse settings from a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
