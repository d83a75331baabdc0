//! Inbound `textDocument/publishDiagnostics` payloads.
//!
//! Parsing is `serde_json::Value` based and lenient: a diagnostic without a usable range is
//! dropped, a missing message becomes empty, and unknown severities are treated as absent.

use crate::lsp_position::LspRange;
use notebook_core::{Diagnostic, DiagnosticSeverity};
use serde_json::Value;

/// Method name of the diagnostics push notification.
pub const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";

#[derive(Debug, Clone, PartialEq)]
/// A single LSP diagnostic item.
pub struct LspDiagnostic {
    /// Diagnostic range (virtual-document coordinates).
    pub range: LspRange,
    /// Optional severity.
    pub severity: Option<DiagnosticSeverity>,
    /// Optional diagnostic code (number or string).
    pub code: Option<Value>,
    /// Optional diagnostic source (e.g. "pylsp").
    pub source: Option<String>,
    /// Diagnostic message.
    pub message: String,
    /// Optional related information (server-specific JSON).
    pub related_information: Option<Value>,
    /// Optional extra data (server-specific JSON).
    pub data: Option<Value>,
}

impl LspDiagnostic {
    /// Parse one element of the `diagnostics` array.
    pub fn from_value(value: &Value) -> Option<Self> {
        let range = LspRange::from_value(value.get("range")?)?;
        let severity = value
            .get("severity")
            .and_then(Value::as_u64)
            .and_then(DiagnosticSeverity::from_u64);
        let code = value.get("code").filter(|c| !c.is_null()).cloned();
        let source = value
            .get("source")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let related_information = value.get("relatedInformation").cloned();
        let data = value.get("data").cloned();

        Some(Self {
            range,
            severity,
            code,
            source,
            message,
            related_information,
            data,
        })
    }

    /// The diagnostic code as a string (numbers are stringified).
    pub fn code_string(&self) -> Option<String> {
        match self.code.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Convert into the model type stored in the diagnostics database.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            range: self.range.into(),
            severity: self.severity,
            code: self.code_string(),
            source: self.source.clone(),
            message: self.message.clone(),
            related_information_json: self.related_information.as_ref().map(Value::to_string),
            data_json: self.data.as_ref().map(Value::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Parameters for `textDocument/publishDiagnostics`.
pub struct LspPublishDiagnosticsParams {
    /// Document URI (e.g. `file:///...`).
    pub uri: String,
    /// Diagnostics for the document.
    pub diagnostics: Vec<LspDiagnostic>,
    /// Optional document version.
    pub version: Option<i32>,
}

impl LspPublishDiagnosticsParams {
    /// Parse the `params` payload of the notification.
    pub fn from_params(params: &Value) -> Option<Self> {
        let uri = params.get("uri")?.as_str()?.to_string();
        let version = params
            .get("version")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        let diagnostics = params
            .get("diagnostics")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(LspDiagnostic::from_value).collect())
            .unwrap_or_default();

        Some(Self {
            uri,
            diagnostics,
            version,
        })
    }

    /// Parse a notification by method name, returning `None` for anything else.
    pub fn from_notification(method: &str, params: &Value) -> Option<Self> {
        if method != PUBLISH_DIAGNOSTICS {
            return None;
        }
        Self::from_params(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp_position::LspPosition;
    use serde_json::json;

    #[test]
    fn test_parse_publish_params() {
        let params = json!({
            "uri": "file:///nb.ipynb.py",
            "version": 3,
            "diagnostics": [
                {
                    "range": {
                        "start": { "line": 0, "character": 0 },
                        "end": { "line": 0, "character": 4 }
                    },
                    "severity": 1,
                    "code": 123,
                    "source": "pyflakes",
                    "message": "undefined name"
                },
                { "message": "no range, dropped" }
            ]
        });

        let parsed =
            LspPublishDiagnosticsParams::from_notification(PUBLISH_DIAGNOSTICS, &params).unwrap();
        assert_eq!(parsed.uri, "file:///nb.ipynb.py");
        assert_eq!(parsed.version, Some(3));
        assert_eq!(parsed.diagnostics.len(), 1);

        let diag = &parsed.diagnostics[0];
        assert_eq!(diag.range.end, LspPosition::new(0, 4));
        assert_eq!(diag.severity, Some(DiagnosticSeverity::Error));
        assert_eq!(diag.code_string().as_deref(), Some("123"));

        let model = diag.to_diagnostic();
        assert_eq!(model.code.as_deref(), Some("123"));
        assert_eq!(model.source.as_deref(), Some("pyflakes"));
        assert_eq!(model.related_information_json, None);
    }

    #[test]
    fn test_other_methods_are_ignored() {
        let params = json!({ "uri": "file:///a", "diagnostics": [] });
        assert!(LspPublishDiagnosticsParams::from_notification("window/logMessage", &params).is_none());
    }
}
