//! Diagnostic types and message lookup for the SharpTS compiler core.
//!
//! §7 of the specification groups errors into `TypeError` (compile-time type
//! mismatch, arity mismatch, abstract-method non-implementation),
//! `CompileError` (undefined name at emission, unsupported construct,
//! unknown dispatch target), `DecoratorError` (non-callable decorator), and
//! the runtime-raised `RangeError`/`TypeError`/`ReferenceError` wrapper
//! kinds. `data.rs` holds the fixed catalog of messages for those kinds,
//! keyed by a stable numeric code the way the teacher project keys its
//! (much larger) TypeScript-conformance catalog.

use crate::Span;
use serde::Serialize;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes};

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// Related information for a diagnostic (e.g. "decorator declared here").
#[derive(Clone, Debug, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub span: Span,
    pub message_text: String,
    pub category: DiagnosticCategory,
}

/// A compiler diagnostic with optional related information.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub span: Span,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    #[must_use]
    pub fn error(file: impl Into<String>, span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            file: file.into(),
            span,
            message_text: message.into(),
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_code(file: impl Into<String>, span: Span, code: u32, args: &[&str]) -> Self {
        let (category, template) = get_diagnostic_message(code)
            .map(|m| (m.category, m.message))
            .unwrap_or((DiagnosticCategory::Error, "Unknown diagnostic."));
        Self {
            file: file.into(),
            span,
            message_text: format_message(template, args),
            category,
            code,
            related_information: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_related(
        mut self,
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file: file.into(),
            span,
            message_text: message.into(),
            category: DiagnosticCategory::Message,
        });
        self
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, ... with
/// arguments in order.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition: code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positional_placeholders() {
        let msg = format_message("Cannot find name '{0}'.", &["foo"]);
        assert_eq!(msg, "Cannot find name 'foo'.");
    }

    #[test]
    fn from_code_looks_up_category_and_template() {
        let diag = Diagnostic::from_code(
            "a.ts",
            Span::new(0, 3),
            diagnostic_codes::DECORATOR_NOT_CALLABLE,
            &["dec"],
        );
        assert_eq!(diag.category, DiagnosticCategory::Error);
        assert!(diag.message_text.contains("dec"));
    }
}
