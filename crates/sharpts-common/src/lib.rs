//! Common types and utilities shared across the SharpTS compiler crates.
//!
//! This crate provides the foundational layer used by every other member of
//! the workspace:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`, `Spanned`, `SpanBuilder`, `ByteSpan`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, the message catalog)
//! - Compiler limits and thresholds
//! - Compile-time options (`CompileOptions`, `DecoratorMode`)
//!
//! No module here depends on `sharpts-ast`, `sharpts-types`, `sharpts-async`,
//! `sharpts-decorators`, or `sharpts-emitter` — this crate sits at the
//! bottom of the workspace dependency graph.

// String interning for identifier deduplication.
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets).
pub mod span;
pub use span::{ByteSpan, Span, SpanBuilder, Spanned};

// Centralized limits and thresholds.
pub mod limits;

// Diagnostics and the message catalog.
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};

// Compile-time configuration.
pub mod options;
pub use options::{CompileOptions, DecoratorMode};
