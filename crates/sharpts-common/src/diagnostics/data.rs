//! Diagnostic message catalog for the SharpTS compiler core.
//!
//! Unlike the teacher project's catalog (generated from TypeScript's own
//! `diagnosticMessages.json`, tens of thousands of entries covering full
//! conformance), this catalog is hand-curated and covers exactly the error
//! kinds §7 of the specification assigns to the core: `TypeError`,
//! `CompileError`, `DecoratorError`, and the runtime wrapper kinds.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    // 1000s: CompileError (undefined name, unsupported construct, unknown dispatch target)
    pub const UNDEFINED_NAME: u32 = 1001;
    pub const UNSUPPORTED_CONSTRUCT: u32 = 1002;
    pub const UNKNOWN_DISPATCH_TARGET: u32 = 1003;
    pub const UNLABELED_BREAK_OUTSIDE_LOOP_OR_SWITCH: u32 = 1004;
    pub const LABEL_NOT_FOUND: u32 = 1005;
    pub const CONTINUE_TARGETS_NON_LOOP_LABEL: u32 = 1006;
    pub const TOO_MANY_SUSPENSION_POINTS: u32 = 1007;
    pub const TOO_MANY_HOISTED_FIELDS: u32 = 1008;
    pub const TRY_NESTING_TOO_DEEP: u32 = 1009;

    // 2000s: TypeError (type mismatch, arity mismatch, abstract-method non-implementation)
    pub const TYPE_MISMATCH: u32 = 2001;
    pub const ARITY_MISMATCH: u32 = 2002;
    pub const ABSTRACT_METHOD_NOT_IMPLEMENTED: u32 = 2003;
    pub const AMBIGUOUS_UNION_MEMBER_DISPATCH: u32 = 2004;

    // 3000s: DecoratorError (non-callable decorator)
    pub const DECORATOR_NOT_CALLABLE: u32 = 3001;
    pub const DECORATOR_CHAIN_TOO_LONG: u32 = 3002;

    // 4000s: runtime-raised wrapper kinds, surfaced uniformly at compile boundaries
    pub const RUNTIME_RANGE_ERROR: u32 = 4001;
    pub const RUNTIME_TYPE_ERROR: u32 = 4002;
    pub const RUNTIME_REFERENCE_ERROR: u32 = 4003;
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::UNDEFINED_NAME,
        category: DiagnosticCategory::Error,
        message: "Cannot find name '{0}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_CONSTRUCT,
        category: DiagnosticCategory::Error,
        message: "'{0}' is not supported by the bytecode emitter.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNKNOWN_DISPATCH_TARGET,
        category: DiagnosticCategory::Error,
        message: "Cannot resolve a call target for '{0}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNLABELED_BREAK_OUTSIDE_LOOP_OR_SWITCH,
        category: DiagnosticCategory::Error,
        message: "A 'break' statement can only be used within an enclosing iteration or switch statement.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::LABEL_NOT_FOUND,
        category: DiagnosticCategory::Error,
        message: "A '{0}' statement can only jump to a label of an enclosing statement.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::CONTINUE_TARGETS_NON_LOOP_LABEL,
        category: DiagnosticCategory::Error,
        message: "A 'continue' statement can only jump to a label of an enclosing iteration statement.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::TOO_MANY_SUSPENSION_POINTS,
        category: DiagnosticCategory::Error,
        message: "Function body has too many 'await'/'yield' suspension points ({0}) for a single state machine.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::TOO_MANY_HOISTED_FIELDS,
        category: DiagnosticCategory::Error,
        message: "Function body requires too many hoisted fields ({0}) for a single state-machine record.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::TRY_NESTING_TOO_DEEP,
        category: DiagnosticCategory::Error,
        message: "'try' statements are nested too deeply ({0} levels) for the complex-try lowering.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::TYPE_MISMATCH,
        category: DiagnosticCategory::Error,
        message: "Type '{0}' is not assignable to type '{1}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::ARITY_MISMATCH,
        category: DiagnosticCategory::Error,
        message: "Expected {0} arguments, but got {1}.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::ABSTRACT_METHOD_NOT_IMPLEMENTED,
        category: DiagnosticCategory::Error,
        message: "Non-abstract class '{0}' does not implement inherited abstract member '{1}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::AMBIGUOUS_UNION_MEMBER_DISPATCH,
        category: DiagnosticCategory::Message,
        message: "Method '{0}' is present on more than one union member; dispatching at runtime.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::DECORATOR_NOT_CALLABLE,
        category: DiagnosticCategory::Error,
        message: "Decorator expression '{0}' does not evaluate to a callable value.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::DECORATOR_CHAIN_TOO_LONG,
        category: DiagnosticCategory::Error,
        message: "Decorator chain on '{0}' exceeds the maximum supported length.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::RUNTIME_RANGE_ERROR,
        category: DiagnosticCategory::Message,
        message: "RangeError: {0}",
    },
    DiagnosticMessage {
        code: diagnostic_codes::RUNTIME_TYPE_ERROR,
        category: DiagnosticCategory::Message,
        message: "TypeError: {0}",
    },
    DiagnosticMessage {
        code: diagnostic_codes::RUNTIME_REFERENCE_ERROR,
        category: DiagnosticCategory::Message,
        message: "ReferenceError: {0}",
    },
];
