//! The Dispatch Registry (C8, spec.md §4.5).
//!
//! Resolves one `Call` expression's callee to a concrete bytecode call
//! shape, trying the ordered rules in §4.5 from most to least specific.
//! The emitter does not carry a full type-checking pass (that collaborator
//! is out of scope per spec.md §1). Rules 7-9 (builtin `String`/`Array`
//! methods) are resolved concretely from the method name alone via the
//! fixed prototype tables below, with the genuinely ambiguous names
//! (shared by both prototypes) deferred to a runtime `IsString` test
//! rather than a static guess. Rule 6 (direct virtual dispatch on a
//! user-defined instance) has no such name table to fall back on, so it
//! stays a blind fallback — any `Get`-shaped callee not caught by an
//! earlier rule is assumed to be a method on a user class instance. See
//! DESIGN.md for the exact narrowing this implies relative to a build
//! with a full checker in front of it.

use sharpts_ast::{Expr, ExprKind};

use crate::emit_context::EmitError;
use crate::function_emitter::FunctionEmitter;
use crate::il::MetadataToken;

/// Where a resolved call should actually go in the bytecode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchTarget {
    /// A non-virtual call to a known method/function (console.log, a host
    /// static, a class static, a direct function-table entry).
    Static(MetadataToken),
    /// A virtual call on a receiver whose exact class is known statically.
    Virtual(MetadataToken),
    /// A call into the fixed runtime-helper catalog (built-in modules,
    /// `Promise` instance methods bridged through the host).
    Helper(String),
    /// Rule 9: a method name shared by `String.prototype` and
    /// `Array.prototype` with different behavior on each (`slice`,
    /// `indexOf`, ...) — the receiver's runtime type decides which helper
    /// applies, tested at the call site with `IsString`.
    AmbiguousStringOrArray { string_helper: String, array_helper: String },
    /// The final fallback (§4.5 rule 11): invoke an arbitrary callable
    /// value with no further static knowledge of its shape.
    InvokeValue,
}

/// Whether a resolved call needs a receiver value pushed ahead of its
/// arguments. Namespace statics (`Math.max`, `console.log`, a class's own
/// static method) address nothing but the call's own arguments; instance
/// calls (`p.then(...)`, `"x".indexOf(...)`, virtual dispatch) need the
/// object the method is being called on as an implicit first argument.
#[derive(Clone, Copy, Debug)]
pub enum Receiver<'e> {
    None,
    Value(&'e Expr),
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DispatchError {
    pub message: String,
}

/// Fixed set of host globals with statically known statics (§4.5 rule 2);
/// anything else reaching rule 2 falls through.
const HOST_STATIC_OBJECTS: &[&str] = &["Math", "JSON", "Object", "Array", "Number", "String", "Symbol", "Promise"];

/// Built-in modules bridged through runtime helpers rather than emitted as
/// direct calls (§4.5 rule 3).
const BUILTIN_MODULES: &[&str] = &["console", "process"];

/// `Promise` instance methods (§4.5 rule 5) always go through the runtime
/// bridge since a `Promise` here is a host value, not a SharpTS class.
const PROMISE_METHODS: &[&str] = &["then", "catch", "finally"];

/// `String.prototype`-only methods (§4.5 rule 8's "known to belong to
/// exactly one builtin type", narrowed to strings).
const STRING_ONLY_METHODS: &[&str] = &[
    "charAt", "charCodeAt", "codePointAt", "toUpperCase", "toLowerCase", "trim", "trimStart", "trimEnd",
    "padStart", "padEnd", "repeat", "split", "replace", "replaceAll", "startsWith", "endsWith", "substring",
    "substr", "localeCompare", "normalize", "matchAll", "match", "search",
];

/// `Array.prototype`-only methods (same rule, narrowed to arrays).
const ARRAY_ONLY_METHODS: &[&str] = &[
    "push", "pop", "shift", "unshift", "map", "filter", "reduce", "reduceRight", "forEach", "sort", "reverse",
    "flat", "flatMap", "find", "findIndex", "findLast", "findLastIndex", "some", "every", "fill", "join",
    "splice", "keys", "values", "entries", "copyWithin",
];

/// Methods present on both `String.prototype` and `Array.prototype` with
/// different behavior on each (§4.5 rule 9's ambiguous set) — resolved at
/// the call site with a runtime `IsString` test.
const AMBIGUOUS_STRING_OR_ARRAY_METHODS: &[&str] = &["slice", "concat", "includes", "indexOf", "lastIndexOf", "at", "toString"];

/// Resolves `callee` to a `DispatchTarget` plus the receiver value (if
/// any) the caller must push ahead of the call's own arguments, trying
/// §4.5's rules in order. `_emitter` is accepted (rather than only the
/// callee expression) so a future pass with access to the checker's
/// inferred types can tighten rules 6/7/9 without changing this
/// function's signature.
pub fn resolve_call<'e>(_emitter: &FunctionEmitter, callee: &'e Expr) -> Result<(DispatchTarget, Receiver<'e>), EmitError> {
    // Rule 1: `console.log` (and its siblings) is special-cased ahead of
    // the general built-in-module rule because it is by far the most
    // common call site and should never pay for a full property lookup.
    // `console` itself is a namespace, not a value — no receiver.
    if let ExprKind::Get { object, name, .. } = &callee.kind {
        if is_identifier(object, "console", _emitter) {
            let method = name_text(*name, _emitter);
            return Ok((DispatchTarget::Helper(format!("console.{method}")), Receiver::None));
        }
    }

    // Rule 2: host-type statics (`Math.max`, `JSON.parse`, ...). Also a
    // namespace, not a receiver value.
    if let ExprKind::Get { object, name, .. } = &callee.kind {
        if let ExprKind::Variable(obj_name) = &object.kind {
            let obj_text = _emitter.interner.resolve(*obj_name);
            if HOST_STATIC_OBJECTS.contains(&obj_text) {
                let method = name_text(*name, _emitter);
                return Ok((DispatchTarget::Helper(format!("{obj_text}.{method}")), Receiver::None));
            }
        }
    }

    // Rule 3: other built-in modules bridged wholesale through the helper
    // catalog (`process.exit`, ...). Same: a namespace, not a receiver.
    if let ExprKind::Get { object, name, .. } = &callee.kind {
        if let ExprKind::Variable(obj_name) = &object.kind {
            let obj_text = _emitter.interner.resolve(*obj_name);
            if BUILTIN_MODULES.contains(&obj_text) {
                let method = name_text(*name, _emitter);
                return Ok((DispatchTarget::Helper(format!("{obj_text}.{method}")), Receiver::None));
            }
        }
    }

    // Rule 4: `ClassName.staticMethod(...)` — the callee's object position
    // is a bare identifier that resolves to a known class name rather than
    // a local/hoisted variable. Without the checker in front of this pass
    // we can't distinguish a class name from an unresolved global with
    // certainty, so this falls back to a named static call and lets a
    // later resolution stage (out of scope here) correct it if wrong. A
    // static method has no receiver either.
    if let ExprKind::Get { object, name, optional: _ } = &callee.kind {
        if let ExprKind::Variable(obj_name) = &object.kind {
            let obj_text = _emitter.interner.resolve(*obj_name);
            if obj_text.chars().next().is_some_and(char::is_uppercase) {
                let method = name_text(*name, _emitter);
                return Ok((DispatchTarget::Static(MetadataToken::Method(format!("{obj_text}::{method}"))), Receiver::None));
            }
        }
    }

    // Rule 5: `somePromise.then(...)`/`.catch(...)`/`.finally(...)` — the
    // promise value itself is the receiver.
    if let ExprKind::Get { object, name, .. } = &callee.kind {
        let method = name_text(*name, _emitter);
        if PROMISE_METHODS.contains(&method.as_str()) {
            return Ok((DispatchTarget::Helper(format!("Promise.{method}")), Receiver::Value(object)));
        }
    }

    // Rules 7-9: builtin `String`/`Array` methods, approximated from the
    // method name alone since this pass has no checker-inferred receiver
    // type. A name unique to one prototype dispatches straight to that
    // prototype's helper (rule 8); a name shared by both is resolved at
    // the call site with a runtime type test (rule 9). Anything not in
    // either table falls through to rule 6's virtual dispatch, treating
    // it as a user-defined class instance method.
    if let ExprKind::Get { object, name, .. } = &callee.kind {
        let method = name_text(*name, _emitter);
        if AMBIGUOUS_STRING_OR_ARRAY_METHODS.contains(&method.as_str()) {
            return Ok((
                DispatchTarget::AmbiguousStringOrArray {
                    string_helper: format!("String.{method}"),
                    array_helper: format!("Array.{method}"),
                },
                Receiver::Value(object),
            ));
        }
        if STRING_ONLY_METHODS.contains(&method.as_str()) {
            return Ok((DispatchTarget::Helper(format!("String.{method}")), Receiver::Value(object)));
        }
        if ARRAY_ONLY_METHODS.contains(&method.as_str()) {
            return Ok((DispatchTarget::Helper(format!("Array.{method}")), Receiver::Value(object)));
        }
    }

    // Rule 6: direct virtual dispatch — the receiver's exact class is
    // known statically to be a user-defined `Instance(Class)`, so the
    // runtime resolves the method against its vtable.
    if let ExprKind::Get { object, name, .. } = &callee.kind {
        let method = name_text(*name, _emitter);
        return Ok((DispatchTarget::Virtual(MetadataToken::Method(method)), Receiver::Value(object)));
    }

    // Rule 10: a bare identifier callee names a function-table entry — no
    // receiver, it's a plain function call.
    if let ExprKind::Variable(name) = &callee.kind {
        let text = _emitter.interner.resolve(*name).to_string();
        return Ok((DispatchTarget::Static(MetadataToken::Method(text)), Receiver::None));
    }

    // Rule 11: anything else (an IIFE, a computed/indexed callee, the
    // result of another call) is an arbitrary callable value — the callee
    // expression itself is the receiver `InvokeValue` dispatches on.
    Ok((DispatchTarget::InvokeValue, Receiver::Value(callee)))
}

fn is_identifier(expr: &Expr, text: &str, emitter: &FunctionEmitter) -> bool {
    matches!(&expr.kind, ExprKind::Variable(name) if emitter.interner.resolve(*name) == text)
}

fn name_text(name: sharpts_common::Atom, emitter: &FunctionEmitter) -> String {
    emitter.interner.resolve(name).to_string()
}
