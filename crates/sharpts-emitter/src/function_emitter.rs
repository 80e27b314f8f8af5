//! C5 entry point: turns one `FunctionDecl` into a `MethodBody` plus the
//! driver metadata a host runtime needs (§4.2 "externally callable stub",
//! §6 "Bytecode output").
//!
//! A plain (non-async, non-generator) function emits straight-line/control-
//! flow bytecode with ordinary locals. An `async`/generator function instead
//! gets a state-machine record (C4) and a `MoveNext` body whose entry point
//! is the state-dispatch switch built by `move_next` — this module wires the
//! two together and is where the externally callable stub itself (allocate
//! record, copy params, call `builder.Start`) is emitted.

use sharpts_ast::FunctionDecl;
use sharpts_async::{AwaitPointAnalyzer, StateMachineBuilder, StateMachineShape, SuspensionKind};
use sharpts_common::{CompileOptions, Interner};

use crate::emit_context::{ComplexTryStack, EmitError, EmitFlags, LabelStack, StackTypeTracker, TempAllocator, VariableScope};
use crate::il::{DriverKind, Instr, Label, LocalHandle, MethodBody, StackType};
use crate::move_next;
use crate::stmt_emitter;

/// The product of emitting one function: its bytecode body, and (for
/// async/generator functions) the driver kind a host uses to know which
/// calling convention applies.
pub struct EmittedFunction {
    pub body: MethodBody,
    pub driver_kind: Option<DriverKind>,
    pub shape: Option<StateMachineShape>,
}

/// Mutable state threaded through expression/statement/`MoveNext` emission
/// for a single function body. One instance per function; not reused
/// across functions (field/label/temp counters all start fresh).
pub struct FunctionEmitter<'a> {
    pub interner: &'a Interner,
    pub options: &'a CompileOptions,
    pub body: MethodBody,
    pub scope: VariableScope,
    pub temps: TempAllocator,
    pub stack: StackTypeTracker,
    pub labels: LabelStack,
    pub try_stack: ComplexTryStack,
    pub flags: EmitFlags,
    pub shape: Option<StateMachineShape>,
    /// One resume label per suspension point, in the analyzer's state
    /// order; populated by `move_next::emit_move_next` before the body is
    /// walked.
    pub resume_labels: Vec<Label>,
    /// Each suspension point's kind (`Await` vs. `Yield`/`AsyncYield`), in
    /// the same order as `resume_labels` — lets `emit_suspension_point`
    /// pick the awaiter protocol or the external-input protocol per point
    /// instead of assuming one for the whole function.
    pub resume_kinds: Vec<SuspensionKind>,
    /// How many suspension points the expression emitter has lowered so
    /// far. Advances in the same pre-order the analyzer numbered them in,
    /// so `suspension_cursor` always names the point currently being
    /// lowered.
    pub suspension_cursor: usize,
    /// Where `MoveNext`'s top-level try/catch both `leave` to, set once by
    /// `move_next::emit_move_next` before the body is walked (§4.3's `END:`
    /// label). `None` for a plain function, which has no such wrapper.
    pub end_label: Option<Label>,
    /// The local backing the bool `MoveNext` result for a plain generator
    /// (§C "driver is a MoveNext-style bool MoveNext() method"). `None` for
    /// an `async` function, whose driver returns via `builder.SetResult`/
    /// `SetException` instead and has no bool to carry.
    pub move_next_result: Option<LocalHandle>,
    /// Lazily allocated local backing §4.3's shared `return_slot`, read by
    /// the fallthrough-completion/`SET_RESULT` path when a `return` inside
    /// a complex try with an awaiting `finally` has to defer setting the
    /// builder's result until after the `finally` runs.
    return_value_slot: Option<LocalHandle>,
    /// Set by a `LabeledStatement` immediately before emitting a loop body,
    /// consumed by that loop's own emission so its `LoopLabels.name` is
    /// populated — the one piece of label information that can't be
    /// threaded through `emit_stmt`'s signature without plumbing it through
    /// every control-flow arm.
    pub pending_label: Option<sharpts_common::Atom>,
}

impl<'a> FunctionEmitter<'a> {
    fn new(name: &str, interner: &'a Interner, options: &'a CompileOptions, flags: EmitFlags, shape: Option<StateMachineShape>) -> Self {
        Self {
            interner,
            options,
            body: MethodBody::new(name),
            scope: VariableScope::default(),
            temps: TempAllocator::default(),
            stack: StackTypeTracker::default(),
            labels: LabelStack::default(),
            try_stack: ComplexTryStack::default(),
            flags,
            shape,
            resume_labels: Vec::new(),
            resume_kinds: Vec::new(),
            suspension_cursor: 0,
            end_label: None,
            move_next_result: None,
            return_value_slot: None,
            pending_label: None,
        }
    }

    /// The shared local backing a deferred `return` inside a complex try
    /// with an awaiting `finally` (§4.3); allocated on first use.
    pub fn return_slot(&mut self) -> LocalHandle {
        if let Some(handle) = self.return_value_slot {
            return handle;
        }
        let handle = self.body.new_local(StackType::Unknown);
        self.return_value_slot = Some(handle);
        handle
    }

    /// Consumes the pending label set by an immediately preceding
    /// `LabeledStatement`, if any.
    pub fn take_pending_label(&mut self) -> Option<sharpts_common::Atom> {
        self.pending_label.take()
    }

    /// Consumes the next suspension point in order, returning its
    /// zero-based state number, the label `MoveNext` resumes at after the
    /// host calls back in, and its kind. `None` once every point the
    /// analyzer found has been lowered — a bug in the emitter, not a user
    /// error, since the analyzer and the expression emitter must walk
    /// suspensions in lockstep.
    pub fn take_next_suspension(&mut self) -> Option<(u32, Label, SuspensionKind)> {
        let idx = self.suspension_cursor;
        let label = *self.resume_labels.get(idx)?;
        let kind = *self.resume_kinds.get(idx)?;
        self.suspension_cursor += 1;
        Some((idx as u32, label, kind))
    }

    /// Allocates a local and immediately binds `name` to it in the current
    /// scope. Used for ordinary (non-hoisted) parameters and `let`/`const`
    /// declarations in plain functions.
    pub fn declare_local(&mut self, name: sharpts_common::Atom, ty: StackType) -> LocalHandle {
        let handle = self.body.new_local(ty);
        self.scope.bind_local(name, handle);
        handle
    }
}

#[must_use]
fn method_name(name: Option<sharpts_common::Atom>, interner: &Interner) -> String {
    name.map(|a| interner.resolve(a).to_string()).unwrap_or_else(|| "<anonymous>".to_string())
}

/// Emits one function declaration to a `MethodBody`. `is_method` controls
/// whether `this` is hoisted for async/generator bodies (§3 "hoists_this").
pub fn emit_function(
    func: &FunctionDecl,
    is_method: bool,
    interner: &Interner,
    options: &CompileOptions,
) -> Result<EmittedFunction, EmitError> {
    let name = method_name(func.name, interner);

    if func.is_async || func.is_generator {
        let analysis = AwaitPointAnalyzer::new(is_method).analyze(func)?;
        let shape = StateMachineBuilder::new(&analysis, interner, options.verbose_field_names).build();
        let driver_kind = DriverKind::from((func.is_async, func.is_generator));

        let flags = EmitFlags { in_async: func.is_async, in_generator: func.is_generator, in_method: is_method, in_nested_arrow: false };
        let mut emitter = FunctionEmitter::new(&format!("{name}.MoveNext"), interner, options, flags, Some(shape));

        for (name, handle) in param_field_bindings(func, &emitter.shape) {
            emitter.scope.bind_hoisted(name, handle);
        }
        // `this` is addressed via `ExprKind::This`, not a named variable —
        // the expression emitter consults `shape().this_field()` directly
        // rather than going through `scope`.

        move_next::emit_move_next(&mut emitter, &analysis, func)?;

        let shape = emitter.shape.take();
        Ok(EmittedFunction { body: emitter.body, driver_kind: Some(driver_kind), shape })
    } else {
        let flags = EmitFlags { in_async: false, in_generator: false, in_method: is_method, in_nested_arrow: false };
        let mut emitter = FunctionEmitter::new(&name, interner, options, flags, None);

        for param in &func.params {
            let handle = emitter.body.new_local(StackType::Unknown);
            emitter.scope.bind_local(param.name, handle);
        }

        stmt_emitter::emit_block(&mut emitter, &func.body)?;
        emitter.body.emit(Instr::RetVoid);

        Ok(EmittedFunction { body: emitter.body, driver_kind: None, shape: None })
    }
}

/// Parameters of an async/generator function are always hoisted (§4.1:
/// "it is a formal parameter" is an unconditional hoisting rule), so every
/// one of them has a `StateMachineShape` field to bind before the body is
/// walked.
fn param_field_bindings(
    func: &FunctionDecl,
    shape: &Option<StateMachineShape>,
) -> Vec<(sharpts_common::Atom, sharpts_async::FieldHandle)> {
    let Some(shape) = shape else { return Vec::new() };
    func.params
        .iter()
        .filter_map(|p| shape.variable_field(p.name).map(|handle| (p.name, handle)))
        .collect()
}
