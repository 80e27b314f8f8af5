//! Per-function emission state shared by C5 and C6.
//!
//! Mirrors the teacher project's `EmitContext`/`EmitFlags`/
//! `ArrowTransformState` split: rather than bloating one emitter struct
//! with every flavor of nested state, each concern (loop labels, the
//! stack-type lattice, complex-try bookkeeping) gets its own small struct
//! that the emitter owns and threads through recursive emission calls.

use rustc_hash::FxHashMap;
use sharpts_async::FieldHandle;
use sharpts_common::{diagnostics::diagnostic_codes, limits, Atom};

use crate::il::{Label, LocalHandle, StackType};

/// §3 "Loop-Label Stack": `(break_label, continue_label, optional_name)`
/// entries pushed while emitting labeled/unlabeled loops.
#[derive(Clone, Copy, Debug)]
pub struct LoopLabels {
    pub break_label: Label,
    pub continue_label: Label,
    pub name: Option<Atom>,
}

/// Distinguishes a loop frame (targetable by both `break` and `continue`)
/// from a bare labeled non-loop statement (targetable only by `break`,
/// per SPEC_FULL.md §D.3's resolution of the `continue`-to-non-loop-label
/// open question).
#[derive(Clone, Copy, Debug)]
pub enum LabelFrame {
    Loop(LoopLabels),
    /// A labeled statement whose body is not a loop: only `break <name>`
    /// may target it, and it carries just the label's exit point.
    NonLoop { break_label: Label, name: Atom },
    /// A `switch` body: targetable by a bare, unlabeled `break` (§4.3
    /// "unlabeled break inside a case exits the switch even if no loop is
    /// on the stack") but never by `continue`.
    Switch { break_label: Label },
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct EmitError {
    pub code: u32,
    pub message: String,
}

impl EmitError {
    #[must_use]
    pub fn new(code: u32, args: &[&str]) -> Self {
        let template = sharpts_common::diagnostics::get_diagnostic_message(code).map(|m| m.message).unwrap_or("emission error");
        Self { code, message: sharpts_common::diagnostics::format_message(template, args) }
    }
}

impl From<sharpts_async::CompileError> for EmitError {
    fn from(err: sharpts_async::CompileError) -> Self {
        Self { code: err.code, message: err.message }
    }
}

impl From<sharpts_decorators::DecoratorError> for EmitError {
    fn from(err: sharpts_decorators::DecoratorError) -> Self {
        Self { code: err.code, message: err.message }
    }
}

/// The loop/label-frame stack for one function body being emitted (§3,
/// §4.3 "Control flow"). `break`/`continue` without a label target the
/// top frame; with a label, the stack is walked outward until the name
/// matches.
#[derive(Debug, Default)]
pub struct LabelStack {
    frames: Vec<LabelFrame>,
}

impl LabelStack {
    pub fn push_loop(&mut self, labels: LoopLabels) -> Result<(), EmitError> {
        if self.frames.len() as u32 >= limits::MAX_LOOP_LABEL_DEPTH {
            return Err(EmitError::new(diagnostic_codes::UNSUPPORTED_CONSTRUCT, &["loop nesting too deep"]));
        }
        self.frames.push(LabelFrame::Loop(labels));
        Ok(())
    }

    pub fn push_non_loop(&mut self, break_label: Label, name: Atom) {
        self.frames.push(LabelFrame::NonLoop { break_label, name });
    }

    pub fn push_switch(&mut self, break_label: Label) {
        self.frames.push(LabelFrame::Switch { break_label });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// `break` without a label targets the innermost loop *or* switch
    /// (§4.3 "unlabeled break inside a case exits the switch even if no
    /// loop is on the stack"); a bare labeled block is skipped since only
    /// an explicit `break <name>` can target it.
    #[must_use]
    pub fn innermost_breakable(&self) -> Option<Label> {
        self.frames.iter().rev().find_map(|f| match f {
            LabelFrame::Loop(l) => Some(l.break_label),
            LabelFrame::Switch { break_label } => Some(*break_label),
            LabelFrame::NonLoop { .. } => None,
        })
    }

    /// `break`/`continue` with no label: always target the innermost
    /// *loop* frame, per §4.3 "`break` and `continue` without label
    /// target the stack top" — a bare `break` can also exit a non-loop
    /// label or a `switch`, but those are handled by the statement
    /// emitter directly (switch isn't on this stack; a non-loop label's
    /// unlabeled-break target is whatever loop/switch is nested inside
    /// it, which is exactly the top of this stack too).
    #[must_use]
    pub fn innermost_loop(&self) -> Option<LoopLabels> {
        self.frames.iter().rev().find_map(|f| match f {
            LabelFrame::Loop(l) => Some(*l),
            LabelFrame::NonLoop { .. } | LabelFrame::Switch { .. } => None,
        })
    }

    /// Resolve a labeled `break <name>`/`continue <name>`: walk outward
    /// from the top until `name` matches. Returns `None` if not found
    /// (the emitter reports `LABEL_NOT_FOUND`).
    #[must_use]
    pub fn find(&self, name: Atom) -> Option<LabelFrame> {
        self.frames.iter().rev().copied().find(|f| match f {
            LabelFrame::Loop(l) => l.name == Some(name),
            LabelFrame::NonLoop { name: n, .. } => *n == name,
            LabelFrame::Switch { .. } => false,
        })
    }
}

/// The stack-type lattice (§4.4), threaded explicitly through the
/// expression emitter rather than hidden in a side channel (§9 "Stack-type
/// lattice threaded through the emitter: represent as an explicit field on
/// the emitter").
#[derive(Debug, Default)]
pub struct StackTypeTracker {
    current: Option<StackType>,
}

impl StackTypeTracker {
    pub fn set(&mut self, ty: StackType) {
        self.current = Some(ty);
    }

    pub fn set_unknown(&mut self) {
        self.current = Some(StackType::Unknown);
    }

    #[must_use]
    pub fn current(&self) -> StackType {
        self.current.unwrap_or(StackType::Unknown)
    }
}

/// Allocates synthetic local-variable names/slots for temporaries the
/// §4.3 "pre-evaluate into locals" rule requires (multi-operand ops that
/// might be interrupted mid-evaluation by an `Await`). Named after the
/// teacher's `DestructuringState::temp_var_counter` — a monotonically
/// increasing counter, reset per function.
#[derive(Debug, Default)]
pub struct TempAllocator {
    counter: u32,
}

impl TempAllocator {
    pub fn next_name(&mut self) -> String {
        let n = self.counter;
        self.counter += 1;
        format!("_tmp{n}")
    }
}

/// Bookkeeping for one nesting level of a complex `try` (§4.3 "Complex
/// mode"). A new frame is pushed per `try` entered while a suspension is
/// reachable somewhere in its try/catch/finally.
#[derive(Debug, Clone, Copy)]
pub struct ComplexTryFrame {
    pub caught_exception: LocalHandle,
    pub pending_return: Option<LocalHandle>,
    pub after_finally: Option<Label>,
}

#[derive(Debug, Default)]
pub struct ComplexTryStack {
    frames: Vec<ComplexTryFrame>,
}

impl ComplexTryStack {
    pub fn push(&mut self, frame: ComplexTryFrame) -> Result<(), EmitError> {
        if self.frames.len() as u32 >= limits::MAX_TRY_NESTING_DEPTH {
            return Err(EmitError::new(diagnostic_codes::TRY_NESTING_TOO_DEEP, &[&self.frames.len().to_string()]));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// The innermost enclosing complex try, if any — `EmitAwait` (§4.3
    /// step 6) consults this to decide whether a `get_result` call needs
    /// its own protected wrapper.
    #[must_use]
    pub fn innermost(&self) -> Option<ComplexTryFrame> {
        self.frames.last().copied()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Per-function flags mirroring the teacher's `EmitFlags`: coarse context
/// bits the emitter consults to pick the right lowering for a construct
/// (an `Await`/`Yield` only makes sense, and only needs segmentation,
/// inside a function that actually suspends).
#[derive(Clone, Copy, Debug, Default)]
pub struct EmitFlags {
    pub in_async: bool,
    pub in_generator: bool,
    pub in_method: bool,
    /// True while emitting an arrow function nested inside an outer
    /// async/generator activation (SPEC_FULL.md §C): hoisted-variable
    /// references resolve through the *outer* state machine's fields via
    /// `self_boxed`, not this arrow's own locals.
    pub in_nested_arrow: bool,
}

/// Maps hoisted-variable names to the owning activation's state-machine
/// field, and everything else to a plain local slot. SPEC_FULL.md §C:
/// "the arrow's own closure record is a plain captured-variable struct,
/// not a state machine" — captured names still resolve to the *outer*
/// activation's fields, recorded here once at arrow-entry time.
#[derive(Debug, Default)]
pub struct VariableScope {
    locals: FxHashMap<Atom, LocalHandle>,
    hoisted: FxHashMap<Atom, FieldHandle>,
}

/// Where a variable name resolves to: a plain method-local slot, or a
/// field on the current activation's state-machine record.
#[derive(Clone, Copy, Debug)]
pub enum VariableSlot {
    Local(LocalHandle),
    Hoisted(FieldHandle),
}

impl VariableScope {
    pub fn bind_local(&mut self, name: Atom, handle: LocalHandle) {
        self.locals.insert(name, handle);
    }

    pub fn bind_hoisted(&mut self, name: Atom, handle: FieldHandle) {
        self.hoisted.insert(name, handle);
    }

    #[must_use]
    pub fn local(&self, name: Atom) -> Option<LocalHandle> {
        self.locals.get(&name).copied()
    }

    /// Resolves a variable reference, preferring a hoisted field over a
    /// plain local when (implausibly) both are registered for the same
    /// name — a hoisted binding always shadows, since the analyzer only
    /// hoists a name when it is genuinely live across a suspension.
    #[must_use]
    pub fn resolve(&self, name: Atom) -> Option<VariableSlot> {
        if let Some(handle) = self.hoisted.get(&name) {
            return Some(VariableSlot::Hoisted(*handle));
        }
        self.locals.get(&name).map(|h| VariableSlot::Local(*h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_allocator_names_are_unique() {
        let mut alloc = TempAllocator::default();
        assert_ne!(alloc.next_name(), alloc.next_name());
    }

    #[test]
    fn label_stack_finds_innermost_loop() {
        let mut stack = LabelStack::default();
        let labels = LoopLabels { break_label: Label(0), continue_label: Label(1), name: None };
        stack.push_loop(labels).unwrap();
        assert!(stack.innermost_loop().is_some());
        stack.pop();
        assert!(stack.innermost_loop().is_none());
    }
}
