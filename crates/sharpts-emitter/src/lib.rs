//! The bytecode emitter: turns a checked AST into the typed IL described in
//! §6, by way of the async lowering passes in `sharpts-async` and the
//! decorator planner in `sharpts-decorators`.
//!
//! Mirrors the teacher project's emitter crate split — a context module
//! holding mutable per-function state, an expression emitter, a statement
//! emitter, and (here, since this core targets a stateful bytecode rather
//! than source text) a `MoveNext` emitter and a dispatch registry in place
//! of the teacher's ES5-helpers and call-expression lowering modules.

pub mod dispatch;
pub mod emit_context;
pub mod expr_emitter;
pub mod function_emitter;
pub mod il;
pub mod move_next;
pub mod stmt_emitter;

pub use dispatch::{resolve_call, DispatchError, DispatchTarget, Receiver};
pub use emit_context::{
    ComplexTryFrame, ComplexTryStack, EmitError, EmitFlags, LabelFrame, LabelStack, LoopLabels, StackTypeTracker,
    TempAllocator, VariableScope,
};
pub use function_emitter::{emit_function, EmittedFunction};
pub use il::{
    ArithOp, CompareOp, DriverKind, FieldRef, Instr, Label, LocalHandle, MetadataToken, MethodBody, StackType,
    suspension_kind_for,
};
