//! The State-Machine Builder (C4, spec.md §4.2).
//!
//! Turns an `AsyncAnalysis` into a concrete field layout: one field per
//! hoisted variable, one `awaiter_n` per suspension point, the `state`/
//! `builder` fields every state machine carries, an optional `this_field`,
//! and the `self_boxed` field used to share hoisted slots with a nested
//! async arrow (SPEC_FULL.md §C "Arrow-function lexical capture").
//!
//! The builder does not itself emit bytecode — it only hands the MoveNext
//! emitter (C5, in `sharpts-emitter`) a stable name→field map so reads and
//! writes of hoisted variables can be translated to field accesses on
//! `self` without the emitter needing to know how fields were assigned.

use rustc_hash::FxHashMap;
use sharpts_common::Atom;

use crate::analyzer::AsyncAnalysis;
use crate::suspension::SuspensionKind;

/// An opaque handle to one field of a state-machine record. Two handles
/// are equal iff they address the same field of the same shape; the
/// numeric value has no meaning outside `StateMachineShape`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldHandle(pub u32);

/// The well-known, always-present fields (§3 "State-Machine Record").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WellKnownFields {
    pub state: FieldHandle,
    pub builder: FieldHandle,
    /// `self_boxed` — shared between an outer async activation and any
    /// nested async arrow it creates (§5 "Resource Discipline").
    pub self_boxed: FieldHandle,
}

/// A named field's metadata, kept only for diagnostics/listing output —
/// the emitter addresses fields through `FieldHandle`, never by name.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    State,
    Builder,
    SelfBoxed,
    This,
    /// One per suspension point; holds the awaiter/enumerator value
    /// between suspend and resume.
    Awaiter(u32),
    /// One per hoisted source variable.
    Hoisted,
}

/// The concrete shape of one async/generator function's state-machine
/// record: the field map the MoveNext emitter consults to translate
/// hoisted-variable reads/writes into field accesses on `self`.
#[derive(Debug)]
pub struct StateMachineShape {
    fields: Vec<FieldInfo>,
    well_known: WellKnownFields,
    this_field: Option<FieldHandle>,
    by_name: FxHashMap<Atom, FieldHandle>,
    awaiter_by_state: FxHashMap<u32, FieldHandle>,
    is_async: bool,
    is_generator: bool,
}

impl StateMachineShape {
    #[must_use]
    pub fn well_known(&self) -> WellKnownFields {
        self.well_known
    }

    #[must_use]
    pub fn state_field(&self) -> FieldHandle {
        self.well_known.state
    }

    #[must_use]
    pub fn builder_field(&self) -> FieldHandle {
        self.well_known.builder
    }

    #[must_use]
    pub fn self_boxed_field(&self) -> FieldHandle {
        self.well_known.self_boxed
    }

    #[must_use]
    pub fn this_field(&self) -> Option<FieldHandle> {
        self.this_field
    }

    /// §4.2: `variable_field(name) -> field | none`.
    #[must_use]
    pub fn variable_field(&self, name: Atom) -> Option<FieldHandle> {
        self.by_name.get(&name).copied()
    }

    /// §4.2: `awaiter_field(state) -> field`.
    #[must_use]
    pub fn awaiter_field(&self, state: u32) -> FieldHandle {
        *self
            .awaiter_by_state
            .get(&state)
            .unwrap_or_else(|| panic!("no awaiter field reserved for suspension state {state}"))
    }

    #[must_use]
    pub fn field_info(&self, handle: FieldHandle) -> &FieldInfo {
        &self.fields[handle.0 as usize]
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    #[must_use]
    pub fn is_generator(&self) -> bool {
        self.is_generator
    }

    /// All fields in declaration order, for bytecode-listing output.
    pub fn fields(&self) -> impl Iterator<Item = (FieldHandle, &FieldInfo)> {
        self.fields.iter().enumerate().map(|(i, info)| (FieldHandle(i as u32), info))
    }
}

/// Builds a `StateMachineShape` from an `AsyncAnalysis`. One builder per
/// function; `build` consumes it.
pub struct StateMachineBuilder<'a> {
    analysis: &'a AsyncAnalysis,
    interner: &'a sharpts_common::Interner,
    verbose_field_names: bool,
}

impl<'a> StateMachineBuilder<'a> {
    #[must_use]
    pub fn new(analysis: &'a AsyncAnalysis, interner: &'a sharpts_common::Interner, verbose_field_names: bool) -> Self {
        Self { analysis, interner, verbose_field_names }
    }

    #[must_use]
    pub fn build(self) -> StateMachineShape {
        let mut fields = Vec::new();
        let mut by_name = FxHashMap::default();
        let mut awaiter_by_state = FxHashMap::default();

        let state = push(&mut fields, field_name(self.verbose_field_names, "state", None), FieldKind::State);
        let builder = push(&mut fields, field_name(self.verbose_field_names, "builder", None), FieldKind::Builder);
        let self_boxed = push(&mut fields, field_name(self.verbose_field_names, "self_boxed", None), FieldKind::SelfBoxed);

        let this_field = if self.analysis.hoists_this {
            Some(push(&mut fields, field_name(self.verbose_field_names, "this", None), FieldKind::This))
        } else {
            None
        };

        // One awaiter/enumerator-input slot per suspension point, in state
        // order — §4.3 addresses these as `awaiter_n`.
        for point in &self.analysis.suspension_points {
            let label = match point.kind {
                SuspensionKind::Await => "awaiter",
                SuspensionKind::Yield | SuspensionKind::AsyncYield => "yield_input",
            };
            let handle = push(&mut fields, field_name(self.verbose_field_names, label, Some(point.state)), FieldKind::Awaiter(point.state));
            awaiter_by_state.insert(point.state, handle);
        }

        // Hoisted variables, in a deterministic (lexicographic-by-name)
        // order — §9 "Determinism across platforms": iteration order that
        // drives emission must not depend on hash-map iteration order.
        let mut names: Vec<Atom> = self.analysis.hoisted_vars.iter().copied().collect();
        names.sort_unstable_by_key(|a| self.interner.resolve(*a).to_string());
        for name in names {
            let text = self.interner.resolve(name);
            let handle = push(&mut fields, field_name(self.verbose_field_names, text, None), FieldKind::Hoisted);
            by_name.insert(name, handle);
        }

        StateMachineShape {
            fields,
            well_known: WellKnownFields { state, builder, self_boxed },
            this_field,
            by_name,
            awaiter_by_state,
            is_async: self.analysis.is_async,
            is_generator: self.analysis.is_generator,
        }
    }
}

fn push(fields: &mut Vec<FieldInfo>, name: String, kind: FieldKind) -> FieldHandle {
    let handle = FieldHandle(fields.len() as u32);
    fields.push(FieldInfo { name, kind });
    handle
}

fn field_name(verbose: bool, label: &str, suffix: Option<u32>) -> String {
    match (verbose, suffix) {
        (true, Some(n)) => format!("<{label}>5__{n}"),
        (true, None) => format!("<{label}>5__"),
        (false, Some(n)) => format!("{label}{n}"),
        (false, None) => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AwaitPointAnalyzer;
    use sharpts_ast::{DeclKind, Expr, ExprKind, FunctionDecl, Literal, NodeIdGen, Stmt, StmtKind, VarDeclarator};
    use sharpts_common::{Interner, Span};

    fn dummy_span() -> Span {
        Span::dummy()
    }

    #[test]
    fn hoisted_field_is_addressable_by_name() {
        let gen = NodeIdGen::new();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let promise_resolve = interner.intern("Promise.resolve");

        let decl_stmt = Stmt::new(
            gen.next(),
            dummy_span(),
            StmtKind::Var {
                kind: DeclKind::Let,
                declarations: vec![VarDeclarator {
                    name: x,
                    declared_type: None,
                    initializer: Some(Expr::new(gen.next(), dummy_span(), ExprKind::Literal(Literal::Number(1.0)))),
                }],
            },
        );
        let await_stmt = Stmt::new(
            gen.next(),
            dummy_span(),
            StmtKind::Expression(Expr::new(
                gen.next(),
                dummy_span(),
                ExprKind::Await(Box::new(Expr::new(gen.next(), dummy_span(), ExprKind::Variable(promise_resolve)))),
            )),
        );
        let use_stmt = Stmt::new(gen.next(), dummy_span(), StmtKind::Return(Some(Expr::new(gen.next(), dummy_span(), ExprKind::Variable(x)))));

        let function = FunctionDecl {
            name: None,
            params: vec![],
            return_type: None,
            body: vec![decl_stmt, await_stmt, use_stmt],
            is_async: true,
            is_generator: false,
            is_arrow: false,
            has_concise_body: false,
        };

        let analysis = AwaitPointAnalyzer::new(false).analyze(&function).unwrap();
        let shape = StateMachineBuilder::new(&analysis, &interner, true).build();

        assert!(shape.variable_field(x).is_some());
        assert_eq!(shape.awaiter_field(0).0, shape.awaiter_field(0).0);
        assert!(shape.this_field().is_none());
        assert_eq!(shape.field_count(), 5); // state, builder, self_boxed, awaiter_0, x
    }

    #[test]
    fn method_hoists_this_field() {
        let mut interner = Interner::new();
        let function = FunctionDecl {
            name: None,
            params: vec![],
            return_type: None,
            body: vec![],
            is_async: true,
            is_generator: false,
            is_arrow: false,
            has_concise_body: false,
        };
        let analysis = AwaitPointAnalyzer::new(true).analyze(&function).unwrap();
        let shape = StateMachineBuilder::new(&analysis, &interner, false).build();
        assert!(shape.this_field().is_some());
        let _ = &mut interner;
    }

    #[test]
    fn field_order_is_deterministic_regardless_of_hash_iteration() {
        let gen = NodeIdGen::new();
        let mut interner = Interner::new();
        let a = interner.intern("alpha");
        let b = interner.intern("beta");
        let promise_resolve = interner.intern("Promise.resolve");

        let mk_var = |name: Atom| {
            Stmt::new(
                gen.next(),
                dummy_span(),
                StmtKind::Var {
                    kind: DeclKind::Let,
                    declarations: vec![VarDeclarator { name, declared_type: None, initializer: None }],
                },
            )
        };
        let await_stmt = Stmt::new(
            gen.next(),
            dummy_span(),
            StmtKind::Expression(Expr::new(
                gen.next(),
                dummy_span(),
                ExprKind::Await(Box::new(Expr::new(gen.next(), dummy_span(), ExprKind::Variable(promise_resolve)))),
            )),
        );
        let use_a = Stmt::new(gen.next(), dummy_span(), StmtKind::Expression(Expr::new(gen.next(), dummy_span(), ExprKind::Variable(a))));
        let use_b = Stmt::new(gen.next(), dummy_span(), StmtKind::Expression(Expr::new(gen.next(), dummy_span(), ExprKind::Variable(b))));

        let function = FunctionDecl {
            name: None,
            params: vec![],
            return_type: None,
            body: vec![mk_var(a), mk_var(b), await_stmt, use_a, use_b],
            is_async: true,
            is_generator: false,
            is_arrow: false,
            has_concise_body: false,
        };

        let analysis = AwaitPointAnalyzer::new(false).analyze(&function).unwrap();
        let shape1 = StateMachineBuilder::new(&analysis, &interner, false).build();
        let shape2 = StateMachineBuilder::new(&analysis, &interner, false).build();

        let names1: Vec<_> = shape1.fields().map(|(_, info)| info.name.clone()).collect();
        let names2: Vec<_> = shape2.fields().map(|(_, info)| info.name.clone()).collect();
        assert_eq!(names1, names2);
    }
}
