//! The Await-Point Analyzer (C3, spec.md §4.1).
//!
//! A single recursive traversal over a function body that (i) numbers
//! every suspension point in source order and (ii) computes a
//! conservative over-approximation of which variables must be hoisted
//! into the state-machine record because they are live across at least
//! one suspension.
//!
//! SPEC_FULL.md §D.1 fixes the open question on hoisting precision: we
//! implement the textual over-approximation exactly as spec.md
//! prescribes ("a variable is hoisted iff it has at least one use... after
//! an `Await`... and at least one definition or use earlier, OR it is a
//! formal parameter"), not a reachability-based liveness analysis. A
//! production implementation could tighten this to path-sensitive
//! liveness; hoisting extra variables is merely wasteful, never unsound.

use rustc_hash::{FxHashMap, FxHashSet};
use sharpts_ast::{Expr, ExprKind, FunctionDecl, Param, Stmt, StmtKind};
use sharpts_common::{Atom, diagnostics::diagnostic_codes, limits};
use tracing::instrument;

use crate::suspension::{SuspensionKind, SuspensionPoint};

/// The result of analyzing one `async`/generator function body.
#[derive(Debug, Default)]
pub struct AsyncAnalysis {
    pub suspension_points: Vec<SuspensionPoint>,
    /// Variables (by name) that must be lifted into the state-machine
    /// record. Always a superset of the function's own parameter names.
    pub hoisted_vars: FxHashSet<Atom>,
    /// Whether `this` must be hoisted (true when the function is a
    /// method, i.e. not a free function and not a non-hoisting arrow —
    /// arrows inherit the enclosing activation's `this` field instead,
    /// see SPEC_FULL.md §C "Arrow-function lexical capture").
    pub hoists_this: bool,
    pub is_async: bool,
    pub is_generator: bool,
}

impl AsyncAnalysis {
    #[must_use]
    pub fn suspension_count(&self) -> usize {
        self.suspension_points.len()
    }
}

/// One occurrence (definition or use) of a variable, recorded as a
/// textual position in the pre-order traversal.
#[derive(Debug, Default)]
struct Occurrences {
    min: u32,
    max: u32,
}

pub struct AwaitPointAnalyzer {
    position: u32,
    next_state: u32,
    suspensions: Vec<SuspensionRecord>,
    occurrences: FxHashMap<Atom, Occurrences>,
    is_method: bool,
}

impl AwaitPointAnalyzer {
    #[must_use]
    pub fn new(is_method: bool) -> Self {
        Self { position: 0, next_state: 0, suspensions: Vec::new(), occurrences: FxHashMap::default(), is_method }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn analyze(mut self, function: &FunctionDecl) -> Result<AsyncAnalysis, CompileError> {
        for param in &function.params {
            self.record_param(param);
        }
        for stmt in &function.body {
            self.walk_stmt(stmt)?;
        }

        if self.suspensions.len() as u32 > limits::MAX_SUSPENSION_POINTS {
            return Err(CompileError::new(
                diagnostic_codes::TOO_MANY_SUSPENSION_POINTS,
                self.suspensions.len().to_string(),
            ));
        }

        let mut hoisted: FxHashSet<Atom> = FxHashSet::default();
        for param in &function.params {
            hoisted.insert(param.name);
        }

        let suspension_positions: Vec<u32> = self.suspensions.iter().map(|s| s.position_hint).collect();
        for (name, occ) in &self.occurrences {
            if occ.min == occ.max {
                continue;
            }
            if suspension_positions.iter().any(|&s| occ.min < s && s < occ.max) {
                hoisted.insert(*name);
            }
        }

        if hoisted.len() as u32 + u32::from(self.is_method) > limits::MAX_HOISTED_FIELDS {
            return Err(CompileError::new(diagnostic_codes::TOO_MANY_HOISTED_FIELDS, hoisted.len().to_string()));
        }

        let is_async = self.suspensions.iter().any(|s| s.kind == SuspensionKind::Await);
        let is_generator = self.suspensions.iter().any(|s| s.kind != SuspensionKind::Await);

        Ok(AsyncAnalysis {
            suspension_points: self.suspensions.into_iter().map(SuspensionPoint::from).collect(),
            hoisted_vars: hoisted,
            hoists_this: self.is_method,
            is_async,
            is_generator,
        })
    }

    fn record_param(&mut self, param: &Param) {
        self.touch(param.name);
        if let Some(default) = &param.default {
            let _ = self.walk_expr(default);
        }
    }

    fn tick(&mut self) -> u32 {
        let p = self.position;
        self.position += 1;
        p
    }

    fn touch(&mut self, name: Atom) {
        let pos = self.tick();
        let entry = self.occurrences.entry(name).or_insert(Occurrences { min: pos, max: pos });
        entry.min = entry.min.min(pos);
        entry.max = entry.max.max(pos);
    }

    fn walk_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        self.tick();
        match &stmt.kind {
            StmtKind::Expression(expr) | StmtKind::Throw(expr) => self.walk_expr(expr),
            StmtKind::Var { declarations, .. } => {
                for decl in declarations {
                    self.touch(decl.name);
                    if let Some(init) = &decl.initializer {
                        self.walk_expr(init)?;
                    }
                }
                Ok(())
            }
            StmtKind::Return(expr) => {
                if let Some(expr) = expr {
                    self.walk_expr(expr)?;
                }
                Ok(())
            }
            StmtKind::If { condition, then_branch, else_branch } => {
                self.walk_expr(condition)?;
                self.walk_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.walk_stmt(else_branch)?;
                }
                Ok(())
            }
            StmtKind::While { condition, body } | StmtKind::DoWhile { body, condition } => {
                self.walk_expr(condition)?;
                self.walk_stmt(body)
            }
            StmtKind::ForIn { binding, right, body, .. } => {
                self.touch(*binding);
                self.walk_expr(right)?;
                self.walk_stmt(body)
            }
            StmtKind::ForOf { binding, right, body, .. } => {
                self.touch(*binding);
                self.walk_expr(right)?;
                self.walk_stmt(body)
            }
            StmtKind::For { init, test, update, body } => {
                if let Some(init) = init {
                    self.walk_stmt(init)?;
                }
                if let Some(test) = test {
                    self.walk_expr(test)?;
                }
                if let Some(update) = update {
                    self.walk_expr(update)?;
                }
                self.walk_stmt(body)
            }
            StmtKind::Block(block) | StmtKind::Sequence(block) => {
                for s in block {
                    self.walk_stmt(s)?;
                }
                Ok(())
            }
            StmtKind::Switch { discriminant, cases } => {
                self.walk_expr(discriminant)?;
                for case in cases {
                    if let Some(test) = &case.test {
                        self.walk_expr(test)?;
                    }
                    for s in &case.body {
                        self.walk_stmt(s)?;
                    }
                }
                Ok(())
            }
            StmtKind::TryCatch { try_block, catch, finally } => {
                for s in try_block {
                    self.walk_stmt(s)?;
                }
                if let Some(catch) = catch {
                    if let Some(param) = catch.param {
                        self.touch(param);
                    }
                    for s in &catch.body {
                        self.walk_stmt(s)?;
                    }
                }
                if let Some(finally) = finally {
                    for s in finally {
                        self.walk_stmt(s)?;
                    }
                }
                Ok(())
            }
            StmtKind::Break(_) | StmtKind::Continue(_) => Ok(()),
            StmtKind::LabeledStatement { body, .. } => self.walk_stmt(body),
            // Nested function/class declarations establish their own
            // activation; a nested non-arrow function's own locals never
            // need hoisting into *this* state machine, so we don't
            // descend into its body — only its own analysis would.
            StmtKind::Class(_) | StmtKind::Function(_) | StmtKind::Field(_) | StmtKind::Accessor(_) => Ok(()),
        }
    }

    fn walk_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        self.tick();
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::This | ExprKind::Super | ExprKind::ImportMeta => Ok(()),
            ExprKind::Variable(name) => {
                self.touch(*name);
                Ok(())
            }
            ExprKind::Assign { target, value } | ExprKind::CompoundAssign { target, value, .. } | ExprKind::LogicalAssign { target, value, .. } => {
                self.walk_expr(target)?;
                self.walk_expr(value)
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } | ExprKind::NullishCoalescing { left, right } => {
                self.walk_expr(left)?;
                self.walk_expr(right)
            }
            ExprKind::Unary { operand, .. } => self.walk_expr(operand),
            ExprKind::Call { callee, args, .. } => {
                self.walk_expr(callee)?;
                for arg in args {
                    self.walk_expr(arg)?;
                }
                Ok(())
            }
            ExprKind::New { callee, args, .. } => {
                self.walk_expr(callee)?;
                for arg in args {
                    self.walk_expr(arg)?;
                }
                Ok(())
            }
            ExprKind::Get { object, .. } => self.walk_expr(object),
            ExprKind::Set { object, value, .. } => {
                self.walk_expr(object)?;
                self.walk_expr(value)
            }
            ExprKind::GetIndex { object, index, .. } => {
                self.walk_expr(object)?;
                self.walk_expr(index)
            }
            ExprKind::SetIndex { object, index, value } => {
                self.walk_expr(object)?;
                self.walk_expr(index)?;
                self.walk_expr(value)
            }
            ExprKind::Grouping(inner) | ExprKind::Spread(inner) | ExprKind::DynamicImport(inner) => self.walk_expr(inner),
            ExprKind::Ternary { condition, then_branch, else_branch } => {
                self.walk_expr(condition)?;
                self.walk_expr(then_branch)?;
                self.walk_expr(else_branch)
            }
            ExprKind::PrefixIncrement { target, .. } | ExprKind::PostfixIncrement { target, .. } => self.walk_expr(target),
            ExprKind::ArrayLiteral(items) => {
                for item in items {
                    self.walk_expr(item)?;
                }
                Ok(())
            }
            ExprKind::ObjectLiteral(props) => {
                for prop in props {
                    if let sharpts_ast::PropertyKey::Computed(key_expr) = &prop.key {
                        self.walk_expr(key_expr)?;
                    }
                    self.walk_expr(&prop.value)?;
                }
                Ok(())
            }
            ExprKind::TemplateLiteral { expressions, .. } => {
                for e in expressions {
                    self.walk_expr(e)?;
                }
                Ok(())
            }
            ExprKind::Await(inner) => {
                self.walk_expr(inner)?;
                self.record_suspension(expr.id, SuspensionKind::Await, false);
                Ok(())
            }
            ExprKind::Yield { argument, delegate } => {
                if let Some(argument) = argument {
                    self.walk_expr(argument)?;
                }
                self.record_suspension(expr.id, SuspensionKind::Yield, *delegate);
                Ok(())
            }
            // An arrow function that captures outer variables by reference
            // (SPEC_FULL.md §C) does not itself introduce occurrences for
            // *this* function's hoisting analysis unless it mentions
            // outer-scope names, which the analyzer can't distinguish
            // from its own locals without a symbol table — conservatively
            // we still walk it so captured outer names get an occurrence
            // recorded, over-hoisting at worst.
            ExprKind::ArrowFunction(inner) => {
                for param in &inner.params {
                    self.record_param(param);
                }
                for s in &inner.body {
                    self.walk_stmt(s)?;
                }
                Ok(())
            }
            ExprKind::TypeAssertion { expr, .. } => self.walk_expr(expr),
        }
    }

    fn record_suspension(&mut self, node: sharpts_ast::NodeId, kind: SuspensionKind, is_delegating: bool) {
        let position_hint = self.tick();
        let state = self.next_state;
        self.next_state += 1;
        self.suspensions.push(SuspensionRecord { node, state, kind, is_delegating, position_hint });
    }
}

/// Internal pre-`SuspensionPoint` record carrying the textual position
/// used only for hoisting analysis; `SuspensionPoint` itself (the public
/// output) doesn't need the position once hoisting is computed.
struct SuspensionRecord {
    node: sharpts_ast::NodeId,
    state: u32,
    kind: SuspensionKind,
    is_delegating: bool,
    position_hint: u32,
}

impl From<SuspensionRecord> for SuspensionPoint {
    fn from(r: SuspensionRecord) -> Self {
        SuspensionPoint { node: r.node, state: r.state, kind: r.kind, is_delegating: r.is_delegating }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    pub code: u32,
    pub message: String,
}

impl CompileError {
    fn new(code: u32, arg: String) -> Self {
        let message = sharpts_common::diagnostics::format_message(
            sharpts_common::diagnostics::get_diagnostic_message(code).map(|m| m.message).unwrap_or("error {0}"),
            &[&arg],
        );
        Self { code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpts_ast::{DeclKind, Literal, NodeIdGen, Param, VarDeclarator};
    use sharpts_common::{Interner, Span};

    fn dummy_span() -> Span {
        Span::dummy()
    }

    #[test]
    fn parameters_are_always_hoisted() {
        let mut interner = Interner::new();
        let x = interner.intern("x");

        let function = FunctionDecl {
            name: None,
            params: vec![Param { name: x, span: dummy_span(), declared_type: None, default: None, is_rest: false, decorators: vec![] }],
            return_type: None,
            body: vec![],
            is_async: true,
            is_generator: false,
            is_arrow: false,
            has_concise_body: false,
        };

        let analysis = AwaitPointAnalyzer::new(false).analyze(&function).unwrap();
        assert!(analysis.hoisted_vars.contains(&x));
    }

    #[test]
    fn variable_used_across_await_is_hoisted() {
        let gen = NodeIdGen::new();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let promise_resolve = interner.intern("Promise.resolve");

        // let x = 1; await Promise.resolve(0); console.log(x);
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
        let use_stmt = Stmt::new(
            gen.next(),
            dummy_span(),
            StmtKind::Return(Some(Expr::new(gen.next(), dummy_span(), ExprKind::Variable(x)))),
        );

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
        assert_eq!(analysis.suspension_count(), 1);
        assert!(analysis.hoisted_vars.contains(&x));
        assert_eq!(analysis.suspension_points[0].kind, SuspensionKind::Await);
    }
}
