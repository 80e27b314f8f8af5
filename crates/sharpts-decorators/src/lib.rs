//! The Decorator Applier (C7, spec.md §4.6).
//!
//! This crate does not execute decorators (that is the runtime/interpreter
//! collaborator's job, per spec.md §1) — it computes the **application
//! plan**: the exact ordered sequence of decorator-call steps the emitter
//! (C6, in `sharpts-emitter`) must turn into bytecode so that calling the
//! generated program reproduces §4.6's ordering exactly, for both the
//! `Legacy` and `Stage3` ABIs (§6 "Decorator ABI").
//!
//! Keeping this as a pure AST → plan transformation (§9 "Decorator
//! application: implement as a pure transformation... avoid dynamic
//! proxies") is what lets the emitter consume it without this crate ever
//! needing to know anything about bytecode, stack types, or IL.

use sharpts_ast::{AccessorMember, ClassDecl, ClassMember, Expr, ExprKind, FieldMember, MethodMember, Param};
use sharpts_common::{CompileOptions, DecoratorMode, diagnostics::diagnostic_codes, limits};
use tracing::instrument;

/// One step of the application plan, in the exact order the emitter must
/// emit calls for (§4.6's five ordered phases).
#[derive(Debug, Clone)]
pub enum DecoratorStep<'a> {
    /// Phase 1, Legacy only, inner-to-outer per parameter: `decorator(target, propertyKey, parameterIndex)`.
    Parameter { decorator: &'a Expr, method_index: usize, parameter_index: usize },
    /// Phase 2: method decorators, outer-to-inner within one method and
    /// bottom-to-top across methods.
    Method { decorator: &'a Expr, method_index: usize },
    /// Phase 3: accessor decorators, same ordering rule as methods.
    Accessor { decorator: &'a Expr, accessor_index: usize },
    /// Phase 4: field decorators, bottom-to-top.
    Field { decorator: &'a Expr, field_index: usize },
    /// Phase 5: class decorators, right-to-left (i.e. `d3(d2(d1(C)))`
    /// when written `@d1 @d2 @d3 class C {}` — "right-to-left" refers to
    /// source order left-to-right producing innermost-first application,
    /// equivalently last-written-decorator-applies-first).
    Class { decorator: &'a Expr },
}

/// The full, ordered application plan for one class.
#[derive(Debug, Default)]
pub struct DecoratorPlan<'a> {
    pub steps: Vec<DecoratorStep<'a>>,
    pub mode: DecoratorMode,
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DecoratorError {
    pub code: u32,
    pub message: String,
}

impl DecoratorError {
    fn not_callable(expr: &Expr) -> Self {
        let text = describe_decorator_expr(expr);
        let message = sharpts_common::diagnostics::format_message(
            sharpts_common::diagnostics::get_diagnostic_message(diagnostic_codes::DECORATOR_NOT_CALLABLE)
                .map(|m| m.message)
                .unwrap_or("decorator '{0}' is not callable"),
            &[&text],
        );
        Self { code: diagnostic_codes::DECORATOR_NOT_CALLABLE, message }
    }

    fn chain_too_long(class_name: &str) -> Self {
        let message = sharpts_common::diagnostics::format_message(
            sharpts_common::diagnostics::get_diagnostic_message(diagnostic_codes::DECORATOR_CHAIN_TOO_LONG)
                .map(|m| m.message)
                .unwrap_or("decorator chain on '{0}' is too long"),
            &[class_name],
        );
        Self { code: diagnostic_codes::DECORATOR_CHAIN_TOO_LONG, message }
    }
}

/// §4.6 "Factory decorators (`@d(arg)`) are recognized by the call-
/// expression being the decorator expression; the call's value is the
/// decorator itself." A non-factory decorator is any other expression
/// (an identifier, a member access) evaluated directly.
#[must_use]
pub fn is_factory_decorator(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Call { .. })
}

/// The callable value a decorator expression evaluates to for emission
/// purposes: for a factory, the callee of the call (the thing invoked to
/// *produce* the decorator); otherwise the expression itself.
#[must_use]
pub fn decorator_callee(expr: &Expr) -> &Expr {
    match &expr.kind {
        ExprKind::Call { callee, .. } => callee,
        _ => expr,
    }
}

fn describe_decorator_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Variable(_) => "<decorator>".to_string(),
        ExprKind::Call { .. } => "<decorator factory>".to_string(),
        _ => "<expression>".to_string(),
    }
}

/// Rejects decorator expressions that can never be callable regardless of
/// runtime value (§4.6 "Failure": non-callable decorator expressions).
/// This is a syntactic pre-check; most non-callability is only detectable
/// by the checker (out of scope here) via the expression's static type —
/// this function only catches the shapes that are never callable no
/// matter what they evaluate to (literals).
fn reject_obviously_uncallable(expr: &Expr) -> Result<(), DecoratorError> {
    if matches!(expr.kind, ExprKind::Literal(_) | ExprKind::ArrayLiteral(_) | ExprKind::ObjectLiteral(_)) {
        return Err(DecoratorError::not_callable(expr));
    }
    Ok(())
}

/// Builds the ordered application plan for `class` under `options.decorator_mode`.
#[instrument(level = "debug", skip_all)]
pub fn plan_class_decorators<'a>(
    class: &'a ClassDecl,
    options: &CompileOptions,
    interner: &sharpts_common::Interner,
) -> Result<DecoratorPlan<'a>, DecoratorError> {
    let mut steps = Vec::new();
    let class_name = class.name.map(|n| interner.resolve(n)).unwrap_or("<anonymous>");

    if class.decorators.len() as u32 > limits::MAX_DECORATOR_CHAIN_LENGTH {
        return Err(DecoratorError::chain_too_long(class_name));
    }

    // Phase 1: legacy parameter decorators, inner-to-outer within each
    // constructor/method's parameter list. "Inner-to-outer" for parameters
    // means last-parameter-first within one method (mirrors the legacy
    // `__param` helper's emission order: it's generated in reverse so the
    // innermost (highest-index) parameter's decorator actually executes
    // first at runtime).
    if options.decorator_mode == DecoratorMode::Legacy {
        for (method_index, member) in class.members.iter().enumerate() {
            if let ClassMember::Method(method) = member {
                plan_parameter_decorators(&method.function.params, method_index, &mut steps)?;
            }
        }
    }

    // Phase 2: method decorators — outer-to-inner within one method
    // (the method's own decorator list is applied in the written order,
    // first-listed decorator wraps the result of later-listed ones, i.e.
    // evaluated outer first), bottom-to-top across methods (later members
    // in source order are applied before earlier ones).
    for (method_index, member) in class.members.iter().enumerate().rev() {
        if let ClassMember::Method(method) = member {
            plan_method_decorators(method, method_index, &mut steps)?;
        }
    }

    // Phase 3: accessor decorators, same ordering rule as methods.
    for (accessor_index, member) in class.members.iter().enumerate().rev() {
        if let ClassMember::Accessor(accessor) = member {
            plan_accessor_decorators(accessor, accessor_index, &mut steps)?;
        }
    }

    // Phase 4: field decorators, bottom-to-top.
    for (field_index, member) in class.members.iter().enumerate().rev() {
        if let ClassMember::Field(field) = member {
            plan_field_decorators(field, field_index, &mut steps)?;
        }
    }

    // Phase 5: class decorators, right-to-left — `@d1 @d2 @d3 class C {}`
    // applies as `d1(d2(d3(C)))`... but spec.md §8's testable property
    // states the emitted order for `[d1, d2, d3]` is `d3(d2(d1(C)))`,
    // i.e. the *last-written* decorator's call wraps innermost and the
    // *first-written* one's call is the outermost/last-applied. We walk
    // source order forward and each step's callee wraps the previous
    // result, which reproduces `d3(d2(d1(C)))` when steps are applied in
    // emission order d1, d2, d3 (each replacing the running class value).
    for decorator in &class.decorators {
        reject_obviously_uncallable(decorator)?;
        steps.push(DecoratorStep::Class { decorator });
    }

    Ok(DecoratorPlan { steps, mode: options.decorator_mode })
}

fn plan_parameter_decorators<'a>(
    params: &'a [Param],
    method_index: usize,
    steps: &mut Vec<DecoratorStep<'a>>,
) -> Result<(), DecoratorError> {
    for (parameter_index, param) in params.iter().enumerate().rev() {
        for decorator in param.decorators.iter().rev() {
            reject_obviously_uncallable(decorator)?;
            steps.push(DecoratorStep::Parameter { decorator, method_index, parameter_index });
        }
    }
    Ok(())
}

fn plan_method_decorators<'a>(
    method: &'a MethodMember,
    method_index: usize,
    steps: &mut Vec<DecoratorStep<'a>>,
) -> Result<(), DecoratorError> {
    if method.decorators.len() as u32 > limits::MAX_DECORATOR_CHAIN_LENGTH {
        return Err(DecoratorError::chain_too_long("<method>"));
    }
    for decorator in &method.decorators {
        reject_obviously_uncallable(decorator)?;
        steps.push(DecoratorStep::Method { decorator, method_index });
    }
    Ok(())
}

fn plan_accessor_decorators<'a>(
    accessor: &'a AccessorMember,
    accessor_index: usize,
    steps: &mut Vec<DecoratorStep<'a>>,
) -> Result<(), DecoratorError> {
    for decorator in &accessor.decorators {
        reject_obviously_uncallable(decorator)?;
        steps.push(DecoratorStep::Accessor { decorator, accessor_index });
    }
    Ok(())
}

fn plan_field_decorators<'a>(
    field: &'a FieldMember,
    field_index: usize,
    steps: &mut Vec<DecoratorStep<'a>>,
) -> Result<(), DecoratorError> {
    for decorator in &field.decorators {
        reject_obviously_uncallable(decorator)?;
        steps.push(DecoratorStep::Field { decorator, field_index });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpts_ast::{Block, ExprKind, Literal, MethodKind, NodeIdGen, PropertyKey};
    use sharpts_common::{Interner, Span};

    fn dummy_span() -> Span {
        Span::dummy()
    }

    fn ident(gen: &NodeIdGen, name: sharpts_common::Atom) -> Expr {
        Expr::new(gen.next(), dummy_span(), ExprKind::Variable(name))
    }

    #[test]
    fn class_decorator_order_matches_d3_d2_d1() {
        let gen = NodeIdGen::new();
        let mut interner = Interner::new();
        let d1 = interner.intern("d1");
        let d2 = interner.intern("d2");
        let d3 = interner.intern("d3");

        let class = ClassDecl {
            name: Some(interner.intern("C")),
            superclass: None,
            members: vec![],
            decorators: vec![ident(&gen, d1), ident(&gen, d2), ident(&gen, d3)],
            is_abstract: false,
        };

        let options = CompileOptions::default();
        let plan = plan_class_decorators(&class, &options, &interner).unwrap();
        assert_eq!(plan.steps.len(), 3);
        // Steps are emitted d1, d2, d3 in that order, which the emitter
        // turns into d3(d2(d1(C))) by threading each step's result as the
        // next step's class-value input (the last-emitted step's call is
        // therefore the outermost one applied to the *current* value, but
        // it's the first decorator's call result that's consumed last).
        let names: Vec<_> = plan
            .steps
            .iter()
            .map(|s| match s {
                DecoratorStep::Class { decorator } => match &decorator.kind {
                    ExprKind::Variable(a) => interner.resolve(*a).to_string(),
                    _ => unreachable!(),
                },
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn method_decorators_are_bottom_to_top_across_methods() {
        let gen = NodeIdGen::new();
        let mut interner = Interner::new();
        let dec_a = interner.intern("decA");
        let dec_b = interner.intern("decB");
        let m_name = interner.intern("m");

        let make_method = |decorators: Vec<Expr>| {
            ClassMember::Method(MethodMember {
                key: PropertyKey::Identifier(m_name),
                is_static: false,
                is_abstract: false,
                kind: MethodKind::Method,
                function: sharpts_ast::FunctionDecl {
                    name: None,
                    params: vec![],
                    return_type: None,
                    body: Block::new(),
                    is_async: false,
                    is_generator: false,
                    is_arrow: false,
                    has_concise_body: false,
                },
                decorators,
            })
        };

        let class = ClassDecl {
            name: Some(interner.intern("C")),
            superclass: None,
            members: vec![make_method(vec![ident(&gen, dec_a)]), make_method(vec![ident(&gen, dec_b)])],
            decorators: vec![],
            is_abstract: false,
        };

        let options = CompileOptions::default();
        let plan = plan_class_decorators(&class, &options, &interner).unwrap();
        let indices: Vec<_> = plan
            .steps
            .iter()
            .map(|s| match s {
                DecoratorStep::Method { method_index, .. } => *method_index,
                _ => unreachable!(),
            })
            .collect();
        // Second method (index 1) applied before the first (index 0).
        assert_eq!(indices, vec![1, 0]);
    }

    #[test]
    fn literal_decorator_is_rejected() {
        let gen = NodeIdGen::new();
        let interner = Interner::new();
        let literal = Expr::new(gen.next(), dummy_span(), ExprKind::Literal(Literal::Number(1.0)));
        let class = ClassDecl { name: None, superclass: None, members: vec![], decorators: vec![literal], is_abstract: false };
        let options = CompileOptions::default();
        let err = plan_class_decorators(&class, &options, &interner).unwrap_err();
        assert_eq!(err.code, diagnostic_codes::DECORATOR_NOT_CALLABLE);
    }

    #[test]
    fn factory_decorator_recognized_by_call_shape() {
        let gen = NodeIdGen::new();
        let mut interner = Interner::new();
        let d = interner.intern("d");
        let factory = Expr::new(gen.next(), dummy_span(), ExprKind::Call { callee: Box::new(ident(&gen, d)), type_args: vec![], args: vec![], optional: false });
        assert!(is_factory_decorator(&factory));
        assert!(!is_factory_decorator(&ident(&gen, d)));
    }
}
