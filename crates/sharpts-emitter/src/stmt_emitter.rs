//! The statement half of C6, plus the `TryCatch` lowering that §4.3 calls
//! "the hardest part": simple mode when no suspension is reachable inside
//! a `try`, complex mode (segmented protected regions plus the
//! `caught_exception`/`pending_return`/`after_finally` bookkeeping) when
//! one is.

use sharpts_ast::{Block, CatchClause, Expr, ExprKind, Stmt, StmtKind, SwitchCase};
use sharpts_common::diagnostics::diagnostic_codes;
use sharpts_common::Atom;

use crate::emit_context::{ComplexTryFrame, EmitError, LabelFrame, LoopLabels};
use crate::function_emitter::FunctionEmitter;
use crate::il::{CompareOp, FieldRef, Instr, Label, LocalHandle, MetadataToken, StackType};
use crate::move_next;

pub fn emit_block(emitter: &mut FunctionEmitter, block: &Block) -> Result<(), EmitError> {
    for stmt in block {
        emit_stmt(emitter, stmt)?;
    }
    Ok(())
}

pub fn emit_stmt(emitter: &mut FunctionEmitter, stmt: &Stmt) -> Result<(), EmitError> {
    match &stmt.kind {
        StmtKind::Expression(expr) => {
            emitter.emit_expr(expr)?;
            emitter.body.emit(Instr::Pop);
            Ok(())
        }
        StmtKind::Var { declarations, .. } => emit_var_declarations(emitter, declarations),
        StmtKind::Return(expr) => emit_return(emitter, expr.as_ref()),
        StmtKind::If { condition, then_branch, else_branch } => emit_if(emitter, condition, then_branch, else_branch.as_deref()),
        StmtKind::While { condition, body } => emit_while(emitter, condition, body),
        StmtKind::DoWhile { body, condition } => emit_do_while(emitter, body, condition),
        StmtKind::ForIn { binding, right, body, .. } => emit_for_in(emitter, *binding, right, body),
        StmtKind::ForOf { binding, right, body, is_await, .. } => emit_for_of(emitter, *binding, right, body, *is_await),
        StmtKind::For { init, test, update, body } => emit_for(emitter, init.as_deref(), test.as_ref(), update.as_ref(), body),
        StmtKind::Block(block) => emit_block(emitter, block),
        StmtKind::Sequence(stmts) => emit_block(emitter, stmts),
        StmtKind::Throw(expr) => emit_throw(emitter, expr),
        StmtKind::Switch { discriminant, cases } => emit_switch(emitter, discriminant, cases),
        StmtKind::TryCatch { try_block, catch, finally } => emit_try(emitter, try_block, catch.as_ref(), finally.as_deref()),
        StmtKind::Break(label) => emit_break(emitter, *label),
        StmtKind::Continue(label) => emit_continue(emitter, *label),
        StmtKind::LabeledStatement { label, body } => emit_labeled(emitter, *label, body),
        // A nested class/function/field/accessor declaration establishes
        // its own activation and is hoisted to the module's function
        // table by the name-resolution pass that runs ahead of this
        // emitter (out of scope here, mirroring the async analyzer's own
        // refusal to descend into these nodes — see `sharpts_async::analyzer`).
        StmtKind::Class(_) | StmtKind::Function(_) | StmtKind::Field(_) | StmtKind::Accessor(_) => Ok(()),
    }
}

fn emit_var_declarations(emitter: &mut FunctionEmitter, declarations: &[sharpts_ast::VarDeclarator]) -> Result<(), EmitError> {
    for decl in declarations {
        match &decl.initializer {
            Some(init) => {
                emitter.emit_expr(init)?;
                emitter.ensure_boxed();
            }
            None => emitter.body.emit(Instr::LdUndefined),
        }
        store_binding(emitter, decl.name);
    }
    Ok(())
}

/// Stores the value on top of the stack into `name`'s slot: a
/// state-machine field if the async analyzer hoisted it, otherwise a
/// fresh local declared here (the first declaration site of a plain
/// local owns its slot for the rest of the function).
fn store_binding(emitter: &mut FunctionEmitter, name: Atom) {
    match emitter.scope.resolve(name) {
        Some(crate::emit_context::VariableSlot::Hoisted(handle)) => {
            emitter.body.emit(Instr::StFld(FieldRef::StateMachine(handle)));
        }
        Some(crate::emit_context::VariableSlot::Local(handle)) => {
            emitter.body.emit(Instr::StLoc(handle));
        }
        None => {
            let handle = emitter.declare_local(name, StackType::Unknown);
            emitter.body.emit(Instr::StLoc(handle));
        }
    }
}

/// §4.3 "deferred return across finally": a `return` inside a `MoveNext`
/// either completes immediately (`emit_completion`/`SET_RESULT`) or, when
/// it's nested inside a complex try whose `finally` itself suspends,
/// stashes the value and defers completion until after that `finally`
/// runs (`pending_return`).
fn emit_return(emitter: &mut FunctionEmitter, expr: Option<&Expr>) -> Result<(), EmitError> {
    if emitter.shape.is_none() {
        return match expr {
            Some(e) => {
                emitter.emit_expr(e)?;
                emitter.ensure_boxed();
                emitter.body.emit(Instr::Ret);
                Ok(())
            }
            None => {
                emitter.body.emit(Instr::RetVoid);
                Ok(())
            }
        };
    }

    match expr {
        Some(e) => {
            emitter.emit_expr(e)?;
            emitter.ensure_boxed();
        }
        None => emitter.body.emit(Instr::LdUndefined),
    }

    if let Some(frame) = emitter.try_stack.innermost() {
        if let (Some(pending_return), Some(after_finally)) = (frame.pending_return, frame.after_finally) {
            let return_slot = emitter.return_slot();
            emitter.body.emit(Instr::StLoc(return_slot));
            emitter.body.emit(Instr::LdTrue);
            emitter.body.emit(Instr::StLoc(pending_return));
            emitter.body.emit(Instr::Leave(after_finally));
            return Ok(());
        }
    }
    move_next::emit_completion(emitter, true)
}

fn emit_throw(emitter: &mut FunctionEmitter, expr: &Expr) -> Result<(), EmitError> {
    emitter.emit_expr(expr)?;
    emitter.ensure_boxed();
    emitter.body.emit(Instr::CallHelper("WrapException".to_string(), 1));
    emitter.body.emit(Instr::Throw);
    Ok(())
}

fn emit_if(emitter: &mut FunctionEmitter, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> Result<(), EmitError> {
    emitter.emit_expr(condition)?;
    emitter.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1));
    let else_label = emitter.body.new_label();
    emitter.body.emit(Instr::BrFalse(else_label));
    emit_stmt(emitter, then_branch)?;
    match else_branch {
        Some(else_branch) => {
            let end_label = emitter.body.new_label();
            emitter.body.emit(Instr::Br(end_label));
            emitter.body.mark_label(else_label);
            emit_stmt(emitter, else_branch)?;
            emitter.body.mark_label(end_label);
        }
        None => emitter.body.mark_label(else_label),
    }
    Ok(())
}

/// Branches to `target` with `leave` when lexically nested inside a
/// complex-try's segmented protected regions, `br` otherwise — `leave` is
/// always valid from inside a `.try` block and is what crossing one of our
/// segment boundaries requires; outside of any, a plain branch suffices.
fn emit_exit(emitter: &mut FunctionEmitter, target: Label) {
    if emitter.try_stack.depth() > 0 {
        emitter.body.emit(Instr::Leave(target));
    } else {
        emitter.body.emit(Instr::Br(target));
    }
}

fn emit_while(emitter: &mut FunctionEmitter, condition: &Expr, body: &Stmt) -> Result<(), EmitError> {
    let name = emitter.take_pending_label();
    let continue_label = emitter.body.new_label();
    let break_label = emitter.body.new_label();
    emitter.labels.push_loop(LoopLabels { break_label, continue_label, name })?;

    emitter.body.mark_label(continue_label);
    emitter.emit_expr(condition)?;
    emitter.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1));
    emitter.body.emit(Instr::BrFalse(break_label));
    emit_stmt(emitter, body)?;
    emit_exit(emitter, continue_label);
    emitter.body.mark_label(break_label);

    emitter.labels.pop();
    Ok(())
}

fn emit_do_while(emitter: &mut FunctionEmitter, body: &Stmt, condition: &Expr) -> Result<(), EmitError> {
    let name = emitter.take_pending_label();
    let body_start = emitter.body.new_label();
    let continue_label = emitter.body.new_label();
    let break_label = emitter.body.new_label();
    emitter.labels.push_loop(LoopLabels { break_label, continue_label, name })?;

    emitter.body.mark_label(body_start);
    emit_stmt(emitter, body)?;
    emitter.body.mark_label(continue_label);
    emitter.emit_expr(condition)?;
    emitter.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1));
    emitter.body.emit(Instr::BrTrue(body_start));
    emitter.body.mark_label(break_label);

    emitter.labels.pop();
    Ok(())
}

fn emit_for(
    emitter: &mut FunctionEmitter,
    init: Option<&Stmt>,
    test: Option<&Expr>,
    update: Option<&Expr>,
    body: &Stmt,
) -> Result<(), EmitError> {
    let name = emitter.take_pending_label();
    if let Some(init) = init {
        emit_stmt(emitter, init)?;
    }
    let test_label = emitter.body.new_label();
    let continue_label = emitter.body.new_label();
    let break_label = emitter.body.new_label();
    emitter.labels.push_loop(LoopLabels { break_label, continue_label, name })?;

    emitter.body.mark_label(test_label);
    if let Some(test) = test {
        emitter.emit_expr(test)?;
        emitter.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1));
        emitter.body.emit(Instr::BrFalse(break_label));
    }
    emit_stmt(emitter, body)?;
    emitter.body.mark_label(continue_label);
    if let Some(update) = update {
        emitter.emit_expr(update)?;
        emitter.body.emit(Instr::Pop);
    }
    emit_exit(emitter, test_label);
    emitter.body.mark_label(break_label);

    emitter.labels.pop();
    Ok(())
}

fn emit_for_in(emitter: &mut FunctionEmitter, binding: Atom, right: &Expr, body: &Stmt) -> Result<(), EmitError> {
    let name = emitter.take_pending_label();
    emitter.emit_expr(right)?;
    emitter.body.emit(Instr::CallHelper("ForInKeys".to_string(), 1));
    let iter = emitter.body.new_local(StackType::Unknown);
    emitter.body.emit(Instr::StLoc(iter));

    let test_label = emitter.body.new_label();
    let continue_label = emitter.body.new_label();
    let break_label = emitter.body.new_label();
    emitter.labels.push_loop(LoopLabels { break_label, continue_label, name })?;

    emitter.body.mark_label(test_label);
    emitter.body.emit(Instr::LdLoc(iter));
    emitter.body.emit(Instr::CallHelper("IteratorHasNext".to_string(), 1));
    emitter.body.emit(Instr::BrFalse(break_label));
    emitter.body.emit(Instr::LdLoc(iter));
    emitter.body.emit(Instr::CallHelper("IteratorNext".to_string(), 1));
    store_binding(emitter, binding);
    emit_stmt(emitter, body)?;
    emitter.body.mark_label(continue_label);
    emit_exit(emitter, test_label);
    emitter.body.mark_label(break_label);

    emitter.labels.pop();
    Ok(())
}

/// `for (const x of expr)`; `is_await` is set for `for await (const x of
/// expr)`, which awaits each iterator-result promise before inspecting it.
fn emit_for_of(emitter: &mut FunctionEmitter, binding: Atom, right: &Expr, body: &Stmt, is_await: bool) -> Result<(), EmitError> {
    let name = emitter.take_pending_label();
    emitter.emit_expr(right)?;
    let get_iterator_helper = if is_await { "GetAsyncIterator" } else { "GetIterator" };
    emitter.body.emit(Instr::CallHelper(get_iterator_helper.to_string(), 1));
    let iter = emitter.body.new_local(StackType::Unknown);
    emitter.body.emit(Instr::StLoc(iter));

    let test_label = emitter.body.new_label();
    let continue_label = emitter.body.new_label();
    let break_label = emitter.body.new_label();
    emitter.labels.push_loop(LoopLabels { break_label, continue_label, name })?;

    emitter.body.mark_label(test_label);
    emitter.body.emit(Instr::LdLoc(iter));
    emitter.body.emit(Instr::CallHelper("IteratorNext".to_string(), 1));
    if is_await {
        if !emitter.flags.in_async {
            return Err(EmitError::new(diagnostic_codes::UNSUPPORTED_CONSTRUCT, &["'for await' outside an async function"]));
        }
        emitter.ensure_boxed();
        move_next::emit_suspension_point(emitter)?;
    }
    emitter.body.emit(Instr::Dup);
    emitter.body.emit(Instr::CallHelper("IteratorResultDone".to_string(), 1));
    emitter.body.emit(Instr::BrTrue(break_label));
    emitter.body.emit(Instr::Dup);
    emitter.body.emit(Instr::CallHelper("IteratorResultValue".to_string(), 1));
    store_binding(emitter, binding);
    emitter.body.emit(Instr::Pop);
    emit_stmt(emitter, body)?;
    emitter.body.mark_label(continue_label);
    emit_exit(emitter, test_label);
    emitter.body.mark_label(break_label);
    emitter.body.emit(Instr::Pop);

    emitter.labels.pop();
    Ok(())
}

/// Dispatches on strict equality against the subject, evaluated once
/// (§4.3 "`switch` dispatches by equality against the subject evaluated
/// once"). Case bodies fall through into the next case's label exactly
/// like JS unless they emit their own `break`.
fn emit_switch(emitter: &mut FunctionEmitter, discriminant: &Expr, cases: &[SwitchCase]) -> Result<(), EmitError> {
    emitter.emit_expr(discriminant)?;
    let subject = emitter.body.new_local(StackType::Unknown);
    emitter.body.emit(Instr::StLoc(subject));

    let break_label = emitter.body.new_label();
    emitter.labels.push_switch(break_label);

    let case_labels: Vec<Label> = cases.iter().map(|_| emitter.body.new_label()).collect();
    let default_index = cases.iter().position(|c| c.test.is_none());

    for (i, case) in cases.iter().enumerate() {
        if let Some(test) = &case.test {
            emitter.body.emit(Instr::LdLoc(subject));
            emitter.emit_expr(test)?;
            emitter.body.emit(Instr::Compare(CompareOp::Eq));
            emitter.body.emit(Instr::BrTrue(case_labels[i]));
        }
    }
    match default_index {
        Some(idx) => emitter.body.emit(Instr::Br(case_labels[idx])),
        None => emitter.body.emit(Instr::Br(break_label)),
    }

    for (i, case) in cases.iter().enumerate() {
        emitter.body.mark_label(case_labels[i]);
        emit_block(emitter, &case.body)?;
    }
    emitter.body.mark_label(break_label);

    emitter.labels.pop();
    Ok(())
}

fn emit_break(emitter: &mut FunctionEmitter, label: Option<Atom>) -> Result<(), EmitError> {
    match label {
        Some(name) => match emitter.labels.find(name) {
            Some(LabelFrame::Loop(l)) => {
                emit_exit(emitter, l.break_label);
                Ok(())
            }
            Some(LabelFrame::NonLoop { break_label, .. }) => {
                emit_exit(emitter, break_label);
                Ok(())
            }
            Some(LabelFrame::Switch { break_label }) => {
                emit_exit(emitter, break_label);
                Ok(())
            }
            None => Err(EmitError::new(diagnostic_codes::LABEL_NOT_FOUND, &["break"])),
        },
        None => match emitter.labels.innermost_breakable() {
            Some(target) => {
                emit_exit(emitter, target);
                Ok(())
            }
            None => Err(EmitError::new(diagnostic_codes::UNLABELED_BREAK_OUTSIDE_LOOP_OR_SWITCH, &[])),
        },
    }
}

fn emit_continue(emitter: &mut FunctionEmitter, label: Option<Atom>) -> Result<(), EmitError> {
    match label {
        Some(name) => match emitter.labels.find(name) {
            Some(LabelFrame::Loop(l)) => {
                emit_exit(emitter, l.continue_label);
                Ok(())
            }
            Some(LabelFrame::NonLoop { .. }) | Some(LabelFrame::Switch { .. }) => {
                Err(EmitError::new(diagnostic_codes::CONTINUE_TARGETS_NON_LOOP_LABEL, &[]))
            }
            None => Err(EmitError::new(diagnostic_codes::LABEL_NOT_FOUND, &["continue"])),
        },
        None => match emitter.labels.innermost_loop() {
            Some(l) => {
                emit_exit(emitter, l.continue_label);
                Ok(())
            }
            None => Err(EmitError::new(diagnostic_codes::UNSUPPORTED_CONSTRUCT, &["'continue' outside a loop"])),
        },
    }
}

/// §4.3: "a labeled statement whose inner node is a loop attaches the name
/// to that loop's entry; if the inner is not a loop, only `break` may
/// target it." A label attaches via `pending_label`, consumed by whichever
/// loop-emitting function runs next; a non-loop body instead gets its own
/// `NonLoop` frame wrapping it.
fn emit_labeled(emitter: &mut FunctionEmitter, label: Atom, body: &Stmt) -> Result<(), EmitError> {
    if is_loop(&body.kind) {
        emitter.pending_label = Some(label);
        emit_stmt(emitter, body)
    } else {
        let break_label = emitter.body.new_label();
        emitter.labels.push_non_loop(break_label, label);
        emit_stmt(emitter, body)?;
        emitter.body.mark_label(break_label);
        emitter.labels.pop();
        Ok(())
    }
}

fn is_loop(kind: &StmtKind) -> bool {
    matches!(
        kind,
        StmtKind::While { .. } | StmtKind::DoWhile { .. } | StmtKind::ForIn { .. } | StmtKind::ForOf { .. } | StmtKind::For { .. }
    )
}

/// §4.3 Try/Catch/Finally lowering: simple mode when no suspension is
/// reachable in any of try/catch/finally, complex mode otherwise.
fn emit_try(emitter: &mut FunctionEmitter, try_block: &Block, catch: Option<&CatchClause>, finally: Option<&Block>) -> Result<(), EmitError> {
    let needs_complex = emitter.shape.is_some()
        && (block_has_suspension(try_block)
            || catch.is_some_and(|c| block_has_suspension(&c.body))
            || finally.is_some_and(|f| block_has_suspension(f)));

    if needs_complex {
        emit_try_complex(emitter, try_block, catch, finally)
    } else {
        emit_try_simple(emitter, try_block, catch, finally)
    }
}

fn emit_try_simple(emitter: &mut FunctionEmitter, try_block: &Block, catch: Option<&CatchClause>, finally: Option<&Block>) -> Result<(), EmitError> {
    let after = emitter.body.new_label();

    emitter.body.emit(Instr::BeginTry);
    emit_block(emitter, try_block)?;
    emitter.body.emit(Instr::Leave(after));

    if let Some(catch) = catch {
        emitter.body.emit(Instr::BeginCatch(MetadataToken::Type("Error".to_string())));
        emitter.body.emit(Instr::CallHelper("WrapException".to_string(), 1));
        match catch.param {
            Some(param) => {
                let local = emitter.declare_local(param, StackType::Unknown);
                emitter.body.emit(Instr::StLoc(local));
            }
            None => emitter.body.emit(Instr::Pop),
        }
        emit_block(emitter, &catch.body)?;
        emitter.body.emit(Instr::Leave(after));
    }
    emitter.body.emit(Instr::EndTry);
    emitter.body.mark_label(after);

    if let Some(finally) = finally {
        emit_block(emitter, finally)?;
    }
    Ok(())
}

fn emit_try_complex(emitter: &mut FunctionEmitter, try_block: &Block, catch: Option<&CatchClause>, finally: Option<&Block>) -> Result<(), EmitError> {
    let caught_exception = emitter.body.new_local(StackType::Unknown);
    emitter.body.emit(Instr::LdNull);
    emitter.body.emit(Instr::StLoc(caught_exception));

    let finally_awaits = finally.is_some_and(|f| block_has_suspension(f));
    let pending_return = if finally_awaits { Some(emitter.body.new_local(StackType::Boolean)) } else { None };
    if let Some(pending_return) = pending_return {
        emitter.body.emit(Instr::LdFalse);
        emitter.body.emit(Instr::StLoc(pending_return));
    }
    let after_finally = if finally_awaits { Some(emitter.body.new_label()) } else { None };

    emitter.try_stack.push(ComplexTryFrame { caught_exception, pending_return, after_finally })?;

    emit_segmented(emitter, try_block, caught_exception)?;

    if let Some(catch) = catch {
        emit_guarded(emitter, caught_exception, |emitter| {
            emitter.body.emit(Instr::LdLoc(caught_exception));
            if let Some(param) = catch.param {
                let local = emitter.declare_local(param, StackType::Unknown);
                emitter.body.emit(Instr::StLoc(local));
            } else {
                emitter.body.emit(Instr::Pop);
            }
            emitter.body.emit(Instr::LdNull);
            emitter.body.emit(Instr::StLoc(caught_exception));
            emit_segmented(emitter, &catch.body, caught_exception)
        })?;
    }

    if let Some(finally) = finally {
        emit_segmented(emitter, finally, caught_exception)?;
    }
    if let Some(after_finally) = after_finally {
        emitter.body.mark_label(after_finally);
    }

    emitter.try_stack.pop();

    // Whatever is left in `caught_exception` at this point still needs
    // propagating — either the original try-block exception (no catch
    // clause matched it) or a fresh one thrown from inside the catch body
    // itself (the catch segment above reuses the same slot once it clears
    // it to null on entry). Either way this must not fall through silently:
    // a bare `Throw` here either escapes to the outermost driver's own
    // catch or, if this try is itself nested inside an enclosing complex
    // try's segment, into that segment's own protected region, which
    // re-captures it into the enclosing `caught_exception` slot.
    let no_exception = emitter.body.new_label();
    emitter.body.emit(Instr::LdLoc(caught_exception));
    emitter.body.emit(Instr::CallHelper("IsNullish".to_string(), 1));
    emitter.body.emit(Instr::BrTrue(no_exception));
    emitter.body.emit(Instr::LdLoc(caught_exception));
    emitter.body.emit(Instr::Throw);
    emitter.body.mark_label(no_exception);

    if let Some(pending_return) = pending_return {
        emit_guarded_bool(emitter, pending_return, |emitter| {
            let return_slot = emitter.return_slot();
            emitter.body.emit(Instr::LdLoc(return_slot));
            move_next::emit_completion(emitter, true)
        })?;
    }
    Ok(())
}

/// Splits `block` at each statement that itself reaches a suspension
/// point, wrapping the non-suspending runs in between in their own
/// protected region whose catch writes into `caught_exception` (§4.3
/// "wrap each synchronous segment in a protected region"), and guarding
/// both the segments and the suspending statements themselves so nothing
/// downstream of an already-caught exception still runs.
fn emit_segmented(emitter: &mut FunctionEmitter, block: &Block, caught_exception: LocalHandle) -> Result<(), EmitError> {
    let mut segment: Vec<&Stmt> = Vec::new();
    for stmt in block {
        if stmt_has_suspension(stmt) {
            flush_segment(emitter, &segment, caught_exception)?;
            segment.clear();
            emit_guarded(emitter, caught_exception, |emitter| emit_stmt(emitter, stmt))?;
        } else {
            segment.push(stmt);
        }
    }
    flush_segment(emitter, &segment, caught_exception)
}

fn flush_segment(emitter: &mut FunctionEmitter, stmts: &[&Stmt], caught_exception: LocalHandle) -> Result<(), EmitError> {
    if stmts.is_empty() {
        return Ok(());
    }
    emit_guarded(emitter, caught_exception, |emitter| {
        let after = emitter.body.new_label();
        emitter.body.emit(Instr::BeginTry);
        for stmt in stmts {
            emit_stmt(emitter, stmt)?;
        }
        emitter.body.emit(Instr::Leave(after));
        emitter.body.emit(Instr::BeginCatch(MetadataToken::Type("Error".to_string())));
        emitter.body.emit(Instr::StLoc(caught_exception));
        emitter.body.emit(Instr::Leave(after));
        emitter.body.emit(Instr::EndTry);
        emitter.body.mark_label(after);
        Ok(())
    })
}

/// Runs `f` only while `caught_exception` is still `null` (§4.3 "skip if
/// `caught_exception != null`").
fn emit_guarded(
    emitter: &mut FunctionEmitter,
    caught_exception: LocalHandle,
    f: impl FnOnce(&mut FunctionEmitter) -> Result<(), EmitError>,
) -> Result<(), EmitError> {
    emitter.body.emit(Instr::LdLoc(caught_exception));
    emitter.body.emit(Instr::CallHelper("IsNullish".to_string(), 1));
    let skip = emitter.body.new_label();
    emitter.body.emit(Instr::BrFalse(skip));
    f(emitter)?;
    emitter.body.mark_label(skip);
    Ok(())
}

fn emit_guarded_bool(
    emitter: &mut FunctionEmitter,
    flag: LocalHandle,
    f: impl FnOnce(&mut FunctionEmitter) -> Result<(), EmitError>,
) -> Result<(), EmitError> {
    emitter.body.emit(Instr::LdLoc(flag));
    let skip = emitter.body.new_label();
    emitter.body.emit(Instr::BrFalse(skip));
    f(emitter)?;
    emitter.body.mark_label(skip);
    Ok(())
}

/// Whether a suspension is reachable anywhere in `block` without crossing
/// into a nested activation (mirrors `sharpts_async::analyzer`'s own
/// refusal to descend into nested function/class declarations).
fn block_has_suspension(block: &Block) -> bool {
    block.iter().any(stmt_has_suspension)
}

fn stmt_has_suspension(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Expression(expr) | StmtKind::Throw(expr) => expr_has_suspension(expr),
        StmtKind::Var { declarations, .. } => declarations.iter().any(|d| d.initializer.as_ref().is_some_and(expr_has_suspension)),
        StmtKind::Return(expr) => expr.as_ref().is_some_and(expr_has_suspension),
        StmtKind::If { condition, then_branch, else_branch } => {
            expr_has_suspension(condition) || stmt_has_suspension(then_branch) || else_branch.as_deref().is_some_and(stmt_has_suspension)
        }
        StmtKind::While { condition, body } | StmtKind::DoWhile { body, condition } => {
            expr_has_suspension(condition) || stmt_has_suspension(body)
        }
        StmtKind::ForIn { right, body, .. } => expr_has_suspension(right) || stmt_has_suspension(body),
        StmtKind::ForOf { right, body, is_await, .. } => *is_await || expr_has_suspension(right) || stmt_has_suspension(body),
        StmtKind::For { init, test, update, body } => {
            init.as_deref().is_some_and(stmt_has_suspension)
                || test.as_ref().is_some_and(expr_has_suspension)
                || update.as_ref().is_some_and(expr_has_suspension)
                || stmt_has_suspension(body)
        }
        StmtKind::Block(block) | StmtKind::Sequence(block) => block_has_suspension(block),
        StmtKind::Switch { discriminant, cases } => {
            expr_has_suspension(discriminant)
                || cases.iter().any(|c| c.test.as_ref().is_some_and(expr_has_suspension) || block_has_suspension(&c.body))
        }
        StmtKind::TryCatch { try_block, catch, finally } => {
            block_has_suspension(try_block)
                || catch.as_ref().is_some_and(|c| block_has_suspension(&c.body))
                || finally.as_ref().is_some_and(|f| block_has_suspension(f))
        }
        StmtKind::Break(_) | StmtKind::Continue(_) => false,
        StmtKind::LabeledStatement { body, .. } => stmt_has_suspension(body),
        StmtKind::Class(_) | StmtKind::Function(_) | StmtKind::Field(_) | StmtKind::Accessor(_) => false,
    }
}

fn expr_has_suspension(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Await(_) | ExprKind::Yield { .. } => true,
        ExprKind::Literal(_) | ExprKind::This | ExprKind::Super | ExprKind::ImportMeta | ExprKind::Variable(_) => false,
        ExprKind::Assign { target, value } | ExprKind::CompoundAssign { target, value, .. } | ExprKind::LogicalAssign { target, value, .. } => {
            expr_has_suspension(target) || expr_has_suspension(value)
        }
        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } | ExprKind::NullishCoalescing { left, right } => {
            expr_has_suspension(left) || expr_has_suspension(right)
        }
        ExprKind::Unary { operand, .. } => expr_has_suspension(operand),
        ExprKind::Call { callee, args, .. } => expr_has_suspension(callee) || args.iter().any(expr_has_suspension),
        ExprKind::New { callee, args, .. } => expr_has_suspension(callee) || args.iter().any(expr_has_suspension),
        ExprKind::Get { object, .. } => expr_has_suspension(object),
        ExprKind::Set { object, value, .. } => expr_has_suspension(object) || expr_has_suspension(value),
        ExprKind::GetIndex { object, index, .. } => expr_has_suspension(object) || expr_has_suspension(index),
        ExprKind::SetIndex { object, index, value } => expr_has_suspension(object) || expr_has_suspension(index) || expr_has_suspension(value),
        ExprKind::Grouping(inner) | ExprKind::Spread(inner) | ExprKind::DynamicImport(inner) => expr_has_suspension(inner),
        ExprKind::Ternary { condition, then_branch, else_branch } => {
            expr_has_suspension(condition) || expr_has_suspension(then_branch) || expr_has_suspension(else_branch)
        }
        ExprKind::PrefixIncrement { target, .. } | ExprKind::PostfixIncrement { target, .. } => expr_has_suspension(target),
        ExprKind::ArrayLiteral(items) => items.iter().any(expr_has_suspension),
        ExprKind::ObjectLiteral(props) => props.iter().any(|p| expr_has_suspension(&p.value)),
        ExprKind::TemplateLiteral { expressions, .. } => expressions.iter().any(expr_has_suspension),
        // A nested arrow shares the enclosing activation's state machine
        // only through `self_boxed` (SPEC_FULL.md §C); its own body is a
        // separate `MoveNext`, not spliced into this one's segmentation.
        ExprKind::ArrowFunction(_) => false,
        ExprKind::TypeAssertion { expr, .. } => expr_has_suspension(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpts_ast::{FunctionDecl, Literal, NodeIdGen};
    use sharpts_common::{CompileOptions, Interner, Span};

    fn dummy_span() -> Span {
        Span::dummy()
    }

    #[test]
    fn plain_function_emits_break_outside_loop_error() {
        let gen = NodeIdGen::new();
        let interner = Interner::new();
        let break_stmt = Stmt::new(gen.next(), dummy_span(), StmtKind::Break(None));
        let function = FunctionDecl {
            name: None,
            params: vec![],
            return_type: None,
            body: vec![break_stmt],
            is_async: false,
            is_generator: false,
            is_arrow: false,
            has_concise_body: false,
        };
        let options = CompileOptions::default();
        let err = crate::function_emitter::emit_function(&function, false, &interner, &options).unwrap_err();
        assert_eq!(err.code, diagnostic_codes::UNLABELED_BREAK_OUTSIDE_LOOP_OR_SWITCH);
    }

    #[test]
    fn while_loop_emits_condition_test_and_back_edge() {
        let gen = NodeIdGen::new();
        let interner = Interner::new();
        let body = Stmt::new(gen.next(), dummy_span(), StmtKind::Break(None));
        let while_stmt = Stmt::new(
            gen.next(),
            dummy_span(),
            StmtKind::While { condition: Expr::new(gen.next(), dummy_span(), ExprKind::Literal(Literal::Boolean(true))), body: Box::new(body) },
        );
        let function = FunctionDecl {
            name: None,
            params: vec![],
            return_type: None,
            body: vec![while_stmt],
            is_async: false,
            is_generator: false,
            is_arrow: false,
            has_concise_body: false,
        };
        let options = CompileOptions::default();
        let emitted = crate::function_emitter::emit_function(&function, false, &interner, &options).expect("emission should succeed");
        assert!(emitted.body.instructions.iter().any(|i| matches!(i, Instr::BrFalse(_))));
    }

    #[test]
    fn simple_try_catch_wraps_native_protected_region() {
        let gen = NodeIdGen::new();
        let mut interner = Interner::new();
        let e = interner.intern("e");
        let try_stmt = Stmt::new(
            gen.next(),
            dummy_span(),
            StmtKind::TryCatch {
                try_block: vec![Stmt::new(gen.next(), dummy_span(), StmtKind::Throw(Expr::new(gen.next(), dummy_span(), ExprKind::Literal(Literal::Null))))],
                catch: Some(CatchClause { param: Some(e), body: vec![] }),
                finally: None,
            },
        );
        let function = FunctionDecl {
            name: None,
            params: vec![],
            return_type: None,
            body: vec![try_stmt],
            is_async: false,
            is_generator: false,
            is_arrow: false,
            has_concise_body: false,
        };
        let options = CompileOptions::default();
        let emitted = crate::function_emitter::emit_function(&function, false, &interner, &options).expect("emission should succeed");
        assert!(emitted.body.instructions.contains(&Instr::BeginTry));
        assert!(emitted.body.instructions.iter().any(|i| matches!(i, Instr::BeginCatch(_))));
    }

    /// A complex try (suspension inside it, forcing state-machine mode)
    /// with an empty catch clause must still emit the final
    /// propagate-if-pending-exception check. The catch body contains no
    /// `throw` of its own, so the only source of an `Instr::Throw` here is
    /// that check — if it were still gated on `catch.is_none()` (as it once
    /// was), an exception thrown from inside the catch body would have
    /// nowhere to go and this test would see no `Throw` at all.
    #[test]
    fn complex_try_with_catch_still_propagates_pending_exception() {
        let gen = NodeIdGen::new();
        let mut interner = Interner::new();
        let e = interner.intern("e");
        let promise_resolve = interner.intern("Promise.resolve");
        let await_stmt = Stmt::new(
            gen.next(),
            dummy_span(),
            StmtKind::Expression(Expr::new(
                gen.next(),
                dummy_span(),
                ExprKind::Await(Box::new(Expr::new(gen.next(), dummy_span(), ExprKind::Variable(promise_resolve)))),
            )),
        );
        let try_stmt = Stmt::new(
            gen.next(),
            dummy_span(),
            StmtKind::TryCatch {
                try_block: vec![await_stmt],
                catch: Some(CatchClause { param: Some(e), body: vec![] }),
                finally: None,
            },
        );
        let function = FunctionDecl {
            name: None,
            params: vec![],
            return_type: None,
            body: vec![try_stmt],
            is_async: true,
            is_generator: false,
            is_arrow: false,
            has_concise_body: false,
        };
        let options = CompileOptions::default();
        let emitted = crate::function_emitter::emit_function(&function, false, &interner, &options).expect("emission should succeed");
        assert!(
            emitted.body.instructions.iter().any(|i| matches!(i, Instr::Throw)),
            "a pending exception from the catch body must still be propagated when a catch clause is present"
        );
    }
}
