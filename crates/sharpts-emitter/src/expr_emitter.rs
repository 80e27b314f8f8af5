//! C6, expression half: `EnsureBoxed`-aware emission of every `ExprKind`
//! variant with JS binary/logical/comparison semantics (§4.4).
//!
//! `Await`/`Yield` expand through `move_next::emit_suspension_point` so a
//! plain non-async function and an async/generator's `MoveNext` share every
//! other expression-lowering rule; the only difference is that a plain
//! function's emitter never reaches those two arms (the checker rejects
//! `await`/`yield` outside a suspending function before this stage runs).

use sharpts_ast::{BinaryOp, Expr, ExprKind, IncDecOp, Literal, LogicalOp, ObjectProperty, PropertyKey};
use sharpts_common::diagnostics::diagnostic_codes;

use crate::dispatch;
use crate::emit_context::{EmitError, VariableSlot};
use crate::function_emitter::FunctionEmitter;
use crate::il::{ArithOp, CompareOp, FieldRef, Instr, MetadataToken, StackType};
use crate::move_next;

impl FunctionEmitter<'_> {
    /// Emits `expr`, leaving exactly one value on the operand stack and
    /// updating `self.stack` to that value's static stack type.
    pub fn emit_expr(&mut self, expr: &Expr) -> Result<(), EmitError> {
        match &expr.kind {
            ExprKind::Literal(lit) => self.emit_literal(lit),
            ExprKind::Variable(name) => self.emit_variable_load(*name)?,
            ExprKind::This => self.emit_this_load()?,
            ExprKind::Super => {
                self.body.emit(Instr::LdThis);
                self.stack.set_unknown();
            }
            ExprKind::ImportMeta => {
                self.body.emit(Instr::CallHelper("ImportMeta".to_string(), 0));
                self.stack.set_unknown();
            }

            ExprKind::Assign { target, value } => self.emit_assign(target, value)?,
            ExprKind::CompoundAssign { op, target, value } => self.emit_compound_assign(*op, target, value)?,
            ExprKind::LogicalAssign { op, target, value } => self.emit_logical_assign(*op, target, value)?,

            ExprKind::Binary { op, left, right } => self.emit_binary(*op, left, right)?,
            ExprKind::Logical { op, left, right } => self.emit_logical(*op, left, right)?,
            ExprKind::Unary { op, operand } => self.emit_unary(*op, operand)?,
            ExprKind::NullishCoalescing { left, right } => self.emit_nullish_coalescing(left, right)?,

            ExprKind::Call { callee, args, optional, .. } => self.emit_call(callee, args, *optional)?,
            ExprKind::New { callee, args, .. } => self.emit_new(callee, args)?,

            ExprKind::Get { object, name, optional } => self.emit_get(object, *name, *optional)?,
            ExprKind::Set { object, name, value } => self.emit_set(object, *name, value)?,
            ExprKind::GetIndex { object, index, optional } => self.emit_get_index(object, index, *optional)?,
            ExprKind::SetIndex { object, index, value } => self.emit_set_index(object, index, value)?,

            ExprKind::Grouping(inner) => self.emit_expr(inner)?,
            ExprKind::Ternary { condition, then_branch, else_branch } => self.emit_ternary(condition, then_branch, else_branch)?,
            ExprKind::PrefixIncrement { op, target } => self.emit_inc_dec(*op, target, true)?,
            ExprKind::PostfixIncrement { op, target } => self.emit_inc_dec(*op, target, false)?,

            ExprKind::ArrayLiteral(elements) => self.emit_array_literal(elements)?,
            ExprKind::ObjectLiteral(props) => self.emit_object_literal(props)?,

            ExprKind::TemplateLiteral { quasis, expressions } => self.emit_template_literal(quasis, expressions)?,

            ExprKind::Await(value) => self.emit_await(value)?,
            ExprKind::Yield { argument, delegate } => self.emit_yield(argument.as_deref(), *delegate)?,

            ExprKind::ArrowFunction(_) => {
                return Err(EmitError::new(
                    diagnostic_codes::UNSUPPORTED_CONSTRUCT,
                    &["arrow function expressions are lowered by the arrow-capture pass, not emit_expr directly"],
                ));
            }

            ExprKind::Spread(inner) => self.emit_expr(inner)?,
            ExprKind::TypeAssertion { expr, .. } => self.emit_expr(expr)?,
            ExprKind::DynamicImport(specifier) => {
                self.emit_expr(specifier)?;
                self.body.emit(Instr::CallHelper("DynamicImport".to_string(), 1));
                self.stack.set_unknown();
            }
        }
        Ok(())
    }

    fn emit_literal(&mut self, lit: &Literal) {
        match lit {
            Literal::Number(n) => {
                self.body.emit(Instr::LdcR8(*n));
                self.stack.set(StackType::Double);
            }
            Literal::String(s) => {
                self.body.emit(Instr::LdStr(s.clone()));
                self.stack.set(StackType::String);
            }
            Literal::Boolean(b) => {
                self.body.emit(if *b { Instr::LdTrue } else { Instr::LdFalse });
                self.stack.set(StackType::Boolean);
            }
            Literal::Null => {
                self.body.emit(Instr::LdNull);
                self.stack.set(StackType::Null);
            }
            Literal::Undefined => {
                self.body.emit(Instr::LdUndefined);
                self.stack.set(StackType::Null);
            }
            Literal::BigInt(digits) => {
                self.body.emit(Instr::LdStr(digits.clone()));
                self.body.emit(Instr::CallHelper("ParseBigInt".to_string(), 1));
                self.stack.set_unknown();
            }
            Literal::Regex { pattern, flags } => {
                self.body.emit(Instr::LdStr(pattern.clone()));
                self.body.emit(Instr::LdStr(flags.clone()));
                self.body.emit(Instr::CallHelper("NewRegExp".to_string(), 2));
                self.stack.set_unknown();
            }
        }
    }

    fn emit_variable_load(&mut self, name: sharpts_common::Atom) -> Result<(), EmitError> {
        match self.scope.resolve(name) {
            Some(VariableSlot::Local(handle)) => {
                self.body.emit(Instr::LdLoc(handle));
                self.stack.set_unknown();
                Ok(())
            }
            Some(VariableSlot::Hoisted(handle)) => {
                self.body.emit(Instr::LdFld(FieldRef::StateMachine(handle)));
                self.stack.set_unknown();
                Ok(())
            }
            None => {
                let text = self.interner.resolve(name);
                self.body.emit(Instr::LdStr(text.to_string()));
                self.body.emit(Instr::CallHelper("LoadGlobal".to_string(), 1));
                self.stack.set_unknown();
                Ok(())
            }
        }
    }

    fn emit_this_load(&mut self) -> Result<(), EmitError> {
        if let Some(this_field) = self.shape.as_ref().and_then(|s| s.this_field()) {
            self.body.emit(Instr::LdFld(FieldRef::StateMachine(this_field)));
        } else {
            self.body.emit(Instr::LdThis);
        }
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_assign(&mut self, target: &Expr, value: &Expr) -> Result<(), EmitError> {
        self.emit_expr(value)?;
        self.ensure_boxed();
        self.body.emit(Instr::Dup);
        self.store_to_target(target)
    }

    fn emit_compound_assign(&mut self, op: BinaryOp, target: &Expr, value: &Expr) -> Result<(), EmitError> {
        self.emit_expr(target)?;
        self.emit_expr(value)?;
        self.emit_binary_op(op)?;
        self.ensure_boxed();
        self.body.emit(Instr::Dup);
        self.store_to_target(target)
    }

    fn emit_logical_assign(&mut self, op: LogicalOp, target: &Expr, value: &Expr) -> Result<(), EmitError> {
        // `a &&= b` / `a ||= b` / `a ??= b`: evaluate `target`, short-circuit
        // without touching it if the operator's guard condition already
        // determines the result, otherwise evaluate+store `value`.
        self.emit_expr(target)?;
        self.body.emit(Instr::Dup);
        match op {
            LogicalOp::And => self.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1)),
            LogicalOp::Or => {
                self.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1));
                self.body.emit(Instr::Not);
            }
        }
        let skip = self.body.new_label();
        self.body.emit(Instr::BrFalse(skip));
        self.body.emit(Instr::Pop);
        self.emit_expr(value)?;
        self.ensure_boxed();
        self.body.emit(Instr::Dup);
        self.store_to_target(target)?;
        self.body.mark_label(skip);
        self.stack.set_unknown();
        Ok(())
    }

    fn store_to_target(&mut self, target: &Expr) -> Result<(), EmitError> {
        match &target.kind {
            ExprKind::Variable(name) => match self.scope.resolve(*name) {
                Some(VariableSlot::Local(handle)) => {
                    self.body.emit(Instr::StLoc(handle));
                    Ok(())
                }
                Some(VariableSlot::Hoisted(handle)) => {
                    self.body.emit(Instr::StFld(FieldRef::StateMachine(handle)));
                    Ok(())
                }
                None => {
                    let text = self.interner.resolve(*name).to_string();
                    self.body.emit(Instr::LdStr(text));
                    self.body.emit(Instr::CallHelper("StoreGlobal".to_string(), 2));
                    Ok(())
                }
            },
            ExprKind::Get { object, name, .. } => {
                self.emit_expr(object)?;
                let text = self.interner.resolve(*name).to_string();
                self.body.emit(Instr::LdStr(text));
                self.body.emit(Instr::CallHelper("SetProperty".to_string(), 3));
                Ok(())
            }
            ExprKind::GetIndex { object, index, .. } => {
                self.emit_expr(object)?;
                self.emit_expr(index)?;
                self.body.emit(Instr::CallHelper("SetIndexed".to_string(), 3));
                Ok(())
            }
            _ => Err(EmitError::new(diagnostic_codes::UNSUPPORTED_CONSTRUCT, &["assignment target"])),
        }
    }

    fn emit_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<(), EmitError> {
        self.emit_expr(left)?;
        self.emit_expr(right)?;
        self.emit_binary_op(op)
    }

    /// Assumes both operands are already on the stack. §4.4: arithmetic and
    /// bitwise operators need boxed-free double operands; `+` is special
    /// (string concatenation if either side is a string); comparisons are
    /// runtime-helper calls since JS's abstract (in)equality isn't a single
    /// CIL `ceq`/`clt`.
    fn emit_binary_op(&mut self, op: BinaryOp) -> Result<(), EmitError> {
        match op {
            BinaryOp::Add => self.body.emit(Instr::CallHelper("Add".to_string(), 2)),
            BinaryOp::Sub => self.body.emit(Instr::Arith(ArithOp::Sub)),
            BinaryOp::Mul => self.body.emit(Instr::Arith(ArithOp::Mul)),
            BinaryOp::Div => self.body.emit(Instr::Arith(ArithOp::Div)),
            BinaryOp::Mod => self.body.emit(Instr::Arith(ArithOp::Mod)),
            BinaryOp::Exp => self.body.emit(Instr::Arith(ArithOp::Exp)),
            BinaryOp::BitAnd => self.body.emit(Instr::Arith(ArithOp::BitAnd)),
            BinaryOp::BitOr => self.body.emit(Instr::Arith(ArithOp::BitOr)),
            BinaryOp::BitXor => self.body.emit(Instr::Arith(ArithOp::BitXor)),
            BinaryOp::Shl => self.body.emit(Instr::Arith(ArithOp::Shl)),
            BinaryOp::Shr => self.body.emit(Instr::Arith(ArithOp::Shr)),
            BinaryOp::UShr => self.body.emit(Instr::Arith(ArithOp::UShr)),
            BinaryOp::Lt => self.body.emit(Instr::Compare(CompareOp::Lt)),
            BinaryOp::Le => self.body.emit(Instr::Compare(CompareOp::Le)),
            BinaryOp::Gt => self.body.emit(Instr::Compare(CompareOp::Gt)),
            BinaryOp::Ge => self.body.emit(Instr::Compare(CompareOp::Ge)),
            BinaryOp::Eq => self.body.emit(Instr::CallHelper("LooseEquals".to_string(), 2)),
            BinaryOp::NotEq => {
                self.body.emit(Instr::CallHelper("LooseEquals".to_string(), 2));
                self.body.emit(Instr::Not);
            }
            BinaryOp::StrictEq => self.body.emit(Instr::Compare(CompareOp::Eq)),
            BinaryOp::StrictNotEq => self.body.emit(Instr::Compare(CompareOp::NotEq)),
            BinaryOp::In => self.body.emit(Instr::CallHelper("HasProperty".to_string(), 2)),
            BinaryOp::InstanceOf => self.body.emit(Instr::CallHelper("InstanceOf".to_string(), 2)),
        }
        self.stack.set(match op {
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq
            | BinaryOp::StrictNotEq | BinaryOp::In | BinaryOp::InstanceOf => StackType::Boolean,
            BinaryOp::Add => StackType::Unknown,
            _ => StackType::Double,
        });
        Ok(())
    }

    fn emit_logical(&mut self, op: LogicalOp, left: &Expr, right: &Expr) -> Result<(), EmitError> {
        self.emit_expr(left)?;
        self.body.emit(Instr::Dup);
        self.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1));
        if let LogicalOp::Or = op {
            self.body.emit(Instr::Not);
        }
        let skip = self.body.new_label();
        self.body.emit(Instr::BrFalse(skip));
        self.body.emit(Instr::Pop);
        self.emit_expr(right)?;
        self.body.mark_label(skip);
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_nullish_coalescing(&mut self, left: &Expr, right: &Expr) -> Result<(), EmitError> {
        self.emit_expr(left)?;
        self.body.emit(Instr::Dup);
        self.body.emit(Instr::CallHelper("IsNullish".to_string(), 1));
        let use_left = self.body.new_label();
        self.body.emit(Instr::BrFalse(use_left));
        self.body.emit(Instr::Pop);
        self.emit_expr(right)?;
        self.body.mark_label(use_left);
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_unary(&mut self, op: sharpts_ast::UnaryOp, operand: &Expr) -> Result<(), EmitError> {
        use sharpts_ast::UnaryOp;
        match op {
            UnaryOp::Neg => {
                self.emit_expr(operand)?;
                self.body.emit(Instr::Neg);
                self.stack.set(StackType::Double);
            }
            UnaryOp::Plus => {
                self.emit_expr(operand)?;
                self.body.emit(Instr::CallHelper("ToNumber".to_string(), 1));
                self.stack.set(StackType::Double);
            }
            UnaryOp::Not => {
                self.emit_expr(operand)?;
                self.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1));
                self.body.emit(Instr::Not);
                self.stack.set(StackType::Boolean);
            }
            UnaryOp::BitNot => {
                self.emit_expr(operand)?;
                self.body.emit(Instr::BitNot);
                self.stack.set(StackType::Double);
            }
            UnaryOp::TypeOf => {
                self.emit_expr(operand)?;
                self.body.emit(Instr::CallHelper("TypeOf".to_string(), 1));
                self.stack.set(StackType::String);
            }
            UnaryOp::Void => {
                self.emit_expr(operand)?;
                self.body.emit(Instr::Pop);
                self.body.emit(Instr::LdUndefined);
                self.stack.set(StackType::Null);
            }
            UnaryOp::Delete => {
                self.emit_delete(operand)?;
                self.stack.set(StackType::Boolean);
            }
        }
        Ok(())
    }

    fn emit_delete(&mut self, operand: &Expr) -> Result<(), EmitError> {
        match &operand.kind {
            ExprKind::Get { object, name, .. } => {
                self.emit_expr(object)?;
                let text = self.interner.resolve(*name).to_string();
                self.body.emit(Instr::LdStr(text));
                self.body.emit(Instr::CallHelper("DeleteProperty".to_string(), 2));
                Ok(())
            }
            ExprKind::GetIndex { object, index, .. } => {
                self.emit_expr(object)?;
                self.emit_expr(index)?;
                self.body.emit(Instr::CallHelper("DeleteIndexed".to_string(), 2));
                Ok(())
            }
            _ => {
                self.body.emit(Instr::LdTrue);
                Ok(())
            }
        }
    }

    /// `callee(args)`: resolves the dispatch target and receiver (§4.5),
    /// then pushes whatever the target needs before the call instruction.
    /// `?.()` short-circuits when the callee itself — the function value,
    /// e.g. a bound method read off `obj.method` — is nullish; the
    /// short-circuit test is independent of whether the resolved target
    /// needs its own receiver pushed afterward.
    fn emit_call(&mut self, callee: &Expr, args: &[Expr], optional: bool) -> Result<(), EmitError> {
        let (target, receiver) = dispatch::resolve_call(self, callee)?;

        if optional {
            self.emit_expr(callee)?;
            self.body.emit(Instr::Dup);
            self.body.emit(Instr::CallHelper("IsNullish".to_string(), 1));
            let short_circuit = self.body.new_label();
            let done = self.body.new_label();
            self.body.emit(Instr::BrTrue(short_circuit));
            self.body.emit(Instr::Pop);
            self.emit_dispatch(&target, receiver, args)?;
            self.body.emit(Instr::Br(done));
            self.body.mark_label(short_circuit);
            self.body.emit(Instr::Pop);
            self.body.emit(Instr::LdUndefined);
            self.body.mark_label(done);
        } else {
            self.emit_dispatch(&target, receiver, args)?;
        }
        self.stack.set_unknown();
        Ok(())
    }

    /// Pushes the receiver (if the target needs one) then every argument,
    /// and emits the call itself. The ambiguous string-or-array target
    /// (§4.5 rule 9) needs its own shape since exactly one of its two
    /// helper calls must run, so it's handled separately.
    fn emit_dispatch(&mut self, target: &dispatch::DispatchTarget, receiver: dispatch::Receiver, args: &[Expr]) -> Result<(), EmitError> {
        if let dispatch::DispatchTarget::AmbiguousStringOrArray { string_helper, array_helper } = target {
            return self.emit_ambiguous_dispatch(receiver, args, string_helper, array_helper);
        }

        let mut argc = 0u32;
        if let dispatch::Receiver::Value(expr) = receiver {
            self.emit_expr(expr)?;
            self.ensure_boxed();
            argc += 1;
        }
        for arg in args {
            self.emit_expr(arg)?;
            self.ensure_boxed();
            argc += 1;
        }
        self.emit_dispatch_target(target, argc);
        Ok(())
    }

    /// §4.5 rule 9: the receiver and arguments are pre-evaluated into
    /// locals (since each is only emitted once by source but pushed again
    /// per branch) then tested with `IsString` to pick the matching
    /// `String`/`Array` helper.
    fn emit_ambiguous_dispatch(
        &mut self,
        receiver: dispatch::Receiver,
        args: &[Expr],
        string_helper: &str,
        array_helper: &str,
    ) -> Result<(), EmitError> {
        let receiver_expr = match receiver {
            dispatch::Receiver::Value(expr) => expr,
            dispatch::Receiver::None => {
                return Err(EmitError::new(diagnostic_codes::UNKNOWN_DISPATCH_TARGET, &["ambiguous string/array method with no receiver"]));
            }
        };
        self.emit_expr(receiver_expr)?;
        self.ensure_boxed();
        let recv = self.body.new_local(StackType::Unknown);
        self.body.emit(Instr::StLoc(recv));

        let mut arg_locals = Vec::with_capacity(args.len());
        for arg in args {
            self.emit_expr(arg)?;
            self.ensure_boxed();
            let local = self.body.new_local(StackType::Unknown);
            self.body.emit(Instr::StLoc(local));
            arg_locals.push(local);
        }

        self.body.emit(Instr::LdLoc(recv));
        self.body.emit(Instr::CallHelper("IsString".to_string(), 1));
        let is_string = self.body.new_label();
        let done = self.body.new_label();
        self.body.emit(Instr::BrTrue(is_string));

        let argc = 1 + arg_locals.len() as u32;
        self.body.emit(Instr::LdLoc(recv));
        for &local in &arg_locals {
            self.body.emit(Instr::LdLoc(local));
        }
        self.body.emit(Instr::CallHelper(array_helper.to_string(), argc));
        self.body.emit(Instr::Br(done));

        self.body.mark_label(is_string);
        self.body.emit(Instr::LdLoc(recv));
        for &local in &arg_locals {
            self.body.emit(Instr::LdLoc(local));
        }
        self.body.emit(Instr::CallHelper(string_helper.to_string(), argc));

        self.body.mark_label(done);
        Ok(())
    }

    fn emit_dispatch_target(&mut self, target: &dispatch::DispatchTarget, argc: u32) {
        match target {
            dispatch::DispatchTarget::Static(token) => self.body.emit(Instr::Call(token.clone(), argc)),
            dispatch::DispatchTarget::Virtual(token) => self.body.emit(Instr::CallVirt(token.clone(), argc)),
            dispatch::DispatchTarget::Helper(name) => self.body.emit(Instr::CallHelper(name.clone(), argc)),
            dispatch::DispatchTarget::AmbiguousStringOrArray { .. } => {
                unreachable!("ambiguous string/array dispatch is handled by emit_ambiguous_dispatch before reaching here")
            }
            dispatch::DispatchTarget::InvokeValue => self.body.emit(Instr::CallHelper("InvokeValue".to_string(), argc)),
        }
    }

    fn emit_new(&mut self, callee: &Expr, args: &[Expr]) -> Result<(), EmitError> {
        let token = match &callee.kind {
            ExprKind::Variable(name) => MetadataToken::Type(self.interner.resolve(*name).to_string()),
            _ => {
                self.emit_expr(callee)?;
                MetadataToken::Type("<dynamic>".to_string())
            }
        };
        for arg in args {
            self.emit_expr(arg)?;
        }
        self.body.emit(Instr::NewObj(token, args.len() as u32));
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_get(&mut self, object: &Expr, name: sharpts_common::Atom, optional: bool) -> Result<(), EmitError> {
        self.emit_expr(object)?;
        let text = self.interner.resolve(name).to_string();
        if optional {
            self.body.emit(Instr::Dup);
            self.body.emit(Instr::CallHelper("IsNullish".to_string(), 1));
            let short_circuit = self.body.new_label();
            let done = self.body.new_label();
            self.body.emit(Instr::BrTrue(short_circuit));
            self.body.emit(Instr::LdStr(text));
            self.body.emit(Instr::CallHelper("GetProperty".to_string(), 2));
            self.body.emit(Instr::Br(done));
            self.body.mark_label(short_circuit);
            self.body.emit(Instr::Pop);
            self.body.emit(Instr::LdUndefined);
            self.body.mark_label(done);
        } else {
            self.body.emit(Instr::LdStr(text));
            self.body.emit(Instr::CallHelper("GetProperty".to_string(), 2));
        }
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_set(&mut self, object: &Expr, name: sharpts_common::Atom, value: &Expr) -> Result<(), EmitError> {
        self.emit_expr(object)?;
        let text = self.interner.resolve(name).to_string();
        self.body.emit(Instr::LdStr(text));
        self.emit_expr(value)?;
        self.ensure_boxed();
        self.body.emit(Instr::CallHelper("SetProperty".to_string(), 3));
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_get_index(&mut self, object: &Expr, index: &Expr, optional: bool) -> Result<(), EmitError> {
        self.emit_expr(object)?;
        if optional {
            self.body.emit(Instr::Dup);
            self.body.emit(Instr::CallHelper("IsNullish".to_string(), 1));
            let short_circuit = self.body.new_label();
            let done = self.body.new_label();
            self.body.emit(Instr::BrTrue(short_circuit));
            self.emit_expr(index)?;
            self.body.emit(Instr::CallHelper("GetIndexed".to_string(), 2));
            self.body.emit(Instr::Br(done));
            self.body.mark_label(short_circuit);
            self.body.emit(Instr::Pop);
            self.body.emit(Instr::LdUndefined);
            self.body.mark_label(done);
        } else {
            self.emit_expr(index)?;
            self.body.emit(Instr::CallHelper("GetIndexed".to_string(), 2));
        }
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_set_index(&mut self, object: &Expr, index: &Expr, value: &Expr) -> Result<(), EmitError> {
        self.emit_expr(object)?;
        self.emit_expr(index)?;
        self.emit_expr(value)?;
        self.ensure_boxed();
        self.body.emit(Instr::CallHelper("SetIndexed".to_string(), 3));
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_ternary(&mut self, condition: &Expr, then_branch: &Expr, else_branch: &Expr) -> Result<(), EmitError> {
        self.emit_expr(condition)?;
        self.body.emit(Instr::CallHelper("IsTruthy".to_string(), 1));
        let else_label = self.body.new_label();
        let end_label = self.body.new_label();
        self.body.emit(Instr::BrFalse(else_label));
        self.emit_expr(then_branch)?;
        self.body.emit(Instr::Br(end_label));
        self.body.mark_label(else_label);
        self.emit_expr(else_branch)?;
        self.body.mark_label(end_label);
        self.stack.set_unknown();
        Ok(())
    }

    /// §4.4 "pre-evaluate into locals": `x++`/`++x` read-modify-write the
    /// target once; the old value (postfix) or new value (prefix) is what's
    /// left on the stack.
    fn emit_inc_dec(&mut self, op: IncDecOp, target: &Expr, is_prefix: bool) -> Result<(), EmitError> {
        self.emit_expr(target)?;
        self.body.emit(Instr::CallHelper("ToNumber".to_string(), 1));
        let old_value = self.body.new_local(StackType::Double);
        self.body.emit(Instr::StLoc(old_value));
        self.body.emit(Instr::LdLoc(old_value));
        self.body.emit(Instr::LdcR8(1.0));
        self.body.emit(Instr::Arith(match op {
            IncDecOp::Increment => ArithOp::Add,
            IncDecOp::Decrement => ArithOp::Sub,
        }));
        self.body.emit(Instr::Dup);
        let new_value = self.body.new_local(StackType::Double);
        self.body.emit(Instr::StLoc(new_value));
        self.body.emit(Instr::Box);
        self.store_to_target(target)?;
        self.body.emit(Instr::LdLoc(if is_prefix { new_value } else { old_value }));
        self.stack.set(StackType::Double);
        Ok(())
    }

    fn emit_array_literal(&mut self, elements: &[Expr]) -> Result<(), EmitError> {
        self.body.emit(Instr::NewArr(elements.len() as u32));
        for (i, element) in elements.iter().enumerate() {
            self.body.emit(Instr::Dup);
            self.body.emit(Instr::LdcR8(i as f64));
            self.emit_expr(element)?;
            self.ensure_boxed();
            self.body.emit(Instr::StElem);
        }
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_object_literal(&mut self, props: &[ObjectProperty]) -> Result<(), EmitError> {
        self.body.emit(Instr::CallHelper("NewObject".to_string(), 0));
        for prop in props {
            self.body.emit(Instr::Dup);
            match &prop.key {
                PropertyKey::Identifier(name) => self.body.emit(Instr::LdStr(self.interner.resolve(*name).to_string())),
                PropertyKey::String(s) => self.body.emit(Instr::LdStr(s.clone())),
                PropertyKey::Number(n) => self.body.emit(Instr::LdStr(n.to_string())),
                PropertyKey::Computed(expr) => {
                    self.emit_expr(expr)?;
                    continue;
                }
            }
            self.emit_expr(&prop.value)?;
            self.ensure_boxed();
            self.body.emit(Instr::CallHelper("SetProperty".to_string(), 3));
            self.body.emit(Instr::Pop);
        }
        self.stack.set_unknown();
        Ok(())
    }

    /// §4.4 "template literal stringify": every interpolated expression is
    /// converted with the same `Stringify` helper a plain `String(x)` call
    /// would use, then the pieces are concatenated left-to-right with the
    /// literal quasis.
    fn emit_template_literal(&mut self, quasis: &[String], expressions: &[Expr]) -> Result<(), EmitError> {
        self.body.emit(Instr::LdStr(quasis.first().cloned().unwrap_or_default()));
        for (expr, quasi) in expressions.iter().zip(quasis.iter().skip(1)) {
            self.emit_expr(expr)?;
            self.body.emit(Instr::CallHelper("Stringify".to_string(), 1));
            self.body.emit(Instr::CallHelper("Concat".to_string(), 2));
            self.body.emit(Instr::LdStr(quasi.clone()));
            self.body.emit(Instr::CallHelper("Concat".to_string(), 2));
        }
        self.stack.set(StackType::String);
        Ok(())
    }

    fn emit_await(&mut self, value: &Expr) -> Result<(), EmitError> {
        if !self.flags.in_async {
            return Err(EmitError::new(diagnostic_codes::UNSUPPORTED_CONSTRUCT, &["'await' outside an async function"]));
        }
        self.emit_expr(value)?;
        self.ensure_boxed();
        move_next::emit_suspension_point(self)?;
        self.stack.set_unknown();
        Ok(())
    }

    fn emit_yield(&mut self, argument: Option<&Expr>, delegate: bool) -> Result<(), EmitError> {
        if !self.flags.in_generator {
            return Err(EmitError::new(diagnostic_codes::UNSUPPORTED_CONSTRUCT, &["'yield' outside a generator function"]));
        }
        match argument {
            Some(arg) => self.emit_expr(arg)?,
            None => self.body.emit(Instr::LdUndefined),
        }
        self.ensure_boxed();
        if delegate {
            self.body.emit(Instr::CallHelper("GetIterator".to_string(), 1));
        }
        move_next::emit_suspension_point(self)?;
        self.stack.set_unknown();
        Ok(())
    }

    /// §4.4 `EnsureBoxed`: a no-op unless the value currently on the stack
    /// is tracked as a CLR value type (`Double`/`Boolean`), in which case a
    /// `box` instruction is emitted so it can be stored through an
    /// `object`-typed field/array slot/call argument.
    pub fn ensure_boxed(&mut self) {
        if self.stack.current().needs_boxing() {
            self.body.emit(Instr::Box);
            self.stack.set_unknown();
        }
    }
}
