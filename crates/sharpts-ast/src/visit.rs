//! Read-only tree walk shared by every downstream pass (§9: "a visitor
//! trait for emission" rather than ad hoc recursive matches scattered
//! across the analyzer, the state-machine builder, and the emitter).
//!
//! Each `visit_*` method has a default that walks into the node's children;
//! override only the shapes a given pass cares about. Passes that need to
//! mutate state keyed by `NodeId` do so through their own side tables, not
//! through this trait — the tree itself stays immutable.

use crate::expr::{Expr, ExprKind, ObjectProperty, PropertyKey};
use crate::stmt::{Block, CatchClause, ClassDecl, ClassMember, FunctionDecl, Stmt, StmtKind, SwitchCase, VarDeclarator};

pub trait Visitor {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, function: &FunctionDecl) {
        walk_function(self, function);
    }

    fn visit_block(&mut self, block: &Block) {
        for stmt in block {
            self.visit_stmt(stmt);
        }
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Expression(expr) | StmtKind::Throw(expr) => visitor.visit_expr(expr),
        StmtKind::Var { declarations, .. } => {
            for decl in declarations {
                visit_var_declarator(visitor, decl);
            }
        }
        StmtKind::Return(expr) => {
            if let Some(expr) = expr {
                visitor.visit_expr(expr);
            }
        }
        StmtKind::If { condition, then_branch, else_branch } => {
            visitor.visit_expr(condition);
            visitor.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_stmt(else_branch);
            }
        }
        StmtKind::While { condition, body } | StmtKind::DoWhile { body, condition } => {
            visitor.visit_expr(condition);
            visitor.visit_stmt(body);
        }
        StmtKind::ForIn { right, body, .. } => {
            visitor.visit_expr(right);
            visitor.visit_stmt(body);
        }
        StmtKind::ForOf { right, body, .. } => {
            visitor.visit_expr(right);
            visitor.visit_stmt(body);
        }
        StmtKind::For { init, test, update, body } => {
            if let Some(init) = init {
                visitor.visit_stmt(init);
            }
            if let Some(test) = test {
                visitor.visit_expr(test);
            }
            if let Some(update) = update {
                visitor.visit_expr(update);
            }
            visitor.visit_stmt(body);
        }
        StmtKind::Block(block) | StmtKind::Sequence(block) => visitor.visit_block(block),
        StmtKind::Switch { discriminant, cases } => {
            visitor.visit_expr(discriminant);
            for case in cases {
                visit_switch_case(visitor, case);
            }
        }
        StmtKind::TryCatch { try_block, catch, finally } => {
            visitor.visit_block(try_block);
            if let Some(catch) = catch {
                visit_catch_clause(visitor, catch);
            }
            if let Some(finally) = finally {
                visitor.visit_block(finally);
            }
        }
        StmtKind::Break(_) | StmtKind::Continue(_) => {}
        StmtKind::LabeledStatement { body, .. } => visitor.visit_stmt(body),
        StmtKind::Class(class) => visit_class(visitor, class),
        StmtKind::Function(function) => visitor.visit_function(function),
        StmtKind::Field(field) => {
            if let Some(init) = &field.initializer {
                visitor.visit_expr(init);
            }
        }
        StmtKind::Accessor(accessor) => {
            if let Some(getter) = &accessor.getter {
                visitor.visit_function(getter);
            }
            if let Some(setter) = &accessor.setter {
                visitor.visit_function(setter);
            }
        }
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Variable(_) | ExprKind::This | ExprKind::Super | ExprKind::ImportMeta => {}
        ExprKind::Assign { target, value }
        | ExprKind::CompoundAssign { target, value, .. }
        | ExprKind::LogicalAssign { target, value, .. } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        ExprKind::Binary { left, right, .. }
        | ExprKind::Logical { left, right, .. }
        | ExprKind::NullishCoalescing { left, right } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Call { callee, args, .. } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::New { callee, args, .. } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Get { object, .. } => visitor.visit_expr(object),
        ExprKind::Set { object, value, .. } => {
            visitor.visit_expr(object);
            visitor.visit_expr(value);
        }
        ExprKind::GetIndex { object, index, .. } => {
            visitor.visit_expr(object);
            visitor.visit_expr(index);
        }
        ExprKind::SetIndex { object, index, value } => {
            visitor.visit_expr(object);
            visitor.visit_expr(index);
            visitor.visit_expr(value);
        }
        ExprKind::Grouping(inner) | ExprKind::Spread(inner) | ExprKind::DynamicImport(inner) => {
            visitor.visit_expr(inner);
        }
        ExprKind::Ternary { condition, then_branch, else_branch } => {
            visitor.visit_expr(condition);
            visitor.visit_expr(then_branch);
            visitor.visit_expr(else_branch);
        }
        ExprKind::PrefixIncrement { target, .. } | ExprKind::PostfixIncrement { target, .. } => {
            visitor.visit_expr(target);
        }
        ExprKind::ArrayLiteral(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        ExprKind::ObjectLiteral(props) => {
            for prop in props {
                visit_object_property(visitor, prop);
            }
        }
        ExprKind::TemplateLiteral { expressions, .. } => {
            for expr in expressions {
                visitor.visit_expr(expr);
            }
        }
        ExprKind::Await(inner) => visitor.visit_expr(inner),
        ExprKind::Yield { argument, .. } => {
            if let Some(argument) = argument {
                visitor.visit_expr(argument);
            }
        }
        ExprKind::ArrowFunction(function) => visitor.visit_function(function),
        ExprKind::TypeAssertion { expr, .. } => visitor.visit_expr(expr),
    }
}

pub fn walk_function<V: Visitor + ?Sized>(visitor: &mut V, function: &FunctionDecl) {
    for param in &function.params {
        if let Some(default) = &param.default {
            visitor.visit_expr(default);
        }
    }
    visitor.visit_block(&function.body);
}

fn visit_var_declarator<V: Visitor + ?Sized>(visitor: &mut V, decl: &VarDeclarator) {
    if let Some(init) = &decl.initializer {
        visitor.visit_expr(init);
    }
}

fn visit_switch_case<V: Visitor + ?Sized>(visitor: &mut V, case: &SwitchCase) {
    if let Some(test) = &case.test {
        visitor.visit_expr(test);
    }
    for stmt in &case.body {
        visitor.visit_stmt(stmt);
    }
}

fn visit_catch_clause<V: Visitor + ?Sized>(visitor: &mut V, catch: &CatchClause) {
    visitor.visit_block(&catch.body);
}

fn visit_object_property<V: Visitor + ?Sized>(visitor: &mut V, prop: &ObjectProperty) {
    if let PropertyKey::Computed(key_expr) = &prop.key {
        visitor.visit_expr(key_expr);
    }
    visitor.visit_expr(&prop.value);
}

fn visit_class<V: Visitor + ?Sized>(visitor: &mut V, class: &ClassDecl) {
    if let Some(superclass) = &class.superclass {
        visitor.visit_expr(superclass);
    }
    for member in &class.members {
        match member {
            ClassMember::Method(method) => visitor.visit_function(&method.function),
            ClassMember::Field(field) => {
                if let Some(init) = &field.initializer {
                    visitor.visit_expr(init);
                }
            }
            ClassMember::Accessor(accessor) => {
                if let Some(getter) = &accessor.getter {
                    visitor.visit_function(getter);
                }
                if let Some(setter) = &accessor.setter {
                    visitor.visit_function(setter);
                }
            }
            ClassMember::StaticBlock(block) => visitor.visit_block(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, Literal};
    use crate::ids::NodeId;
    use sharpts_common::Span;

    struct CountLiterals(usize);

    impl Visitor for CountLiterals {
        fn visit_expr(&mut self, expr: &Expr) {
            if matches!(expr.kind, ExprKind::Literal(_)) {
                self.0 += 1;
            }
            walk_expr(self, expr);
        }
    }

    #[test]
    fn walk_expr_visits_nested_literals() {
        let dummy = Span::dummy();
        let one = Expr::new(NodeId(0), dummy, ExprKind::Literal(Literal::Number(1.0)));
        let two = Expr::new(NodeId(1), dummy, ExprKind::Literal(Literal::Number(2.0)));
        let sum = Expr::new(
            NodeId(2),
            dummy,
            ExprKind::Binary { op: BinaryOp::Add, left: Box::new(one), right: Box::new(two) },
        );
        let mut counter = CountLiterals(0);
        counter.visit_expr(&sum);
        assert_eq!(counter.0, 2);
    }
}
