use std::rc::Rc;

use crate::compile::ast::BinaryOp;
use crate::compile::ir::types::Type;
use crate::compile::ir::{Expr, Program, Stmt, UnaryOp};

/// A single bottom-up rewrite over the typed program: constant folding,
/// algebraic identities, and removal of statements that provably never
/// run. Every rewrite is pure; unrecognized shapes pass through
/// unchanged, so the pass is idempotent.
pub fn optimize(program: Program) -> Program {
    Program(optimize_stmt_list(program.0))
}

fn optimize_stmt_list(stmts: Vec<Stmt>) -> Vec<Stmt> {
    stmts.into_iter().flat_map(optimize_stmt).collect()
}

/// Statements optimize to a list so that a statement can disappear or
/// splice several statements into its place.
pub fn optimize_stmt(stmt: Stmt) -> Vec<Stmt> {
    match stmt {
        Stmt::VarDecl { variable, init } => vec![Stmt::VarDecl {
            variable,
            init: optimize_expr(init),
        }],

        Stmt::FunDecl {
            function,
            params,
            body,
        } => vec![Stmt::FunDecl {
            function,
            params,
            body: optimize_stmt_list(body),
        }],

        Stmt::StructDecl(strukt) => vec![Stmt::StructDecl(strukt)],

        Stmt::Assign { target, source } => {
            let target = optimize_expr(target);
            let source = optimize_expr(source);
            // x = x, by entity identity
            if let (Expr::Variable(t), Expr::Variable(s)) = (&target, &source) {
                if Rc::ptr_eq(t, s) {
                    return vec![];
                }
            }

            vec![Stmt::Assign { target, source }]
        }

        Stmt::Sequence(stmts) => optimize_stmt_list(stmts),

        Stmt::Bump { target, op } => vec![Stmt::Bump {
            target: optimize_expr(target),
            op,
        }],

        Stmt::Break => vec![Stmt::Break],

        Stmt::Return(value) => vec![Stmt::Return(value.map(optimize_expr))],

        Stmt::If {
            test,
            consequent,
            alternate,
        } => {
            let test = optimize_expr(test);
            let consequent = optimize_stmt_list(consequent);
            let alternate = optimize_stmt_list(alternate);
            match test {
                Expr::Bool(true) => consequent,
                Expr::Bool(false) => alternate,
                test => vec![Stmt::If {
                    test,
                    consequent,
                    alternate,
                }],
            }
        }

        Stmt::While { test, body } => {
            let test = optimize_expr(test);
            if matches!(test, Expr::Bool(false)) {
                return vec![];
            }

            vec![Stmt::While {
                test,
                body: optimize_stmt_list(body),
            }]
        }

        Stmt::Repeat { count, body } => {
            let count = optimize_expr(count);
            if matches!(count, Expr::Int(0)) {
                return vec![];
            }

            vec![Stmt::Repeat {
                count,
                body: optimize_stmt_list(body),
            }]
        }

        Stmt::ForRange {
            iterator,
            low,
            op,
            high,
            body,
        } => {
            let low = optimize_expr(low);
            let high = optimize_expr(high);
            if let (Expr::Int(low), Expr::Int(high)) = (&low, &high) {
                if low > high {
                    return vec![];
                }
            }

            vec![Stmt::ForRange {
                iterator,
                low,
                op,
                high,
                body: optimize_stmt_list(body),
            }]
        }

        Stmt::ForEach {
            iterator,
            collection,
            body,
        } => {
            let collection = optimize_expr(collection);
            if matches!(collection, Expr::EmptyArray(_)) {
                return vec![];
            }

            vec![Stmt::ForEach {
                iterator,
                collection,
                body: optimize_stmt_list(body),
            }]
        }

        Stmt::Call(expr) => vec![Stmt::Call(optimize_expr(expr))],
    }
}

pub fn optimize_expr(expr: Expr) -> Expr {
    match expr {
        Expr::Binary { op, lhs, rhs, ty } => {
            let lhs = optimize_expr(*lhs);
            let rhs = optimize_expr(*rhs);

            fold_binary(op, lhs, rhs, ty)
        }

        Expr::Unary { op, operand, ty } => {
            let operand = optimize_expr(*operand);
            match (op, operand) {
                (UnaryOp::Neg, Expr::Int(n)) => match n.checked_neg() {
                    Some(n) => Expr::Int(n),
                    None => Expr::Unary {
                        op,
                        operand: Expr::Int(n).boxed(),
                        ty,
                    },
                },
                (UnaryOp::Neg, Expr::Float(x)) => Expr::Float(-x),
                (op, operand) => Expr::Unary {
                    op,
                    operand: operand.boxed(),
                    ty,
                },
            }
        }

        Expr::Subscript { array, index, ty } => Expr::Subscript {
            array: optimize_expr(*array).boxed(),
            index: optimize_expr(*index).boxed(),
            ty,
        },

        Expr::ArrayLit { elements, ty } => Expr::ArrayLit {
            elements: elements.into_iter().map(optimize_expr).collect(),
            ty,
        },

        Expr::Member {
            object,
            optional,
            field,
            ty,
        } => Expr::Member {
            object: optimize_expr(*object).boxed(),
            optional,
            field,
            ty,
        },

        Expr::Call { callee, args, ty } => Expr::Call {
            callee: optimize_expr(*callee).boxed(),
            args: args.into_iter().map(optimize_expr).collect(),
            ty,
        },

        Expr::ConstructorCall { strukt, args } => Expr::ConstructorCall {
            strukt,
            args: args.into_iter().map(optimize_expr).collect(),
        },

        Expr::PipeForward { args, callee, ty } => Expr::PipeForward {
            args: args.into_iter().map(optimize_expr).collect(),
            callee: optimize_expr(*callee).boxed(),
            ty,
        },

        Expr::PipeBackward { callee, args, ty } => Expr::PipeBackward {
            callee: optimize_expr(*callee).boxed(),
            args: args.into_iter().map(optimize_expr).collect(),
            ty,
        },

        leaf => leaf,
    }
}

fn is_zero(expr: &Expr) -> bool {
    matches!(expr, Expr::Int(0)) || matches!(expr, Expr::Float(x) if *x == 0.0)
}

fn is_one(expr: &Expr) -> bool {
    matches!(expr, Expr::Int(1)) || matches!(expr, Expr::Float(x) if *x == 1.0)
}

fn rebuild(op: BinaryOp, lhs: Expr, rhs: Expr, ty: Type) -> Expr {
    Expr::Binary {
        op,
        lhs: lhs.boxed(),
        rhs: rhs.boxed(),
        ty,
    }
}

/// Folding for one binary node whose children are already optimized.
/// Integer arithmetic folds only when it stays in range; `%` never
/// folds.
fn fold_binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: Type) -> Expr {
    use BinaryOp::*;

    match (op, lhs, rhs) {
        // literal true/false operands drop out of && and ||
        (And, Expr::Bool(true), rhs) => rhs,
        (And, lhs, Expr::Bool(true)) => lhs,
        (Or, Expr::Bool(false), rhs) => rhs,
        (Or, lhs, Expr::Bool(false)) => lhs,

        (Pow, one, _) if is_one(&one) => one,
        (Pow, lhs, zero) if is_zero(&zero) => match lhs.ty() {
            Type::Float => Expr::Float(1.0),
            _ => Expr::Int(1),
        },

        (Add, Expr::Int(a), Expr::Int(b)) => match a.checked_add(b) {
            Some(n) => Expr::Int(n),
            None => rebuild(op, Expr::Int(a), Expr::Int(b), ty),
        },
        (Sub, Expr::Int(a), Expr::Int(b)) => match a.checked_sub(b) {
            Some(n) => Expr::Int(n),
            None => rebuild(op, Expr::Int(a), Expr::Int(b), ty),
        },
        (Mul, Expr::Int(a), Expr::Int(b)) => match a.checked_mul(b) {
            Some(n) => Expr::Int(n),
            None => rebuild(op, Expr::Int(a), Expr::Int(b), ty),
        },
        (Div, Expr::Int(a), Expr::Int(b)) => match a.checked_div(b) {
            Some(n) => Expr::Int(n),
            None => rebuild(op, Expr::Int(a), Expr::Int(b), ty),
        },
        (Pow, Expr::Int(a), Expr::Int(b)) => {
            let folded = u32::try_from(b).ok().and_then(|e| a.checked_pow(e));
            match folded {
                Some(n) => Expr::Int(n),
                None => rebuild(op, Expr::Int(a), Expr::Int(b), ty),
            }
        }

        (Add, Expr::Float(a), Expr::Float(b)) => Expr::Float(a + b),
        (Sub, Expr::Float(a), Expr::Float(b)) => Expr::Float(a - b),
        (Mul, Expr::Float(a), Expr::Float(b)) => Expr::Float(a * b),
        (Div, Expr::Float(a), Expr::Float(b)) => Expr::Float(a / b),
        (Pow, Expr::Float(a), Expr::Float(b)) => Expr::Float(a.powf(b)),

        (Less, Expr::Int(a), Expr::Int(b)) => Expr::Bool(a < b),
        (LessEq, Expr::Int(a), Expr::Int(b)) => Expr::Bool(a <= b),
        (Greater, Expr::Int(a), Expr::Int(b)) => Expr::Bool(a > b),
        (GreaterEq, Expr::Int(a), Expr::Int(b)) => Expr::Bool(a >= b),
        (Eq, Expr::Int(a), Expr::Int(b)) => Expr::Bool(a == b),
        (NotEq, Expr::Int(a), Expr::Int(b)) => Expr::Bool(a != b),

        (Less, Expr::Float(a), Expr::Float(b)) => Expr::Bool(a < b),
        (LessEq, Expr::Float(a), Expr::Float(b)) => Expr::Bool(a <= b),
        (Greater, Expr::Float(a), Expr::Float(b)) => Expr::Bool(a > b),
        (GreaterEq, Expr::Float(a), Expr::Float(b)) => Expr::Bool(a >= b),
        (Eq, Expr::Float(a), Expr::Float(b)) => Expr::Bool(a == b),
        (NotEq, Expr::Float(a), Expr::Float(b)) => Expr::Bool(a != b),

        (Add, zero, rhs) if is_zero(&zero) => rhs,
        (Add, lhs, zero) if is_zero(&zero) => lhs,
        (Sub, lhs, zero) if is_zero(&zero) => lhs,
        (Sub, zero, rhs) if is_zero(&zero) => Expr::Unary {
            op: UnaryOp::Neg,
            operand: rhs.boxed(),
            ty,
        },
        (Mul, one, rhs) if is_one(&one) => rhs,
        (Mul, lhs, one) if is_one(&one) => lhs,
        (Mul, zero, _) if is_zero(&zero) => zero,
        (Mul, _, zero) if is_zero(&zero) => zero,
        (Div, zero, _) if is_zero(&zero) => zero,
        (Div, lhs, one) if is_one(&one) => lhs,

        (op, lhs, rhs) => rebuild(op, lhs, rhs, ty),
    }
}
