use std::rc::Rc;

use crate::compile::ast::{BinaryOp, BumpOp, RangeOp};

use entities::{Function, StructType, Variable};
use types::Type;

pub mod entities;
pub mod optimize;
pub mod types;

/// The typed program produced by semantic analysis. Names are gone;
/// every mention of an entity holds the entity itself.
#[derive(Debug, Clone)]
pub struct Program(pub Vec<Stmt>);

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl {
        variable: Rc<Variable>,
        init: Expr,
    },
    FunDecl {
        function: Rc<Function>,
        params: Vec<Rc<Variable>>,
        body: Vec<Stmt>,
    },
    StructDecl(Rc<StructType>),
    Assign {
        target: Expr,
        source: Expr,
    },
    /// Expansion of a multiple assignment. Optimization may splice its
    /// contents into the surrounding statement list.
    Sequence(Vec<Stmt>),
    Bump {
        target: Expr,
        op: BumpOp,
    },
    Break,
    Return(Option<Expr>),
    If {
        test: Expr,
        consequent: Vec<Stmt>,
        /// An else-if chain shows up as a single nested `If` here.
        alternate: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    Repeat {
        count: Expr,
        body: Vec<Stmt>,
    },
    ForRange {
        iterator: Rc<Variable>,
        low: Expr,
        op: RangeOp,
        high: Expr,
        body: Vec<Stmt>,
    },
    ForEach {
        iterator: Rc<Variable>,
        collection: Expr,
        body: Vec<Stmt>,
    },
    Call(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Some,
    Random,
    Len,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Variable(Rc<Variable>),
    Function(Rc<Function>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        ty: Type,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        ty: Type,
    },
    Subscript {
        array: Box<Expr>,
        index: Box<Expr>,
        ty: Type,
    },
    ArrayLit {
        elements: Vec<Expr>,
        ty: Type,
    },
    /// Carries the full array type.
    EmptyArray(Type),
    /// Carries the full optional type.
    EmptyOptional(Type),
    Member {
        object: Box<Expr>,
        optional: bool,
        field: String,
        ty: Type,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        ty: Type,
    },
    ConstructorCall {
        strukt: Rc<StructType>,
        args: Vec<Expr>,
    },
    PipeForward {
        args: Vec<Expr>,
        callee: Box<Expr>,
        ty: Type,
    },
    PipeBackward {
        callee: Box<Expr>,
        args: Vec<Expr>,
        ty: Type,
    },
}

impl Expr {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn ty(&self) -> Type {
        match self {
            Expr::Int(_) => Type::Int,
            Expr::Float(_) => Type::Float,
            Expr::Str(_) => Type::String,
            Expr::Bool(_) => Type::Bool,
            Expr::Variable(variable) => variable.ty.clone(),
            Expr::Function(function) => function.ty(),
            Expr::ConstructorCall { strukt, .. } => Type::Struct(strukt.clone()),
            Expr::EmptyArray(ty) | Expr::EmptyOptional(ty) => ty.clone(),
            Expr::Binary { ty, .. }
            | Expr::Unary { ty, .. }
            | Expr::Subscript { ty, .. }
            | Expr::ArrayLit { ty, .. }
            | Expr::Member { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::PipeForward { ty, .. }
            | Expr::PipeBackward { ty, .. } => ty.clone(),
        }
    }
}
