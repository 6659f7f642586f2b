pub type SourcePos = core::ops::Range<usize>;

/// A type as written in source, before resolution against the scope
/// chain. Struct types appear as bare names.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Int,
    Float,
    Bool,
    String,
    Void,
    Named(String, SourcePos),
    Array(Box<TypeExpr>),
    Optional(Box<TypeExpr>),
    Function(Vec<TypeExpr>, Box<TypeExpr>),
}

impl TypeExpr {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: TypeExpr,
    pub name: String,
    pub span: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseTail {
    None,
    Block(Vec<Stmt>),
    ElseIf(Box<Stmt>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    /// `..<`
    Exclusive,
    /// `...`
    Inclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl {
        /// `None` for `$`-declarations, whose type is inferred.
        ty: Option<TypeExpr>,
        read_only: bool,
        name: String,
        init: Expr,
        span: SourcePos,
    },
    FunDecl {
        name: String,
        params: Vec<Param>,
        returns: Option<TypeExpr>,
        body: Vec<Stmt>,
        span: SourcePos,
    },
    StructDecl {
        name: String,
        fields: Vec<Param>,
        span: SourcePos,
    },
    Assign {
        targets: Vec<Expr>,
        sources: Vec<Expr>,
        span: SourcePos,
    },
    Bump {
        target: Expr,
        op: BumpOp,
        span: SourcePos,
    },
    Break(SourcePos),
    Return(Option<Expr>, SourcePos),
    If {
        test: Expr,
        consequent: Vec<Stmt>,
        alternate: ElseTail,
        span: SourcePos,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        span: SourcePos,
    },
    Repeat {
        count: Expr,
        body: Vec<Stmt>,
        span: SourcePos,
    },
    ForRange {
        name: String,
        low: Expr,
        op: RangeOp,
        high: Expr,
        body: Vec<Stmt>,
        span: SourcePos,
    },
    ForEach {
        name: String,
        collection: Expr,
        body: Vec<Stmt>,
        span: SourcePos,
    },
    /// A call or pipe in statement position.
    Call(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Eq,
    NotEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Some,
    Random,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64, SourcePos),
    Float(f64, SourcePos),
    Str(String, SourcePos),
    Bool(bool, SourcePos),
    Ident(String, SourcePos),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>, SourcePos),
    Subscript(Box<Expr>, Box<Expr>),
    Member {
        object: Box<Expr>,
        /// `?.` access
        optional: bool,
        field: String,
        field_span: SourcePos,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: SourcePos,
    },
    ArrayLit(Vec<Expr>, SourcePos),
    /// `[T]()`
    EmptyArray(TypeExpr, SourcePos),
    /// `no T`
    EmptyOptional(TypeExpr, SourcePos),
    PipeForward {
        args: Vec<Expr>,
        callee: Box<Expr>,
        span: SourcePos,
    },
    PipeBackward {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: SourcePos,
    },
}

impl Expr {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn span(&self) -> SourcePos {
        match self {
            Expr::Int(_, span)
            | Expr::Float(_, span)
            | Expr::Str(_, span)
            | Expr::Bool(_, span)
            | Expr::Ident(_, span)
            | Expr::Unary(_, _, span)
            | Expr::Call { span, .. }
            | Expr::ArrayLit(_, span)
            | Expr::EmptyArray(_, span)
            | Expr::EmptyOptional(_, span)
            | Expr::PipeForward { span, .. }
            | Expr::PipeBackward { span, .. } => span.clone(),
            Expr::Binary(_, lhs, rhs) => lhs.span().start..rhs.span().end,
            Expr::Subscript(array, index) => array.span().start..index.span().end,
            Expr::Member {
                object, field_span, ..
            } => object.span().start..field_span.end,
        }
    }
}
