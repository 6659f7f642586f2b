use thiserror::Error;

use crate::compile::ast::SourcePos;

pub mod analyze;

pub use analyze::analyze;

/// A violation of a static rule. Analysis is fail-fast: the first error
/// aborts the whole walk.
#[derive(Error, Debug, Clone)]
pub enum SemanticError {
    #[error("Identifier {name} already declared")]
    AlreadyDeclared { name: String, span: SourcePos },

    #[error("Identifier {name} not declared")]
    NotDeclared { name: String, span: SourcePos },

    #[error("{name} cannot be used as a value")]
    NotAValue { name: String, span: SourcePos },

    #[error("Expected a number")]
    ExpectedNumber { span: SourcePos },

    #[error("Expected a number or string")]
    ExpectedNumberOrString { span: SourcePos },

    #[error("Expected a boolean")]
    ExpectedBoolean { span: SourcePos },

    #[error("Expected an integer")]
    ExpectedInteger { span: SourcePos },

    #[error("Expected an array")]
    ExpectedArray { span: SourcePos },

    #[error("Expected a struct")]
    ExpectedStruct { span: SourcePos },

    #[error("Expected an optional struct")]
    ExpectedOptionalStruct { span: SourcePos },

    #[error("Operands do not have the same type")]
    MixedOperandTypes { span: SourcePos },

    #[error("Not all elements have the same type")]
    MixedElementTypes { span: SourcePos },

    #[error("Type expected")]
    NotAType { span: SourcePos },

    #[error("Must be an array type")]
    NotAnArrayType { span: SourcePos },

    #[error("Cannot assign a {from} to a {target}")]
    NotAssignable {
        from: String,
        target: String,
        span: SourcePos,
    },

    #[error("Cannot assign to constant {name}")]
    AssignToConstant { name: String, span: SourcePos },

    #[error("Invalid assignment target")]
    InvalidAssignmentTarget { span: SourcePos },

    #[error("Fields must be distinct")]
    DuplicateFields { span: SourcePos },

    #[error("Struct type must not be self-containing")]
    SelfContainingStruct { span: SourcePos },

    #[error("No such field")]
    NoSuchField { span: SourcePos },

    #[error("Break can only appear in a loop")]
    BreakOutsideLoop { span: SourcePos },

    #[error("Return can only appear in a function")]
    ReturnOutsideFunction { span: SourcePos },

    #[error("Something should be returned")]
    MissingReturnValue { span: SourcePos },

    #[error("Cannot return a value from this function")]
    UnexpectedReturnValue { span: SourcePos },

    #[error("Call of non-function or non-constructor")]
    NotCallable { span: SourcePos },

    #[error("{required} argument(s) required but {passed} passed")]
    WrongArgumentCount {
        required: usize,
        passed: usize,
        span: SourcePos,
    },
}

impl SemanticError {
    pub fn span(&self) -> SourcePos {
        match self {
            SemanticError::AlreadyDeclared { span, .. }
            | SemanticError::NotDeclared { span, .. }
            | SemanticError::NotAValue { span, .. }
            | SemanticError::ExpectedNumber { span }
            | SemanticError::ExpectedNumberOrString { span }
            | SemanticError::ExpectedBoolean { span }
            | SemanticError::ExpectedInteger { span }
            | SemanticError::ExpectedArray { span }
            | SemanticError::ExpectedStruct { span }
            | SemanticError::ExpectedOptionalStruct { span }
            | SemanticError::MixedOperandTypes { span }
            | SemanticError::MixedElementTypes { span }
            | SemanticError::NotAType { span }
            | SemanticError::NotAnArrayType { span }
            | SemanticError::NotAssignable { span, .. }
            | SemanticError::AssignToConstant { span, .. }
            | SemanticError::InvalidAssignmentTarget { span }
            | SemanticError::DuplicateFields { span }
            | SemanticError::SelfContainingStruct { span }
            | SemanticError::NoSuchField { span }
            | SemanticError::BreakOutsideLoop { span }
            | SemanticError::ReturnOutsideFunction { span }
            | SemanticError::MissingReturnValue { span }
            | SemanticError::UnexpectedReturnValue { span }
            | SemanticError::NotCallable { span }
            | SemanticError::WrongArgumentCount { span, .. } => span.clone(),
        }
    }
}
