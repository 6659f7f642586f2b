use std::process::Termination;

use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::error::Rich;
use thiserror::Error;

use crate::compile::{
    parser::{lex::Token, preparse::LayoutError},
    semantic::SemanticError,
};

pub struct ExitCode(u8);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAIL_PARSING: ExitCode = ExitCode(42);
    pub const FAIL_SEMANTIC: ExitCode = ExitCode(7);
}

impl Termination for ExitCode {
    fn report(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self.0)
    }
}

impl From<BuildError> for ExitCode {
    fn from(value: BuildError) -> Self {
        match value {
            BuildError::LayoutError(_) => ExitCode::FAIL_PARSING,
            BuildError::LexerError(_) => ExitCode::FAIL_PARSING,
            BuildError::ParsingError(_) => ExitCode::FAIL_PARSING,
            BuildError::SemanticError(_) => ExitCode::FAIL_SEMANTIC,
            _ => ExitCode(255),
        }
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Layout Analysis failed: {0}")]
    LayoutError(#[from] LayoutError),

    #[error("Lexical Analysis failed.")]
    LexerError(Vec<Rich<'static, char>>),

    #[error("Syntactic Analysis failed.")]
    ParsingError(Vec<Rich<'static, Token, std::ops::Range<usize>>>),

    #[error("Semantical Analysis failed: {0}")]
    SemanticError(#[from] SemanticError),

    #[error("There was an I/O error: {0}")]
    IOError(#[from] std::io::Error),
}

/// Renders a semantic error as a labeled source report on stderr.
pub fn report_semantic_error(path: &str, src: &str, err: &SemanticError) {
    let span = err.span();
    let _ = Report::build(ReportKind::Error, (path, span.clone()))
        .with_message("Semantic error")
        .with_label(
            Label::new((path, span))
                .with_message(err.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((path, Source::from(src)));
}
