use std::{
    fs::{self},
    path::PathBuf,
};

use chumsky::{Parser, input::Input};
use parser::{lex::lexer, parse::program_parser, preparse::with_indents_and_dedents};

use crate::{
    compile::ir::{Program, optimize},
    infra::BuildError,
};

pub mod ast;
pub mod generate;
pub mod ir;
pub mod parser;
pub mod semantic;

// Custom macro for compiler pipeline errors
macro_rules! pipeline_error {
    ($msg:expr) => {
        panic!("Compiler Pipeline encourred an error: {}", $msg)
    };
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    src_path: Option<PathBuf>,
    out_path: Option<PathBuf>,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler::default()
    }

    pub fn src(&mut self, src: PathBuf) -> &mut Self {
        self.src_path = Some(src);

        self
    }

    pub fn out(&mut self, out: PathBuf) -> &mut Self {
        self.out_path = Some(out);

        self
    }

    pub fn compile(&mut self) -> Result<&mut Self, BuildError> {
        let ast = self.parse()?;
        let program = self.transform(ast)?;
        self.emit(&program)?;

        Ok(self)
    }

    fn parse(&mut self) -> Result<Vec<ast::Stmt>, BuildError> {
        let Some(ref src_path) = self.src_path else {
            pipeline_error!("No src path provided")
        };

        let raw = match fs::read_to_string(src_path) {
            Ok(raw) => raw,
            Err(err) => return Err(BuildError::IOError(err)),
        };
        let src = with_indents_and_dedents(&raw)?;

        let tokens = lexer().parse(src.as_str()).into_result().map_err(
            |err: Vec<chumsky::prelude::Rich<'_, char>>| {
                let err: Vec<chumsky::prelude::Rich<'static, char>> = err
                    .into_iter()
                    .map(chumsky::error::Rich::into_owned)
                    .collect();

                BuildError::LexerError(err)
            },
        )?;

        let token_stream = tokens.map(src.len()..src.len(), |(t, s)| (t, s));

        match program_parser().parse(token_stream).into_result() {
            Ok(ast) => Ok(ast),
            Err(err) => {
                let err = err
                    .into_iter()
                    .map(chumsky::error::Rich::into_owned)
                    .collect();

                Err(BuildError::ParsingError(err))
            }
        }
    }

    fn transform(&mut self, ast: Vec<ast::Stmt>) -> Result<Program, BuildError> {
        let program = semantic::analyze(&ast)?;

        Ok(optimize::optimize(program))
    }

    fn emit(&mut self, program: &Program) -> Result<&mut Self, BuildError> {
        let Some(ref out_path) = self.out_path else {
            pipeline_error!("No output path provided.")
        };

        let mut code = generate::generate(program);
        code.push('\n');
        fs::write(out_path, code)?;

        Ok(self)
    }
}
