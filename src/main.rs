use std::path::PathBuf;

use clap::Parser;

use buildlang::compile::Compiler;
use buildlang::compile::parser::preparse::with_indents_and_dedents;
use buildlang::infra::{BuildError, ExitCode, report_semantic_error};

#[derive(Parser, Debug)]
#[command()]
struct Args {
    src: String,
    out: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let compilation_result = Compiler::new()
        .src(PathBuf::from(args.src.as_str()))
        .out(PathBuf::from(args.out.as_str()))
        .compile()
        .err();

    let Some(err) = compilation_result else {
        return ExitCode::SUCCESS;
    };

    if let BuildError::SemanticError(ref semantic) = err {
        // spans refer to the layout-marked text, so rebuild it
        if let Ok(raw) = std::fs::read_to_string(args.src.as_str()) {
            if let Ok(src) = with_indents_and_dedents(&raw) {
                report_semantic_error(args.src.as_str(), &src, semantic);
            }
        }
    }

    err.into()
}
