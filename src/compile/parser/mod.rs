pub mod lex;
pub mod parse;
pub mod preparse;

use crate::compile::ast::SourcePos;

pub type Spanned<T> = (T, SourcePos);
