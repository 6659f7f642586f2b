//! Offside-rule preprocessing: a pure text-to-text transform that makes
//! indentation explicit so the lexer can emit INDENT/DEDENT tokens.

use thiserror::Error;

/// Marker inserted where a line opens a deeper block.
pub const INDENT_MARK: char = '⇨';
/// Marker inserted where a line closes one block level.
pub const DEDENT_MARK: char = '⇦';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("line {0}: dedent does not match any open block")]
    MismatchedDedent(usize),

    #[error("line {0}: tabs are not allowed in indentation")]
    TabIndent(usize),
}

/// Rewrites `src` with `⇨`/`⇦` markers at the start of lines whose
/// indentation grows or shrinks. Blank lines carry no markers. All open
/// blocks are closed at the end of input. A dedent must land exactly on
/// a previously opened width; indentation is spaces only.
pub fn with_indents_and_dedents(src: &str) -> Result<String, LayoutError> {
    let mut out = String::new();
    let mut levels: Vec<usize> = vec![0];

    for (index, line) in src.lines().enumerate() {
        let number = index + 1;
        if line.trim().is_empty() {
            out.push('\n');
            continue;
        }

        let trimmed = line.trim_start();
        let leading = &line[..line.len() - trimmed.len()];
        if leading.contains('\t') {
            return Err(LayoutError::TabIndent(number));
        }

        let width = leading.len();
        let current = *levels.last().unwrap_or(&0);

        if width > current {
            levels.push(width);
            out.push(INDENT_MARK);
        } else if width < current {
            while levels.len() > 1 && *levels.last().unwrap_or(&0) > width {
                levels.pop();
                out.push(DEDENT_MARK);
            }
            if *levels.last().unwrap_or(&0) != width {
                return Err(LayoutError::MismatchedDedent(number));
            }
        }

        out.push_str(trimmed);
        out.push('\n');
    }

    while levels.len() > 1 {
        levels.pop();
        out.push(DEDENT_MARK);
    }
    out.push('\n');

    Ok(out)
}
