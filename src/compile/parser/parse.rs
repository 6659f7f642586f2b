use chumsky::input::ValueInput;
use chumsky::prelude::*;

use crate::compile::ast::{
    BinaryOp, BumpOp, ElseTail, Expr, Param, RangeOp, SourcePos, Stmt, TypeExpr, UnaryOp,
};
use crate::compile::parser::lex::Token;

type ErrorParserExtra<'src> = extra::Err<Rich<'src, Token, SourcePos>>;

pub fn type_parser<'src, I>() -> impl Parser<'src, I, TypeExpr, ErrorParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    recursive(|ty| {
        let named = select! { Token::IDENT(name) => name }
            .map_with(|name, ctx| TypeExpr::Named(name, ctx.span()));

        let primitive = choice((
            just(Token::INT).to(TypeExpr::Int),
            just(Token::FLOAT).to(TypeExpr::Float),
            just(Token::BOOL).to(TypeExpr::Bool),
            just(Token::STRING).to(TypeExpr::String),
            just(Token::VOID).to(TypeExpr::Void),
        ));

        let array = ty
            .clone()
            .delimited_by(just(Token::L_SQUARE), just(Token::R_SQUARE))
            .map(|base: TypeExpr| TypeExpr::Array(base.boxed()));

        let function = ty
            .clone()
            .separated_by(just(Token::COMMA))
            .collect::<Vec<TypeExpr>>()
            .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND))
            .then_ignore(just(Token::ARROW))
            .then(ty.clone())
            .map(|(params, ret): (Vec<TypeExpr>, TypeExpr)| {
                TypeExpr::Function(params, ret.boxed())
            });

        choice((function, array, primitive, named)).foldl(
            just(Token::QUESTION).repeated(),
            |base, _| TypeExpr::Optional(base.boxed()),
        )
    })
}

enum PipeTail {
    Forward(Vec<Expr>),
    Backward(Vec<Expr>),
}

/// Wraps an operand-level parser with the `|>`/`<|` pipe level. Forward
/// chains fold left-to-right, backward chains right-to-left.
fn pipe_level<'src, I, P>(operand: P) -> impl Parser<'src, I, Expr, ErrorParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
    P: Parser<'src, I, Expr, ErrorParserExtra<'src>> + Clone,
{
    let tail = choice((
        just(Token::PIPE_FORWARD)
            .ignore_then(operand.clone())
            .repeated()
            .at_least(1)
            .collect::<Vec<Expr>>()
            .map(PipeTail::Forward),
        just(Token::PIPE_BACKWARD)
            .ignore_then(operand.clone())
            .repeated()
            .at_least(1)
            .collect::<Vec<Expr>>()
            .map(PipeTail::Backward),
    ));

    operand.then(tail.or_not()).map(|(head, tail)| match tail {
        None => head,
        Some(PipeTail::Forward(stages)) => stages.into_iter().fold(head, |acc, callee| {
            let span = acc.span().start..callee.span().end;
            Expr::PipeForward {
                args: vec![acc],
                callee: callee.boxed(),
                span,
            }
        }),
        Some(PipeTail::Backward(stages)) => {
            let mut chain = vec![head];
            chain.extend(stages);
            let mut acc = chain.pop().unwrap();
            while let Some(callee) = chain.pop() {
                let span = callee.span().start..acc.span().end;
                acc = Expr::PipeBackward {
                    callee: callee.boxed(),
                    args: vec![acc],
                    span,
                };
            }
            acc
        }
    })
}

enum Postfix {
    Subscript(Expr),
    Member {
        optional: bool,
        field: String,
        span: SourcePos,
    },
    Call(Vec<Expr>, SourcePos),
}

/// Expressions up to `||`, without the pipe level. Statement parsing
/// needs this level directly so comma-joined pipe operands do not bind
/// into their last element.
pub fn or_expr_parser<'src, I>() -> impl Parser<'src, I, Expr, ErrorParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    recursive(|or_| {
        // full expressions (with pipes) reappear inside brackets
        let expr = pipe_level(or_.clone());

        let ident = select! { Token::IDENT(name) => name };

        let intlit = select! { Token::INTLIT(value) => value }.try_map(|value: String, span: SourcePos| {
            value
                .parse::<i64>()
                .map(|n| Expr::Int(n, span.clone()))
                .map_err(|_| Rich::custom(span, "integer literal out of range"))
        });

        let floatlit = select! { Token::FLOATLIT(value) => value }.try_map(
            |value: String, span: SourcePos| {
                value
                    .parse::<f64>()
                    .map(|n| Expr::Float(n, span.clone()))
                    .map_err(|_| Rich::custom(span, "malformed float literal"))
            },
        );

        let stringlit = select! { Token::STRINGLIT(value) => value }
            .map_with(|value: String, ctx| Expr::Str(value, ctx.span()));

        let boollit = choice((
            just(Token::TRUE).to(true),
            just(Token::FALSE).to(false),
        ))
        .map_with(|value, ctx| Expr::Bool(value, ctx.span()));

        // `[int]()` and friends; the array-ness check is semantic
        let empty_array = choice((
            type_parser()
                .delimited_by(just(Token::L_SQUARE), just(Token::R_SQUARE))
                .map(|base: TypeExpr| TypeExpr::Array(base.boxed())),
            just(Token::INT).to(TypeExpr::Int),
            just(Token::FLOAT).to(TypeExpr::Float),
            just(Token::BOOL).to(TypeExpr::Bool),
            just(Token::STRING).to(TypeExpr::String),
        ))
        .then_ignore(just(Token::L_ROUND))
        .then_ignore(just(Token::R_ROUND))
        .map_with(|ty, ctx| Expr::EmptyArray(ty, ctx.span()));

        let array_lit = expr
            .clone()
            .separated_by(just(Token::COMMA))
            .at_least(1)
            .collect::<Vec<Expr>>()
            .delimited_by(just(Token::L_SQUARE), just(Token::R_SQUARE))
            .map_with(|elements, ctx| Expr::ArrayLit(elements, ctx.span()));

        let empty_optional = just(Token::NO)
            .ignore_then(type_parser())
            .map_with(|ty, ctx| Expr::EmptyOptional(ty, ctx.span()));

        let primary = choice((
            floatlit,
            intlit,
            stringlit,
            boollit,
            empty_array,
            array_lit,
            empty_optional,
            ident.map_with(|name, ctx| Expr::Ident(name, ctx.span())),
            expr.clone()
                .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND)),
        ));

        let postfix_op = choice((
            expr.clone()
                .delimited_by(just(Token::L_SQUARE), just(Token::R_SQUARE))
                .map(Postfix::Subscript),
            just(Token::DOT)
                .ignore_then(ident)
                .map_with(|field, ctx| Postfix::Member {
                    optional: false,
                    field,
                    span: ctx.span(),
                }),
            just(Token::QUESTION_DOT)
                .ignore_then(ident)
                .map_with(|field, ctx| Postfix::Member {
                    optional: true,
                    field,
                    span: ctx.span(),
                }),
            expr.clone()
                .separated_by(just(Token::COMMA))
                .collect::<Vec<Expr>>()
                .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND))
                .map_with(|args, ctx| Postfix::Call(args, ctx.span())),
        ));

        let postfix = primary.foldl(postfix_op.repeated(), |object, op| match op {
            Postfix::Subscript(index) => Expr::Subscript(object.boxed(), index.boxed()),
            Postfix::Member {
                optional,
                field,
                span,
            } => Expr::Member {
                object: object.boxed(),
                optional,
                field,
                field_span: span,
            },
            Postfix::Call(args, span) => {
                let span = object.span().start..span.end;
                Expr::Call {
                    callee: object.boxed(),
                    args,
                    span,
                }
            }
        });

        let unary = recursive(|unary: Recursive<dyn Parser<'src, I, Expr, ErrorParserExtra<'src>>>| {
            let prefix_op = choice((
                just(Token::MINUS).to(UnaryOp::Neg),
                just(Token::BANG).to(UnaryOp::Not),
                just(Token::SOME).to(UnaryOp::Some),
                just(Token::RANDOM).to(UnaryOp::Random),
            ));

            // a prefixed operand cannot be the base of `**`; `-2 ** 2`
            // needs parentheses
            let prefixed = prefix_op
                .map_with(|op, ctx| (op, ctx.span()))
                .repeated()
                .at_least(1)
                .foldr(postfix.clone(), |(op, span): (UnaryOp, SourcePos), operand| {
                    let span = span.start..operand.span().end;
                    Expr::Unary(op, operand.boxed(), span)
                });

            // ** is right-associative through its exponent
            let power = postfix
                .clone()
                .then(just(Token::STAR_STAR).ignore_then(unary).or_not())
                .map(|(base, exponent)| match exponent {
                    None => base,
                    Some(exponent) => {
                        Expr::Binary(BinaryOp::Pow, base.boxed(), exponent.boxed())
                    }
                });

            choice((prefixed, power))
        });

        let mult_op = choice((
            just(Token::STAR).to(BinaryOp::Mul),
            just(Token::SLASH).to(BinaryOp::Div),
            just(Token::PERCENT).to(BinaryOp::Mod),
        ));

        let mult = unary
            .clone()
            .foldl(mult_op.then(unary).repeated(), |lhs, (op, rhs)| {
                Expr::Binary(op, lhs.boxed(), rhs.boxed())
            });

        let sum_op = choice((
            just(Token::PLUS).to(BinaryOp::Add),
            just(Token::MINUS).to(BinaryOp::Sub),
        ));

        let sum = mult
            .clone()
            .foldl(sum_op.then(mult).repeated(), |lhs, (op, rhs)| {
                Expr::Binary(op, lhs.boxed(), rhs.boxed())
            });

        let rel_op = choice((
            just(Token::LESS_EQ).to(BinaryOp::LessEq),
            just(Token::GREATER_EQ).to(BinaryOp::GreaterEq),
            just(Token::LESS).to(BinaryOp::Less),
            just(Token::GREATER).to(BinaryOp::Greater),
            just(Token::EQ_EQ).to(BinaryOp::Eq),
            just(Token::BANG_EQ).to(BinaryOp::NotEq),
        ));

        // comparisons do not chain
        let compare = sum
            .clone()
            .then(rel_op.then(sum).or_not())
            .map(|(lhs, rhs)| match rhs {
                None => lhs,
                Some((op, rhs)) => Expr::Binary(op, lhs.boxed(), rhs.boxed()),
            });

        let and = compare.clone().foldl(
            just(Token::AND_AND).to(BinaryOp::And).then(compare).repeated(),
            |lhs, (op, rhs)| Expr::Binary(op, lhs.boxed(), rhs.boxed()),
        );

        and.clone().foldl(
            just(Token::OR_OR).to(BinaryOp::Or).then(and).repeated(),
            |lhs, (op, rhs)| Expr::Binary(op, lhs.boxed(), rhs.boxed()),
        )
    })
}

pub fn expr_parser<'src, I>() -> impl Parser<'src, I, Expr, ErrorParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    pipe_level(or_expr_parser())
}

#[derive(Clone)]
enum StmtTail {
    Assign(Vec<Expr>),
    Bump(BumpOp),
    PipeForward(Vec<Expr>),
    PipeBackward(Vec<Vec<Expr>>),
}

pub fn stmt_parser<'src, I>() -> impl Parser<'src, I, Stmt, ErrorParserExtra<'src>> + Clone
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    recursive(|stmt| {
        let ident = select! { Token::IDENT(name) => name };
        let expr = expr_parser();

        let nl = just(Token::NEWLINE).repeated().at_least(1);
        let nl0 = just(Token::NEWLINE).repeated();

        let stmt_list = stmt
            .clone()
            .then_ignore(just(Token::NEWLINE).repeated())
            .repeated()
            .collect::<Vec<Stmt>>();

        // a colon opens either an indented block or an inline statement
        let block = just(Token::COLON).ignore_then(choice((
            nl.clone()
                .ignore_then(just(Token::INDENT))
                .ignore_then(stmt_list.clone())
                .then_ignore(just(Token::DEDENT)),
            stmt.clone().map(|s| vec![s]),
        )));

        let param = type_parser()
            .then(ident)
            .map_with(|(ty, name), ctx| Param {
                ty,
                name,
                span: ctx.span(),
            });

        let fun_decl = just(Token::BLOCK)
            .ignore_then(ident)
            .then(
                param
                    .clone()
                    .separated_by(just(Token::COMMA))
                    .collect::<Vec<Param>>()
                    .delimited_by(just(Token::L_ROUND), just(Token::R_ROUND)),
            )
            .then(just(Token::SENDS).ignore_then(type_parser()).or_not())
            .then(block.clone())
            .map_with(|(((name, params), returns), body), ctx| Stmt::FunDecl {
                name,
                params,
                returns,
                body,
                span: ctx.span(),
            });

        let struct_decl = just(Token::STRUCT)
            .ignore_then(ident)
            .then_ignore(just(Token::COLON))
            .then_ignore(nl.clone())
            .then_ignore(just(Token::INDENT))
            .then(
                param
                    .then_ignore(just(Token::NEWLINE).repeated())
                    .repeated()
                    .collect::<Vec<Param>>(),
            )
            .then_ignore(just(Token::DEDENT))
            .map_with(|(name, fields), ctx| Stmt::StructDecl {
                name,
                fields,
                span: ctx.span(),
            });

        let if_stmt = recursive(|if_stmt| {
            just(Token::IF)
                .ignore_then(expr.clone())
                .then(block.clone())
                .then(
                    nl0.clone()
                        .ignore_then(just(Token::ELSE))
                        .ignore_then(choice((
                            if_stmt.map(|s| ElseTail::ElseIf(Box::new(s))),
                            block.clone().map(ElseTail::Block),
                        )))
                        .or_not(),
                )
                .map_with(|((test, consequent), alternate), ctx| Stmt::If {
                    test,
                    consequent,
                    alternate: alternate.unwrap_or(ElseTail::None),
                    span: ctx.span(),
                })
        });

        let while_stmt = just(Token::WHILE)
            .ignore_then(expr.clone())
            .then(block.clone())
            .map_with(|(test, body), ctx| Stmt::While {
                test,
                body,
                span: ctx.span(),
            });

        let repeat_stmt = just(Token::STACK)
            .ignore_then(expr.clone())
            .then(block.clone())
            .map_with(|(count, body), ctx| Stmt::Repeat {
                count,
                body,
                span: ctx.span(),
            });

        let range_op = choice((
            just(Token::DOTS_EXCLUSIVE).to(RangeOp::Exclusive),
            just(Token::DOTS_INCLUSIVE).to(RangeOp::Inclusive),
        ));

        let for_stmt = just(Token::FOR)
            .ignore_then(ident)
            .then_ignore(just(Token::IN))
            .then(or_expr_parser())
            .then(range_op.then(or_expr_parser()).or_not())
            .then(block.clone())
            .map_with(|(((name, first), bounds), body), ctx| match bounds {
                Some((op, high)) => Stmt::ForRange {
                    name,
                    low: first,
                    op,
                    high,
                    body,
                    span: ctx.span(),
                },
                None => Stmt::ForEach {
                    name,
                    collection: first,
                    body,
                    span: ctx.span(),
                },
            });

        let break_stmt = just(Token::BREAK).map_with(|_, ctx| Stmt::Break(ctx.span()));

        let send_stmt = just(Token::SEND)
            .ignore_then(expr.clone().or_not())
            .map_with(|value, ctx| Stmt::Return(value, ctx.span()));

        let var_decl = choice((
            just(Token::DOLLAR).ignore_then(choice((
                type_parser().then(ident).map(|(ty, name)| (Some(ty), name)),
                ident.map(|name| (None, name)),
            )))
            .map(|(ty, name)| (true, ty, name)),
            type_parser()
                .then(ident)
                .map(|(ty, name)| (false, Some(ty), name)),
        ))
        .then_ignore(just(Token::EQ))
        .then(expr.clone())
        .map_with(|((read_only, ty, name), init), ctx| Stmt::VarDecl {
            ty,
            read_only,
            name,
            init,
            span: ctx.span(),
        });

        let or_list = or_expr_parser()
            .separated_by(just(Token::COMMA))
            .at_least(1)
            .collect::<Vec<Expr>>();

        let stmt_tail = choice((
            just(Token::EQ)
                .ignore_then(
                    expr.clone()
                        .separated_by(just(Token::COMMA))
                        .at_least(1)
                        .collect::<Vec<Expr>>(),
                )
                .map(StmtTail::Assign),
            just(Token::PLUS_PLUS).to(StmtTail::Bump(BumpOp::Increment)),
            just(Token::MINUS_MINUS).to(StmtTail::Bump(BumpOp::Decrement)),
            just(Token::PIPE_FORWARD)
                .ignore_then(or_expr_parser())
                .repeated()
                .at_least(1)
                .collect::<Vec<Expr>>()
                .map(StmtTail::PipeForward),
            just(Token::PIPE_BACKWARD)
                .ignore_then(or_list.clone())
                .repeated()
                .at_least(1)
                .collect::<Vec<Vec<Expr>>>()
                .map(StmtTail::PipeBackward),
        ));

        let expr_stmt = or_list.then(stmt_tail.or_not()).try_map(
            |(mut head, tail): (Vec<Expr>, Option<StmtTail>), span: SourcePos| match tail {
                // only calls and pipes may stand alone as statements
                None => match head.pop() {
                    Some(
                        expr @ (Expr::Call { .. }
                        | Expr::PipeForward { .. }
                        | Expr::PipeBackward { .. }),
                    ) if head.is_empty() => Ok(Stmt::Call(expr)),
                    _ => Err(Rich::custom(span, "expected a call, an assignment, or a pipe")),
                },
                Some(StmtTail::Assign(sources)) => {
                    if head.len() == sources.len() {
                        Ok(Stmt::Assign {
                            targets: head,
                            sources,
                            span,
                        })
                    } else {
                        Err(Rich::custom(
                            span,
                            "assignment targets and sources differ in number",
                        ))
                    }
                }
                Some(StmtTail::Bump(op)) => {
                    if head.len() == 1 {
                        Ok(Stmt::Bump {
                            target: head.pop().unwrap(),
                            op,
                            span,
                        })
                    } else {
                        Err(Rich::custom(span, "++/-- take a single target"))
                    }
                }
                Some(StmtTail::PipeForward(stages)) => {
                    let mut acc = Expr::PipeForward {
                        args: head,
                        callee: stages[0].clone().boxed(),
                        span: span.clone(),
                    };
                    for callee in stages.into_iter().skip(1) {
                        acc = Expr::PipeForward {
                            args: vec![acc],
                            callee: callee.boxed(),
                            span: span.clone(),
                        };
                    }
                    Ok(Stmt::Call(acc))
                }
                Some(StmtTail::PipeBackward(mut groups)) => {
                    if head.len() != 1 {
                        return Err(Rich::custom(span, "<| takes a single callee"));
                    }
                    let mut args = groups.pop().unwrap();
                    for group in groups.into_iter().rev() {
                        let [callee] = <[Expr; 1]>::try_from(group).map_err(|_| {
                            Rich::custom(span.clone(), "<| stages take a single callee")
                        })?;
                        args = vec![Expr::PipeBackward {
                            callee: callee.boxed(),
                            args,
                            span: span.clone(),
                        }];
                    }
                    Ok(Stmt::Call(Expr::PipeBackward {
                        callee: head.pop().unwrap().boxed(),
                        args,
                        span,
                    }))
                }
            },
        );

        choice((
            fun_decl,
            struct_decl,
            if_stmt,
            while_stmt,
            repeat_stmt,
            for_stmt,
            break_stmt,
            send_stmt,
            var_decl,
            expr_stmt,
        ))
    })
}

pub fn program_parser<'src, I>() -> impl Parser<'src, I, Vec<Stmt>, ErrorParserExtra<'src>>
where
    I: ValueInput<'src, Token = Token, Span = SourcePos>,
{
    just(Token::NEWLINE)
        .repeated()
        .ignore_then(
            stmt_parser()
                .then_ignore(just(Token::NEWLINE).repeated())
                .repeated()
                .collect::<Vec<Stmt>>(),
        )
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use chumsky::{Parser, input::Input};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compile::parser::lex::lexer;
    use crate::compile::parser::preparse::with_indents_and_dedents;

    fn parse_program(src: &str) -> Vec<Stmt> {
        let src = with_indents_and_dedents(src).unwrap();
        let tokens = lexer().parse(src.as_str()).into_result().unwrap();
        let token_stream = tokens.map(src.len()..src.len(), |(t, s)| (t, s));

        program_parser().parse(token_stream).into_result().unwrap()
    }

    fn parse_fails(src: &str) -> bool {
        let Ok(src) = with_indents_and_dedents(src) else {
            return true;
        };
        let tokens = match lexer().parse(src.as_str()).into_result() {
            Ok(tokens) => tokens,
            Err(_) => return true,
        };
        let token_stream = tokens.map(src.len()..src.len(), |(t, s)| (t, s));

        program_parser().parse(token_stream).into_result().is_err()
    }

    #[test]
    fn parses_variable_declarations() {
        let stmts = parse_program("int x = 1\n$ y = 2.5\n$ string s = \"hi\"\n");

        assert_eq!(stmts.len(), 3);
        assert!(matches!(
            &stmts[0],
            Stmt::VarDecl {
                ty: Some(TypeExpr::Int),
                read_only: false,
                name,
                init: Expr::Int(1, _),
                ..
            } if name == "x"
        ));
        assert!(matches!(
            &stmts[1],
            Stmt::VarDecl {
                ty: None,
                read_only: true,
                name,
                ..
            } if name == "y"
        ));
        assert!(matches!(
            &stmts[2],
            Stmt::VarDecl {
                ty: Some(TypeExpr::String),
                read_only: true,
                ..
            }
        ));
    }

    #[test]
    fn power_binds_tighter_than_product_and_sum() {
        let stmts = parse_program("$ x = 2 * 3 + 5 ** -3\n");

        let Stmt::VarDecl { init, .. } = &stmts[0] else {
            panic!("expected a declaration");
        };
        let Expr::Binary(BinaryOp::Add, lhs, rhs) = init else {
            panic!("expected + at the top, got {init:?}");
        };
        assert!(matches!(**lhs, Expr::Binary(BinaryOp::Mul, _, _)));
        let Expr::Binary(BinaryOp::Pow, _, exponent) = &**rhs else {
            panic!("expected ** on the right, got {rhs:?}");
        };
        assert!(matches!(**exponent, Expr::Unary(UnaryOp::Neg, _, _)));
    }

    #[test]
    fn comparisons_do_not_chain() {
        assert!(parse_fails("$ x = 1 < 2 < 3\n"));
    }

    #[test]
    fn parses_indented_if_else_chain() {
        let stmts = parse_program("if false:\n  say(1)\nelse if true:\n  say(2)\nelse:\n  say(3)\n");

        let Stmt::If { alternate, .. } = &stmts[0] else {
            panic!("expected an if");
        };
        let ElseTail::ElseIf(nested) = alternate else {
            panic!("expected an else-if tail, got {alternate:?}");
        };
        assert!(matches!(
            &**nested,
            Stmt::If {
                alternate: ElseTail::Block(_),
                ..
            }
        ));
    }

    #[test]
    fn inline_blocks_after_colon() {
        let stmts = parse_program("while true: break\n");

        let Stmt::While { body, .. } = &stmts[0] else {
            panic!("expected a while");
        };
        assert_eq!(body.len(), 1);
        assert!(matches!(body[0], Stmt::Break(_)));
    }

    #[test]
    fn parses_function_declaration() {
        let stmts = parse_program("block gcd(int a, int b) sends int:\n  send a\n");

        let Stmt::FunDecl {
            name,
            params,
            returns,
            body,
            ..
        } = &stmts[0]
        else {
            panic!("expected a function declaration");
        };
        assert_eq!(name, "gcd");
        assert_eq!(params.len(), 2);
        assert_eq!(returns, &Some(TypeExpr::Int));
        assert!(matches!(&body[0], Stmt::Return(Some(_), _)));
    }

    #[test]
    fn forward_pipe_statement_collects_left_hand_values() {
        let stmts = parse_program("1, 2 |> hypot |> say\n");

        let Stmt::Call(Expr::PipeForward { args, callee, .. }) = &stmts[0] else {
            panic!("expected a pipe call");
        };
        assert!(matches!(&**callee, Expr::Ident(name, _) if name == "say"));
        assert_eq!(args.len(), 1);
        assert!(
            matches!(&args[0], Expr::PipeForward { args, .. } if args.len() == 2),
            "inner stage should carry both values"
        );
    }

    #[test]
    fn backward_pipe_statement_folds_to_the_right() {
        let stmts = parse_program("say <| hypot <| 3.0, 4.0\n");

        let Stmt::Call(Expr::PipeBackward { callee, args, .. }) = &stmts[0] else {
            panic!("expected a pipe call");
        };
        assert!(matches!(&**callee, Expr::Ident(name, _) if name == "say"));
        assert_eq!(args.len(), 1);
        assert!(
            matches!(&args[0], Expr::PipeBackward { args, .. } if args.len() == 2),
            "last stage should carry both values"
        );
    }

    #[test]
    fn distinguishes_range_and_collection_loops() {
        let stmts = parse_program("for i in 1..<10:\n  say(i)\nfor x in [1, 2]:\n  say(x)\n");

        assert!(matches!(
            &stmts[0],
            Stmt::ForRange {
                op: RangeOp::Exclusive,
                ..
            }
        ));
        assert!(matches!(&stmts[1], Stmt::ForEach { .. }));
    }

    #[test]
    fn parses_struct_declaration_and_member_access() {
        let stmts = parse_program("struct Pt:\n  int x\n  int y\nPt(1, 2).x |> say\n");

        let Stmt::StructDecl { name, fields, .. } = &stmts[0] else {
            panic!("expected a struct declaration");
        };
        assert_eq!(name, "Pt");
        assert_eq!(fields.len(), 2);

        let Stmt::Call(Expr::PipeForward { args, .. }) = &stmts[1] else {
            panic!("expected a pipe call");
        };
        assert!(matches!(
            &args[0],
            Expr::Member {
                optional: false,
                field,
                ..
            } if field == "x"
        ));
    }

    #[test]
    fn parses_empty_arrays_and_optionals() {
        let stmts = parse_program("$ a = [int]()\n$ b = no string\n$ c = some 5\n");

        assert!(matches!(
            &stmts[0],
            Stmt::VarDecl {
                init: Expr::EmptyArray(TypeExpr::Array(_), _),
                ..
            }
        ));
        assert!(matches!(
            &stmts[1],
            Stmt::VarDecl {
                init: Expr::EmptyOptional(TypeExpr::String, _),
                ..
            }
        ));
        assert!(matches!(
            &stmts[2],
            Stmt::VarDecl {
                init: Expr::Unary(UnaryOp::Some, _, _),
                ..
            }
        ));
    }

    #[test]
    fn parses_multiple_assignment() {
        let stmts = parse_program("$ a = 1\n$ b = 2\na, b = b, a\n");

        let Stmt::Assign {
            targets, sources, ..
        } = &stmts[2]
        else {
            panic!("expected an assignment");
        };
        assert_eq!(targets.len(), 2);
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn rejects_mismatched_assignment_arity() {
        assert!(parse_fails("a, b = 1\n"));
    }

    #[test]
    fn rejects_bare_expressions_in_statement_position() {
        assert!(parse_fails("x * 5\n"));
        assert!(parse_fails("42\n"));

        let stmts = parse_program("f()\n");
        assert!(matches!(&stmts[0], Stmt::Call(Expr::Call { .. })));
    }

    #[test]
    fn negation_cannot_be_the_base_of_a_power() {
        assert!(parse_fails("$ x = -2 ** 2\n"));

        let stmts = parse_program("$ x = -(2 ** 2)\n$ y = 2 ** -3\n");
        let Stmt::VarDecl { init, .. } = &stmts[0] else {
            panic!("expected a declaration");
        };
        assert!(matches!(
            init,
            Expr::Unary(UnaryOp::Neg, inner, _)
                if matches!(&**inner, Expr::Binary(BinaryOp::Pow, _, _))
        ));
        let Stmt::VarDecl { init, .. } = &stmts[1] else {
            panic!("expected a declaration");
        };
        assert!(matches!(
            init,
            Expr::Binary(BinaryOp::Pow, _, exponent)
                if matches!(&**exponent, Expr::Unary(UnaryOp::Neg, _, _))
        ));
    }

    #[test]
    fn subscript_and_bump_statements() {
        let stmts = parse_program("a[0] = 100\ni++\nj--\n");

        assert!(matches!(
            &stmts[0],
            Stmt::Assign { targets, .. } if matches!(targets[0], Expr::Subscript(_, _))
        ));
        assert!(matches!(
            &stmts[1],
            Stmt::Bump {
                op: BumpOp::Increment,
                ..
            }
        ));
        assert!(matches!(
            &stmts[2],
            Stmt::Bump {
                op: BumpOp::Decrement,
                ..
            }
        ));
    }
}
