use chumsky::prelude::*;

use super::Spanned;
use super::preparse::{DEDENT_MARK, INDENT_MARK};

#[derive(Clone, Debug, PartialEq)]
#[allow(non_camel_case_types)]
pub enum Token {
    IDENT(String),
    INTLIT(String),
    FLOATLIT(String),
    STRINGLIT(String),
    TRUE,
    FALSE,
    BLOCK,
    SENDS,
    SEND,
    STRUCT,
    IF,
    ELSE,
    WHILE,
    FOR,
    IN,
    STACK,
    BREAK,
    NO,
    SOME,
    RANDOM,
    INT,
    FLOAT,
    BOOL,
    STRING,
    VOID,
    DOLLAR,
    L_ROUND,
    R_ROUND,
    L_SQUARE,
    R_SQUARE,
    COMMA,
    COLON,
    QUESTION,
    QUESTION_DOT,
    DOT,
    DOTS_EXCLUSIVE,
    DOTS_INCLUSIVE,
    ARROW,
    PIPE_FORWARD,
    PIPE_BACKWARD,
    PLUS_PLUS,
    MINUS_MINUS,
    EQ_EQ,
    BANG_EQ,
    LESS_EQ,
    GREATER_EQ,
    LESS,
    GREATER,
    EQ,
    OR_OR,
    AND_AND,
    BANG,
    PLUS,
    MINUS,
    STAR_STAR,
    STAR,
    SLASH,
    PERCENT,
    NEWLINE,
    INDENT,
    DEDENT,
}

type ErrorParserExtra<'src> = extra::Err<Rich<'src, char, SimpleSpan>>;

fn floatlit<'src>() -> impl Parser<'src, &'src str, Token, ErrorParserExtra<'src>> {
    text::int(10)
        .then(just('.'))
        .then(text::digits(10))
        .then(
            one_of("eE")
                .then(one_of("+-").or_not())
                .then(text::digits(10))
                .or_not(),
        )
        .to_slice()
        .map(|value: &'src str| Token::FLOATLIT(value.to_string()))
}

fn intlit<'src>() -> impl Parser<'src, &'src str, Token, ErrorParserExtra<'src>> {
    text::int(10).map(|value: &'src str| Token::INTLIT(value.to_string()))
}

fn stringlit<'src>() -> impl Parser<'src, &'src str, Token, ErrorParserExtra<'src>> {
    none_of('"')
        .repeated()
        .to_slice()
        .delimited_by(just('"'), just('"'))
        .map(|value: &'src str| Token::STRINGLIT(value.to_string()))
}

pub fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<Spanned<Token>>, ErrorParserExtra<'src>> {
    let ident = text::unicode::ident().map(|ident: &str| match ident {
        "block" => Token::BLOCK,
        "sends" => Token::SENDS,
        "send" => Token::SEND,
        "struct" => Token::STRUCT,
        "if" => Token::IF,
        "else" => Token::ELSE,
        "while" => Token::WHILE,
        "for" => Token::FOR,
        "in" => Token::IN,
        "stack" => Token::STACK,
        "break" => Token::BREAK,
        "no" => Token::NO,
        "some" => Token::SOME,
        "random" => Token::RANDOM,
        "true" => Token::TRUE,
        "false" => Token::FALSE,
        "int" => Token::INT,
        "float" => Token::FLOAT,
        "bool" => Token::BOOL,
        "string" => Token::STRING,
        "void" => Token::VOID,
        _ => Token::IDENT(ident.to_string()),
    });

    // longest symbols first, so e.g. `..<` never lexes as `.` `.` `<`
    let compound = choice((
        just("...").to(Token::DOTS_INCLUSIVE),
        just("..<").to(Token::DOTS_EXCLUSIVE),
        just("|>").to(Token::PIPE_FORWARD),
        just("<|").to(Token::PIPE_BACKWARD),
        just("->").to(Token::ARROW),
        just("++").to(Token::PLUS_PLUS),
        just("--").to(Token::MINUS_MINUS),
        just("**").to(Token::STAR_STAR),
        just("==").to(Token::EQ_EQ),
        just("!=").to(Token::BANG_EQ),
        just("<=").to(Token::LESS_EQ),
        just(">=").to(Token::GREATER_EQ),
        just("||").to(Token::OR_OR),
        just("&&").to(Token::AND_AND),
        just("?.").to(Token::QUESTION_DOT),
    ));

    let simple = choice((
        just("$").to(Token::DOLLAR),
        just("(").to(Token::L_ROUND),
        just(")").to(Token::R_ROUND),
        just("[").to(Token::L_SQUARE),
        just("]").to(Token::R_SQUARE),
        just(",").to(Token::COMMA),
        just(":").to(Token::COLON),
        just("?").to(Token::QUESTION),
        just(".").to(Token::DOT),
        just("<").to(Token::LESS),
        just(">").to(Token::GREATER),
        just("=").to(Token::EQ),
        just("!").to(Token::BANG),
        just("+").to(Token::PLUS),
        just("-").to(Token::MINUS),
        just("*").to(Token::STAR),
        just("/").to(Token::SLASH),
        just("%").to(Token::PERCENT),
    ));

    let layout = choice((
        just(INDENT_MARK).to(Token::INDENT),
        just(DEDENT_MARK).to(Token::DEDENT),
        text::newline().to(Token::NEWLINE),
    ));

    let comment = just("//")
        .then(any().and_is(text::newline().not()).repeated())
        .to(());

    let pad = one_of(" \t").to(()).or(comment).repeated();

    choice((floatlit(), intlit(), stringlit(), ident, compound, simple, layout))
        .map_with(|token, ctx| (token, ctx.span().into()))
        .padded_by(pad)
        .repeated()
        .collect()
        .then_ignore(end())
}
