use chumsky::{Parser, input::Input};

use buildlang::compile::ir::types::Type;
use buildlang::compile::ir::{self, Program};
use buildlang::compile::parser::lex::lexer;
use buildlang::compile::parser::parse::program_parser;
use buildlang::compile::parser::preparse::with_indents_and_dedents;
use buildlang::compile::semantic::{SemanticError, analyze};

fn analyzed(src: &str) -> Result<Program, SemanticError> {
    let src = with_indents_and_dedents(src).expect("layout failed");
    let tokens = lexer()
        .parse(src.as_str())
        .into_result()
        .unwrap_or_else(|err| panic!("lexing failed: {err:?}"));
    let token_stream = tokens.map(src.len()..src.len(), |(t, s)| (t, s));
    let ast = program_parser()
        .parse(token_stream)
        .into_result()
        .unwrap_or_else(|err| panic!("parsing failed: {err:?}"));

    analyze(&ast)
}

#[test]
fn accepts_semantically_correct_programs() {
    let programs = [
        ("variable declarations", "int x = 1\nbool y = false"),
        ("increment and decrement", "int x = 10\nx--\nx++"),
        ("assign arrays", "$ a = [1]\n$ b = [2, 3]\nsay(a == b)"),
        ("assign to array element", "int x = 1\n$ a = [1, 2, 3]\na[1] = 100"),
        ("short return", "block f():\n  send"),
        ("long return", "block f() sends bool:\n  send true"),
        ("recursive call", "block f(int n) sends int:\n  send f(n - 1)"),
        ("return in nested if", "block f():\n  if true:\n    send"),
        ("break in nested if", "while false:\n  if true:\n    break"),
        ("long if", "if true:\n  say(1)\nelse:\n  say(3)"),
        (
            "else-if chain",
            "if true:\n  say(1)\nelse if true:\n  say(0)\nelse:\n  say(3)",
        ),
        ("for over collection", "for i in [2, 3, 5]:\n  say(i)"),
        ("for in exclusive range", "for i in 1..<10:\n  say(i)"),
        ("for in inclusive range", "for i in 1...3:\n  say(i)"),
        ("repeat", "stack 3:\n  $ a = 1\n  say(a)"),
        ("or chains", "say(true || 1 < 2 || false || !true)"),
        ("and chains", "say(true && 1 < 2 && false && !true)"),
        ("array equality", "say([1] == [5, 8])"),
        ("arithmetic", "$ x = 1\nsay(2 * 3 + 5 ** -3 / 2 - 5 % 8)"),
        ("array length", "say([1, 2, 3].length)"),
        ("subscripts", "$ a = [1, 2]\nsay(a[0])"),
        ("random over an array", "$ a = [true, false]\nsay(random a)"),
        ("empty optionals", "$ b = no string\nsay(no [int])"),
        ("empty arrays", "$ a = [int]()"),
        ("optional values", "int? x = some 100"),
        ("built-in constants", "say(25.0 * π)"),
        ("built-in sin", "say(sin(π))"),
        ("built-in hypot", "say(hypot(-4.0, 3.00001))"),
        ("built-in bytes", "say(bytes(\"hello\"))"),
        ("member access", "struct S:\n  int x\n$ y = S(1)\nsay(y.x)"),
        (
            "optional member access",
            "struct S:\n  int x\n$ y = some S(1)\nsay(y?.x)",
        ),
        ("optionally recursive struct", "struct S:\n  S? next\n$ x = S(no S)"),
        ("assigned functions", "block f():\n  send\n$ g = f"),
        (
            "nested array equivalence",
            "block f([[int]] m):\n  send\nf([[1], [2]])",
        ),
        ("multiple assignment", "int a = 1\nint b = 2\na, b = b, a"),
        ("forward pipes", "3.0, 4.0 |> hypot |> say"),
        ("backward pipes", "say <| hypot <| 3.0, 4.0"),
        ("pipes into constructors", "struct S:\n  int x\n1 |> S |> say"),
    ];

    for (scenario, src) in programs {
        let result = analyzed(src);
        assert!(result.is_ok(), "{scenario}: {:?}", result.err());
    }
}

#[test]
fn rejects_rule_violations() {
    let cases = [
        ("bool x = false\nx++", "an integer"),
        ("say(x)", "Identifier x not declared"),
        ("int x = 1\nint x = 1", "Identifier x already declared"),
        ("$ x = 1\nx = 2", "Cannot assign to constant x"),
        ("int x = 1\nx = true", "Cannot assign a bool to a int"),
        ("int x = 1\nx = [true]", "Cannot assign a [bool] to a int"),
        ("int x = 1\nx = some 2", "Cannot assign a int? to a int"),
        ("break", "Break can only appear in a loop"),
        (
            "while true:\n  block f():\n    break",
            "Break can only appear in a loop",
        ),
        ("send", "Return can only appear in a function"),
        ("block f():\n  send(1)", "Cannot return a value"),
        ("block f() sends int:\n  send", "should be returned"),
        ("block f() sends int:\n  send false", "bool to a int"),
        ("if 1:\n  say(1)", "Expected a boolean"),
        ("while 1:\n  say(1)", "Expected a boolean"),
        ("stack \"1\":\n  say(1)", "Expected an integer"),
        ("for i in true...2:\n  say(i)", "Expected an integer"),
        ("for i in 1..<3.14:\n  say(i)", "Expected an integer"),
        ("for i in 100:\n  say(i)", "Expected an array"),
        ("say(false || 1)", "Expected a boolean"),
        ("say(false == 1)", "Operands do not have the same type"),
        ("say(2 == 2.0)", "Operands do not have the same type"),
        ("say(false + 1)", "Expected a number or string"),
        ("say(false < 1)", "Expected a number or string"),
        ("say(false - 1)", "Expected a number"),
        ("say(false ** 1)", "Expected a number"),
        ("say(-true)", "Expected a number"),
        ("say(!\"hello\")", "Expected a boolean"),
        ("say(random 3)", "Expected an array"),
        ("$ a = [1]\nsay(a[false])", "Expected an integer"),
        ("say([3, 3.0])", "Not all elements have the same type"),
        ("$ x = 1\nwhile true:\n  $ x = 1", "Identifier x already declared"),
        ("$ x = 1\nsay(x())", "Call of non-function or non-constructor"),
        ("1 |> 2", "Call of non-function or non-constructor"),
        (
            "block f(int x):\n  send\nf(1, 2)",
            "1 argument(s) required but 2 passed",
        ),
        (
            "block f(int x):\n  send\nf()",
            "1 argument(s) required but 0 passed",
        ),
        ("1, 2, 3 |> hypot", "2 argument(s) required but 3 passed"),
        ("block f(int x):\n  send\nf(false)", "Cannot assign a bool to a int"),
        ("say(sin(true))", "Cannot assign a bool to a float"),
        ("$ x = 1\nblock f(x y):\n  send", "Type expected"),
        ("$ a = 1\nsay(a.x)", "Expected a struct"),
        ("$ a = 1\nsay(a?.x)", "Expected an optional struct"),
        (
            "struct S:\n  int x\n$ y = S(1)\nsay(y.z)",
            "No such field",
        ),
        ("struct S:\n  int x\n  int x\nsay(1)", "Fields must be distinct"),
        (
            "struct S:\n  S me\nsay(1)",
            "must not be self-containing",
        ),
        ("struct S:\n  int x\n$ a = S", "cannot be used as a value"),
        ("$ a = int()", "Must be an array type"),
    ];

    for (src, fragment) in cases {
        let err = analyzed(src)
            .err()
            .unwrap_or_else(|| panic!("{src:?} should have been rejected"));
        let message = err.to_string();
        assert!(
            message.contains(fragment),
            "{src:?}: got {message:?}, wanted {fragment:?}"
        );
    }
}

#[test]
fn produces_typed_declarations() {
    let Program(stmts) = analyzed("int x = 1\nbool y = false").unwrap();

    assert_eq!(stmts.len(), 2);
    let ir::Stmt::VarDecl { variable, init } = &stmts[0] else {
        panic!("expected a declaration");
    };
    assert_eq!(variable.name, "x");
    assert!(matches!(variable.ty, Type::Int));
    assert!(matches!(init, ir::Expr::Int(1)));
    let ir::Stmt::VarDecl { variable, .. } = &stmts[1] else {
        panic!("expected a declaration");
    };
    assert!(matches!(variable.ty, Type::Bool));
}

#[test]
fn infers_declaration_types_from_initializers() {
    let Program(stmts) = analyzed("$ x = π + 2.2").unwrap();

    let ir::Stmt::VarDecl { variable, init } = &stmts[0] else {
        panic!("expected a declaration");
    };
    assert!(variable.read_only);
    assert!(matches!(variable.ty, Type::Float));
    assert!(matches!(init, ir::Expr::Binary { ty: Type::Float, .. }));
}

#[test]
fn resolves_loop_iterators_read_only() {
    let Program(stmts) = analyzed("for i in 1..<10:\n  say(i)").unwrap();

    let ir::Stmt::ForRange { iterator, .. } = &stmts[0] else {
        panic!("expected a range loop");
    };
    assert!(iterator.read_only);
    assert!(matches!(iterator.ty, Type::Int));
}

#[test]
fn rejects_assigning_into_a_loop_iterator() {
    let err = analyzed("for i in 1..<10:\n  i = 2").unwrap_err();

    assert!(err.to_string().contains("Cannot assign to constant i"));
}

#[test]
fn member_access_through_optional_yields_an_optional() {
    let Program(stmts) = analyzed("struct S:\n  int x\n$ y = some S(1)\n$ z = y?.x").unwrap();

    let ir::Stmt::VarDecl { variable, .. } = &stmts[2] else {
        panic!("expected a declaration");
    };
    assert!(matches!(&variable.ty, Type::Optional(base) if matches!(**base, Type::Int)));
}
