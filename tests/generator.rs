use chumsky::{Parser, input::Input};
use pretty_assertions::assert_eq;

use buildlang::compile::generate::generate;
use buildlang::compile::ir::optimize::optimize;
use buildlang::compile::parser::lex::lexer;
use buildlang::compile::parser::parse::program_parser;
use buildlang::compile::parser::preparse::with_indents_and_dedents;
use buildlang::compile::semantic::analyze;

fn js(src: &str) -> String {
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
    let program = analyze(&ast).unwrap_or_else(|err| panic!("analysis failed: {err}"));

    generate(&optimize(program))
}

#[test]
fn emits_declarations_and_bumps() {
    let src = "\
int x = 3 * 7
x++
x--
bool y = true
y = true || false
say(y && x != 5)";

    let expected = "\
let x_1 = 21;
x_1++;
x_1--;
let y_2 = true;
y_2 = true;
console.log((y_2 && (x_1 !== 5)));";

    assert_eq!(js(src), expected);
}

#[test]
fn emits_if_else_chains() {
    let src = "\
int x = 0
if x == 0:
  say(\"1\")
if x == 0:
  say(1)
else:
  say(2)
if x == 0:
  say(1)
else if x == 2:
  say(3)
else:
  say(4)";

    let expected = "\
let x_1 = 0;
if ((x_1 === 0)) {
console.log(\"1\");
}
if ((x_1 === 0)) {
console.log(1);
} else {
console.log(2);
}
if ((x_1 === 0)) {
console.log(1);
} else
if ((x_1 === 2)) {
console.log(3);
} else {
console.log(4);
}";

    assert_eq!(js(src), expected);
}

#[test]
fn emits_loops() {
    let src = "\
stack 3:
  say(\"hi\")
for i in 1..<10:
  say(i)
for k in 5...7:
  say(k)
for j in [10, 20, 30]:
  say(j)
while true:
  break";

    let expected = "\
for (let i_1 = 0; i_1 < 3; i_1++) {
console.log(\"hi\");
}
for (let i_2 = 1; i_2 < 10; i_2++) {
console.log(i_2);
}
for (let k_3 = 5; k_3 <= 7; k_3++) {
console.log(k_3);
}
for (let j_4 of [10,20,30]) {
console.log(j_4);
}
while (true) {
break;
}";

    assert_eq!(js(src), expected);
}

#[test]
fn emits_functions_and_resolves_pipes_to_calls() {
    let src = "\
block next(int n) sends int:
  send n + 1
1 |> next |> say
say <| next <| 2";

    let expected = "\
function next_1(n_2) {
return (n_2 + 1);
}
console.log(next_1(1));
console.log(next_1(2));";

    assert_eq!(js(src), expected);
}

#[test]
fn emits_structs_and_member_accesses() {
    let src = "\
struct Point:
  float x
  float y
$ p = Point(1.5, 2.5)
say(p.x)
$ q = some p
say(q?.y)";

    let expected = "\
class Point_1 {
constructor(x_, y_) {
this[\"x\"] = x_;
this[\"y\"] = y_;
}
}
let p_2 = new Point_1(1.5, 2.5);
console.log((p_2[\"x\"]));
let q_3 = p_2;
console.log((q_3?.[\"y\"]));";

    assert_eq!(js(src), expected);
}

#[test]
fn maps_standard_library_calls_to_runtime_idioms() {
    let src = "\
$ r = 1.5
say(sin(r) + cos(r) + exp(r) + ln(r) + hypot(r, 2.3))
say(bytes(\"∞§¶•\"))
say(codepoints(\"abc\"))
say(π)";

    let expected = "\
let r_1 = 1.5;
console.log(((((Math.sin(r_1) + Math.cos(r_1)) + Math.exp(r_1)) + Math.log(r_1)) + Math.hypot(r_1,2.3)));
console.log([...Buffer.from(\"∞§¶•\", \"utf8\")]);
console.log([...(\"abc\")].map(s=>s.codePointAt(0)));
console.log(Math.PI);";

    assert_eq!(js(src), expected);
}

#[test]
fn emits_assignments_arrays_and_optionals() {
    let src = "\
int a = 1
int b = 2
a, b = b, a
$ c = [bool]()
$ d = no int
say(random [1, 2, 3])
$ e = [10, 20]
e[0] = e[1] - 1
say(e[0 + 1])
say([1, 2].length)";

    let expected = "\
let a_1 = 1;
let b_2 = 2;
a_1 = b_2;
b_2 = a_1;
let c_3 = [];
let d_4 = undefined;
console.log(((a=>a[~~(Math.random()*a.length)])([1,2,3])));
let e_5 = [10,20];
e_5[0] = (e_5[1] - 1);
console.log(e_5[1]);
console.log([1,2].length);";

    assert_eq!(js(src), expected);
}

#[test]
fn renames_shadow_free_but_reused_names_apart() {
    let src = "\
block f() sends int:
  int x = 1
  send x
block g() sends int:
  int x = 2
  send x
say(f() + g())";

    let expected = "\
function f_1() {
let x_2 = 1;
return x_2;
}
function g_3() {
let x_4 = 2;
return x_4;
}
console.log((f_1() + g_3()));";

    assert_eq!(js(src), expected);
}
