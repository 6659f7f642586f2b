use std::collections::HashMap;
use std::rc::Rc;

use crate::compile::ast::{BinaryOp, BumpOp, RangeOp};
use crate::compile::ir::entities::{Function, Variable};
use crate::compile::ir::{Expr, Program, Stmt, UnaryOp};

/// Pretty-prints an optimized program as JavaScript, one statement per
/// line. Every entity is renamed `name_N`, numbered by first use, so
/// target keywords can never collide with source names.
pub fn generate(program: &Program) -> String {
    let mut generator = Generator::default();
    for stmt in &program.0 {
        generator.stmt(stmt);
    }

    generator.output.join("\n")
}

#[derive(Default)]
struct Generator {
    output: Vec<String>,
    names: HashMap<usize, usize>,
    next: usize,
}

impl Generator {
    fn number_for(&mut self, ptr: usize) -> usize {
        if let Some(n) = self.names.get(&ptr) {
            return *n;
        }
        self.next += 1;
        self.names.insert(ptr, self.next);

        self.next
    }

    fn variable_name(&mut self, variable: &Rc<Variable>) -> String {
        // the lone standard-library variable
        if variable.name == "π" {
            return "Math.PI".to_string();
        }
        let n = self.number_for(Rc::as_ptr(variable) as usize);

        format!("{}_{n}", variable.name)
    }

    fn function_name(&mut self, function: &Rc<Function>) -> String {
        let n = self.number_for(Rc::as_ptr(function) as usize);

        format!("{}_{n}", function.name)
    }

    fn fresh(&mut self, base: &str) -> String {
        self.next += 1;

        format!("{base}_{}", self.next)
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { variable, init } => {
                let init = self.expr(init);
                let name = self.variable_name(variable);
                self.output.push(format!("let {name} = {init};"));
            }

            Stmt::FunDecl {
                function,
                params,
                body,
            } => {
                let name = self.function_name(function);
                let params = params
                    .iter()
                    .map(|p| self.variable_name(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.output.push(format!("function {name}({params}) {{"));
                for stmt in body {
                    self.stmt(stmt);
                }
                self.output.push("}".to_string());
            }

            Stmt::StructDecl(strukt) => {
                let n = self.number_for(Rc::as_ptr(strukt) as usize);
                let name = format!("{}_{n}", strukt.name);
                let fields = strukt.fields.borrow();
                let params = fields
                    .iter()
                    .map(|f| format!("{}_", f.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.output.push(format!("class {name} {{"));
                self.output.push(format!("constructor({params}) {{"));
                for field in fields.iter() {
                    self.output
                        .push(format!("this[{:?}] = {}_;", field.name, field.name));
                }
                self.output.push("}".to_string());
                self.output.push("}".to_string());
            }

            Stmt::Assign { target, source } => {
                let target = self.expr(target);
                let source = self.expr(source);
                self.output.push(format!("{target} = {source};"));
            }

            Stmt::Sequence(stmts) => {
                for stmt in stmts {
                    self.stmt(stmt);
                }
            }

            Stmt::Bump { target, op } => {
                let target = self.expr(target);
                let op = match op {
                    BumpOp::Increment => "++",
                    BumpOp::Decrement => "--",
                };
                self.output.push(format!("{target}{op};"));
            }

            Stmt::Break => self.output.push("break;".to_string()),

            Stmt::Return(Some(value)) => {
                let value = self.expr(value);
                self.output.push(format!("return {value};"));
            }
            Stmt::Return(None) => self.output.push("return;".to_string()),

            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                let test = self.expr(test);
                self.output.push(format!("if ({test}) {{"));
                for stmt in consequent {
                    self.stmt(stmt);
                }
                match alternate.as_slice() {
                    [] => self.output.push("}".to_string()),
                    // else-if chains continue on the same line
                    [nested @ Stmt::If { .. }] => {
                        self.output.push("} else".to_string());
                        self.stmt(nested);
                    }
                    stmts => {
                        self.output.push("} else {".to_string());
                        for stmt in stmts {
                            self.stmt(stmt);
                        }
                        self.output.push("}".to_string());
                    }
                }
            }

            Stmt::While { test, body } => {
                let test = self.expr(test);
                self.output.push(format!("while ({test}) {{"));
                for stmt in body {
                    self.stmt(stmt);
                }
                self.output.push("}".to_string());
            }

            Stmt::Repeat { count, body } => {
                let count = self.expr(count);
                let i = self.fresh("i");
                self.output
                    .push(format!("for (let {i} = 0; {i} < {count}; {i}++) {{"));
                for stmt in body {
                    self.stmt(stmt);
                }
                self.output.push("}".to_string());
            }

            Stmt::ForRange {
                iterator,
                low,
                op,
                high,
                body,
            } => {
                let low = self.expr(low);
                let high = self.expr(high);
                let i = self.variable_name(iterator);
                let cmp = match op {
                    RangeOp::Inclusive => "<=",
                    RangeOp::Exclusive => "<",
                };
                self.output.push(format!(
                    "for (let {i} = {low}; {i} {cmp} {high}; {i}++) {{"
                ));
                for stmt in body {
                    self.stmt(stmt);
                }
                self.output.push("}".to_string());
            }

            Stmt::ForEach {
                iterator,
                collection,
                body,
            } => {
                let collection = self.expr(collection);
                let i = self.variable_name(iterator);
                self.output.push(format!("for (let {i} of {collection}) {{"));
                for stmt in body {
                    self.stmt(stmt);
                }
                self.output.push("}".to_string());
            }

            Stmt::Call(expr) => {
                let code = self.expr(expr);
                self.output.push(format!("{code};"));
            }
        }
    }

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Int(value) => value.to_string(),
            Expr::Float(value) => value.to_string(),
            Expr::Str(value) => format!("{value:?}"),
            Expr::Bool(value) => value.to_string(),

            Expr::Variable(variable) => self.variable_name(variable),
            Expr::Function(function) => self.function_name(function),

            Expr::Binary { op, lhs, rhs, .. } => {
                let lhs = self.expr(lhs);
                let rhs = self.expr(rhs);
                let op = match op {
                    BinaryOp::Or => "||",
                    BinaryOp::And => "&&",
                    BinaryOp::Less => "<",
                    BinaryOp::LessEq => "<=",
                    BinaryOp::Greater => ">",
                    BinaryOp::GreaterEq => ">=",
                    BinaryOp::Eq => "===",
                    BinaryOp::NotEq => "!==",
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                    BinaryOp::Mod => "%",
                    BinaryOp::Pow => "**",
                };

                format!("({lhs} {op} {rhs})")
            }

            Expr::Unary { op, operand, .. } => {
                let operand = self.expr(operand);
                match op {
                    UnaryOp::Neg => format!("-({operand})"),
                    UnaryOp::Not => format!("!({operand})"),
                    // an optional is just its value at runtime
                    UnaryOp::Some => operand,
                    UnaryOp::Random => {
                        format!("((a=>a[~~(Math.random()*a.length)])({operand}))")
                    }
                    UnaryOp::Len => format!("{operand}.length"),
                }
            }

            Expr::Subscript { array, index, .. } => {
                let array = self.expr(array);
                let index = self.expr(index);

                format!("{array}[{index}]")
            }

            Expr::ArrayLit { elements, .. } => {
                let elements = elements
                    .iter()
                    .map(|e| self.expr(e))
                    .collect::<Vec<_>>()
                    .join(",");

                format!("[{elements}]")
            }

            Expr::EmptyArray(_) => "[]".to_string(),
            Expr::EmptyOptional(_) => "undefined".to_string(),

            Expr::Member {
                object,
                optional,
                field,
                ..
            } => {
                let object = self.expr(object);
                let chain = if *optional { "?." } else { "" };

                format!("({object}{chain}[{field:?}])")
            }

            Expr::Call { callee, args, .. }
            | Expr::PipeForward { callee, args, .. }
            | Expr::PipeBackward { callee, args, .. } => self.call(callee, args),

            Expr::ConstructorCall { strukt, args } => {
                let args = args
                    .iter()
                    .map(|a| self.expr(a))
                    .collect::<Vec<_>>()
                    .join(", ");
                let n = self.number_for(Rc::as_ptr(strukt) as usize);

                format!("new {}_{n}({args})", strukt.name)
            }
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();

        // standard-library functions map to fixed runtime idioms
        if let Expr::Function(function) = callee {
            match (function.name.as_str(), args.as_slice()) {
                ("say", [x]) => return format!("console.log({x})"),
                ("sin", [x]) => return format!("Math.sin({x})"),
                ("cos", [x]) => return format!("Math.cos({x})"),
                ("exp", [x]) => return format!("Math.exp({x})"),
                ("ln", [x]) => return format!("Math.log({x})"),
                ("hypot", [x, y]) => return format!("Math.hypot({x},{y})"),
                ("bytes", [s]) => return format!("[...Buffer.from({s}, \"utf8\")]"),
                ("codepoints", [s]) => return format!("[...({s})].map(s=>s.codePointAt(0))"),
                _ => {}
            }
        }

        let callee = self.expr(callee);

        format!("{callee}({})", args.join(", "))
    }
}
