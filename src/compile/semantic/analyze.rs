use std::collections::HashSet;
use std::rc::Rc;

use crate::compile::ast::{self, BinaryOp, ElseTail, SourcePos, TypeExpr};
use crate::compile::ir::entities::{
    Entity, Field, Function, StructType, Variable, standard_library,
};
use crate::compile::ir::types::Type;
use crate::compile::ir::{self, UnaryOp};
use crate::compile::semantic::SemanticError;
use crate::datstructures::scope_chain::{ScopeChain, ScopeId};

/// Ambient context carried by every scope: whether a `break` is legal
/// here, and which function a `send` would leave. A function body resets
/// both, so neither crosses a function boundary.
#[derive(Debug, Clone, Default)]
struct Ambient {
    in_loop: bool,
    function: Option<Rc<Function>>,
}

/// Walks the parse tree once, resolving names and checking every static
/// rule, and produces the typed program.
pub fn analyze(program: &[ast::Stmt]) -> Result<ir::Program, SemanticError> {
    let mut analyzer = Analyzer::new();
    let statements = analyzer.stmt_list(program)?;

    Ok(ir::Program(statements))
}

struct Analyzer {
    scopes: ScopeChain<Entity, Ambient>,
    current: ScopeId,
}

enum CallLike {
    Constructor(Rc<StructType>, Vec<ir::Expr>),
    Function(ir::Expr, Vec<ir::Expr>, Type),
}

impl Analyzer {
    fn new() -> Self {
        let mut scopes = ScopeChain::with_root(Ambient::default());
        let root = scopes.root();
        for (name, entity) in standard_library() {
            let _ = scopes.declare(root, &name, entity);
        }

        Analyzer {
            scopes,
            current: root,
        }
    }

    fn declare(
        &mut self,
        name: &str,
        entity: Entity,
        span: &SourcePos,
    ) -> Result<(), SemanticError> {
        self.scopes
            .declare(self.current, name, entity)
            .map_err(|_| SemanticError::AlreadyDeclared {
                name: name.to_string(),
                span: span.clone(),
            })
    }

    fn resolve(&self, name: &str, span: &SourcePos) -> Result<Entity, SemanticError> {
        self.scopes
            .resolve(self.current, name)
            .cloned()
            .ok_or_else(|| SemanticError::NotDeclared {
                name: name.to_string(),
                span: span.clone(),
            })
    }

    fn resolve_type(&self, ty: &TypeExpr) -> Result<Type, SemanticError> {
        Ok(match ty {
            TypeExpr::Int => Type::Int,
            TypeExpr::Float => Type::Float,
            TypeExpr::Bool => Type::Bool,
            TypeExpr::String => Type::String,
            TypeExpr::Void => Type::Void,
            TypeExpr::Named(name, span) => match self.scopes.resolve(self.current, name) {
                Some(Entity::Struct(strukt)) => Type::Struct(strukt.clone()),
                _ => return Err(SemanticError::NotAType { span: span.clone() }),
            },
            TypeExpr::Array(base) => Type::array(self.resolve_type(base)?),
            TypeExpr::Optional(base) => Type::optional(self.resolve_type(base)?),
            TypeExpr::Function(params, returns) => {
                let params = params
                    .iter()
                    .map(|p| self.resolve_type(p))
                    .collect::<Result<Vec<_>, _>>()?;

                Type::function(params, self.resolve_type(returns)?)
            }
        })
    }

    fn stmt_list(&mut self, stmts: &[ast::Stmt]) -> Result<Vec<ir::Stmt>, SemanticError> {
        stmts.iter().map(|s| self.stmt(s)).collect()
    }

    /// Analyzes a statement list in a fresh child scope, optionally
    /// marking the child as a loop body.
    fn nested_stmt_list(
        &mut self,
        stmts: &[ast::Stmt],
        in_loop: bool,
    ) -> Result<Vec<ir::Stmt>, SemanticError> {
        let parent = self.current;
        self.current = self.scopes.child(parent);
        if in_loop {
            self.scopes.ctx_mut(self.current).in_loop = true;
        }
        let body = self.stmt_list(stmts);
        self.current = parent;

        body
    }

    fn stmt(&mut self, stmt: &ast::Stmt) -> Result<ir::Stmt, SemanticError> {
        match stmt {
            ast::Stmt::VarDecl {
                ty,
                read_only,
                name,
                init,
                span,
            } => {
                let init_span = init.span();
                let init = self.expr(init)?;
                let declared = match ty {
                    Some(ty) => {
                        let declared = self.resolve_type(ty)?;
                        if !init.ty().assignable_to(&declared) {
                            return Err(SemanticError::NotAssignable {
                                from: init.ty().to_string(),
                                target: declared.to_string(),
                                span: init_span,
                            });
                        }
                        declared
                    }
                    None => init.ty(),
                };
                let variable = Variable::new(name, *read_only, declared);
                self.declare(name, Entity::Variable(variable.clone()), span)?;

                Ok(ir::Stmt::VarDecl { variable, init })
            }

            ast::Stmt::FunDecl {
                name,
                params,
                returns,
                body,
                span,
            } => {
                // the function is visible inside its own body
                let function = Function::new(name);
                self.declare(name, Entity::Function(function.clone()), span)?;

                let parent = self.current;
                self.current = self.scopes.child(parent);
                *self.scopes.ctx_mut(self.current) = Ambient {
                    in_loop: false,
                    function: Some(function.clone()),
                };

                let result = self.fun_body(&function, params, returns, body);
                self.current = parent;
                let (params, body) = result?;

                Ok(ir::Stmt::FunDecl {
                    function,
                    params,
                    body,
                })
            }

            ast::Stmt::StructDecl { name, fields, span } => {
                let strukt = StructType::new(name);
                self.declare(name, Entity::Struct(strukt.clone()), span)?;

                let mut resolved = Vec::new();
                for field in fields {
                    resolved.push(Field {
                        name: field.name.clone(),
                        ty: self.resolve_type(&field.ty)?,
                    });
                }

                let names: HashSet<&str> = resolved.iter().map(|f| f.name.as_str()).collect();
                if names.len() != resolved.len() {
                    return Err(SemanticError::DuplicateFields { span: span.clone() });
                }
                let self_containing = resolved
                    .iter()
                    .any(|f| matches!(&f.ty, Type::Struct(s) if Rc::ptr_eq(s, &strukt)));
                if self_containing {
                    return Err(SemanticError::SelfContainingStruct { span: span.clone() });
                }

                *strukt.fields.borrow_mut() = resolved;

                Ok(ir::Stmt::StructDecl(strukt))
            }

            ast::Stmt::Assign {
                targets, sources, ..
            } => {
                let mut assignments = Vec::new();
                for (target, source) in targets.iter().zip(sources.iter()) {
                    let source_ir = self.expr(source)?;
                    let target_ir = self.expr(target)?;
                    match &target_ir {
                        ir::Expr::Variable(variable) => {
                            if variable.read_only {
                                return Err(SemanticError::AssignToConstant {
                                    name: variable.name.clone(),
                                    span: target.span(),
                                });
                            }
                        }
                        ir::Expr::Subscript { .. } | ir::Expr::Member { .. } => {}
                        _ => {
                            return Err(SemanticError::InvalidAssignmentTarget {
                                span: target.span(),
                            });
                        }
                    }
                    if !source_ir.ty().assignable_to(&target_ir.ty()) {
                        return Err(SemanticError::NotAssignable {
                            from: source_ir.ty().to_string(),
                            target: target_ir.ty().to_string(),
                            span: source.span(),
                        });
                    }
                    assignments.push(ir::Stmt::Assign {
                        target: target_ir,
                        source: source_ir,
                    });
                }

                Ok(ir::Stmt::Sequence(assignments))
            }

            ast::Stmt::Bump { target, op, .. } => {
                let target_ir = self.expr(target)?;
                if !matches!(target_ir.ty(), Type::Int) {
                    return Err(SemanticError::ExpectedInteger {
                        span: target.span(),
                    });
                }

                Ok(ir::Stmt::Bump {
                    target: target_ir,
                    op: *op,
                })
            }

            ast::Stmt::Break(span) => {
                if !self.scopes.ctx(self.current).in_loop {
                    return Err(SemanticError::BreakOutsideLoop { span: span.clone() });
                }

                Ok(ir::Stmt::Break)
            }

            ast::Stmt::Return(value, span) => {
                let Some(function) = self.scopes.ctx(self.current).function.clone() else {
                    return Err(SemanticError::ReturnOutsideFunction { span: span.clone() });
                };
                let returns = function.return_type();

                match value {
                    Some(value) => {
                        if matches!(returns, Type::Void) {
                            return Err(SemanticError::UnexpectedReturnValue {
                                span: span.clone(),
                            });
                        }
                        let value_ir = self.expr(value)?;
                        if !value_ir.ty().assignable_to(&returns) {
                            return Err(SemanticError::NotAssignable {
                                from: value_ir.ty().to_string(),
                                target: returns.to_string(),
                                span: value.span(),
                            });
                        }

                        Ok(ir::Stmt::Return(Some(value_ir)))
                    }
                    None => {
                        if !matches!(returns, Type::Void) {
                            return Err(SemanticError::MissingReturnValue { span: span.clone() });
                        }

                        Ok(ir::Stmt::Return(None))
                    }
                }
            }

            ast::Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => {
                let test_ir = self.bool_expr(test)?;
                let consequent = self.nested_stmt_list(consequent, false)?;
                let alternate = match alternate {
                    ElseTail::None => vec![],
                    ElseTail::Block(stmts) => self.nested_stmt_list(stmts, false)?,
                    ElseTail::ElseIf(nested) => vec![self.stmt(nested)?],
                };

                Ok(ir::Stmt::If {
                    test: test_ir,
                    consequent,
                    alternate,
                })
            }

            ast::Stmt::While { test, body, .. } => {
                let test_ir = self.bool_expr(test)?;
                let body = self.nested_stmt_list(body, true)?;

                Ok(ir::Stmt::While {
                    test: test_ir,
                    body,
                })
            }

            ast::Stmt::Repeat { count, body, .. } => {
                let count_ir = self.int_expr(count)?;
                let body = self.nested_stmt_list(body, true)?;

                Ok(ir::Stmt::Repeat {
                    count: count_ir,
                    body,
                })
            }

            ast::Stmt::ForRange {
                name,
                low,
                op,
                high,
                body,
                span,
            } => {
                let low_ir = self.int_expr(low)?;
                let high_ir = self.int_expr(high)?;
                let iterator = Variable::new(name, true, Type::Int);

                let parent = self.current;
                self.current = self.scopes.child(parent);
                self.scopes.ctx_mut(self.current).in_loop = true;
                let body = self
                    .declare(name, Entity::Variable(iterator.clone()), span)
                    .and_then(|_| self.stmt_list(body));
                self.current = parent;

                Ok(ir::Stmt::ForRange {
                    iterator,
                    low: low_ir,
                    op: *op,
                    high: high_ir,
                    body: body?,
                })
            }

            ast::Stmt::ForEach {
                name,
                collection,
                body,
                span,
            } => {
                let collection_ir = self.expr(collection)?;
                let Type::Array(base) = collection_ir.ty() else {
                    return Err(SemanticError::ExpectedArray {
                        span: collection.span(),
                    });
                };
                let iterator = Variable::new(name, true, (*base).clone());

                let parent = self.current;
                self.current = self.scopes.child(parent);
                self.scopes.ctx_mut(self.current).in_loop = true;
                let body = self
                    .declare(name, Entity::Variable(iterator.clone()), span)
                    .and_then(|_| self.stmt_list(body));
                self.current = parent;

                Ok(ir::Stmt::ForEach {
                    iterator,
                    collection: collection_ir,
                    body: body?,
                })
            }

            ast::Stmt::Call(expr) => Ok(ir::Stmt::Call(self.expr(expr)?)),
        }
    }

    /// Parameters, return type, and body of a function, all inside the
    /// already-opened function scope. The function's type is assigned
    /// before the body is walked so recursive calls see it.
    fn fun_body(
        &mut self,
        function: &Rc<Function>,
        params: &[ast::Param],
        returns: &Option<TypeExpr>,
        body: &[ast::Stmt],
    ) -> Result<(Vec<Rc<Variable>>, Vec<ir::Stmt>), SemanticError> {
        let mut param_vars = Vec::new();
        for param in params {
            let ty = self.resolve_type(&param.ty)?;
            let variable = Variable::new(&param.name, false, ty);
            self.declare(&param.name, Entity::Variable(variable.clone()), &param.span)?;
            param_vars.push(variable);
        }

        let returns = match returns {
            Some(ty) => self.resolve_type(ty)?,
            None => Type::Void,
        };
        function.assign_type(Type::function(
            param_vars.iter().map(|p| p.ty.clone()).collect(),
            returns,
        ));

        let body = self.stmt_list(body)?;

        Ok((param_vars, body))
    }

    fn bool_expr(&mut self, expr: &ast::Expr) -> Result<ir::Expr, SemanticError> {
        let ir = self.expr(expr)?;
        if !matches!(ir.ty(), Type::Bool) {
            return Err(SemanticError::ExpectedBoolean { span: expr.span() });
        }

        Ok(ir)
    }

    fn int_expr(&mut self, expr: &ast::Expr) -> Result<ir::Expr, SemanticError> {
        let ir = self.expr(expr)?;
        if !matches!(ir.ty(), Type::Int) {
            return Err(SemanticError::ExpectedInteger { span: expr.span() });
        }

        Ok(ir)
    }

    fn expr(&mut self, expr: &ast::Expr) -> Result<ir::Expr, SemanticError> {
        match expr {
            ast::Expr::Int(value, _) => Ok(ir::Expr::Int(*value)),
            ast::Expr::Float(value, _) => Ok(ir::Expr::Float(*value)),
            ast::Expr::Str(value, _) => Ok(ir::Expr::Str(value.clone())),
            ast::Expr::Bool(value, _) => Ok(ir::Expr::Bool(*value)),

            ast::Expr::Ident(name, span) => match self.resolve(name, span)? {
                Entity::Variable(variable) => Ok(ir::Expr::Variable(variable)),
                Entity::Function(function) => Ok(ir::Expr::Function(function)),
                Entity::Struct(_) => Err(SemanticError::NotAValue {
                    name: name.clone(),
                    span: span.clone(),
                }),
            },

            ast::Expr::Binary(op, lhs, rhs) => self.binary(*op, lhs, rhs),

            ast::Expr::Unary(op, operand, _) => self.unary(*op, operand),

            ast::Expr::Subscript(array, index) => {
                let array_ir = self.expr(array)?;
                let Type::Array(base) = array_ir.ty() else {
                    return Err(SemanticError::ExpectedArray { span: array.span() });
                };
                let index_ir = self.int_expr(index)?;

                Ok(ir::Expr::Subscript {
                    array: array_ir.boxed(),
                    index: index_ir.boxed(),
                    ty: (*base).clone(),
                })
            }

            ast::Expr::Member {
                object,
                optional,
                field,
                field_span,
            } => self.member(object, *optional, field, field_span),

            ast::Expr::Call { callee, args, span } => {
                match self.call_like(callee, args, span)? {
                    CallLike::Constructor(strukt, args) => {
                        Ok(ir::Expr::ConstructorCall { strukt, args })
                    }
                    CallLike::Function(callee, args, returns) => Ok(ir::Expr::Call {
                        callee: callee.boxed(),
                        args,
                        ty: returns,
                    }),
                }
            }

            ast::Expr::ArrayLit(elements, span) => {
                let elements = elements
                    .iter()
                    .map(|e| self.expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                let first = elements[0].ty();
                if !elements[1..].iter().all(|e| e.ty().equivalent(&first)) {
                    return Err(SemanticError::MixedElementTypes { span: span.clone() });
                }

                Ok(ir::Expr::ArrayLit {
                    elements,
                    ty: Type::array(first),
                })
            }

            ast::Expr::EmptyArray(ty, span) => {
                let ty = self.resolve_type(ty)?;
                if !matches!(ty, Type::Array(_)) {
                    return Err(SemanticError::NotAnArrayType { span: span.clone() });
                }

                Ok(ir::Expr::EmptyArray(ty))
            }

            ast::Expr::EmptyOptional(ty, _) => {
                let base = self.resolve_type(ty)?;

                Ok(ir::Expr::EmptyOptional(Type::optional(base)))
            }

            ast::Expr::PipeForward { args, callee, span } => {
                match self.call_like(callee, args, span)? {
                    CallLike::Constructor(strukt, args) => {
                        Ok(ir::Expr::ConstructorCall { strukt, args })
                    }
                    CallLike::Function(callee, args, returns) => Ok(ir::Expr::PipeForward {
                        args,
                        callee: callee.boxed(),
                        ty: returns,
                    }),
                }
            }

            ast::Expr::PipeBackward { callee, args, span } => {
                match self.call_like(callee, args, span)? {
                    CallLike::Constructor(strukt, args) => {
                        Ok(ir::Expr::ConstructorCall { strukt, args })
                    }
                    CallLike::Function(callee, args, returns) => Ok(ir::Expr::PipeBackward {
                        callee: callee.boxed(),
                        args,
                        ty: returns,
                    }),
                }
            }
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        lhs: &ast::Expr,
        rhs: &ast::Expr,
    ) -> Result<ir::Expr, SemanticError> {
        let (lhs_ir, rhs_ir, ty) = match op {
            BinaryOp::Or | BinaryOp::And => {
                let lhs_ir = self.bool_expr(lhs)?;
                let rhs_ir = self.bool_expr(rhs)?;
                (lhs_ir, rhs_ir, Type::Bool)
            }
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
                let lhs_ir = self.expr(lhs)?;
                if !lhs_ir.ty().is_numeric_or_string() {
                    return Err(SemanticError::ExpectedNumberOrString { span: lhs.span() });
                }
                let rhs_ir = self.expr(rhs)?;
                self.check_same_type(&lhs_ir, &rhs_ir, lhs, rhs)?;
                (lhs_ir, rhs_ir, Type::Bool)
            }
            BinaryOp::Eq | BinaryOp::NotEq => {
                let lhs_ir = self.expr(lhs)?;
                let rhs_ir = self.expr(rhs)?;
                self.check_same_type(&lhs_ir, &rhs_ir, lhs, rhs)?;
                (lhs_ir, rhs_ir, Type::Bool)
            }
            BinaryOp::Add => {
                let lhs_ir = self.expr(lhs)?;
                if !lhs_ir.ty().is_numeric_or_string() {
                    return Err(SemanticError::ExpectedNumberOrString { span: lhs.span() });
                }
                let rhs_ir = self.expr(rhs)?;
                self.check_same_type(&lhs_ir, &rhs_ir, lhs, rhs)?;
                let ty = lhs_ir.ty();
                (lhs_ir, rhs_ir, ty)
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow => {
                let lhs_ir = self.expr(lhs)?;
                if !lhs_ir.ty().is_numeric() {
                    return Err(SemanticError::ExpectedNumber { span: lhs.span() });
                }
                let rhs_ir = self.expr(rhs)?;
                self.check_same_type(&lhs_ir, &rhs_ir, lhs, rhs)?;
                let ty = lhs_ir.ty();
                (lhs_ir, rhs_ir, ty)
            }
        };

        Ok(ir::Expr::Binary {
            op,
            lhs: lhs_ir.boxed(),
            rhs: rhs_ir.boxed(),
            ty,
        })
    }

    fn check_same_type(
        &self,
        lhs: &ir::Expr,
        rhs: &ir::Expr,
        lhs_ast: &ast::Expr,
        rhs_ast: &ast::Expr,
    ) -> Result<(), SemanticError> {
        if !lhs.ty().equivalent(&rhs.ty()) {
            return Err(SemanticError::MixedOperandTypes {
                span: lhs_ast.span().start..rhs_ast.span().end,
            });
        }

        Ok(())
    }

    fn unary(&mut self, op: ast::UnaryOp, operand: &ast::Expr) -> Result<ir::Expr, SemanticError> {
        let operand_ir = self.expr(operand)?;
        let (op, ty) = match op {
            ast::UnaryOp::Neg => {
                if !operand_ir.ty().is_numeric() {
                    return Err(SemanticError::ExpectedNumber {
                        span: operand.span(),
                    });
                }
                (UnaryOp::Neg, operand_ir.ty())
            }
            ast::UnaryOp::Not => {
                if !matches!(operand_ir.ty(), Type::Bool) {
                    return Err(SemanticError::ExpectedBoolean {
                        span: operand.span(),
                    });
                }
                (UnaryOp::Not, Type::Bool)
            }
            ast::UnaryOp::Some => (UnaryOp::Some, Type::optional(operand_ir.ty())),
            ast::UnaryOp::Random => {
                let Type::Array(base) = operand_ir.ty() else {
                    return Err(SemanticError::ExpectedArray {
                        span: operand.span(),
                    });
                };
                (UnaryOp::Random, (*base).clone())
            }
        };

        Ok(ir::Expr::Unary {
            op,
            operand: operand_ir.boxed(),
            ty,
        })
    }

    fn member(
        &mut self,
        object: &ast::Expr,
        optional: bool,
        field: &str,
        field_span: &SourcePos,
    ) -> Result<ir::Expr, SemanticError> {
        let object_ir = self.expr(object)?;

        // `.length` on an array is a builtin, not a field
        if !optional && field == "length" && matches!(object_ir.ty(), Type::Array(_)) {
            return Ok(ir::Expr::Unary {
                op: UnaryOp::Len,
                operand: object_ir.boxed(),
                ty: Type::Int,
            });
        }

        let strukt = match (optional, object_ir.ty()) {
            (false, Type::Struct(strukt)) => strukt,
            (false, _) => {
                return Err(SemanticError::ExpectedStruct {
                    span: object.span(),
                });
            }
            (true, Type::Optional(base)) => match &*base {
                Type::Struct(strukt) => strukt.clone(),
                _ => {
                    return Err(SemanticError::ExpectedOptionalStruct {
                        span: object.span(),
                    });
                }
            },
            (true, _) => {
                return Err(SemanticError::ExpectedOptionalStruct {
                    span: object.span(),
                });
            }
        };

        let Some(field_decl) = strukt.field(field) else {
            return Err(SemanticError::NoSuchField {
                span: field_span.clone(),
            });
        };
        let ty = if optional {
            Type::optional(field_decl.ty)
        } else {
            field_decl.ty
        };

        Ok(ir::Expr::Member {
            object: object_ir.boxed(),
            optional,
            field: field.to_string(),
            ty,
        })
    }

    /// Shared checking for calls and pipe stages: the callee must be a
    /// function or a struct constructor, the argument count must match
    /// exactly, and every argument must fit its parameter.
    fn call_like(
        &mut self,
        callee: &ast::Expr,
        args: &[ast::Expr],
        span: &SourcePos,
    ) -> Result<CallLike, SemanticError> {
        if let ast::Expr::Ident(name, id_span) = callee {
            if let Entity::Struct(strukt) = self.resolve(name, id_span)? {
                let param_types = strukt.field_types();
                let args = self.checked_args(args, &param_types, span)?;

                return Ok(CallLike::Constructor(strukt, args));
            }
        }

        let callee_ir = self.expr(callee)?;
        let Type::Function { params, returns } = callee_ir.ty() else {
            return Err(SemanticError::NotCallable {
                span: callee.span(),
            });
        };
        let args = self.checked_args(args, &params, span)?;

        Ok(CallLike::Function(callee_ir, args, (*returns).clone()))
    }

    fn checked_args(
        &mut self,
        args: &[ast::Expr],
        param_types: &[Type],
        span: &SourcePos,
    ) -> Result<Vec<ir::Expr>, SemanticError> {
        if args.len() != param_types.len() {
            return Err(SemanticError::WrongArgumentCount {
                required: param_types.len(),
                passed: args.len(),
                span: span.clone(),
            });
        }

        let mut checked = Vec::new();
        for (arg, param_ty) in args.iter().zip(param_types.iter()) {
            let arg_ir = self.expr(arg)?;
            if !arg_ir.ty().assignable_to(param_ty) {
                return Err(SemanticError::NotAssignable {
                    from: arg_ir.ty().to_string(),
                    target: param_ty.to_string(),
                    span: arg.span(),
                });
            }
            checked.push(arg_ir);
        }

        Ok(checked)
    }
}
