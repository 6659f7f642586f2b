use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use crate::compile::ir::types::Type;

/// A declared variable. Shared by reference so that two mentions of the
/// same name resolve to the same entity.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    pub read_only: bool,
    pub ty: Type,
}

impl Variable {
    pub fn new(name: impl Into<String>, read_only: bool, ty: Type) -> Rc<Self> {
        Rc::new(Variable {
            name: name.into(),
            read_only,
            ty,
        })
    }
}

/// A declared function. The entity exists before its type does, so that
/// a body can refer to the function it belongs to; the type is filled in
/// once the parameters have been analyzed.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    ty: OnceCell<Type>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Function {
            name: name.into(),
            ty: OnceCell::new(),
        })
    }

    pub fn with_type(name: impl Into<String>, ty: Type) -> Rc<Self> {
        let function = Function::new(name);
        function.assign_type(ty);

        function
    }

    pub fn assign_type(&self, ty: Type) {
        let _ = self.ty.set(ty);
    }

    pub fn ty(&self) -> Type {
        self.ty
            .get()
            .cloned()
            .unwrap_or(Type::function(vec![], Type::Void))
    }

    pub fn return_type(&self) -> Type {
        match self.ty() {
            Type::Function { returns, .. } => (*returns).clone(),
            other => other,
        }
    }

    pub fn param_types(&self) -> Vec<Type> {
        match self.ty() {
            Type::Function { params, .. } => (*params).clone(),
            _ => vec![],
        }
    }
}

/// A struct declaration. The entity is registered before its fields are
/// resolved so that fields may mention the struct itself.
#[derive(Debug)]
pub struct StructType {
    pub name: String,
    pub fields: RefCell<Vec<Field>>,
}

impl StructType {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(StructType {
            name: name.into(),
            fields: RefCell::new(vec![]),
        })
    }

    pub fn field(&self, name: &str) -> Option<Field> {
        self.fields.borrow().iter().find(|f| f.name == name).cloned()
    }

    pub fn field_types(&self) -> Vec<Type> {
        self.fields.borrow().iter().map(|f| f.ty.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// Anything a name can resolve to.
#[derive(Debug, Clone)]
pub enum Entity {
    Variable(Rc<Variable>),
    Function(Rc<Function>),
    Struct(Rc<StructType>),
}

fn stdlib_function(name: &str, params: Vec<Type>, returns: Type) -> (String, Entity) {
    (
        name.to_string(),
        Entity::Function(Function::with_type(name, Type::function(params, returns))),
    )
}

/// The entities every program starts out with.
pub fn standard_library() -> Vec<(String, Entity)> {
    vec![
        (
            "π".to_string(),
            Entity::Variable(Variable::new("π", true, Type::Float)),
        ),
        stdlib_function("say", vec![Type::Any], Type::Void),
        stdlib_function("sin", vec![Type::Float], Type::Float),
        stdlib_function("cos", vec![Type::Float], Type::Float),
        stdlib_function("exp", vec![Type::Float], Type::Float),
        stdlib_function("ln", vec![Type::Float], Type::Float),
        stdlib_function("hypot", vec![Type::Float, Type::Float], Type::Float),
        stdlib_function("bytes", vec![Type::String], Type::array(Type::Int)),
        stdlib_function("codepoints", vec![Type::String], Type::array(Type::Int)),
    ]
}
