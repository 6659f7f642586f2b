use std::fmt;
use std::rc::Rc;

use crate::compile::ir::entities::StructType;

/// Structural types. Two array, optional, or function types are the same
/// whenever their parts are; struct types are the same only when they are
/// the same declaration.
#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    Any,
    Array(Rc<Type>),
    Optional(Rc<Type>),
    Function {
        params: Rc<Vec<Type>>,
        returns: Rc<Type>,
    },
    Struct(Rc<StructType>),
}

impl Type {
    pub fn array(base: Type) -> Type {
        Type::Array(Rc::new(base))
    }

    pub fn optional(base: Type) -> Type {
        Type::Optional(Rc::new(base))
    }

    pub fn function(params: Vec<Type>, returns: Type) -> Type {
        Type::Function {
            params: Rc::new(params),
            returns: Rc::new(returns),
        }
    }

    pub fn equivalent(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Int, Type::Int)
            | (Type::Float, Type::Float)
            | (Type::Bool, Type::Bool)
            | (Type::String, Type::String)
            | (Type::Void, Type::Void)
            | (Type::Any, Type::Any) => true,
            (Type::Array(a), Type::Array(b)) => a.equivalent(b),
            (Type::Optional(a), Type::Optional(b)) => a.equivalent(b),
            (
                Type::Function {
                    params: p1,
                    returns: r1,
                },
                Type::Function {
                    params: p2,
                    returns: r2,
                },
            ) => {
                p1.len() == p2.len()
                    && p1.iter().zip(p2.iter()).all(|(a, b)| a.equivalent(b))
                    && r1.equivalent(r2)
            }
            (Type::Struct(a), Type::Struct(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Anything goes into `any`; function types are covariant in the
    /// return type and contravariant in the parameters.
    pub fn assignable_to(&self, target: &Type) -> bool {
        matches!(target, Type::Any)
            || self.equivalent(target)
            || match (self, target) {
                (
                    Type::Function {
                        params: p1,
                        returns: r1,
                    },
                    Type::Function {
                        params: p2,
                        returns: r2,
                    },
                ) => {
                    p1.len() == p2.len()
                        && p2.iter().zip(p1.iter()).all(|(want, have)| want.assignable_to(have))
                        && r1.assignable_to(r2)
                }
                _ => false,
            }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_numeric_or_string(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::String)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Any => write!(f, "any"),
            Type::Array(base) => write!(f, "[{base}]"),
            Type::Optional(base) => write!(f, "{base}?"),
            Type::Function { params, returns } => {
                let params = params
                    .iter()
                    .map(Type::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");

                write!(f, "({params})->{returns}")
            }
            Type::Struct(decl) => write!(f, "{}", decl.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::ir::entities::{Field, StructType};

    #[test]
    fn equivalence_is_structural_except_for_structs() {
        assert!(Type::array(Type::Int).equivalent(&Type::array(Type::Int)));
        assert!(!Type::array(Type::Int).equivalent(&Type::array(Type::Float)));
        assert!(Type::optional(Type::String).equivalent(&Type::optional(Type::String)));

        let a = StructType::new("S");
        a.fields.borrow_mut().push(Field {
            name: "x".into(),
            ty: Type::Int,
        });
        let b = StructType::new("S");
        b.fields.borrow_mut().push(Field {
            name: "x".into(),
            ty: Type::Int,
        });

        assert!(Type::Struct(a.clone()).equivalent(&Type::Struct(a.clone())));
        assert!(!Type::Struct(a).equivalent(&Type::Struct(b)));
    }

    #[test]
    fn equivalence_is_symmetric() {
        let samples = vec![
            Type::Int,
            Type::Float,
            Type::Any,
            Type::array(Type::Int),
            Type::optional(Type::Bool),
            Type::function(vec![Type::Int], Type::Void),
            Type::Struct(StructType::new("S")),
            Type::Struct(StructType::new("S")),
        ];

        for a in &samples {
            for b in &samples {
                assert_eq!(a.equivalent(b), b.equivalent(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn anything_is_assignable_to_any() {
        assert!(Type::Int.assignable_to(&Type::Any));
        assert!(Type::array(Type::Bool).assignable_to(&Type::Any));
        assert!(!Type::Any.assignable_to(&Type::Int));
    }

    #[test]
    fn function_assignability_is_contravariant_in_parameters() {
        let take_any = Type::function(vec![Type::Any], Type::Void);
        let take_int = Type::function(vec![Type::Int], Type::Void);

        assert!(take_any.assignable_to(&take_int));
        assert!(!take_int.assignable_to(&take_any));
    }

    #[test]
    fn function_assignability_is_covariant_in_the_return_type() {
        let send_int = Type::function(vec![], Type::Int);
        let send_any = Type::function(vec![], Type::Any);

        assert!(send_int.assignable_to(&send_any));
        assert!(!send_any.assignable_to(&send_int));
    }

    #[test]
    fn renders_readable_descriptions() {
        assert_eq!(Type::array(Type::Int).to_string(), "[int]");
        assert_eq!(Type::optional(Type::Bool).to_string(), "bool?");
        assert_eq!(
            Type::function(vec![Type::Int, Type::Float], Type::Void).to_string(),
            "(int, float)->void"
        );
    }
}
