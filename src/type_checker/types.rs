//! Semantic types and the relations between them.
//!
//! `Type` values are immutable and compared by value. Composite (struct)
//! types are nominal: every struct declaration produces its own type, so two
//! structs with the same name in different scopes are unrelated. Their fields
//! are not part of the type value, they live in the checker's member frames.

use std::fmt::Display;

use crate::ast::ast::NodeId;

/// Identifies one struct declaration.
///
/// `declaration` is the declaring node, or `None` for a struct that was
/// predeclared through a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructRef {
    pub name: String,
    pub declaration: Option<NodeId>,
}

impl StructRef {
    pub fn declared(name: impl Into<String>, declaration: NodeId) -> Self {
        StructRef {
            name: name.into(),
            declaration: Some(declaration),
        }
    }

    pub fn predeclared(name: impl Into<String>) -> Self {
        StructRef {
            name: name.into(),
            declaration: None,
        }
    }

    /// The composite type of this struct, given its own ancestors.
    pub fn to_type(&self, ancestors: Vec<StructRef>) -> Type {
        Type::Composite {
            name: self.name.clone(),
            declaration: self.declaration,
            ancestors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Unbounded integer, the type of unannotated integer literals
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Bool,
    String,
    /// Result of functions without a declared return type
    Void,
    /// Bottom type. Expressions of this type never produce a value.
    Never,
    /// Top type. Every type is a subtype of `Any`.
    Any,
    Optional(Box<Type>),
    Array(Box<Type>),
    Function {
        parameters: Vec<Type>,
        return_type: Box<Type>,
    },
    /// A struct type. `ancestors` lists the declared supertypes, nearest first.
    Composite {
        name: String,
        declaration: Option<NodeId>,
        ancestors: Vec<StructRef>,
    },
}

/// Names of the types every checking run knows about, in registration order.
///
/// `Any` is intentionally missing: it has to be predeclared.
pub const PRIMITIVE_TYPE_NAMES: [&str; 14] = [
    "Int", "Int8", "Int16", "Int32", "Int64", "UInt8", "UInt16", "UInt32", "UInt64", "Float",
    "Bool", "String", "Void", "Never",
];

impl Type {
    pub fn optional(inner: Type) -> Type {
        Type::Optional(Box::new(inner))
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn function(parameters: Vec<Type>, return_type: Type) -> Type {
        Type::Function {
            parameters,
            return_type: Box::new(return_type),
        }
    }

    /// A struct predeclared through a configuration.
    pub fn composite(name: impl Into<String>, ancestors: Vec<StructRef>) -> Type {
        StructRef::predeclared(name).to_type(ancestors)
    }

    /// The struct declared by the node `declaration`.
    pub fn declared_composite(
        name: impl Into<String>,
        declaration: NodeId,
        ancestors: Vec<StructRef>,
    ) -> Type {
        StructRef::declared(name, declaration).to_type(ancestors)
    }

    /// The composite type of the nearest ancestor.
    pub fn parent(&self) -> Option<Type> {
        match self {
            Type::Composite { ancestors, .. } => {
                let (parent, rest) = ancestors.split_first()?;
                Some(parent.to_type(rest.to_vec()))
            }
            _ => None,
        }
    }

    /// Resolves the name of a built in primitive type.
    pub fn primitive(name: &str) -> Option<Type> {
        Some(match name {
            "Int" => Type::Int,
            "Int8" => Type::Int8,
            "Int16" => Type::Int16,
            "Int32" => Type::Int32,
            "Int64" => Type::Int64,
            "UInt8" => Type::UInt8,
            "UInt16" => Type::UInt16,
            "UInt32" => Type::UInt32,
            "UInt64" => Type::UInt64,
            "Float" => Type::Float,
            "Bool" => Type::Bool,
            "String" => Type::String,
            "Void" => Type::Void,
            "Never" => Type::Never,
            _ => return None,
        })
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Type::Int
                | Type::Int8
                | Type::Int16
                | Type::Int32
                | Type::Int64
                | Type::UInt8
                | Type::UInt16
                | Type::UInt32
                | Type::UInt64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Type::UInt8 | Type::UInt16 | Type::UInt32 | Type::UInt64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || *self == Type::Float
    }

    /// Inclusive range of values a fixed width integer type can hold.
    ///
    /// Returns `None` for `Int`, which is unbounded, and for non integer types.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        match self {
            Type::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Type::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Type::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Type::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Type::UInt8 => Some((0, u8::MAX as i128)),
            Type::UInt16 => Some((0, u16::MAX as i128)),
            Type::UInt32 => Some((0, u32::MAX as i128)),
            Type::UInt64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    /// Whether an integer literal with this value can have this type.
    pub fn fits_integer(&self, value: i128) -> bool {
        match self.integer_range() {
            Some((min, max)) => min <= value && value <= max,
            None => *self == Type::Int,
        }
    }

    /// The integer type a literal should adopt when this type is expected.
    ///
    /// Looks through optionals, so `Int8?` makes a literal an `Int8`.
    pub fn integer_hint(&self) -> Option<Type> {
        match self {
            Type::Optional(inner) => inner.integer_hint(),
            ty if ty.is_integer() => Some(ty.clone()),
            _ => None,
        }
    }

    /// Members that exist on built in types without any declaration.
    pub fn builtin_member(&self, member: &str) -> Option<Type> {
        match (self, member) {
            (Type::String, "len") | (Type::Array(_), "len") => {
                Some(Type::function(vec![], Type::Int))
            }
            (Type::Array(element), "push") => {
                Some(Type::function(vec![(**element).clone()], Type::Void))
            }
            (Type::Array(element), "pop") => Some(Type::function(vec![], (**element).clone())),
            _ => None,
        }
    }

    /// The composite itself followed by its ancestors, nearest first.
    fn lineage(&self) -> Vec<StructRef> {
        match self {
            Type::Composite {
                name,
                declaration,
                ancestors,
            } => std::iter::once(StructRef {
                name: name.clone(),
                declaration: *declaration,
            })
            .chain(ancestors.iter().cloned())
            .collect(),
            _ => vec![],
        }
    }
}

/// Whether a value of type `sub` may be used where `sup` is expected.
pub fn is_subtype(sub: &Type, sup: &Type) -> bool {
    if sub == sup {
        return true;
    }

    match (sub, sup) {
        (_, Type::Any) => true,
        (Type::Never, _) => true,
        (Type::Optional(sub_inner), Type::Optional(sup_inner)) => is_subtype(sub_inner, sup_inner),
        (_, Type::Optional(sup_inner)) => is_subtype(sub, sup_inner),
        (Type::Array(sub_element), Type::Array(sup_element)) => {
            is_subtype(sub_element, sup_element)
        }
        (
            Type::Function {
                parameters: sub_parameters,
                return_type: sub_return,
            },
            Type::Function {
                parameters: sup_parameters,
                return_type: sup_return,
            },
        ) => {
            sub_parameters.len() == sup_parameters.len()
                && sup_parameters
                    .iter()
                    .zip(sub_parameters)
                    .all(|(sup_parameter, sub_parameter)| is_subtype(sup_parameter, sub_parameter))
                && is_subtype(sub_return, sup_return)
        }
        (Type::Composite { .. }, Type::Composite { .. }) => {
            // `sup` has to be one of `sub`'s ancestors, with the same ancestry above it
            let sub_lineage = sub.lineage();
            let sup_lineage = sup.lineage();
            sub_lineage.len() > sup_lineage.len()
                && sub_lineage[sub_lineage.len() - sup_lineage.len()..] == sup_lineage[..]
        }
        _ => false,
    }
}

/// Whether a value of type `actual` is accepted where `expected` is required.
///
/// This is `is_subtype` plus gradual typing: a value of type `Any` is accepted
/// everywhere, so a node that already failed (and fell back to `Any`) does not
/// cause its parents to fail as well.
pub fn is_assignable(actual: &Type, expected: &Type) -> bool {
    *actual == Type::Any || is_subtype(actual, expected)
}

/// Least common supertype of `a` and `b`, falling back to `Any`.
pub fn join(a: &Type, b: &Type) -> Type {
    if is_subtype(a, b) {
        return b.clone();
    }
    if is_subtype(b, a) {
        return a.clone();
    }

    match (a, b) {
        (Type::Optional(a_inner), Type::Optional(b_inner)) => Type::optional(join(a_inner, b_inner)),
        (Type::Optional(inner), other) | (other, Type::Optional(inner)) => {
            Type::optional(join(inner, other))
        }
        (Type::Array(a_element), Type::Array(b_element)) => Type::array(join(a_element, b_element)),
        (Type::Composite { .. }, Type::Composite { .. }) => {
            let a_lineage = a.lineage();
            let b_lineage = b.lineage();

            // Both lineages end in the same root; walk them backwards from there.
            let shared = a_lineage
                .iter()
                .rev()
                .zip(b_lineage.iter().rev())
                .take_while(|(a_struct, b_struct)| a_struct == b_struct)
                .count();

            if shared == 0 {
                return Type::Any;
            }

            let common = &a_lineage[a_lineage.len() - shared..];
            common[0].to_type(common[1..].to_vec())
        }
        _ => Type::Any,
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Int8 => write!(f, "Int8"),
            Type::Int16 => write!(f, "Int16"),
            Type::Int32 => write!(f, "Int32"),
            Type::Int64 => write!(f, "Int64"),
            Type::UInt8 => write!(f, "UInt8"),
            Type::UInt16 => write!(f, "UInt16"),
            Type::UInt32 => write!(f, "UInt32"),
            Type::UInt64 => write!(f, "UInt64"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::String => write!(f, "String"),
            Type::Void => write!(f, "Void"),
            Type::Never => write!(f, "Never"),
            Type::Any => write!(f, "Any"),
            Type::Optional(inner) => match **inner {
                Type::Function { .. } => write!(f, "({})?", inner),
                _ => write!(f, "{}?", inner),
            },
            Type::Array(element) => write!(f, "[{}]", element),
            Type::Function {
                parameters,
                return_type,
            } => {
                write!(f, "fn(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, ") -> {}", return_type)
            }
            Type::Composite { name, .. } => write!(f, "{}", name),
        }
    }
}
