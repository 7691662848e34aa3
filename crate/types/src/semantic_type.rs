use crate::container::ContainerKind;
use std::fmt::Display;

// Type name constants as they appear in source annotations
pub const TYPE_NAME_INT: &str = "int";
pub const TYPE_NAME_FLOAT: &str = "float";
pub const TYPE_NAME_BOOL: &str = "bool";
pub const TYPE_NAME_STR: &str = "str";
pub const TYPE_NAME_NONE: &str = "None";
pub const TYPE_NAME_LIST: &str = "list";
pub const TYPE_NAME_DICT: &str = "dict";
pub const TYPE_NAME_SET: &str = "set";
pub const TYPE_NAME_TUPLE: &str = "tuple";

/// The target-independent semantic type assigned to every expression and
/// binding during analysis
///
/// Semantic types are nominal for user classes (`Object`) and structural for
/// containers. `Unknown` is a sentinel meaning inference has not (yet)
/// resolved a type; `Any` is a sentinel for annotations the subset cannot
/// lower. Neither sentinel ever reaches code generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// Owned string
    Str,
    /// Absence of a value (function without return annotation, `None`)
    Void,
    /// Ordered sequence with a single element type
    List(Box<SemanticType>),
    /// Keyed associative container
    Dict(Box<SemanticType>, Box<SemanticType>),
    /// Unordered unique collection
    Set(Box<SemanticType>),
    /// Fixed-arity heterogeneous sequence
    Tuple(Vec<SemanticType>),
    /// Instance of a user-defined class, identified by name
    Object(String),
    /// Function value with parameter types and return type
    Callable(Vec<SemanticType>, Box<SemanticType>),
    /// Inference has not resolved this type
    Unknown,
    /// Annotation outside the subset; only drives diagnostics
    Any,
}

impl SemanticType {
    /// Check if this is a numeric type (integer or float)
    pub fn is_numeric(&self) -> bool {
        matches!(self, SemanticType::Int | SemanticType::Float)
    }

    /// Check if this is one of the container shapes (list, dict, set, str)
    pub fn is_container(&self) -> bool {
        self.container_kind().is_some()
    }

    /// The container kind of this type, if it has one
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            SemanticType::List(_) => Some(ContainerKind::Vec),
            SemanticType::Dict(_, _) => Some(ContainerKind::Map),
            SemanticType::Set(_) => Some(ContainerKind::Set),
            SemanticType::Str => Some(ContainerKind::Str),
            _ => None,
        }
    }

    /// The element type yielded when iterating a value of this type
    ///
    /// Dicts iterate their keys, strings iterate strings.
    pub fn iteration_element(&self) -> Option<SemanticType> {
        match self {
            SemanticType::List(elem) | SemanticType::Set(elem) => Some((**elem).clone()),
            SemanticType::Dict(key, _) => Some((**key).clone()),
            SemanticType::Str => Some(SemanticType::Str),
            _ => None,
        }
    }

    /// The type produced by subscripting a value of this type
    pub fn subscript_element(&self) -> Option<SemanticType> {
        match self {
            SemanticType::List(elem) => Some((**elem).clone()),
            SemanticType::Dict(_, value) => Some((**value).clone()),
            SemanticType::Str => Some(SemanticType::Str),
            _ => None,
        }
    }

    /// Check if values of this type can never be mutated through a binding
    ///
    /// These types short-circuit the mutability analyzer: a parameter
    /// annotated with one of them is `Immutable` without body inspection.
    pub fn is_value_immutable(&self) -> bool {
        matches!(self, SemanticType::Str | SemanticType::Tuple(_))
            || matches!(self, SemanticType::Int | SemanticType::Float | SemanticType::Bool)
    }

    /// Check if an `Unknown` remains anywhere inside this shape
    pub fn contains_unknown(&self) -> bool {
        match self {
            SemanticType::Unknown => true,
            SemanticType::List(elem) | SemanticType::Set(elem) => elem.contains_unknown(),
            SemanticType::Dict(key, value) => key.contains_unknown() || value.contains_unknown(),
            SemanticType::Tuple(elems) => elems.iter().any(|e| e.contains_unknown()),
            SemanticType::Callable(params, ret) => {
                params.iter().any(|p| p.contains_unknown()) || ret.contains_unknown()
            }
            _ => false,
        }
    }

    /// Check if this shape is complete enough for code generation
    pub fn is_fully_resolved(&self) -> bool {
        !self.contains_unknown() && !matches!(self, SemanticType::Any)
    }

    /// Join two types into the least type covering both, if one exists
    ///
    /// Used when inferring the element type of container literals and when
    /// refining provisional container types from later evidence. `Unknown`
    /// is the identity of the join.
    ///
    /// ### Returns
    /// * `Some(joined)` when the two types are compatible
    /// * `None` when no join exists (a type-consistency error)
    pub fn join(&self, other: &SemanticType) -> Option<SemanticType> {
        if self == other {
            return Some(self.clone());
        }
        match (self, other) {
            (SemanticType::Unknown, t) | (t, SemanticType::Unknown) => Some(t.clone()),
            (SemanticType::Int, SemanticType::Float) | (SemanticType::Float, SemanticType::Int) => {
                Some(SemanticType::Float)
            }
            (SemanticType::List(a), SemanticType::List(b)) => {
                a.join(b).map(|e| SemanticType::List(Box::new(e)))
            }
            (SemanticType::Set(a), SemanticType::Set(b)) => {
                a.join(b).map(|e| SemanticType::Set(Box::new(e)))
            }
            (SemanticType::Dict(ka, va), SemanticType::Dict(kb, vb)) => {
                let key = ka.join(kb)?;
                let value = va.join(vb)?;
                Some(SemanticType::Dict(Box::new(key), Box::new(value)))
            }
            _ => None,
        }
    }
}

impl Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticType::Int => write!(f, "{}", TYPE_NAME_INT),
            SemanticType::Float => write!(f, "{}", TYPE_NAME_FLOAT),
            SemanticType::Bool => write!(f, "{}", TYPE_NAME_BOOL),
            SemanticType::Str => write!(f, "{}", TYPE_NAME_STR),
            SemanticType::Void => write!(f, "{}", TYPE_NAME_NONE),
            SemanticType::List(elem) => write!(f, "list[{}]", elem),
            SemanticType::Dict(key, value) => write!(f, "dict[{}, {}]", key, value),
            SemanticType::Set(elem) => write!(f, "set[{}]", elem),
            SemanticType::Tuple(elems) => {
                write!(f, "tuple[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, "]")
            }
            SemanticType::Object(name) => write!(f, "{}", name),
            SemanticType::Callable(params, ret) => {
                write!(f, "Callable[[")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, "], {}]", ret)
            }
            SemanticType::Unknown => write!(f, "Unknown"),
            SemanticType::Any => write!(f, "Any"),
        }
    }
}
