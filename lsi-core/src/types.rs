//! Nominal type descriptors.

use serde::{Deserialize, Serialize};

/// Paths of the std collection types `is_collection` recognises.
const COLLECTIONS: &[&str] = &[
    "std::vec::Vec",
    "std::collections::VecDeque",
    "std::collections::LinkedList",
    "std::collections::HashSet",
    "std::collections::BTreeSet",
    "std::collections::HashMap",
    "std::collections::BTreeMap",
    "std::collections::BinaryHeap",
];

/// A host-independent type reference.
///
/// `Display` renders the canonical fully-qualified form, e.g.
/// `std::vec::Vec<crate::model::Role>` or `&str`. Lifetimes are not part of
/// the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    /// A path type with its generic arguments. Primitives are single-segment
    /// paths (`u64`, `str`).
    Named { path: String, arguments: Vec<TypeRef> },
    /// A generic parameter of the enclosing declaration.
    Param { name: String },
    Reference { mutable: bool, target: Box<TypeRef> },
    Slice { element: Box<TypeRef> },
    Array { element: Box<TypeRef>, length: String },
    Tuple { elements: Vec<TypeRef> },
    /// Types without a nominal form (`dyn Trait`, `fn(u8)`, `!`), kept as
    /// compact token text.
    Opaque { text: String },
}

impl TypeRef {
    /// A named type without arguments.
    pub fn named(path: impl Into<String>) -> Self {
        TypeRef::Named {
            path: path.into(),
            arguments: Vec::new(),
        }
    }

    /// A named type with generic arguments.
    pub fn generic(path: impl Into<String>, arguments: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            path: path.into(),
            arguments,
        }
    }

    /// The unit type `()`.
    pub fn unit() -> Self {
        TypeRef::Tuple {
            elements: Vec::new(),
        }
    }

    /// The fully-qualified rendering of this type.
    pub fn qualified_name(&self) -> String {
        self.to_string()
    }

    /// The rendering without generic arguments on the outermost path.
    pub fn erased(&self) -> String {
        match self {
            TypeRef::Named { path, .. } => path.clone(),
            other => other.to_string(),
        }
    }

    /// Last path segment for named types, the parameter name for generic
    /// parameters, and the full rendering otherwise.
    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Named { path, .. } => path.rsplit("::").next().unwrap_or(path).to_string(),
            TypeRef::Param { name } => name.clone(),
            other => other.to_string(),
        }
    }

    /// The path of a named type.
    pub fn path(&self) -> Option<&str> {
        match self {
            TypeRef::Named { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Generic arguments of a named type; empty for everything else.
    pub fn arguments(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// Returns true for `Option<T>`.
    pub fn is_nullable(&self) -> bool {
        self.path() == Some("std::option::Option")
    }

    /// The `T` of an `Option<T>`.
    pub fn nullable_inner(&self) -> Option<&TypeRef> {
        if self.is_nullable() {
            self.arguments().first()
        } else {
            None
        }
    }

    /// Returns true for std collections, slices and arrays.
    pub fn is_collection(&self) -> bool {
        match self {
            TypeRef::Named { path, .. } => COLLECTIONS.contains(&path.as_str()),
            TypeRef::Slice { .. } | TypeRef::Array { .. } => true,
            _ => false,
        }
    }

    /// Element type of a collection. Maps yield their value type.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Slice { element } | TypeRef::Array { element, .. } => Some(element),
            TypeRef::Named { arguments, .. } if self.is_collection() => arguments.last(),
            _ => None,
        }
    }

    /// Returns true for single-segment primitive paths.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Named { path, arguments } if arguments.is_empty() && crate::scope::is_primitive(path))
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named { path, arguments } => {
                write!(f, "{}", path)?;
                if !arguments.is_empty() {
                    write!(f, "<")?;
                    write_list(f, arguments)?;
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeRef::Param { name } => write!(f, "{}", name),
            TypeRef::Reference { mutable, target } => {
                if *mutable {
                    write!(f, "&mut {}", target)
                } else {
                    write!(f, "&{}", target)
                }
            }
            TypeRef::Slice { element } => write!(f, "[{}]", element),
            TypeRef::Array { element, length } => write!(f, "[{}; {}]", element, length),
            TypeRef::Tuple { elements } => {
                write!(f, "(")?;
                write_list(f, elements)?;
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            TypeRef::Opaque { text } => write!(f, "{}", text),
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, items: &[TypeRef]) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
