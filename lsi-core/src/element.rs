//! The capability surface shared by every host.
//!
//! [`Element`] is the root: classification only. [`Field`] and [`Class`] are
//! the metadata views a declaration may additionally support, and [`Method`]
//! views the associated functions a class lists. Consumers program against
//! these traits and never see a host-native type.

use crate::{
    annotation::Annotations,
    error::Result,
    types::TypeRef,
};

/// Classification of a declaration.
///
/// The two predicates are defined by each host and are not mutually
/// exclusive. A host that models enum variants as both members and nested
/// declarations answers true to both. Each adapter documents its table.
pub trait Element {
    fn is_field_like(&self) -> bool;

    fn is_class_like(&self) -> bool;

    /// The field view, when [`is_field_like`](Element::is_field_like) holds.
    fn as_field(&self) -> Option<&dyn Field> {
        None
    }

    /// The class view, when [`is_class_like`](Element::is_class_like) holds.
    fn as_class(&self) -> Option<&dyn Class> {
        None
    }
}

/// Declared visibility of a field or class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Crate,
    /// `pub(super)`, `pub(in path)`, `pub(self)`.
    Restricted(String),
    Private,
}

impl Visibility {
    /// Parse a compact visibility token text (`pub`, `pub(crate)`, ...).
    /// Empty text is private.
    pub fn parse(text: &str) -> Self {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "" => Visibility::Private,
            "pub" => Visibility::Public,
            "pub(crate)" | "crate" => Visibility::Crate,
            other => match other
                .strip_prefix("pub(")
                .and_then(|rest| rest.strip_suffix(')'))
            {
                Some(restriction) => {
                    let restriction = restriction.strip_prefix("in").unwrap_or(restriction);
                    Visibility::Restricted(restriction.to_string())
                }
                None => Visibility::Private,
            },
        }
    }
}

/// What kind of declaration a class view wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Struct,
    Enum,
    /// An enum variant reported class-like by its host.
    Variant,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Struct => "struct",
            ClassKind::Enum => "enum",
            ClassKind::Variant => "variant",
        }
    }
}

/// A field-like declaration: a struct field or an enum variant.
pub trait Field: Element {
    /// Identifier as the host reports it. Tuple fields are `0`, `1`, ...
    fn name(&self) -> &str;

    /// Annotation occurrences in declaration order, duplicates included.
    fn annotations(&self) -> Annotations<'_>;

    /// Case-sensitive match against each occurrence's simple name.
    fn has_annotation(&self, simple_name: &str) -> bool {
        self.annotations().contains(simple_name)
    }

    /// The declared type. Raises the unresolved-symbol condition when the
    /// host cannot resolve it.
    fn ty(&self) -> Result<TypeRef>;

    /// The class whose [`fields`](Class::fields) returned this field.
    fn owning_class(&self) -> &dyn Class;

    /// Documentation text; empty when absent or unsupported.
    fn documentation(&self) -> &str;

    fn visibility(&self) -> Visibility;
}

/// How a method takes `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// `self`, `mut self`, or a typed receiver such as `self: Box<Self>`.
    Value,
    /// `&self`
    Ref,
    /// `&mut self`
    RefMut,
}

impl Receiver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Receiver::Value => "self",
            Receiver::Ref => "&self",
            Receiver::RefMut => "&mut self",
        }
    }
}

/// A declared parameter of a method, the receiver excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// The bound identifier, or `_` for any other pattern.
    pub name: String,
    pub ty: TypeRef,
}

/// An associated function from an inherent impl block of a class.
pub trait Method {
    fn name(&self) -> &str;

    /// Annotation occurrences in declaration order, duplicates included.
    fn annotations(&self) -> Annotations<'_>;

    fn has_annotation(&self, simple_name: &str) -> bool {
        self.annotations().contains(simple_name)
    }

    /// Documentation text; empty when absent or unsupported.
    fn documentation(&self) -> &str;

    fn visibility(&self) -> Visibility;

    /// The function's own type parameters, not those of its impl block.
    fn type_parameters(&self) -> &[String];

    /// `None` for associated functions without `self`.
    fn receiver(&self) -> Option<Receiver>;

    /// Declared parameters after the receiver, in order.
    fn parameters(&self) -> Result<Vec<Parameter>>;

    /// The declared return type; `()` when omitted.
    fn return_type(&self) -> Result<TypeRef>;

    /// The class whose [`methods`](Class::methods) returned this method.
    fn owning_class(&self) -> &dyn Class;

    /// An associated function without `self` that returns the owning class.
    fn is_constructor(&self) -> bool {
        self.receiver().is_none()
            && self
                .return_type()
                .is_ok_and(|ty| ty.path() == Some(self.owning_class().qualified_name()))
    }
}

/// A class-like declaration.
pub trait Class: Element {
    fn qualified_name(&self) -> &str;

    fn simple_name(&self) -> &str;

    fn kind(&self) -> ClassKind;

    /// Declared fields in source order, unfiltered.
    fn fields(&self) -> Result<Vec<Box<dyn Field + '_>>>;

    /// Direct supertypes only; never the transitive closure.
    fn supertypes(&self) -> Result<Vec<TypeRef>>;

    fn annotations(&self) -> Annotations<'_>;

    fn has_annotation(&self, simple_name: &str) -> bool {
        self.annotations().contains(simple_name)
    }

    /// Documentation text; empty when absent or unsupported.
    fn documentation(&self) -> &str;

    fn visibility(&self) -> Visibility;

    /// The qualified name without its last segment.
    fn module_path(&self) -> &str {
        let name = self.qualified_name();
        name.rsplit_once("::").map(|(module, _)| module).unwrap_or("")
    }

    /// The first field named `name`.
    fn field(&self, name: &str) -> Result<Option<Box<dyn Field + '_>>> {
        Ok(self.fields()?.into_iter().find(|f| f.name() == name))
    }

    /// The declaration's own type parameters in order. Lifetimes and const
    /// parameters are left out. A variant reports the parameters of its
    /// enum.
    fn type_parameters(&self) -> &[String];

    /// Associated functions of the inherent impl blocks the host can see, in
    /// source order. Trait impls contribute supertypes, not methods.
    fn methods(&self) -> Result<Vec<Box<dyn Method + '_>>>;

    /// Every method named `name`.
    fn methods_named(&self, name: &str) -> Result<Vec<Box<dyn Method + '_>>> {
        Ok(self
            .methods()?
            .into_iter()
            .filter(|m| m.name() == name)
            .collect())
    }

    /// The method named `name` whose parameter types are exactly
    /// `parameter_types`.
    fn method(
        &self,
        name: &str,
        parameter_types: &[TypeRef],
    ) -> Result<Option<Box<dyn Method + '_>>> {
        for method in self.methods_named(name)? {
            let parameters = method.parameters()?;
            let matches = parameters.len() == parameter_types.len()
                && parameters
                    .iter()
                    .zip(parameter_types)
                    .all(|(parameter, ty)| parameter.ty == *ty);
            if matches {
                return Ok(Some(method));
            }
        }
        Ok(None)
    }

    /// Methods for which [`Method::is_constructor`] holds.
    fn constructors(&self) -> Result<Vec<Box<dyn Method + '_>>> {
        Ok(self
            .methods()?
            .into_iter()
            .filter(|m| m.is_constructor())
            .collect())
    }
}
