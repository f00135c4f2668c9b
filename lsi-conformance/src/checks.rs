//! Host-agnostic assertions over the common views.
//!
//! Every check takes trait objects only, so the same call runs against any
//! adapter. Failures are `eyre` reports naming the declaration involved.

use std::fmt::Write as _;

use eyre::{Result, ensure, eyre};
use lsi_core::{Annotations, Class, Element, Field, Host, Method};
use serde::Serialize;

/// What parity compares for one field: its name, the set of annotation simple
/// names and the fully-qualified type string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParityRecord {
    pub class: String,
    pub name: String,
    pub annotations: Vec<String>,
    #[serde(rename = "type")]
    pub ty: String,
}

impl std::fmt::Display for ParityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} [{}] {}",
            self.class,
            self.name,
            self.annotations.join(", "),
            self.ty
        )
    }
}

/// Parity records for every field of every class the host declares.
///
/// Only the host's top-level class views are walked; the class views of
/// variants are host-defined and not part of parity.
pub fn parity_records(host: &dyn Host) -> Result<Vec<ParityRecord>> {
    let mut records = Vec::new();
    for class in host.classes()? {
        for field in class.fields()? {
            records.push(ParityRecord {
                class: class.qualified_name().to_string(),
                name: field.name().to_string(),
                annotations: field
                    .annotations()
                    .simple_names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                ty: field.ty()?.to_string(),
            });
        }
    }
    Ok(records)
}

/// What parity compares for one method of an inherent impl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRecord {
    pub class: String,
    pub name: String,
    pub annotations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<&'static str>,
    pub parameters: Vec<String>,
    #[serde(rename = "return")]
    pub return_type: String,
}

impl std::fmt::Display for MethodRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parameters: Vec<&str> = self.receiver.into_iter().collect();
        parameters.extend(self.parameters.iter().map(String::as_str));
        write!(
            f,
            "{}::{} [{}] ({}) -> {}",
            self.class,
            self.name,
            self.annotations.join(", "),
            parameters.join(", "),
            self.return_type
        )
    }
}

/// Method records for every top-level class the host declares.
pub fn method_records(host: &dyn Host) -> Result<Vec<MethodRecord>> {
    let mut records = Vec::new();
    for class in host.classes()? {
        for method in class.methods()? {
            records.push(MethodRecord {
                class: class.qualified_name().to_string(),
                name: method.name().to_string(),
                annotations: method
                    .annotations()
                    .simple_names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                receiver: method.receiver().map(|r| r.as_str()),
                parameters: method
                    .parameters()?
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.ty))
                    .collect(),
                return_type: method.return_type()?.to_string(),
            });
        }
    }
    Ok(records)
}

fn flags<E: Element + ?Sized>(element: &E) -> &'static str {
    match (element.is_field_like(), element.is_class_like()) {
        (true, true) => "F+C",
        (true, false) => "F",
        (false, true) => "C",
        (false, false) => "-",
    }
}

/// The classification the host reports for each declaration: `F` for field
/// like, `C` for class like. Fields of a variant's class view are listed
/// under the variant.
///
/// Fails if an element's accessors disagree with its predicates.
pub fn truth_table(host: &dyn Host) -> Result<String> {
    let mut out = String::new();
    for element in host.declarations()? {
        assert_views_match(element, "declaration")?;
        let Some(class) = element.as_class() else {
            continue;
        };
        writeln!(out, "{} {}", class.qualified_name(), flags(element))?;
        for field in class.fields()? {
            let path = format!("{}.{}", class.qualified_name(), field.name());
            assert_views_match(&*field, &path)?;
            writeln!(out, "{} {}", path, flags(&*field))?;
            if let Some(variant) = field.as_class() {
                for member in variant.fields()? {
                    writeln!(
                        out,
                        "{}.{} {}",
                        variant.qualified_name(),
                        member.name(),
                        flags(&*member)
                    )?;
                }
            }
        }
    }
    Ok(out)
}

fn assert_views_match<E: Element + ?Sized>(element: &E, what: &str) -> Result<()> {
    ensure!(
        element.is_field_like() == element.as_field().is_some(),
        "`{}`: field predicate and field view disagree",
        what
    );
    ensure!(
        element.is_class_like() == element.as_class().is_some(),
        "`{}`: class predicate and class view disagree",
        what
    );
    Ok(())
}

/// `fields()` returns exactly `expected`, in declaration order.
pub fn assert_order(class: &dyn Class, expected: &[&str]) -> Result<()> {
    let fields = class.fields()?;
    let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
    ensure!(
        names == expected,
        "`{}`: expected fields {:?}, found {:?}",
        class.qualified_name(),
        expected,
        names
    );
    Ok(())
}

/// Every field of `class` points back at the very view that listed it.
pub fn assert_back_references(class: &dyn Class) -> Result<()> {
    for field in class.fields()? {
        let owner = field.owning_class();
        ensure!(
            owner.qualified_name() == class.qualified_name(),
            "`{}.{}` is owned by `{}`",
            class.qualified_name(),
            field.name(),
            owner.qualified_name()
        );
        ensure!(
            std::ptr::addr_eq(owner, class),
            "`{}.{}` points at a different adapter instance",
            class.qualified_name(),
            field.name()
        );
    }
    Ok(())
}

/// Every query on every adapter of `host` answers the same twice, and lookups
/// by name return the instances `declarations()` handed out.
pub fn assert_idempotent(host: &dyn Host) -> Result<()> {
    let first = describe(host)?;
    let second = describe(host)?;
    ensure!(
        first == second,
        "{} host answered differently on a second pass:\n{}\n---\n{}",
        host.name(),
        first,
        second
    );
    for class in host.classes()? {
        let found = host.find_class(class.qualified_name())?;
        ensure!(
            std::ptr::addr_eq(found, class),
            "`{}` was built twice",
            class.qualified_name()
        );
    }
    Ok(())
}

/// A text dump of everything the views of `host` report. Unresolved answers
/// are rendered as their error text.
pub fn describe(host: &dyn Host) -> Result<String> {
    let mut out = String::new();
    for class in host.classes()? {
        describe_class(class, &mut out)?;
    }
    Ok(out)
}

fn describe_class(class: &dyn Class, out: &mut String) -> Result<()> {
    let supertypes = match class.supertypes() {
        Ok(types) => types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Err(err) => err.to_string(),
    };
    writeln!(
        out,
        "{} {} {:?} doc={:?} supertypes=[{}]",
        class.kind().as_str(),
        class.qualified_name(),
        class.visibility(),
        class.documentation(),
        supertypes
    )?;
    describe_annotations(class.annotations(), out)?;
    if !class.type_parameters().is_empty() {
        writeln!(out, "  generics <{}>", class.type_parameters().join(", "))?;
    }
    for method in class.methods()? {
        describe_method(&*method, out)?;
    }
    for field in class.fields()? {
        describe_field(&*field, out)?;
        if let Some(variant) = field.as_class() {
            describe_class(variant, out)?;
        }
    }
    Ok(())
}

fn describe_field(field: &dyn Field, out: &mut String) -> Result<()> {
    let ty = match field.ty() {
        Ok(ty) => ty.to_string(),
        Err(err) => err.to_string(),
    };
    writeln!(
        out,
        "  field {} {} {:?} doc={:?} type={}",
        field.name(),
        flags(field),
        field.visibility(),
        field.documentation(),
        ty
    )?;
    describe_annotations(field.annotations(), out)
}

fn describe_method(method: &dyn Method, out: &mut String) -> Result<()> {
    let parameters = match method.parameters() {
        Ok(parameters) => parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", "),
        Err(err) => err.to_string(),
    };
    let return_type = match method.return_type() {
        Ok(ty) => ty.to_string(),
        Err(err) => err.to_string(),
    };
    writeln!(
        out,
        "  method {} {:?} receiver={:?} doc={:?} params=[{}] return={}",
        method.name(),
        method.visibility(),
        method.receiver(),
        method.documentation(),
        parameters,
        return_type
    )?;
    describe_annotations(method.annotations(), out)
}

fn describe_annotations(annotations: Annotations<'_>, out: &mut String) -> Result<()> {
    for annotation in annotations {
        writeln!(out, "    #{} {:?}", annotation.path(), annotation.arguments())?;
    }
    Ok(())
}

/// `annotations` carries `name` once per entry of `expected`, and the
/// occurrences, in order, have those values for argument `key`.
pub fn assert_repeatable(
    annotations: Annotations<'_>,
    name: &str,
    key: &str,
    expected: &[&str],
) -> Result<()> {
    ensure!(annotations.contains(name), "no `{}` annotation", name);
    let found = annotations
        .named(name)
        .map(|occurrence| {
            occurrence
                .argument(key)
                .ok_or_else(|| eyre!("a `{}` occurrence has no `{}` argument", name, key))
        })
        .collect::<Result<Vec<&str>>>()?;
    ensure!(
        found == expected,
        "`{}` occurrences carry {:?}, expected {:?}",
        name,
        found,
        expected
    );
    Ok(())
}
