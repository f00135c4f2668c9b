//! Path resolution against a module scope.
//!
//! Every host sees the same kind of scope for a declaration: the module it sits
//! in, the `use` imports of that module, the items it declares, and the generic
//! parameters of the declaration. How a host collects that information differs;
//! how a path is qualified from it does not, and lives here.

use indexmap::{IndexMap, IndexSet};

use crate::error::UnresolvedReason;

/// Root segment of every qualified name.
pub const CRATE_ROOT: &str = "crate";

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64",
    "i128", "isize", "f32", "f64",
];

const PRELUDE: &[(&str, &str)] = &[
    ("String", "std::string::String"),
    ("Vec", "std::vec::Vec"),
    ("Option", "std::option::Option"),
    ("Result", "std::result::Result"),
    ("Box", "std::boxed::Box"),
    ("Clone", "std::clone::Clone"),
    ("Copy", "std::marker::Copy"),
    ("Send", "std::marker::Send"),
    ("Sync", "std::marker::Sync"),
    ("Sized", "std::marker::Sized"),
    ("Unpin", "std::marker::Unpin"),
    ("Default", "std::default::Default"),
    ("Drop", "std::ops::Drop"),
    ("Fn", "std::ops::Fn"),
    ("FnMut", "std::ops::FnMut"),
    ("FnOnce", "std::ops::FnOnce"),
    ("Eq", "std::cmp::Eq"),
    ("PartialEq", "std::cmp::PartialEq"),
    ("Ord", "std::cmp::Ord"),
    ("PartialOrd", "std::cmp::PartialOrd"),
    ("Iterator", "std::iter::Iterator"),
    ("IntoIterator", "std::iter::IntoIterator"),
    ("DoubleEndedIterator", "std::iter::DoubleEndedIterator"),
    ("ExactSizeIterator", "std::iter::ExactSizeIterator"),
    ("Extend", "std::iter::Extend"),
    ("FromIterator", "std::iter::FromIterator"),
    ("From", "std::convert::From"),
    ("Into", "std::convert::Into"),
    ("AsRef", "std::convert::AsRef"),
    ("AsMut", "std::convert::AsMut"),
    ("TryFrom", "std::convert::TryFrom"),
    ("TryInto", "std::convert::TryInto"),
    ("ToString", "std::string::ToString"),
    ("ToOwned", "std::borrow::ToOwned"),
];

/// Returns true for the built-in primitive type names.
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

fn prelude(name: &str) -> Option<&'static str> {
    PRELUDE
        .iter()
        .find(|(short, _)| *short == name)
        .map(|(_, full)| *full)
}

/// Outcome of qualifying a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A fully-qualified path (primitives stay single-segment).
    Path(String),
    /// A generic parameter of the enclosing declaration.
    Param(String),
}

/// Qualifies paths written in source.
///
/// [`Scope`] is the plain implementation. Hosts that can verify paths against
/// an index wrap it.
pub trait PathResolver {
    /// Qualify `segments`. `absolute` is set for paths with a leading `::`.
    fn resolve(&self, segments: &[String], absolute: bool) -> Result<Resolved, UnresolvedReason>;
}

/// The names visible to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    module: String,
    imports: IndexMap<String, Vec<String>>,
    globs: Vec<Vec<String>>,
    locals: IndexSet<String>,
    generics: Vec<String>,
    self_type: Option<String>,
}

impl Scope {
    /// An empty scope for the module at `module` (e.g. `crate::model`).
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    /// An empty scope for the crate root.
    pub fn root() -> Self {
        Self::new(CRATE_ROOT)
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Qualified name of an item `name` declared in this module.
    pub fn qualify_local(&self, name: &str) -> String {
        format!("{}::{}", self.module, name)
    }

    /// Scope of an inline or file module nested in this one. Imports are not
    /// inherited.
    pub fn child(&self, name: &str) -> Scope {
        Scope::new(self.qualify_local(name))
    }

    /// Record `use path as alias` (or plain `use path`, where the alias is the
    /// last segment).
    pub fn import(&mut self, alias: impl Into<String>, path: Vec<String>) {
        self.imports.insert(alias.into(), path);
    }

    /// Record `use path::*`.
    pub fn glob(&mut self, path: Vec<String>) {
        self.globs.push(path);
    }

    /// Record an item declared in this module (type, trait, alias, module).
    pub fn declare(&mut self, name: impl Into<String>) {
        self.locals.insert(name.into());
    }

    pub fn declares(&self, name: &str) -> bool {
        self.locals.contains(name)
    }

    /// Derive the scope of a declaration: `Self` and its generic parameters
    /// become visible.
    pub fn for_declaration(
        &self,
        self_type: impl Into<String>,
        generics: impl IntoIterator<Item = String>,
    ) -> Scope {
        let mut scope = self.clone();
        scope.self_type = Some(self_type.into());
        scope.generics = generics.into_iter().collect();
        scope
    }

    /// Derive a scope where only generic parameters are added (impl headers).
    pub fn with_generics(&self, generics: impl IntoIterator<Item = String>) -> Scope {
        let mut scope = self.clone();
        scope.generics = generics.into_iter().collect();
        scope
    }

    /// Candidate paths for `name` through this module's glob imports.
    pub fn glob_candidates(&self, name: &str) -> Vec<String> {
        self.globs
            .iter()
            .filter_map(|glob| {
                let mut path = glob.clone();
                path.push(name.to_string());
                self.expand_import(&path)
            })
            .collect()
    }

    /// Each import alias with the qualified path it stands for. Imports that
    /// climb above the crate root are left out.
    pub fn qualified_imports(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.imports
            .iter()
            .filter_map(|(alias, path)| Some((alias.as_str(), self.expand_import(path)?)))
    }

    /// Qualified module paths of this module's glob imports.
    pub fn qualified_globs(&self) -> Vec<String> {
        self.globs
            .iter()
            .filter_map(|glob| self.expand_import(glob))
            .collect()
    }

    /// Expand `crate`/`self`/`super` prefixes. `None` if `segments` does not
    /// start with one, or climbs above the crate root.
    fn expand_relative(&self, segments: &[String]) -> Option<String> {
        let mut module: Vec<&str> = self.module.split("::").collect();
        let mut rest = segments;
        match rest.first().map(String::as_str) {
            Some("crate") => {
                module = vec![CRATE_ROOT];
                rest = &rest[1..];
            }
            Some("self") => rest = &rest[1..],
            Some("super") => {
                while rest.first().map(String::as_str) == Some("super") {
                    if module.len() <= 1 {
                        return None;
                    }
                    module.pop();
                    rest = &rest[1..];
                }
            }
            _ => return None,
        }
        let mut full: Vec<&str> = module;
        full.extend(rest.iter().map(String::as_str));
        Some(full.join("::"))
    }

    /// Normalise an import path: relative prefixes and locally declared
    /// modules are anchored at this module, anything else is an external path.
    fn expand_import(&self, path: &[String]) -> Option<String> {
        let first = path.first()?;
        match first.as_str() {
            "crate" | "self" | "super" => self.expand_relative(path),
            name if self.locals.contains(name) => {
                Some(format!("{}::{}", self.module, path.join("::")))
            }
            _ => Some(path.join("::")),
        }
    }
}

impl PathResolver for Scope {
    fn resolve(&self, segments: &[String], absolute: bool) -> Result<Resolved, UnresolvedReason> {
        let written = segments.join("::");
        let unknown = || UnresolvedReason::UnknownType(written.clone());
        let Some(first) = segments.first() else {
            return Err(unknown());
        };

        if absolute {
            return Ok(Resolved::Path(written));
        }
        if self.generics.iter().any(|g| g == first) {
            return Ok(Resolved::Param(written));
        }
        if segments.len() == 1 && is_primitive(first) {
            return Ok(Resolved::Path(written));
        }

        let rest = &segments[1..];
        let join = |head: &str| {
            if rest.is_empty() {
                head.to_string()
            } else {
                format!("{}::{}", head, rest.join("::"))
            }
        };

        let path = match first.as_str() {
            "Self" => self.self_type.as_deref().map(join),
            "crate" | "self" | "super" => self.expand_relative(segments),
            "std" | "core" | "alloc" => Some(written.clone()),
            name if self.locals.contains(name) => Some(join(&self.qualify_local(name))),
            name => match self.imports.get(name) {
                Some(import) => self.expand_import(import).map(|head| join(&head)),
                // A multi-segment path through an unknown name is taken as
                // an extern crate path.
                None => prelude(name)
                    .map(join)
                    .or_else(|| (!rest.is_empty()).then(|| written.clone())),
            },
        };
        path.map(Resolved::Path).ok_or_else(unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &str) -> Vec<String> {
        path.split("::").map(String::from).collect()
    }

    fn resolve(scope: &Scope, path: &str) -> Result<Resolved, UnresolvedReason> {
        scope.resolve(&segs(path), false)
    }

    fn model_scope() -> Scope {
        let mut scope = Scope::new("crate::model");
        scope.import("fmt", segs("std::fmt"));
        scope.import("Role", segs("crate::auth::Role"));
        scope.import("Utc", segs("chrono::Utc"));
        scope.import("Parent", segs("super::Base"));
        scope.declare("User");
        scope.declare("inner");
        scope
    }

    #[test]
    fn test_primitives_and_prelude() {
        let scope = model_scope();
        assert_eq!(resolve(&scope, "u64"), Ok(Resolved::Path("u64".into())));
        assert_eq!(
            resolve(&scope, "String"),
            Ok(Resolved::Path("std::string::String".into()))
        );
        assert_eq!(
            resolve(&scope, "Option"),
            Ok(Resolved::Path("std::option::Option".into()))
        );
    }

    #[test]
    fn test_imports_and_locals() {
        let scope = model_scope();
        assert_eq!(
            resolve(&scope, "Role"),
            Ok(Resolved::Path("crate::auth::Role".into()))
        );
        assert_eq!(
            resolve(&scope, "fmt::Display"),
            Ok(Resolved::Path("std::fmt::Display".into()))
        );
        assert_eq!(resolve(&scope, "Utc"), Ok(Resolved::Path("chrono::Utc".into())));
        assert_eq!(resolve(&scope, "Parent"), Ok(Resolved::Path("crate::Base".into())));
        assert_eq!(
            resolve(&scope, "User"),
            Ok(Resolved::Path("crate::model::User".into()))
        );
        assert_eq!(
            resolve(&scope, "inner::Thing"),
            Ok(Resolved::Path("crate::model::inner::Thing".into()))
        );
    }

    #[test]
    fn test_relative_prefixes() {
        let scope = model_scope();
        assert_eq!(
            resolve(&scope, "self::User"),
            Ok(Resolved::Path("crate::model::User".into()))
        );
        assert_eq!(resolve(&scope, "super::Base"), Ok(Resolved::Path("crate::Base".into())));
        assert_eq!(
            resolve(&scope, "crate::auth::Role"),
            Ok(Resolved::Path("crate::auth::Role".into()))
        );
        assert!(resolve(&Scope::root(), "super::Base").is_err());
    }

    #[test]
    fn test_self_and_generics() {
        let scope = model_scope().for_declaration("crate::model::Tree", vec!["T".to_string()]);
        assert_eq!(resolve(&scope, "T"), Ok(Resolved::Param("T".into())));
        assert_eq!(
            resolve(&scope, "Self"),
            Ok(Resolved::Path("crate::model::Tree".into()))
        );
        assert!(resolve(&model_scope(), "Self").is_err());
    }

    #[test]
    fn test_unknown_type() {
        let scope = model_scope();
        assert_eq!(
            resolve(&scope, "Missing"),
            Err(UnresolvedReason::UnknownType("Missing".into()))
        );
        assert_eq!(
            resolve(&scope, "serde_json::Value"),
            Ok(Resolved::Path("serde_json::Value".into()))
        );
        assert_eq!(
            scope.resolve(&segs("serde::Value"), true),
            Ok(Resolved::Path("serde::Value".into()))
        );
    }

    #[test]
    fn test_glob_candidates() {
        let mut scope = Scope::new("crate::api");
        scope.glob(segs("crate::model"));
        scope.glob(segs("super::dto"));
        assert_eq!(
            scope.glob_candidates("User"),
            vec!["crate::model::User".to_string(), "crate::dto::User".to_string()]
        );
    }

    #[test]
    fn test_qualified_imports_and_globs() {
        let mut scope = Scope::new("crate::model");
        scope.declare("user");
        scope.import("User", segs("user::User"));
        scope.import("Utc", segs("chrono::Utc"));
        scope.import("Lost", segs("super::super::Lost"));
        scope.glob(segs("self::user"));
        let imports: Vec<(&str, String)> = scope.qualified_imports().collect();
        assert_eq!(
            imports,
            vec![
                ("User", "crate::model::user::User".to_string()),
                ("Utc", "chrono::Utc".to_string()),
            ]
        );
        assert_eq!(scope.qualified_globs(), vec!["crate::model::user".to_string()]);
    }
}
