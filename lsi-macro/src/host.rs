use std::cell::OnceCell;

use lsi_core::{CRATE_ROOT, Class, Element, Error, Host, Result, UnresolvedReason};
use syn::{Item, ItemMod};

use crate::{
    class::MacroClass,
    syntax::{self, inline_modules},
};

/// The declarations visible to one macro expansion: a whole file, or the body
/// of an inline module the attribute was placed on.
///
/// Class adapters are built on first use and reused for the rest of the run.
pub struct MacroHost<'a> {
    items: &'a [Item],
    root: String,
    classes: OnceCell<Vec<MacroClass<'a>>>,
}

impl<'a> MacroHost<'a> {
    pub fn new(file: &'a syn::File) -> Self {
        Self::from_items(&file.items, CRATE_ROOT)
    }

    /// Host over an inline module. The module is placed directly under the
    /// crate root unless [`MacroHost::with_root`] says otherwise.
    pub fn from_module(module: &'a ItemMod) -> Result<Self> {
        let Some((_, items)) = &module.content else {
            return Err(Error::mismatch(
                "module",
                format!("module `{}` without a body", module.ident),
            ));
        };
        Ok(Self::from_items(
            items,
            format!("{}::{}", CRATE_ROOT, module.ident),
        ))
    }

    pub fn from_items(items: &'a [Item], root: impl Into<String>) -> Self {
        Self {
            items,
            root: root.into(),
            classes: OnceCell::new(),
        }
    }

    /// Module path the items are declared in.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self.classes = OnceCell::new();
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// The class adapters of this host, in source order.
    pub fn macro_classes(&self) -> &[MacroClass<'a>] {
        self.classes.get_or_init(|| {
            let modules = inline_modules(&self.root, self.items);
            let impls = syntax::impl_sites(&modules);
            let mut classes = Vec::new();
            for module in &modules {
                for item in module.items {
                    match item {
                        Item::Struct(item) => {
                            classes.push(MacroClass::from_struct(item, &module.scope, &impls))
                        }
                        Item::Enum(item) => {
                            classes.push(MacroClass::from_enum(item, &module.scope, &impls))
                        }
                        _ => {}
                    }
                }
            }
            tracing::debug!(root = %self.root, count = classes.len(), "built macro class adapters");
            classes
        })
    }
}

impl Host for MacroHost<'_> {
    fn name(&self) -> &'static str {
        "macro"
    }

    fn declarations(&self) -> Result<Vec<&dyn Element>> {
        Ok(self
            .macro_classes()
            .iter()
            .map(|class| class as &dyn Element)
            .collect())
    }

    fn find_class(&self, qualified_name: &str) -> Result<&dyn Class> {
        self.macro_classes()
            .iter()
            .find(|class| class.qualified_name() == qualified_name)
            .map(|class| class as &dyn Class)
            .ok_or_else(|| {
                Error::unresolved(
                    qualified_name,
                    UnresolvedReason::UnknownType(qualified_name.to_string()),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn file() -> syn::File {
        syn::parse_quote! {
            use std::fmt;

            pub struct User { pub id: u64, pub role: auth::Role }

            impl fmt::Display for User {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { Ok(()) }
            }

            impl Default for auth::Role {
                fn default() -> Self { auth::Role::Guest }
            }

            pub mod auth {
                #[derive(Clone)]
                pub enum Role { Admin, Guest }
            }

            fn helper() {}
        }
    }

    #[test]
    fn test_declarations_in_source_order() {
        let file = file();
        let host = MacroHost::new(&file);
        let names: Vec<String> = host
            .classes()
            .unwrap()
            .iter()
            .map(|c| c.qualified_name().to_string())
            .collect();
        assert_snapshot!(names.join("\n"), @r"
        crate::User
        crate::auth::Role
        ");
    }

    #[test]
    fn test_adapters_are_built_once() {
        let file = file();
        let host = MacroHost::new(&file);
        let first = host.find_class("crate::User").unwrap();
        let second = host.find_class("crate::User").unwrap();
        assert!(std::ptr::addr_eq(first, second));
    }

    #[test]
    fn test_supertypes_from_impls() {
        let file = file();
        let host = MacroHost::new(&file);
        let user = host.find_class("crate::User").unwrap();
        let supertypes: Vec<String> = user
            .supertypes()
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(supertypes, vec!["std::fmt::Display"]);

        let role = host.find_class("crate::auth::Role").unwrap();
        let supertypes: Vec<String> = role
            .supertypes()
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(supertypes, vec!["std::default::Default"]);
        assert!(role.has_annotation("derive"));
    }

    #[test]
    fn test_cross_module_field_type() {
        let file = file();
        let host = MacroHost::new(&file);
        let user = host.find_class("crate::User").unwrap();
        let role = user.field("role").unwrap().unwrap();
        assert_eq!(role.ty().unwrap().to_string(), "crate::auth::Role");
        assert!(user.field("missing").unwrap().is_none());
    }

    #[test]
    fn test_find_missing_class() {
        let file = file();
        let host = MacroHost::new(&file);
        let err = host.find_class("crate::Missing").err().unwrap();
        assert!(err.is_unresolved());
        assert_eq!(err.declaration(), Some("crate::Missing"));
    }

    #[test]
    fn test_from_module() {
        let module: ItemMod = syn::parse_quote! {
            mod model { pub struct Account { pub id: u64 } }
        };
        let host = MacroHost::from_module(&module).unwrap();
        assert_eq!(host.root(), "crate::model");
        let host = host.with_root("crate::db::model");
        assert!(host.find_class("crate::db::model::Account").is_ok());

        let external: ItemMod = syn::parse_quote! { mod model; };
        assert!(MacroHost::from_module(&external).err().unwrap().is_fatal());
    }
}
