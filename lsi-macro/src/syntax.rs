//! Translation from `syn` syntax trees into core values.
//!
//! Both the proc-macro host and the build-script host parse with `syn`, so
//! the translations live here and are shared.

use lsi_core::{
    Annotation, Parameter, PathResolver, Receiver, Resolved, Scope, TypeRef, UnresolvedReason,
    Visibility,
    utils::{compact_tokens, doc_text},
};
use quote::ToTokens;
use syn::{
    AttrStyle, Attribute, Expr, ExprLit, FnArg, GenericArgument, GenericParam, Generics, ImplItem,
    ImplItemFn, Item, ItemImpl, Lit, Meta, Pat, PathArguments, ReturnType, Type, UseTree,
};

/// `a::b::C` text of a path, without generic arguments.
pub fn path_text(path: &syn::Path) -> String {
    let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    let joined = segments.join("::");
    if path.leading_colon.is_some() {
        format!("::{}", joined)
    } else {
        joined
    }
}

fn is_doc(attr: &Attribute) -> bool {
    attr.path().is_ident("doc")
}

/// Outer attributes other than documentation, in source order.
pub fn annotations(attrs: &[Attribute]) -> Vec<Annotation> {
    attrs
        .iter()
        .filter(|attr| matches!(attr.style, AttrStyle::Outer) && !is_doc(attr))
        .map(annotation)
        .collect()
}

pub fn annotation(attr: &Attribute) -> Annotation {
    let path = path_text(attr.path());
    match &attr.meta {
        Meta::Path(_) => Annotation::new(&path, Vec::new()),
        Meta::List(list) => Annotation::from_list(&path, &list.tokens.to_string()),
        Meta::NameValue(nv) => {
            Annotation::from_name_value(&path, &nv.value.to_token_stream().to_string())
        }
    }
}

/// Documentation text from `///` comments and `#[doc = "..."]` attributes.
pub fn documentation(attrs: &[Attribute]) -> String {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| matches!(attr.style, AttrStyle::Outer) && is_doc(attr))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(text),
                    ..
                }) => Some(text.value()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    doc_text(lines.iter().map(String::as_str))
}

pub fn visibility(vis: &syn::Visibility) -> Visibility {
    match vis {
        syn::Visibility::Public(_) => Visibility::Public,
        syn::Visibility::Restricted(restricted) => {
            let path = path_text(&restricted.path);
            if restricted.in_token.is_none() && path == "crate" {
                Visibility::Crate
            } else {
                Visibility::Restricted(path)
            }
        }
        syn::Visibility::Inherited => Visibility::Private,
    }
}

/// Names of the type parameters of a declaration. Lifetimes and const
/// parameters are not types and are left out.
pub fn generic_names(generics: &Generics) -> Vec<String> {
    generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.to_string()),
            _ => None,
        })
        .collect()
}

/// Translate a written type into a [`TypeRef`], qualifying every path.
pub fn type_ref(ty: &Type, resolver: &dyn PathResolver) -> Result<TypeRef, UnresolvedReason> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path_type(&path.path, resolver),
        Type::Reference(reference) => Ok(TypeRef::Reference {
            mutable: reference.mutability.is_some(),
            target: Box::new(type_ref(&reference.elem, resolver)?),
        }),
        Type::Slice(slice) => Ok(TypeRef::Slice {
            element: Box::new(type_ref(&slice.elem, resolver)?),
        }),
        Type::Array(array) => Ok(TypeRef::Array {
            element: Box::new(type_ref(&array.elem, resolver)?),
            length: compact_tokens(&array.len.to_token_stream().to_string()),
        }),
        Type::Tuple(tuple) => Ok(TypeRef::Tuple {
            elements: tuple
                .elems
                .iter()
                .map(|elem| type_ref(elem, resolver))
                .collect::<Result<_, _>>()?,
        }),
        Type::Paren(paren) => type_ref(&paren.elem, resolver),
        Type::Group(group) => type_ref(&group.elem, resolver),
        other => Ok(TypeRef::Opaque {
            text: compact_tokens(&other.to_token_stream().to_string()),
        }),
    }
}

/// Translate a path (in type or trait position). Generic arguments are read
/// from the last segment; lifetimes, bindings and const arguments are dropped.
pub fn path_type(path: &syn::Path, resolver: &dyn PathResolver) -> Result<TypeRef, UnresolvedReason> {
    let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    match resolver.resolve(&segments, path.leading_colon.is_some())? {
        Resolved::Param(name) => Ok(TypeRef::Param { name }),
        Resolved::Path(qualified) => {
            let mut arguments = Vec::new();
            if let Some(PathArguments::AngleBracketed(args)) =
                path.segments.last().map(|s| &s.arguments)
            {
                for arg in &args.args {
                    if let GenericArgument::Type(ty) = arg {
                        arguments.push(type_ref(ty, resolver)?);
                    }
                }
            }
            Ok(TypeRef::Named {
                path: qualified,
                arguments,
            })
        }
    }
}

/// Record the imports of one `use` tree in `scope`.
pub fn collect_imports(tree: &UseTree, scope: &mut Scope) {
    collect_use_tree(tree, &mut Vec::new(), scope);
}

fn collect_use_tree(tree: &UseTree, prefix: &mut Vec<String>, scope: &mut Scope) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use_tree(&path.tree, prefix, scope);
            prefix.pop();
        }
        UseTree::Name(name) => {
            let name = name.ident.to_string();
            if name == "self" {
                if let Some(last) = prefix.last() {
                    scope.import(last.clone(), prefix.clone());
                }
            } else {
                let mut path = prefix.clone();
                path.push(name.clone());
                scope.import(name, path);
            }
        }
        UseTree::Rename(rename) => {
            let alias = rename.rename.to_string();
            if alias == "_" {
                return;
            }
            let name = rename.ident.to_string();
            let mut path = prefix.clone();
            if name != "self" {
                path.push(name);
            }
            scope.import(alias, path);
        }
        UseTree::Glob(_) => scope.glob(prefix.clone()),
        UseTree::Group(group) => {
            for item in &group.items {
                collect_use_tree(item, prefix, scope);
            }
        }
    }
}

/// Name under which an item is visible in its module, if it declares one in
/// the type namespace.
fn declared_name(item: &Item) -> Option<String> {
    match item {
        Item::Struct(item) => Some(item.ident.to_string()),
        Item::Enum(item) => Some(item.ident.to_string()),
        Item::Union(item) => Some(item.ident.to_string()),
        Item::Trait(item) => Some(item.ident.to_string()),
        Item::TraitAlias(item) => Some(item.ident.to_string()),
        Item::Type(item) => Some(item.ident.to_string()),
        Item::Mod(item) => Some(item.ident.to_string()),
        _ => None,
    }
}

/// Scope of a module whose body is `items`.
pub fn module_scope(module: impl Into<String>, items: &[Item]) -> Scope {
    let mut scope = Scope::new(module);
    for item in items {
        if let Some(name) = declared_name(item) {
            scope.declare(name);
        }
        if let Item::Use(item) = item {
            collect_imports(&item.tree, &mut scope);
        }
    }
    scope
}

/// A module body together with its scope.
pub struct ModuleItems<'a> {
    pub scope: Scope,
    pub items: &'a [Item],
}

/// Collect `items` and every inline module nested in them, depth first in
/// source order.
pub fn inline_modules<'a>(module: &str, items: &'a [Item]) -> Vec<ModuleItems<'a>> {
    let mut out = Vec::new();
    visit_modules(module, items, &mut out);
    out
}

fn visit_modules<'a>(module: &str, items: &'a [Item], out: &mut Vec<ModuleItems<'a>>) {
    let scope = module_scope(module, items);
    let children: Vec<(String, &'a [Item])> = items
        .iter()
        .filter_map(|item| match item {
            Item::Mod(item) => item
                .content
                .as_ref()
                .map(|(_, body)| (scope.qualify_local(&item.ident.to_string()), body.as_slice())),
            _ => None,
        })
        .collect();
    out.push(ModuleItems { scope, items });
    for (child, body) in children {
        visit_modules(&child, body, out);
    }
}

/// An impl block together with the scope it was written in.
pub struct ImplSite<'a> {
    pub scope: Scope,
    pub item: &'a ItemImpl,
}

impl<'a> ImplSite<'a> {
    /// The trait implemented by this block when its self type is
    /// `qualified_name`. Inherent impls, negative impls and impls for other
    /// types yield `None`.
    pub fn trait_for(
        &self,
        qualified_name: &str,
        resolver: &dyn PathResolver,
    ) -> Option<Result<TypeRef, UnresolvedReason>> {
        let (negative, trait_path, _) = self.item.trait_.as_ref()?;
        if negative.is_some() || !self.implements_for(qualified_name, resolver) {
            return None;
        }
        Some(path_type(trait_path, resolver))
    }

    fn implements_for(&self, qualified_name: &str, resolver: &dyn PathResolver) -> bool {
        matches!(
            type_ref(&self.item.self_ty, resolver),
            Ok(TypeRef::Named { path, .. }) if path == qualified_name
        )
    }

    /// Scope of the impl header with its generic parameters in view.
    pub fn header_scope(&self) -> Scope {
        self.scope.with_generics(generic_names(&self.item.generics))
    }

    /// The associated functions of this block when it is an inherent impl of
    /// `qualified_name`, in source order.
    pub fn methods_for(&self, qualified_name: &str) -> Vec<MethodSite<'a>> {
        let header = self.header_scope();
        if self.item.trait_.is_some() || !self.implements_for(qualified_name, &header) {
            return Vec::new();
        }
        let impl_generics = generic_names(&self.item.generics);
        self.item
            .items
            .iter()
            .filter_map(|item| match item {
                ImplItem::Fn(item) => {
                    let mut generics = impl_generics.clone();
                    generics.extend(generic_names(&item.sig.generics));
                    Some(MethodSite {
                        scope: self.scope.for_declaration(qualified_name, generics),
                        item,
                    })
                }
                _ => None,
            })
            .collect()
    }
}

/// Impl blocks found in `modules`, in source order.
pub fn impl_sites<'a>(modules: &[ModuleItems<'a>]) -> Vec<ImplSite<'a>> {
    modules
        .iter()
        .flat_map(|module| {
            module.items.iter().filter_map(|item| match item {
                Item::Impl(item) => Some(ImplSite {
                    scope: module.scope.clone(),
                    item,
                }),
                _ => None,
            })
        })
        .collect()
}

/// Associated functions of the inherent impls of `qualified_name`.
pub fn methods_of<'a>(impls: &[ImplSite<'a>], qualified_name: &str) -> Vec<MethodSite<'a>> {
    impls
        .iter()
        .flat_map(|site| site.methods_for(qualified_name))
        .collect()
}

/// An associated function with the scope its signature is read in: the impl
/// block's module, with `Self` and every generic parameter in view.
pub struct MethodSite<'a> {
    pub scope: Scope,
    pub item: &'a ImplItemFn,
}

impl MethodSite<'_> {
    pub fn name(&self) -> String {
        self.item.sig.ident.to_string()
    }

    pub fn type_parameters(&self) -> Vec<String> {
        generic_names(&self.item.sig.generics)
    }

    pub fn receiver(&self) -> Option<Receiver> {
        self.item.sig.receiver().map(|receiver| match receiver.ty.as_ref() {
            Type::Reference(reference) if reference.mutability.is_some() => Receiver::RefMut,
            Type::Reference(_) => Receiver::Ref,
            _ => Receiver::Value,
        })
    }

    pub fn parameters(&self, resolver: &dyn PathResolver) -> Result<Vec<Parameter>, UnresolvedReason> {
        self.item
            .sig
            .inputs
            .iter()
            .filter_map(|input| match input {
                FnArg::Typed(typed) => Some(typed),
                FnArg::Receiver(_) => None,
            })
            .map(|typed| {
                let name = match typed.pat.as_ref() {
                    Pat::Ident(pat) => pat.ident.to_string(),
                    _ => "_".to_string(),
                };
                Ok(Parameter {
                    name,
                    ty: type_ref(&typed.ty, resolver)?,
                })
            })
            .collect()
    }

    pub fn return_type(&self, resolver: &dyn PathResolver) -> Result<TypeRef, UnresolvedReason> {
        match &self.item.sig.output {
            ReturnType::Default => Ok(TypeRef::unit()),
            ReturnType::Type(_, ty) => type_ref(ty, resolver),
        }
    }
}

/// Short description of an item that is not a class-like declaration.
pub fn describe_item(item: &Item) -> String {
    match item {
        Item::Fn(item) => format!("function `{}`", item.sig.ident),
        Item::Impl(_) => "impl block".to_string(),
        Item::Use(_) => "use declaration".to_string(),
        Item::Mod(item) => format!("module `{}`", item.ident),
        Item::Trait(item) => format!("trait `{}`", item.ident),
        Item::Type(item) => format!("type alias `{}`", item.ident),
        Item::Union(item) => format!("union `{}`", item.ident),
        Item::Const(item) => format!("const `{}`", item.ident),
        Item::Static(item) => format!("static `{}`", item.ident),
        _ => "item".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        let file: syn::File = syn::parse_quote! {
            use std::collections::HashMap;
            use crate::auth::{self, Role as UserRole};
            use super::dto::*;
            struct User;
            mod inner {}
        };
        module_scope("crate::model", &file.items)
    }

    fn ty(text: &str) -> Type {
        syn::parse_str(text).unwrap()
    }

    #[test]
    fn test_type_ref_qualifies_paths() {
        let scope = scope();
        let cases = [
            ("HashMap<String, Vec<u8>>", "std::collections::HashMap<std::string::String, std::vec::Vec<u8>>"),
            ("UserRole", "crate::auth::Role"),
            ("auth::Token", "crate::auth::Token"),
            ("&'a mut User", "&mut crate::model::User"),
            ("[u8; 4]", "[u8; 4]"),
            ("(User, bool)", "(crate::model::User, bool)"),
            ("Option<&str>", "std::option::Option<&str>"),
        ];
        for (written, expected) in cases {
            let resolved = type_ref(&ty(written), &scope).unwrap();
            assert_eq!(resolved.to_string(), expected, "{}", written);
        }
    }

    #[test]
    fn test_type_ref_unknown() {
        let err = type_ref(&ty("Vec<Missing>"), &scope()).unwrap_err();
        assert_eq!(err, UnresolvedReason::UnknownType("Missing".into()));
    }

    #[test]
    fn test_type_ref_opaque() {
        let resolved = type_ref(&ty("fn(u8) -> bool"), &scope()).unwrap();
        assert_eq!(resolved, TypeRef::Opaque { text: compact_tokens("fn(u8) -> bool") });
    }

    #[test]
    fn test_annotations_and_docs() {
        let item: syn::ItemStruct = syn::parse_quote! {
            /// A user.
            ///
            /// Stored in `sys_user`.
            #[derive(Debug, Clone)]
            #[table(name = "sys_user")]
            #[doc = "Extra."]
            pub(crate) struct User;
        };
        let annotations = annotations(&item.attrs);
        let names: Vec<&str> = annotations.iter().map(|a| a.simple_name()).collect();
        assert_eq!(names, vec!["derive", "table"]);
        assert_eq!(annotations[1].argument("name"), Some("sys_user"));
        assert_eq!(annotations[0].arguments().len(), 2);
        assert_eq!(
            documentation(&item.attrs),
            "A user.\n\nStored in `sys_user`.\nExtra."
        );
        assert_eq!(visibility(&item.vis), Visibility::Crate);
    }

    #[test]
    fn test_inline_modules() {
        let file: syn::File = syn::parse_quote! {
            struct A;
            mod outer {
                struct B;
                mod inner { struct C; }
            }
        };
        let modules = inline_modules("crate", &file.items);
        let names: Vec<&str> = modules.iter().map(|m| m.scope.module()).collect();
        assert_eq!(names, vec!["crate", "crate::outer", "crate::outer::inner"]);
    }

    #[test]
    fn test_trait_for() {
        let file: syn::File = syn::parse_quote! {
            use std::fmt;
            struct User;
            impl fmt::Display for User { }
            impl<T> From<T> for User { }
            impl User { }
        };
        let modules = inline_modules("crate", &file.items);
        let sites = impl_sites(&modules);
        assert_eq!(sites.len(), 3);
        let traits: Vec<String> = sites
            .iter()
            .filter_map(|site| site.trait_for("crate::User", &site.header_scope()))
            .map(|t| t.unwrap().to_string())
            .collect();
        assert_eq!(traits, vec!["std::fmt::Display", "std::convert::From<T>"]);
    }

    #[test]
    fn test_inherent_methods() {
        let file: syn::File = syn::parse_quote! {
            use std::fmt;
            struct Tree<T> { value: T }
            impl<T> Tree<T> {
                pub fn new(value: T) -> Self { Tree { value } }
                fn map<U>(self, f: fn(T) -> U) -> Tree<U> { todo!() }
                fn peek(&self) -> &T { &self.value }
                fn set(&mut self, (a, _b): (T, u8)) {}
                const DEPTH: usize = 1;
            }
            impl<T> fmt::Debug for Tree<T> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { Ok(()) }
            }
            impl Other { fn new() -> Self { Other } }
        };
        let modules = inline_modules("crate", &file.items);
        let sites = impl_sites(&modules);
        let methods = methods_of(&sites, "crate::Tree");
        let names: Vec<String> = methods.iter().map(MethodSite::name).collect();
        assert_eq!(names, vec!["new", "map", "peek", "set"]);

        let new = &methods[0];
        assert_eq!(new.receiver(), None);
        assert_eq!(
            new.parameters(&new.scope).unwrap(),
            vec![Parameter {
                name: "value".into(),
                ty: TypeRef::Param { name: "T".into() },
            }]
        );
        assert_eq!(
            new.return_type(&new.scope).unwrap(),
            TypeRef::named("crate::Tree")
        );

        let map = &methods[1];
        assert_eq!(map.receiver(), Some(Receiver::Value));
        assert_eq!(map.type_parameters(), vec!["U"]);
        assert_eq!(
            map.return_type(&map.scope).unwrap().to_string(),
            "crate::Tree<U>"
        );
        assert_eq!(methods[2].receiver(), Some(Receiver::Ref));
        assert_eq!(methods[3].receiver(), Some(Receiver::RefMut));
        let set = methods[3].parameters(&methods[3].scope).unwrap();
        assert_eq!(set[0].name, "_");
        assert_eq!(methods[3].return_type(&methods[3].scope).unwrap(), TypeRef::unit());
    }
}
