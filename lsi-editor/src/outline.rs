//! Module bodies and impl blocks of a document.

use lsi_core::{Scope, TypeRef, UnresolvedReason};
use tree_sitter::Node;

use crate::{
    document::EditorDocument,
    syntax::{collect_imports, declared_name, generic_names, text, type_ref},
};

/// A module body (the source file or an inline `mod` block) with its scope.
pub(crate) struct ModuleBody<'d> {
    pub scope: Scope,
    pub node: Node<'d>,
}

/// An impl block with the scope it was written in.
pub(crate) struct ImplSite<'d> {
    pub scope: Scope,
    pub node: Node<'d>,
}

impl<'d> ImplSite<'d> {
    fn implements_for(&self, qualified_name: &str, source: &str, header: &Scope) -> bool {
        let Some(self_type) = self.node.child_by_field_name("type") else {
            return false;
        };
        matches!(
            type_ref(self_type, source, header),
            Ok(TypeRef::Named { path, .. }) if path == qualified_name
        )
    }

    /// The trait implemented by this block when its self type is
    /// `qualified_name`.
    pub fn trait_for(
        &self,
        qualified_name: &str,
        source: &str,
    ) -> Option<Result<TypeRef, UnresolvedReason>> {
        let trait_node = self.node.child_by_field_name("trait")?;
        let mut cursor = self.node.walk();
        let negative = self
            .node
            .children(&mut cursor)
            .any(|child| child.kind() == "!");
        if negative {
            return None;
        }
        let header = self.scope.with_generics(generic_names(self.node, source));
        if !self.implements_for(qualified_name, source, &header) {
            return None;
        }
        Some(type_ref(trait_node, source, &header))
    }

    /// The `function_item` nodes of this block when it is an inherent impl
    /// of `qualified_name`, each with the scope its signature is read in.
    pub fn methods_for(&self, qualified_name: &str, source: &str) -> Vec<(Scope, Node<'d>)> {
        if self.node.child_by_field_name("trait").is_some() {
            return Vec::new();
        }
        let impl_generics = generic_names(self.node, source);
        let header = self.scope.with_generics(impl_generics.clone());
        if !self.implements_for(qualified_name, source, &header) {
            return Vec::new();
        }
        let Some(body) = self.node.child_by_field_name("body") else {
            return Vec::new();
        };
        let mut cursor = body.walk();
        let functions: Vec<Node<'d>> = body
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "function_item")
            .collect();
        functions
            .into_iter()
            .map(|function| {
                let mut generics = impl_generics.clone();
                generics.extend(generic_names(function, source));
                (
                    self.scope.for_declaration(qualified_name, generics),
                    function,
                )
            })
            .collect()
    }
}

pub(crate) struct Outline<'d> {
    pub modules: Vec<ModuleBody<'d>>,
    pub impls: Vec<ImplSite<'d>>,
}

impl<'d> Outline<'d> {
    pub fn scan(doc: &'d EditorDocument, root: &str) -> Self {
        let mut outline = Outline {
            modules: Vec::new(),
            impls: Vec::new(),
        };
        outline.visit(doc.root(), root, doc.source());
        outline
    }

    fn visit(&mut self, body: Node<'d>, module: &str, source: &str) {
        let mut scope = Scope::new(module);
        let mut cursor = body.walk();
        let children: Vec<Node<'d>> = body.named_children(&mut cursor).collect();
        for child in &children {
            if let Some(name) = declared_name(*child, source) {
                scope.declare(name);
            }
            if child.kind() == "use_declaration" {
                collect_imports(*child, source, &mut scope);
            }
        }
        for child in &children {
            if child.kind() == "impl_item" {
                self.impls.push(ImplSite {
                    scope: scope.clone(),
                    node: *child,
                });
            }
        }
        let nested: Vec<(String, Node<'d>)> = children
            .iter()
            .filter(|child| child.kind() == "mod_item")
            .filter_map(|child| {
                let name = child.child_by_field_name("name")?;
                let body = child.child_by_field_name("body")?;
                Some((scope.qualify_local(text(name, source)), body))
            })
            .collect();
        self.modules.push(ModuleBody { scope, node: body });
        for (module, body) in nested {
            self.visit(body, &module, source);
        }
    }

    /// Scope of the module whose body is `body`.
    pub fn scope_of(&self, body: Node<'_>) -> Option<&Scope> {
        self.modules
            .iter()
            .find(|module| module.node.id() == body.id())
            .map(|module| &module.scope)
    }
}
