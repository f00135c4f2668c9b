use std::{cell::OnceCell, rc::Rc};

use lsi_core::{
    CRATE_ROOT, Class, ClassKind, Diagnostic, Element, Environment, Error, Host, Result, Severity,
    UnresolvedReason,
};

use crate::{class::EditorClass, document::EditorDocument, outline::Outline, syntax::erroneous};

/// An editor session over one open document.
///
/// The document stands for the module `root` (the crate root unless told
/// otherwise). Items whose name is still being typed are left out, with an
/// info diagnostic on the session's environment; lookups in a document with
/// syntax errors report misses as erroneous.
pub struct EditorHost<'d> {
    doc: &'d EditorDocument,
    env: Option<&'d Environment>,
    root: String,
    classes: OnceCell<Vec<EditorClass<'d>>>,
}

impl<'d> EditorHost<'d> {
    pub fn new(doc: &'d EditorDocument) -> Self {
        Self {
            doc,
            env: None,
            root: CRATE_ROOT.to_string(),
            classes: OnceCell::new(),
        }
    }

    /// Report skipped declarations to the logger of `env`.
    pub fn with_environment(mut self, env: &'d Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Treat the document as the module at `root`, e.g. `crate::model`.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self.classes = OnceCell::new();
        self
    }

    pub fn document(&self) -> &'d EditorDocument {
        self.doc
    }

    pub fn editor_classes(&self) -> &[EditorClass<'d>] {
        self.classes.get_or_init(|| {
            let outline = Outline::scan(self.doc, &self.root);
            let impls = Rc::new(outline.impls);
            let mut classes = Vec::new();
            for module in &outline.modules {
                let mut cursor = module.node.walk();
                for child in module.node.named_children(&mut cursor) {
                    let kind = match child.kind() {
                        "struct_item" => ClassKind::Struct,
                        "enum_item" => ClassKind::Enum,
                        _ => continue,
                    };
                    match EditorClass::declared(self.doc, child, kind, &module.scope, impls.clone())
                    {
                        Ok(class) => classes.push(class),
                        Err(err) => self.skip(&err),
                    }
                }
            }
            tracing::debug!(
                count = classes.len(),
                revision = self.doc.revision(),
                "built editor class adapters"
            );
            classes
        })
    }

    fn skip(&self, err: &Error) {
        tracing::debug!(%err, "skipping incomplete declaration");
        if let Some(env) = self.env {
            let mut diagnostic = Diagnostic::new(
                Severity::Info,
                format!("skipping incomplete declaration: {}", err),
            );
            if let Some(declaration) = err.declaration() {
                diagnostic = diagnostic.about(declaration);
            }
            env.logger().record(diagnostic);
        }
    }
}

impl Host for EditorHost<'_> {
    fn name(&self) -> &'static str {
        "editor"
    }

    fn declarations(&self) -> Result<Vec<&dyn Element>> {
        Ok(self
            .editor_classes()
            .iter()
            .map(|class| class as &dyn Element)
            .collect())
    }

    fn find_class(&self, qualified_name: &str) -> Result<&dyn Class> {
        if let Some(class) = self
            .editor_classes()
            .iter()
            .find(|class| class.qualified_name() == qualified_name)
        {
            return Ok(class);
        }
        let reason = if self.doc.has_errors() {
            erroneous(self.doc.root())
        } else {
            UnresolvedReason::UnknownType(qualified_name.to_string())
        };
        Err(Error::unresolved(qualified_name, reason))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use insta::assert_snapshot;
    use lsi_core::{DiagnosticLogger, TypeRef, Visibility};

    use super::*;

    const SOURCE: &str = r#"use std::collections::HashMap;

/// A user row.
pub struct User {
    pub id: u64,
    pub roles: HashMap<String, Role>,
}

pub enum Role { Admin, Guest(String) }

impl std::fmt::Display for User {}

mod audit {
    pub(crate) struct Entry { pub user: super::User }
}
"#;

    #[test]
    fn test_declarations_in_order() {
        let doc = EditorDocument::open(SOURCE).unwrap();
        let host = EditorHost::new(&doc);
        let names: Vec<String> = host
            .classes()
            .unwrap()
            .iter()
            .map(|c| c.qualified_name().to_string())
            .collect();
        assert_snapshot!(names.join("\n"), @r"
        crate::User
        crate::Role
        crate::audit::Entry
        ");
    }

    #[test]
    fn test_resolves_types_and_supertypes() {
        let doc = EditorDocument::open(SOURCE).unwrap();
        let host = EditorHost::new(&doc);
        let user = host.find_class("crate::User").unwrap();
        assert_eq!(
            user.supertypes().unwrap(),
            vec![TypeRef::named("std::fmt::Display")]
        );
        let roles = user.field("roles").unwrap().unwrap();
        assert_eq!(
            roles.ty().unwrap().to_string(),
            "std::collections::HashMap<std::string::String, crate::Role>"
        );

        let entry = host.find_class("crate::audit::Entry").unwrap();
        assert_eq!(entry.visibility(), Visibility::Crate);
        let field = entry.field("user").unwrap().unwrap();
        assert_eq!(field.ty().unwrap(), TypeRef::named("crate::User"));
    }

    #[test]
    fn test_with_root() {
        let doc = EditorDocument::open(SOURCE).unwrap();
        let host = EditorHost::new(&doc).with_root("crate::model");
        assert!(host.find_class("crate::model::Role").is_ok());
        assert!(host.find_class("crate::Role").is_err());
    }

    #[test]
    fn test_follows_edits() {
        let mut doc = EditorDocument::open("struct User { id: u64 }").unwrap();
        {
            let host = EditorHost::new(&doc);
            assert!(host.find_class("crate::Account").is_err());
        }
        doc.replace("struct User { id: u64 }\nstruct Account { owner: User }")
            .unwrap();
        let host = EditorHost::new(&doc);
        let account = host.find_class("crate::Account").unwrap();
        let owner = account.field("owner").unwrap().unwrap();
        assert_eq!(owner.ty().unwrap(), TypeRef::named("crate::User"));
    }

    #[test]
    fn test_incomplete_document() {
        let doc = EditorDocument::open("struct User { id: u64, name: }\nstruct").unwrap();
        let host = EditorHost::new(&doc);
        let err = host.find_class("crate::Missing").err().unwrap();
        assert!(matches!(
            err,
            Error::Unresolved {
                reason: UnresolvedReason::Erroneous(_),
                ..
            }
        ));
    }

    #[test]
    fn test_skipped_declarations_are_logged() {
        let doc = EditorDocument::open("struct User { id: u64 }\nstruct {}\n").unwrap();
        let logger = Rc::new(DiagnosticLogger::new());
        let env = Environment::builder().logger(logger.clone()).build();
        let host = EditorHost::new(&doc).with_environment(&env);

        assert_eq!(host.classes().unwrap().len(), 1);
        let diagnostics = logger.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Info);
        assert!(
            diagnostics[0]
                .message
                .starts_with("skipping incomplete declaration")
        );
        assert!(!logger.has_errors());
    }
}
