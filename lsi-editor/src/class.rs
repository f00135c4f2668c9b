//! Class and field views over tree-sitter nodes.

use std::{cell::OnceCell, rc::Rc};

use lsi_core::{
    Annotation, Annotations, CRATE_ROOT, Class, ClassKind, Element, Error, Field, Method,
    Parameter, Receiver, Result, Scope, TypeRef, Visibility,
};
use tree_sitter::Node;

use crate::{
    document::EditorDocument,
    outline::{ImplSite, Outline},
    syntax::{self, erroneous, leading_trivia, text},
};

struct FieldData<'d> {
    node: Node<'d>,
    /// Type node of a struct or tuple field; `None` for variants.
    ty: Option<Node<'d>>,
    variant: bool,
    name: String,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    variant_class: OnceCell<EditorClass<'d>>,
}

struct MethodData<'d> {
    node: Node<'d>,
    /// Scope of the signature: the impl's generics and the function's own.
    scope: Scope,
    name: String,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    type_parameters: Vec<String>,
    receiver: Option<Receiver>,
}

/// A struct, enum or enum variant node seen through the class view.
pub struct EditorClass<'d> {
    doc: &'d EditorDocument,
    node: Node<'d>,
    kind: ClassKind,
    scope: Scope,
    qualified_name: String,
    simple_name: String,
    self_type: TypeRef,
    type_parameters: Vec<String>,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    impls: Rc<Vec<ImplSite<'d>>>,
    fields: OnceCell<Result<Vec<FieldData<'d>>>>,
    methods: OnceCell<Vec<MethodData<'d>>>,
}

impl<'d> EditorClass<'d> {
    /// Wrap a `struct_item` or `enum_item` node of `doc`.
    pub fn wrap(doc: &'d EditorDocument, node: Node<'d>) -> Result<Self> {
        let kind = match node.kind() {
            "struct_item" => ClassKind::Struct,
            "enum_item" => ClassKind::Enum,
            other => return Err(Error::mismatch("class", format!("`{}` node", other))),
        };
        let mut outline = Outline::scan(doc, CRATE_ROOT);
        let scope = node
            .parent()
            .and_then(|body| outline.scope_of(body))
            .cloned()
            .ok_or_else(|| Error::mismatch("class", "declaration outside a module body"))?;
        let impls = Rc::new(std::mem::take(&mut outline.impls));
        Self::declared(doc, node, kind, &scope, impls)
    }

    pub(crate) fn declared(
        doc: &'d EditorDocument,
        node: Node<'d>,
        kind: ClassKind,
        module: &Scope,
        impls: Rc<Vec<ImplSite<'d>>>,
    ) -> Result<Self> {
        let source = doc.source();
        let name = match node.child_by_field_name("name") {
            Some(name) if !name.is_missing() && !name.has_error() => text(name, source),
            _ => {
                return Err(Error::unresolved(
                    module.qualify_local("_"),
                    erroneous(node),
                ));
            }
        };
        let qualified_name = module.qualify_local(name);
        let generic_names = syntax::generic_names(node, source);
        let self_type = TypeRef::generic(
            qualified_name.clone(),
            generic_names
                .iter()
                .map(|name| TypeRef::Param { name: name.clone() })
                .collect(),
        );
        let trivia = leading_trivia(node);
        Ok(Self {
            doc,
            node,
            kind,
            scope: module.for_declaration(qualified_name.clone(), generic_names.clone()),
            simple_name: name.to_string(),
            qualified_name,
            self_type,
            type_parameters: generic_names,
            annotations: syntax::annotations(&trivia, source),
            documentation: syntax::documentation(&trivia, source),
            visibility: syntax::visibility(node, source),
            impls,
            fields: OnceCell::new(),
            methods: OnceCell::new(),
        })
    }

    fn variant(parent: &EditorClass<'d>, data: &FieldData<'d>) -> Self {
        Self {
            doc: parent.doc,
            node: data.node,
            kind: ClassKind::Variant,
            scope: parent.scope.clone(),
            qualified_name: format!("{}::{}", parent.qualified_name, data.name),
            simple_name: data.name.clone(),
            self_type: parent.self_type.clone(),
            type_parameters: parent.type_parameters.clone(),
            annotations: data.annotations.clone(),
            documentation: data.documentation.clone(),
            visibility: data.visibility.clone(),
            impls: Rc::new(Vec::new()),
            fields: OnceCell::new(),
            methods: OnceCell::new(),
        }
    }

    /// The node this view was built from.
    pub fn node(&self) -> Node<'d> {
        self.node
    }

    /// The field view of `node`, which must be a field or variant node
    /// declared by this class.
    pub fn wrap_field(&self, node: Node<'_>) -> Result<EditorField<'_, 'd>> {
        let tuple_member =
            node.parent().map(|parent| parent.kind()) == Some("ordered_field_declaration_list");
        if !tuple_member && !matches!(node.kind(), "field_declaration" | "enum_variant") {
            return Err(Error::mismatch("field", format!("`{}` node", node.kind())));
        }
        let fields = self.field_data()?;
        fields
            .iter()
            .find(|data| data.node.id() == node.id())
            .map(|data| EditorField { class: self, data })
            .ok_or_else(|| {
                Error::mismatch(
                    "field",
                    format!("node not declared by `{}`", self.qualified_name),
                )
            })
    }

    fn field_data(&self) -> Result<&[FieldData<'d>]> {
        self.fields
            .get_or_init(|| self.collect_fields())
            .as_ref()
            .map(Vec::as_slice)
            .map_err(Clone::clone)
    }

    fn collect_fields(&self) -> Result<Vec<FieldData<'d>>> {
        let Some(body) = self.node.child_by_field_name("body") else {
            return Ok(Vec::new());
        };
        if body.has_error() || body.is_missing() {
            return Err(Error::unresolved(
                self.qualified_name.clone(),
                erroneous(body),
            ));
        }
        let source = self.doc.source();
        Ok(match body.kind() {
            "field_declaration_list" => named_fields(body, source),
            "ordered_field_declaration_list" => tuple_fields(body, source),
            "enum_variant_list" => {
                let mut cursor = body.walk();
                let variants: Vec<Node<'d>> = body
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() == "enum_variant")
                    .collect();
                variants
                    .into_iter()
                    .filter_map(|variant| {
                        let name = variant.child_by_field_name("name")?;
                        let trivia = leading_trivia(variant);
                        Some(FieldData {
                            node: variant,
                            ty: None,
                            variant: true,
                            name: text(name, source).to_string(),
                            annotations: syntax::annotations(&trivia, source),
                            documentation: syntax::documentation(&trivia, source),
                            visibility: self.visibility.clone(),
                            variant_class: OnceCell::new(),
                        })
                    })
                    .collect()
            }
            _ => Vec::new(),
        })
    }

    fn method_data(&self) -> &[MethodData<'d>] {
        self.methods.get_or_init(|| {
            let source = self.doc.source();
            self.impls
                .iter()
                .flat_map(|site| site.methods_for(&self.qualified_name, source))
                .filter_map(|(scope, node)| {
                    let name = node.child_by_field_name("name")?;
                    let trivia = leading_trivia(node);
                    Some(MethodData {
                        name: text(name, source).to_string(),
                        annotations: syntax::annotations(&trivia, source),
                        documentation: syntax::documentation(&trivia, source),
                        visibility: syntax::visibility(node, source),
                        type_parameters: syntax::generic_names(node, source),
                        receiver: syntax::receiver(node),
                        scope,
                        node,
                    })
                })
                .collect()
        })
    }

    fn resolve_supertypes(&self) -> Result<Vec<TypeRef>> {
        let source = self.doc.source();
        self.impls
            .iter()
            .filter_map(|site| site.trait_for(&self.qualified_name, source))
            .map(|resolved| {
                resolved.map_err(|reason| Error::unresolved(self.qualified_name.clone(), reason))
            })
            .collect()
    }
}

fn named_fields<'d>(body: Node<'d>, source: &str) -> Vec<FieldData<'d>> {
    let mut cursor = body.walk();
    let declarations: Vec<Node<'d>> = body
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "field_declaration")
        .collect();
    declarations
        .into_iter()
        .filter_map(|declaration| {
            let name = declaration.child_by_field_name("name")?;
            let trivia = leading_trivia(declaration);
            Some(FieldData {
                node: declaration,
                ty: declaration.child_by_field_name("type"),
                variant: false,
                name: text(name, source).to_string(),
                annotations: syntax::annotations(&trivia, source),
                documentation: syntax::documentation(&trivia, source),
                visibility: syntax::visibility(declaration, source),
                variant_class: OnceCell::new(),
            })
        })
        .collect()
}

/// Fields of `(pub A, #[attr] B)`. Attributes, comments and visibility
/// belong to the next type in the list.
fn tuple_fields<'d>(body: Node<'d>, source: &str) -> Vec<FieldData<'d>> {
    let mut fields = Vec::new();
    let mut trivia: Vec<Node<'d>> = Vec::new();
    let mut visibility = Visibility::Private;
    let mut cursor = body.walk();
    if !cursor.goto_first_child() {
        return fields;
    }
    loop {
        let child = cursor.node();
        if cursor.field_name() == Some("type") {
            fields.push(FieldData {
                node: child,
                ty: Some(child),
                variant: false,
                name: fields.len().to_string(),
                annotations: syntax::annotations(&trivia, source),
                documentation: syntax::documentation(&trivia, source),
                visibility: std::mem::replace(&mut visibility, Visibility::Private),
                variant_class: OnceCell::new(),
            });
            trivia.clear();
        } else {
            match child.kind() {
                "attribute_item" | "line_comment" | "block_comment" => trivia.push(child),
                "visibility_modifier" => visibility = Visibility::parse(text(child, source)),
                _ => {}
            }
        }
        if !cursor.goto_next_sibling() {
            break;
        }
    }
    fields
}

impl Element for EditorClass<'_> {
    fn is_field_like(&self) -> bool {
        false
    }

    fn is_class_like(&self) -> bool {
        true
    }

    fn as_class(&self) -> Option<&dyn Class> {
        Some(self)
    }
}

impl Class for EditorClass<'_> {
    fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    fn simple_name(&self) -> &str {
        &self.simple_name
    }

    fn kind(&self) -> ClassKind {
        self.kind
    }

    fn fields(&self) -> Result<Vec<Box<dyn Field + '_>>> {
        Ok(self
            .field_data()?
            .iter()
            .map(|data| Box::new(EditorField { class: self, data }) as Box<dyn Field + '_>)
            .collect())
    }

    fn supertypes(&self) -> Result<Vec<TypeRef>> {
        self.resolve_supertypes()
    }

    fn annotations(&self) -> Annotations<'_> {
        Annotations::new(&self.annotations)
    }

    fn documentation(&self) -> &str {
        &self.documentation
    }

    fn visibility(&self) -> Visibility {
        self.visibility.clone()
    }

    fn type_parameters(&self) -> &[String] {
        &self.type_parameters
    }

    fn methods(&self) -> Result<Vec<Box<dyn Method + '_>>> {
        Ok(self
            .method_data()
            .iter()
            .map(|data| Box::new(EditorMethod { class: self, data }) as Box<dyn Method + '_>)
            .collect())
    }
}

/// A `function_item` of an inherent impl seen through the method view.
pub struct EditorMethod<'c, 'd> {
    class: &'c EditorClass<'d>,
    data: &'c MethodData<'d>,
}

impl EditorMethod<'_, '_> {
    pub fn node(&self) -> Node<'_> {
        self.data.node
    }

    fn declaration(&self) -> String {
        format!("{}::{}", self.class.qualified_name, self.data.name)
    }
}

impl Method for EditorMethod<'_, '_> {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn annotations(&self) -> Annotations<'_> {
        Annotations::new(&self.data.annotations)
    }

    fn documentation(&self) -> &str {
        &self.data.documentation
    }

    fn visibility(&self) -> Visibility {
        self.data.visibility.clone()
    }

    fn type_parameters(&self) -> &[String] {
        &self.data.type_parameters
    }

    fn receiver(&self) -> Option<Receiver> {
        self.data.receiver
    }

    fn parameters(&self) -> Result<Vec<Parameter>> {
        syntax::parameters(self.data.node, self.class.doc.source(), &self.data.scope)
            .map_err(|reason| Error::unresolved(self.declaration(), reason))
    }

    fn return_type(&self) -> Result<TypeRef> {
        syntax::return_type(self.data.node, self.class.doc.source(), &self.data.scope)
            .map_err(|reason| Error::unresolved(self.declaration(), reason))
    }

    fn owning_class(&self) -> &dyn Class {
        self.class
    }
}

/// A field or enum variant node seen through the field view.
///
/// Tuple and struct variants also answer the class view; unit variants do
/// not, since they have no members.
pub struct EditorField<'c, 'd> {
    class: &'c EditorClass<'d>,
    data: &'c FieldData<'d>,
}

impl EditorField<'_, '_> {
    pub fn node(&self) -> Node<'_> {
        self.data.node
    }
}

impl Element for EditorField<'_, '_> {
    fn is_field_like(&self) -> bool {
        true
    }

    fn is_class_like(&self) -> bool {
        self.data.variant && self.data.node.child_by_field_name("body").is_some()
    }

    fn as_field(&self) -> Option<&dyn Field> {
        Some(self)
    }

    fn as_class(&self) -> Option<&dyn Class> {
        if !self.is_class_like() {
            return None;
        }
        Some(
            self.data
                .variant_class
                .get_or_init(|| EditorClass::variant(self.class, self.data)),
        )
    }
}

impl Field for EditorField<'_, '_> {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn annotations(&self) -> Annotations<'_> {
        Annotations::new(&self.data.annotations)
    }

    fn ty(&self) -> Result<TypeRef> {
        if self.data.variant {
            return Ok(self.class.self_type.clone());
        }
        let declaration = format!("{}.{}", self.class.qualified_name, self.data.name);
        let Some(node) = self.data.ty else {
            return Err(Error::unresolved(declaration, erroneous(self.data.node)));
        };
        syntax::type_ref(node, self.class.doc.source(), &self.class.scope)
            .map_err(|reason| Error::unresolved(declaration, reason))
    }

    fn owning_class(&self) -> &dyn Class {
        self.class
    }

    fn documentation(&self) -> &str {
        &self.data.documentation
    }

    fn visibility(&self) -> Visibility {
        self.data.visibility.clone()
    }
}

#[cfg(test)]
mod tests {
    use lsi_core::UnresolvedReason;

    use super::*;

    fn first_item<'d>(doc: &'d EditorDocument, kind: &str) -> Node<'d> {
        let root = doc.root();
        let mut cursor = root.walk();
        let found = root
            .named_children(&mut cursor)
            .find(|child| child.kind() == kind);
        found.unwrap()
    }

    #[test]
    fn test_wrap_struct() {
        let doc = EditorDocument::open(
            "/// A user row.\n#[table(name = \"sys_user\")]\npub struct User<T> {\n    #[column(primary)]\n    pub id: u64,\n    /// Display name.\n    name: String,\n    extra: Option<T>,\n}\n",
        )
        .unwrap();
        let class = EditorClass::wrap(&doc, first_item(&doc, "struct_item")).unwrap();
        assert_eq!(class.qualified_name(), "crate::User");
        assert_eq!(class.documentation(), "A user row.");
        assert!(class.has_annotation("table"));
        let fields = class.fields().unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "name", "extra"]);
        assert!(fields[0].has_annotation("column"));
        assert_eq!(fields[0].visibility(), Visibility::Public);
        assert_eq!(fields[1].documentation(), "Display name.");
        assert_eq!(fields[2].ty().unwrap().to_string(), "std::option::Option<T>");
        assert!(std::ptr::addr_eq(fields[0].owning_class(), &class));
    }

    #[test]
    fn test_tuple_fields() {
        let doc = EditorDocument::open("struct Pair(pub u8, #[serde(skip)] bool);").unwrap();
        let class = EditorClass::wrap(&doc, first_item(&doc, "struct_item")).unwrap();
        let fields = class.fields().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name(), "0");
        assert_eq!(fields[0].visibility(), Visibility::Public);
        assert_eq!(fields[1].name(), "1");
        assert_eq!(fields[1].visibility(), Visibility::Private);
        assert!(fields[1].has_annotation("serde"));
        assert_eq!(fields[1].ty().unwrap(), TypeRef::named("bool"));
    }

    #[test]
    fn test_variant_classification() {
        let doc =
            EditorDocument::open("pub enum Shape { Empty, Circle(f64), Labeled { label: String } }")
                .unwrap();
        let class = EditorClass::wrap(&doc, first_item(&doc, "enum_item")).unwrap();
        let variants = class.fields().unwrap();
        let classes: Vec<bool> = variants.iter().map(|v| v.is_class_like()).collect();
        assert_eq!(classes, vec![false, true, true]);
        assert!(variants[0].as_class().is_none());

        let labeled = variants[2].as_class().unwrap();
        assert_eq!(labeled.qualified_name(), "crate::Shape::Labeled");
        assert_eq!(labeled.kind(), ClassKind::Variant);
        let label = labeled.field("label").unwrap().unwrap();
        assert_eq!(label.ty().unwrap().to_string(), "std::string::String");
        assert_eq!(variants[1].ty().unwrap(), TypeRef::named("crate::Shape"));
    }

    #[test]
    fn test_erroneous_body() {
        let doc = EditorDocument::open("struct User { id: u64, name: }").unwrap();
        let class = EditorClass::wrap(&doc, first_item(&doc, "struct_item")).unwrap();
        let err = class.fields().err().unwrap();
        assert!(matches!(
            err,
            Error::Unresolved {
                reason: UnresolvedReason::Erroneous(_),
                ..
            }
        ));
        assert_eq!(err.declaration(), Some("crate::User"));
    }

    #[test]
    fn test_wrap_checks_node_kind() {
        let doc = EditorDocument::open("fn main() {}\nstruct A { x: u8 }").unwrap();
        let err = EditorClass::wrap(&doc, first_item(&doc, "function_item"))
            .err()
            .unwrap();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "cannot wrap `function_item` node as a class view");

        let class = EditorClass::wrap(&doc, first_item(&doc, "struct_item")).unwrap();
        let body = class.node().child_by_field_name("body").unwrap();
        assert!(class.wrap_field(body).is_err());
        let mut cursor = body.walk();
        let declaration = body
            .named_children(&mut cursor)
            .find(|child| child.kind() == "field_declaration")
            .unwrap();
        assert_eq!(class.wrap_field(declaration).unwrap().name(), "x");
    }

    #[test]
    fn test_methods_of_inherent_impls() {
        let doc = EditorDocument::open(
            "pub struct Cache<K> { entries: Vec<K> }

impl<K> Cache<K> {
    /// An empty cache.
    pub fn new() -> Self { Cache { entries: Vec::new() } }

    #[inline]
    fn get<Q>(&self, key: &Q) -> Option<&K> { None }

    fn evict(&mut self, policy: Policy) {}
}

impl<K> Clone for Cache<K> {
    fn clone(&self) -> Self { todo!() }
}
",
        )
        .unwrap();
        let class = EditorClass::wrap(&doc, first_item(&doc, "struct_item")).unwrap();
        assert_eq!(class.type_parameters(), ["K".to_string()]);
        let methods = class.methods().unwrap();
        let names: Vec<&str> = methods.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["new", "get", "evict"]);

        let new = &methods[0];
        assert!(new.is_constructor());
        assert_eq!(new.documentation(), "An empty cache.");
        assert_eq!(new.visibility(), Visibility::Public);
        assert_eq!(new.return_type().unwrap(), TypeRef::named("crate::Cache"));

        let get = class
            .method(
                "get",
                &[TypeRef::Reference {
                    mutable: false,
                    target: Box::new(TypeRef::Param { name: "Q".into() }),
                }],
            )
            .unwrap()
            .unwrap();
        assert!(get.has_annotation("inline"));
        assert_eq!(get.type_parameters(), ["Q".to_string()]);
        assert_eq!(get.receiver(), Some(Receiver::Ref));
        assert_eq!(get.return_type().unwrap().to_string(), "std::option::Option<&K>");
        assert!(std::ptr::addr_eq(get.owning_class(), &class));

        let err = methods[2].parameters().unwrap_err();
        assert_eq!(err.declaration(), Some("crate::Cache::evict"));
        assert_eq!(methods[2].receiver(), Some(Receiver::RefMut));
        assert_eq!(class.constructors().unwrap().len(), 1);
    }
}
