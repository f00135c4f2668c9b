//! Translation from tree-sitter nodes into core values.

use lsi_core::{
    Annotation, Parameter, PathResolver, Receiver, Resolved, Scope, TypeRef, UnresolvedReason,
    Visibility,
    utils::{compact_tokens, doc_text, unquote},
};
use tree_sitter::Node;

pub(crate) fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

fn location(node: Node<'_>) -> String {
    let start = node.start_position();
    format!("line {}, column {}", start.row + 1, start.column + 1)
}

/// The erroneous-declaration reason for a node containing syntax errors.
pub(crate) fn erroneous(node: Node<'_>) -> UnresolvedReason {
    UnresolvedReason::Erroneous(format!("syntax error at {}", location(first_error(node))))
}

fn first_error(node: Node<'_>) -> Node<'_> {
    if node.is_error() || node.is_missing() {
        return node;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find(|child| child.has_error())
        .map(first_error)
        .unwrap_or(node)
}

fn is_comment(node: Node<'_>) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

/// Attributes and doc comments written directly before `node`, in source
/// order. Plain comments between them are skipped.
pub(crate) fn leading_trivia(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut current = node.prev_named_sibling();
    while let Some(prev) = current {
        if prev.kind() != "attribute_item" && !is_comment(prev) {
            break;
        }
        out.push(prev);
        current = prev.prev_named_sibling();
    }
    out.reverse();
    out
}

/// The `attribute` inside an outer `attribute_item`.
fn attribute_of(item: Node<'_>) -> Option<Node<'_>> {
    if item.kind() != "attribute_item" {
        return None;
    }
    let mut cursor = item.walk();
    let attribute = item
        .named_children(&mut cursor)
        .find(|child| child.kind() == "attribute");
    attribute
}

fn attribute_path<'s>(attribute: Node<'_>, source: &'s str) -> Option<&'s str> {
    attribute.named_child(0).map(|path| text(path, source))
}

fn is_doc_attribute(attribute: Node<'_>, source: &str) -> bool {
    attribute_path(attribute, source) == Some("doc")
}

fn strip_delimiters(tokens: &str) -> &str {
    let inner = tokens.get(1..tokens.len().saturating_sub(1)).unwrap_or("");
    match (tokens.chars().next(), tokens.chars().last()) {
        (Some('('), Some(')')) | (Some('['), Some(']')) | (Some('{'), Some('}')) => inner,
        _ => tokens,
    }
}

/// Annotations from the attributes in `trivia`. Doc attributes are not
/// annotations.
pub(crate) fn annotations(trivia: &[Node<'_>], source: &str) -> Vec<Annotation> {
    trivia
        .iter()
        .filter_map(|item| attribute_of(*item))
        .filter(|attribute| !is_doc_attribute(*attribute, source))
        .filter_map(|attribute| {
            let path = compact_tokens(attribute_path(attribute, source)?);
            if let Some(arguments) = attribute.child_by_field_name("arguments") {
                let list = strip_delimiters(text(arguments, source));
                Some(Annotation::from_list(&path, list))
            } else if let Some(value) = attribute.child_by_field_name("value") {
                Some(Annotation::from_name_value(&path, text(value, source)))
            } else {
                Some(Annotation::new(&path, Vec::new()))
            }
        })
        .collect()
}

fn doc_comment(comment: &str) -> Option<&str> {
    if let Some(line) = comment.strip_prefix("///") {
        return (!line.starts_with('/')).then_some(line);
    }
    let body = comment.strip_prefix("/**")?.strip_suffix("*/")?;
    (!body.starts_with('*') && !comment.starts_with("/**/")).then_some(body)
}

/// Documentation from the `///` and `/** */` comments and `#[doc]`
/// attributes in `trivia`.
pub(crate) fn documentation(trivia: &[Node<'_>], source: &str) -> String {
    let chunks: Vec<String> = trivia
        .iter()
        .filter_map(|node| {
            if is_comment(*node) {
                return doc_comment(text(*node, source).trim_end_matches(['\n', '\r']))
                    .map(String::from);
            }
            let attribute = attribute_of(*node)?;
            if !is_doc_attribute(attribute, source) {
                return None;
            }
            unquote(text(attribute.child_by_field_name("value")?, source))
        })
        .collect();
    doc_text(chunks.iter().map(String::as_str))
}

/// Visibility of a declaration, from its `visibility_modifier` child.
pub(crate) fn visibility(node: Node<'_>, source: &str) -> Visibility {
    let mut cursor = node.walk();
    let modifier = node
        .children(&mut cursor)
        .find(|child| child.kind() == "visibility_modifier");
    modifier
        .map(|modifier| Visibility::parse(text(modifier, source)))
        .unwrap_or(Visibility::Private)
}

/// Type parameter names of a declaration's `type_parameters` node.
pub(crate) fn generic_names(node: Node<'_>, source: &str) -> Vec<String> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    let children: Vec<Node<'_>> = params.named_children(&mut cursor).collect();
    children
        .into_iter()
        .filter_map(|param| type_param_name(param, source))
        .collect()
}

fn type_param_name(param: Node<'_>, source: &str) -> Option<String> {
    match param.kind() {
        "type_identifier" => Some(text(param, source).to_string()),
        "constrained_type_parameter" => type_param_name(param.child_by_field_name("left")?, source),
        "optional_type_parameter" => type_param_name(param.child_by_field_name("name")?, source),
        _ => None,
    }
}

/// Path segments of a path node, and whether it starts with `::`.
pub(crate) fn path_segments(node: Node<'_>, source: &str) -> Option<(Vec<String>, bool)> {
    match node.kind() {
        "scoped_identifier" | "scoped_type_identifier" => {
            let name = text(node.child_by_field_name("name")?, source).to_string();
            match node.child_by_field_name("path") {
                Some(path) => {
                    let (mut segments, absolute) = path_segments(path, source)?;
                    segments.push(name);
                    Some((segments, absolute))
                }
                None => Some((vec![name], true)),
            }
        }
        "generic_type" => path_segments(node.child_by_field_name("type")?, source),
        "identifier" | "type_identifier" | "primitive_type" | "crate" | "self" | "super" => {
            Some((vec![text(node, source).to_string()], false))
        }
        _ => None,
    }
}

fn is_type_argument(node: Node<'_>) -> bool {
    !matches!(
        node.kind(),
        "lifetime"
            | "type_binding"
            | "block"
            | "integer_literal"
            | "float_literal"
            | "string_literal"
            | "raw_string_literal"
            | "char_literal"
            | "boolean_literal"
            | "negative_literal"
            | "line_comment"
            | "block_comment"
    )
}

/// Translate a type node into a [`TypeRef`], qualifying every path.
pub(crate) fn type_ref(
    node: Node<'_>,
    source: &str,
    resolver: &dyn PathResolver,
) -> Result<TypeRef, UnresolvedReason> {
    if node.has_error() || node.is_missing() {
        return Err(erroneous(node));
    }
    let field = |name: &str| node.child_by_field_name(name).ok_or_else(|| erroneous(node));
    match node.kind() {
        "type_identifier" | "scoped_type_identifier" | "primitive_type" => {
            path_type(node, None, source, resolver)
        }
        "generic_type" => path_type(
            field("type")?,
            node.child_by_field_name("type_arguments"),
            source,
            resolver,
        ),
        "reference_type" => {
            let mut cursor = node.walk();
            let mutable = node
                .children(&mut cursor)
                .any(|child| child.kind() == "mutable_specifier");
            Ok(TypeRef::Reference {
                mutable,
                target: Box::new(type_ref(field("type")?, source, resolver)?),
            })
        }
        "array_type" => {
            let element = Box::new(type_ref(field("element")?, source, resolver)?);
            Ok(match node.child_by_field_name("length") {
                Some(length) => TypeRef::Array {
                    element,
                    length: compact_tokens(text(length, source)),
                },
                None => TypeRef::Slice { element },
            })
        }
        "tuple_type" => {
            let mut cursor = node.walk();
            let elements: Vec<Node<'_>> = node
                .named_children(&mut cursor)
                .filter(|child| !is_comment(*child))
                .collect();
            Ok(TypeRef::Tuple {
                elements: elements
                    .into_iter()
                    .map(|element| type_ref(element, source, resolver))
                    .collect::<Result<_, _>>()?,
            })
        }
        "unit_type" => Ok(TypeRef::unit()),
        _ => Ok(TypeRef::Opaque {
            text: compact_tokens(text(node, source)),
        }),
    }
}

fn path_type(
    path: Node<'_>,
    arguments: Option<Node<'_>>,
    source: &str,
    resolver: &dyn PathResolver,
) -> Result<TypeRef, UnresolvedReason> {
    let Some((segments, absolute)) = path_segments(path, source) else {
        return Ok(TypeRef::Opaque {
            text: compact_tokens(text(path, source)),
        });
    };
    match resolver.resolve(&segments, absolute)? {
        Resolved::Param(name) => Ok(TypeRef::Param { name }),
        Resolved::Path(qualified) => {
            let mut translated = Vec::new();
            if let Some(arguments) = arguments {
                let mut cursor = arguments.walk();
                let children: Vec<Node<'_>> = arguments.named_children(&mut cursor).collect();
                for argument in children.into_iter().filter(|n| is_type_argument(*n)) {
                    translated.push(type_ref(argument, source, resolver)?);
                }
            }
            Ok(TypeRef::Named {
                path: qualified,
                arguments: translated,
            })
        }
    }
}

fn parameter_nodes(function: Node<'_>) -> Vec<Node<'_>> {
    let Some(list) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|child| matches!(child.kind(), "self_parameter" | "parameter"))
        .collect()
}

/// `self: Box<Self>` and similar typed receivers.
fn is_typed_self(parameter: Node<'_>) -> bool {
    parameter.kind() == "parameter"
        && parameter
            .child_by_field_name("pattern")
            .is_some_and(|pattern| pattern.kind() == "self")
}

fn has_child(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}

/// How a `function_item` takes `self`, if it does.
pub(crate) fn receiver(function: Node<'_>) -> Option<Receiver> {
    let first = parameter_nodes(function).into_iter().next()?;
    let (by_reference, mutable) = if first.kind() == "self_parameter" {
        (has_child(first, "&"), has_child(first, "mutable_specifier"))
    } else if is_typed_self(first) {
        let ty = first.child_by_field_name("type")?;
        let by_reference = ty.kind() == "reference_type";
        (by_reference, by_reference && has_child(ty, "mutable_specifier"))
    } else {
        return None;
    };
    Some(match (by_reference, mutable) {
        (true, true) => Receiver::RefMut,
        (true, false) => Receiver::Ref,
        (false, _) => Receiver::Value,
    })
}

fn pattern_name<'s>(pattern: Node<'_>, source: &'s str) -> Option<&'s str> {
    match pattern.kind() {
        "identifier" => Some(text(pattern, source)),
        "mut_pattern" => pattern
            .named_child(pattern.named_child_count().checked_sub(1)?)
            .and_then(|inner| pattern_name(inner, source)),
        _ => None,
    }
}

/// Parameters of a `function_item` after its receiver.
pub(crate) fn parameters(
    function: Node<'_>,
    source: &str,
    resolver: &dyn PathResolver,
) -> Result<Vec<Parameter>, UnresolvedReason> {
    if let Some(list) = function.child_by_field_name("parameters") {
        if list.has_error() {
            return Err(erroneous(list));
        }
    }
    parameter_nodes(function)
        .into_iter()
        .filter(|node| node.kind() == "parameter" && !is_typed_self(*node))
        .map(|node| {
            let name = node
                .child_by_field_name("pattern")
                .and_then(|pattern| pattern_name(pattern, source))
                .unwrap_or("_");
            let ty = node.child_by_field_name("type").ok_or_else(|| erroneous(node))?;
            Ok(Parameter {
                name: name.to_string(),
                ty: type_ref(ty, source, resolver)?,
            })
        })
        .collect()
}

/// Declared return type of a `function_item`; `()` when omitted.
pub(crate) fn return_type(
    function: Node<'_>,
    source: &str,
    resolver: &dyn PathResolver,
) -> Result<TypeRef, UnresolvedReason> {
    match function.child_by_field_name("return_type") {
        Some(ty) => type_ref(ty, source, resolver),
        None => Ok(TypeRef::unit()),
    }
}

/// Record the imports of a `use_declaration` in `scope`.
pub(crate) fn collect_imports(declaration: Node<'_>, source: &str, scope: &mut Scope) {
    if let Some(argument) = declaration.child_by_field_name("argument") {
        collect_use_clause(argument, &mut Vec::new(), source, scope);
    }
}

fn collect_use_clause(node: Node<'_>, prefix: &mut Vec<String>, source: &str, scope: &mut Scope) {
    match node.kind() {
        "use_as_clause" => {
            let (Some(path), Some(alias)) = (
                node.child_by_field_name("path"),
                node.child_by_field_name("alias"),
            ) else {
                return;
            };
            let alias = text(alias, source);
            if alias == "_" {
                return;
            }
            if let Some((segments, _)) = path_segments(path, source) {
                let mut full = prefix.clone();
                full.extend(segments);
                if full.last().is_some_and(|last| last == "self") {
                    full.pop();
                }
                scope.import(alias, full);
            }
        }
        "scoped_use_list" => {
            let pushed = match node.child_by_field_name("path") {
                Some(path) => path_segments(path, source)
                    .map(|(segments, _)| segments)
                    .unwrap_or_default(),
                None => Vec::new(),
            };
            let count = pushed.len();
            prefix.extend(pushed);
            if let Some(list) = node.child_by_field_name("list") {
                collect_use_clause(list, prefix, source, scope);
            }
            prefix.truncate(prefix.len() - count);
        }
        "use_list" => {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            for child in children {
                collect_use_clause(child, prefix, source, scope);
            }
        }
        "use_wildcard" => {
            let mut full = prefix.clone();
            if let Some((segments, _)) = node
                .named_child(0)
                .and_then(|path| path_segments(path, source))
            {
                full.extend(segments);
            }
            scope.glob(full);
        }
        _ => {
            let Some((segments, _)) = path_segments(node, source) else {
                return;
            };
            let mut full = prefix.clone();
            full.extend(segments);
            if full.last().is_some_and(|last| last == "self") {
                full.pop();
            }
            if let Some(alias) = full.last().cloned() {
                scope.import(alias, full);
            }
        }
    }
}

/// Name of an item in the type namespace, if `node` declares one.
pub(crate) fn declared_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    match node.kind() {
        "struct_item" | "enum_item" | "union_item" | "trait_item" | "type_item" | "mod_item" => {
            node.child_by_field_name("name").map(|name| text(name, source))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EditorDocument;

    fn first_item<'d>(doc: &'d EditorDocument, kind: &str) -> Node<'d> {
        let root = doc.root();
        let mut cursor = root.walk();
        let found = root
            .named_children(&mut cursor)
            .find(|child| child.kind() == kind);
        found.unwrap()
    }

    #[test]
    fn test_trivia_docs_and_annotations() {
        let doc = EditorDocument::open(
            "/// A user.\n///\n/// Stored in `sys_user`.\n#[derive(Debug, Clone)]\n// not docs\n#[table(name = \"sys_user\")]\n#[doc = \"Extra.\"]\npub(crate) struct User;\n",
        )
        .unwrap();
        let item = first_item(&doc, "struct_item");
        let trivia = leading_trivia(item);
        let annotations = annotations(&trivia, doc.source());
        let names: Vec<&str> = annotations.iter().map(|a| a.simple_name()).collect();
        assert_eq!(names, vec!["derive", "table"]);
        assert_eq!(annotations[1].argument("name"), Some("sys_user"));
        assert_eq!(annotations[0].arguments().len(), 2);
        assert_eq!(
            documentation(&trivia, doc.source()),
            "A user.\n\nStored in `sys_user`.\nExtra."
        );
        assert_eq!(visibility(item, doc.source()), Visibility::Crate);
    }

    #[test]
    fn test_doc_comment_forms() {
        assert_eq!(doc_comment("/// text"), Some(" text"));
        assert_eq!(doc_comment("//// rule"), None);
        assert_eq!(doc_comment("/** block */"), Some(" block "));
        assert_eq!(doc_comment("/*** stars */"), None);
        assert_eq!(doc_comment("// plain"), None);
    }

    #[test]
    fn test_use_declarations() {
        let doc = EditorDocument::open(
            "use std::collections::HashMap;\nuse crate::auth::{self, Role as UserRole};\nuse super::dto::*;\n",
        )
        .unwrap();
        let mut scope = Scope::new("crate::model");
        let root = doc.root();
        let mut cursor = root.walk();
        for declaration in root.named_children(&mut cursor) {
            collect_imports(declaration, doc.source(), &mut scope);
        }
        let resolve = |path: &str| {
            let segments: Vec<String> = path.split("::").map(String::from).collect();
            scope.resolve(&segments, false)
        };
        assert_eq!(
            resolve("HashMap"),
            Ok(Resolved::Path("std::collections::HashMap".into()))
        );
        assert_eq!(
            resolve("UserRole"),
            Ok(Resolved::Path("crate::auth::Role".into()))
        );
        assert_eq!(
            resolve("auth::Token"),
            Ok(Resolved::Path("crate::auth::Token".into()))
        );
        assert_eq!(
            scope.glob_candidates("Dto"),
            vec!["crate::dto::Dto".to_string()]
        );
    }

    #[test]
    fn test_function_signatures() {
        let doc = EditorDocument::open(
            "impl User {\n    fn a(&self, id: u64, mut name: String) -> Option<&str> { None }\n    fn b(&mut self) {}\n    fn c(self, (x, y): (u8, u8)) -> () {}\n    fn d(value: Missing) -> Self { todo!() }\n}\n",
        )
        .unwrap();
        let body = first_item(&doc, "impl_item")
            .child_by_field_name("body")
            .unwrap();
        let mut cursor = body.walk();
        let functions: Vec<Node<'_>> = body.named_children(&mut cursor).collect();
        let source = doc.source();
        let scope = Scope::root().for_declaration("crate::User", Vec::new());

        let receivers: Vec<Option<Receiver>> = functions.iter().map(|f| receiver(*f)).collect();
        assert_eq!(
            receivers,
            vec![
                Some(Receiver::Ref),
                Some(Receiver::RefMut),
                Some(Receiver::Value),
                None
            ]
        );

        let params = parameters(functions[0], source, &scope).unwrap();
        let rendered: Vec<String> = params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        assert_eq!(rendered, vec!["id: u64", "name: std::string::String"]);
        assert_eq!(
            return_type(functions[0], source, &scope).unwrap().to_string(),
            "std::option::Option<&str>"
        );
        assert_eq!(return_type(functions[1], source, &scope).unwrap(), TypeRef::unit());
        assert_eq!(parameters(functions[2], source, &scope).unwrap()[0].name, "_");
        assert_eq!(return_type(functions[2], source, &scope).unwrap(), TypeRef::unit());
        assert_eq!(
            parameters(functions[3], source, &scope).unwrap_err(),
            UnresolvedReason::UnknownType("Missing".into())
        );
        assert_eq!(
            return_type(functions[3], source, &scope).unwrap(),
            TypeRef::named("crate::User")
        );
    }
}
