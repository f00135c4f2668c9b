//! Annotation occurrences.
//!
//! An annotation is one outer attribute on a declaration. Occurrences are kept
//! as an ordered sequence rather than a map keyed by name, so repeated
//! attributes keep their multiplicity and their own arguments.

use serde::{Deserialize, Serialize};

use crate::utils::{compact_tokens, split_top_level, unquote};

/// One argument of an annotation occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationArg {
    /// `Some` for `key = value` arguments.
    pub name: Option<String>,
    /// String literals are unquoted, anything else is compact token text.
    pub value: String,
}

impl AnnotationArg {
    pub fn positional(value: impl Into<String>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

/// A single annotation occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    path: String,
    arguments: Vec<AnnotationArg>,
}

impl Annotation {
    /// Create an annotation from its path and already-split arguments.
    ///
    /// The path is compacted, so `serde :: rename` and `serde::rename` are the
    /// same annotation.
    pub fn new(path: &str, arguments: Vec<AnnotationArg>) -> Self {
        Self {
            path: compact_tokens(path),
            arguments,
        }
    }

    /// Create an annotation from `#[path(list)]` where `list` is the raw text
    /// between the delimiters.
    pub fn from_list(path: &str, list: &str) -> Self {
        Self::new(path, parse_arguments(list))
    }

    /// Create an annotation from `#[path = value]`.
    pub fn from_name_value(path: &str, value: &str) -> Self {
        Self::new(path, vec![AnnotationArg::positional(normalize_value(value))])
    }

    /// The attribute path as written, e.g. `serde` or `lsi::column`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path. This is what `has_annotation` matches.
    pub fn simple_name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }

    pub fn arguments(&self) -> &[AnnotationArg] {
        &self.arguments
    }

    /// Value of the first argument named `name`.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| a.value.as_str())
    }

    /// Value of the first positional argument.
    pub fn value(&self) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name.is_none())
            .map(|a| a.value.as_str())
    }
}

/// Parse the text between an attribute's delimiters into arguments.
pub fn parse_arguments(list: &str) -> Vec<AnnotationArg> {
    split_top_level(list)
        .into_iter()
        .map(|piece| match split_named(piece) {
            Some((name, value)) => AnnotationArg::named(name, normalize_value(value)),
            None => AnnotationArg::positional(normalize_value(piece)),
        })
        .collect()
}

/// Split `key = value`, rejecting `==` and non-identifier keys.
fn split_named(piece: &str) -> Option<(&str, &str)> {
    let eq = piece.find('=')?;
    let (key, rest) = piece.split_at(eq);
    let value = &rest[1..];
    if value.starts_with('=') {
        return None;
    }
    let key = key.trim();
    let is_ident = !key.is_empty()
        && key.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !key.starts_with(|c: char| c.is_ascii_digit());
    is_ident.then_some((key, value))
}

fn normalize_value(value: &str) -> String {
    unquote(value).unwrap_or_else(|| compact_tokens(value))
}

/// An ordered, restartable view over a declaration's annotation occurrences.
#[derive(Debug, Clone, Copy)]
pub struct Annotations<'a> {
    items: &'a [Annotation],
}

impl<'a> Annotations<'a> {
    pub fn new(items: &'a [Annotation]) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> std::slice::Iter<'a, Annotation> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &'a [Annotation] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Case-sensitive match on the simple name, scanning in declaration order.
    pub fn contains(&self, simple_name: &str) -> bool {
        self.items.iter().any(|a| a.simple_name() == simple_name)
    }

    /// First occurrence with the given simple name.
    pub fn first(&self, simple_name: &str) -> Option<&'a Annotation> {
        self.items.iter().find(|a| a.simple_name() == simple_name)
    }

    /// Every occurrence with the given simple name, in declaration order.
    pub fn named<'n>(self, simple_name: &'n str) -> impl Iterator<Item = &'a Annotation> + 'n
    where
        'a: 'n,
    {
        self.items
            .iter()
            .filter(move |a| a.simple_name() == simple_name)
    }

    /// Distinct simple names, sorted.
    pub fn simple_names(&self) -> std::collections::BTreeSet<&'a str> {
        self.items.iter().map(Annotation::simple_name).collect()
    }
}

impl<'a> IntoIterator for Annotations<'a> {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let args = parse_arguments(r#"name = "sys_user" , length = 64, "extra""#);
        assert_eq!(
            args,
            vec![
                AnnotationArg::named("name", "sys_user"),
                AnnotationArg::named("length", "64"),
                AnnotationArg::positional("extra"),
            ]
        );
    }

    #[test]
    fn test_parse_arguments_keeps_comparisons_positional() {
        let args = parse_arguments("a == b");
        assert_eq!(args, vec![AnnotationArg::positional("a==b")]);
    }

    #[test]
    fn test_annotation_accessors() {
        let ann = Annotation::from_list("lsi :: column", r#"name = "id", 1"#);
        assert_eq!(ann.path(), "lsi::column");
        assert_eq!(ann.simple_name(), "column");
        assert_eq!(ann.argument("name"), Some("id"));
        assert_eq!(ann.value(), Some("1"));
        assert_eq!(ann.argument("missing"), None);
    }

    #[test]
    fn test_name_value_annotation() {
        let ann = Annotation::from_name_value("table", r#""sys_user""#);
        assert_eq!(ann.value(), Some("sys_user"));
    }

    #[test]
    fn test_repeated_occurrences_keep_order() {
        let items = vec![
            Annotation::from_list("dict", r#""sex""#),
            Annotation::new("serde", vec![]),
            Annotation::from_list("dict", r#""status""#),
        ];
        let anns = Annotations::new(&items);

        assert!(anns.contains("dict"));
        assert!(!anns.contains("Dict"));
        let values: Vec<_> = anns.named("dict").filter_map(Annotation::value).collect();
        assert_eq!(values, vec!["sex", "status"]);
        assert_eq!(anns.first("dict").and_then(Annotation::value), Some("sex"));
        assert_eq!(anns.simple_names().into_iter().collect::<Vec<_>>(), vec!["dict", "serde"]);
        // restartable
        assert_eq!(anns.iter().count(), 3);
        assert_eq!(anns.iter().count(), 3);
    }
}
