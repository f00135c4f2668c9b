//! Class and field views over `syn` items.

use lsi_core::{
    Annotation, Annotations, Class, ClassKind, Element, Error, Field, Method, Parameter, Receiver,
    Result, Scope, TypeRef, Visibility,
};
use proc_macro2::Span;
use syn::{Item, ItemEnum, ItemStruct, spanned::Spanned};

use crate::syntax::{self, ImplSite, MethodSite};

#[derive(Clone, Copy)]
enum ClassNative<'a> {
    Struct(&'a ItemStruct),
    Enum(&'a ItemEnum),
}

#[derive(Clone, Copy)]
enum FieldNative<'a> {
    Field(&'a syn::Field),
    Variant(&'a syn::Variant),
}

struct FieldData<'a> {
    native: FieldNative<'a>,
    name: String,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    ty: Result<TypeRef>,
}

struct MethodData {
    name: String,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    type_parameters: Vec<String>,
    receiver: Option<Receiver>,
    parameters: Result<Vec<Parameter>>,
    return_type: Result<TypeRef>,
}

impl MethodData {
    fn translate(site: &MethodSite<'_>, owner: &str) -> Self {
        let name = site.name();
        let declaration = format!("{}::{}", owner, name);
        let unresolved = |reason| Error::unresolved(declaration.clone(), reason);
        Self {
            annotations: syntax::annotations(&site.item.attrs),
            documentation: syntax::documentation(&site.item.attrs),
            visibility: syntax::visibility(&site.item.vis),
            type_parameters: site.type_parameters(),
            receiver: site.receiver(),
            parameters: site.parameters(&site.scope).map_err(unresolved),
            return_type: site.return_type(&site.scope).map_err(unresolved),
            name,
        }
    }
}

/// A struct or enum seen through the class view.
///
/// Everything is translated when the adapter is built: a macro expansion
/// already holds the whole item, so there is nothing to defer.
pub struct MacroClass<'a> {
    native: ClassNative<'a>,
    qualified_name: String,
    simple_name: String,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    type_parameters: Vec<String>,
    fields: Vec<FieldData<'a>>,
    methods: Vec<MethodData>,
    supertypes: Result<Vec<TypeRef>>,
}

impl<'a> MacroClass<'a> {
    /// Wrap a struct declared in `scope`. Supertypes and methods need the
    /// surrounding impl blocks and are empty for a standalone item.
    pub fn wrap_struct(item: &'a ItemStruct, scope: &Scope) -> Self {
        Self::build(ClassNative::Struct(item), scope, &[])
    }

    pub fn wrap_enum(item: &'a ItemEnum, scope: &Scope) -> Self {
        Self::build(ClassNative::Enum(item), scope, &[])
    }

    /// Wrap any item. Only structs and enums support the class view.
    pub fn try_from_item(item: &'a Item, scope: &Scope) -> Result<Self> {
        match item {
            Item::Struct(item) => Ok(Self::wrap_struct(item, scope)),
            Item::Enum(item) => Ok(Self::wrap_enum(item, scope)),
            other => Err(Error::mismatch("class", syntax::describe_item(other))),
        }
    }

    pub(crate) fn from_struct(
        item: &'a ItemStruct,
        scope: &Scope,
        impls: &[ImplSite<'_>],
    ) -> Self {
        Self::build(ClassNative::Struct(item), scope, impls)
    }

    pub(crate) fn from_enum(item: &'a ItemEnum, scope: &Scope, impls: &[ImplSite<'_>]) -> Self {
        Self::build(ClassNative::Enum(item), scope, impls)
    }

    fn build(native: ClassNative<'a>, scope: &Scope, impls: &[ImplSite<'_>]) -> Self {
        let (ident, attrs, vis, generics) = match native {
            ClassNative::Struct(item) => (&item.ident, &item.attrs, &item.vis, &item.generics),
            ClassNative::Enum(item) => (&item.ident, &item.attrs, &item.vis, &item.generics),
        };
        let simple_name = ident.to_string();
        let qualified_name = scope.qualify_local(&simple_name);
        let generic_names = syntax::generic_names(generics);
        let decl_scope = scope.for_declaration(qualified_name.clone(), generic_names.clone());
        let visibility = syntax::visibility(vis);

        let fields = match native {
            ClassNative::Struct(item) => {
                translate_fields(&item.fields, &qualified_name, &decl_scope)
            }
            ClassNative::Enum(item) => {
                let self_type = TypeRef::generic(
                    qualified_name.clone(),
                    generic_names
                        .iter()
                        .map(|name| TypeRef::Param { name: name.clone() })
                        .collect(),
                );
                item.variants
                    .iter()
                    .map(|variant| FieldData {
                        native: FieldNative::Variant(variant),
                        name: variant.ident.to_string(),
                        annotations: syntax::annotations(&variant.attrs),
                        documentation: syntax::documentation(&variant.attrs),
                        visibility: visibility.clone(),
                        ty: Ok(self_type.clone()),
                    })
                    .collect()
            }
        };

        let supertypes = impls
            .iter()
            .filter_map(|site| {
                let header = site.header_scope();
                site.trait_for(&qualified_name, &header)
            })
            .map(|resolved| resolved.map_err(|reason| Error::unresolved(&qualified_name, reason)))
            .collect();
        let methods = syntax::methods_of(impls, &qualified_name)
            .iter()
            .map(|site| MethodData::translate(site, &qualified_name))
            .collect();

        Self {
            native,
            annotations: syntax::annotations(attrs),
            documentation: syntax::documentation(attrs),
            visibility,
            type_parameters: generic_names,
            qualified_name,
            simple_name,
            fields,
            methods,
            supertypes,
        }
    }

    /// Span of the declaration name, for diagnostics attached to this class.
    pub fn span(&self) -> Span {
        match self.native {
            ClassNative::Struct(item) => item.ident.span(),
            ClassNative::Enum(item) => item.ident.span(),
        }
    }

    /// The field view of `native`, which must be one of this struct's fields.
    pub fn wrap_field(&self, native: &syn::Field) -> Result<MacroField<'_, 'a>> {
        self.find_native(|data| {
            matches!(data.native, FieldNative::Field(field) if std::ptr::eq(field, native))
        })
        .ok_or_else(|| {
            Error::mismatch(
                "field",
                format!("field not declared by `{}`", self.qualified_name),
            )
        })
    }

    /// The field view of `native`, which must be one of this enum's variants.
    pub fn wrap_variant(&self, native: &syn::Variant) -> Result<MacroField<'_, 'a>> {
        self.find_native(|data| {
            matches!(data.native, FieldNative::Variant(variant) if std::ptr::eq(variant, native))
        })
        .ok_or_else(|| {
            Error::mismatch(
                "field",
                format!(
                    "variant `{}` not declared by `{}`",
                    native.ident, self.qualified_name
                ),
            )
        })
    }

    fn find_native(
        &self,
        matches: impl Fn(&FieldData<'a>) -> bool,
    ) -> Option<MacroField<'_, 'a>> {
        self.fields
            .iter()
            .find(|data| matches(data))
            .map(|data| MacroField { class: self, data })
    }
}

fn translate_fields<'a>(
    fields: &'a syn::Fields,
    owner: &str,
    scope: &Scope,
) -> Vec<FieldData<'a>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let name = field
                .ident
                .as_ref()
                .map(|ident| ident.to_string())
                .unwrap_or_else(|| index.to_string());
            let ty = syntax::type_ref(&field.ty, scope)
                .map_err(|reason| Error::unresolved(format!("{}.{}", owner, name), reason));
            FieldData {
                native: FieldNative::Field(field),
                annotations: syntax::annotations(&field.attrs),
                documentation: syntax::documentation(&field.attrs),
                visibility: syntax::visibility(&field.vis),
                name,
                ty,
            }
        })
        .collect()
}

impl Element for MacroClass<'_> {
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

impl Class for MacroClass<'_> {
    fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    fn simple_name(&self) -> &str {
        &self.simple_name
    }

    fn kind(&self) -> ClassKind {
        match self.native {
            ClassNative::Struct(_) => ClassKind::Struct,
            ClassNative::Enum(_) => ClassKind::Enum,
        }
    }

    fn fields(&self) -> Result<Vec<Box<dyn Field + '_>>> {
        Ok(self
            .fields
            .iter()
            .map(|data| Box::new(MacroField { class: self, data }) as Box<dyn Field + '_>)
            .collect())
    }

    fn supertypes(&self) -> Result<Vec<TypeRef>> {
        self.supertypes.clone()
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
            .methods
            .iter()
            .map(|data| Box::new(MacroMethod { class: self, data }) as Box<dyn Method + '_>)
            .collect())
    }
}

/// An associated function of an inherent impl seen through the method view.
pub struct MacroMethod<'c, 'a> {
    class: &'c MacroClass<'a>,
    data: &'c MethodData,
}

impl Method for MacroMethod<'_, '_> {
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
        self.data.parameters.clone()
    }

    fn return_type(&self) -> Result<TypeRef> {
        self.data.return_type.clone()
    }

    fn owning_class(&self) -> &dyn Class {
        self.class
    }
}

/// A struct field or enum variant seen through the field view.
///
/// Variants are field-like only here; the macro host does not offer a class
/// view of a variant.
pub struct MacroField<'c, 'a> {
    class: &'c MacroClass<'a>,
    data: &'c FieldData<'a>,
}

impl MacroField<'_, '_> {
    pub fn span(&self) -> Span {
        match self.data.native {
            FieldNative::Field(field) => field
                .ident
                .as_ref()
                .map(|ident| ident.span())
                .unwrap_or_else(|| field.ty.span()),
            FieldNative::Variant(variant) => variant.ident.span(),
        }
    }

    pub fn is_variant(&self) -> bool {
        matches!(self.data.native, FieldNative::Variant(_))
    }
}

impl Element for MacroField<'_, '_> {
    fn is_field_like(&self) -> bool {
        true
    }

    fn is_class_like(&self) -> bool {
        false
    }

    fn as_field(&self) -> Option<&dyn Field> {
        Some(self)
    }
}

impl Field for MacroField<'_, '_> {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn annotations(&self) -> Annotations<'_> {
        Annotations::new(&self.data.annotations)
    }

    fn ty(&self) -> Result<TypeRef> {
        self.data.ty.clone()
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
