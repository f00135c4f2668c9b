//! Lazily translated class and field views over indexed files.

use std::{cell::OnceCell, rc::Rc};

use lsi_core::{
    Annotation, Annotations, Class, ClassKind, Element, Environment, Error, Field, Method,
    Parameter, Receiver, Result, Scope, TypeRef, UnresolvedReason, Visibility,
};
use lsi_macro::syntax::{self, ImplSite, MethodSite};
use syn::{ItemEnum, ItemStruct};

use crate::{index::SymbolIndex, resolve::IndexResolver};

/// What every class of one host session shares.
#[derive(Clone)]
pub(crate) struct Session<'r> {
    pub index: &'r SymbolIndex,
    pub env: &'r Environment,
    pub impls: Rc<Vec<ImplSite<'r>>>,
}

#[derive(Clone, Copy)]
enum ClassNative<'r> {
    Struct(&'r ItemStruct),
    Enum(&'r ItemEnum),
    Variant(&'r syn::Variant),
}

#[derive(Clone, Copy)]
enum FieldNative<'r> {
    Field(&'r syn::Field),
    Variant(&'r syn::Variant),
}

struct FieldData<'r> {
    native: FieldNative<'r>,
    name: String,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    variant_class: OnceCell<BuildClass<'r>>,
}

struct MethodData<'r> {
    site: MethodSite<'r>,
    name: String,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    type_parameters: Vec<String>,
    receiver: Option<Receiver>,
}

/// A struct, enum or enum variant of the indexed crate.
///
/// Field lists, field types, methods and supertypes are computed on first
/// access. Field types are memoised in the run environment.
pub struct BuildClass<'r> {
    session: Session<'r>,
    native: ClassNative<'r>,
    scope: Scope,
    qualified_name: String,
    simple_name: String,
    self_type: TypeRef,
    annotations: Vec<Annotation>,
    documentation: String,
    visibility: Visibility,
    type_parameters: Vec<String>,
    fields: OnceCell<Vec<FieldData<'r>>>,
    methods: OnceCell<Vec<MethodData<'r>>>,
    supertypes: OnceCell<Result<Vec<TypeRef>>>,
}

impl<'r> BuildClass<'r> {
    pub(crate) fn from_struct(session: Session<'r>, item: &'r ItemStruct, module: &Scope) -> Self {
        Self::declared(
            session,
            ClassNative::Struct(item),
            module,
            &item.ident,
            &item.attrs,
            &item.vis,
            &item.generics,
        )
    }

    pub(crate) fn from_enum(session: Session<'r>, item: &'r ItemEnum, module: &Scope) -> Self {
        Self::declared(
            session,
            ClassNative::Enum(item),
            module,
            &item.ident,
            &item.attrs,
            &item.vis,
            &item.generics,
        )
    }

    fn declared(
        session: Session<'r>,
        native: ClassNative<'r>,
        module: &Scope,
        ident: &syn::Ident,
        attrs: &[syn::Attribute],
        vis: &syn::Visibility,
        generics: &syn::Generics,
    ) -> Self {
        let simple_name = ident.to_string();
        let qualified_name = module.qualify_local(&simple_name);
        let generic_names = syntax::generic_names(generics);
        let self_type = TypeRef::generic(
            qualified_name.clone(),
            generic_names
                .iter()
                .map(|name| TypeRef::Param { name: name.clone() })
                .collect(),
        );
        Self {
            session,
            native,
            scope: module.for_declaration(qualified_name.clone(), generic_names.clone()),
            qualified_name,
            simple_name,
            self_type,
            annotations: syntax::annotations(attrs),
            documentation: syntax::documentation(attrs),
            visibility: syntax::visibility(vis),
            type_parameters: generic_names,
            fields: OnceCell::new(),
            methods: OnceCell::new(),
            supertypes: OnceCell::new(),
        }
    }

    /// The class view of a variant of `parent`. Paths inside the variant are
    /// resolved in the enum's scope.
    fn variant(parent: &BuildClass<'r>, data: &FieldData<'r>, variant: &'r syn::Variant) -> Self {
        Self {
            session: parent.session.clone(),
            native: ClassNative::Variant(variant),
            scope: parent.scope.clone(),
            qualified_name: format!("{}::{}", parent.qualified_name, data.name),
            simple_name: data.name.clone(),
            self_type: parent.self_type.clone(),
            annotations: data.annotations.clone(),
            documentation: data.documentation.clone(),
            visibility: data.visibility.clone(),
            type_parameters: parent.type_parameters.clone(),
            fields: OnceCell::new(),
            methods: OnceCell::new(),
            supertypes: OnceCell::new(),
        }
    }

    fn field_data(&self) -> &[FieldData<'r>] {
        self.fields.get_or_init(|| match self.native {
            ClassNative::Struct(item) => translate_fields(&item.fields),
            ClassNative::Variant(variant) => translate_fields(&variant.fields),
            ClassNative::Enum(item) => item
                .variants
                .iter()
                .map(|variant| FieldData {
                    native: FieldNative::Variant(variant),
                    name: variant.ident.to_string(),
                    annotations: syntax::annotations(&variant.attrs),
                    documentation: syntax::documentation(&variant.attrs),
                    visibility: self.visibility.clone(),
                    variant_class: OnceCell::new(),
                })
                .collect(),
        })
    }

    fn method_data(&self) -> &[MethodData<'r>] {
        self.methods.get_or_init(|| {
            if let ClassNative::Variant(_) = self.native {
                return Vec::new();
            }
            syntax::methods_of(&self.session.impls, &self.qualified_name)
                .into_iter()
                .map(|site| MethodData {
                    name: site.name(),
                    annotations: syntax::annotations(&site.item.attrs),
                    documentation: syntax::documentation(&site.item.attrs),
                    visibility: syntax::visibility(&site.item.vis),
                    type_parameters: site.type_parameters(),
                    receiver: site.receiver(),
                    site,
                })
                .collect()
        })
    }

    fn resolve_supertypes(&self) -> Result<Vec<TypeRef>> {
        if let ClassNative::Variant(_) = self.native {
            return Ok(Vec::new());
        }
        self.session
            .impls
            .iter()
            .filter_map(|site| {
                let header = site.header_scope();
                let resolver = IndexResolver {
                    scope: &header,
                    index: self.session.index,
                };
                site.trait_for(&self.qualified_name, &resolver)
            })
            .map(|resolved| {
                resolved.map_err(|reason| Error::unresolved(self.qualified_name.clone(), reason))
            })
            .collect()
    }
}

fn translate_fields(fields: &syn::Fields) -> Vec<FieldData<'_>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| FieldData {
            native: FieldNative::Field(field),
            name: field
                .ident
                .as_ref()
                .map(|ident| ident.to_string())
                .unwrap_or_else(|| index.to_string()),
            annotations: syntax::annotations(&field.attrs),
            documentation: syntax::documentation(&field.attrs),
            visibility: syntax::visibility(&field.vis),
            variant_class: OnceCell::new(),
        })
        .collect()
}

impl Element for BuildClass<'_> {
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

impl Class for BuildClass<'_> {
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
            ClassNative::Variant(_) => ClassKind::Variant,
        }
    }

    fn fields(&self) -> Result<Vec<Box<dyn Field + '_>>> {
        Ok(self
            .field_data()
            .iter()
            .map(|data| Box::new(BuildField { class: self, data }) as Box<dyn Field + '_>)
            .collect())
    }

    fn supertypes(&self) -> Result<Vec<TypeRef>> {
        self.supertypes
            .get_or_init(|| self.resolve_supertypes())
            .clone()
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
            .map(|data| Box::new(BuildMethod { class: self, data }) as Box<dyn Method + '_>)
            .collect())
    }
}

/// An associated function of an inherent impl anywhere in the index.
/// Signature types are checked against the index on each access.
pub struct BuildMethod<'c, 'r> {
    class: &'c BuildClass<'r>,
    data: &'c MethodData<'r>,
}

impl BuildMethod<'_, '_> {
    fn resolver(&self) -> IndexResolver<'_> {
        IndexResolver {
            scope: &self.data.site.scope,
            index: self.class.session.index,
        }
    }

    fn unresolved(&self, reason: UnresolvedReason) -> Error {
        Error::unresolved(
            format!("{}::{}", self.class.qualified_name, self.data.name),
            reason,
        )
    }
}

impl Method for BuildMethod<'_, '_> {
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
        self.data
            .site
            .parameters(&self.resolver())
            .map_err(|reason| self.unresolved(reason))
    }

    fn return_type(&self) -> Result<TypeRef> {
        self.data
            .site
            .return_type(&self.resolver())
            .map_err(|reason| self.unresolved(reason))
    }

    fn owning_class(&self) -> &dyn Class {
        self.class
    }
}

/// A field or enum variant of a [`BuildClass`].
///
/// Every variant, unit variants included, also answers the class view.
pub struct BuildField<'c, 'r> {
    class: &'c BuildClass<'r>,
    data: &'c FieldData<'r>,
}

impl Element for BuildField<'_, '_> {
    fn is_field_like(&self) -> bool {
        true
    }

    fn is_class_like(&self) -> bool {
        matches!(self.data.native, FieldNative::Variant(_))
    }

    fn as_field(&self) -> Option<&dyn Field> {
        Some(self)
    }

    fn as_class(&self) -> Option<&dyn Class> {
        match self.data.native {
            FieldNative::Variant(variant) => Some(
                self.data
                    .variant_class
                    .get_or_init(|| BuildClass::variant(self.class, self.data, variant)),
            ),
            FieldNative::Field(_) => None,
        }
    }
}

impl Field for BuildField<'_, '_> {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn annotations(&self) -> Annotations<'_> {
        Annotations::new(&self.data.annotations)
    }

    fn ty(&self) -> Result<TypeRef> {
        let field = match self.data.native {
            FieldNative::Variant(_) => return Ok(self.class.self_type.clone()),
            FieldNative::Field(field) => field,
        };
        let declaration = format!("{}.{}", self.class.qualified_name, self.data.name);
        let session = &self.class.session;
        let key = format!("build:{}", declaration);
        session.env.memo().type_ref(&key, || {
            let resolver = IndexResolver {
                scope: &self.class.scope,
                index: session.index,
            };
            syntax::type_ref(&field.ty, &resolver)
                .map_err(|reason| Error::unresolved(declaration.clone(), reason))
        })
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
