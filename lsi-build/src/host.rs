use std::{cell::OnceCell, rc::Rc};

use lsi_core::{Class, Element, Environment, Error, Host, Result, UnresolvedReason};
use lsi_macro::syntax::{ModuleItems, impl_sites, inline_modules};
use syn::Item;

use crate::{
    class::{BuildClass, Session},
    index::SymbolIndex,
};

/// A build-script session over an indexed crate.
///
/// Files are parsed on first use. A file that fails to parse is skipped with
/// a warning, and lookups of anything it declares report it as erroneous.
pub struct BuildHost<'r> {
    index: &'r SymbolIndex,
    env: &'r Environment,
    classes: OnceCell<Vec<BuildClass<'r>>>,
}

impl<'r> BuildHost<'r> {
    pub fn new(index: &'r SymbolIndex, env: &'r Environment) -> Self {
        Self {
            index,
            env,
            classes: OnceCell::new(),
        }
    }

    pub fn index(&self) -> &'r SymbolIndex {
        self.index
    }

    /// The class adapters of every parsed file, in index order.
    pub fn build_classes(&self) -> &[BuildClass<'r>] {
        self.classes.get_or_init(|| {
            let mut modules: Vec<ModuleItems<'r>> = Vec::new();
            for file in self.index.files() {
                match file.syntax() {
                    Ok(syntax) => modules.extend(inline_modules(file.module(), &syntax.items)),
                    Err(message) => self
                        .env
                        .logger()
                        .warn(&format!("skipping unparsable file: {}", message)),
                }
            }
            let session = Session {
                index: self.index,
                env: self.env,
                impls: Rc::new(impl_sites(&modules)),
            };
            let mut classes = Vec::new();
            for module in &modules {
                for item in module.items {
                    match item {
                        Item::Struct(item) => classes.push(BuildClass::from_struct(
                            session.clone(),
                            item,
                            &module.scope,
                        )),
                        Item::Enum(item) => classes.push(BuildClass::from_enum(
                            session.clone(),
                            item,
                            &module.scope,
                        )),
                        _ => {}
                    }
                }
            }
            tracing::debug!(count = classes.len(), "built build-script class adapters");
            classes
        })
    }
}

impl Host for BuildHost<'_> {
    fn name(&self) -> &'static str {
        "build"
    }

    fn declarations(&self) -> Result<Vec<&dyn Element>> {
        Ok(self
            .build_classes()
            .iter()
            .map(|class| class as &dyn Element)
            .collect())
    }

    fn find_class(&self, qualified_name: &str) -> Result<&dyn Class> {
        if let Some(class) = self
            .build_classes()
            .iter()
            .find(|class| class.qualified_name() == qualified_name)
        {
            return Ok(class);
        }
        let reason = match self.index.broken_owner(qualified_name) {
            Some((_, message)) => UnresolvedReason::Erroneous(message.to_string()),
            None => UnresolvedReason::UnknownType(qualified_name.to_string()),
        };
        Err(Error::unresolved(qualified_name, reason))
    }
}
