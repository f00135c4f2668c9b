//! The set of source files a build script analyses.

use std::{
    cell::OnceCell,
    path::{Component, Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use lsi_core::CRATE_ROOT;
use lsi_macro::syntax::module_scope;
use syn::Item;
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// One source file of the indexed crate.
pub struct SourceFile {
    path: PathBuf,
    module: String,
    text: String,
    parsed: OnceCell<std::result::Result<syn::File, String>>,
}

impl SourceFile {
    fn new(path: PathBuf, module: String, text: String) -> Self {
        Self {
            path,
            module,
            text,
            parsed: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Module path of the file, e.g. `crate::model`.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed file. Parsing happens on first access; a syntax error is
    /// kept and returned on every later access.
    pub fn syntax(&self) -> std::result::Result<&syn::File, &str> {
        self.parsed
            .get_or_init(|| {
                tracing::debug!(path = %self.path.display(), "parsing source file");
                syn::parse_file(&self.text)
                    .map_err(|err| format!("{}: {}", self.path.display(), err))
            })
            .as_ref()
            .map_err(String::as_str)
    }

    /// Whether `path` names something inside this file's module.
    fn owns(&self, path: &str) -> bool {
        path.strip_prefix(self.module.as_str())
            .is_some_and(|rest| rest.starts_with("::"))
    }
}

/// Module path for a file at `relative` under the crate's `src/` directory.
///
/// `lib.rs` and `main.rs` are the crate root, `a.rs` and `a/mod.rs` are
/// `crate::a`, `a/b.rs` is `crate::a::b`. Returns `None` for anything that is
/// not a `.rs` file, and for the separate binary crates under `bin/`.
pub fn module_path_for(relative: &Path) -> Option<String> {
    if relative.extension()? != "rs" {
        return None;
    }
    let mut segments: Vec<String> = Vec::new();
    for component in relative.parent()?.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.first().is_some_and(|first| first == "bin") {
        return None;
    }
    let stem = relative.file_stem()?.to_str()?;
    let at_root = segments.is_empty();
    match stem {
        "mod" if !at_root => {}
        "lib" | "main" if at_root => {}
        stem => segments.push(stem.to_string()),
    }
    let mut path = vec![CRATE_ROOT.to_string()];
    path.extend(segments);
    Some(path.join("::"))
}

/// Steps followed through re-exports before a path is given up on.
const MAX_REEXPORT_DEPTH: usize = 16;

/// What the parsed files make nameable.
#[derive(Default)]
struct Declared {
    /// Modules and type-namespace items, where they are defined.
    items: IndexSet<String>,
    /// `use` aliases by the path they make nameable, e.g.
    /// `crate::model::User` for `use user::User;` in `crate::model`.
    aliases: IndexMap<String, String>,
    /// Glob imports of each module.
    globs: IndexMap<String, Vec<String>>,
}

/// Every source file of one crate, and the paths they declare.
#[derive(Default)]
pub struct SymbolIndex {
    files: Vec<SourceFile>,
    declared: OnceCell<Declared>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover the library's `.rs` files under `src_dir`, in file-name order.
    ///
    /// Binaries are separate crates: `bin/` is skipped, and so is `main.rs`
    /// when a `lib.rs` exists next to it.
    pub fn from_src_dir(src_dir: &Path) -> Result<Self> {
        let mut index = Self::new();
        let has_lib = src_dir.join("lib.rs").is_file();
        for entry in WalkDir::new(src_dir).sort_by_file_name() {
            let entry = entry.map_err(|source| {
                Box::new(BuildError::Walk {
                    root: src_dir.to_path_buf(),
                    source,
                })
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(src_dir) else {
                continue;
            };
            if has_lib && relative == Path::new("main.rs") {
                tracing::debug!(path = %entry.path().display(), "skipping binary crate root");
                continue;
            }
            let Some(module) = module_path_for(relative) else {
                continue;
            };
            let text = std::fs::read_to_string(entry.path())
                .map_err(|source| BuildError::io(entry.path(), source))?;
            index.add_file(module, entry.path(), text);
        }
        tracing::debug!(root = %src_dir.display(), files = index.files.len(), "indexed sources");
        Ok(index)
    }

    /// Add a file with an explicit module path.
    pub fn add_file(
        &mut self,
        module: impl Into<String>,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) {
        self.files
            .push(SourceFile::new(path.into(), module.into(), text.into()));
        self.declared = OnceCell::new();
    }

    /// Add a file whose module path follows from its location under `src/`.
    /// Returns false if `relative` is not a module file.
    pub fn add_source(&mut self, relative: impl AsRef<Path>, text: impl Into<String>) -> bool {
        let relative = relative.as_ref();
        match module_path_for(relative) {
            Some(module) => {
                self.add_file(module, relative, text);
                true
            }
            None => false,
        }
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    fn declared(&self) -> &Declared {
        self.declared.get_or_init(|| {
            let mut declared = Declared::default();
            for file in &self.files {
                declared.items.insert(file.module.clone());
                if let Ok(syntax) = file.syntax() {
                    collect_declared(&file.module, &syntax.items, &mut declared);
                }
            }
            declared
        })
    }

    /// Whether `path` names a module or type-namespace item of the parsed
    /// files, either where it is defined or through `use` re-exports. Files
    /// that fail to parse contribute their module path only.
    pub fn contains(&self, path: &str) -> bool {
        self.definition(path).is_some()
    }

    /// The path where the item named by `path` is defined, following
    /// re-exports. Paths into other crates are returned as they are reached.
    pub fn definition(&self, path: &str) -> Option<String> {
        self.follow(path, MAX_REEXPORT_DEPTH)
    }

    fn follow(&self, path: &str, depth: usize) -> Option<String> {
        let declared = self.declared();
        if declared.items.contains(path) {
            return Some(path.to_string());
        }
        if depth == 0 {
            return None;
        }
        if let Some(target) = declared.aliases.get(path) {
            if !is_local(target) {
                return Some(target.clone());
            }
            return self.follow(target, depth - 1);
        }
        let (module, name) = path.rsplit_once("::")?;
        let module = self.follow(module, depth - 1)?;
        if !is_local(&module) {
            return Some(format!("{}::{}", module, name));
        }
        let direct = format!("{}::{}", module, name);
        if direct != path {
            if let Some(found) = self.follow(&direct, depth - 1) {
                return Some(found);
            }
        }
        declared
            .globs
            .get(&module)
            .into_iter()
            .flatten()
            .filter(|glob| is_local(glob))
            .find_map(|glob| self.follow(&format!("{}::{}", glob, name), depth - 1))
    }

    /// The unparsable file whose module contains `path`, with its error.
    pub fn broken_owner(&self, path: &str) -> Option<(&SourceFile, &str)> {
        self.files.iter().find_map(|file| match file.syntax() {
            Err(message) if file.owns(path) => Some((file, message)),
            _ => None,
        })
    }
}

/// Whether `path` is anchored at this crate's root.
pub(crate) fn is_local(path: &str) -> bool {
    path.strip_prefix(CRATE_ROOT)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

fn collect_declared(module: &str, items: &[Item], out: &mut Declared) {
    let scope = module_scope(module, items);
    for (alias, target) in scope.qualified_imports() {
        out.aliases
            .entry(scope.qualify_local(alias))
            .or_insert(target);
    }
    let globs = scope.qualified_globs();
    if !globs.is_empty() {
        out.globs.entry(module.to_string()).or_default().extend(globs);
    }
    for item in items {
        let name = match item {
            Item::Struct(item) => &item.ident,
            Item::Enum(item) => &item.ident,
            Item::Union(item) => &item.ident,
            Item::Trait(item) => &item.ident,
            Item::TraitAlias(item) => &item.ident,
            Item::Type(item) => &item.ident,
            Item::Mod(item) => {
                let path = scope.qualify_local(&item.ident.to_string());
                if let Some((_, body)) = &item.content {
                    collect_declared(&path, body, out);
                }
                out.items.insert(path);
                continue;
            }
            _ => continue,
        };
        out.items.insert(scope.qualify_local(&name.to_string()));
    }
}
