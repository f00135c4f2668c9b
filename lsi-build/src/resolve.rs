use lsi_core::{PathResolver, Resolved, Scope, UnresolvedReason};

use crate::index::{SymbolIndex, is_local};

/// Resolves against a module scope, then checks crate-local paths against the
/// index. Single names that the scope does not know are looked up through the
/// module's glob imports of crate-local modules; globs of other crates cannot
/// be checked and are not expanded.
pub(crate) struct IndexResolver<'s> {
    pub scope: &'s Scope,
    pub index: &'s SymbolIndex,
}

impl IndexResolver<'_> {
    fn verify(&self, path: String) -> Result<Resolved, UnresolvedReason> {
        if !is_local(&path) || self.index.contains(&path) {
            return Ok(Resolved::Path(path));
        }
        match self.index.broken_owner(&path) {
            Some((_, message)) => Err(UnresolvedReason::Erroneous(message.to_string())),
            None => Err(UnresolvedReason::MissingReference(path)),
        }
    }
}

impl PathResolver for IndexResolver<'_> {
    fn resolve(&self, segments: &[String], absolute: bool) -> Result<Resolved, UnresolvedReason> {
        match self.scope.resolve(segments, absolute) {
            Ok(Resolved::Path(path)) => self.verify(path),
            Err(UnresolvedReason::UnknownType(written)) if segments.len() == 1 => self
                .scope
                .glob_candidates(&segments[0])
                .into_iter()
                .find(|candidate| is_local(candidate) && self.index.contains(candidate))
                .map(Resolved::Path)
                .ok_or(UnresolvedReason::UnknownType(written)),
            other => other,
        }
    }
}
