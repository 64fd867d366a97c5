//! Link resolution for serialized records.

use super::entity_repo::{EntityRepository, RepoResult};
use crate::schema::{EntityKind, LinkResolver, RecordId};
use std::collections::HashMap;

/// Resolves linked display names through the visibility filter, caching
/// each `(kind, id)` for the lifetime of one read.
pub struct CachedLinks<'repo, R> {
    repo: &'repo R,
    cache: HashMap<(EntityKind, RecordId), Option<String>>,
}

impl<'repo, R: EntityRepository> CachedLinks<'repo, R> {
    pub fn new(repo: &'repo R) -> Self {
        Self {
            repo,
            cache: HashMap::new(),
        }
    }
}

impl<R: EntityRepository> LinkResolver for CachedLinks<'_, R> {
    fn display_name(&mut self, target: EntityKind, id: RecordId) -> RepoResult<Option<String>> {
        if let Some(name) = self.cache.get(&(target, id)) {
            return Ok(name.clone());
        }
        let name = self.repo.visible_display_name(target, id)?;
        self.cache.insert((target, id), name.clone());
        Ok(name)
    }
}
