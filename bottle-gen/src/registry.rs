//! # Registry Module
//!
//! Lookup table from model names to the relationships each model declares.
//! Relation fields reference their target model by name; expanding a relation
//! walks this table instead of following owned references, which keeps cyclic
//! schemas (self references, mutually referencing tables) finite.

use std::collections::{HashMap, HashSet};

use crate::field::Relation;

/// Maximum nesting of child relations produced by [`expand_relations`].
pub const MAX_RELATION_DEPTH: usize = 8;

/// Resolves a model name to the relationships that model declares.
pub trait RelationResolver: Send + Sync {
    fn relationships(&self, model: &str) -> Option<Vec<Relation>>;
}

/// In-memory [`RelationResolver`].
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Vec<Relation>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `model`, replacing any relationships recorded earlier.
    pub fn register(&mut self, model: impl Into<String>, relations: Vec<Relation>) -> &mut Self {
        self.models.insert(model.into(), relations);
        self
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }
}

impl RelationResolver for ModelRegistry {
    fn relationships(&self, model: &str) -> Option<Vec<Relation>> {
        self.models.get(model).cloned()
    }
}

/// Resolves the full relationship chain of `model`.
///
/// Returns `None` when the resolver does not know `model`. Each returned
/// relation has its own children expanded in turn. A model already on the
/// current path is not expanded again, and nesting stops at `max_depth`.
pub fn expand_relations(resolver: &dyn RelationResolver, model: &str, max_depth: usize) -> Option<Vec<Relation>> {
    let mut path = HashSet::new();
    path.insert(model.to_string());
    let relations = resolver.relationships(model)?;
    Some(expand_level(resolver, relations, &mut path, max_depth))
}

fn expand_level(
    resolver: &dyn RelationResolver,
    relations: Vec<Relation>,
    path: &mut HashSet<String>,
    depth: usize,
) -> Vec<Relation> {
    relations
        .into_iter()
        .map(|mut relation| {
            if depth <= 1 {
                return relation;
            }
            let Some(target) = relation.model.clone() else { return relation };
            if path.contains(&target) {
                return relation;
            }
            if let Some(children) = resolver.relationships(&target) {
                path.insert(target.clone());
                let children = expand_level(resolver, children, path, depth - 1);
                path.remove(&target);
                relation.append_child_relation(children);
            }
            relation
        })
        .collect()
}
