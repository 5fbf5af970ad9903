//! Definition registry
//!
//! Ordered map from bean id to [`BeanDefinition`]. Registration order is kept
//! because it decides by-type lookups and the order of destruction.

use crate::definition::{BeanDefinition, DependencyRef};
use crate::{ContainerError, Result};
use ahash::RandomState;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Entries {
    ordered: Vec<(String, Arc<BeanDefinition>)>,
    index: HashMap<String, usize, RandomState>,
    // First position registered for each target type
    by_type: HashMap<TypeId, usize, RandomState>,
}

/// Thread-safe, append-only registry of bean definitions
#[derive(Default)]
pub struct DefinitionRegistry {
    entries: RwLock<Entries>,
}

impl DefinitionRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries {
                ordered: Vec::with_capacity(capacity),
                index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
                by_type: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            }),
        }
    }

    /// Register a definition. Fails with `DuplicateDefinition` and leaves the
    /// registry untouched if `id` is taken.
    pub fn register(&self, id: String, definition: BeanDefinition) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.index.contains_key(&id) {
            return Err(ContainerError::DuplicateDefinition { id });
        }

        let position = entries.ordered.len();
        entries.index.insert(id.clone(), position);
        entries
            .by_type
            .entry(definition.type_id())
            .or_insert(position);
        entries.ordered.push((id, Arc::new(definition)));
        Ok(())
    }

    /// Look up a definition, failing with `NotFound`
    pub fn lookup(&self, id: &str) -> Result<Arc<BeanDefinition>> {
        self.get(id).ok_or_else(|| ContainerError::not_found(id))
    }

    pub fn get(&self, id: &str) -> Option<Arc<BeanDefinition>> {
        let entries = self.entries.read();
        entries
            .index
            .get(id)
            .map(|&position| Arc::clone(&entries.ordered[position].1))
    }

    /// First registered id whose target type is `type_id`
    pub fn lookup_id_by_type(&self, type_id: TypeId) -> Option<String> {
        let entries = self.entries.read();
        entries
            .by_type
            .get(&type_id)
            .map(|&position| entries.ordered[position].0.clone())
    }

    /// Turn a dependency reference into a bean id
    pub fn resolve_dependency(&self, dependency: &DependencyRef) -> Result<String> {
        match dependency {
            DependencyRef::Named(id) => Ok(id.clone()),
            DependencyRef::ByType { type_id, type_name } => self
                .lookup_id_by_type(*type_id)
                .ok_or(ContainerError::NoCandidate {
                    type_name: *type_name,
                }),
        }
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().index.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.read().ordered.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.read().ordered.is_empty()
    }

    /// All ids in registration order
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .read()
            .ordered
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Copy of every entry in registration order
    pub(crate) fn snapshot(&self) -> Vec<(String, Arc<BeanDefinition>)> {
        self.entries.read().ordered.clone()
    }
}

impl std::fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("count", &self.len())
            .finish()
    }
}
