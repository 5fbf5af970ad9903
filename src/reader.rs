//! Definition sources
//!
//! Anything that discovers beans (annotation scanning, config files, ...)
//! plugs in here by producing `(id, definition)` pairs. The container only
//! sees the result through [`Container::load`](crate::Container::load).

use crate::Result;
use crate::definition::BeanDefinition;

/// Produces bean definitions for a container.
pub trait DefinitionReader {
    /// All definitions this source provides, in registration order.
    fn read_definitions(&self) -> Result<Vec<(String, BeanDefinition)>>;
}

impl<F> DefinitionReader for F
where
    F: Fn() -> Result<Vec<(String, BeanDefinition)>>,
{
    fn read_definitions(&self) -> Result<Vec<(String, BeanDefinition)>> {
        self()
    }
}

/// An in-memory list of definitions.
///
/// # Example
///
/// ```rust
/// use bean_container::{BeanDefinition, Container, DefinitionSet};
///
/// #[derive(Default)]
/// struct Clock;
/// #[derive(Default)]
/// struct Mailer;
///
/// let set = DefinitionSet::new()
///     .with("clock", BeanDefinition::builder::<Clock>().default_constructor().build())
///     .with_default(BeanDefinition::builder::<Mailer>().default_constructor().build());
///
/// let container = Container::new();
/// assert_eq!(container.load(&set).unwrap(), 2);
/// assert_eq!(container.bean_ids(), vec!["clock", "mailer"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    definitions: Vec<(String, BeanDefinition)>,
}

impl DefinitionSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition under `id`
    pub fn with(mut self, id: impl Into<String>, definition: BeanDefinition) -> Self {
        self.definitions.push((id.into(), definition));
        self
    }

    /// Add a definition under its conventional id
    pub fn with_default(self, definition: BeanDefinition) -> Self {
        let id = definition.default_id().to_owned();
        self.with(id, definition)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl DefinitionReader for DefinitionSet {
    fn read_definitions(&self) -> Result<Vec<(String, BeanDefinition)>> {
        Ok(self.definitions.clone())
    }
}
