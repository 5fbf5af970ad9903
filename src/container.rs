//! Bean container
//!
//! The `Container` owns the definition registry and the singleton cache, and
//! builds beans on request. Setter-injected singletons are exposed early while
//! they are wired, which lets two singletons reference each other. A cycle
//! that goes through a constructor cannot be broken and is reported.

use crate::cache::{CacheStats, SingletonCache};
use crate::definition::{Arguments, Bean, BeanDefinition, Injectable, InjectionMode};
use crate::error::InjectionStage;
use crate::lifecycle;
use crate::reader::DefinitionReader;
use crate::registry::DefinitionRegistry;
use crate::{ContainerError, Result};
use parking_lot::ReentrantMutex;
use std::any::TypeId;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

struct Inner {
    registry: DefinitionRegistry,
    cache: SingletonCache,
    /// Held for the whole of a construction. Reentrant so that resolving a
    /// dependency on the same thread can take it again.
    construction: ReentrantMutex<()>,
}

/// Dependency injection container with named beans.
///
/// Cloning is cheap and every clone shares the same state.
///
/// # Examples
///
/// ```rust
/// use bean_container::{BeanDefinition, Container, DependencyRef};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Dependency;
///
/// impl Dependency {
///     fn answer(&self) -> u32 { 42 }
/// }
///
/// struct Service {
///     dependency: Arc<Dependency>,
/// }
///
/// let container = Container::new();
/// container
///     .register("dependency", BeanDefinition::builder::<Dependency>().default_constructor().build())
///     .unwrap();
/// container
///     .register(
///         "service",
///         BeanDefinition::builder::<Service>()
///             .constructor([DependencyRef::named("dependency")], |args| {
///                 Ok(Service { dependency: args.get(0)? })
///             })
///             .build(),
///     )
///     .unwrap();
///
/// let first = container.get::<Service>("service").unwrap();
/// let second = container.get::<Service>("service").unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(first.dependency.answer(), 42);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    /// Create an empty container.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a container sized for roughly `capacity` definitions.
    pub fn with_capacity(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "bean_container",
            capacity = capacity,
            "Creating new bean container"
        );

        Self {
            inner: Arc::new(Inner {
                registry: DefinitionRegistry::with_capacity(capacity),
                cache: SingletonCache::with_capacity(capacity),
                construction: ReentrantMutex::new(()),
            }),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a definition under `id`.
    ///
    /// Fails with [`ContainerError::DuplicateDefinition`] if `id` is taken;
    /// the container is otherwise unaffected.
    pub fn register(&self, id: impl Into<String>, definition: BeanDefinition) -> Result<()> {
        let id = id.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "bean_container",
            bean = id.as_str(),
            bean_type = definition.type_name(),
            scope = ?definition.scope(),
            injection = ?definition.injection(),
            "Registering bean definition"
        );

        self.inner.registry.register(id, definition)
    }

    /// Register a definition under its conventional id (see
    /// [`bean_name_of`](crate::bean_name_of)) and return that id.
    pub fn register_default(&self, definition: BeanDefinition) -> Result<String> {
        let id = definition.default_id().to_owned();
        self.register(id.clone(), definition)?;
        Ok(id)
    }

    /// Register everything a reader produces, in order. Stops at the first
    /// failure and returns how many definitions were registered.
    pub fn load<R: DefinitionReader + ?Sized>(&self, reader: &R) -> Result<usize> {
        let definitions = reader.read_definitions()?;
        let total = definitions.len();

        for (id, definition) in definitions {
            self.register(id, definition)?;
        }

        #[cfg(feature = "logging")]
        debug!(target: "bean_container", count = total, "Loaded bean definitions");

        Ok(total)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a bean by id.
    ///
    /// Singletons are built once and then reused; a singleton whose
    /// construction is in progress yields its early reference. Prototypes are
    /// built fresh on every call and never cached.
    pub fn get_bean(&self, id: &str) -> Result<Bean> {
        let definition = self.inner.registry.lookup(id)?;

        if let Some(bean) = self.inner.cache.completed(id) {
            #[cfg(feature = "logging")]
            trace!(target: "bean_container", bean = id, "Singleton cache hit");
            return Ok(bean);
        }

        let _construction = self.inner.construction.lock();

        if definition.scope().is_singleton() {
            // Another thread may have finished it while we waited for the lock
            if let Some(bean) = self.inner.cache.completed(id) {
                return Ok(bean);
            }
            if let Some(bean) = self.inner.cache.early_reference(id) {
                return Ok(bean);
            }
        }

        self.create_bean(id, &definition)
    }

    /// Resolve a bean by id and downcast it to `T`.
    pub fn get<T: Injectable>(&self, id: &str) -> Result<Arc<T>> {
        self.get_bean(id)?
            .downcast::<T>()
            .map_err(|_| ContainerError::type_mismatch::<T>(id))
    }

    /// Resolve the first registered bean whose type is `T`.
    pub fn get_by_type<T: Injectable>(&self) -> Result<Arc<T>> {
        let id = self
            .inner
            .registry
            .lookup_id_by_type(TypeId::of::<T>())
            .ok_or(ContainerError::NoCandidate {
                type_name: std::any::type_name::<T>(),
            })?;
        self.get(&id)
    }

    fn create_bean(&self, id: &str, definition: &BeanDefinition) -> Result<Bean> {
        let cache = &self.inner.cache;

        if cache.is_in_progress(id) {
            // A constructor cannot be handed an object that does not exist yet
            if definition.injection() == InjectionMode::Constructor {
                return Err(ContainerError::circular(id));
            }
            return cache
                .early_reference(id)
                .ok_or_else(|| ContainerError::circular(id));
        }

        let _in_progress = cache.begin(id);
        let singleton = definition.scope().is_singleton();

        #[cfg(feature = "logging")]
        debug!(
            target: "bean_container",
            bean = id,
            scope = ?definition.scope(),
            injection = ?definition.injection(),
            "Creating bean"
        );

        let bean = self.instantiate(id, definition)?;
        if singleton {
            cache.publish_early(id, &bean);
        }

        self.populate(id, definition, &bean)?;
        lifecycle::initialize(id, definition, &bean)?;

        if singleton {
            cache.complete(id, Arc::clone(&bean));
        }

        #[cfg(feature = "logging")]
        debug!(target: "bean_container", bean = id, "Bean created");

        Ok(bean)
    }

    fn instantiate(&self, id: &str, definition: &BeanDefinition) -> Result<Bean> {
        let constructor = match (definition.injection(), &definition.constructor) {
            (InjectionMode::Constructor, Some(constructor)) => constructor,
            _ => return self.instantiate_zero_arg(id, definition),
        };

        let mut values = Vec::with_capacity(constructor.dependencies.len());
        for dependency in &constructor.dependencies {
            let dependency_id = self.inner.registry.resolve_dependency(dependency)?;
            values.push(self.get_bean(&dependency_id)?);
        }

        (constructor.call)(&Arguments::new(id, &values))
            .map_err(|source| ContainerError::injection(id, InjectionStage::Constructor, source))
    }

    fn instantiate_zero_arg(&self, id: &str, definition: &BeanDefinition) -> Result<Bean> {
        let supply = definition.zero_arg.as_ref().ok_or_else(|| {
            ContainerError::injection(
                id,
                InjectionStage::Constructor,
                format!("{} has no zero-argument constructor", definition.type_name()).into(),
            )
        })?;

        supply().map_err(|source| ContainerError::injection(id, InjectionStage::Constructor, source))
    }

    /// Setter injection, in declaration order. Runs for both injection modes.
    fn populate(&self, id: &str, definition: &BeanDefinition, bean: &Bean) -> Result<()> {
        let cache = &self.inner.cache;

        for setter in &definition.setters {
            let dependency_id = self.inner.registry.resolve_dependency(&setter.dependency)?;

            let dependency = if cache.is_in_progress(&dependency_id) {
                // Mutual reference: take the peer's early reference instead of
                // recursing into it a second time
                cache
                    .early_reference(&dependency_id)
                    .ok_or_else(|| ContainerError::circular(&dependency_id))?
            } else {
                self.get_bean(&dependency_id)?
            };

            #[cfg(feature = "logging")]
            trace!(
                target: "bean_container",
                bean = id,
                setter = setter.name.as_str(),
                dependency = dependency_id.as_str(),
                "Injecting setter dependency"
            );

            (setter.apply)(bean, dependency).map_err(|source| {
                ContainerError::injection(id, InjectionStage::Setter(setter.name.clone()), source)
            })?;
        }

        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Run destroy hooks of every completed singleton, in registration order,
    /// and release them. Prototypes are never destroyed by the container.
    ///
    /// Stops at the first failing hook with [`ContainerError::HookInvocation`].
    /// Returns the number of singletons released.
    pub fn destroy_singletons(&self) -> Result<usize> {
        let _construction = self.inner.construction.lock();

        #[cfg(feature = "logging")]
        debug!(
            target: "bean_container",
            singletons = self.inner.cache.stats().completed,
            "Destroying singletons"
        );

        lifecycle::destroy_singletons(&self.inner.registry, &self.inner.cache)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Check if a definition is registered under `id`.
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.registry.contains(id)
    }

    /// The definition registered under `id`.
    pub fn definition(&self, id: &str) -> Option<Arc<BeanDefinition>> {
        self.inner.registry.get(id)
    }

    /// Registered ids in registration order.
    pub fn bean_ids(&self) -> Vec<String> {
        self.inner.registry.ids()
    }

    /// Number of registered definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    /// Entry counts of the singleton cache tiers.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.len())
            .field("cache", &self.cache_stats())
            .finish()
    }
}
