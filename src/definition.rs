//! Bean definitions
//!
//! A [`BeanDefinition`] describes how the container builds one bean: how it is
//! allocated, which dependencies it receives and in what order, its scope, and
//! its lifecycle hooks. Dependencies are declared explicitly with
//! [`DependencyRef`] instead of being discovered from the type at runtime.

use crate::error::{BoxError, ContainerError};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type-erased, shareable bean instance.
pub type Bean = Arc<dyn Any + Send + Sync>;

/// Marker trait for types the container can manage.
///
/// Automatically implemented for every `Send + Sync + 'static` type.
pub trait Injectable: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Injectable for T {}

/// How a bean receives its dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InjectionMode {
    /// Dependencies are passed to the constructor. Setters still run afterwards
    /// for optional properties.
    #[default]
    Constructor,

    /// The bean is allocated with its zero-argument constructor and wired
    /// through setters only. Only this mode can take part in a resolved cycle.
    Setter,
}

/// Bean scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BeanScope {
    /// One shared instance per id, cached by the container
    #[default]
    Singleton,

    /// A new, uncached instance on every request
    Prototype,
}

impl BeanScope {
    #[inline]
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

/// Conventional bean id for a type: its simple name with the first letter
/// lower-cased (`UserService` becomes `userService`).
///
/// ```rust
/// use bean_container::bean_name_of;
///
/// struct UserService;
/// assert_eq!(bean_name_of::<UserService>(), "userService");
/// ```
pub fn bean_name_of<T: ?Sized + 'static>() -> String {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    let simple = path.rsplit("::").next().unwrap_or(path);

    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reference from a bean to one of its dependencies.
#[derive(Clone)]
pub enum DependencyRef {
    /// The dependency's bean id
    Named(String),

    /// The first definition registered for the target type, looked up in
    /// whichever container resolves it
    ByType {
        type_id: TypeId,
        type_name: &'static str,
    },
}

impl DependencyRef {
    /// Reference a bean by id
    #[inline]
    pub fn named(id: impl Into<String>) -> Self {
        Self::Named(id.into())
    }

    /// Reference the first registered bean of type `T`
    #[inline]
    pub fn of<T: Injectable>() -> Self {
        Self::ByType {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Bean id or type name, for diagnostics
    pub fn describe(&self) -> &str {
        match self {
            Self::Named(id) => id.as_str(),
            Self::ByType { type_name, .. } => *type_name,
        }
    }
}

impl fmt::Debug for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(id) => f.debug_tuple("Named").field(id).finish(),
            Self::ByType { type_name, .. } => f
                .debug_struct("ByType")
                .field("type_name", type_name)
                .finish(),
        }
    }
}

impl From<&str> for DependencyRef {
    fn from(id: &str) -> Self {
        Self::named(id)
    }
}

impl From<String> for DependencyRef {
    fn from(id: String) -> Self {
        Self::Named(id)
    }
}

/// Resolved constructor arguments, in declaration order.
pub struct Arguments<'a> {
    bean: &'a str,
    values: &'a [Bean],
}

impl<'a> Arguments<'a> {
    #[inline]
    pub(crate) fn new(bean: &'a str, values: &'a [Bean]) -> Self {
        Self { bean, values }
    }

    /// Take the argument at `index` as an `Arc<T>`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        let value = self.values.get(index).ok_or_else(|| {
            format!(
                "constructor of '{}' has no argument at position {index}",
                self.bean
            )
        })?;

        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| ContainerError::type_mismatch::<T>(self.bean).into())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type ConstructFn = Arc<dyn Fn(&Arguments<'_>) -> Result<Bean, BoxError> + Send + Sync>;
type SupplyFn = Arc<dyn Fn() -> Result<Bean, BoxError> + Send + Sync>;
type SetterFn = Arc<dyn Fn(&Bean, Bean) -> Result<(), BoxError> + Send + Sync>;
type HookFn = Arc<dyn Fn(&Bean) -> Result<(), BoxError> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct ConstructorSpec {
    pub(crate) dependencies: Vec<DependencyRef>,
    pub(crate) call: ConstructFn,
}

#[derive(Clone)]
pub(crate) struct SetterSpec {
    pub(crate) name: String,
    pub(crate) dependency: DependencyRef,
    pub(crate) apply: SetterFn,
}

#[derive(Clone)]
pub(crate) struct HookSpec {
    pub(crate) name: String,
    pub(crate) call: HookFn,
}

/// Declarative recipe for building one bean.
///
/// Built with [`BeanDefinition::builder`]; immutable afterwards.
#[derive(Clone)]
pub struct BeanDefinition {
    type_id: TypeId,
    type_name: &'static str,
    default_id: String,
    injection: InjectionMode,
    scope: BeanScope,
    pub(crate) zero_arg: Option<SupplyFn>,
    pub(crate) constructor: Option<ConstructorSpec>,
    pub(crate) setters: Vec<SetterSpec>,
    pub(crate) init: Option<HookSpec>,
    pub(crate) destroy: Option<HookSpec>,
}

impl BeanDefinition {
    /// Start a definition for beans of type `T`
    ///
    /// ```rust
    /// use bean_container::{BeanDefinition, BeanScope, InjectionMode};
    ///
    /// #[derive(Default)]
    /// struct Clock;
    ///
    /// let definition = BeanDefinition::builder::<Clock>()
    ///     .default_constructor()
    ///     .prototype()
    ///     .build();
    ///
    /// assert_eq!(definition.scope(), BeanScope::Prototype);
    /// assert_eq!(definition.injection(), InjectionMode::Constructor);
    /// assert_eq!(definition.default_id(), "clock");
    /// ```
    #[inline]
    pub fn builder<T: Injectable>() -> BeanDefinitionBuilder<T> {
        BeanDefinitionBuilder::new()
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The id derived from the target type, see [`bean_name_of`]
    #[inline]
    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    #[inline]
    pub fn injection(&self) -> InjectionMode {
        self.injection
    }

    #[inline]
    pub fn scope(&self) -> BeanScope {
        self.scope
    }

    pub fn init_hook_name(&self) -> Option<&str> {
        self.init.as_ref().map(|hook| hook.name.as_str())
    }

    pub fn destroy_hook_name(&self) -> Option<&str> {
        self.destroy.as_ref().map(|hook| hook.name.as_str())
    }

    /// Constructor parameters, in position order
    pub fn constructor_dependencies(&self) -> &[DependencyRef] {
        self.constructor
            .as_ref()
            .map(|ctor| ctor.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Setter names and their dependencies, in injection order
    pub fn setter_dependencies(&self) -> impl Iterator<Item = (&str, &DependencyRef)> {
        self.setters
            .iter()
            .map(|setter| (setter.name.as_str(), &setter.dependency))
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("type_name", &self.type_name)
            .field("injection", &self.injection)
            .field("scope", &self.scope)
            .field("constructor", &self.constructor_dependencies())
            .field(
                "setters",
                &self.setters.iter().map(|s| &s.name).collect::<Vec<_>>(),
            )
            .field("init", &self.init_hook_name())
            .field("destroy", &self.destroy_hook_name())
            .finish()
    }
}

/// Typed builder for [`BeanDefinition`]
pub struct BeanDefinitionBuilder<T> {
    injection: InjectionMode,
    scope: BeanScope,
    zero_arg: Option<SupplyFn>,
    constructor: Option<ConstructorSpec>,
    setters: Vec<SetterSpec>,
    init: Option<HookSpec>,
    destroy: Option<HookSpec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> BeanDefinitionBuilder<T> {
    fn new() -> Self {
        Self {
            injection: InjectionMode::default(),
            scope: BeanScope::default(),
            zero_arg: None,
            constructor: None,
            setters: Vec::new(),
            init: None,
            destroy: None,
            _marker: PhantomData,
        }
    }

    pub fn injection(mut self, mode: InjectionMode) -> Self {
        self.injection = mode;
        self
    }

    pub fn constructor_injection(self) -> Self {
        self.injection(InjectionMode::Constructor)
    }

    pub fn setter_injection(self) -> Self {
        self.injection(InjectionMode::Setter)
    }

    pub fn scope(mut self, scope: BeanScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn singleton(self) -> Self {
        self.scope(BeanScope::Singleton)
    }

    pub fn prototype(self) -> Self {
        self.scope(BeanScope::Prototype)
    }

    /// Use `T::default()` as the zero-argument constructor
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.zero_arg(T::default)
    }

    /// Set the zero-argument constructor
    pub fn zero_arg<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.zero_arg = Some(Arc::new(move || -> Result<Bean, BoxError> {
            Ok(Arc::new(factory()) as Bean)
        }));
        self
    }

    /// Set the explicit constructor and its parameters.
    ///
    /// Each dependency is resolved in order and handed to `factory` through
    /// [`Arguments`]. Only used in [`InjectionMode::Constructor`].
    pub fn constructor<I, F>(mut self, dependencies: I, factory: F) -> Self
    where
        I: IntoIterator<Item = DependencyRef>,
        F: Fn(&Arguments<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructor = Some(ConstructorSpec {
            dependencies: dependencies.into_iter().collect(),
            call: Arc::new(move |args: &Arguments<'_>| -> Result<Bean, BoxError> {
                Ok(Arc::new(factory(args)?) as Bean)
            }),
        });
        self
    }

    /// Add a setter that receives the bean behind `dependency`.
    ///
    /// The bean may already be shared as an early reference when its setters
    /// run, so `apply` only gets `&T` and the target field needs interior
    /// mutability.
    pub fn setter<D, F>(self, name: impl Into<String>, dependency: DependencyRef, apply: F) -> Self
    where
        D: Injectable,
        F: Fn(&T, Arc<D>) + Send + Sync + 'static,
    {
        self.try_setter(name, dependency, move |bean: &T, dep: Arc<D>| {
            apply(bean, dep);
            Ok(())
        })
    }

    /// Fallible variant of [`setter`](Self::setter)
    pub fn try_setter<D, F>(
        mut self,
        name: impl Into<String>,
        dependency: DependencyRef,
        apply: F,
    ) -> Self
    where
        D: Injectable,
        F: Fn(&T, Arc<D>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let bean_name = name.clone();
        self.setters.push(SetterSpec {
            name,
            dependency,
            apply: Arc::new(move |bean: &Bean, dep: Bean| -> Result<(), BoxError> {
                let target = downcast_target::<T>(bean)?;
                let dep = dep.downcast::<D>().map_err(|_| {
                    format!(
                        "setter `{bean_name}` expects {}",
                        std::any::type_name::<D>()
                    )
                })?;
                apply(target, dep)
            }),
        });
        self
    }

    /// Hook run after all injection, before the bean is handed out
    pub fn init<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.init = Some(HookSpec {
            name: name.into(),
            call: wrap_hook(hook),
        });
        self
    }

    /// Hook run by `destroy_singletons`. Never run for prototypes.
    pub fn destroy<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.destroy = Some(HookSpec {
            name: name.into(),
            call: wrap_hook(hook),
        });
        self
    }

    pub fn build(self) -> BeanDefinition {
        BeanDefinition {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            default_id: bean_name_of::<T>(),
            injection: self.injection,
            scope: self.scope,
            zero_arg: self.zero_arg,
            constructor: self.constructor,
            setters: self.setters,
            init: self.init,
            destroy: self.destroy,
        }
    }
}

fn wrap_hook<T, F>(hook: F) -> HookFn
where
    T: Injectable,
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(move |bean: &Bean| -> Result<(), BoxError> {
        hook(downcast_target::<T>(bean)?)
    })
}

fn downcast_target<T: Injectable>(bean: &Bean) -> Result<&T, BoxError> {
    bean.downcast_ref::<T>().ok_or_else(|| {
        format!("bean is not a {}", std::any::type_name::<T>()).into()
    })
}
