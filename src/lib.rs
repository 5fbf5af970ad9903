//! # Bean Container - Named-Bean Dependency Injection for Rust
//!
//! A dependency injection container built around explicit bean definitions,
//! with circular-reference resolution for setter-injected singletons and
//! proxies that wrap calls in an ordered chain of advices.
//!
//! ## Features
//!
//! - **Named beans** - Definitions are registered under string ids and
//!   resolved by id or by type
//! - **Singleton and prototype scopes** - Singletons are built once and
//!   cached; prototypes are built fresh on every request
//! - **Circular references** - Setter-injected singletons are exposed early
//!   through a three-tier cache, so two singletons can reference each other
//! - **Lifecycle hooks** - Init hooks after injection, destroy hooks on
//!   shutdown
//! - **Advice chains** - Wrap any trait object in a proxy whose calls run
//!   through before/after/around advices
//! - **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use bean_container::{BeanDefinition, Container, DependencyRef};
//! use once_cell::sync::OnceCell;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Orders {
//!     billing: OnceCell<Arc<Billing>>,
//! }
//!
//! #[derive(Default)]
//! struct Billing {
//!     orders: OnceCell<Arc<Orders>>,
//! }
//!
//! let container = Container::new();
//! container
//!     .register(
//!         "orders",
//!         BeanDefinition::builder::<Orders>()
//!             .setter_injection()
//!             .default_constructor()
//!             .setter("billing", DependencyRef::named("billing"), |o: &Orders, b: Arc<Billing>| {
//!                 let _ = o.billing.set(b);
//!             })
//!             .build(),
//!     )
//!     .unwrap();
//! container
//!     .register(
//!         "billing",
//!         BeanDefinition::builder::<Billing>()
//!             .setter_injection()
//!             .default_constructor()
//!             .setter("orders", DependencyRef::named("orders"), |b: &Billing, o: Arc<Orders>| {
//!                 let _ = b.orders.set(o);
//!             })
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let orders = container.get::<Orders>("orders").unwrap();
//! let billing = container.get::<Billing>("billing").unwrap();
//! assert!(Arc::ptr_eq(orders.billing.get().unwrap(), &billing));
//! assert!(Arc::ptr_eq(billing.orders.get().unwrap(), &orders));
//! ```
//!
//! Beans that reference each other through `Arc` form a reference cycle and
//! are not freed when the container is dropped.
//!
//! ## Bean Scopes
//!
//! ```rust
//! use bean_container::{BeanDefinition, Container};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! static COUNTER: AtomicU64 = AtomicU64::new(0);
//!
//! struct RequestId(u64);
//!
//! let container = Container::new();
//! container
//!     .register(
//!         "requestId",
//!         BeanDefinition::builder::<RequestId>()
//!             .prototype()
//!             .zero_arg(|| RequestId(COUNTER.fetch_add(1, Ordering::SeqCst)))
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let first = container.get::<RequestId>("requestId").unwrap();
//! let second = container.get::<RequestId>("requestId").unwrap();
//! assert_ne!(first.0, second.0);
//! ```
//!
//! ## Advice
//!
//! See [`ProxyFactory`] for wrapping a trait object and [`Advice`] for the
//! hooks an advice can implement.

mod advice;
mod cache;
mod chain;
mod container;
mod definition;
mod error;
mod lifecycle;
#[cfg(feature = "logging")]
pub mod logging;
mod proxy;
mod reader;
mod registry;

pub use advice::*;
pub use cache::CacheStats;
pub use chain::*;
pub use container::*;
pub use definition::*;
pub use error::*;
pub use proxy::*;
pub use reader::*;
pub use registry::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Advice, AdviceChain, BeanDefinition, BeanScope, Container, ContainerError, DefinitionReader,
        DefinitionSet, DependencyRef, InjectionMode, Invocation, Outcome, Proxy, ProxyError,
        ProxyFactory, Result, advice_fn,
    };
    pub use std::sync::Arc;
}
