//! Init and destroy hooks for container-owned beans

use crate::cache::SingletonCache;
use crate::definition::{Bean, BeanDefinition};
use crate::error::InjectionStage;
use crate::registry::DefinitionRegistry;
use crate::{ContainerError, Result};

#[cfg(feature = "logging")]
use tracing::debug;

/// Run the init hook, if any. Called once injection has finished.
///
/// When a setter cycle was broken through an early reference, the peer bean
/// already holds this instance before its init hook runs.
pub(crate) fn initialize(id: &str, definition: &BeanDefinition, bean: &Bean) -> Result<()> {
    let Some(hook) = &definition.init else {
        return Ok(());
    };

    #[cfg(feature = "logging")]
    debug!(
        target: "bean_container",
        bean = id,
        hook = hook.name.as_str(),
        "Invoking init hook"
    );

    (hook.call)(bean)
        .map_err(|source| ContainerError::injection(id, InjectionStage::InitHook(hook.name.clone()), source))
}

/// Destroy completed singletons in registration order.
///
/// Each singleton leaves the completed tier before its hook runs, so a hook
/// never runs twice. Stops at the first failing hook; singletons after it
/// stay cached and are handled by the next call.
pub(crate) fn destroy_singletons(
    registry: &DefinitionRegistry,
    cache: &SingletonCache,
) -> Result<usize> {
    let mut destroyed = 0;

    for (id, definition) in registry.snapshot() {
        if !definition.scope().is_singleton() {
            continue;
        }
        let Some(bean) = cache.take_completed(&id) else {
            continue;
        };
        destroyed += 1;

        let Some(hook) = &definition.destroy else {
            continue;
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "bean_container",
            bean = id.as_str(),
            hook = hook.name.as_str(),
            "Invoking destroy hook"
        );

        (hook.call)(&bean).map_err(|source| ContainerError::HookInvocation {
            id: id.clone(),
            hook: hook.name.clone(),
            source,
        })?;
    }

    Ok(destroyed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Pool {
        closed: AtomicU32,
    }

    fn pool_definition(fail: bool) -> BeanDefinition {
        BeanDefinition::builder::<Pool>()
            .default_constructor()
            .destroy("close", move |pool: &Pool| {
                pool.closed.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err("close failed".into())
                } else {
                    Ok(())
                }
            })
            .build()
    }

    #[test]
    fn test_initialize_without_hook() {
        let definition = BeanDefinition::builder::<Pool>().build();
        let bean: Bean = Arc::new(Pool::default());
        assert!(initialize("pool", &definition, &bean).is_ok());
    }

    #[test]
    fn test_initialize_wraps_failure() {
        let definition = BeanDefinition::builder::<Pool>()
            .init("open", |_: &Pool| Err("no connection".into()))
            .build();
        let bean: Bean = Arc::new(Pool::default());

        let err = initialize("pool", &definition, &bean).unwrap_err();
        match err {
            ContainerError::InjectionFailure { id, stage, source } => {
                assert_eq!(id, "pool");
                assert_eq!(stage, InjectionStage::InitHook("open".into()));
                assert_eq!(source.to_string(), "no connection");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_destroy_stops_at_first_failure() {
        let registry = DefinitionRegistry::new();
        let cache = SingletonCache::with_capacity(0);
        registry.register("first".into(), pool_definition(true)).unwrap();
        registry.register("second".into(), pool_definition(false)).unwrap();

        let first = Arc::new(Pool::default());
        let second = Arc::new(Pool::default());
        cache.complete("first", first.clone());
        cache.complete("second", second.clone());

        let err = destroy_singletons(&registry, &cache).unwrap_err();
        assert!(matches!(err, ContainerError::HookInvocation { ref hook, .. } if hook == "close"));
        assert_eq!(first.closed.load(Ordering::SeqCst), 1);
        assert_eq!(second.closed.load(Ordering::SeqCst), 0);

        // The next call picks up where the failed one stopped
        assert_eq!(destroy_singletons(&registry, &cache).unwrap(), 1);
        assert_eq!(first.closed.load(Ordering::SeqCst), 1);
        assert_eq!(second.closed.load(Ordering::SeqCst), 1);
    }
}
