//! Proxies that route calls on a target through an advice chain
//!
//! A proxy stands in for its target: the service trait is implemented for
//! `Proxy<dyn Trait>` by forwarding every method through [`Proxy::invoke`].
//!
//! ```rust
//! use bean_container::{advice_fn, AdviceChain, Invocation, ProxyError, ProxyFactory, Proxy};
//! use std::sync::Arc;
//!
//! #[derive(Debug, thiserror::Error)]
//! enum GreetError {
//!     #[error(transparent)]
//!     Proxy(#[from] ProxyError),
//! }
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self, name: &str) -> Result<String, GreetError>;
//! }
//!
//! struct Plain;
//!
//! impl Greeter for Plain {
//!     fn greet(&self, name: &str) -> Result<String, GreetError> {
//!         Ok(format!("hello {name}"))
//!     }
//! }
//!
//! impl Greeter for Proxy<dyn Greeter> {
//!     fn greet(&self, name: &str) -> Result<String, GreetError> {
//!         self.invoke("greet", &[&name], || self.target().greet(name))
//!     }
//! }
//!
//! let target: Arc<dyn Greeter> = Arc::new(Plain);
//! let proxy = ProxyFactory::new(target)
//!     .advice(advice_fn(|invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>| {
//!         chain.proceed(invocation)
//!     }))
//!     .build();
//!
//! assert_eq!(proxy.greet("bean").unwrap(), "hello bean");
//! ```

use crate::advice::{Advice, Invocation, Outcome, Value};
use crate::chain::AdviceChain;
use crate::error::{BoxError, ProxyError};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// A target wrapped with an ordered list of advices.
///
/// The first advice added is the outermost one.
pub struct Proxy<T: ?Sized> {
    target: Arc<T>,
    advices: Arc<[Arc<dyn Advice>]>,
}

impl<T: ?Sized> Clone for Proxy<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            advices: Arc::clone(&self.advices),
        }
    }
}

impl<T: ?Sized> Proxy<T> {
    /// The wrapped target
    #[inline]
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    #[inline]
    pub fn advices(&self) -> &[Arc<dyn Advice>] {
        &self.advices
    }

    /// Run `call` through a fresh advice chain.
    ///
    /// `call` is the real method on the target. The value and error it
    /// returns reach the caller unchanged. Errors raised by the advices
    /// themselves are surfaced as [`ProxyError::Advice`] unless they already
    /// are of type `E`.
    pub fn invoke<R, E, F>(&self, method: &'static str, args: &[&dyn fmt::Debug], call: F) -> Result<R, E>
    where
        R: Send + 'static,
        E: Error + Send + Sync + 'static + From<ProxyError>,
        F: FnOnce() -> Result<R, E>,
    {
        let invocation = Invocation::new(std::any::type_name::<T>(), method, args);
        let terminal = move || -> Outcome {
            match call() {
                Ok(value) => Ok(Box::new(value) as Value),
                Err(error) => Err(Box::new(error) as BoxError),
            }
        };

        let mut chain = AdviceChain::new(&self.advices, Box::new(terminal));
        match chain.proceed(&invocation) {
            Ok(value) => value
                .downcast::<R>()
                .map(|value| *value)
                .map_err(|_| E::from(ProxyError::ReturnTypeMismatch { method })),
            Err(error) => Err(recover_error::<E>(method, error)),
        }
    }
}

fn recover_error<E>(method: &'static str, error: BoxError) -> E
where
    E: Error + Send + Sync + 'static + From<ProxyError>,
{
    match error.downcast::<E>() {
        Ok(error) => *error,
        Err(error) => match error.downcast::<ProxyError>() {
            Ok(proxy_error) => E::from(*proxy_error),
            Err(source) => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "bean_container::advice",
                    method,
                    error = %source,
                    "Advice raised a foreign error"
                );
                E::from(ProxyError::Advice { method, source })
            }
        },
    }
}

impl<T: ?Sized> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("target", &std::any::type_name::<T>())
            .field("advices", &self.advices.len())
            .finish()
    }
}

/// Builds a [`Proxy`] one advice at a time
pub struct ProxyFactory<T: ?Sized> {
    target: Arc<T>,
    advices: Vec<Arc<dyn Advice>>,
}

impl<T: ?Sized> ProxyFactory<T> {
    pub fn new(target: Arc<T>) -> Self {
        Self {
            target,
            advices: Vec::new(),
        }
    }

    /// Append an advice. Advices run in the order they are added.
    pub fn advice(self, advice: impl Advice + 'static) -> Self {
        self.advice_arc(Arc::new(advice))
    }

    /// Append an advice that is shared with other proxies
    pub fn advice_arc(mut self, advice: Arc<dyn Advice>) -> Self {
        self.advices.push(advice);
        self
    }

    pub fn build(self) -> Proxy<T> {
        create_proxy(self.target, self.advices)
    }
}

/// Wrap `target` with `advices`, outermost first
pub fn create_proxy<T: ?Sized>(target: Arc<T>, advices: Vec<Arc<dyn Advice>>) -> Proxy<T> {
    #[cfg(feature = "logging")]
    debug!(
        target: "bean_container::advice",
        target_type = std::any::type_name::<T>(),
        advices = advices.len(),
        "Creating proxy"
    );

    Proxy {
        target,
        advices: advices.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::advice_fn;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum ServiceError {
        #[error("{0}")]
        Failed(String),
        #[error(transparent)]
        Proxy(#[from] ProxyError),
    }

    trait MyService: Send + Sync {
        fn process(&self, input: &str) -> Result<String, ServiceError>;
        fn fail(&self) -> Result<(), ServiceError>;
    }

    struct Target {
        log: Arc<Mutex<Vec<String>>>,
        calls: AtomicU32,
    }

    impl MyService for Target {
        fn process(&self, input: &str) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().push("target".to_string());
            Ok(input.to_uppercase())
        }

        fn fail(&self) -> Result<(), ServiceError> {
            self.log.lock().push("target".to_string());
            Err(ServiceError::Failed("Test Exception".to_string()))
        }
    }

    impl MyService for Proxy<dyn MyService> {
        fn process(&self, input: &str) -> Result<String, ServiceError> {
            self.invoke("process", &[&input], || self.target().process(input))
        }

        fn fail(&self) -> Result<(), ServiceError> {
            self.invoke("fail", &[], || self.target().fail())
        }
    }

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Advice for Recording {
        fn before(&self, _: &Invocation<'_>) {
            self.log.lock().push(format!("{}:before", self.name));
        }

        fn after(&self, _: &Invocation<'_>, _: &(dyn std::any::Any + Send)) {
            self.log.lock().push(format!("{}:after", self.name));
        }

        fn after_throwing(&self, _: &Invocation<'_>, _: &BoxError) {
            self.log.lock().push(format!("{}:throwing", self.name));
        }

        fn around(&self, invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>) -> Outcome {
            self.before(invocation);
            let outcome = chain.proceed(invocation);
            match &outcome {
                Ok(value) => self.after(invocation, &**value),
                Err(error) => self.after_throwing(invocation, error),
            }
            outcome
        }
    }

    fn setup() -> (Arc<Target>, Proxy<dyn MyService>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::new(Target {
            log: Arc::clone(&log),
            calls: AtomicU32::new(0),
        });
        let service: Arc<dyn MyService> = target.clone();
        let proxy = ProxyFactory::new(service)
            .advice(Recording {
                name: "logger",
                log: Arc::clone(&log),
            })
            .advice(Recording {
                name: "tx",
                log: Arc::clone(&log),
            })
            .build();
        (target, proxy, log)
    }

    #[test]
    fn test_advices_wrap_target_in_order() {
        let (_, proxy, log) = setup();

        assert_eq!(proxy.process("abc").unwrap(), "ABC");
        assert_eq!(
            *log.lock(),
            vec!["logger:before", "tx:before", "target", "tx:after", "logger:after"]
        );
    }

    #[test]
    fn test_target_error_keeps_identity() {
        let (_, proxy, log) = setup();

        let err = proxy.fail().unwrap_err();
        assert!(matches!(err, ServiceError::Failed(ref msg) if msg == "Test Exception"));
        assert_eq!(
            *log.lock(),
            vec![
                "logger:before",
                "tx:before",
                "target",
                "tx:throwing",
                "logger:throwing"
            ]
        );
    }

    #[test]
    fn test_each_call_gets_a_fresh_chain() {
        let (target, proxy, log) = setup();

        for _ in 0..3 {
            assert_eq!(proxy.process("x").unwrap(), "X");
        }
        assert_eq!(target.calls.load(Ordering::SeqCst), 3);
        assert_eq!(log.lock().len(), 15);
    }

    #[test]
    fn test_short_circuit_returns_advice_value() {
        let (target, _, _) = setup();
        let service: Arc<dyn MyService> = target.clone();
        let cache: Arc<dyn Advice> = Arc::new(advice_fn(
            |_: &Invocation<'_>, _: &mut AdviceChain<'_>| -> Outcome {
                Ok(Box::new(String::from("cached")))
            },
        ));
        let proxy = create_proxy(service, vec![cache]);

        assert_eq!(proxy.process("ignored").unwrap(), "cached");
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_short_circuit_with_wrong_type() {
        let (target, _, _) = setup();
        let service: Arc<dyn MyService> = target;
        let proxy = ProxyFactory::new(service)
            .advice(advice_fn(
                |_: &Invocation<'_>, _: &mut AdviceChain<'_>| -> Outcome { Ok(Box::new(42u64)) },
            ))
            .build();

        let err = proxy.process("x").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Proxy(ProxyError::ReturnTypeMismatch { method: "process" })
        ));
    }

    #[test]
    fn test_advice_error_is_wrapped() {
        let (target, _, _) = setup();
        let service: Arc<dyn MyService> = target;
        let proxy = ProxyFactory::new(service)
            .advice(advice_fn(
                |_: &Invocation<'_>, _: &mut AdviceChain<'_>| -> Outcome {
                    Err("permission denied".into())
                },
            ))
            .build();

        match proxy.process("x").unwrap_err() {
            ServiceError::Proxy(ProxyError::Advice { method, source }) => {
                assert_eq!(method, "process");
                assert_eq!(source.to_string(), "permission denied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_advice_sees_arguments() {
        let (target, _, _) = setup();
        let service: Arc<dyn MyService> = target;
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&seen);
        let proxy = ProxyFactory::new(service)
            .advice(advice_fn(move |invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>| {
                *sink.lock() = format!("{}{:?}", invocation.method(), invocation.args());
                chain.proceed(invocation)
            }))
            .build();

        proxy.process("abc").unwrap();
        assert_eq!(*seen.lock(), r#"process["abc"]"#);
        assert!(proxy.advices().len() == 1);
    }
}
