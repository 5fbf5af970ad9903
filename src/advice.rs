//! Advices: behavior wrapped around calls on a proxied target

use crate::chain::AdviceChain;
use crate::error::BoxError;
use std::any::Any;
use std::fmt;

#[cfg(feature = "logging")]
use tracing::{info, warn};

/// Type-erased return value travelling through an advice chain
pub type Value = Box<dyn Any + Send>;

/// Result of one step of an advice chain
pub type Outcome = Result<Value, BoxError>;

/// The call being intercepted
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    target_type: &'static str,
    method: &'static str,
    args: &'a [&'a dyn fmt::Debug],
}

impl<'a> Invocation<'a> {
    #[inline]
    pub fn new(target_type: &'static str, method: &'static str, args: &'a [&'a dyn fmt::Debug]) -> Self {
        Self {
            target_type,
            method,
            args,
        }
    }

    /// Type name of the proxied target
    #[inline]
    pub fn target_type(&self) -> &'static str {
        self.target_type
    }

    #[inline]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Call arguments, for inspection only
    #[inline]
    pub fn args(&self) -> &'a [&'a dyn fmt::Debug] {
        self.args
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("target_type", &self.target_type)
            .field("method", &self.method)
            .field("args", &self.args)
            .finish()
    }
}

/// A cross-cutting behavior attached to a proxy.
///
/// The chain only ever calls [`around`](Advice::around). The other three
/// hooks run only when an advice's own `around` calls them.
pub trait Advice: Send + Sync {
    fn before(&self, _invocation: &Invocation<'_>) {}

    fn after(&self, _invocation: &Invocation<'_>, _result: &(dyn Any + Send)) {}

    fn after_throwing(&self, _invocation: &Invocation<'_>, _error: &BoxError) {}

    /// Wrap the rest of the chain. Call `chain.proceed(invocation)` to continue,
    /// or return without it to short-circuit. Proceeds unchanged by default.
    fn around(&self, invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>) -> Outcome {
        chain.proceed(invocation)
    }
}

/// Advice built from a closure acting as `around`
pub struct FnAdvice<F> {
    around: F,
}

/// Build an advice from an `around` closure
///
/// ```rust
/// use bean_container::{advice_fn, AdviceChain, Invocation};
///
/// let timing = advice_fn(|invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>| {
///     let started = std::time::Instant::now();
///     let outcome = chain.proceed(invocation);
///     let _elapsed = started.elapsed();
///     outcome
/// });
/// # let _ = timing;
/// ```
pub fn advice_fn<F>(around: F) -> FnAdvice<F>
where
    F: Fn(&Invocation<'_>, &mut AdviceChain<'_>) -> Outcome + Send + Sync,
{
    FnAdvice { around }
}

impl<F> Advice for FnAdvice<F>
where
    F: Fn(&Invocation<'_>, &mut AdviceChain<'_>) -> Outcome + Send + Sync,
{
    fn around(&self, invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>) -> Outcome {
        (self.around)(invocation, chain)
    }
}

impl<F> fmt::Debug for FnAdvice<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAdvice").finish_non_exhaustive()
    }
}

/// Logs every call on the proxy through `tracing`.
///
/// Its `around` drives its own `before`, `after` and `after_throwing` hooks.
#[cfg(feature = "logging")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAdvice;

#[cfg(feature = "logging")]
impl Advice for LoggingAdvice {
    fn before(&self, invocation: &Invocation<'_>) {
        info!(
            target: "bean_container::advice",
            target_type = invocation.target_type(),
            method = invocation.method(),
            args = ?invocation.args(),
            "Before call"
        );
    }

    fn after(&self, invocation: &Invocation<'_>, _result: &(dyn Any + Send)) {
        info!(
            target: "bean_container::advice",
            target_type = invocation.target_type(),
            method = invocation.method(),
            "After call"
        );
    }

    fn after_throwing(&self, invocation: &Invocation<'_>, error: &BoxError) {
        warn!(
            target: "bean_container::advice",
            target_type = invocation.target_type(),
            method = invocation.method(),
            error = %error,
            "Call failed"
        );
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
