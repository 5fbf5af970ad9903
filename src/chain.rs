//! Per-call advice chain

use crate::advice::{Advice, Invocation, Outcome};
use crate::error::ProxyError;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

type Terminal<'a> = Box<dyn FnOnce() -> Outcome + 'a>;

/// Walks the advices of one proxy call, then the target.
///
/// A chain is built fresh for every call and never shared between calls.
/// Each advice sees the chain positioned just past itself, so calling
/// [`proceed`](AdviceChain::proceed) hands control to the next advice, and
/// after the last one to the target.
pub struct AdviceChain<'a> {
    advices: &'a [Arc<dyn Advice>],
    index: usize,
    terminal: Option<Terminal<'a>>,
}

impl<'a> AdviceChain<'a> {
    pub(crate) fn new(advices: &'a [Arc<dyn Advice>], terminal: Terminal<'a>) -> Self {
        Self {
            advices,
            index: 0,
            terminal: Some(terminal),
        }
    }

    /// Continue with the next advice, or call the target once every advice
    /// has been entered.
    ///
    /// The target runs at most once. Proceeding again after it ran returns
    /// [`ProxyError::ChainExhausted`].
    pub fn proceed(&mut self, invocation: &Invocation<'_>) -> Outcome {
        let advices = self.advices;
        if let Some(advice) = advices.get(self.index) {
            self.index += 1;

            #[cfg(feature = "logging")]
            trace!(
                target: "bean_container::advice",
                method = invocation.method(),
                position = self.index,
                "Entering advice"
            );

            return advice.around(invocation, self);
        }

        match self.terminal.take() {
            Some(target) => target(),
            None => Err(Box::new(ProxyError::ChainExhausted {
                method: invocation.method(),
            })),
        }
    }

    /// Number of advices already entered
    #[inline]
    pub fn position(&self) -> usize {
        self.index
    }

    /// Total number of advices in this chain
    #[inline]
    pub fn len(&self) -> usize {
        self.advices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.advices.is_empty()
    }

    /// Whether the target has already been called
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.terminal.is_none()
    }
}

impl fmt::Debug for AdviceChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceChain")
            .field("len", &self.advices.len())
            .field("position", &self.index)
            .field("exhausted", &self.terminal.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::advice_fn;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Arc<dyn Advice> {
        let log = Arc::clone(log);
        Arc::new(advice_fn(move |invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>| {
            log.lock().push(format!("{name}:before"));
            let outcome = chain.proceed(invocation);
            log.lock().push(format!("{name}:after"));
            outcome
        }))
    }

    #[test]
    fn test_advices_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let advices = vec![recorder(&log, "outer"), recorder(&log, "inner")];
        let invocation = Invocation::new("Svc", "run", &[]);

        let target_log = Arc::clone(&log);
        let mut chain = AdviceChain::new(
            &advices,
            Box::new(move || -> Outcome {
                target_log.lock().push("target".to_string());
                Ok(Box::new("done"))
            }),
        );

        let value = chain.proceed(&invocation).unwrap();
        assert_eq!(*value.downcast::<&str>().unwrap(), "done");
        assert_eq!(
            *log.lock(),
            vec!["outer:before", "inner:before", "target", "inner:after", "outer:after"]
        );
        assert!(chain.is_exhausted());
        assert_eq!(chain.position(), 2);
    }

    #[test]
    fn test_empty_chain_calls_target() {
        let advices: Vec<Arc<dyn Advice>> = Vec::new();
        let invocation = Invocation::new("Svc", "run", &[]);
        let mut chain = AdviceChain::new(&advices, Box::new(|| -> Outcome { Ok(Box::new(1i32)) }));

        assert!(chain.is_empty());
        assert_eq!(*chain.proceed(&invocation).unwrap().downcast::<i32>().unwrap(), 1);
    }

    #[test]
    fn test_second_terminal_call_is_exhausted() {
        let advices: Vec<Arc<dyn Advice>> = vec![Arc::new(advice_fn(
            |invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>| {
                let _ = chain.proceed(invocation)?;
                chain.proceed(invocation)
            },
        ))];
        let invocation = Invocation::new("Svc", "twice", &[]);
        let mut chain = AdviceChain::new(&advices, Box::new(|| -> Outcome { Ok(Box::new(())) }));

        let err = chain.proceed(&invocation).unwrap_err();
        let err = err.downcast::<ProxyError>().unwrap();
        assert!(matches!(*err, ProxyError::ChainExhausted { method: "twice" }));
    }

    #[test]
    fn test_short_circuit_skips_target() {
        let advices: Vec<Arc<dyn Advice>> = vec![Arc::new(advice_fn(
            |_: &Invocation<'_>, _: &mut AdviceChain<'_>| -> Outcome { Ok(Box::new(0u8)) },
        ))];
        let invocation = Invocation::new("Svc", "run", &[]);
        let mut chain = AdviceChain::new(
            &advices,
            Box::new(|| -> Outcome { panic!("target must not run") }),
        );

        assert_eq!(*chain.proceed(&invocation).unwrap().downcast::<u8>().unwrap(), 0);
        assert!(!chain.is_exhausted());
    }
}
