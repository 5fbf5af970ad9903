//! Example wrapping a service in logging and transaction advices
//!
//! ```bash
//! cargo run --example aop
//! ```

use bean_container::{
    Advice, AdviceChain, BoxError, Invocation, Outcome, Proxy, ProxyError, ProxyFactory,
};
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
enum ServiceError {
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

trait MyService: Send + Sync {
    fn perform_task(&self, task: &str) -> Result<String, ServiceError>;
}

struct MyServiceImpl;

impl MyService for MyServiceImpl {
    fn perform_task(&self, task: &str) -> Result<String, ServiceError> {
        println!("    [Target] performing {task}");
        if task.is_empty() {
            return Err(ServiceError::Rejected("Test Exception".into()));
        }
        Ok(format!("{task} done"))
    }
}

impl MyService for Proxy<dyn MyService> {
    fn perform_task(&self, task: &str) -> Result<String, ServiceError> {
        self.invoke("perform_task", &[&task], || self.target().perform_task(task))
    }
}

struct LoggerAdvice;

impl Advice for LoggerAdvice {
    fn before(&self, invocation: &Invocation<'_>) {
        println!("  [Logger] before {}{:?}", invocation.method(), invocation.args());
    }

    fn after(&self, invocation: &Invocation<'_>, _result: &(dyn Any + Send)) {
        println!("  [Logger] after {}", invocation.method());
    }

    fn after_throwing(&self, invocation: &Invocation<'_>, error: &BoxError) {
        println!("  [Logger] {} failed: {error}", invocation.method());
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

struct TransactionAdvice;

impl Advice for TransactionAdvice {
    fn around(&self, invocation: &Invocation<'_>, chain: &mut AdviceChain<'_>) -> Outcome {
        println!("   [Tx] begin");
        let outcome = chain.proceed(invocation);
        if outcome.is_ok() {
            println!("   [Tx] commit");
        } else {
            println!("   [Tx] rollback");
        }
        outcome
    }
}

fn main() {
    println!("=== Advice Chain Demo ===\n");

    let target: Arc<dyn MyService> = Arc::new(MyServiceImpl);
    let service = ProxyFactory::new(target)
        .advice(LoggerAdvice)
        .advice(TransactionAdvice)
        .build();

    match service.perform_task("report") {
        Ok(result) => println!("\n  [App] result: {result}\n"),
        Err(error) => println!("\n  [App] error: {error}\n"),
    }

    match service.perform_task("") {
        Ok(result) => println!("\n  [App] result: {result}"),
        Err(error) => println!("\n  [App] error: {error}"),
    }

    println!("\n=== Demo Complete ===");
}
