//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use bean_container::{BeanDefinition, Container, DependencyRef};
use once_cell::sync::OnceCell;
use std::sync::Arc;

#[derive(Default)]
struct Inventory {
    orders: OnceCell<Arc<Orders>>,
}

#[derive(Default)]
struct Orders {
    inventory: OnceCell<Arc<Inventory>>,
}

#[allow(dead_code)]
struct Checkout {
    orders: Arc<Orders>,
}

fn main() {
    // JSON if logging-json is enabled, the default formatter otherwise
    bean_container::logging::builder().trace().container_only().init();

    println!("=== Bean Container Logging Demo ===\n");

    // logs: "Creating new bean container"
    let container = Container::new();

    // logs: "Registering bean definition"
    container
        .register(
            "inventory",
            BeanDefinition::builder::<Inventory>()
                .setter_injection()
                .default_constructor()
                .setter("orders", DependencyRef::named("orders"), |i: &Inventory, o: Arc<Orders>| {
                    let _ = i.orders.set(o);
                })
                .init("warmUp", |_: &Inventory| {
                    println!("  [App] Inventory warmed up");
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    container
        .register(
            "orders",
            BeanDefinition::builder::<Orders>()
                .setter_injection()
                .default_constructor()
                .setter("inventory", DependencyRef::of::<Inventory>(), |o: &Orders, i: Arc<Inventory>| {
                    let _ = o.inventory.set(i);
                })
                .build(),
        )
        .unwrap();
    container
        .register(
            "checkout",
            BeanDefinition::builder::<Checkout>()
                .prototype()
                .constructor([DependencyRef::named("orders")], |args| {
                    Ok(Checkout { orders: args.get(0)? })
                })
                .destroy("close", |_: &Checkout| Ok(()))
                .build(),
        )
        .unwrap();

    // Setter cycle: logs "Creating bean", "Early reference hit", "Bean created"
    let inventory = container.get::<Inventory>("inventory").unwrap();
    let _orders = container.get::<Orders>("orders").unwrap();
    assert!(inventory.orders.get().is_some());

    // Prototype: built fresh each time and never cached
    let _first = container.get::<Checkout>("checkout").unwrap();
    let _second = container.get::<Checkout>("checkout").unwrap();

    // Unknown id fails without touching the cache
    let missing = container.get_bean("payments");
    assert!(missing.is_err());

    // logs: "Destroying singletons"
    let destroyed = container.destroy_singletons().unwrap();
    println!("\n  [App] destroyed {destroyed} singletons");

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (human-readable output)");
}
