#![no_main]

//! Fuzz target for registration, resolution and teardown
//!
//! Builds random graphs of setter and constructor references, including
//! cycles, and checks that the singleton cache never leaks construction
//! state.

use arbitrary::Arbitrary;
use bean_container::{BeanDefinition, Container, ContainerError, DependencyRef};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::OnceCell;
use std::sync::Arc;

const SLOTS: u8 = 6;

#[derive(Default)]
struct Node {
    peer: OnceCell<Arc<Node>>,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Wiring {
    Plain,
    Setter(u8),
    Constructor(u8),
    ConstructorWithSetter(u8, u8),
    FailingInit,
}

#[derive(Debug, Arbitrary)]
enum ContainerOp {
    Register { slot: u8, prototype: bool, wiring: Wiring },
    Get(u8),
    GetTwice(u8),
    Destroy,
}

fn id(slot: u8) -> String {
    format!("node{}", slot % SLOTS)
}

fn link(node: &Node, peer: Arc<Node>) {
    let _ = node.peer.set(peer);
}

fn definition(prototype: bool, wiring: Wiring) -> BeanDefinition {
    let builder = BeanDefinition::builder::<Node>();
    let builder = if prototype { builder.prototype() } else { builder };

    match wiring {
        Wiring::Plain => builder.default_constructor().build(),
        Wiring::Setter(target) => builder
            .setter_injection()
            .default_constructor()
            .setter("peer", DependencyRef::named(id(target)), link)
            .build(),
        Wiring::Constructor(target) => builder
            .constructor([DependencyRef::named(id(target))], |args| {
                let node = Node::default();
                let _ = node.peer.set(args.get(0)?);
                Ok(node)
            })
            .build(),
        Wiring::ConstructorWithSetter(ctor, setter) => builder
            .constructor([DependencyRef::named(id(ctor))], |args| {
                let node = Node::default();
                let _ = node.peer.set(args.get(0)?);
                Ok(node)
            })
            .setter("extra", DependencyRef::named(id(setter)), |_: &Node, _: Arc<Node>| {})
            .build(),
        Wiring::FailingInit => builder
            .default_constructor()
            .init("check", |_: &Node| Err("init refused".into()))
            .build(),
    }
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = Container::new();

    for op in ops {
        match op {
            ContainerOp::Register {
                slot,
                prototype,
                wiring,
            } => {
                let id = id(slot);
                let existed = container.contains(&id);
                let result = container.register(id, definition(prototype, wiring));
                assert_eq!(result.is_err(), existed);
            }
            ContainerOp::Get(slot) => {
                let id = id(slot);
                match container.get::<Node>(&id) {
                    Ok(_) => assert!(container.contains(&id)),
                    Err(ContainerError::NotFound { id: missing }) if missing == id => {
                        assert!(!container.contains(&id));
                    }
                    Err(_) => {}
                }
            }
            ContainerOp::GetTwice(slot) => {
                let id = id(slot);
                let first = container.get::<Node>(&id);
                let second = container.get::<Node>(&id);
                if let (Ok(first), Ok(second)) = (first, second) {
                    let singleton = container
                        .definition(&id)
                        .is_some_and(|definition| definition.scope().is_singleton());
                    assert_eq!(Arc::ptr_eq(&first, &second), singleton);
                }
            }
            ContainerOp::Destroy => {
                let _ = container.destroy_singletons();
                assert_eq!(container.cache_stats().completed, 0);
            }
        }

        let stats = container.cache_stats();
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.early, 0);
        assert_eq!(stats.factories, 0);
        assert!(stats.completed <= container.len());
    }
});
