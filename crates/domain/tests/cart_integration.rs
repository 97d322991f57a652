//! Integration tests for the cart engine.
//!
//! These tests drive the engine through the public API against both store
//! implementations and check the stock bounds, the decrement floor and
//! persistence across reloads.

use std::sync::{Arc, Mutex};

use common::{Money, ProductId};
use domain::{CartEngine, CartError, CartEvent, DomainError, Product};
use storage::{FileStore, InMemoryStore, KeyValueStore, keys};

fn product(id: &str, cents: i64, stock: u32) -> Product {
    Product::new(id, format!("Product {id}"), Money::from_cents(cents), stock).unwrap()
}

/// Deterministic pseudo-random sequence for operation fuzzing.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u32) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) % u64::from(bound)) as u32
    }
}

fn assert_same_cart<S: KeyValueStore + Clone>(engine: &CartEngine<S>) {
    let reloaded = CartEngine::load(engine.store().clone()).unwrap();
    assert_eq!(reloaded.cart(), engine.cart());
}

mod stock_bounds {
    use super::*;

    #[test]
    fn add_stops_at_stock_ceiling() {
        let mut engine = CartEngine::load(InMemoryStore::new()).unwrap();
        let a = product("A", 5000, 3);

        for _ in 0..3 {
            assert!(engine.add_item(&a).unwrap());
        }
        let result = engine.add_item(&a);

        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::StockLimitReached {
                stock_ceiling: 3,
                ..
            }))
        ));
        assert_eq!(engine.cart().get(&"A".into()).unwrap().quantity, 3);
        assert_eq!(engine.compute_subtotal(), Money::from_cents(15000));
    }

    #[test]
    fn random_sequences_stay_within_bounds() {
        let ceiling = 4;
        let id: ProductId = "A".into();
        let a = product("A", 1250, ceiling);
        let mut rng = Lcg(7);
        let mut engine = CartEngine::load(InMemoryStore::new()).unwrap();

        for _ in 0..500 {
            let before = engine.cart().get(&id).map(|line| line.quantity);
            let outcome = match rng.next(3) {
                0 => engine.add_item(&a).map(|_| ()),
                1 => engine
                    .set_quantity(&id, rng.next(ceiling + 3), ceiling)
                    .map(|_| ()),
                _ => engine.decrement_quantity(&id).map(|_| ()),
            };

            let after = engine.cart().get(&id).map(|line| line.quantity);
            if outcome.is_err() {
                assert_eq!(before, after);
            }
            if let Some(quantity) = after {
                assert!((1..=ceiling).contains(&quantity), "quantity {quantity}");
            }
        }
    }

    #[test]
    fn out_of_stock_product_never_enters() {
        let store = InMemoryStore::new();
        let mut engine = CartEngine::load(store.clone()).unwrap();

        let result = engine.add_item(&product("A", 5000, 0));

        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::OutOfStock { .. }))
        ));
        assert!(!store.contains_key(keys::CART));
    }
}

mod quantity_adjustments {
    use super::*;

    #[test]
    fn decrement_never_removes() {
        let mut engine = CartEngine::load(InMemoryStore::new()).unwrap();
        let id: ProductId = "A".into();
        engine.add_item(&product("A", 5000, 3)).unwrap();
        engine.set_quantity(&id, 3, 3).unwrap();

        for _ in 0..10 {
            engine.decrement_quantity(&id).unwrap();
        }

        assert_eq!(engine.cart().get(&id).unwrap().quantity, 1);
    }

    #[test]
    fn removing_absent_item_is_noop() {
        let store = InMemoryStore::new();
        let mut engine = CartEngine::load(store.clone()).unwrap();
        engine.add_item(&product("A", 5000, 3)).unwrap();
        let writes = store.write_count();

        assert!(!engine.remove_item(&"Z".into()).unwrap());
        assert_eq!(store.write_count(), writes);
        assert_eq!(engine.cart().len(), 1);
    }

    #[test]
    fn remove_then_clear() {
        let mut engine = CartEngine::load(InMemoryStore::new()).unwrap();
        engine.add_item(&product("A", 5000, 3)).unwrap();
        engine.add_item(&product("B", 700, 3)).unwrap();

        assert!(engine.remove_item(&"A".into()).unwrap());
        assert_eq!(engine.cart().len(), 1);

        engine.clear().unwrap();
        assert!(engine.cart().is_empty());
        assert_eq!(engine.compute_subtotal(), Money::zero());
    }

    #[test]
    fn stale_item_survives_zero_stock() {
        let mut engine = CartEngine::load(InMemoryStore::new()).unwrap();
        let id: ProductId = "A".into();
        engine.add_item(&product("A", 5000, 3)).unwrap();
        engine.add_item(&product("A", 5000, 3)).unwrap();

        assert!(engine.refresh_stock(&id, 0).unwrap());

        let line = engine.cart().get(&id).unwrap();
        assert!(line.is_out_of_stock());
        assert_eq!(line.quantity, 2);
        assert!(engine.decrement_quantity(&id).is_err());
        assert!(engine.remove_item(&id).unwrap());
    }
}

mod persistence {
    use super::*;

    #[test]
    fn every_mutation_round_trips_in_memory() {
        let mut engine = CartEngine::load(InMemoryStore::new()).unwrap();
        let id: ProductId = "A".into();

        engine.add_item(&product("A", 5000, 5)).unwrap();
        assert_same_cart(&engine);
        engine.add_item(&product("B", 333, 2)).unwrap();
        assert_same_cart(&engine);
        engine.set_quantity(&id, 4, 5).unwrap();
        assert_same_cart(&engine);
        engine.decrement_quantity(&id).unwrap();
        assert_same_cart(&engine);
        engine.refresh_stock(&id, 2).unwrap();
        assert_same_cart(&engine);
        engine.remove_item(&"B".into()).unwrap();
        assert_same_cart(&engine);
        engine.clear().unwrap();
        assert_same_cart(&engine);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let mut engine = CartEngine::load(FileStore::open(&path).unwrap()).unwrap();
            engine.add_item(&product("A", 5000, 3)).unwrap();
            engine.add_item(&product("A", 5000, 3)).unwrap();
            engine.add_item(&product("B", 1999, 1)).unwrap();
        }

        let engine = CartEngine::load(FileStore::open(&path).unwrap()).unwrap();
        assert_eq!(engine.cart().total_quantity(), 3);
        assert_eq!(engine.compute_subtotal(), Money::from_cents(11999));
    }

    #[test]
    fn reads_cart_written_by_the_storefront() {
        let store = InMemoryStore::new();
        store
            .set(
                keys::CART,
                r#"[{"id":3,"nome":"Caneca","preco":29.9,"quantidade":2,"quantidadeEstoque":5}]"#,
            )
            .unwrap();

        let engine = CartEngine::load(store).unwrap();
        assert_eq!(engine.compute_subtotal(), Money::from_cents(5980));
    }

    #[test]
    fn cart_with_zero_quantity_or_duplicate_lines_loads_empty() {
        let stored = [
            r#"[{"id":"A","nome":"A","preco":10,"quantidade":0,"quantidadeEstoque":3}]"#,
            r#"[{"id":"B","nome":"B","preco":10,"quantidade":1,"quantidadeEstoque":2},
                {"id":"B","nome":"B","preco":10,"quantidade":1,"quantidadeEstoque":2}]"#,
        ];

        for raw in stored {
            let store = InMemoryStore::new();
            store.set(keys::CART, raw).unwrap();

            let mut engine = CartEngine::load(store.clone()).unwrap();
            assert!(engine.cart().is_empty(), "accepted {raw}");

            // The next mutation replaces the unreadable cart.
            engine.add_item(&product("C", 500, 1)).unwrap();
            assert_same_cart(&engine);
        }
    }

    #[test]
    fn stored_quantity_above_ceiling_is_lowered_on_load() {
        let store = InMemoryStore::new();
        store
            .set(
                keys::CART,
                r#"[{"id":"A","nome":"A","preco":10,"quantidade":9,"quantidadeEstoque":2},
                    {"id":"B","nome":"B","preco":10,"quantidade":3,"quantidadeEstoque":0}]"#,
            )
            .unwrap();

        let mut engine = CartEngine::load(store).unwrap();
        let a = engine.cart().get(&"A".into()).unwrap();
        assert_eq!((a.quantity, a.stock_ceiling), (2, 2));

        let b = engine.cart().get(&"B".into()).unwrap();
        assert!(b.is_out_of_stock());
        assert_eq!(b.quantity, 3);

        assert!(matches!(
            engine.add_item(&product("A", 1000, 2)),
            Err(DomainError::Cart(CartError::StockLimitReached { .. }))
        ));
        assert_eq!(engine.compute_subtotal(), Money::from_cents(5000));
    }
}

mod observers {
    use super::*;

    #[test]
    fn observers_run_after_persist() {
        let store = InMemoryStore::new();
        let mut engine = CartEngine::load(store.clone()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let probe = store.clone();
        engine.subscribe(Arc::new(move |event: &CartEvent| {
            let persisted = probe.get(keys::CART).unwrap().unwrap_or_default();
            sink.lock().unwrap().push((event.clone(), persisted));
        }));

        engine.add_item(&product("A", 5000, 3)).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0].0, CartEvent::ItemAdded(_)));
        assert!(seen[0].1.contains("\"quantidade\":1"));
    }
}
