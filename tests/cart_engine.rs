//! Cart engine contract: merge-by-id, aggregates with lenient price
//! coercion, removal semantics, event delivery, and storage degradation.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use garage_api::cart::storage::{MemoryStorage, StoragePort};
use garage_api::cart::{CartStore, CartSummary};
use garage_api::models::Product;

fn product(price: f64) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: "Plaquettes de frein".to_string(),
        description: None,
        price,
        image_url: None,
        category: Some("Freinage".to_string()),
        stock: 10,
        available: true,
        created_at: Utc::now(),
    }
}

fn store() -> (CartStore, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    (CartStore::new(storage.clone(), "cart"), storage)
}

fn recorder(cart: &CartStore) -> (garage_api::cart::Subscription, Arc<Mutex<Vec<CartSummary>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let sub = cart.subscribe(move |summary| sink.lock().unwrap().push(summary.clone()));
    (sub, seen)
}

#[test]
fn adding_same_product_merges_by_id() {
    let (cart, _) = store();
    let p = product(10.0);

    cart.add(&p, 3);
    cart.add(&p, 4);

    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 7);
    assert_eq!(cart.total_items(), 7);
}

#[test]
fn aggregates_match_line_sums() {
    let (cart, _) = store();
    let a = product(19.99);
    let b = product(5.50);

    cart.add(&a, 2);
    cart.add(&b, 3);

    assert_eq!(cart.total_items(), 5);
    let expected = 19.99 * 2.0 + 5.50 * 3.0;
    assert!((cart.total() - expected).abs() < 1e-9);

    let summary = cart.summary();
    assert_eq!(summary.item_count, 5);
    assert!((summary.total - expected).abs() < 1e-9);
}

#[test]
fn string_price_in_slot_still_counts() {
    // An out-of-band writer left legacy string prices in the blob; reads
    // coerce them instead of zeroing or failing.
    let (cart, storage) = store();
    let blob = r#"[
        {"productId":"7f9c3f34-6f9e-4a52-9eb5-7c3f4a5d0001","name":"a","unitPrice":"12.50","quantity":1,
         "addedAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"},
        {"productId":"7f9c3f34-6f9e-4a52-9eb5-7c3f4a5d0002","name":"b","unitPrice":"3,10","quantity":2,
         "addedAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"},
        {"productId":"7f9c3f34-6f9e-4a52-9eb5-7c3f4a5d0003","name":"c","unitPrice":"garbage","quantity":4,
         "addedAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}
    ]"#;
    storage.set("cart", blob).unwrap();

    assert_eq!(cart.total_items(), 7);
    // 12.50 + 2 * 3.10; the uncoercible price contributes 0.
    assert!((cart.total() - 18.70).abs() < 1e-9);
}

#[test]
fn merged_quantities_saturate_instead_of_wrapping() {
    let (cart, _) = store();
    let p = product(1.0);

    cart.add(&p, 3_000_000_000);
    cart.add(&p, 3_000_000_000);

    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, u32::MAX);
    assert_eq!(cart.total_items(), u32::MAX as u64);
    assert!((cart.total() - u32::MAX as f64).abs() < 1e-9);
}

#[test]
fn zero_or_negative_quantity_removes_line() {
    let (cart, _) = store();
    let a = product(4.0);
    let b = product(6.0);
    cart.add(&a, 2);
    cart.add(&b, 2);

    cart.set_quantity(a.id, 0);
    assert!(cart.items().iter().all(|l| l.product_id != a.id));

    cart.set_quantity(b.id, -1);
    assert!(cart.items().is_empty());
}

#[test]
fn clear_zeroes_everything() {
    let (cart, _) = store();
    cart.add(&product(9.99), 5);

    cart.clear();

    assert!(cart.items().is_empty());
    assert_eq!(cart.total_items(), 0);
    assert_eq!(cart.total(), 0.0);
}

#[test]
fn slot_round_trip_is_lossless() {
    let (cart, _) = store();
    let p = product(12.34);
    cart.add(&p, 2);

    let written = cart.items();
    // A second engine over the same slot reads back the identical lines.
    let (reread, _) = {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set("cart", &serde_json::to_string(&written).unwrap())
            .unwrap();
        (CartStore::new(storage.clone(), "cart"), storage)
    };
    assert_eq!(reread.items(), written);
}

#[test]
fn add_update_remove_scenario() {
    let (cart, _) = store();
    let p = product(19.99);

    cart.add(&p, 2);
    assert_eq!(cart.total_items(), 2);
    assert!((cart.total() - 39.98).abs() < 1e-9);

    cart.add(&p, 1);
    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
    assert!((cart.total() - 59.97).abs() < 1e-9);

    cart.remove(p.id);
    assert!(cart.items().is_empty());
    assert_eq!(cart.total(), 0.0);
}

#[test]
fn listener_gets_exactly_one_matching_snapshot_per_mutation() {
    let (cart, _) = store();
    let (_sub, seen) = recorder(&cart);
    let p = product(10.0);

    cart.add(&p, 2);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].item_count, 2);
    assert!((seen[0].total - 20.0).abs() < 1e-9);
    // The payload agrees with a direct re-query.
    assert_eq!(seen[0], cart.summary());
}

#[test]
fn notifications_follow_mutation_order() {
    let (cart, _) = store();
    let (_sub, seen) = recorder(&cart);
    let p = product(5.0);

    cart.add(&p, 1);
    cart.add(&p, 1);
    cart.set_quantity(p.id, 10);
    cart.remove(p.id);

    let counts: Vec<u64> = seen.lock().unwrap().iter().map(|s| s.item_count).collect();
    assert_eq!(counts, vec![1, 2, 10, 0]);
}

#[test]
fn dropping_subscription_detaches_listener() {
    let (cart, _) = store();
    let (sub, seen) = recorder(&cart);
    let p = product(5.0);

    cart.add(&p, 1);
    drop(sub);
    cart.add(&p, 1);

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn full_slot_drops_write_silently_without_event() {
    let storage = Arc::new(MemoryStorage::with_quota(16));
    let cart = CartStore::new(storage, "cart");
    let (_sub, seen) = recorder(&cart);

    cart.add(&product(10.0), 1);

    // The write did not fit: no event, and reads still see an empty cart.
    assert!(seen.lock().unwrap().is_empty());
    assert!(cart.items().is_empty());
    assert_eq!(cart.total_items(), 0);
}

#[test]
fn corrupted_slot_reads_as_empty() {
    let (cart, storage) = store();
    storage.set("cart", "{not json").unwrap();

    assert!(cart.items().is_empty());
    assert_eq!(cart.summary(), CartSummary::zero());
}

#[test]
fn reconcile_emits_only_on_out_of_band_change() {
    let (cart, storage) = store();
    cart.add(&product(10.0), 1);
    let (_sub, seen) = recorder(&cart);

    // Nothing changed out-of-band: quiet.
    cart.reconcile();
    assert!(seen.lock().unwrap().is_empty());

    // Another writer replaced the slot behind the engine's back.
    let mut items = cart.items();
    items[0].quantity = 4;
    storage
        .set("cart", &serde_json::to_string(&items).unwrap())
        .unwrap();

    cart.reconcile();
    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].item_count, 4);
    }

    // A second sweep over the same content stays quiet.
    cart.reconcile();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn reconcile_listener_can_reread_during_emission() {
    let storage = Arc::new(MemoryStorage::new());
    let cart = Arc::new(CartStore::new(storage.clone(), "cart"));
    cart.add(&product(5.0), 1);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let reader = cart.clone();
    let _sub = cart.subscribe(move |summary| {
        // A re-read from inside the notification agrees with the payload.
        assert_eq!(reader.summary(), *summary);
        sink.lock().unwrap().push(summary.clone());
    });

    let mut items = cart.items();
    items[0].quantity = 3;
    storage
        .set("cart", &serde_json::to_string(&items).unwrap())
        .unwrap();

    cart.reconcile();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].item_count, 3);
}
