//! Session-scoped shopping cart engine: line-item storage behind an
//! injected [`StoragePort`], aggregate computations, and an explicit
//! observer bus that notifies subscribers synchronously after every
//! mutation. A low-frequency [`CartStore::reconcile`] sweep catches
//! out-of-band writes to the same slot.

pub mod storage;

use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Product, lenient_price};
use self::storage::StoragePort;

/// One product entry in the session cart. Display metadata is copied at
/// add-time and never re-synced to later catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Price snapshot. Reads are lenient: a slot written out-of-band may
    /// carry a legacy string price ("12.50", "12,50"); anything
    /// uncoercible reads as 0 rather than failing the whole cart.
    #[serde(deserialize_with = "lenient_price")]
    pub unit_price: f64,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate snapshot carried by every change notification.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartSummary {
    pub item_count: u64,
    pub total: f64,
}

impl CartSummary {
    pub fn zero() -> Self {
        Self {
            item_count: 0,
            total: 0.0,
        }
    }
}

type Listener = Arc<dyn Fn(&CartSummary) + Send + Sync>;

struct Registry {
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

/// Detach token returned by [`CartStore::subscribe`]; dropping it removes
/// the listener.
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(|e| e.into_inner());
            registry.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Single source of truth for one session's cart. All operations are
/// synchronous against the storage slot; a per-store mutation lock makes
/// each read-modify-write atomic within the session. Storage failures
/// degrade: reads fall back to an empty cart, failed writes are dropped
/// (logged, no notification) instead of surfacing an error.
pub struct CartStore {
    storage: Arc<dyn StoragePort>,
    slot_key: String,
    mutation: Mutex<()>,
    registry: Arc<Mutex<Registry>>,
    last_emitted: Mutex<CartSummary>,
}

impl CartStore {
    pub fn new(storage: Arc<dyn StoragePort>, slot_key: impl Into<String>) -> Self {
        let store = Self {
            storage,
            slot_key: slot_key.into(),
            mutation: Mutex::new(()),
            registry: Arc::new(Mutex::new(Registry {
                listeners: Vec::new(),
                next_id: 0,
            })),
            last_emitted: Mutex::new(CartSummary::zero()),
        };
        // Baseline for reconcile() so a pre-existing slot does not look
        // like an out-of-band change on the first sweep.
        let baseline = store.summary();
        *store.last_emitted.lock().unwrap_or_else(|e| e.into_inner()) = baseline;
        store
    }

    /// Current cart contents. An absent, corrupted, or unreadable slot
    /// reads as empty; this never fails.
    pub fn items(&self) -> Vec<CartLineItem> {
        let raw = match self.storage.get(&self.slot_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(slot = %self.slot_key, error = %err, "cart slot unreadable; treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(slot = %self.slot_key, error = %err, "cart slot corrupted; treating as empty");
                Vec::new()
            }
        }
    }

    /// Adds `quantity` of the product, merging into an existing line by
    /// product id instead of duplicating it. A zero quantity is a no-op
    /// (callers reject it as a validation error before reaching here);
    /// merged quantities saturate at `u32::MAX` instead of wrapping.
    pub fn add(&self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.mutate(|items| {
            let now = Utc::now();
            match items.iter_mut().find(|l| l.product_id == product.id) {
                Some(line) => {
                    line.quantity = line.quantity.saturating_add(quantity);
                    line.updated_at = now;
                }
                None => items.push(CartLineItem {
                    product_id: product.id,
                    name: product.name.clone(),
                    image_url: product.image_url.clone(),
                    category: product.category.clone(),
                    unit_price: product.price,
                    quantity,
                    added_at: now,
                    updated_at: now,
                }),
            }
        });
    }

    /// Sets a line's quantity; zero or below removes the line. An absent
    /// product id leaves the cart unchanged but still persists and
    /// notifies.
    pub fn set_quantity(&self, product_id: Uuid, quantity: i64) {
        self.mutate(|items| {
            if quantity <= 0 {
                items.retain(|l| l.product_id != product_id);
            } else if let Some(line) = items.iter_mut().find(|l| l.product_id == product_id) {
                line.quantity = quantity.min(u32::MAX as i64) as u32;
                line.updated_at = Utc::now();
            }
        });
    }

    /// Removes the line unconditionally; removing an absent id is a no-op
    /// that still persists and notifies.
    pub fn remove(&self, product_id: Uuid) {
        self.mutate(|items| items.retain(|l| l.product_id != product_id));
    }

    pub fn clear(&self) {
        self.mutate(|items| items.clear());
    }

    pub fn total_items(&self) -> u64 {
        self.items().iter().map(|l| l.quantity as u64).sum()
    }

    /// Cart total. Each price is defensively re-checked so a poisoned
    /// entry contributes 0 instead of corrupting the sum; the result is
    /// finite and non-negative by construction.
    pub fn total(&self) -> f64 {
        self.items()
            .iter()
            .map(|l| {
                let price = if l.unit_price.is_finite() && l.unit_price > 0.0 {
                    l.unit_price
                } else {
                    0.0
                };
                price * l.quantity as f64
            })
            .sum()
    }

    /// Item count and total in one read, the payload shape notifications
    /// carry.
    pub fn summary(&self) -> CartSummary {
        let items = self.items();
        let item_count = items.iter().map(|l| l.quantity as u64).sum();
        let total = items
            .iter()
            .map(|l| {
                let price = if l.unit_price.is_finite() && l.unit_price > 0.0 {
                    l.unit_price
                } else {
                    0.0
                };
                price * l.quantity as f64
            })
            .sum();
        CartSummary { item_count, total }
    }

    /// Attaches a change listener. Listeners run synchronously on the
    /// mutating thread, in subscription order, exactly once per applied
    /// mutation, after the persisting write; the payload equals what
    /// `total_items()`/`total()` would return at that instant.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartSummary) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    /// Best-effort catch-up for writes that bypassed this store (another
    /// process sharing the slot): re-reads the slot and notifies only when
    /// the summary differs from the last one emitted. Driven by the
    /// maintenance sweep at the configured interval; not real-time.
    pub fn reconcile(&self) {
        // The guard stays held through the notification so an interleaved
        // mutation cannot deliver a newer snapshot ahead of this one.
        // Listener re-reads go straight to the storage port and take no
        // lock held here.
        let _guard = self.mutation.lock().unwrap_or_else(|e| e.into_inner());
        let summary = self.summary();
        {
            let mut last = self.last_emitted.lock().unwrap_or_else(|e| e.into_inner());
            if *last == summary {
                return;
            }
            *last = summary.clone();
        }
        self.notify(&summary);
    }

    /// Read-modify-write under the mutation lock. The lock is released
    /// before listeners run so they may re-read the store.
    fn mutate<F>(&self, apply: F)
    where
        F: FnOnce(&mut Vec<CartLineItem>),
    {
        let summary = {
            let _guard = self.mutation.lock().unwrap_or_else(|e| e.into_inner());
            let mut items = self.items();
            apply(&mut items);
            if !self.persist(&items) {
                // Dropped write: no state change took effect, so no event.
                return;
            }
            let summary = self.summary();
            *self.last_emitted.lock().unwrap_or_else(|e| e.into_inner()) = summary.clone();
            summary
        };
        self.notify(&summary);
    }

    fn persist(&self, items: &[CartLineItem]) -> bool {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(slot = %self.slot_key, error = %err, "cart serialization failed; dropping write");
                return false;
            }
        };
        match self.storage.set(&self.slot_key, &raw) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(slot = %self.slot_key, error = %err, "cart write failed; dropping write");
                false
            }
        }
    }

    fn notify(&self, summary: &CartSummary) {
        // Snapshot under the lock, invoke outside it: a listener may
        // subscribe or unsubscribe re-entrantly.
        let listeners: Vec<Listener> = {
            let registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            registry
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };
        for listener in listeners {
            listener(summary);
        }
    }
}
