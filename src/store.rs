//! Canonical owner of cart line items and the cached discount state. Every
//! mutation is written through the storage adapter before it returns; reads
//! hand out cloned snapshots so nothing outside this module can touch the
//! line-item array directly.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CartLineItem, DiscountState};
use crate::storage::{CartStorage, StorageSlot};
use crate::validation::{CartItemIssue, ReconcileAction, reconcile_action};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedCart {
    #[serde(default)]
    items: Vec<CartLineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discount_code: Option<String>,
    #[serde(default)]
    discount_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct CartState {
    items: Vec<CartLineItem>,
    discount: Option<DiscountState>,
}

pub struct PersistedCartStore {
    storage: Arc<dyn CartStorage>,
    inner: Mutex<CartState>,
}

impl PersistedCartStore {
    /// Rehydrates from the cart slot if a parseable record exists, else
    /// starts empty. Corrupt storage is logged and treated as empty.
    pub fn new(storage: Arc<dyn CartStorage>) -> Self {
        let state = match storage.load(StorageSlot::Cart) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedCart>(&raw) {
                Ok(record) => CartState {
                    discount: record.discount_code.map(|code| DiscountState {
                        code,
                        amount: record.discount_amount,
                    }),
                    items: record.items,
                },
                Err(err) => {
                    tracing::warn!(error = %err, "corrupt cart record, starting empty");
                    CartState::default()
                }
            },
            Ok(None) => CartState::default(),
            Err(err) => {
                tracing::warn!(error = %err, "cart storage unreadable, starting empty");
                CartState::default()
            }
        };

        Self {
            storage,
            inner: Mutex::new(state),
        }
    }

    /// Adds `item.quantity` units of the item. A line with the same
    /// `(product_id, variant_id)` absorbs the quantity instead of
    /// duplicating.
    pub fn add_item(&self, item: CartLineItem) {
        let mut state = self.inner.lock().unwrap();
        match state
            .items
            .iter_mut()
            .find(|line| line.key() == item.key())
        {
            Some(line) => line.quantity += item.quantity.max(1),
            None => {
                let mut item = item;
                item.quantity = item.quantity.max(1);
                state.items.push(item);
            }
        }
        self.persist(&state);
    }

    /// Sets the line's quantity, clamped to a minimum of 1. Never removes
    /// the line; a no-op if no line matches.
    pub fn update_quantity(&self, product_id: &str, quantity: u32, variant_id: Option<&str>) {
        let mut state = self.inner.lock().unwrap();
        let Some(line) = state
            .items
            .iter_mut()
            .find(|line| line.key() == (product_id, variant_id))
        else {
            return;
        };
        line.quantity = quantity.max(1);
        self.persist(&state);
    }

    /// Removes the matching line; a no-op if absent.
    pub fn remove_item(&self, product_id: &str, variant_id: Option<&str>) {
        let mut state = self.inner.lock().unwrap();
        let before = state.items.len();
        state
            .items
            .retain(|line| line.key() != (product_id, variant_id));
        if state.items.len() != before {
            self.persist(&state);
        }
    }

    pub fn apply_discount_code(&self, code: &str, amount: i64) {
        let mut state = self.inner.lock().unwrap();
        state.discount = Some(DiscountState {
            code: code.to_string(),
            amount,
        });
        self.persist(&state);
    }

    pub fn remove_discount_code(&self) {
        let mut state = self.inner.lock().unwrap();
        if state.discount.take().is_some() {
            self.persist(&state);
        }
    }

    /// Replaces the whole line set, e.g. after merging in a backup.
    pub fn replace_items(&self, items: Vec<CartLineItem>) {
        let mut state = self.inner.lock().unwrap();
        state.items = items;
        self.persist(&state);
    }

    /// Applies the authority's per-line verdicts: unavailable lines go,
    /// under-stocked lines get clamped. Returns whether anything changed.
    pub fn apply_reconciliation(&self, issues: &[CartItemIssue]) -> bool {
        if issues.is_empty() {
            return false;
        }
        let mut state = self.inner.lock().unwrap();
        let mut changed = false;
        for issue in issues {
            let key = (issue.product_id.as_str(), issue.variant_id.as_deref());
            match reconcile_action(issue) {
                ReconcileAction::Remove => {
                    let before = state.items.len();
                    state.items.retain(|line| line.key() != key);
                    if state.items.len() != before {
                        tracing::warn!(product_id = %issue.product_id, code = ?issue.code, "removed unavailable line");
                        changed = true;
                    }
                }
                ReconcileAction::ClampQuantity(available) => {
                    if let Some(line) = state.items.iter_mut().find(|line| line.key() == key)
                        && line.quantity > available
                    {
                        tracing::warn!(product_id = %issue.product_id, from = line.quantity, to = available, "clamped line to available stock");
                        line.quantity = available;
                        changed = true;
                    }
                }
            }
        }
        if changed {
            self.persist(&state);
        }
        changed
    }

    pub fn clear(&self) {
        let mut state = self.inner.lock().unwrap();
        state.items.clear();
        state.discount = None;
        self.persist(&state);
    }

    pub fn items(&self) -> Vec<CartLineItem> {
        self.inner.lock().unwrap().items.clone()
    }

    pub fn discount(&self) -> Option<DiscountState> {
        self.inner.lock().unwrap().discount.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().items.is_empty()
    }

    /// Local fallback figure, used only until the authority's evaluation
    /// arrives.
    pub fn subtotal(&self) -> i64 {
        self.inner
            .lock()
            .unwrap()
            .items
            .iter()
            .map(CartLineItem::line_total)
            .sum()
    }

    fn persist(&self, state: &CartState) {
        let record = PersistedCart {
            items: state.items.clone(),
            discount_code: state.discount.as_ref().map(|d| d.code.clone()),
            discount_amount: state.discount.as_ref().map(|d| d.amount).unwrap_or(0),
            updated_at: Some(Utc::now()),
        };
        let payload = match serde_json::to_string(&record) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize cart");
                return;
            }
        };
        if let Err(err) = self.storage.save(StorageSlot::Cart, &payload) {
            tracing::warn!(error = %err, "failed to persist cart");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::validation::{CartItemIssue, CartItemIssueCode};
    use std::collections::HashSet;

    fn line(product_id: &str, variant_id: Option<&str>, price: i64, quantity: u32) -> CartLineItem {
        CartLineItem {
            product_id: product_id.into(),
            variant_id: variant_id.map(Into::into),
            name: format!("Product {product_id}"),
            variant_label: None,
            image: None,
            price,
            quantity,
            attached_gift: None,
        }
    }

    fn store() -> PersistedCartStore {
        PersistedCartStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn adding_same_product_merges_into_one_line() {
        let store = store();
        store.add_item(line("A", None, 1000, 1));
        assert_eq!(store.subtotal(), 1000);

        store.add_item(line("A", None, 1000, 2));
        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(store.subtotal(), 3000);
    }

    #[test]
    fn variants_are_distinct_lines() {
        let store = store();
        store.add_item(line("A", None, 1000, 1));
        store.add_item(line("A", Some("red"), 1000, 1));
        assert_eq!(store.items().len(), 2);
    }

    #[test]
    fn no_sequence_of_mutations_duplicates_a_key() {
        let store = store();
        store.add_item(line("A", None, 100, 1));
        store.add_item(line("B", Some("v1"), 200, 2));
        store.add_item(line("A", None, 100, 1));
        store.update_quantity("B", 5, Some("v1"));
        store.remove_item("A", None);
        store.add_item(line("A", None, 100, 3));
        store.add_item(line("B", Some("v1"), 200, 1));

        let keys: Vec<_> = store
            .items()
            .iter()
            .map(|l| (l.product_id.clone(), l.variant_id.clone()))
            .collect();
        let unique: HashSet<_> = keys.iter().cloned().collect();
        assert_eq!(keys.len(), unique.len());
    }

    #[test]
    fn update_quantity_clamps_to_one_and_never_removes() {
        let store = store();
        store.add_item(line("A", None, 1000, 3));
        store.update_quantity("A", 0, None);

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1);
    }

    #[test]
    fn update_and_remove_are_noops_for_absent_lines() {
        let store = store();
        store.add_item(line("A", None, 1000, 1));
        store.update_quantity("missing", 5, None);
        store.remove_item("missing", None);
        store.remove_item("A", Some("not-this-variant"));
        assert_eq!(store.items().len(), 1);
    }

    #[test]
    fn discount_code_apply_and_remove() {
        let store = store();
        store.apply_discount_code("SAVE10", 500);
        let discount = store.discount().unwrap();
        assert_eq!(discount.code, "SAVE10");
        assert_eq!(discount.amount, 500);

        store.remove_discount_code();
        assert!(store.discount().is_none());
    }

    #[test]
    fn clear_resets_items_and_discount_together() {
        let store = store();
        store.add_item(line("A", None, 1000, 1));
        store.apply_discount_code("SAVE10", 500);
        store.clear();
        assert!(store.is_empty());
        assert!(store.discount().is_none());
        assert_eq!(store.subtotal(), 0);
    }

    #[test]
    fn state_survives_a_restart_on_the_same_storage() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let store = PersistedCartStore::new(storage.clone());
            store.add_item(line("A", Some("blue"), 1500, 2));
            store.apply_discount_code("WELCOME", 300);
        }

        let revived = PersistedCartStore::new(storage);
        let items = revived.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].variant_id.as_deref(), Some("blue"));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(revived.discount().unwrap().code, "WELCOME");
    }

    #[test]
    fn corrupt_storage_rehydrates_as_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(StorageSlot::Cart, "{not json").unwrap();

        let store = PersistedCartStore::new(storage);
        assert!(store.is_empty());
        assert!(store.discount().is_none());
    }

    #[test]
    fn reconciliation_clamps_insufficient_stock() {
        let store = store();
        store.add_item(line("A", None, 1000, 5));

        let changed = store.apply_reconciliation(&[CartItemIssue {
            product_id: "A".into(),
            variant_id: None,
            code: CartItemIssueCode::InsufficientStock,
            available_quantity: Some(2),
        }]);

        assert!(changed);
        let items = store.items();
        assert_eq!(items.len(), 1, "clamped line must not be removed");
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn reconciliation_removes_unavailable_lines() {
        let store = store();
        store.add_item(line("gone", None, 1000, 1));
        store.add_item(line("kept", None, 500, 1));

        let changed = store.apply_reconciliation(&[CartItemIssue {
            product_id: "gone".into(),
            variant_id: None,
            code: CartItemIssueCode::OutOfStock,
            available_quantity: None,
        }]);

        assert!(changed);
        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "kept");
    }

    #[test]
    fn reconciliation_for_unknown_lines_changes_nothing() {
        let store = store();
        store.add_item(line("A", None, 1000, 1));

        let changed = store.apply_reconciliation(&[CartItemIssue {
            product_id: "other".into(),
            variant_id: None,
            code: CartItemIssueCode::ProductNotFound,
            available_quantity: None,
        }]);

        assert!(!changed);
        assert_eq!(store.items().len(), 1);
    }
}
