//! Cart merge and the auth-redirect safety net. The backup slot is
//! independent of the live cart record and must never be assumed to hold
//! the same value.

use std::sync::Arc;

use crate::models::CartLineItem;
use crate::storage::{CartStorage, StorageSlot};

/// Merges `incoming` into `existing` without mutating either: lines sharing
/// a `(product_id, variant_id)` key sum their quantities, new lines append
/// after the existing order. Merging an empty `incoming` returns `existing`
/// unchanged.
pub fn merge_cart_items(existing: &[CartLineItem], incoming: &[CartLineItem]) -> Vec<CartLineItem> {
    let mut merged: Vec<CartLineItem> = existing.to_vec();
    for line in incoming {
        match merged.iter_mut().find(|m| m.key() == line.key()) {
            Some(m) => m.quantity += line.quantity,
            None => merged.push(line.clone()),
        }
    }
    merged
}

pub struct CartBackup {
    storage: Arc<dyn CartStorage>,
}

impl CartBackup {
    pub fn new(storage: Arc<dyn CartStorage>) -> Self {
        Self { storage }
    }

    pub fn save(&self, items: &[CartLineItem]) {
        let payload = match serde_json::to_string(items) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize cart backup");
                return;
            }
        };
        if let Err(err) = self.storage.save(StorageSlot::Backup, &payload) {
            tracing::warn!(error = %err, "failed to save cart backup");
        }
    }

    /// Returns the saved snapshot, or `None` when there is nothing usable.
    pub fn restore(&self) -> Option<Vec<CartLineItem>> {
        let raw = match self.storage.load(StorageSlot::Backup) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %err, "cart backup unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Some(items),
            Err(err) => {
                tracing::warn!(error = %err, "corrupt cart backup, ignoring");
                None
            }
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(StorageSlot::Backup) {
            tracing::warn!(error = %err, "failed to clear cart backup");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn line(product_id: &str, variant_id: Option<&str>, quantity: u32) -> CartLineItem {
        CartLineItem {
            product_id: product_id.into(),
            variant_id: variant_id.map(Into::into),
            name: format!("Product {product_id}"),
            variant_label: None,
            image: None,
            price: 1000,
            quantity,
            attached_gift: None,
        }
    }

    #[test]
    fn merge_sums_quantities_for_shared_keys() {
        let existing = vec![line("A", None, 2), line("B", Some("v1"), 1)];
        let incoming = vec![line("B", Some("v1"), 3), line("C", None, 1)];

        let merged = merge_cart_items(&existing, &incoming);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].product_id, "A");
        assert_eq!(merged[1].product_id, "B");
        assert_eq!(merged[1].quantity, 4);
        assert_eq!(merged[2].product_id, "C");
    }

    #[test]
    fn merge_with_empty_incoming_is_identity() {
        let existing = vec![line("A", None, 2), line("B", None, 1)];
        let merged = merge_cart_items(&existing, &[]);
        assert_eq!(merged, existing);
    }

    #[test]
    fn merge_does_not_mutate_inputs() {
        let existing = vec![line("A", None, 2)];
        let incoming = vec![line("A", None, 5)];

        let merged = merge_cart_items(&existing, &incoming);
        assert_eq!(merged[0].quantity, 7);
        assert_eq!(existing[0].quantity, 2);
        assert_eq!(incoming[0].quantity, 5);
    }

    #[test]
    fn merge_distinguishes_variants_of_one_product() {
        let existing = vec![line("A", Some("red"), 1)];
        let incoming = vec![line("A", Some("blue"), 1), line("A", Some("red"), 1)];

        let merged = merge_cart_items(&existing, &incoming);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].quantity, 2);
    }

    #[test]
    fn backup_roundtrip_and_clear() {
        let backup = CartBackup::new(Arc::new(MemoryStorage::new()));
        assert!(backup.restore().is_none());

        let items = vec![line("A", None, 2)];
        backup.save(&items);
        assert_eq!(backup.restore().unwrap(), items);

        backup.clear();
        assert!(backup.restore().is_none());
    }

    #[test]
    fn corrupt_backup_restores_as_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(StorageSlot::Backup, "oops").unwrap();
        let backup = CartBackup::new(storage);
        assert!(backup.restore().is_none());
    }
}
