//! Session cart store
//!
//! Per-user mutable working set of prospective line items, held in
//! server-side session state. Every operation is a read-modify-write under
//! the per-user map entry guard, which is the session's serialization
//! point; concurrent requests from the same user serialize there.

use dashmap::DashMap;

use crate::error::{AppError, AppResult};
use crate::models::{CartItem, PendingCart};
use crate::util;

/// One user's session state: the live cart plus the checkout snapshot
#[derive(Debug, Default)]
struct CartSession {
    items: Vec<CartItem>,
    pending: Option<PendingCart>,
    /// Bumped on every cart mutation
    revision: u64,
}

/// In-memory session cart store keyed by user id
#[derive(Debug, Default)]
pub struct SessionCartStore {
    sessions: DashMap<String, CartSession>,
}

impl SessionCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item; merges with an existing line of identical
    /// service_id+options by incrementing quantity, else appends.
    pub fn add(&self, user_id: &str, item: CartItem) {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        if let Some(existing) = session
            .items
            .iter_mut()
            .find(|e| e.service_id == item.service_id && e.options == item.options)
        {
            existing.quantity += item.quantity;
        } else {
            session.items.push(item);
        }
        session.revision += 1;
    }

    /// Set the quantity of the item at `index`; quantity <= 0 removes it.
    pub fn set_quantity(&self, user_id: &str, index: usize, quantity: i64) -> AppResult<()> {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        if index >= session.items.len() {
            return Err(AppError::validation(format!("cart index {index} out of range")));
        }
        if quantity <= 0 {
            session.items.remove(index);
        } else {
            session.items[index].quantity = quantity;
        }
        session.revision += 1;
        Ok(())
    }

    pub fn remove(&self, user_id: &str, index: usize) -> AppResult<()> {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        if index >= session.items.len() {
            return Err(AppError::validation(format!("cart index {index} out of range")));
        }
        session.items.remove(index);
        session.revision += 1;
        Ok(())
    }

    pub fn clear(&self, user_id: &str) {
        if let Some(mut session) = self.sessions.get_mut(user_id) {
            session.items.clear();
            session.revision += 1;
        }
    }

    pub fn items(&self, user_id: &str) -> Vec<CartItem> {
        self.sessions
            .get(user_id)
            .map(|s| s.items.clone())
            .unwrap_or_default()
    }

    pub fn revision(&self, user_id: &str) -> u64 {
        self.sessions.get(user_id).map(|s| s.revision).unwrap_or(0)
    }

    /// Snapshot the cart into a PendingCart for checkout.
    ///
    /// The live cart stays in place so a failed order transaction leaves the
    /// user able to retry; both cart and snapshot are cleared together once
    /// the order commits ([`Self::consume`]).
    pub fn snapshot_for_checkout(&self, user_id: &str, token: &str) -> AppResult<PendingCart> {
        let mut session = self.sessions.entry(user_id.to_string()).or_default();
        if session.items.is_empty() {
            return Err(AppError::validation("cart is empty"));
        }
        let pending = PendingCart {
            items: session.items.clone(),
            token: token.to_string(),
            created_at: util::now_millis(),
        };
        session.pending = Some(pending.clone());
        Ok(pending)
    }

    pub fn pending(&self, user_id: &str) -> Option<PendingCart> {
        self.sessions.get(user_id).and_then(|s| s.pending.clone())
    }

    /// Clear both the live cart and the pending snapshot after the order
    /// has been committed.
    pub fn consume(&self, user_id: &str) {
        if let Some(mut session) = self.sessions.get_mut(user_id) {
            session.items.clear();
            session.pending = None;
            session.revision += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemKind, ItemOptions};

    fn item(service_id: &str, quantity: i64) -> CartItem {
        CartItem {
            service_id: service_id.into(),
            kind: ItemKind::Service,
            name: service_id.into(),
            unit_price: 5.0,
            quantity,
            options: ItemOptions::default(),
        }
    }

    #[test]
    fn add_merges_identical_lines() {
        let store = SessionCartStore::new();
        store.add("u1", item("svc-a", 1));
        store.add("u1", item("svc-a", 2));
        store.add("u1", item("svc-b", 1));

        let items = store.items("u1");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn differing_options_do_not_merge() {
        let store = SessionCartStore::new();
        let mut colored = item("svc-a", 1);
        colored.options.color = Some(true);
        store.add("u1", item("svc-a", 1));
        store.add("u1", colored);
        assert_eq!(store.items("u1").len(), 2);
    }

    #[test]
    fn set_quantity_zero_removes() {
        let store = SessionCartStore::new();
        store.add("u1", item("svc-a", 2));
        store.set_quantity("u1", 0, 0).unwrap();
        assert!(store.items("u1").is_empty());
    }

    #[test]
    fn stale_index_is_rejected() {
        let store = SessionCartStore::new();
        store.add("u1", item("svc-a", 1));
        assert!(store.set_quantity("u1", 5, 1).is_err());
        assert!(store.remove("u1", 1).is_err());
    }

    #[test]
    fn carts_are_scoped_per_user() {
        let store = SessionCartStore::new();
        store.add("u1", item("svc-a", 1));
        store.add("u2", item("svc-b", 4));
        assert_eq!(store.items("u1").len(), 1);
        assert_eq!(store.items("u2")[0].quantity, 4);
        store.clear("u1");
        assert!(store.items("u1").is_empty());
        assert_eq!(store.items("u2").len(), 1);
    }

    #[test]
    fn snapshot_keeps_live_cart_until_consumed() {
        let store = SessionCartStore::new();
        store.add("u1", item("svc-a", 2));

        let pending = store.snapshot_for_checkout("u1", "tok-1").unwrap();
        assert_eq!(pending.items.len(), 1);
        assert_eq!(pending.token, "tok-1");
        // Cart still live so a failed transaction can be retried
        assert_eq!(store.items("u1").len(), 1);
        assert!(store.pending("u1").is_some());

        store.consume("u1");
        assert!(store.items("u1").is_empty());
        assert!(store.pending("u1").is_none());
    }

    #[test]
    fn snapshot_of_empty_cart_fails() {
        let store = SessionCartStore::new();
        assert!(store.snapshot_for_checkout("u1", "tok").is_err());
    }

    #[test]
    fn revision_advances_on_mutation() {
        let store = SessionCartStore::new();
        assert_eq!(store.revision("u1"), 0);
        store.add("u1", item("svc-a", 1));
        store.set_quantity("u1", 0, 3).unwrap();
        assert_eq!(store.revision("u1"), 2);
    }
}
