//! Cart synchronization store.
//!
//! [`CartStore`] is the single injectable owner of the shopper's cart. Every
//! view (navbar badge, sidebar, product grid, checkout summary) holds a clone
//! of the same store, reads through its selectors, and listens for
//! [`CartEvent`]s instead of re-reading storage on its own.
//!
//! Each mutation writes the full line list to durable storage under
//! [`keys::CART_ITEMS`] and then broadcasts the new distinct-line count.
//! Storage failures are logged and ignored: the in-memory cart keeps working
//! for the rest of the session. Separate stores over the same storage (two
//! open windows) are last-write-wins; [`CartStore::reload`] picks up the
//! latest persisted state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use campick_core::{AddOutcome, Cart, CartConflict, CartLineItem, MenuItemId, Price, RemoveOutcome, ShopId};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::storage::{self, Storage, keys};

/// Capacity of the change-notification channel.
///
/// Slow subscribers that fall further behind observe `RecvError::Lagged`
/// and should re-read the store's selectors.
const EVENT_CAPACITY: usize = 64;

/// Errors returned by cart mutations.
#[derive(Debug, Clone, Error)]
pub enum CartError {
    /// The item belongs to a different shop than the current cart.
    #[error(transparent)]
    CrossShop(#[from] CartConflict),
}

/// Change notification published by a [`CartStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// The cart changed; `count` is the new number of distinct lines.
    Updated { count: usize },
    /// An add was rejected because it would mix shops.
    Conflict(CartConflict),
    /// The cart sidebar was opened or closed.
    SidebarToggled { open: bool },
}

/// Shared, persistent cart state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn Storage>,
    cart: Mutex<Cart>,
    sidebar_open: Mutex<bool>,
    events: broadcast::Sender<CartEvent>,
}

impl CartStore {
    /// Create a store, loading any cart and sidebar flag already persisted.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let cart = load_cart(storage.as_ref());
        let sidebar_open =
            storage::read_json::<bool>(storage.as_ref(), keys::CART_SIDEBAR_STATE).unwrap_or(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                cart: Mutex::new(cart),
                sidebar_open: Mutex::new(sidebar_open),
                events,
            }),
        }
    }

    /// Subscribe to cart change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `item` to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CrossShop` if the cart holds items from another
    /// shop. The cart and storage are left untouched and a
    /// [`CartEvent::Conflict`] is broadcast.
    #[instrument(skip(self, item), fields(item_id = %item.item_id, shop_id = %item.shop_id))]
    pub fn add_item(&self, item: CartLineItem) -> Result<AddOutcome, CartError> {
        let mut cart = self.lock_cart();
        match cart.add(item) {
            Ok(outcome) => {
                self.commit(&cart);
                Ok(outcome)
            }
            Err(conflict) => {
                debug!(cart_shop = %conflict.cart_shop, "Rejected cross-shop add");
                self.publish(CartEvent::Conflict(conflict.clone()));
                Err(conflict.into())
            }
        }
    }

    /// Empty the cart and start a new one with `item`.
    ///
    /// This is the shopper's explicit answer to a cross-shop conflict.
    #[instrument(skip(self, item), fields(item_id = %item.item_id, shop_id = %item.shop_id))]
    pub fn replace_with(&self, item: CartLineItem) {
        let mut cart = self.lock_cart();
        cart.replace_with(item);
        self.commit(&cart);
    }

    /// Remove one unit of `item_id`, dropping the line when it reaches zero.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub fn remove_item(&self, item_id: &MenuItemId) -> RemoveOutcome {
        let mut cart = self.lock_cart();
        let outcome = cart.remove(item_id);
        if outcome != RemoveOutcome::Absent {
            self.commit(&cart);
        }
        outcome
    }

    /// Remove the lines of a placed order, keeping anything added since.
    #[instrument(skip(self, submitted), fields(lines = submitted.len()))]
    pub fn settle(&self, submitted: &[CartLineItem]) {
        let mut cart = self.lock_cart();
        if cart.settle(submitted) {
            self.commit(&cart);
        }
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub fn empty_cart(&self) {
        let mut cart = self.lock_cart();
        cart.clear();
        self.commit(&cart);
    }

    /// Re-read the persisted cart, replacing the in-memory copy.
    ///
    /// Announces the reloaded count so listeners converge.
    pub fn reload(&self) {
        let mut cart = self.lock_cart();
        *cart = load_cart(self.inner.storage.as_ref());
        self.publish(CartEvent::Updated { count: cart.count() });
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lock_cart().total()
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock_cart().count()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn units(&self) -> u32 {
        self.lock_cart().units()
    }

    /// Quantity of `item_id` in the cart, or 0.
    #[must_use]
    pub fn quantity_of(&self, item_id: &MenuItemId) -> u32 {
        self.lock_cart().quantity_of(item_id)
    }

    /// Snapshot of the cart's lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.lock_cart().lines().to_vec()
    }

    /// Snapshot of the whole cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock_cart().clone()
    }

    /// The shop the cart belongs to, if any.
    #[must_use]
    pub fn shop(&self) -> Option<(ShopId, String)> {
        self.lock_cart()
            .shop()
            .map(|(id, name)| (id.clone(), name.to_owned()))
    }

    // =========================================================================
    // Sidebar
    // =========================================================================

    /// Open or close the cart sidebar.
    pub fn set_sidebar_open(&self, open: bool) {
        let mut state = self
            .inner
            .sidebar_open
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *state = open;
        storage::write_json(self.inner.storage.as_ref(), keys::CART_SIDEBAR_STATE, &open);
        self.publish(CartEvent::SidebarToggled { open });
    }

    /// Whether the cart sidebar is open.
    #[must_use]
    pub fn is_sidebar_open(&self) -> bool {
        *self
            .inner
            .sidebar_open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock_cart(&self) -> MutexGuard<'_, Cart> {
        self.inner.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist the cart and announce the new count.
    fn commit(&self, cart: &Cart) {
        storage::write_json(self.inner.storage.as_ref(), keys::CART_ITEMS, cart);
        self.publish(CartEvent::Updated { count: cart.count() });
    }

    fn publish(&self, event: CartEvent) {
        // No subscribers is fine; the state is still readable via selectors.
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("count", &self.count())
            .field("sidebar_open", &self.is_sidebar_open())
            .finish_non_exhaustive()
    }
}

fn load_cart(storage: &dyn Storage) -> Cart {
    storage::read_json::<Vec<CartLineItem>>(storage, keys::CART_ITEMS)
        .map(Cart::from_lines)
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::storage::testing::UnavailableStorage;

    fn item(id: &str, shop: &str, price: i64) -> CartLineItem {
        CartLineItem {
            item_id: MenuItemId::new(id),
            name: format!("Item {id}"),
            description: "tasty".to_string(),
            image_url: String::new(),
            price: Price::from(price),
            shop_id: ShopId::new(shop),
            shop_name: format!("Shop {shop}"),
            quantity: 1,
        }
    }

    fn store() -> (CartStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (CartStore::new(storage.clone()), storage)
    }

    #[test]
    fn test_add_persists_and_announces() {
        let (store, storage) = store();
        let mut events = store.subscribe();

        store.add_item(item("a", "s1", 100)).unwrap();
        store.add_item(item("a", "s1", 100)).unwrap();

        assert_eq!(events.try_recv().unwrap(), CartEvent::Updated { count: 1 });
        assert_eq!(events.try_recv().unwrap(), CartEvent::Updated { count: 1 });

        let stored = storage.get(keys::CART_ITEMS).unwrap().unwrap();
        let lines: Vec<CartLineItem> = serde_json::from_str(&stored).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_cross_shop_conflict_leaves_storage_untouched() {
        let (store, storage) = store();
        store.add_item(item("a", "s1", 100)).unwrap();
        let before = storage.get(keys::CART_ITEMS).unwrap();
        let mut events = store.subscribe();

        let err = store.add_item(item("b", "s2", 40)).unwrap_err();
        assert!(matches!(err, CartError::CrossShop(ref c) if c.item_shop == ShopId::new("s2")));
        assert!(matches!(events.try_recv().unwrap(), CartEvent::Conflict(_)));
        assert_eq!(storage.get(keys::CART_ITEMS).unwrap(), before);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_worked_example_through_store() {
        let (store, _) = store();
        let a = MenuItemId::new("A");

        store.add_item(item("A", "S1", 100)).unwrap();
        store.add_item(item("A", "S1", 100)).unwrap();
        assert_eq!(store.total(), Price::from(200));
        assert_eq!(store.count(), 1);

        assert!(store.add_item(item("B", "S2", 10)).is_err());
        assert_eq!(store.quantity_of(&a), 2);

        store.remove_item(&a);
        assert_eq!(store.quantity_of(&a), 1);
        assert_eq!(store.total(), Price::from(100));

        store.remove_item(&a);
        assert!(store.items().is_empty());
        assert_eq!(store.total(), Price::ZERO);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_remove_absent_item_is_silent() {
        let (store, storage) = store();
        let mut events = store.subscribe();
        assert_eq!(store.remove_item(&MenuItemId::new("ghost")), RemoveOutcome::Absent);
        assert!(events.try_recv().is_err());
        assert!(storage.get(keys::CART_ITEMS).unwrap().is_none());
    }

    #[test]
    fn test_empty_cart_announces_zero() {
        let (store, storage) = store();
        store.add_item(item("a", "s1", 5)).unwrap();
        store.add_item(item("b", "s1", 6)).unwrap();
        let mut events = store.subscribe();

        store.empty_cart();
        assert_eq!(events.try_recv().unwrap(), CartEvent::Updated { count: 0 });
        assert_eq!(store.count(), 0);
        assert_eq!(store.total(), Price::ZERO);
        assert_eq!(storage.get(keys::CART_ITEMS).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_new_store_loads_persisted_cart() {
        let (store, storage) = store();
        store.add_item(item("a", "s1", 100)).unwrap();
        store.add_item(item("b", "s1", 30)).unwrap();
        let before = storage.get(keys::CART_ITEMS).unwrap();

        let reopened = CartStore::new(storage.clone());
        assert_eq!(reopened.snapshot(), store.snapshot());
        assert_eq!(
            serde_json::to_string(&reopened.snapshot()).ok(),
            before
        );
    }

    #[test]
    fn test_clones_share_state() {
        let (navbar, _) = store();
        let sidebar = navbar.clone();
        let mut badge = navbar.subscribe();

        sidebar.add_item(item("a", "s1", 1)).unwrap();
        assert_eq!(navbar.count(), 1);
        assert_eq!(badge.try_recv().unwrap(), CartEvent::Updated { count: 1 });
    }

    #[test]
    fn test_reload_picks_up_other_writer() {
        let storage = Arc::new(MemoryStorage::new());
        let first = CartStore::new(storage.clone());
        let second = CartStore::new(storage.clone());

        second.add_item(item("a", "s1", 1)).unwrap();
        assert_eq!(first.count(), 0);

        first.reload();
        assert_eq!(first.count(), 1);
    }

    #[test]
    fn test_corrupt_stored_cart_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::CART_ITEMS, "not json").unwrap();
        let store = CartStore::new(storage);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_unavailable_storage_keeps_in_memory_state() {
        let store = CartStore::new(Arc::new(UnavailableStorage));
        store.add_item(item("a", "s1", 12)).unwrap();
        store.add_item(item("a", "s1", 12)).unwrap();
        assert_eq!(store.total(), Price::from(24));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_replace_with_switches_shop() {
        let (store, _) = store();
        store.add_item(item("a", "s1", 10)).unwrap();
        store.replace_with(item("b", "s2", 20));
        assert_eq!(store.shop().unwrap().0, ShopId::new("s2"));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_sidebar_flag_persists() {
        let (store, storage) = store();
        let mut events = store.subscribe();
        store.set_sidebar_open(true);

        assert!(store.is_sidebar_open());
        assert_eq!(events.try_recv().unwrap(), CartEvent::SidebarToggled { open: true });
        assert!(CartStore::new(storage).is_sidebar_open());
    }

    #[test]
    fn test_settle_persists_remaining_lines() {
        let (store, storage) = store();
        store.add_item(item("a", "s1", 10)).unwrap();
        let submitted = store.items();
        store.add_item(item("b", "s1", 20)).unwrap();
        let mut events = store.subscribe();

        store.settle(&submitted);

        assert_eq!(events.try_recv().unwrap(), CartEvent::Updated { count: 1 });
        assert_eq!(CartStore::new(storage).items()[0].item_id, MenuItemId::new("b"));
    }
}
