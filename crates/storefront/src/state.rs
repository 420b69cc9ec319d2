//! Client state shared across every view.
//!
//! `ClientState` is the composition root: one storage handle, one cart, one
//! auth gate and one HTTP client, handed to whatever needs them.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::{ApiError, BackendClient, Shop};
use crate::auth::{AuthGate, Session, TokenError};
use crate::cart::CartStore;
use crate::checkout::Checkout;
use crate::config::ClientConfig;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::notifications::{PushError, SseTransport};
use crate::orders::{OrderScope, OrdersView};
use crate::storage::{self, FileStorage, MemoryStorage, Storage, keys};

/// Shared client state.
#[derive(Clone)]
pub struct ClientState {
    inner: Arc<ClientStateInner>,
}

struct ClientStateInner {
    config: ClientConfig,
    storage: Arc<dyn Storage>,
    cart: CartStore,
    auth: AuthGate,
    client: BackendClient,
}

impl ClientState {
    /// Open state backed by the configured storage file.
    ///
    /// If the storage file cannot be opened the session runs on in-memory
    /// storage and nothing persists past exit.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn open(config: ClientConfig) -> Result<Self, ApiError> {
        let storage: Arc<dyn Storage> = match FileStorage::open(config.storage_file()) {
            Ok(storage) => Arc::new(storage),
            Err(e) => {
                warn!(
                    path = %config.storage_file().display(),
                    error = %e,
                    "Durable storage unavailable, using in-memory storage"
                );
                Arc::new(MemoryStorage::new())
            }
        };
        Self::with_storage(config, storage)
    }

    /// Build state over an existing storage backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let client = BackendClient::new(&config)?;
        Ok(Self {
            inner: Arc::new(ClientStateInner {
                cart: CartStore::new(storage.clone()),
                auth: AuthGate::new(storage.clone()),
                config,
                storage,
                client,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn auth(&self) -> &AuthGate {
        &self.inner.auth
    }

    /// A backend client carrying the current session's token, if any.
    #[must_use]
    pub fn client(&self) -> BackendClient {
        self.inner.client.with_token(self.inner.auth.bearer())
    }

    /// Checkout over the shared cart.
    #[must_use]
    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.inner.cart.clone(), self.client())
    }

    /// An empty orders view for `scope`.
    #[must_use]
    pub fn orders_view(&self, scope: OrderScope) -> OrdersView<BackendClient> {
        OrdersView::new(self.client(), scope)
    }

    /// Push transport for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn push_transport(&self) -> Result<SseTransport, PushError> {
        SseTransport::new(&self.inner.config)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Store a token issued by the auth backend.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is unreadable or expired.
    #[instrument(skip(self, token))]
    pub fn sign_in(&self, token: &str) -> Result<Session, TokenError> {
        let session = self.inner.auth.sign_in(token)?;
        if let Some(id) = &session.claims.id {
            set_sentry_user(id, session.claims.email.as_deref());
        }
        info!(role = ?session.claims.role, "Signed in");
        Ok(session)
    }

    /// Sign out: empty the cart and clear every storage key.
    #[instrument(skip(self))]
    pub fn sign_out(&self) {
        self.inner.cart.empty_cart();
        self.inner.cart.set_sidebar_open(false);
        if let Err(e) = self.inner.storage.clear() {
            warn!(error = %e, "Failed to clear storage on sign out");
            self.inner.auth.sign_out();
        }
        clear_sentry_user();
        info!("Signed out");
    }

    // =========================================================================
    // Selected shop
    // =========================================================================

    /// Remember the shop the shopper opened.
    pub fn select_shop(&self, shop: &Shop) {
        storage::write_json(self.inner.storage.as_ref(), keys::SELECTED_SHOP, shop);
    }

    /// The last shop the shopper opened.
    #[must_use]
    pub fn selected_shop(&self) -> Option<Shop> {
        storage::read_json(self.inner.storage.as_ref(), keys::SELECTED_SHOP)
    }
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("cart", &self.inner.cart)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::{Surface, unsigned_token};
    use crate::cart::CartEvent;
    use campick_core::{CartLineItem, MenuItemId, Price, ShopId};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn state() -> (ClientState, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let config = ClientConfig::for_api("http://localhost:4000").unwrap();
        (ClientState::with_storage(config, storage.clone()).unwrap(), storage)
    }

    fn shop() -> Shop {
        Shop {
            id: ShopId::new("s1"),
            name: "Canteen".to_string(),
            description: "Main block".to_string(),
            image_url: None,
            contact_number: Some("98450 00000".to_string()),
            is_open: true,
        }
    }

    fn line() -> CartLineItem {
        CartLineItem {
            item_id: MenuItemId::new("m1"),
            name: "Samosa".to_string(),
            description: String::new(),
            image_url: String::new(),
            price: Price::from(15),
            shop_id: ShopId::new("s1"),
            shop_name: "Canteen".to_string(),
            quantity: 1,
        }
    }

    #[test]
    fn test_sign_out_clears_everything() {
        let (state, storage) = state();
        let token = unsigned_token(&json!({
            "id": 5,
            "role": "student",
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        }));
        state.sign_in(&token).unwrap();
        state.cart().add_item(line()).unwrap();
        state.select_shop(&shop());
        assert!(state.client().is_authenticated());
        let mut events = state.cart().subscribe();

        state.sign_out();

        assert_eq!(events.try_recv().unwrap(), CartEvent::Updated { count: 0 });
        assert!(storage.is_empty());
        assert_eq!(state.cart().count(), 0);
        assert_eq!(state.auth().route(), Surface::SignIn);
        assert!(!state.client().is_authenticated());
        assert!(state.selected_shop().is_none());
    }

    #[test]
    fn test_selected_shop_round_trip() {
        let (state, _) = state();
        assert!(state.selected_shop().is_none());
        state.select_shop(&shop());
        assert_eq!(state.selected_shop(), Some(shop()));
    }

    #[test]
    fn test_open_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let mut config = ClientConfig::for_api("http://localhost:4000").unwrap();
        config.storage_dir = blocker;

        let state = ClientState::open(config).unwrap();
        state.cart().add_item(line()).unwrap();
        assert_eq!(state.cart().count(), 1);
    }
}
