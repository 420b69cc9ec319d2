//! Orders view that reconciles by refetching.
//!
//! The backend owns every order. [`OrdersView`] keeps the last fetched list
//! and never patches it locally: owner actions and push notifications both
//! end in a full [`OrdersView::refresh`]. A generation counter makes the
//! newest refresh win when several are in flight.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use campick_core::{CartConflict, OrderId, OrderStatus, PaymentId, PaymentStatus, ShopId};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, BackendClient, OrderDetails};
use crate::cart::{CartError, CartStore};
use crate::notifications::Refetch;

/// Whose orders a view lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders received by an owner's shop.
    Shop(ShopId),
    /// Orders placed by the signed-in shopper.
    Customer,
}

/// Backend operations an [`OrdersView`] depends on.
pub trait OrderSource: Send + Sync {
    /// Fetch the full order list for `scope`.
    fn fetch_orders(
        &self,
        scope: &OrderScope,
    ) -> impl Future<Output = Result<Vec<OrderDetails>, ApiError>> + Send;

    /// Fetch one order with its line items.
    fn fetch_order(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<OrderDetails, ApiError>> + Send;

    /// Set an order's status.
    fn set_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Set a payment's verification status.
    fn set_payment_status(
        &self,
        payment_id: &PaymentId,
        status: PaymentStatus,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl OrderSource for BackendClient {
    async fn fetch_orders(&self, scope: &OrderScope) -> Result<Vec<OrderDetails>, ApiError> {
        match scope {
            OrderScope::Shop(_) => self.list_shop_orders().await,
            OrderScope::Customer => self.list_user_orders().await,
        }
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetails, ApiError> {
        self.order_details(order_id).await
    }

    async fn set_order_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<(), ApiError> {
        self.update_order_status(order_id, status).await
    }

    async fn set_payment_status(
        &self,
        payment_id: &PaymentId,
        status: PaymentStatus,
    ) -> Result<(), ApiError> {
        self.update_payment_status(payment_id, status).await
    }
}

/// Result of a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched list replaced the view; carries its length.
    Applied(usize),
    /// A newer refresh was applied while this one was in flight.
    Stale,
}

/// Cached order list for one scope.
pub struct OrdersView<S> {
    source: S,
    scope: OrderScope,
    /// Generation of the most recently started refresh.
    started: AtomicU64,
    state: Mutex<ViewState>,
}

#[derive(Default)]
struct ViewState {
    orders: Vec<OrderDetails>,
    applied: u64,
}

impl<S: OrderSource> OrdersView<S> {
    /// Create an empty view. Call [`refresh`](Self::refresh) to populate it.
    pub fn new(source: S, scope: OrderScope) -> Self {
        Self {
            source,
            scope,
            started: AtomicU64::new(0),
            state: Mutex::new(ViewState::default()),
        }
    }

    #[must_use]
    pub const fn scope(&self) -> &OrderScope {
        &self.scope
    }

    /// Refetch the order list, discarding the result if a newer refresh
    /// has already been applied.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the fetch fails. The view keeps its previous
    /// contents.
    #[instrument(skip(self), fields(scope = ?self.scope))]
    pub async fn refresh(&self) -> Result<RefreshOutcome, ApiError> {
        let generation = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let orders = self.source.fetch_orders(&self.scope).await?;

        let mut state = self.lock_state();
        if generation <= state.applied {
            debug!(generation, "Discarding stale order list");
            return Ok(RefreshOutcome::Stale);
        }

        let count = orders.len();
        state.orders = orders;
        state.applied = generation;
        Ok(RefreshOutcome::Applied(count))
    }

    /// Set an order's status, then refresh.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the update or the refresh fails.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<(), ApiError> {
        self.source.set_order_status(order_id, status).await?;
        self.refresh().await?;
        Ok(())
    }

    /// Set the payment status of an order's payment, then refresh.
    ///
    /// The payment id comes from the cached order, or from the order's
    /// details when the listing omits it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order has no payment.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_payment_status(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
    ) -> Result<(), ApiError> {
        let cached = self.get(order_id).and_then(|order| order.payment_id);
        let payment_id = match cached {
            Some(id) => id,
            None => self
                .source
                .fetch_order(order_id)
                .await?
                .payment_id
                .ok_or_else(|| ApiError::NotFound(format!("payment for order {order_id}")))?,
        };

        self.source.set_payment_status(&payment_id, status).await?;
        self.refresh().await?;
        Ok(())
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    /// Snapshot of every order.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderDetails> {
        self.lock_state().orders.clone()
    }

    /// Orders currently in `status`.
    #[must_use]
    pub fn by_status(&self, status: OrderStatus) -> Vec<OrderDetails> {
        self.lock_state()
            .orders
            .iter()
            .filter(|order| order.status == status)
            .cloned()
            .collect()
    }

    /// Orders waiting for the shop to act.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock_state()
            .orders
            .iter()
            .filter(|order| order.status == OrderStatus::Pending)
            .count()
    }

    /// One cached order.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<OrderDetails> {
        self.lock_state()
            .orders
            .iter()
            .find(|order| &order.order_id == order_id)
            .cloned()
    }

    fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: OrderSource + 'static> Refetch for OrdersView<S> {
    async fn refetch(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Order refresh after notification failed");
        }
    }
}

impl<S> std::fmt::Debug for OrdersView<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersView")
            .field("scope", &self.scope)
            .field("started", &self.started.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Reorder
// =============================================================================

/// Errors that can occur while reordering.
#[derive(Debug, Error)]
pub enum ReorderError {
    #[error("order {0} does not say which shop it came from")]
    MissingShop(OrderId),

    #[error("{0} is not taking orders right now")]
    ShopClosed(String),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Items copied into the cart by [`reorder`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderOutcome {
    /// Lines added at today's price.
    pub added: usize,
    /// Item names no longer on the menu.
    pub unavailable: Vec<String>,
}

/// Copy a past order's items back into the cart at current menu prices.
///
/// Items that have left the menu are skipped and reported. The cart's
/// single-shop rule still applies: a cart holding another shop's items is
/// rejected before anything is added.
///
/// # Errors
///
/// Returns `ReorderError::ShopClosed` if the shop is closed,
/// `ReorderError::Cart` on a cross-shop conflict, or `Api` if the shop
/// cannot be loaded.
#[instrument(skip(client, cart, order), fields(order_id = %order.order_id))]
pub async fn reorder(
    client: &BackendClient,
    cart: &CartStore,
    order: &OrderDetails,
) -> Result<ReorderOutcome, ReorderError> {
    let shop_id = order
        .shop_id
        .clone()
        .ok_or_else(|| ReorderError::MissingShop(order.order_id.clone()))?;
    if let Some((cart_shop, cart_shop_name)) = cart.shop()
        && cart_shop != shop_id
    {
        return Err(CartError::CrossShop(CartConflict {
            cart_shop,
            cart_shop_name,
            item_shop: shop_id,
        })
        .into());
    }
    let shop = client.get_shop(&shop_id).await?;
    if !shop.is_open {
        return Err(ReorderError::ShopClosed(shop.name));
    }

    let mut outcome = ReorderOutcome::default();
    for item in &order.items {
        let current = match client.get_menu_item(&shop_id, &item.item_id).await {
            Ok(current) => current,
            Err(e) => {
                debug!(item_id = %item.item_id, error = %e, "Item no longer available");
                outcome.unavailable.push(item.item_name.clone());
                continue;
            }
        };

        let line = current.to_line_item(&shop.name);
        for _ in 0..item.quantity {
            cart.add_item(line.clone())?;
        }
        outcome.added += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use super::*;
    use campick_core::Price;
    use tokio::sync::oneshot;

    fn order(id: &str, status: OrderStatus, payment_id: Option<&str>) -> OrderDetails {
        OrderDetails {
            order_id: OrderId::new(id),
            payment_id: payment_id.map(PaymentId::new),
            created_at: "2024-01-01T10:00:00Z".to_string(),
            status,
            total_price: Price::from(100),
            payment_status: PaymentStatus::Pending,
            user_id: None,
            user_name: None,
            email: None,
            items: Vec::new(),
            user_type: None,
            shop_id: Some(ShopId::new("s1")),
        }
    }

    struct Scripted {
        gate: Option<oneshot::Receiver<()>>,
        orders: Vec<OrderDetails>,
    }

    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<VecDeque<Scripted>>,
        details: Mutex<Vec<OrderDetails>>,
        status_updates: Mutex<Vec<(OrderId, OrderStatus)>>,
        payment_updates: Mutex<Vec<(PaymentId, PaymentStatus)>>,
    }

    impl ScriptedSource {
        fn respond(self, orders: Vec<OrderDetails>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Scripted { gate: None, orders });
            self
        }

        fn respond_after(self, gate: oneshot::Receiver<()>, orders: Vec<OrderDetails>) -> Self {
            self.responses.lock().unwrap().push_back(Scripted {
                gate: Some(gate),
                orders,
            });
            self
        }
    }

    impl OrderSource for ScriptedSource {
        async fn fetch_orders(&self, _scope: &OrderScope) -> Result<Vec<OrderDetails>, ApiError> {
            let next = self.responses.lock().unwrap().pop_front();
            let Some(next) = next else {
                return Err(ApiError::Api {
                    status: 500,
                    message: "script exhausted".to_string(),
                });
            };
            if let Some(gate) = next.gate {
                let _ = gate.await;
            }
            Ok(next.orders)
        }

        async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetails, ApiError> {
            self.details
                .lock()
                .unwrap()
                .iter()
                .find(|o| &o.order_id == order_id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(order_id.to_string()))
        }

        async fn set_order_status(
            &self,
            order_id: &OrderId,
            status: OrderStatus,
        ) -> Result<(), ApiError> {
            self.status_updates
                .lock()
                .unwrap()
                .push((order_id.clone(), status));
            Ok(())
        }

        async fn set_payment_status(
            &self,
            payment_id: &PaymentId,
            status: PaymentStatus,
        ) -> Result<(), ApiError> {
            self.payment_updates
                .lock()
                .unwrap()
                .push((payment_id.clone(), status));
            Ok(())
        }
    }

    fn shop_scope() -> OrderScope {
        OrderScope::Shop(ShopId::new("s1"))
    }

    #[tokio::test]
    async fn test_refresh_replaces_orders() {
        let source = ScriptedSource::default()
            .respond(vec![order("o1", OrderStatus::Pending, None)])
            .respond(vec![
                order("o1", OrderStatus::Accepted, None),
                order("o2", OrderStatus::Pending, None),
            ]);
        let view = OrdersView::new(source, shop_scope());

        assert_eq!(view.refresh().await.unwrap(), RefreshOutcome::Applied(1));
        assert_eq!(view.pending_count(), 1);

        assert_eq!(view.refresh().await.unwrap(), RefreshOutcome::Applied(2));
        assert_eq!(view.by_status(OrderStatus::Accepted).len(), 1);
        assert_eq!(view.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_orders() {
        let source = ScriptedSource::default().respond(vec![order("o1", OrderStatus::Pending, None)]);
        let view = OrdersView::new(source, shop_scope());

        view.refresh().await.unwrap();
        assert!(view.refresh().await.is_err());
        assert_eq!(view.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (release, gate) = oneshot::channel();
        let source = ScriptedSource::default()
            .respond_after(gate, vec![order("old", OrderStatus::Pending, None)])
            .respond(vec![order("new", OrderStatus::Delivered, None)]);
        let view = Arc::new(OrdersView::new(source, shop_scope()));

        let slow = tokio::spawn({
            let view = view.clone();
            async move { view.refresh().await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        assert_eq!(view.refresh().await.unwrap(), RefreshOutcome::Applied(1));
        release.send(()).unwrap();
        assert_eq!(slow.await.unwrap().unwrap(), RefreshOutcome::Stale);

        let orders = view.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, OrderId::new("new"));
    }

    #[tokio::test]
    async fn test_older_response_applies_when_newer_refresh_fails() {
        let (release, gate) = oneshot::channel();
        let source = ScriptedSource::default()
            .respond_after(gate, vec![order("o1", OrderStatus::Accepted, None)]);
        let view = Arc::new(OrdersView::new(source, shop_scope()));

        let slow = tokio::spawn({
            let view = view.clone();
            async move { view.refresh().await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        // The newer refresh finds the script exhausted and fails.
        assert!(view.refresh().await.is_err());
        release.send(()).unwrap();
        assert_eq!(slow.await.unwrap().unwrap(), RefreshOutcome::Applied(1));
        assert_eq!(view.by_status(OrderStatus::Accepted).len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_then_refresh() {
        let source = ScriptedSource::default()
            .respond(vec![order("o1", OrderStatus::Pending, None)])
            .respond(vec![order("o1", OrderStatus::Preparing, None)]);
        let view = OrdersView::new(source, shop_scope());
        view.refresh().await.unwrap();

        view.update_status(&OrderId::new("o1"), OrderStatus::Preparing)
            .await
            .unwrap();

        assert_eq!(
            view.get(&OrderId::new("o1")).unwrap().status,
            OrderStatus::Preparing
        );
        assert_eq!(
            view.source.status_updates.lock().unwrap().as_slice(),
            &[(OrderId::new("o1"), OrderStatus::Preparing)]
        );
    }

    #[tokio::test]
    async fn test_update_payment_status_uses_cached_payment_id() {
        let listed = vec![order("o1", OrderStatus::Pending, Some("p1"))];
        let source = ScriptedSource::default()
            .respond(listed.clone())
            .respond(listed);
        let view = OrdersView::new(source, shop_scope());
        view.refresh().await.unwrap();

        view.update_payment_status(&OrderId::new("o1"), PaymentStatus::Verified)
            .await
            .unwrap();

        assert_eq!(
            view.source.payment_updates.lock().unwrap().as_slice(),
            &[(PaymentId::new("p1"), PaymentStatus::Verified)]
        );
    }

    #[tokio::test]
    async fn test_update_payment_status_falls_back_to_details() {
        let source = ScriptedSource::default().respond(Vec::new());
        source
            .details
            .lock()
            .unwrap()
            .push(order("o9", OrderStatus::Pending, Some("p9")));
        let view = OrdersView::new(source, OrderScope::Customer);

        view.update_payment_status(&OrderId::new("o9"), PaymentStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(
            view.source.payment_updates.lock().unwrap().as_slice(),
            &[(PaymentId::new("p9"), PaymentStatus::Rejected)]
        );
    }

    #[tokio::test]
    async fn test_update_payment_status_without_payment() {
        let source = ScriptedSource::default();
        source
            .details
            .lock()
            .unwrap()
            .push(order("o1", OrderStatus::Pending, None));
        let view = OrdersView::new(source, shop_scope());

        let err = view
            .update_payment_status(&OrderId::new("o1"), PaymentStatus::Verified)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_refetch_swallows_errors() {
        let view = OrdersView::new(ScriptedSource::default(), shop_scope());
        view.refetch().await;
        assert!(view.orders().is_empty());
    }
}
