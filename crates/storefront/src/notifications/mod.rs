//! Realtime order and payment notifications.
//!
//! The backend pushes three kinds of events: a new order, an order status
//! change, and a payment status change. Each has a global name and a
//! shop-scoped variant. A notification is only a hint: the bridge turns it
//! into a toast and asks its refetch target to reload from the backend,
//! never merging the payload into local state.

mod bridge;
mod sse;

pub use bridge::{BridgeHandle, NotificationBridge};
pub use sse::{RawEvent, SseTransport};

use std::future::Future;

use campick_core::{OrderId, PaymentId, Price, ShopId};
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Event names
// =============================================================================

const NEW_ORDER: &str = "newOrder";
const ORDER_STATUS_UPDATE: &str = "orderStatusUpdate";
const PAYMENT_STATUS_UPDATE: &str = "paymentStatusUpdate";

fn shop_order_event(shop_id: &ShopId) -> String {
    format!("shop_order_{shop_id}")
}

fn shop_status_event(shop_id: &ShopId) -> String {
    format!("order_status_update_{shop_id}")
}

fn shop_payment_event(shop_id: &ShopId) -> String {
    format!("shop_payment_{shop_id}")
}

/// Errors raised by the push channel.
#[derive(Debug, Error)]
pub enum PushError {
    /// Connecting to the push endpoint failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The push endpoint refused the subscription.
    #[error("push endpoint returned {0}")]
    Status(u16),

    /// The connection broke mid-stream.
    #[error("stream error: {0}")]
    Stream(String),

    /// An event payload did not match its event name.
    #[error("malformed {event} payload: {message}")]
    Parse { event: String, message: String },

    /// The push URL could not be built.
    #[error("invalid push URL: {0}")]
    InvalidUrl(String),
}

/// Which events a client listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// Global events plus the shop-scoped events of one shop (owners).
    Shop(ShopId),
    /// Global events only (shoppers).
    Global,
}

impl Subscription {
    /// Every event name this subscription handles.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let mut names = vec![
            NEW_ORDER.to_string(),
            ORDER_STATUS_UPDATE.to_string(),
            PAYMENT_STATUS_UPDATE.to_string(),
        ];
        if let Self::Shop(shop_id) = self {
            names.push(shop_order_event(shop_id));
            names.push(shop_status_event(shop_id));
            names.push(shop_payment_event(shop_id));
        }
        names
    }

    /// Value of the `scope` query parameter sent to the push endpoint.
    #[must_use]
    pub fn scope_param(&self) -> String {
        match self {
            Self::Shop(shop_id) => format!("shop:{shop_id}"),
            Self::Global => "global".to_string(),
        }
    }

    /// Classify an event name, or `None` if this subscription ignores it.
    fn classify(&self, event: &str) -> Option<(EventKind, EventScope)> {
        let global = match event {
            NEW_ORDER => Some(EventKind::NewOrder),
            ORDER_STATUS_UPDATE => Some(EventKind::OrderStatus),
            PAYMENT_STATUS_UPDATE => Some(EventKind::PaymentStatus),
            _ => None,
        };
        if let Some(kind) = global {
            return Some((kind, EventScope::Global));
        }

        let Self::Shop(shop_id) = self else {
            return None;
        };
        let kind = if event == shop_order_event(shop_id) {
            EventKind::NewOrder
        } else if event == shop_status_event(shop_id) {
            EventKind::OrderStatus
        } else if event == shop_payment_event(shop_id) {
            EventKind::PaymentStatus
        } else {
            return None;
        };
        Some((kind, EventScope::Shop(shop_id.clone())))
    }
}

#[derive(Debug, Clone, Copy)]
enum EventKind {
    NewOrder,
    OrderStatus,
    PaymentStatus,
}

/// Whether an event arrived on a global or a shop-scoped name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    Global,
    Shop(ShopId),
}

// =============================================================================
// Payloads
// =============================================================================

/// Payload of a new-order event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderNotification {
    pub order_id: OrderId,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub total_price: Price,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub shop_name: String,
    #[serde(default)]
    pub items: Vec<NotifiedItem>,
}

/// One line of a new-order event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotifiedItem {
    pub item_name: String,
    pub quantity: u32,
    pub price: Price,
}

/// Payload of an order status event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderStatusUpdate {
    #[serde(alias = "orderId")]
    pub order_id: OrderId,
    pub status: String,
}

/// Payload of a payment status event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
    #[serde(alias = "order_id")]
    pub order_id: OrderId,
    pub status: String,
    #[serde(default)]
    pub order_status: Option<String>,
}

/// A recognised push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    NewOrder {
        scope: EventScope,
        order: OrderNotification,
    },
    OrderStatusChanged {
        scope: EventScope,
        update: OrderStatusUpdate,
    },
    PaymentStatusChanged {
        scope: EventScope,
        update: PaymentUpdate,
    },
}

impl Notification {
    /// Parse a raw event against a subscription.
    ///
    /// Returns `Ok(None)` for events the subscription does not handle.
    ///
    /// # Errors
    ///
    /// Returns `PushError::Parse` if the payload does not match the event.
    pub fn parse(subscription: &Subscription, raw: &RawEvent) -> Result<Option<Self>, PushError> {
        let Some((kind, scope)) = subscription.classify(&raw.event) else {
            return Ok(None);
        };

        let parse_error = |e: serde_json::Error| PushError::Parse {
            event: raw.event.clone(),
            message: e.to_string(),
        };

        let notification = match kind {
            EventKind::NewOrder => Self::NewOrder {
                scope,
                order: serde_json::from_str(&raw.data).map_err(parse_error)?,
            },
            EventKind::OrderStatus => Self::OrderStatusChanged {
                scope,
                update: serde_json::from_str(&raw.data).map_err(parse_error)?,
            },
            EventKind::PaymentStatus => Self::PaymentStatusChanged {
                scope,
                update: serde_json::from_str(&raw.data).map_err(parse_error)?,
            },
        };
        Ok(Some(notification))
    }

    /// The toast shown for this notification.
    #[must_use]
    pub fn toast(&self) -> Toast {
        match self {
            Self::NewOrder {
                scope: EventScope::Global,
                order,
            } => Toast::new(
                "New Order",
                format!("New order received from {}!", order.customer_name),
            ),
            Self::NewOrder {
                scope: EventScope::Shop(_),
                order,
            } => Toast::new(
                "Shop Order",
                format!("New order for your shop: {}", order.order_id),
            ),
            Self::OrderStatusChanged { update, .. } => Toast::new(
                "Order Status Updated",
                format!(
                    "Order #{} status updated to {}",
                    update.order_id, update.status
                ),
            ),
            Self::PaymentStatusChanged {
                scope: EventScope::Global,
                update,
            } => Toast::new(
                "Payment Status Update",
                format!("Payment status updated to {}", update.status),
            ),
            Self::PaymentStatusChanged {
                scope: EventScope::Shop(_),
                update,
            } => Toast::new(
                "Payment Update",
                format!("Payment status updated for order: {}", update.order_id),
            ),
        }
    }
}

/// An ephemeral user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
}

impl Toast {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

impl std::fmt::Display for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Something that reloads its state from the backend on a notification.
pub trait Refetch: Send + Sync + 'static {
    fn refetch(&self) -> impl Future<Output = ()> + Send;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(event: &str, data: &serde_json::Value) -> RawEvent {
        RawEvent {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    fn owner() -> Subscription {
        Subscription::Shop(ShopId::new("42"))
    }

    #[test]
    fn test_event_names() {
        assert_eq!(Subscription::Global.event_names().len(), 3);
        let names = owner().event_names();
        assert!(names.contains(&"shop_order_42".to_string()));
        assert!(names.contains(&"order_status_update_42".to_string()));
        assert!(names.contains(&"shop_payment_42".to_string()));
    }

    #[test]
    fn test_global_new_order_toast() {
        let event = raw(
            "newOrder",
            &json!({"order_id": "o1", "customer_name": "Asha", "total_price": 120, "status": "pending"}),
        );
        let notification = Notification::parse(&Subscription::Global, &event)
            .unwrap()
            .unwrap();
        assert_eq!(
            notification.toast(),
            Toast::new("New Order", "New order received from Asha!")
        );
    }

    #[test]
    fn test_shop_order_toast() {
        let event = raw("shop_order_42", &json!({"order_id": "o7"}));
        let notification = Notification::parse(&owner(), &event).unwrap().unwrap();
        assert_eq!(
            notification.toast(),
            Toast::new("Shop Order", "New order for your shop: o7")
        );
    }

    #[test]
    fn test_order_status_accepts_camel_case_id() {
        let event = raw("orderStatusUpdate", &json!({"orderId": "o3", "status": "accepted"}));
        let notification = Notification::parse(&Subscription::Global, &event)
            .unwrap()
            .unwrap();
        assert_eq!(
            notification.toast().description,
            "Order #o3 status updated to accepted"
        );
    }

    #[test]
    fn test_payment_toasts_by_scope() {
        let payload = json!({"paymentId": "p1", "orderId": "o1", "status": "verified", "orderStatus": "accepted"});

        let global = Notification::parse(&owner(), &raw("paymentStatusUpdate", &payload))
            .unwrap()
            .unwrap();
        assert_eq!(
            global.toast(),
            Toast::new("Payment Status Update", "Payment status updated to verified")
        );

        let scoped = Notification::parse(&owner(), &raw("shop_payment_42", &payload))
            .unwrap()
            .unwrap();
        assert_eq!(
            scoped.toast(),
            Toast::new("Payment Update", "Payment status updated for order: o1")
        );
    }

    #[test]
    fn test_other_shop_and_unknown_events_are_ignored() {
        let payload = json!({"order_id": "o1"});
        assert!(Notification::parse(&owner(), &raw("shop_order_7", &payload))
            .unwrap()
            .is_none());
        assert!(Notification::parse(&Subscription::Global, &raw("shop_order_42", &payload))
            .unwrap()
            .is_none());
        assert!(Notification::parse(&owner(), &raw("ping", &payload))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_bad_payload_is_parse_error() {
        let event = RawEvent {
            event: "orderStatusUpdate".to_string(),
            data: "{not json".to_string(),
        };
        let err = Notification::parse(&Subscription::Global, &event).unwrap_err();
        assert!(matches!(err, PushError::Parse { event, .. } if event == "orderStatusUpdate"));
    }
}
