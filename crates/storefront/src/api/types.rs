//! Request and response bodies of the REST backend.

use campick_core::{
    CartLineItem, MenuItemId, OrderId, OrderStatus, PaymentId, PaymentStatus, Price, Role, ShopId,
    UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Shops and menus
// =============================================================================

/// A vendor on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    /// Closed shops still show their menu but refuse orders.
    #[serde(default = "default_open")]
    pub is_open: bool,
}

const fn default_open() -> bool {
    true
}

/// A menu entry as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub item_id: MenuItemId,
    pub shop_id: ShopId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub price: Price,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl MenuItem {
    /// A single-unit cart line for this item.
    #[must_use]
    pub fn to_line_item(&self, shop_name: &str) -> CartLineItem {
        CartLineItem {
            item_id: self.item_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            price: self.price,
            shop_id: self.shop_id.clone(),
            shop_name: shop_name.to_string(),
            quantity: 1,
        }
    }
}

/// Body of `GET /api/shop/{id}/getAllMenuItems`.
#[derive(Debug, Deserialize)]
pub(crate) struct MenuItemsResponse {
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// Fields an owner sets when creating or editing a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItemInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub image_url: String,
}

/// A way the shop accepts manual payments.
///
/// `details` are display lines (account holder, account number, UPI id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentMethodsResponse {
    #[serde(default)]
    pub methods: Vec<PaymentMethod>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ToggleStatusRequest {
    pub is_open: bool,
}

/// Fields an owner sets when editing the shop profile.
///
/// `None` fields are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShopUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<String>,
}

impl ShopUpdate {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.email.is_none()
            && self.contact_number.is_none()
            && self.full_name.is_none()
            && self.account_title.is_none()
            && self.payment_method.is_none()
            && self.payment_details.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerShopsResponse {
    #[serde(default)]
    pub shops: Vec<Shop>,
}

/// Sales overview of one shop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDashboard {
    #[serde(default)]
    pub revenue: Price,
    #[serde(default)]
    pub shop_details: ShopSummary,
    #[serde(default)]
    pub top_selling_items: TopSellingItems,
    #[serde(default)]
    pub recent_orders: Vec<RecentOrder>,
    #[serde(default)]
    pub revenue_over_time: Vec<DailyRevenue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShopSummary {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_orders: u64,
    #[serde(default)]
    pub average_order_value: Price,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_menu_items: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TopSellingItems {
    #[serde(default)]
    pub items: Vec<TopSellingItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopSellingItem {
    pub item_id: MenuItemId,
    pub name: String,
    #[serde(default)]
    pub unit_price: Price,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_quantity_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecentOrder {
    pub order_id: OrderId,
    #[serde(default)]
    pub total_price: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyRevenue {
    pub date: String,
    #[serde(default)]
    pub daily_revenue: Price,
}

// =============================================================================
// Profile
// =============================================================================

/// The signed-in user's profile.
///
/// Owners carry the id of the shop they manage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    /// Whether the platform has approved the owner's shop.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_verified: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    pub user: Profile,
}

/// Accept `true`/`false`, `1`/`0` or null.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(flag)) => flag,
        Some(Flag::Int(n)) => n == 1,
        None => false,
    })
}

/// Fields a user sets when editing their profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A shopper's order history in aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOrderStats {
    #[serde(default)]
    pub order_stats: OrderStats,
    #[serde(default)]
    pub frequent_shops: Vec<FrequentShop>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderStats {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_orders: u64,
    #[serde(default)]
    pub total_spent: Price,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub completed_orders: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub cancelled_orders: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub active_orders: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrequentShop {
    pub shop_id: ShopId,
    pub shop_name: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub order_count: u64,
    #[serde(default)]
    pub total_spent_at_shop: Price,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderStatsResponse {
    pub data: UserOrderStats,
}

/// Accept counts as numbers, numeric strings (SQL `COUNT` output) or null.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(u64),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Int(n)) => Ok(n),
        Some(Count::Text(text)) => text.trim().parse().map_err(serde::de::Error::custom),
        None => Ok(0),
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One line of a submitted order, with its historical price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub item_id: MenuItemId,
    #[serde(default)]
    pub item_name: String,
    pub quantity: u32,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// An order as projected by the backend.
///
/// Owner listings include the customer fields; customer listings omit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order_id: OrderId,
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total_price: Price,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub user_type: Option<Role>,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersResponse {
    #[serde(default)]
    pub orders: Vec<OrderDetails>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentStatusRequest<'a> {
    pub payment_id: &'a PaymentId,
    pub status: PaymentStatus,
}

/// The payment behind an order, as the owner reviews it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    pub payment_id: PaymentId,
    pub customer_name: Option<String>,
    pub role: Option<Role>,
    pub screenshot_url: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentIdResponse {
    pub payment_info: PaymentInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentInfo {
    pub payment_id: PaymentId,
}

/// Body of `GET /api/paymentDetails/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub payment: PaymentRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentRecord {
    #[serde(default, rename = "screenshotUrl")]
    pub screenshot_url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentDetailsResponse {
    pub data: PaymentDetails,
}

// =============================================================================
// Checkout
// =============================================================================

/// Body of `POST /api/verifyPaymentAndCreateOrder`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub payment_screenshot_url: String,
    pub shop_id: ShopId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_method: String,
    pub items: Vec<CartLineItem>,
}

/// Backend verdict on a payment submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl VerifyResponse {
    /// Whether the order was created.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// An image stored by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub data: UploadedImage,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shop_defaults_open() {
        let shop: Shop = serde_json::from_value(json!({"id": 3, "name": "Canteen"})).unwrap();
        assert_eq!(shop.id, ShopId::new("3"));
        assert!(shop.is_open);

        let shop: Shop =
            serde_json::from_value(json!({"id": "3", "name": "Canteen", "is_open": false}))
                .unwrap();
        assert!(!shop.is_open);
    }

    #[test]
    fn test_menu_item_string_price() {
        let item: MenuItem = serde_json::from_value(json!({
            "item_id": "m1",
            "shop_id": "s1",
            "name": "Masala Dosa",
            "category": "South Indian",
            "description": "Crispy",
            "image_url": "https://img/dosa.png",
            "price": "45.00",
            "created_at": "2024-01-01T10:00:00Z",
            "updated_at": "2024-01-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(item.price, Price::from(45));

        let line = item.to_line_item("Canteen");
        assert_eq!(line.quantity, 1);
        assert_eq!(line.shop_name, "Canteen");
    }

    #[test]
    fn test_order_details_owner_projection() {
        let order: OrderDetails = serde_json::from_value(json!({
            "order_id": "o1",
            "payment_id": "p1",
            "created_at": "2024-01-01T10:00:00Z",
            "status": "Preparing",
            "total_price": 120,
            "payment_status": "verified",
            "user_id": 7,
            "user_name": "Asha",
            "email": "asha@campus.edu",
            "user_type": "student",
            "items": [{"id": 1, "item_id": "m1", "item_name": "Dosa", "quantity": 2, "price": 60}]
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.payment_status, PaymentStatus::Verified);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.user_type, Some(Role::Student));
    }

    #[test]
    fn test_payment_status_request_shape() {
        let payment_id = PaymentId::new("p9");
        let body = serde_json::to_value(PaymentStatusRequest {
            payment_id: &payment_id,
            status: PaymentStatus::Rejected,
        })
        .unwrap();
        assert_eq!(body, json!({"paymentId": "p9", "status": "rejected"}));
    }

    #[test]
    fn test_payment_request_amount_is_number() {
        let body = serde_json::to_value(PaymentRequest {
            payment_screenshot_url: "https://img/pay.png".to_string(),
            shop_id: ShopId::new("s1"),
            amount: Decimal::new(2050, 1),
            payment_method: "UPI".to_string(),
            items: Vec::new(),
        })
        .unwrap();
        assert_eq!(body["amount"], json!(205.0));
        assert_eq!(body["shop_id"], json!("s1"));
    }

    #[test]
    fn test_payment_method_type_field() {
        let methods: PaymentMethodsResponse = serde_json::from_value(json!({
            "methods": [{"type": "UPI", "details": ["Asha", "asha@upi"]}]
        }))
        .unwrap();
        assert_eq!(methods.methods[0].kind, "UPI");
        assert_eq!(methods.methods[0].details.len(), 2);
    }

    #[test]
    fn test_profile_numeric_verified_flag() {
        let response: ProfileResponse = serde_json::from_value(json!({
            "user": {"id": 9, "role": "shop_owner", "shop_id": 4, "is_verified": 1}
        }))
        .unwrap();
        assert_eq!(response.user.shop_id, Some(ShopId::new("4")));
        assert_eq!(response.user.role, Some(Role::ShopOwner));
        assert!(response.user.is_verified);

        let profile: Profile =
            serde_json::from_value(json!({"name": "Asha", "is_verified": null})).unwrap();
        assert!(!profile.is_verified);
        assert!(profile.shop_id.is_none());
    }

    #[test]
    fn test_shop_update_skips_unset_fields() {
        let update = ShopUpdate {
            name: Some("Canteen".to_string()),
            payment_method: Some("jazzcash".to_string()),
            ..ShopUpdate::default()
        };
        assert!(!update.is_empty());
        assert!(ShopUpdate::default().is_empty());
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({"name": "Canteen", "payment_method": "jazzcash"})
        );
    }

    #[test]
    fn test_dashboard_counts_as_strings() {
        let dashboard: ShopDashboard = serde_json::from_value(json!({
            "revenue": "1250.00",
            "shopDetails": {"total_orders": "12", "average_order_value": "104.17", "total_menu_items": 8},
            "topSellingItems": {"items": [
                {"item_id": "m1", "name": "Samosa", "unit_price": "15.00", "total_quantity_sold": "40"}
            ]},
            "recentOrders": [{"order_id": 5, "total_price": "60.00", "status": "pending", "created_at": "2024-01-02", "user_name": "Asha"}],
            "revenueOverTime": [{"date": "2024-01-02", "daily_revenue": 300}]
        }))
        .unwrap();
        assert_eq!(dashboard.revenue, Price::from(1250));
        assert_eq!(dashboard.shop_details.total_orders, 12);
        assert_eq!(dashboard.shop_details.total_menu_items, 8);
        assert_eq!(dashboard.top_selling_items.items[0].total_quantity_sold, 40);
        assert_eq!(dashboard.recent_orders[0].order_id, OrderId::new("5"));
        assert_eq!(dashboard.revenue_over_time[0].daily_revenue, Price::from(300));
    }

    #[test]
    fn test_order_stats_envelope() {
        let response: OrderStatsResponse = serde_json::from_value(json!({
            "success": true,
            "data": {
                "orderStats": {"total_orders": "3", "total_spent": 145.5, "completed_orders": "2", "cancelled_orders": null, "active_orders": 1},
                "frequentShops": [{"shop_name": "Canteen", "shop_id": 1, "order_count": "3", "total_spent_at_shop": "145.50"}]
            }
        }))
        .unwrap();
        let stats = response.data;
        assert_eq!(stats.order_stats.total_orders, 3);
        assert_eq!(stats.order_stats.cancelled_orders, 0);
        assert_eq!(stats.order_stats.total_spent, Price::new(Decimal::new(1455, 1)));
        assert_eq!(stats.frequent_shops[0].shop_id, ShopId::new("1"));
    }

    #[test]
    fn test_payment_details_screenshot_field() {
        let response: PaymentDetailsResponse = serde_json::from_value(json!({
            "data": {
                "customer_name": "Asha",
                "role": "student",
                "payment": {"screenshotUrl": "https://img/pay.png", "method": "easypaisa"}
            }
        }))
        .unwrap();
        assert_eq!(response.data.role, Some(Role::Student));
        assert_eq!(response.data.payment.screenshot_url.as_deref(), Some("https://img/pay.png"));

        let id: PaymentIdResponse =
            serde_json::from_value(json!({"paymentInfo": {"payment_id": 14}})).unwrap();
        assert_eq!(id.payment_info.payment_id, PaymentId::new("14"));
    }
}
