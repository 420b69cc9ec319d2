//! REST client behaviour against the mock backend: endpoints, auth,
//! caching and error mapping.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, header};
use campick_core::{MenuItemId, OrderId, OrderStatus, PaymentId, PaymentStatus, Price, ShopId};
use campick_integration_tests::{
    MockBackend, Reply, customer_token, menu_item_json, order_json, owner_token, shop_json,
};
use campick_storefront::api::{ApiError, BackendClient, MenuItemInput};
use serde_json::json;

fn anonymous(backend: &MockBackend) -> BackendClient {
    BackendClient::new(&backend.config()).unwrap()
}

fn input(name: &str, price: i64) -> MenuItemInput {
    MenuItemInput {
        name: name.to_string(),
        description: "House special".to_string(),
        price: Price::from(price),
        category: "Snacks".to_string(),
        image_url: String::new(),
    }
}

// ============================================================================
// Shops and menus
// ============================================================================

#[tokio::test]
async fn test_list_shops_is_cached() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        "/api/getAllShops",
        Reply::json(json!([shop_json(1, "Canteen", true), shop_json(2, "Juice Bar", false)])),
    );
    let client = anonymous(&backend);

    let shops = client.list_shops().await.unwrap();
    assert_eq!(shops.len(), 2);
    assert_eq!(shops[0].id, ShopId::new("1"));
    assert!(!shops[1].is_open);

    client.list_shops().await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/api/getAllShops"), 1);

    client.invalidate_all().await;
    client.list_shops().await.unwrap();
    assert_eq!(backend.hits(&Method::GET, "/api/getAllShops"), 2);
}

#[tokio::test]
async fn test_menu_cache_invalidated_by_owner_edits() {
    let backend = MockBackend::start().await;
    let path = "/api/shop/1/getAllMenuItems";
    backend.on(
        Method::GET,
        path,
        Reply::json(json!({"items": [menu_item_json("m1", 1, "Samosa", "15.00", "Snacks")]})),
    );
    backend.on(Method::POST, "/api/shop/1/addMenuItem", Reply::ok());
    backend.on(Method::DELETE, "/api/shop/1/deleteMenuItem/m1", Reply::ok());

    let shop = ShopId::new("1");
    let state = backend.client_state();
    let shopper = state.client();
    state.sign_in(&owner_token(3)).unwrap();
    let owner = state.client();

    let items = shopper.list_menu_items(&shop).await.unwrap();
    assert_eq!(items[0].price, Price::from(15));
    shopper.list_menu_items(&shop).await.unwrap();
    assert_eq!(backend.hits(&Method::GET, path), 1);

    // Both clients come from one state and share its cache.
    owner.add_menu_item(&shop, &input("Vada Pav", 20)).await.unwrap();
    shopper.list_menu_items(&shop).await.unwrap();
    assert_eq!(backend.hits(&Method::GET, path), 2);

    let body = backend
        .last_request(&Method::POST, "/api/shop/1/addMenuItem")
        .unwrap()
        .json();
    assert_eq!(body["name"], "Vada Pav");
    assert_eq!(body["category"], "Snacks");

    owner
        .delete_menu_item(&shop, &MenuItemId::new("m1"))
        .await
        .unwrap();
    shopper.list_menu_items(&shop).await.unwrap();
    assert_eq!(backend.hits(&Method::GET, path), 3);
}

#[tokio::test]
async fn test_owner_calls_need_a_token() {
    let backend = MockBackend::start().await;
    let client = anonymous(&backend);

    let err = client
        .add_menu_item(&ShopId::new("1"), &input("Tea", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    let err = client
        .toggle_shop_status(&ShopId::new("1"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    // Rejected locally: nothing reached the backend.
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_toggle_shop_status_sends_flag_and_bearer() {
    let backend = MockBackend::start().await;
    backend.on(Method::PUT, "/api/shop/1/toggle-status", Reply::ok());
    let token = owner_token(3);
    let client = backend.signed_in(&token).client();

    client
        .toggle_shop_status(&ShopId::new("1"), false)
        .await
        .unwrap();

    let request = backend
        .last_request(&Method::PUT, "/api/shop/1/toggle-status")
        .unwrap();
    assert_eq!(request.bearer(), Some(token.as_str()));
    assert_eq!(request.json(), json!({"is_open": false}));
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        "/api/shop/north%20block",
        Reply::json(shop_json(9, "North Block", true)),
    );

    let shop = anonymous(&backend)
        .get_shop(&ShopId::new("north block"))
        .await
        .unwrap();
    assert_eq!(shop.name, "North Block");
}

#[tokio::test]
async fn test_payment_details_and_profile() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        "/api/shop/1/payment-details",
        Reply::json(json!({"methods": [
            {"type": "UPI", "details": ["canteen@upi"]},
            {"type": "Bank Transfer", "details": ["A/C 0001", "IFSC CAMP0001"]}
        ]})),
    );
    backend.on(
        Method::GET,
        "/api/profile",
        Reply::json(json!({"user": {"id": 3, "role": "shop_owner", "shop_id": 1, "is_verified": 1}})),
    );

    let client = backend.signed_in(&owner_token(3)).client();
    let methods = client
        .shop_payment_details(&ShopId::new("1"))
        .await
        .unwrap();
    assert_eq!(methods[0].kind, "UPI");
    assert_eq!(methods[1].details.len(), 2);

    let profile = client.profile().await.unwrap();
    assert_eq!(profile.shop_id, Some(ShopId::new("1")));
    assert!(profile.is_verified);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_user_orders_are_filtered_by_token_id() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        "/api/listUserOrders",
        Reply::json(json!({"orders": [order_json(1, "Pending", "pending", "45.00")]})),
    );

    let orders = backend
        .signed_in(&customer_token(7))
        .client()
        .list_user_orders()
        .await
        .unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Pending);
    let request = backend
        .last_request(&Method::GET, "/api/listUserOrders")
        .unwrap();
    assert_eq!(request.query.as_deref(), Some("id=7"));
}

#[tokio::test]
async fn test_status_update_bodies() {
    let backend = MockBackend::start().await;
    backend.on(Method::PUT, "/api/updateOrderStatus/1", Reply::ok());
    backend.on(Method::PUT, "/api/updatePaymentStatus/p9", Reply::ok());
    let client = backend.signed_in(&owner_token(3)).client();

    client
        .update_order_status(&OrderId::new("1"), OrderStatus::Preparing)
        .await
        .unwrap();
    client
        .update_payment_status(&PaymentId::new("p9"), PaymentStatus::Verified)
        .await
        .unwrap();

    let order = backend
        .last_request(&Method::PUT, "/api/updateOrderStatus/1")
        .unwrap();
    assert_eq!(order.json(), json!({"status": "preparing"}));

    let payment = backend
        .last_request(&Method::PUT, "/api/updatePaymentStatus/p9")
        .unwrap();
    assert_eq!(payment.json(), json!({"paymentId": "p9", "status": "verified"}));
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_error_statuses_map_to_variants() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        "/api/shop/1",
        Reply::status(429, json!({"message": "slow down"})).with_header(header::RETRY_AFTER, "7"),
    );
    backend.on(
        Method::GET,
        "/api/shop/2",
        Reply::status(401, json!({"message": "jwt expired"})),
    );
    backend.on(
        Method::GET,
        "/api/shop/3",
        Reply::status(400, json!({"message": "Shop is closed"})),
    );
    let client = anonymous(&backend);

    let err = client.get_shop(&ShopId::new("1")).await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(7)));
    assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(7)));

    let err = client.get_shop(&ShopId::new("2")).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    let err = client.get_shop(&ShopId::new("3")).await.unwrap_err();
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Shop is closed");
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    let err = client.get_shop(&ShopId::new("404")).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(path) if path == "/api/shop/404"));
}

#[tokio::test]
async fn test_unparseable_body_is_a_parse_error() {
    let backend = MockBackend::start().await;
    backend.on(Method::GET, "/api/getAllShops", Reply::json(json!({"shops": "nope"})));

    let err = anonymous(&backend).list_shops().await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}
