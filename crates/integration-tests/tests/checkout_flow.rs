//! Cart to order: payment methods, screenshot upload and verification.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::Method;
use campick_core::{MenuItemId, Price, ShopId};
use campick_integration_tests::{MockBackend, Reply, customer_token, menu_item_json, shop_json};
use campick_storefront::checkout::{CheckoutError, PaymentSubmission};
use campick_storefront::state::ClientState;
use serde_json::json;

const VERIFY: &str = "/api/verifyPaymentAndCreateOrder";

/// A signed-in shopper with two samosas and a tea from shop 1 in the cart.
async fn shopper_with_cart(backend: &MockBackend) -> ClientState {
    backend.on(
        Method::GET,
        "/api/shop/1",
        Reply::json(shop_json(1, "Canteen", true)),
    );
    backend.on(
        Method::GET,
        "/api/shop/1/getAllMenuItems",
        Reply::json(json!({"items": [
            menu_item_json("m1", 1, "Samosa", "15.00", "Snacks"),
            menu_item_json("m2", 1, "Masala Tea", "12.50", "Drinks"),
        ]})),
    );

    let state = backend.signed_in(&customer_token(7));
    let client = state.client();
    let shop = client.get_shop(&ShopId::new("1")).await.unwrap();
    let menu = client.list_menu_items(&shop.id).await.unwrap();

    let samosa = menu[0].to_line_item(&shop.name);
    let tea = menu[1].to_line_item(&shop.name);
    state.cart().add_item(samosa.clone()).unwrap();
    state.cart().add_item(samosa).unwrap();
    state.cart().add_item(tea).unwrap();
    state
}

fn submission(url: &str) -> PaymentSubmission {
    PaymentSubmission {
        screenshot_url: url.to_string(),
        payment_method: "UPI".to_string(),
    }
}

#[tokio::test]
async fn test_successful_checkout_empties_cart() {
    let backend = MockBackend::start().await;
    let state = shopper_with_cart(&backend).await;
    backend.on(
        Method::POST,
        "/api/imageupload",
        Reply::json(json!({"data": {"url": "https://img.campick.test/pay-1.png"}})),
    );
    backend.on(
        Method::POST,
        VERIFY,
        Reply::json(json!({"status": "success", "message": "Order placed"})),
    );

    let checkout = state.checkout();
    let summary = checkout.summary();
    assert_eq!(summary.total, "42.50".parse::<Price>().unwrap());
    assert_eq!(summary.count, 2);
    assert_eq!(summary.units, 3);

    let uploaded = checkout
        .upload_screenshot(b"\x89PNG fake".to_vec(), "pay.png")
        .await
        .unwrap();
    let placed = checkout.submit(&submission(&uploaded.url)).await.unwrap();

    assert_eq!(placed.shop_id, ShopId::new("1"));
    assert_eq!(placed.message.as_deref(), Some("Order placed"));
    assert_eq!(state.cart().count(), 0);

    let upload = backend
        .last_request(&Method::POST, "/api/imageupload")
        .unwrap();
    assert!(upload.text().contains(r#"name="image""#));
    assert!(upload.text().contains(r#"filename="pay.png""#));

    let body = backend.last_request(&Method::POST, VERIFY).unwrap().json();
    assert_eq!(body["payment_screenshot_url"], "https://img.campick.test/pay-1.png");
    assert_eq!(body["shop_id"], "1");
    assert_eq!(body["payment_method"], "UPI");
    assert_eq!(body["amount"].as_f64(), Some(42.5));
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["item_id"], "m1");
    assert_eq!(body["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_items_added_during_submit_stay_in_cart() {
    let backend = MockBackend::start().await;
    let state = shopper_with_cart(&backend).await;
    backend.on(
        Method::POST,
        VERIFY,
        Reply::json(json!({"status": "success"})).after(Duration::from_millis(300)),
    );

    let client = state.client();
    let menu = client.list_menu_items(&ShopId::new("1")).await.unwrap();
    let tea = menu[1].to_line_item("Canteen");

    let checkout = state.checkout();
    let add_later = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        state.cart().add_item(tea).unwrap();
    };
    let sub = submission("https://img.campick.test/pay.png");
    let (placed, ()) = tokio::join!(
        checkout.submit(&sub),
        add_later
    );

    assert_eq!(placed.unwrap().total, "42.50".parse::<Price>().unwrap());
    let body = backend.last_request(&Method::POST, VERIFY).unwrap().json();
    assert_eq!(body["items"][1]["quantity"], 1);

    // Only the submitted lines left; the tea added mid-flight is still there.
    assert_eq!(state.cart().count(), 1);
    assert_eq!(state.cart().quantity_of(&MenuItemId::new("m1")), 0);
    assert_eq!(state.cart().quantity_of(&MenuItemId::new("m2")), 1);
}

#[tokio::test]
async fn test_declined_payment_keeps_cart() {
    let backend = MockBackend::start().await;
    let state = shopper_with_cart(&backend).await;
    backend.on(
        Method::POST,
        VERIFY,
        Reply::json(json!({"status": "failed", "message": "Screenshot is unreadable"})),
    );

    let err = state
        .checkout()
        .submit(&submission("https://img.campick.test/blurry.png"))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Rejected(ref m) if m == "Screenshot is unreadable"));
    assert_eq!(state.cart().count(), 2);
    assert_eq!(state.cart().units(), 3);
}

#[tokio::test]
async fn test_backend_error_message_becomes_rejection() {
    let backend = MockBackend::start().await;
    let state = shopper_with_cart(&backend).await;
    backend.on(
        Method::POST,
        VERIFY,
        Reply::status(400, json!({"message": "Shop is closed"})),
    );

    let err = state
        .checkout()
        .submit(&submission("https://img.campick.test/pay.png"))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Rejected(ref m) if m == "Shop is closed"));
    assert_eq!(state.cart().count(), 2);
}

#[tokio::test]
async fn test_validation_runs_before_any_request() {
    let backend = MockBackend::start().await;
    let state = shopper_with_cart(&backend).await;
    let before = backend.requests().len();

    let err = state.checkout().submit(&submission(" ")).await.unwrap_err();

    assert!(matches!(err, CheckoutError::MissingScreenshot));
    assert_eq!(backend.requests().len(), before);
    assert_eq!(backend.hits(&Method::POST, VERIFY), 0);
}

#[tokio::test]
async fn test_payment_methods_come_from_cart_shop() {
    let backend = MockBackend::start().await;
    let state = shopper_with_cart(&backend).await;
    backend.on(
        Method::GET,
        "/api/shop/1/payment-details",
        Reply::json(json!({"methods": [{"type": "UPI", "details": ["canteen@upi"]}]})),
    );

    let methods = state.checkout().payment_methods().await.unwrap();
    assert_eq!(methods[0].kind, "UPI");

    state.cart().empty_cart();
    let err = state.checkout().payment_methods().await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}
