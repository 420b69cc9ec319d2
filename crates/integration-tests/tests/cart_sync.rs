//! Two clients sharing one storage file converge on the same cart and
//! session.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use campick_core::{MenuItemId, Price, ShopId};
use campick_integration_tests::{MockBackend, Reply, customer_token, menu_item_json, shop_json};
use campick_storefront::auth::AuthState;
use campick_storefront::cart::CartEvent;
use campick_storefront::state::ClientState;
use serde_json::json;
use tempfile::TempDir;

fn open(backend: &MockBackend, dir: &TempDir) -> ClientState {
    let mut config = backend.config();
    config.storage_dir = dir.path().to_path_buf();
    ClientState::open(config).unwrap()
}

#[tokio::test]
async fn test_second_client_sees_cart_after_reload() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        "/api/shop/1",
        Reply::json(shop_json(1, "Canteen", true)),
    );
    backend.on(
        Method::GET,
        "/api/shop/1/getAllMenuItems",
        Reply::json(json!({"items": [menu_item_json("m1", 1, "Samosa", "15.00", "Snacks")]})),
    );
    let dir = TempDir::new().unwrap();

    let first = open(&backend, &dir);
    let second = open(&backend, &dir);
    first.sign_in(&customer_token(7)).unwrap();

    let client = first.client();
    let shop = client.get_shop(&ShopId::new("1")).await.unwrap();
    let menu = client.list_menu_items(&shop.id).await.unwrap();
    first.cart().add_item(menu[0].to_line_item(&shop.name)).unwrap();
    first.cart().add_item(menu[0].to_line_item(&shop.name)).unwrap();

    // The session is read from storage on every check.
    assert!(matches!(second.auth().session(), AuthState::SignedIn(_)));
    assert_eq!(second.cart().count(), 0);

    let mut events = second.cart().subscribe();
    second.cart().reload();
    assert!(matches!(events.try_recv().unwrap(), CartEvent::Updated { count: 1 }));
    assert_eq!(second.cart().quantity_of(&MenuItemId::new("m1")), 2);
    assert_eq!(second.cart().total(), Price::from(30));
    assert_eq!(second.cart().shop().unwrap().1, "Canteen");

    // A fresh client starts from the persisted cart.
    let third = open(&backend, &dir);
    assert_eq!(third.cart().units(), 2);
}

#[tokio::test]
async fn test_sign_out_clears_shared_storage() {
    let backend = MockBackend::start().await;
    backend.on(
        Method::GET,
        "/api/shop/1/getMenuItem/m1",
        Reply::json(menu_item_json("m1", 1, "Samosa", "15.00", "Snacks")),
    );
    let dir = TempDir::new().unwrap();

    let first = open(&backend, &dir);
    let second = open(&backend, &dir);
    first.sign_in(&customer_token(7)).unwrap();
    first.cart().set_sidebar_open(true);

    let item = first
        .client()
        .get_menu_item(&ShopId::new("1"), &MenuItemId::new("m1"))
        .await
        .unwrap();
    first.cart().add_item(item.to_line_item("Canteen")).unwrap();
    second.cart().reload();
    assert_eq!(second.cart().count(), 1);

    first.sign_out();

    assert!(matches!(second.auth().session(), AuthState::SignedOut));
    second.cart().reload();
    assert_eq!(second.cart().count(), 0);
    assert!(second.cart().shop().is_none());

    let fresh = open(&backend, &dir);
    assert!(!fresh.cart().is_sidebar_open());
    assert!(fresh.auth().bearer().is_none());
}
