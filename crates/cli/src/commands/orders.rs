//! Order listing, status updates and reorder.
//!
//! Owners see their shop's orders; shoppers see their own.

#![allow(clippy::print_stdout)]

use campick_core::{OrderId, OrderStatus, PaymentStatus, ShopId};
use campick_storefront::api::{BackendClient, OrderDetails};
use campick_storefront::auth::Surface;
use campick_storefront::orders::{self, OrderScope, OrdersView};
use campick_storefront::state::ClientState;

use super::{CliError, owner_session, owner_shop, session};

/// List orders, newest first as the backend returns them.
pub async fn list(
    state: &ClientState,
    status: Option<OrderStatus>,
    shop: Option<ShopId>,
) -> Result<(), CliError> {
    let view = view(state, shop).await?;
    view.refresh().await?;

    let orders = match status {
        Some(status) => view.by_status(status),
        None => view.orders(),
    };
    if orders.is_empty() {
        println!("No orders.");
        return Ok(());
    }

    for order in &orders {
        print_row(order);
    }
    if matches!(view.scope(), OrderScope::Shop(_)) {
        println!("{} order(s) waiting on you.", view.pending_count());
    }
    Ok(())
}

/// Print one order with its line items.
pub async fn show(state: &ClientState, order_id: &OrderId) -> Result<(), CliError> {
    session(state)?;
    let order = state.client().order_details(order_id).await?;

    print_row(&order);
    if let Some(name) = &order.user_name {
        let email = order.email.as_deref().unwrap_or("");
        println!("Customer: {name} {email}");
    }
    for item in &order.items {
        println!(
            "  {:<30} {:>3} x {}",
            item.item_name, item.quantity, item.price
        );
    }
    Ok(())
}

/// Set an order's status.
pub async fn set_status(
    state: &ClientState,
    order_id: &OrderId,
    status: OrderStatus,
    shop: Option<ShopId>,
) -> Result<(), CliError> {
    let shop = owner_shop(state, shop).await?;
    let view = state.orders_view(OrderScope::Shop(shop));
    view.update_status(order_id, status).await?;

    match view.get(order_id) {
        Some(order) => print_row(&order),
        None => println!("Order {order_id} set to {status}."),
    }
    Ok(())
}

/// Set an order's payment status.
pub async fn set_payment_status(
    state: &ClientState,
    order_id: &OrderId,
    status: PaymentStatus,
    shop: Option<ShopId>,
) -> Result<(), CliError> {
    let shop = owner_shop(state, shop).await?;
    let view = state.orders_view(OrderScope::Shop(shop));
    // Load the listing first so the payment id comes from cache.
    view.refresh().await?;
    view.update_payment_status(order_id, status).await?;

    match view.get(order_id) {
        Some(order) => print_row(&order),
        None => println!("Payment for order {order_id} set to {status}."),
    }
    Ok(())
}

/// Show who paid for an order and the screenshot they sent.
pub async fn payment_proof(state: &ClientState, order_id: &OrderId) -> Result<(), CliError> {
    owner_session(state)?;
    let proof = state.client().payment_proof(order_id).await?;

    println!("Payment:    {}", proof.payment_id);
    if let Some(name) = &proof.customer_name {
        match &proof.role {
            Some(role) => println!("Customer:   {name} ({role})"),
            None => println!("Customer:   {name}"),
        }
    }
    println!("Method:     {}", proof.method.as_deref().unwrap_or("-"));
    match &proof.screenshot_url {
        Some(url) => println!("Screenshot: {url}"),
        None => println!("No screenshot was uploaded."),
    }
    Ok(())
}

/// Copy a past order into the cart at today's prices.
pub async fn reorder(state: &ClientState, order_id: &OrderId) -> Result<(), CliError> {
    session(state)?;
    let client = state.client();
    let order = client.order_details(order_id).await?;

    let outcome = orders::reorder(&client, state.cart(), &order).await?;
    if outcome.added == 0 {
        println!("None of those items are on the menu anymore.");
        return Ok(());
    }

    println!(
        "Added {} item(s). Cart total {}",
        outcome.added,
        state.cart().total()
    );
    if !outcome.unavailable.is_empty() {
        println!("No longer available: {}", outcome.unavailable.join(", "));
    }
    Ok(())
}

/// An orders view scoped to the session's role.
async fn view(
    state: &ClientState,
    shop: Option<ShopId>,
) -> Result<OrdersView<BackendClient>, CliError> {
    let scope = match session(state)?.surface() {
        Surface::OwnerDashboard => OrderScope::Shop(owner_shop(state, shop).await?),
        Surface::Storefront | Surface::SignIn => OrderScope::Customer,
    };
    Ok(state.orders_view(scope))
}

fn print_row(order: &OrderDetails) {
    println!(
        "{:>6}  {:<10} payment {:<9} {:>10}  {}",
        order.order_id.as_str(),
        order.status.as_str(),
        order.payment_status.as_str(),
        order.total_price.to_string(),
        order.created_at
    );
}
