//! Cart commands.
//!
//! The cart lives in client storage, so it survives between invocations
//! and is shared with any other process using the same storage directory.

#![allow(clippy::print_stdout)]

use campick_core::{AddOutcome, CartLineItem, MenuItemId, RemoveOutcome, ShopId};
use campick_storefront::cart::CartError;
use campick_storefront::error::CROSS_SHOP_MESSAGE;
use campick_storefront::state::ClientState;

use super::CliError;

/// Print the cart with its totals.
pub fn show(state: &ClientState) {
    let cart = state.cart().snapshot();
    let Some((_, shop_name)) = cart.shop() else {
        println!("Your cart is empty.");
        return;
    };

    println!("Cart from {shop_name}");
    for line in cart.lines() {
        println!(
            "{:>6}  {:<30} {:>3} x {:>10} = {}",
            line.item_id.as_str(),
            line.name,
            line.quantity,
            line.price.to_string(),
            line.line_total()
        );
    }
    println!(
        "{} item(s), {} unit(s), total {}",
        cart.count(),
        cart.units(),
        cart.total()
    );
}

/// Add `quantity` units of a menu item.
pub async fn add(
    state: &ClientState,
    shop_id: &ShopId,
    item_id: &MenuItemId,
    quantity: u32,
) -> Result<(), CliError> {
    let line = fetch_line(state, shop_id, item_id).await?;
    let cart = state.cart();

    for _ in 0..quantity.max(1) {
        match cart.add_item(line.clone()) {
            Ok(AddOutcome::Appended | AddOutcome::Incremented { .. }) => {}
            Err(CartError::CrossShop(conflict)) => {
                return Err(CliError::Usage(format!(
                    "{CROSS_SHOP_MESSAGE} Your cart holds items from {}; \
                     run `campick cart replace {shop_id} {item_id}` to start over.",
                    conflict.cart_shop_name
                )));
            }
        }
    }

    println!(
        "{} x{} in cart. Total {}",
        line.name,
        cart.quantity_of(item_id),
        cart.total()
    );
    Ok(())
}

/// Remove one unit of an item.
pub fn remove(state: &ClientState, item_id: &MenuItemId) {
    match state.cart().remove_item(item_id) {
        RemoveOutcome::Decremented { quantity } => println!("{quantity} left in cart."),
        RemoveOutcome::Removed => println!("Removed from cart."),
        RemoveOutcome::Absent => println!("That item is not in your cart."),
    }
}

/// Remove every item.
pub fn empty(state: &ClientState) {
    state.cart().empty_cart();
    println!("Cart emptied.");
}

/// Empty the cart and add one unit of an item, whatever shop it is from.
pub async fn replace(
    state: &ClientState,
    shop_id: &ShopId,
    item_id: &MenuItemId,
) -> Result<(), CliError> {
    let line = fetch_line(state, shop_id, item_id).await?;
    state.cart().replace_with(line.clone());
    println!("Cart now holds {} from {}.", line.name, line.shop_name);
    Ok(())
}

/// Load an item at its current price, refusing closed shops.
async fn fetch_line(
    state: &ClientState,
    shop_id: &ShopId,
    item_id: &MenuItemId,
) -> Result<CartLineItem, CliError> {
    let client = state.client();
    let shop = client.get_shop(shop_id).await?;
    if !shop.is_open {
        return Err(CliError::Usage(format!(
            "{} is closed and is not taking orders right now.",
            shop.name
        )));
    }

    let item = client.get_menu_item(shop_id, item_id).await?;
    Ok(item.to_line_item(&shop.name))
}
