//! Shop and menu browsing.

#![allow(clippy::print_stdout)]

use campick_core::ShopId;
use campick_storefront::console::{ALL_CATEGORIES, MenuCatalog};
use campick_storefront::state::ClientState;

use super::CliError;

/// List every shop with its open flag.
pub async fn shops(state: &ClientState) -> Result<(), CliError> {
    let shops = state.client().list_shops().await?;
    if shops.is_empty() {
        println!("No shops yet.");
        return Ok(());
    }

    for shop in shops {
        let status = if shop.is_open { "open" } else { "closed" };
        println!("{:>6}  {:<30} {status}", shop.id.as_str(), shop.name);
    }
    Ok(())
}

/// Print a shop's menu, optionally narrowed to one category.
pub async fn menu(
    state: &ClientState,
    shop_id: &ShopId,
    category: Option<&str>,
) -> Result<(), CliError> {
    let client = state.client();
    let shop = client.get_shop(shop_id).await?;
    let items = client.list_menu_items(shop_id).await?;
    state.select_shop(&shop);

    let catalog = MenuCatalog::new(shop, items);
    println!("{}", catalog.shop().name);
    if !catalog.shop().description.is_empty() {
        println!("{}", catalog.shop().description);
    }
    if !catalog.can_order() {
        println!("This shop is closed and is not taking orders right now.");
    }
    println!("Categories: {}", catalog.categories().join(", "));
    println!();

    let category = category.unwrap_or(ALL_CATEGORIES);
    let items = catalog.filter(category);
    if items.is_empty() {
        println!("Nothing in {category}.");
        return Ok(());
    }

    let cart = state.cart();
    for item in items {
        let in_cart = cart.quantity_of(&item.item_id);
        let marker = if in_cart > 0 {
            format!("  (x{in_cart} in cart)")
        } else {
            String::new()
        };
        println!(
            "{:>6}  {:<30} {:>8}{marker}",
            item.item_id.as_str(),
            item.name,
            item.price.to_string()
        );
    }
    Ok(())
}
