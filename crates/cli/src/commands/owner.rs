//! Owner console: menu editing, shop profile and opening hours.

#![allow(clippy::print_stdout)]

use campick_core::{MenuItemId, ShopId};
use campick_storefront::api::ShopUpdate;
use campick_storefront::console::MenuItemDraft;
use campick_storefront::state::ClientState;

use super::{CliError, owner_shop};

/// Menu item fields given on the command line; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct Draft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl Draft {
    fn apply(self, form: &mut MenuItemDraft) {
        let fields = [
            (self.name, &mut form.name),
            (self.description, &mut form.description),
            (self.price, &mut form.price),
            (self.category, &mut form.category),
            (self.image_url, &mut form.image_url),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

/// Add an item to the owner's menu.
pub async fn add_item(
    state: &ClientState,
    shop: Option<ShopId>,
    draft: Draft,
) -> Result<(), CliError> {
    let mut form = MenuItemDraft::default();
    draft.apply(&mut form);
    let input = form.validate()?;

    let shop = owner_shop(state, shop).await?;
    state.client().add_menu_item(&shop, &input).await?;
    println!("Added {} at {}.", input.name, input.price);
    Ok(())
}

/// Edit a menu item in place.
pub async fn update_item(
    state: &ClientState,
    shop: Option<ShopId>,
    item_id: &MenuItemId,
    draft: Draft,
) -> Result<(), CliError> {
    let shop = owner_shop(state, shop).await?;
    let client = state.client();

    let current = client.get_menu_item(&shop, item_id).await?;
    let mut form = MenuItemDraft::from_item(&current);
    draft.apply(&mut form);
    let input = form.validate()?;

    client.update_menu_item(&shop, item_id, &input).await?;
    println!("Updated {}.", input.name);
    Ok(())
}

/// Remove an item from the owner's menu.
pub async fn delete_item(
    state: &ClientState,
    shop: Option<ShopId>,
    item_id: &MenuItemId,
) -> Result<(), CliError> {
    let shop = owner_shop(state, shop).await?;
    state.client().delete_menu_item(&shop, item_id).await?;
    println!("Deleted item {item_id}.");
    Ok(())
}

/// Open or close the owner's shop.
pub async fn set_open(
    state: &ClientState,
    shop: Option<ShopId>,
    is_open: bool,
) -> Result<(), CliError> {
    let shop = owner_shop(state, shop).await?;
    state.client().toggle_shop_status(&shop, is_open).await?;
    if is_open {
        println!("Shop {shop} is open for orders.");
    } else {
        println!("Shop {shop} is closed.");
    }
    Ok(())
}

/// Edit the shop's profile and payout details.
pub async fn edit_shop(
    state: &ClientState,
    shop: Option<ShopId>,
    update: ShopUpdate,
) -> Result<(), CliError> {
    if update.is_empty() {
        return Err(CliError::Usage("Nothing to change; pass at least one field.".to_string()));
    }
    let shop = owner_shop(state, shop).await?;
    state.client().update_shop(&shop, &update).await?;
    println!("Shop {shop} updated.");
    Ok(())
}
