//! Owner console and menu browsing helpers.

use std::collections::HashSet;
use std::str::FromStr;

use campick_core::Price;
use thiserror::Error;

use crate::api::{MenuItem, MenuItemInput, Shop};

/// Pseudo-category that lists every item.
pub const ALL_CATEGORIES: &str = "All";

/// Form validation errors, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("price must be a positive amount, got {0:?}")]
    InvalidPrice(String),
}

/// Menu item form as typed by the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItemDraft {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub image_url: String,
}

impl MenuItemDraft {
    /// Prefill the form from an existing item.
    #[must_use]
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.amount().to_string(),
            category: item.category.clone(),
            image_url: item.image_url.clone(),
        }
    }

    /// Check the form and build the request body.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name, description or price is
    /// missing, or the price is not a positive number.
    pub fn validate(&self) -> Result<MenuItemInput, ValidationError> {
        let name = required("name", &self.name)?;
        let description = required("description", &self.description)?;
        let raw_price = required("price", &self.price)?;

        let price = Price::from_str(raw_price)
            .ok()
            .filter(|price| price.amount().is_sign_positive() && !price.is_zero())
            .ok_or_else(|| ValidationError::InvalidPrice(raw_price.to_string()))?;

        Ok(MenuItemInput {
            name: name.to_string(),
            description: description.to_string(),
            price,
            category: self.category.trim().to_string(),
            image_url: self.image_url.trim().to_string(),
        })
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}

/// A shop's menu as shown on the storefront.
#[derive(Debug, Clone)]
pub struct MenuCatalog {
    shop: Shop,
    items: Vec<MenuItem>,
}

impl MenuCatalog {
    #[must_use]
    pub const fn new(shop: Shop, items: Vec<MenuItem>) -> Self {
        Self { shop, items }
    }

    #[must_use]
    pub const fn shop(&self) -> &Shop {
        &self.shop
    }

    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// `"All"` followed by each category in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(
                self.items
                    .iter()
                    .map(|item| item.category.trim())
                    .filter(|category| !category.is_empty() && seen.insert(*category))
                    .map(str::to_string),
            )
            .collect()
    }

    /// Items in `category`; `"All"` lists everything.
    #[must_use]
    pub fn filter(&self, category: &str) -> Vec<&MenuItem> {
        if category == ALL_CATEGORIES {
            return self.items.iter().collect();
        }
        self.items
            .iter()
            .filter(|item| item.category.trim() == category)
            .collect()
    }

    /// Whether the shop is accepting orders.
    #[must_use]
    pub const fn can_order(&self) -> bool {
        self.shop.is_open
    }
}
