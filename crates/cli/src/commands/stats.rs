//! Sales dashboard for owners, order history summary for shoppers.

#![allow(clippy::print_stdout)]

use campick_core::ShopId;
use campick_storefront::api::{ShopDashboard, UserOrderStats};
use campick_storefront::auth::Surface;
use campick_storefront::state::ClientState;

use super::{CliError, owner_shop, session};

/// Print the statistics that fit the signed-in role.
pub async fn stats(state: &ClientState, shop: Option<ShopId>) -> Result<(), CliError> {
    match session(state)?.surface() {
        Surface::OwnerDashboard => {
            let shop = owner_shop(state, shop).await?;
            let dashboard = state.client().shop_dashboard(&shop).await?;
            print_dashboard(&shop, &dashboard);
        }
        Surface::Storefront => {
            let stats = state.client().order_stats().await?;
            print_order_stats(&stats);
        }
        Surface::SignIn => {
            return Err(CliError::Usage(
                "This account's role has no statistics.".to_string(),
            ));
        }
    }
    Ok(())
}

fn print_dashboard(shop: &ShopId, dashboard: &ShopDashboard) {
    let summary = &dashboard.shop_details;
    println!("Shop {shop}");
    println!("Revenue:       {}", dashboard.revenue);
    println!("Orders:        {}", summary.total_orders);
    println!("Average order: {}", summary.average_order_value);
    println!("Menu items:    {}", summary.total_menu_items);

    if !dashboard.top_selling_items.items.is_empty() {
        println!();
        println!("Top sellers");
        for item in &dashboard.top_selling_items.items {
            println!(
                "  {:<30} {:>5} sold at {}",
                item.name, item.total_quantity_sold, item.unit_price
            );
        }
    }

    if !dashboard.recent_orders.is_empty() {
        println!();
        println!("Recent orders");
        for order in &dashboard.recent_orders {
            println!(
                "  #{:<8} {:<10} {:>12}  {}",
                order.order_id.as_str(),
                order.status.to_string(),
                order.total_price.to_string(),
                order.user_name.as_deref().unwrap_or("")
            );
        }
    }

    if !dashboard.revenue_over_time.is_empty() {
        println!();
        println!("Daily revenue");
        for day in &dashboard.revenue_over_time {
            println!("  {:<12} {}", day.date, day.daily_revenue);
        }
    }
}

fn print_order_stats(stats: &UserOrderStats) {
    let totals = &stats.order_stats;
    println!("Orders:    {}", totals.total_orders);
    println!("Spent:     {}", totals.total_spent);
    println!("Completed: {}", totals.completed_orders);
    println!("Active:    {}", totals.active_orders);
    println!("Cancelled: {}", totals.cancelled_orders);

    if !stats.frequent_shops.is_empty() {
        println!();
        println!("Favourite shops");
        for shop in &stats.frequent_shops {
            println!(
                "  {:<30} {:>3} order(s), {}",
                shop.shop_name, shop.order_count, shop.total_spent_at_shop
            );
        }
    }
}
