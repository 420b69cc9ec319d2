//! Live order notifications.
//!
//! Owners follow their shop's channel; shoppers follow the global one.
//! Every notification prints a toast and refreshes the order list. A
//! dropped connection is retried until Ctrl-C.

#![allow(clippy::print_stdout)]

use std::sync::Arc;
use std::time::Duration;

use campick_core::ShopId;
use campick_storefront::auth::Surface;
use campick_storefront::notifications::{NotificationBridge, Refetch, Subscription};
use campick_storefront::orders::OrderScope;
use campick_storefront::state::ClientState;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::{CliError, owner_shop, session};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How often to check whether the bridge task has ended.
const LIVENESS_INTERVAL: Duration = Duration::from_millis(500);

/// Follow notifications until Ctrl-C.
pub async fn watch(state: &ClientState, shop: Option<ShopId>) -> Result<(), CliError> {
    let session = session(state)?;
    let (subscription, scope) = match session.surface() {
        Surface::OwnerDashboard => {
            let shop = owner_shop(state, shop).await?;
            (Subscription::Shop(shop.clone()), OrderScope::Shop(shop))
        }
        Surface::Storefront | Surface::SignIn => (Subscription::Global, OrderScope::Customer),
    };

    let view = Arc::new(state.orders_view(scope));
    view.refresh().await?;
    println!(
        "Watching {} order(s), {} open. Press Ctrl-C to stop.",
        view.orders().len(),
        view.pending_count()
    );

    let transport = state.push_transport()?;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let events = match transport.connect(&subscription, Some(session.token())).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Push channel unavailable, retrying");
                tokio::select! {
                    _ = &mut shutdown => return Ok(()),
                    () = tokio::time::sleep(RECONNECT_DELAY) => continue,
                }
            }
        };

        let bridge = NotificationBridge::new(subscription.clone());
        let mut toasts = bridge.subscribe();
        let handle = bridge.spawn(events, view.clone());
        let mut liveness = tokio::time::interval(LIVENESS_INTERVAL);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    handle.shutdown();
                    return Ok(());
                }
                toast = toasts.recv() => match toast {
                    Ok(toast) => println!("{toast}"),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed notifications"),
                    Err(RecvError::Closed) => break,
                },
                _ = liveness.tick() => {
                    if handle.is_finished() {
                        break;
                    }
                }
            }
        }

        info!("Push channel closed, reconnecting");
        // Catch up on anything sent while disconnected.
        view.refetch().await;
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            () = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }
}
