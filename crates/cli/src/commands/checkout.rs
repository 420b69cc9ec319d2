//! Checkout with a payment screenshot.

#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use campick_storefront::checkout::{CheckoutError, PaymentSubmission};
use campick_storefront::state::ClientState;

use super::{CliError, session};

/// Where the payment screenshot comes from.
#[derive(Debug)]
pub enum Proof {
    /// Upload this file first.
    File(PathBuf),
    /// Already uploaded.
    Url(String),
    None,
}

/// Show the summary, upload the proof and submit the order.
pub async fn checkout(
    state: &ClientState,
    proof: Proof,
    method: Option<String>,
) -> Result<(), CliError> {
    session(state)?;
    let checkout = state.checkout();

    let summary = checkout.summary();
    let Some((_, shop_name)) = &summary.shop else {
        return Err(CheckoutError::EmptyCart.into());
    };
    println!(
        "Paying {shop_name} {} for {} unit(s).",
        summary.total, summary.units
    );

    let payment_method = match method {
        Some(method) => method,
        None => {
            let methods = checkout.payment_methods().await?;
            for method in &methods {
                println!("  {}: {}", method.kind, method.details.join(" / "));
            }
            methods
                .into_iter()
                .next()
                .map(|method| method.kind)
                .unwrap_or_default()
        }
    };

    let screenshot_url = match proof {
        Proof::File(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| CliError::Read {
                    path: path.clone(),
                    source,
                })?;
            let filename = path.file_name().map_or_else(
                || "payment.png".to_string(),
                |name| name.to_string_lossy().into_owned(),
            );
            checkout.upload_screenshot(bytes, &filename).await?.url
        }
        Proof::Url(url) => url,
        Proof::None => String::new(),
    };

    let placed = checkout
        .submit(&PaymentSubmission {
            screenshot_url,
            payment_method,
        })
        .await?;

    println!(
        "{}",
        placed
            .message
            .as_deref()
            .unwrap_or("Order placed. The shop will confirm your payment shortly.")
    );
    Ok(())
}
