//! Checkout with manual payment verification.
//!
//! The shopper pays the shop out of band, uploads a screenshot of the
//! payment, and submits it with the cart. The backend creates the order
//! once the screenshot is accepted. Only then are the submitted lines
//! taken out of the cart; anything added while the request was in flight
//! stays.

use campick_core::{CartLineItem, Price, ShopId};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, BackendClient, PaymentMethod, PaymentRequest, UploadedImage};
use crate::cart::CartStore;
use crate::error::add_breadcrumb;

/// Shown when the backend declines a submission without saying why.
const DEFAULT_REJECTION: &str = "Verification failed. Please try again.";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please upload a payment screenshot")]
    MissingScreenshot,

    #[error("Please choose a payment method")]
    MissingPaymentMethod,

    /// The backend declined the payment.
    #[error("Payment rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What the shopper is about to pay for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub shop: Option<(ShopId, String)>,
    pub lines: Vec<CartLineItem>,
    pub total: Price,
    /// Distinct line items.
    pub count: usize,
    /// Units across all lines.
    pub units: u32,
}

/// Payment proof supplied by the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSubmission {
    pub screenshot_url: String,
    pub payment_method: String,
}

/// Accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlaced {
    pub shop_id: ShopId,
    pub total: Price,
    pub message: Option<String>,
}

/// Checkout flow over the shared cart.
#[derive(Debug, Clone)]
pub struct Checkout {
    cart: CartStore,
    client: BackendClient,
}

impl Checkout {
    #[must_use]
    pub const fn new(cart: CartStore, client: BackendClient) -> Self {
        Self { cart, client }
    }

    /// Current cart contents and totals.
    #[must_use]
    pub fn summary(&self) -> CheckoutSummary {
        let cart = self.cart.snapshot();
        CheckoutSummary {
            shop: cart.shop().map(|(id, name)| (id.clone(), name.to_string())),
            total: cart.total(),
            count: cart.count(),
            units: cart.units(),
            lines: cart.into_lines(),
        }
    }

    /// Payment methods of the cart's shop; the first is the default.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is no shop to pay.
    pub async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, CheckoutError> {
        let (shop_id, _) = self.cart.shop().ok_or(CheckoutError::EmptyCart)?;
        Ok(self.client.shop_payment_details(&shop_id).await?)
    }

    /// Upload a payment screenshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails.
    pub async fn upload_screenshot(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadedImage, CheckoutError> {
        Ok(self.client.upload_image(bytes, filename).await?)
    }

    /// Submit the cart with its payment proof.
    ///
    /// Validation runs before any request. On success the submitted lines
    /// leave the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if validation fails, the backend declines
    /// the payment, or the request fails. The cart is left intact.
    #[instrument(skip(self, submission))]
    pub async fn submit(&self, submission: &PaymentSubmission) -> Result<OrderPlaced, CheckoutError> {
        let cart = self.cart.snapshot();
        let Some((shop_id, _)) = cart.shop() else {
            return Err(CheckoutError::EmptyCart);
        };
        let shop_id = shop_id.clone();

        let screenshot_url = submission.screenshot_url.trim();
        if screenshot_url.is_empty() {
            return Err(CheckoutError::MissingScreenshot);
        }
        let payment_method = submission.payment_method.trim();
        if payment_method.is_empty() {
            return Err(CheckoutError::MissingPaymentMethod);
        }

        let total = cart.total();
        let request = PaymentRequest {
            payment_screenshot_url: screenshot_url.to_string(),
            shop_id: shop_id.clone(),
            amount: total.amount(),
            payment_method: payment_method.to_string(),
            items: cart.into_lines(),
        };

        let verdict = match self.client.verify_payment_and_create_order(&request).await {
            Ok(verdict) => verdict,
            Err(ApiError::Api { message, .. }) => return Err(CheckoutError::Rejected(message)),
            Err(e) => return Err(e.into()),
        };

        if !verdict.is_success() {
            warn!(status = %verdict.status, "Payment verification declined");
            return Err(CheckoutError::Rejected(
                verdict
                    .message
                    .unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
            ));
        }

        self.cart.settle(&request.items);
        add_breadcrumb("checkout", "Order placed", Some(&[("shop_id", shop_id.as_str())]));
        info!(shop_id = %shop_id, total = %total, "Order placed");

        Ok(OrderPlaced {
            shop_id,
            total,
            message: verdict.message,
        })
    }
}
