//! Unified error handling with Sentry integration.
//!
//! Every module has its own error enum. `AppError` unifies them for callers
//! that surface failures to the user, classifying each into one of four
//! kinds that decide how it is shown:
//!
//! - **Network**: backend or transport failure; transient toast, no retry
//! - **Validation**: caught before any request; shown inline
//! - **Auth**: missing or expired token; treated as signed out
//! - **Storage**: durable storage unavailable; the session carries on in memory
//!
//! Only network errors are captured to Sentry.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::TokenError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::console::ValidationError;
use crate::notifications::PushError;
use crate::orders::ReorderError;
use crate::storage::StorageError;

/// Message shown when a cart add would mix shops.
pub const CROSS_SHOP_MESSAGE: &str = "You can only add items from the same shop.";

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// How an error is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Validation,
    Auth,
    Storage,
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Push channel error: {0}")]
    Push(#[from] PushError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Reorder error: {0}")]
    Reorder(#[from] ReorderError),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,
}

impl AppError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Cart(_) | Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Token(_) | Self::NotSignedIn => ErrorKind::Auth,
            Self::Api(e) => api_kind(e),
            Self::Checkout(e) => match e {
                CheckoutError::EmptyCart
                | CheckoutError::MissingScreenshot
                | CheckoutError::MissingPaymentMethod => ErrorKind::Validation,
                CheckoutError::Rejected(_) => ErrorKind::Network,
                CheckoutError::Api(e) => api_kind(e),
            },
            Self::Push(_) => ErrorKind::Network,
            Self::Reorder(e) => match e {
                ReorderError::Cart(_) | ReorderError::ShopClosed(_) => ErrorKind::Validation,
                ReorderError::Api(e) => api_kind(e),
                ReorderError::MissingShop(_) => ErrorKind::Network,
            },
        }
    }

    /// Short message suitable for a toast or inline form error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cart(CartError::CrossShop(_))
            | Self::Reorder(ReorderError::Cart(CartError::CrossShop(_))) => {
                CROSS_SHOP_MESSAGE.to_string()
            }
            Self::Validation(e) => e.to_string(),
            Self::Reorder(e @ ReorderError::ShopClosed(_)) => e.to_string(),
            Self::Checkout(CheckoutError::Rejected(message)) => message.clone(),
            Self::Checkout(CheckoutError::Api(e)) | Self::Api(e) => api_message(e),
            Self::Checkout(e) => e.to_string(),
            Self::Storage(_) => "Could not save your changes on this device.".to_string(),
            Self::Config(e) => e.to_string(),
            _ if self.kind() == ErrorKind::Auth => "Please sign in again.".to_string(),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }

    /// Log the error, capturing network failures to Sentry.
    pub fn report(&self) {
        match self.kind() {
            ErrorKind::Network => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request failed"
                );
            }
            ErrorKind::Storage => tracing::warn!(error = %self, "Storage degraded"),
            ErrorKind::Auth | ErrorKind::Validation => tracing::debug!(error = %self, "Rejected"),
        }
    }
}

const fn api_kind(error: &ApiError) -> ErrorKind {
    match error {
        ApiError::Unauthorized => ErrorKind::Auth,
        _ => ErrorKind::Network,
    }
}

fn api_message(error: &ApiError) -> String {
    match error {
        ApiError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
        ApiError::RateLimited(secs) => format!("Too many requests. Try again in {secs} seconds."),
        ApiError::NotFound(_) => "That item no longer exists.".to_string(),
        ApiError::Unauthorized => "Please sign in again.".to_string(),
        _ => GENERIC_MESSAGE.to_string(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after sign in to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
