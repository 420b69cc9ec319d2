//! CLI command implementations.

pub mod browse;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod owner;
pub mod session;
pub mod stats;
pub mod watch;

use std::path::PathBuf;

use campick_core::ShopId;
use campick_storefront::api::ApiError;
use campick_storefront::auth::{AuthState, Session, Surface, TokenError};
use campick_storefront::cart::CartError;
use campick_storefront::checkout::CheckoutError;
use campick_storefront::console::ValidationError;
use campick_storefront::error::AppError;
use campick_storefront::notifications::PushError;
use campick_storefront::orders::ReorderError;
use campick_storefront::state::ClientState;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The command does not apply to the current session or arguments.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Log the error, capturing network failures to Sentry.
    pub fn report(&self) {
        match self {
            Self::App(e) => e.report(),
            Self::Read { .. } | Self::Usage(_) => tracing::debug!(error = %self, "Command rejected"),
        }
    }

    /// Message printed to the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::App(e) => e.user_message(),
            Self::Read { .. } | Self::Usage(_) => self.to_string(),
        }
    }
}

macro_rules! from_app_error {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for CliError {
                fn from(error: $error) -> Self {
                    Self::App(AppError::from(error))
                }
            }
        )*
    };
}

from_app_error!(
    ApiError,
    CartError,
    TokenError,
    CheckoutError,
    PushError,
    ValidationError,
    ReorderError,
);

/// The live session, or `NotSignedIn`.
pub fn session(state: &ClientState) -> Result<Session, CliError> {
    match state.auth().session() {
        AuthState::SignedIn(session) => Ok(session),
        AuthState::SignedOut => Err(AppError::NotSignedIn.into()),
    }
}

/// The live session, or `Usage` unless it belongs to a shop owner.
pub fn owner_session(state: &ClientState) -> Result<Session, CliError> {
    let session = session(state)?;
    if session.surface() != Surface::OwnerDashboard {
        return Err(CliError::Usage(
            "This command is only available to shop owners.".to_string(),
        ));
    }
    Ok(session)
}

/// The shop an owner command acts on: `explicit` if given, else the shop
/// on the owner's profile, else the first shop they manage.
pub async fn owner_shop(
    state: &ClientState,
    explicit: Option<ShopId>,
) -> Result<ShopId, CliError> {
    owner_session(state)?;
    if let Some(shop) = explicit {
        return Ok(shop);
    }

    let client = state.client();
    if let Some(shop) = client.profile().await?.shop_id {
        return Ok(shop);
    }
    client
        .owner_shops()
        .await?
        .into_iter()
        .next()
        .map(|shop| shop.id)
        .ok_or_else(|| CliError::Usage("You have no shop yet; pass --shop <ID>.".to_string()))
}
