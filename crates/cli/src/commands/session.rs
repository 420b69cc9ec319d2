//! Sign in, sign out and session inspection.
//!
//! # Usage
//!
//! ```bash
//! campick login eyJhbGciOi...
//! campick whoami
//! campick profile update --name Asha
//! campick logout
//! ```

#![allow(clippy::print_stdout)]

use campick_storefront::api::ProfileUpdate;
use campick_storefront::auth::{AuthState, Surface};
use campick_storefront::state::ClientState;

use super::{CliError, session};

/// Validate and store `token`.
pub fn login(state: &ClientState, token: &str) -> Result<(), CliError> {
    let session = state.sign_in(token)?;
    let who = session
        .claims
        .name
        .as_deref()
        .or(session.claims.email.as_deref())
        .unwrap_or("user");

    match session.surface() {
        Surface::OwnerDashboard => println!("Signed in as {who} (shop owner)."),
        Surface::Storefront => println!("Signed in as {who}."),
        Surface::SignIn => println!(
            "Signed in as {who}, but this account's role cannot order or manage a shop."
        ),
    }
    Ok(())
}

/// Forget the session and every locally stored value.
pub fn logout(state: &ClientState) {
    state.sign_out();
    println!("Signed out.");
}

/// Print the current session.
pub async fn whoami(state: &ClientState) -> Result<(), CliError> {
    let AuthState::SignedIn(session) = state.auth().session() else {
        println!("Not signed in.");
        return Ok(());
    };

    let claims = &session.claims;
    if let Some(id) = &claims.id {
        println!("User:    {id}");
    }
    if let Some(name) = &claims.name {
        println!("Name:    {name}");
    }
    if let Some(email) = &claims.email {
        println!("Email:   {email}");
    }
    if let Some(role) = &claims.role {
        println!("Role:    {role}");
    }
    if let Some(expires_at) = claims.expires_at() {
        println!("Expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
    }

    if session.surface() == Surface::OwnerDashboard {
        let profile = state.client().profile().await?;
        if let Some(shop) = &profile.shop_id {
            println!("Shop:    {shop}");
        }
        if !profile.is_verified {
            println!("Your shop is awaiting verification.");
        }
    }
    Ok(())
}

/// Edit the signed-in user's profile.
pub async fn update_profile(state: &ClientState, update: ProfileUpdate) -> Result<(), CliError> {
    if update == ProfileUpdate::default() {
        return Err(CliError::Usage("Nothing to change; pass at least one field.".to_string()));
    }
    session(state)?;
    state.client().update_profile(&update).await?;
    println!("Profile updated.");
    Ok(())
}
