//! Request handlers for viewing and editing the signed-in user's account
//! details.

use axum::{Json, extract::State};
use email_address::EmailAddress;
use serde::Deserialize;

use crate::{
    Error,
    auth::{Claims, UserResponse},
    models::PasswordHash,
    state::AppState,
    stores::UserStore,
};

/// The form data for editing account details. Absent fields are unchanged.
#[derive(Deserialize)]
pub struct UpdateProfile {
    /// A new display name.
    #[serde(default)]
    pub name: Option<String>,
    /// A new email address.
    #[serde(default)]
    pub email: Option<EmailAddress>,
    /// A new password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Return the signed-in user's account details.
pub async fn get_profile(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<UserResponse>, Error> {
    let user = state.user_store.get(claims.user_id())?;

    Ok(Json(UserResponse::from(&user)))
}

/// Update the signed-in user's account details.
///
/// # Errors
///
/// This function will return an error if:
/// - the new name is empty or whitespace,
/// - the new password is too weak,
/// - the new email already belongs to another user.
pub async fn update_profile(
    State(state): State<AppState>,
    claims: Claims,
    Json(data): Json<UpdateProfile>,
) -> Result<Json<UserResponse>, Error> {
    let mut user = state.user_store.get(claims.user_id())?;

    if let Some(name) = data.name {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        user.set_name(name.to_string());
    }

    if let Some(email) = data.email {
        user.set_email(email);
    }

    if let Some(password) = data.password {
        let password_hash =
            PasswordHash::from_raw_password(&password, PasswordHash::DEFAULT_COST)?;
        user.set_password_hash(password_hash);
    }

    state.user_store.update(&user)?;

    Ok(Json(UserResponse::from(&user)))
}
