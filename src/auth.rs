//! Authentication for the JSON API.
//!
//! Access tokens are JSON Web Tokens signed with a shared secret. Handlers
//! opt in to authentication by taking a [Claims] argument, which rejects the
//! request if the bearer token is missing or invalid.

use axum::{
    Json, RequestPartsExt,
    body::Body,
    extract::{FromRef, FromRequestParts, State},
    http::{Response, StatusCode, request::Parts},
    response::IntoResponse,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use email_address::EmailAddress;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
    state::AppState,
    stores::UserStore,
};

// Code in this module is adapted from https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

/// How long an access token stays valid after being issued.
const TOKEN_LIFETIME: Duration = Duration::hours(24);

/// The keys used to sign and verify access tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create a signing and verification key pair from a shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The contents of a JSON Web Token.
#[derive(Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: i64,
    /// The expiry time of the token.
    pub exp: usize,
    /// The time the token was issued.
    pub iat: usize,
}

impl Claims {
    /// The ID of the user the token was issued to.
    pub fn user_id(&self) -> UserID {
        UserID::new(self.sub)
    }
}

impl<S> FromRequestParts<S> for Claims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        let keys = JwtKeys::from_ref(state);
        let token_data = decode_token(bearer.token(), &keys)?;

        Ok(token_data.claims)
    }
}

/// The credentials a user signs in with.
#[derive(Deserialize)]
pub struct Credentials {
    /// Email entered during sign-in.
    pub email: EmailAddress,
    /// Password entered during sign-in.
    pub password: String,
}

/// The details a new user registers with.
#[derive(Deserialize)]
pub struct Registration {
    /// The display name for the new account.
    pub name: String,
    /// The email address to register with.
    pub email: EmailAddress,
    /// The password to sign in with.
    pub password: String,
}

/// A user's account details as returned by the API.
///
/// The password hash is deliberately not part of this type.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    /// The user's ID.
    pub id: i64,
    /// The user's display name.
    pub name: String,
    /// The user's email address.
    pub email: EmailAddress,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().as_i64(),
            name: user.name().to_string(),
            email: user.email().clone(),
        }
    }
}

/// The response to a successful sign-in or registration.
#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token for subsequent requests.
    pub token: String,
    /// The account the token was issued to.
    pub user: UserResponse,
}

/// An error that occurred during sign-in or token verification.
#[derive(Debug)]
pub enum AuthError {
    /// The email or password did not match a registered user.
    WrongCredentials,
    /// The bearer token was missing, malformed, or expired.
    InvalidToken,
    /// A token could not be created for a signed-in user.
    TokenCreation,
    /// An unexpected error occurred while checking credentials.
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response<Body> {
        let (status, error_message) = match self {
            AuthError::WrongCredentials => (StatusCode::UNAUTHORIZED, "Wrong credentials"),
            AuthError::InvalidToken => (StatusCode::BAD_REQUEST, "Invalid token"),
            AuthError::TokenCreation => (StatusCode::INTERNAL_SERVER_ERROR, "Token creation error"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Handler for registration requests.
///
/// # Errors
///
/// This function will return an error if:
/// - the name is empty or whitespace,
/// - the password is too weak,
/// - the email already belongs to a registered user,
/// - the token could not be created.
pub async fn register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let name = registration.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let password_hash =
        PasswordHash::from_raw_password(&registration.password, PasswordHash::DEFAULT_COST)?;

    let user = state
        .user_store
        .create(name, registration.email, password_hash)?;

    let token = encode_token(user.id(), &state.jwt_keys)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// Handler for sign-in requests.
///
/// # Errors
///
/// This function will return an error if:
/// - the email does not belong to a registered user,
/// - the password is not correct,
/// - an internal error occurred when verifying the password.
pub async fn log_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthResponse>, AuthError> {
    let user = state
        .user_store
        .get_by_email(&credentials.email)
        .map_err(|error| match error {
            Error::NotFound => AuthError::WrongCredentials,
            _ => {
                tracing::error!("error matching user: {error:?}");
                AuthError::InternalError
            }
        })?;

    let password_is_correct =
        user.password_hash()
            .verify(&credentials.password)
            .map_err(|error| {
                tracing::error!("error verifying password: {error}");
                AuthError::InternalError
            })?;

    if !password_is_correct {
        return Err(AuthError::WrongCredentials);
    }

    let token = encode_token(user.id(), &state.jwt_keys).map_err(|_| AuthError::TokenCreation)?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Create a signed access token for the given user.
pub(crate) fn encode_token(user_id: UserID, keys: &JwtKeys) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        exp: (now + TOKEN_LIFETIME).unix_timestamp() as usize,
        iat: now.unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

fn decode_token(token: &str, keys: &JwtKeys) -> Result<TokenData<Claims>, AuthError> {
    decode(token, &keys.decoding, &Validation::default()).map_err(|_| AuthError::InvalidToken)
}
