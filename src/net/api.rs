//! REST endpoint helpers built on [`ApiClient`].
//!
//! Login and registration go out anonymously: a `401` there means bad
//! credentials, not an expired session, so it must never reach the refresh
//! path. Everything else uses the session-aware `send`.
//!
//! ERROR HANDLING
//! ==============
//! Every helper returns `Result<_, ApiError>`; decode failures of a success
//! body become `ApiError::Parse`.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::client::ApiClient;
use super::transport::{ApiRequest, Method};
use super::types::{
    LoginRequest, LoginResponse, MatchFilters, Profile, ProfileUpdate, RegisterRequest, Role, User,
};
use crate::error::ApiError;

pub const LOGIN_PATH: &str = "/auth/login/";
pub const REGISTER_PATH: &str = "/auth/register/";
pub const ME_PATH: &str = "/auth/me/";
pub const PROFILE_PATH: &str = "/profiles/me/";

/// Which match listing to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchSource {
    /// Rule-based matches for the current user.
    Matches,
    /// Model-ranked matches for the current user.
    Ranked,
    /// Open opportunities visible to the current user.
    Opportunities,
}

impl MatchSource {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Matches => "/matching/matches/",
            Self::Ranked => "/matching/ml/",
            Self::Opportunities => "/matching/opportunities/",
        }
    }
}

fn profile_write_method(replace: bool) -> Method {
    if replace { Method::Put } else { Method::Patch }
}

fn profile_role_mismatch(expected: Role, got: Role) -> ApiError {
    ApiError::Parse(format!("profile update for {got:?} sent by a {expected:?} account"))
}

/// Exchange credentials for a token pair via `POST /auth/login/`.
///
/// # Errors
///
/// Bad credentials come back as `ApiError::Unauthorized` or `Rejected`; the
/// session is not touched either way.
pub async fn login(client: &ApiClient, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
    let request = ApiRequest::post(LOGIN_PATH).with_json(credentials)?;
    client.send_anonymous(request).await?.json()
}

/// Create an account via `POST /auth/register/`.
///
/// # Errors
///
/// Field validation failures arrive as `ApiError::Rejected` with `fields`.
pub async fn register(client: &ApiClient, form: &RegisterRequest) -> Result<User, ApiError> {
    let request = ApiRequest::post(REGISTER_PATH).with_json(form)?;
    client.send_anonymous(request).await?.json()
}

/// Fetch the identity behind the current access token.
///
/// # Errors
///
/// Returns the adapter's error when the request fails after any refresh.
pub async fn fetch_current_user(client: &ApiClient) -> Result<User, ApiError> {
    client.send(ApiRequest::get(ME_PATH)).await?.json()
}

/// Fetch the current user's profile, decoded as the variant for `role`.
///
/// # Errors
///
/// Returns `ApiError::Parse` when `role` has no profile or the body does not
/// match it.
pub async fn fetch_my_profile(client: &ApiClient, role: Role) -> Result<Profile, ApiError> {
    let body: serde_json::Value = client.send(ApiRequest::get(PROFILE_PATH)).await?.json()?;
    Profile::decode(role, body).map_err(ApiError::Parse)
}

/// Partially update the current user's profile (`PATCH`).
///
/// # Errors
///
/// See [`fetch_my_profile`]; validation failures arrive as `Rejected`.
pub async fn update_my_profile(client: &ApiClient, role: Role, update: &ProfileUpdate) -> Result<Profile, ApiError> {
    write_profile(client, role, update, false).await
}

/// Replace the current user's profile (`PUT`).
///
/// # Errors
///
/// See [`update_my_profile`].
pub async fn replace_my_profile(client: &ApiClient, role: Role, update: &ProfileUpdate) -> Result<Profile, ApiError> {
    write_profile(client, role, update, true).await
}

async fn write_profile(
    client: &ApiClient,
    role: Role,
    update: &ProfileUpdate,
    replace: bool,
) -> Result<Profile, ApiError> {
    if update.role() != role {
        return Err(profile_role_mismatch(role, update.role()));
    }
    let request = ApiRequest::new(profile_write_method(replace), PROFILE_PATH).with_json(update)?;
    let body: serde_json::Value = client.send(request).await?.json()?;
    Profile::decode(role, body).map_err(ApiError::Parse)
}

/// Read one of the match listings. Records are passed through unparsed.
///
/// # Errors
///
/// Returns the adapter's error, or `Parse` when the body is not a list.
pub async fn fetch_matches(
    client: &ApiClient,
    source: MatchSource,
    filters: &MatchFilters,
) -> Result<Vec<serde_json::Value>, ApiError> {
    let request = ApiRequest::get(source.path()).with_query(filters.query_pairs());
    let body: serde_json::Value = client.send(request).await?.json()?;
    match body {
        serde_json::Value::Array(items) => Ok(items),
        // Paginated listings wrap records in `results`.
        serde_json::Value::Object(mut map) => match map.remove("results") {
            Some(serde_json::Value::Array(items)) => Ok(items),
            _ => Err(ApiError::Parse(format!("{} did not return a list", source.path()))),
        },
        _ => Err(ApiError::Parse(format!("{} did not return a list", source.path()))),
    }
}
