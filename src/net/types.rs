//! Wire DTOs for the REST API boundary.
//!
//! DESIGN
//! ======
//! Field names mirror the API's snake_case JSON so serde needs no renames.
//! Profiles arrive untagged on the wire; the caller's role picks the variant,
//! which keeps role dispatch in one place (`Profile::decode`).

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Account role; selects which profile variant applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seeker,
    Provider,
    Admin,
}

/// Identity record returned by `/auth/me/` and `/auth/login/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    /// ISO 8601 join timestamp, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<String>,
}

impl User {
    /// First name when set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() { &self.username } else { &self.first_name }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub consent_given: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Refresh result. `refresh` is present when the server rotates tokens.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

// =============================================================================
// PROFILES
// =============================================================================

/// Fields shared by every profile variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileBase {
    pub id: i64,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeekerProfile {
    #[serde(flatten)]
    pub base: ProfileBase,
    #[serde(default)]
    pub industry_interest: Option<String>,
    #[serde(default)]
    pub required_services: Option<String>,
    #[serde(default)]
    pub project_description: Option<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    #[serde(flatten)]
    pub base: ProfileBase,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub services_offered: Option<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub industry_focus: Option<String>,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub rating_report_url: Option<String>,
    /// Decimal rate; the API sends either a string (`"50.00"`) or a number.
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub hourly_rate: Option<String>,
}

/// A role-specific profile.
#[derive(Clone, Debug, PartialEq)]
pub enum Profile {
    Seeker(SeekerProfile),
    Provider(ProviderProfile),
}

impl Profile {
    /// Decode a `/profiles/me/` body as the variant for `role`.
    ///
    /// # Errors
    ///
    /// Returns a message when `role` has no profile or the body does not match.
    pub fn decode(role: Role, body: serde_json::Value) -> Result<Self, String> {
        match role {
            Role::Seeker => serde_json::from_value(body).map(Self::Seeker).map_err(|e| e.to_string()),
            Role::Provider => serde_json::from_value(body).map(Self::Provider).map_err(|e| e.to_string()),
            Role::Admin => Err("admin accounts have no profile".to_owned()),
        }
    }

    #[must_use]
    pub fn base(&self) -> &ProfileBase {
        match self {
            Self::Seeker(p) => &p.base,
            Self::Provider(p) => &p.base,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Seeker(_) => Role::Seeker,
            Self::Provider(_) => Role::Provider,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeekerProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_interest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_services: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProviderProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_offered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<String>,
}

/// Write payload for `PATCH`/`PUT /profiles/me/`. Unset fields are omitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProfileUpdate {
    Seeker(SeekerProfileUpdate),
    Provider(ProviderProfileUpdate),
}

impl ProfileUpdate {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Seeker(_) => Role::Seeker,
            Self::Provider(_) => Role::Provider,
        }
    }
}

// =============================================================================
// MATCHING
// =============================================================================

/// Optional filters for the match and opportunity listings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchFilters {
    pub industry: Option<String>,
    pub location: Option<String>,
}

impl MatchFilters {
    /// Query pairs for the non-blank filters, in a stable order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        [("industry", &self.industry), ("location", &self.location)]
            .into_iter()
            .filter_map(|(key, value)| {
                let value = value.as_deref()?.trim();
                (!value.is_empty()).then(|| (key.to_owned(), value.to_owned()))
            })
            .collect()
    }
}

fn deserialize_opt_decimal<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(D::Error::custom("expected decimal string or number")),
    }
}
