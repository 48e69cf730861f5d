//! Error types shared by the session core and the HTTP layer.
//!
//! ERROR HANDLING
//! ==============
//! Every failure a view can observe is an `ApiError`. `category()` sorts it
//! into the four buckets views act on: inline credential feedback, an expired
//! authorization the adapter already tried to repair, a dead session that was
//! logged out, or a transient failure that leaves the session untouched.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::collections::BTreeMap;

use serde_json::Value;

/// Failure of a request against the remote API.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the request input (4xx other than 401).
    #[error("request rejected: status {status}")]
    Rejected {
        status: u16,
        detail: Option<String>,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// The server refused the credentials attached to the request.
    #[error("unauthorized: status {status}")]
    Unauthorized { status: u16, detail: Option<String> },

    /// The server failed while handling the request (5xx).
    #[error("server error: status {status}")]
    Server { status: u16, body: String },

    /// A success response body could not be decoded.
    #[error("response parse failed: {0}")]
    Parse(String),
}

/// How a view should react to an [`ApiError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad login/signup input. Shown inline; session state is untouched.
    Credential,
    /// A protected call was refused even after the refresh path ran.
    AuthorizationExpired,
    /// The refresh path gave up and the session was logged out.
    SessionInvalid,
    /// Timeouts, 5xx, undecodable bodies. Display-only; retrying may succeed.
    Transient,
}

impl ApiError {
    /// Classify a non-success response into an error.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let detail = parsed.as_ref().and_then(detail_message);
        match status {
            401 => Self::Unauthorized { status, detail },
            400..=499 => Self::Rejected {
                status,
                detail,
                fields: parsed.as_ref().map(field_errors).unwrap_or_default(),
            },
            _ => Self::Server { status, body: body.to_owned() },
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Rejected { .. } => ErrorCategory::Credential,
            Self::Unauthorized { .. } => ErrorCategory::AuthorizationExpired,
            Self::Network(_) | Self::Server { .. } | Self::Parse(_) => ErrorCategory::Transient,
        }
    }

    /// Like [`ApiError::category`], but a refused call whose session is
    /// already gone is reported as `SessionInvalid`.
    #[must_use]
    pub fn category_for(&self, session_authenticated: bool) -> ErrorCategory {
        match self.category() {
            ErrorCategory::AuthorizationExpired if !session_authenticated => ErrorCategory::SessionInvalid,
            category => category,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Human-readable text for inline display next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { detail: Some(detail), .. } | Self::Unauthorized { detail: Some(detail), .. } => {
                detail.clone()
            }
            Self::Rejected { fields, .. } if !fields.is_empty() => fields
                .iter()
                .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Rejected { .. } | Self::Unauthorized { .. } => {
                "Request failed. Please check your input.".to_owned()
            }
            Self::Network(_) => "Unable to reach the server. Please try again.".to_owned(),
            Self::Server { .. } | Self::Parse(_) => "The server had a problem. Please try again.".to_owned(),
        }
    }
}

fn detail_message(body: &Value) -> Option<String> {
    body.get("detail").and_then(Value::as_str).map(str::to_owned)
}

/// Collect field-keyed validation errors (`{"email": ["taken"]}`).
///
/// `non_field_errors` is kept as a regular key; `detail` is excluded because
/// it is surfaced separately.
fn field_errors(body: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(map) = body.as_object() else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(key, _)| key.as_str() != "detail")
        .filter_map(|(key, value)| {
            let messages = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::to_owned).collect(),
                _ => return None,
            };
            (!messages.is_empty()).then(|| (key.clone(), messages))
        })
        .collect()
}

/// Session mutation refused because it would break a session invariant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `login` was handed an empty access token.
    #[error("access token must not be empty")]
    EmptyAccessToken,
}

/// Invalid client configuration value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API base URL {value:?}: must be http(s):// or start with '/'")]
    InvalidBaseUrl { value: String },

    #[error("invalid route path for {key}: {value:?} must start with '/' and carry no query")]
    InvalidRoutePath { key: String, value: String },

    #[error("route path {path:?} is the root or already used by another view")]
    RoutePathConflict { path: String },

    #[error("{key} must not be empty")]
    EmptyValue { key: String },
}
