//! Client configuration parsed from key/value lookups.
//!
//! SYSTEM CONTEXT
//! ==============
//! Browser builds have no process environment, so `from_build_env` reads the
//! same keys at compile time through `option_env!`. Native consumers use
//! `from_env`. Both funnel into `from_lookup`, which tests drive directly.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::error::ConfigError;
use crate::util::token_storage::{DEFAULT_ACCESS_TOKEN_KEY, DEFAULT_REFRESH_TOKEN_KEY, StorageKeys};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_ENTRY_PATH: &str = "/login";
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";
pub const DEFAULT_SIGNUP_PATH: &str = "/signup";

pub const API_BASE_URL_KEY: &str = "MATCHING_API_BASE_URL";
pub const ACCESS_TOKEN_KEY_KEY: &str = "MATCHING_ACCESS_TOKEN_KEY";
pub const REFRESH_TOKEN_KEY_KEY: &str = "MATCHING_REFRESH_TOKEN_KEY";
pub const ENTRY_PATH_KEY: &str = "MATCHING_ENTRY_PATH";
pub const LANDING_PATH_KEY: &str = "MATCHING_LANDING_PATH";
pub const SIGNUP_PATH_KEY: &str = "MATCHING_SIGNUP_PATH";

/// Paths the router mounts and the guards redirect between.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteConfig {
    /// Unauthenticated entry view (login).
    pub entry_path: String,
    /// Where authenticated visitors land.
    pub landing_path: String,
    /// Account creation view; guarded like the entry view.
    pub signup_path: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            entry_path: DEFAULT_ENTRY_PATH.to_owned(),
            landing_path: DEFAULT_LANDING_PATH.to_owned(),
            signup_path: DEFAULT_SIGNUP_PATH.to_owned(),
        }
    }
}

/// The view a browser path resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteView {
    Entry,
    Signup,
    Landing,
    /// `/`, which redirects to the landing view.
    Root,
    NotFound,
}

impl RouteConfig {
    /// Resolve a browser pathname (no query) against the configured paths.
    /// A trailing slash is ignored.
    #[must_use]
    pub fn resolve(&self, pathname: &str) -> RouteView {
        let path = normalize_path(pathname);
        if path == "/" {
            RouteView::Root
        } else if path == self.entry_path {
            RouteView::Entry
        } else if path == self.signup_path {
            RouteView::Signup
        } else if path == self.landing_path {
            RouteView::Landing
        } else {
            RouteView::NotFound
        }
    }
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without a trailing slash, e.g. `http://localhost:8000/api`.
    pub api_base_url: String,
    pub storage_keys: StorageKeys,
    pub routes: RouteConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            storage_keys: StorageKeys::default(),
            routes: RouteConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed config from a key lookup.
    ///
    /// Optional:
    /// - `MATCHING_API_BASE_URL`: default `http://localhost:8000/api`
    /// - `MATCHING_ACCESS_TOKEN_KEY`: default `authToken`
    /// - `MATCHING_REFRESH_TOKEN_KEY`: default `refreshToken`
    /// - `MATCHING_ENTRY_PATH`: default `/login`
    /// - `MATCHING_LANDING_PATH`: default `/dashboard`
    /// - `MATCHING_SIGNUP_PATH`: default `/signup`
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a provided value is malformed, or when two
    /// route keys name the same path.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = parse_base_url(lookup(API_BASE_URL_KEY).as_deref().unwrap_or(DEFAULT_API_BASE_URL))?;
        let storage_keys = StorageKeys {
            access: parse_storage_key(ACCESS_TOKEN_KEY_KEY, lookup(ACCESS_TOKEN_KEY_KEY), DEFAULT_ACCESS_TOKEN_KEY)?,
            refresh: parse_storage_key(REFRESH_TOKEN_KEY_KEY, lookup(REFRESH_TOKEN_KEY_KEY), DEFAULT_REFRESH_TOKEN_KEY)?,
        };
        let routes = RouteConfig {
            entry_path: parse_route_path(ENTRY_PATH_KEY, lookup(ENTRY_PATH_KEY), DEFAULT_ENTRY_PATH)?,
            landing_path: parse_route_path(LANDING_PATH_KEY, lookup(LANDING_PATH_KEY), DEFAULT_LANDING_PATH)?,
            signup_path: parse_route_path(SIGNUP_PATH_KEY, lookup(SIGNUP_PATH_KEY), DEFAULT_SIGNUP_PATH)?,
        };
        check_distinct_routes(&routes)?;
        Ok(Self { api_base_url, storage_keys, routes })
    }

    /// Build config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a provided value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from values baked in at compile time.
    ///
    /// Malformed values fall back to defaults so a bad build flag cannot stop
    /// the app from mounting.
    pub fn from_build_env() -> Self {
        Self::from_lookup(build_env).unwrap_or_else(|e| {
            log::warn!("config: {e}; using defaults");
            Self::default()
        })
    }
}

fn build_env(key: &str) -> Option<String> {
    let value = match key {
        API_BASE_URL_KEY => option_env!("MATCHING_API_BASE_URL"),
        ACCESS_TOKEN_KEY_KEY => option_env!("MATCHING_ACCESS_TOKEN_KEY"),
        REFRESH_TOKEN_KEY_KEY => option_env!("MATCHING_REFRESH_TOKEN_KEY"),
        ENTRY_PATH_KEY => option_env!("MATCHING_ENTRY_PATH"),
        LANDING_PATH_KEY => option_env!("MATCHING_LANDING_PATH"),
        SIGNUP_PATH_KEY => option_env!("MATCHING_SIGNUP_PATH"),
        _ => None,
    };
    value.map(str::to_owned)
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let valid = trimmed.starts_with("http://") || trimmed.starts_with("https://") || trimmed.starts_with('/');
    if !valid {
        return Err(ConfigError::InvalidBaseUrl { value: raw.to_owned() });
    }
    Ok(trimmed.trim_end_matches('/').to_owned())
}

fn parse_storage_key(key: &str, raw: Option<String>, default: &str) -> Result<String, ConfigError> {
    match raw {
        None => Ok(default.to_owned()),
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue { key: key.to_owned() }),
        Some(value) => Ok(value.trim().to_owned()),
    }
}

fn parse_route_path(key: &str, raw: Option<String>, default: &str) -> Result<String, ConfigError> {
    let Some(value) = raw else {
        return Ok(default.to_owned());
    };
    let value = value.trim();
    if !value.starts_with('/') || value.contains(['?', '#']) {
        return Err(ConfigError::InvalidRoutePath { key: key.to_owned(), value: value.to_owned() });
    }
    let path = normalize_path(value);
    if path == "/" {
        return Err(ConfigError::RoutePathConflict { path: path.to_owned() });
    }
    Ok(path.to_owned())
}

fn check_distinct_routes(routes: &RouteConfig) -> Result<(), ConfigError> {
    let paths = [&routes.entry_path, &routes.landing_path, &routes.signup_path];
    for (i, path) in paths.iter().enumerate() {
        if paths[i + 1..].contains(path) {
            return Err(ConfigError::RoutePathConflict { path: (*path).clone() });
        }
    }
    Ok(())
}
