//! Session manager configuration.
//!
//! Browser bundles have no process environment, so overrides are read at
//! compile time through `option_env!`:
//!
//! - `CHARTER_API_BASE`: identity service base URL (default `/api`)
//! - `CHARTER_TRUST_WINDOW_MS`: recent-login trust window (default 10000, `0` disables)
//! - `CHARTER_VERIFY_TIMEOUT_MS`: remote verification race (default 5000)

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::util::roles::Section;

pub const DEFAULT_API_BASE: &str = "/api";
pub const DEFAULT_TRUST_WINDOW_MS: u64 = 10_000;
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 5_000;
pub const MAX_VERIFICATION_ATTEMPTS: u8 = 3;

/// Login, dashboard and prefix paths for both sections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePaths {
    pub admin_login: String,
    pub client_login: String,
    pub admin_dashboard: String,
    pub client_dashboard: String,
    pub admin_prefix: String,
    pub client_prefix: String,
    /// Destination for authenticated users whose role fits neither section.
    pub fallback: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            admin_login: "/admin/login".to_owned(),
            client_login: "/login".to_owned(),
            admin_dashboard: "/admin/dashboard".to_owned(),
            client_dashboard: "/client/dashboard".to_owned(),
            admin_prefix: "/admin".to_owned(),
            client_prefix: "/client".to_owned(),
            fallback: "/".to_owned(),
        }
    }
}

impl RoutePaths {
    #[must_use]
    pub fn login(&self, section: Section) -> &str {
        match section {
            Section::Admin => &self.admin_login,
            Section::Client => &self.client_login,
        }
    }

    #[must_use]
    pub fn dashboard(&self, section: Section) -> &str {
        match section {
            Section::Admin => &self.admin_dashboard,
            Section::Client => &self.client_dashboard,
        }
    }

    #[must_use]
    pub fn prefix(&self, section: Section) -> &str {
        match section {
            Section::Admin => &self.admin_prefix,
            Section::Client => &self.client_prefix,
        }
    }

    /// Whether `path` is one of the dashboard entry points eligible for the
    /// storage fast path.
    #[must_use]
    pub fn is_dashboard_entry(&self, path: &str) -> bool {
        let path = trim_trailing_slash(path);
        path == trim_trailing_slash(&self.admin_dashboard)
            || path == trim_trailing_slash(&self.client_dashboard)
            || path.ends_with("/dashboard")
    }

    /// Whether `path` lies at or under the prefix owned by `section`.
    #[must_use]
    pub fn is_under(&self, path: &str, section: Section) -> bool {
        let prefix = trim_trailing_slash(self.prefix(section));
        let path = trim_trailing_slash(path);
        path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 { path.trim_end_matches('/') } else { path }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    pub api_base: String,
    pub paths: RoutePaths,
    pub trust_window: Duration,
    pub verification_timeout: Duration,
    pub max_verification_attempts: u8,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            paths: RoutePaths::default(),
            trust_window: Duration::from_millis(DEFAULT_TRUST_WINDOW_MS),
            verification_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
            max_verification_attempts: MAX_VERIFICATION_ATTEMPTS,
        }
    }
}

impl AuthConfig {
    /// Defaults overlaid with the compile-time `CHARTER_*` overrides.
    #[must_use]
    pub fn from_build_env() -> Self {
        Self::from_values(
            option_env!("CHARTER_API_BASE"),
            option_env!("CHARTER_TRUST_WINDOW_MS"),
            option_env!("CHARTER_VERIFY_TIMEOUT_MS"),
        )
    }

    fn from_values(api_base: Option<&str>, trust_window_ms: Option<&str>, verify_timeout_ms: Option<&str>) -> Self {
        let api_base = api_base
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_API_BASE);
        Self {
            api_base: api_base.trim_end_matches('/').to_owned(),
            trust_window: Duration::from_millis(parse_or(trust_window_ms, DEFAULT_TRUST_WINDOW_MS)),
            verification_timeout: Duration::from_millis(parse_or(verify_timeout_ms, DEFAULT_VERIFY_TIMEOUT_MS)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_paths(mut self, paths: RoutePaths) -> Self {
        self.paths = paths;
        self
    }

    #[must_use]
    pub fn with_trust_window(mut self, window: Duration) -> Self {
        self.trust_window = window;
        self
    }

    #[must_use]
    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = timeout;
        self
    }

    /// Attempt budget, clamped to the hard cap of three.
    #[must_use]
    pub fn with_max_verification_attempts(mut self, attempts: u8) -> Self {
        self.max_verification_attempts = attempts.min(MAX_VERIFICATION_ATTEMPTS);
        self
    }

    #[must_use]
    pub fn trust_window_ms(&self) -> i64 {
        i64::try_from(self.trust_window.as_millis()).unwrap_or(i64::MAX)
    }
}

fn parse_or<T>(raw: Option<&str>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}
