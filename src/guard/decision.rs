//! Per-instance access decision records and guard outcomes.

use crate::util::roles::Section;

/// What a guarded view should do right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    RenderChildren,
    RenderLoading,
    Redirect(Redirect),
}

impl GuardOutcome {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::RenderChildren)
    }

    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect(r) => Some(&r.to),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// No session: send to the section's login page.
    Unauthenticated,
    /// Authenticated, but the role belongs elsewhere.
    WrongSection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    /// Originating location, carried for post-login return.
    pub from: Option<String>,
    pub reason: DenyReason,
}

impl Redirect {
    #[must_use]
    pub fn to_login(login_path: &str, from: &str) -> Self {
        Self { to: login_path.to_owned(), from: Some(from.to_owned()), reason: DenyReason::Unauthenticated }
    }

    #[must_use]
    pub fn to_dashboard(dashboard: &str) -> Self {
        Self { to: dashboard.to_owned(), from: None, reason: DenyReason::WrongSection }
    }

    /// Navigation target with the origin appended as `?from=`.
    #[must_use]
    pub fn href(&self) -> String {
        match &self.from {
            Some(from) if !from.is_empty() => {
                let sep = if self.to.contains('?') { '&' } else { '?' };
                format!("{}{sep}from={}", self.to, encode_query_value(from))
            }
            _ => self.to.clone(),
        }
    }
}

fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            '+' => out.push_str("%2B"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}

/// Access record for one (path, user identity) pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteAccessDecision {
    pub access_checked: bool,
    pub access_allowed: bool,
    pub is_verifying: bool,
    pub verification_attempts: u8,
    pub has_required_role: bool,
    pub user_role: Option<String>,
}

/// Lifecycle of one guard instance.
///
/// ```text
/// Idle -> Checking -> { Verifying(n <= 3) <-> Checking } -> { Granted, Denied }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GuardPhase {
    #[default]
    Idle,
    Checking,
    Verifying(u8),
    Granted,
    Denied,
}

impl GuardPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Granted | Self::Denied)
    }
}

/// Static inputs of a guarded view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardSpec {
    pub section: Section,
    pub allowed_roles: Vec<String>,
}

impl GuardSpec {
    #[must_use]
    pub fn new(section: Section) -> Self {
        Self { section, allowed_roles: Vec::new() }
    }

    #[must_use]
    pub fn allow<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_roles = roles.into_iter().map(Into::into).collect();
        self
    }
}
