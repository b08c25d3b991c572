//! Role groups and the admin/client section partition.
//!
//! DESIGN
//! ======
//! Role strings come from an open vocabulary but are only ever compared
//! through the two fixed groups below, so `"administrator"` and `"admin"` are
//! interchangeable everywhere access is decided.

#[cfg(test)]
#[path = "roles_test.rs"]
mod roles_test;

use std::fmt;

use serde::{Deserialize, Serialize};

pub const ADMIN_ROLES: &[&str] = &["admin", "administrator"];
pub const CLIENT_ROLES: &[&str] = &["client", "user", "customer"];

/// The coarse partition a guarded view belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Admin,
    Client,
}

impl Section {
    /// Role strings granted access to this section.
    #[must_use]
    pub fn roles(self) -> &'static [&'static str] {
        match self {
            Self::Admin => ADMIN_ROLES,
            Self::Client => CLIENT_ROLES,
        }
    }

    /// Whether `role` belongs to this section's role group.
    #[must_use]
    pub fn contains_role(self, role: &str) -> bool {
        let role = normalize_role(role);
        self.roles().iter().any(|r| *r == role)
    }

    /// Section owning `role`, or `None` for roles outside both groups.
    #[must_use]
    pub fn of_role(role: &str) -> Option<Self> {
        [Self::Admin, Self::Client].into_iter().find(|s| s.contains_role(role))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased, trimmed role string used for every comparison.
#[must_use]
pub fn normalize_role(role: &str) -> String {
    role.trim().to_ascii_lowercase()
}

/// Role-group equality: identical roles, or roles in the same group.
#[must_use]
pub fn roles_equivalent(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_role(a), normalize_role(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    match (Section::of_role(&a), Section::of_role(&b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Whether `role` carries the role required by a guarded view.
///
/// A non-empty allow-list is matched with group semantics; an empty one falls
/// back to membership in the section's own group.
#[must_use]
pub fn has_required_role(role: &str, allowed_roles: &[String], section: Section) -> bool {
    if allowed_roles.is_empty() {
        section.contains_role(role)
    } else {
        allowed_roles.iter().any(|allowed| roles_equivalent(allowed, role))
    }
}

/// Whether `role` both satisfies the allow-list and belongs in `section`.
#[must_use]
pub fn role_admits(role: &str, allowed_roles: &[String], section: Section) -> bool {
    has_required_role(role, allowed_roles, section) && Section::of_role(role) == Some(section)
}
