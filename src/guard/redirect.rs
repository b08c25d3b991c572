//! Role checks and the redirect policy for settled decisions.
//!
//! INVARIANTS
//! ==========
//! A wrong-section redirect never points at the current path, and never moves
//! a user off a path their own section owns. While auth state is still
//! converging, a naive redirect-on-denial can bounce between two views
//! forever; these cases grant instead.

#[cfg(test)]
#[path = "redirect_test.rs"]
mod redirect_test;

use crate::config::RoutePaths;
use crate::guard::decision::{GuardOutcome, GuardSpec, Redirect};
use crate::util::roles::{self, Section};

/// Result of evaluating an authenticated user against a guarded view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleVerdict {
    pub has_required_role: bool,
    pub in_correct_section: bool,
    pub outcome: GuardOutcome,
}

/// Decide access for an authenticated user holding `role`.
#[must_use]
pub fn decide_for_role(paths: &RoutePaths, spec: &GuardSpec, path: &str, role: &str) -> RoleVerdict {
    let has_required_role = roles::has_required_role(role, &spec.allowed_roles, spec.section);
    let user_section = Section::of_role(role);
    let in_correct_section = user_section == Some(spec.section);

    let outcome = if has_required_role && in_correct_section {
        GuardOutcome::RenderChildren
    } else {
        wrong_section_outcome(paths, path, role, user_section)
    };
    RoleVerdict { has_required_role, in_correct_section, outcome }
}

fn wrong_section_outcome(paths: &RoutePaths, path: &str, role: &str, user_section: Option<Section>) -> GuardOutcome {
    let target = user_section.map_or(paths.fallback.as_str(), |s| paths.dashboard(s));

    if same_path(target, path) {
        log::warn!("redirect target equals current path; granting to avoid a loop: path={path} role={role}");
        return GuardOutcome::RenderChildren;
    }
    if let Some(own) = user_section
        && paths.is_under(path, own)
    {
        log::warn!("path already under the {own} section; granting to avoid a loop: path={path} role={role}");
        return GuardOutcome::RenderChildren;
    }
    GuardOutcome::Redirect(Redirect::to_dashboard(target))
}

/// Section login redirect carrying the originating path.
#[must_use]
pub fn login_redirect(paths: &RoutePaths, section: Section, path: &str) -> GuardOutcome {
    GuardOutcome::Redirect(Redirect::to_login(paths.login(section), path))
}

fn same_path(a: &str, b: &str) -> bool {
    let trim = |p: &str| if p.len() > 1 { p.trim_end_matches('/').to_owned() } else { p.to_owned() };
    trim(a) == trim(b)
}
