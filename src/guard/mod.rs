//! Route-access guard for admin and client views.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected view owns one `RouteGuard`. On mount, navigation, and auth
//! state changes the view asks the guard for an outcome: render the children,
//! render a loading placeholder, or redirect.
//!
//! DESIGN
//! ======
//! The guard walks one ordered list of strategies; the first that decides
//! wins:
//!
//! 1. storage fast path (dashboard entry points only, no awaits)
//! 2. recent-login trust window
//! 3. defer while auth state is still hydrating
//! 4. repair storage/state divergence by broadcasting `authSuccess`, once
//! 5. bounded re-verification against the identity service
//! 6. role/section decision for an authenticated user
//!
//! Strategy 6 is evaluated before 5 whenever auth state already holds a user,
//! since re-verification only applies to unauthenticated state.
//!
//! INVARIANTS
//! ==========
//! - At most `max_verification_attempts` (3) identity fetches per
//!   (path, user identity) pair; the budget resets when either changes.
//! - A check issued while another is in flight is a no-op. The flag is held
//!   by an RAII guard, so every exit path clears it.
//! - Storage is re-read after every await; nothing captured before the
//!   identity fetch is trusted after it.
//! - A cancelled fetch neither spends budget nor denies.

pub mod decision;
pub mod redirect;


use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::AbortHandle;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::net::identity::{self, IdentityRefresher, RefreshOutcome};
use crate::net::types::CachedUser;
use crate::state::auth::{AuthOperation, AuthSource, AuthState};
use crate::state::credentials::CredentialStore;
use crate::util::clock::Clock;
use crate::util::events::{AuthSuccess, EventChannel};
use crate::util::roles;

pub use self::decision::{DenyReason, GuardOutcome, GuardPhase, GuardSpec, Redirect, RouteAccessDecision};

/// Shared collaborators handed to every guard instance.
#[derive(Clone)]
pub struct GuardContext {
    pub config: Rc<AuthConfig>,
    pub store: CredentialStore,
    pub auth: Rc<dyn AuthSource>,
    pub refresher: Rc<dyn IdentityRefresher>,
    pub events: EventChannel<AuthSuccess>,
    pub clock: Rc<dyn Clock>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct GuardKey {
    path: String,
    user_id: Option<String>,
}

impl GuardKey {
    fn new(path: &str, auth: &AuthState) -> Self {
        Self { path: path.to_owned(), user_id: auth.user_id().map(str::to_owned) }
    }
}

#[derive(Debug, Default)]
struct GuardInner {
    key: Option<GuardKey>,
    decision: RouteAccessDecision,
    phase: GuardPhase,
    settled: Option<GuardOutcome>,
}

/// Clears the in-flight flag when dropped.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct RouteGuard {
    id: Uuid,
    spec: GuardSpec,
    ctx: GuardContext,
    inner: RefCell<GuardInner>,
    in_flight: Cell<bool>,
    abort: RefCell<Option<AbortHandle>>,
}

impl RouteGuard {
    pub fn new(spec: GuardSpec, ctx: GuardContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            spec,
            ctx,
            inner: RefCell::new(GuardInner::default()),
            in_flight: Cell::new(false),
            abort: RefCell::new(None),
        }
    }

    pub fn spec(&self) -> &GuardSpec {
        &self.spec
    }

    pub fn decision(&self) -> RouteAccessDecision {
        self.inner.borrow().decision.clone()
    }

    pub fn phase(&self) -> GuardPhase {
        self.inner.borrow().phase
    }

    /// Whether the guard's state belongs to `path` and the current user.
    pub fn is_current(&self, path: &str) -> bool {
        let key = GuardKey::new(path, &self.ctx.auth.snapshot());
        self.inner.borrow().key.as_ref() == Some(&key)
    }

    /// Abort an in-flight identity fetch (unmount or navigation).
    pub fn cancel(&self) {
        if let Some(handle) = self.abort.borrow_mut().take() {
            log::debug!("guard {}: cancelling identity fetch", self.id);
            handle.abort();
        }
    }

    /// Check whatever `current_path` reports until the outcome belongs to it.
    ///
    /// A navigation during a check cancels that check's identity fetch; the
    /// result computed for the old path is discarded and the new path is
    /// checked instead. Returns `None` when another check is in flight.
    pub async fn check_latest(&self, current_path: impl Fn() -> String) -> Option<GuardOutcome> {
        loop {
            let path = current_path();
            let outcome = self.check(&path).await?;
            let latest = current_path();
            if self.is_current(&latest) {
                return Some(outcome);
            }
            log::debug!("guard {}: navigated to {latest} during check of {path}; re-checking", self.id);
        }
    }

    /// Evaluate access to `path`.
    ///
    /// Returns `None` when another check on this guard is still in flight.
    pub async fn check(&self, path: &str) -> Option<GuardOutcome> {
        let Some(_flight) = InFlight::enter(&self.in_flight) else {
            log::debug!("guard {}: check already in flight; ignoring request for {path}", self.id);
            return None;
        };

        self.sync_key(path, &self.ctx.auth.snapshot());
        if let Some(settled) = self.inner.borrow().settled.clone() {
            return Some(settled);
        }
        self.set_phase(GuardPhase::Checking);

        let mut repaired = false;
        loop {
            let auth = self.ctx.auth.snapshot();

            if let Some(outcome) = self.storage_fast_path(path, &auth) {
                return Some(outcome);
            }
            if let Some(outcome) = self.recent_login(path, &auth) {
                return Some(outcome);
            }
            if auth.is_loading(AuthOperation::Login) {
                log::debug!("guard {}: auth state hydrating; deferring {path}", self.id);
                return Some(GuardOutcome::RenderLoading);
            }
            if !auth.is_authenticated
                && !repaired
                && let Some(user) = self.ctx.store.authenticated_user()
            {
                log::debug!("guard {}: storage holds a session auth state lacks; reconciling", self.id);
                repaired = true;
                self.reconcile(&auth, user);
                continue;
            }
            if auth.is_authenticated
                && let Some(user) = auth.user.as_ref()
            {
                return Some(self.decide_for_user(path, user));
            }
            match self.verify(path, &auth).await {
                Some(outcome) => return Some(outcome),
                None => continue,
            }
        }
    }

    /// Strategy 1: grant dashboard entry points straight from storage.
    fn storage_fast_path(&self, path: &str, auth: &AuthState) -> Option<GuardOutcome> {
        if !self.ctx.config.paths.is_dashboard_entry(path) {
            return None;
        }
        let user = self.ctx.store.authenticated_user()?;
        // The role marker only counts while it belongs to the stored user.
        let role = self
            .ctx
            .store
            .role_marker()
            .filter(|_| self.ctx.store.login_marker().is_none_or(|m| m.user_id == user.id))
            .unwrap_or_else(|| user.role.clone());
        if !roles::role_admits(&role, &self.spec.allowed_roles, self.spec.section) {
            return None;
        }
        log::debug!("guard {}: storage fast path grants {path} (role={role})", self.id);
        self.reconcile(auth, user);
        Some(self.settle(path, GuardOutcome::RenderChildren, Some(role), true))
    }

    /// Strategy 2: trust a login recorded within the trust window.
    fn recent_login(&self, path: &str, auth: &AuthState) -> Option<GuardOutcome> {
        let window = self.ctx.config.trust_window_ms();
        if window <= 0 {
            return None;
        }
        // A marker vouches for a login, never for a missing credential.
        self.ctx.store.get_credential()?;
        let marker = self.ctx.store.login_marker()?;
        let age = self.ctx.clock.now_ms() - marker.timestamp_ms;
        if !(0..=window).contains(&age) {
            log::debug!("guard {}: login marker outside trust window (age={age}ms)", self.id);
            return None;
        }
        if !roles::role_admits(&marker.role, &self.spec.allowed_roles, self.spec.section) {
            return None;
        }
        log::debug!("guard {}: recent login grants {path} (age={age}ms)", self.id);
        let user = self
            .ctx
            .store
            .get_cached_user()
            .filter(|u| u.id == marker.user_id)
            .unwrap_or_else(|| marker.to_user());
        let role = marker.role.clone();
        self.reconcile(auth, user);
        Some(self.settle(path, GuardOutcome::RenderChildren, Some(role), true))
    }

    /// Strategy 6: role and section check for a known user.
    fn decide_for_user(&self, path: &str, user: &CachedUser) -> GuardOutcome {
        let verdict = redirect::decide_for_role(&self.ctx.config.paths, &self.spec, path, &user.role);
        if !verdict.outcome.is_granted() {
            let mismatch = AuthError::RoleMismatch { role: user.role.clone(), section: self.spec.section };
            log::info!("guard {}: {mismatch}; redirecting from {path}", self.id);
        }
        self.settle(path, verdict.outcome, Some(user.role.clone()), verdict.has_required_role)
    }

    /// Strategy 5: one bounded verification step.
    ///
    /// `None` means "re-run the strategy list".
    async fn verify(&self, path: &str, auth: &AuthState) -> Option<GuardOutcome> {
        let max = self.ctx.config.max_verification_attempts;
        let attempts = self.inner.borrow().decision.verification_attempts;
        if attempts >= max {
            log::warn!("guard {}: {}; denying {path}", self.id, AuthError::VerificationExhausted { attempts });
            return Some(self.deny_unauthenticated(path));
        }

        let attempt = attempts + 1;
        {
            let mut inner = self.inner.borrow_mut();
            inner.decision.verification_attempts = attempt;
            inner.decision.is_verifying = true;
            inner.phase = GuardPhase::Verifying(attempt);
        }

        if let Some(user) = self.ctx.store.authenticated_user() {
            self.reconcile(auth, user.clone());
            return Some(self.decide_for_user(path, &user));
        }
        if let Err(e) = self.ctx.store.load_credential() {
            log::info!("guard {}: {e}; denying {path}", self.id);
            return Some(self.deny_unauthenticated(path));
        }

        let timeout = self.ctx.config.verification_timeout;
        let (handle, registration) = identity::abort_pair();
        *self.abort.borrow_mut() = Some(handle);
        log::debug!("guard {}: verifying identity (attempt {attempt}/{max})", self.id);
        let outcome =
            identity::refresh_with_timeout(self.ctx.refresher.as_ref(), self.ctx.clock.as_ref(), timeout, registration)
                .await;
        self.abort.borrow_mut().take();

        match outcome {
            RefreshOutcome::Refreshed(mut user) => {
                if self.ctx.store.get_credential().is_none() {
                    log::info!("guard {}: credential cleared during verification", self.id);
                    self.end_verification(GuardPhase::Checking);
                    return None;
                }
                user.last_refreshed_at = self.ctx.clock.now_ms();
                self.ctx.store.store_cached_user(&user);
                self.reconcile(&self.ctx.auth.snapshot(), user.clone());
                Some(self.decide_for_user(path, &user))
            }
            RefreshOutcome::Cancelled => {
                log::debug!("guard {}: verification cancelled; attempt not counted", self.id);
                {
                    let mut inner = self.inner.borrow_mut();
                    inner.decision.verification_attempts = attempts;
                }
                self.end_verification(GuardPhase::Idle);
                Some(GuardOutcome::RenderLoading)
            }
            failed @ (RefreshOutcome::Rejected(_) | RefreshOutcome::TimedOut) => {
                if let Some(e) = failed.error(timeout) {
                    log::warn!("guard {}: verification attempt {attempt}/{max} failed: {e}", self.id);
                }
                self.end_verification(GuardPhase::Checking);
                None
            }
        }
    }

    fn end_verification(&self, phase: GuardPhase) {
        let mut inner = self.inner.borrow_mut();
        inner.decision.is_verifying = false;
        inner.phase = phase;
    }

    fn deny_unauthenticated(&self, path: &str) -> GuardOutcome {
        let outcome = redirect::login_redirect(&self.ctx.config.paths, self.spec.section, path);
        self.settle(path, outcome, None, false)
    }

    /// Broadcast `authSuccess` unless auth state already holds this user.
    fn reconcile(&self, auth: &AuthState, user: CachedUser) {
        if auth.is_authenticated_as(&user.id) {
            return;
        }
        log::debug!("guard {}: broadcasting authSuccess for user={}", self.id, user.id);
        self.ctx.events.publish(&AuthSuccess { user });
    }

    /// Record a terminal outcome for the current (path, user) pair.
    fn settle(
        &self,
        path: &str,
        outcome: GuardOutcome,
        user_role: Option<String>,
        has_required_role: bool,
    ) -> GuardOutcome {
        let key = GuardKey::new(path, &self.ctx.auth.snapshot());
        let mut inner = self.inner.borrow_mut();
        let granted = outcome.is_granted();
        inner.decision.access_checked = true;
        inner.decision.access_allowed = granted;
        inner.decision.is_verifying = false;
        inner.decision.has_required_role = has_required_role;
        inner.decision.user_role = user_role;
        inner.phase = if granted { GuardPhase::Granted } else { GuardPhase::Denied };
        inner.settled = Some(outcome.clone());
        inner.key = Some(key);
        outcome
    }

    fn set_phase(&self, phase: GuardPhase) {
        self.inner.borrow_mut().phase = phase;
    }

    /// Reset when the path or user identity changed since the last check.
    fn sync_key(&self, path: &str, auth: &AuthState) {
        let key = GuardKey::new(path, auth);
        let mut inner = self.inner.borrow_mut();
        if inner.key.as_ref() == Some(&key) {
            return;
        }
        if inner.key.is_some() {
            log::debug!("guard {}: path or user changed; restarting at {path}", self.id);
        }
        *inner = GuardInner { key: Some(key), ..GuardInner::default() };
    }
}
