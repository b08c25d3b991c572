//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthStore` owns the process-wide `AuthState` and its hydration lifecycle:
//!
//! ```text
//! Uninitialized -> Hydrating -> Authenticated | Unauthenticated
//! ```
//!
//! Route guards and user-aware components read snapshots; the Leptos glue
//! mirrors every change into an `RwSignal<AuthState>`.
//!
//! DESIGN
//! ======
//! Hydration is reported through `loading[Login]`, separate from
//! `is_authenticated`, so consumers can tell "not known yet" from "known to be
//! logged out". The store also listens for `authSuccess` on the event channel
//! and adopts users confirmed out of band by the route guard.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::future::AbortHandle;

use crate::config::DEFAULT_VERIFY_TIMEOUT_MS;
use crate::error::{AuthError, ErrorKind};
use crate::net::identity::{self, AuthApi};
use crate::net::types::{CachedUser, LoginRequest};
use crate::state::credentials::CredentialStore;
use crate::state::session::SessionValidator;
use crate::util::clock::Clock;
use crate::util::events::{AuthSuccess, EventChannel, Subscription};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthOperation {
    Login,
    Logout,
    Refresh,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthPhase {
    #[default]
    Uninitialized,
    Hydrating,
    Authenticated,
    Unauthenticated,
}

/// Authentication state tracking the current user, loading flags and errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub is_authenticated: bool,
    pub user: Option<CachedUser>,
    pub loading: HashMap<AuthOperation, bool>,
    pub last_errors: HashMap<AuthOperation, ErrorKind>,
}

impl AuthState {
    #[must_use]
    pub fn is_loading(&self, op: AuthOperation) -> bool {
        self.loading.get(&op).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn last_error(&self, op: AuthOperation) -> Option<ErrorKind> {
        self.last_errors.get(&op).copied()
    }

    /// Whether the state is authenticated as the user with `user_id`.
    #[must_use]
    pub fn is_authenticated_as(&self, user_id: &str) -> bool {
        self.is_authenticated && self.user.as_ref().is_some_and(|u| u.id == user_id)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    fn authenticate(&mut self, user: CachedUser) {
        self.phase = AuthPhase::Authenticated;
        self.is_authenticated = true;
        self.user = Some(user);
    }

    fn deauthenticate(&mut self) {
        self.phase = AuthPhase::Unauthenticated;
        self.is_authenticated = false;
        self.user = None;
    }
}

/// Live source of `AuthState` snapshots.
pub trait AuthSource {
    fn snapshot(&self) -> AuthState;
}

#[derive(Clone)]
struct Shared {
    state: Rc<RefCell<AuthState>>,
    changes: EventChannel<AuthState>,
}

impl Shared {
    /// Apply `f`, then notify subscribers outside the borrow.
    fn update(&self, f: impl FnOnce(&mut AuthState)) {
        let next = {
            let mut state = self.state.borrow_mut();
            f(&mut state);
            state.clone()
        };
        self.changes.publish(&next);
    }

    fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }
}

pub struct AuthStore {
    shared: Shared,
    store: CredentialStore,
    validator: SessionValidator,
    api: Rc<dyn AuthApi>,
    events: EventChannel<AuthSuccess>,
    clock: Rc<dyn Clock>,
    verification_timeout: Duration,
    reconcile: RefCell<Option<Subscription>>,
    hydrate_abort: RefCell<Option<AbortHandle>>,
    refresh_abort: RefCell<Option<AbortHandle>>,
}

impl AuthStore {
    pub fn new(
        store: CredentialStore,
        api: Rc<dyn AuthApi>,
        events: EventChannel<AuthSuccess>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let shared = Shared { state: Rc::new(RefCell::new(AuthState::default())), changes: EventChannel::new() };

        let listener = shared.clone();
        let reconcile = events.subscribe(move |signal: &AuthSuccess| {
            if listener.state.borrow().is_authenticated_as(&signal.user.id) {
                return;
            }
            log::info!("adopting out-of-band authentication: user={}", signal.user.id);
            let user = signal.user.clone();
            listener.update(|s| {
                s.authenticate(user);
                s.loading.insert(AuthOperation::Login, false);
            });
        });

        Self {
            validator: SessionValidator::new(store.clone(), Rc::clone(&clock)),
            shared,
            store,
            api,
            events,
            clock,
            verification_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
            reconcile: RefCell::new(Some(reconcile)),
            hydrate_abort: RefCell::new(None),
            refresh_abort: RefCell::new(None),
        }
    }

    /// Bound for every identity fetch this store makes.
    #[must_use]
    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = timeout;
        self
    }

    pub fn state(&self) -> AuthState {
        self.shared.snapshot()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.store
    }

    pub fn events(&self) -> &EventChannel<AuthSuccess> {
        &self.events
    }

    /// Receive every new state after it changes.
    pub fn subscribe(&self, listener: impl Fn(&AuthState) + 'static) -> Subscription {
        self.shared.changes.subscribe(listener)
    }

    /// Silently restore a stored session.
    ///
    /// A hanging identity service ends hydration after the verification
    /// timeout as `Unauthenticated`, with the timeout in `last_errors[Login]`.
    pub async fn hydrate(&self) {
        self.shared.update(|s| {
            s.phase = AuthPhase::Hydrating;
            s.loading.insert(AuthOperation::Login, true);
        });

        let (handle, registration) = identity::abort_pair();
        *self.hydrate_abort.borrow_mut() = Some(handle);
        let restored = self
            .validator
            .restore(self.api.as_ref(), self.verification_timeout, registration)
            .await;
        self.hydrate_abort.borrow_mut().take();

        if matches!(restored, Err(AuthError::Cancelled)) {
            // Only teardown aborts a restore, and it has already reset the state.
            log::debug!("session restore cancelled");
            return;
        }

        self.shared.update(|s| {
            s.loading.insert(AuthOperation::Login, false);
            match restored {
                Ok(user) => {
                    log::debug!("session restored: user={}", user.id);
                    s.authenticate(user);
                }
                // A reconciliation adopted during the restore stands.
                Err(_) if s.is_authenticated => s.phase = AuthPhase::Authenticated,
                Err(e) => {
                    log::debug!("no session restored: {e}");
                    if e.kind() != ErrorKind::CredentialMissing && e.is_verification_failure() {
                        s.last_errors.insert(AuthOperation::Login, e.kind());
                    }
                    s.deauthenticate();
                }
            }
        });
    }

    /// Log in against the identity service.
    ///
    /// # Errors
    ///
    /// Returns the remote failure, which is also recorded in
    /// `last_errors[Login]`.
    pub async fn login(&self, request: LoginRequest) -> Result<CachedUser, AuthError> {
        self.shared.update(|s| {
            s.loading.insert(AuthOperation::Login, true);
            s.last_errors.remove(&AuthOperation::Login);
        });

        match self.api.login(&request).await {
            Ok(response) => {
                let mut user = response.user.clone();
                let now = self.clock.now_ms();
                user.last_refreshed_at = now;
                self.store.store_credential(&response.credential(), request.persistence);
                self.store.store_cached_user(&user);
                self.store.record_login(&user, now);
                log::info!("login succeeded: user={} role={}", user.id, user.role);

                let adopted = user.clone();
                self.shared.update(|s| {
                    s.authenticate(adopted);
                    s.loading.insert(AuthOperation::Login, false);
                });
                self.events.publish(&AuthSuccess { user: user.clone() });
                Ok(user)
            }
            Err(e) => {
                log::warn!("login failed: {e}");
                let kind = e.kind();
                self.shared.update(|s| {
                    s.loading.insert(AuthOperation::Login, false);
                    s.last_errors.insert(AuthOperation::Login, kind);
                    if !s.is_authenticated {
                        s.deauthenticate();
                    }
                });
                Err(e)
            }
        }
    }

    /// End the session locally; the remote logout is best effort.
    pub async fn logout(&self) {
        self.shared.update(|s| {
            s.loading.insert(AuthOperation::Logout, true);
        });

        if let Err(e) = self.api.logout().await {
            log::warn!("remote logout failed; clearing local session anyway: {e}");
        }
        self.store.clear();

        self.shared.update(|s| {
            s.deauthenticate();
            s.loading.clear();
            s.last_errors.clear();
        });
    }

    /// Re-fetch the current identity, bounded by the verification timeout.
    ///
    /// A rejected session logs the user out; a transient failure is recorded
    /// without touching the session.
    ///
    /// # Errors
    ///
    /// Returns the remote failure.
    pub async fn refresh(&self) -> Result<CachedUser, AuthError> {
        self.shared.update(|s| {
            s.loading.insert(AuthOperation::Refresh, true);
        });

        let (handle, registration) = identity::abort_pair();
        *self.refresh_abort.borrow_mut() = Some(handle);
        let timeout = self.verification_timeout;
        let result = identity::refresh_with_timeout(self.api.as_ref(), self.clock.as_ref(), timeout, registration)
            .await
            .into_result(timeout);
        self.refresh_abort.borrow_mut().take();
        match result {
            Ok(mut user) => {
                user.last_refreshed_at = self.clock.now_ms();
                self.store.store_cached_user(&user);
                let adopted = user.clone();
                self.shared.update(|s| {
                    s.authenticate(adopted);
                    s.loading.insert(AuthOperation::Refresh, false);
                    s.last_errors.remove(&AuthOperation::Refresh);
                });
                Ok(user)
            }
            Err(AuthError::Cancelled) => {
                self.shared.update(|s| {
                    s.loading.insert(AuthOperation::Refresh, false);
                });
                Err(AuthError::Cancelled)
            }
            Err(e @ (AuthError::NotAuthenticated | AuthError::CredentialMissing | AuthError::CredentialMalformed)) => {
                log::info!("session rejected on refresh: {e}");
                self.store.clear();
                self.shared.update(|s| {
                    s.deauthenticate();
                    s.loading.insert(AuthOperation::Refresh, false);
                    s.last_errors.insert(AuthOperation::Refresh, e.kind());
                });
                Err(e)
            }
            Err(e) => {
                log::warn!("identity refresh failed: {e}");
                self.shared.update(|s| {
                    s.loading.insert(AuthOperation::Refresh, false);
                    s.last_errors.insert(AuthOperation::Refresh, e.kind());
                });
                Err(e)
            }
        }
    }

    /// Abort in-flight fetches, reset to `Uninitialized` and detach from the
    /// event channel.
    pub fn teardown(&self) {
        for pending in [&self.hydrate_abort, &self.refresh_abort] {
            if let Some(handle) = pending.borrow_mut().take() {
                handle.abort();
            }
        }
        self.reconcile.borrow_mut().take();
        self.shared.update(|s| *s = AuthState::default());
    }
}

impl AuthSource for AuthStore {
    fn snapshot(&self) -> AuthState {
        self.state()
    }
}
