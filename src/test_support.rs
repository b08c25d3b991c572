//! Test doubles shared by the unit test modules.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::AuthError;
use crate::net::identity::{AuthApi, IdentityRefresher};
use crate::net::types::{CachedUser, LoginRequest, LoginResponse};
use crate::util::clock::Clock;

pub const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1MSJ9.c2ln";

/// Clock with a settable wall time; sleeps run on tokio's (pausable) timer.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self { now: Cell::new(now_ms) }
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed_local()
    }
}

/// Scripted identity-service reply.
#[derive(Clone, Debug)]
pub enum Reply {
    User(CachedUser),
    Fail(AuthError),
    /// Never resolves.
    Hang,
}

/// Scripted remote API counting every call.
#[derive(Debug)]
pub struct FakeApi {
    identity: RefCell<VecDeque<Reply>>,
    fallback: RefCell<Reply>,
    login_reply: RefCell<Result<LoginResponse, AuthError>>,
    logout_reply: RefCell<Result<(), AuthError>>,
    pub identity_calls: Cell<usize>,
    pub login_calls: Cell<usize>,
    pub logout_calls: Cell<usize>,
}

impl FakeApi {
    /// API whose identity fetch always answers `reply`.
    pub fn answering(reply: Reply) -> Self {
        Self {
            identity: RefCell::new(VecDeque::new()),
            fallback: RefCell::new(reply),
            login_reply: RefCell::new(Err(AuthError::InvalidLogin)),
            logout_reply: RefCell::new(Ok(())),
            identity_calls: Cell::new(0),
            login_calls: Cell::new(0),
            logout_calls: Cell::new(0),
        }
    }

    /// Queue a one-shot reply used before the fallback.
    pub fn then(self, reply: Reply) -> Self {
        self.identity.borrow_mut().push_back(reply);
        self
    }

    pub fn with_login(self, reply: Result<LoginResponse, AuthError>) -> Self {
        *self.login_reply.borrow_mut() = reply;
        self
    }

    pub fn with_logout(self, reply: Result<(), AuthError>) -> Self {
        *self.logout_reply.borrow_mut() = reply;
        self
    }
}

impl IdentityRefresher for FakeApi {
    fn fetch_current_identity(&self) -> LocalBoxFuture<'_, Result<CachedUser, AuthError>> {
        self.identity_calls.set(self.identity_calls.get() + 1);
        let reply = self.identity.borrow_mut().pop_front().unwrap_or_else(|| self.fallback.borrow().clone());
        match reply {
            Reply::User(user) => futures::future::ready(Ok(user)).boxed_local(),
            Reply::Fail(e) => futures::future::ready(Err(e)).boxed_local(),
            Reply::Hang => futures::future::pending().boxed_local(),
        }
    }
}

impl AuthApi for FakeApi {
    fn login<'a>(&'a self, _request: &'a LoginRequest) -> LocalBoxFuture<'a, Result<LoginResponse, AuthError>> {
        self.login_calls.set(self.login_calls.get() + 1);
        futures::future::ready(self.login_reply.borrow().clone()).boxed_local()
    }

    fn logout(&self) -> LocalBoxFuture<'_, Result<(), AuthError>> {
        self.logout_calls.set(self.logout_calls.get() + 1);
        futures::future::ready(self.logout_reply.borrow().clone()).boxed_local()
    }
}

pub fn user(id: &str, role: &str) -> CachedUser {
    CachedUser {
        id: id.to_owned(),
        role: role.to_owned(),
        email: format!("{id}@example.com"),
        first_name: "Test".to_owned(),
        last_name: "User".to_owned(),
        last_refreshed_at: 0,
    }
}

pub fn login_response(user: CachedUser) -> LoginResponse {
    LoginResponse { access_token: TOKEN.to_owned(), refresh_token: "refresh".to_owned(), user }
}
