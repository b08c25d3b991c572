//! Session services and the Leptos context that carries them.
//!
//! SYSTEM CONTEXT
//! ==============
//! The app root mounts [`AuthProvider`] once. It builds the `AuthStore`,
//! mirrors every state change into an `RwSignal<AuthState>` for views, and
//! starts silent hydration in the browser.
//!
//! DESIGN
//! ======
//! The services are `Rc`-based and single-threaded, so they travel through
//! context inside a local `StoredValue`; only the mirrored state signal is a
//! plain `Send + Sync` context value.

use std::rc::Rc;

use leptos::prelude::*;

use crate::config::AuthConfig;
use crate::guard::GuardContext;
use crate::net::api::HttpAuthApi;
use crate::net::identity::AuthApi;
use crate::state::auth::{AuthState, AuthStore};
use crate::state::credentials::CredentialStore;
use crate::util::clock::{Clock, SystemClock};
use crate::util::events::{self, AuthSuccess, EventChannel};

/// Everything a protected view needs, shared by all of them.
#[derive(Clone)]
pub struct AuthServices {
    pub config: Rc<AuthConfig>,
    pub auth: Rc<AuthStore>,
    pub api: Rc<dyn AuthApi>,
    pub clock: Rc<dyn Clock>,
}

impl AuthServices {
    pub fn new(
        config: AuthConfig,
        credentials: CredentialStore,
        api: Rc<dyn AuthApi>,
        events: EventChannel<AuthSuccess>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let auth = AuthStore::new(credentials, Rc::clone(&api), events, Rc::clone(&clock))
            .with_verification_timeout(config.verification_timeout);
        Self { config: Rc::new(config), auth: Rc::new(auth), api, clock }
    }

    /// Browser storage, HTTP identity service and the process-wide channel.
    pub fn browser(config: AuthConfig) -> Self {
        let credentials = CredentialStore::browser();
        let api = HttpAuthApi::new(config.api_base.clone(), credentials.clone());
        Self::new(config, credentials, Rc::new(api), events::auth_events(), Rc::new(SystemClock))
    }

    pub fn guard_context(&self) -> GuardContext {
        GuardContext {
            config: Rc::clone(&self.config),
            store: self.auth.credentials().clone(),
            auth: self.auth.clone(),
            refresher: self.api.clone(),
            events: self.auth.events().clone(),
            clock: Rc::clone(&self.clock),
        }
    }
}

/// Install `services` in context and return the mirrored state signal.
pub fn provide_auth_services(services: AuthServices) -> RwSignal<AuthState> {
    let state = RwSignal::new(services.auth.state());
    let mirror = services.auth.subscribe(move |next| state.set(next.clone()));
    // Detached when the owning reactive scope is disposed.
    StoredValue::new_local(mirror);

    #[cfg(feature = "hydrate")]
    {
        let auth = Rc::clone(&services.auth);
        leptos::task::spawn_local(async move {
            auth.hydrate().await;
        });
    }

    provide_context(state);
    provide_context(StoredValue::new_local(services));
    state
}

/// Services installed by the nearest [`AuthProvider`].
pub fn use_auth_services() -> AuthServices {
    expect_context::<StoredValue<AuthServices, LocalStorage>>().get_value()
}

/// Root provider for the session manager.
#[component]
pub fn AuthProvider(#[prop(optional)] config: Option<AuthConfig>, children: Children) -> impl IntoView {
    let config = config.unwrap_or_else(AuthConfig::from_build_env);
    log::debug!("auth provider mounted: api_base={}", config.api_base);
    provide_auth_services(AuthServices::browser(config));
    children()
}
