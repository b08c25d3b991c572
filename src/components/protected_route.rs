//! Route wrapper rendering its children only for admitted users.
//!
//! Re-checks on every pathname or auth-state change. Navigating away cancels
//! the pending identity fetch, and only an outcome computed for the current
//! pathname is ever applied. Redirects replace the history entry so the back
//! button never lands on a view the user was bounced from.

use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::components::auth_provider::use_auth_services;
use crate::guard::{GuardOutcome, GuardSpec, RouteGuard};
use crate::state::auth::AuthState;
use crate::util::roles::Section;

#[component]
pub fn ProtectedRoute(
    section: Section,
    #[prop(optional)] allowed_roles: Vec<String>,
    children: ChildrenFn,
) -> impl IntoView {
    let services = use_auth_services();
    let auth = expect_context::<RwSignal<AuthState>>();
    let pathname = use_location().pathname;
    let navigate = use_navigate();

    let guard = Rc::new(RouteGuard::new(GuardSpec::new(section).allow(allowed_roles), services.guard_context()));
    let guard = StoredValue::new_local(guard);
    let outcome = RwSignal::new(GuardOutcome::RenderLoading);

    Effect::new(move |previous: Option<String>| {
        let path = pathname.get();
        auth.track();

        let guard = guard.get_value();
        if previous.as_deref().is_some_and(|p| p != path) {
            guard.cancel();
        }
        let navigate = navigate.clone();
        leptos::task::spawn_local(async move {
            // An in-flight check picks up the new path itself.
            let Some(next) = guard.check_latest(move || pathname.get_untracked()).await else {
                return;
            };
            if let GuardOutcome::Redirect(redirect) = &next {
                log::info!("{section} guard redirecting -> {}", redirect.to);
                navigate(&redirect.href(), NavigateOptions { replace: true, ..NavigateOptions::default() });
            }
            outcome.set(next);
        });
        path
    });

    on_cleanup(move || {
        guard.try_with_value(|g| g.cancel());
    });

    view! {
        <Show
            when=move || outcome.get().is_granted()
            fallback=|| view! { <div class="auth-guard-loading">"Checking access..."</div> }
        >
            {children()}
        </Show>
    }
}
