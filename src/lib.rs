//! Client-side authentication session manager and route guard for the
//! yacht-charter web app.
//!
//! The crate keeps a browser session alive across reloads and tabs, restores
//! it silently on startup, and decides for every admin or client view whether
//! the current user may see it. Credentials live in browser storage; identity
//! is confirmed against a remote service only when local evidence is not
//! enough.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`state::credentials`] | Sole read/write authority over stored credentials and login markers |
//! | [`state::session`] | Local session validation and silent restore |
//! | [`state::auth`] | `AuthState` lifecycle: hydrate, login, logout, refresh |
//! | [`net::identity`] | Identity-service traits and the timed, cancellable fetch |
//! | [`net::api`] | `gloo-net` client for the identity service |
//! | [`util::events`] | Typed pub/sub carrying the `authSuccess` signal |
//! | [`guard`] | Per-view access decisions and redirects |
//! | [`components`] | Leptos provider and `ProtectedRoute` wrapper |
//! | [`config`] | Paths, trust window and verification limits |

pub mod components;
pub mod config;
pub mod error;
pub mod guard;
pub mod net;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_support;

/// Route `log` output to the browser console and install the panic hook.
#[cfg(feature = "hydrate")]
pub fn init_browser_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"console logger already installed".into());
    }
}
