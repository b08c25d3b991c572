//! Session state modules.
//!
//! `credentials` owns browser storage, `session` validates and restores what
//! it holds, and `auth` exposes the resulting `AuthState` to the app.

pub mod auth;
pub mod credentials;
pub mod session;
