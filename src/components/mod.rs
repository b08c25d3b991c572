//! Leptos components wiring the session manager into an app.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthProvider` sits at the app root and owns the session services;
//! `ProtectedRoute` wraps each admin or client view and renders it only once
//! the route guard grants access.

pub mod auth_provider;
pub mod protected_route;
