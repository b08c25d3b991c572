//! Networking modules for the identity service.
//!
//! SYSTEM CONTEXT
//! ==============
//! `identity` defines the remote seams and the timed fetch, `api` implements
//! them over HTTP, and `types` defines the shared wire schema.

pub mod api;
pub mod identity;
pub mod types;
