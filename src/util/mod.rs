//! Utility helpers shared by the session manager.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser concerns (storage, timers, token parsing)
//! from the session and guard logic so both run unchanged in native tests.

pub mod clock;
pub mod events;
pub mod roles;
pub mod storage;
pub mod token;
