//! Notifications module
//!
//! Auth-state changes (sign in/out, token refresh, password recovery)
//! published by the session store and observed by pages.

pub mod event_bus;
pub mod events;

pub use event_bus::{AuthEventBus, AuthEventSubscriber};
pub use events::AuthEventMessage;
