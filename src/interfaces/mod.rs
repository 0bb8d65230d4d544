//! Outer surface: routing, layout shell, page controllers and display
//! formatting.

pub mod display;
pub mod navigation;
pub mod pages;
pub mod routes;

pub use navigation::{nav_items, NavItem, Shell};
pub use routes::{GuardDecision, Route, RouteGuard, ACCESS_DENIED_PATH};
