//! Layout shell: navigation items, page titles and the header identity

use tracing::warn;

use crate::application::{AuthOutcome, AuthProvider, Resource};
use crate::domain::Identity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub title: &'static str,
    pub icon: &'static str,
    pub path: String,
}

impl NavItem {
    fn dashboard() -> Self {
        Self {
            title: "Dashboard",
            icon: "layout-dashboard",
            path: "/".to_string(),
        }
    }

    /// Top-level resources with an icon get an entry.
    fn for_resource(resource: Resource) -> Option<Self> {
        if resource.parent().is_some() {
            return None;
        }
        Some(Self {
            title: resource.label(),
            icon: resource.icon()?,
            path: resource.list_path(),
        })
    }
}

/// Dashboard first, then the registry in order.
pub fn nav_items() -> Vec<NavItem> {
    std::iter::once(NavItem::dashboard())
        .chain(Resource::ALL.into_iter().filter_map(NavItem::for_resource))
        .collect()
}

/// Exact match only: `/users/create` does not light up "Users".
pub fn is_active(item: &NavItem, current_path: &str) -> bool {
    item.path == current_path
}

/// Header title; anything off the nav list reads "Dashboard".
pub fn page_title(current_path: &str) -> &'static str {
    nav_items()
        .iter()
        .find(|item| is_active(item, current_path))
        .map(|item| item.title)
        .unwrap_or("Dashboard")
}

/// State of one mounted layout.
#[derive(Debug, Default)]
pub struct Shell {
    collapsed: bool,
    identity: Option<Identity>,
    identity_loaded: bool,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_sidebar(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Fetch the identity on first call; later calls reuse it.
    pub async fn load_identity(&mut self, auth: &AuthProvider) -> Option<&Identity> {
        if !self.identity_loaded {
            self.identity = match auth.get_identity().await {
                Ok(identity) => identity,
                Err(err) => {
                    warn!(error = %err, "Could not load identity");
                    None
                }
            };
            self.identity_loaded = true;
        }
        self.identity.as_ref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// First name, or "Admin" before the identity is known.
    pub fn display_name(&self) -> &str {
        self.identity
            .as_ref()
            .map(|i| i.first_name())
            .filter(|n| !n.is_empty())
            .unwrap_or("Admin")
    }

    pub fn avatar_initial(&self) -> char {
        self.identity
            .as_ref()
            .and_then(|i| i.name.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('A')
    }

    pub fn nav(&self, current_path: &str) -> Vec<(NavItem, bool)> {
        nav_items()
            .into_iter()
            .map(|item| {
                let active = is_active(&item, current_path);
                (item, active)
            })
            .collect()
    }

    pub async fn sign_out(&mut self, auth: &AuthProvider) -> AuthOutcome {
        let outcome = auth.logout().await;
        if outcome.success {
            self.identity = None;
            self.identity_loaded = false;
        }
        outcome
    }
}
