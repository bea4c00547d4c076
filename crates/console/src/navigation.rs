//! Sidebar contents for the current session.

use serde::Serialize;

use omnicorp_auth::AdminPolicy;

use crate::store::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavIcon {
    Dashboard,
    People,
    Settings,
    Extension,
    /// Icon name supplied by a module record.
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: String,
    pub path: String,
    pub icon: NavIcon,
}

impl NavItem {
    fn new(label: &str, path: &str, icon: NavIcon) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
            icon,
        }
    }

    pub fn is_active(&self, current_path: &str) -> bool {
        self.path == current_path
    }
}

/// Three sections, top to bottom. `administration` is empty for non-admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Sidebar {
    pub main: Vec<NavItem>,
    pub administration: Vec<NavItem>,
    pub modules: Vec<NavItem>,
}

pub fn sidebar(state: &AppState, policy: &AdminPolicy) -> Sidebar {
    let admin = policy.authorize(&state.session).is_ok();

    let mut main = vec![NavItem::new("Dashboard", "/", NavIcon::Dashboard)];
    let mut administration = Vec::new();
    if admin {
        main.extend([
            NavItem::new("Users", "/users", NavIcon::People),
            NavItem::new("Profiles", "/profiles", NavIcon::Settings),
            NavItem::new("Settings", "/settings", NavIcon::Settings),
        ]);
        administration.extend([
            NavItem::new("Users", "/admin/users", NavIcon::People),
            NavItem::new("Modules", "/admin/modules", NavIcon::Extension),
        ]);
    }

    let modules = state
        .modules
        .items()
        .iter()
        .filter(|m| m.is_active)
        .map(|m| NavItem {
            label: m.name.clone(),
            path: m.url.clone(),
            icon: m
                .icon
                .clone()
                .map(NavIcon::Named)
                .unwrap_or(NavIcon::Extension),
        })
        .collect();

    Sidebar {
        main,
        administration,
        modules,
    }
}
