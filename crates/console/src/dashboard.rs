//! Landing page view model.

use serde::Serialize;

use omnicorp_auth::Session;

use crate::navigation::NavIcon;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub title: &'static str,
    pub count: u32,
    pub icon: NavIcon,
    /// CSS color of the icon.
    pub accent: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub greeting: String,
    pub cards: Vec<StatCard>,
}

// Placeholder figures until the backend exposes counters.
fn stat_cards() -> Vec<StatCard> {
    vec![
        StatCard {
            title: "Users",
            count: 15,
            icon: NavIcon::People,
            accent: "#1976d2",
        },
        StatCard {
            title: "Modules",
            count: 8,
            icon: NavIcon::Extension,
            accent: "#2e7d32",
        },
        StatCard {
            title: "Wiki articles",
            count: 24,
            icon: NavIcon::Named("article".to_string()),
            accent: "#ed6c02",
        },
        StatCard {
            title: "Tasks",
            count: 12,
            icon: NavIcon::Named("checklist".to_string()),
            accent: "#9c27b0",
        },
    ]
}

pub fn dashboard(session: &Session) -> Dashboard {
    let greeting = match session.current_user() {
        Some(user) => format!("Welcome, {}!", user.display_name()),
        None => "Welcome!".to_string(),
    };
    Dashboard {
        greeting,
        cards: stat_cards(),
    }
}
