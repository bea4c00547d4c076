//! Route protection derived from session state.

use serde::Serialize;

use crate::session::{Session, SessionStatus};

/// Entry point unauthenticated visitors are sent to.
pub const LOGIN_PATH: &str = "/login";

/// What a protected view should do for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session is authenticated: render the protected view.
    Render,
    /// Authentication is in progress: render nothing (never stale content).
    Wait,
    /// Anonymous or rejected: navigate to [`LOGIN_PATH`].
    RedirectToLogin,
}

/// Pure derivation, evaluated on every protected navigation.
pub fn guard(session: &Session) -> GuardDecision {
    match session.status() {
        SessionStatus::Authenticated => GuardDecision::Render,
        SessionStatus::Pending => GuardDecision::Wait,
        SessionStatus::Anonymous | SessionStatus::Rejected => GuardDecision::RedirectToLogin,
    }
}
