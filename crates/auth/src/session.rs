//! Session lifecycle state machine.
//!
//! Transitions are pure: `Session::apply` takes an event and returns the next
//! session (or why the event was refused). Network calls, persistence and
//! subscriber notification all live in the console crate.
//!
//! ```text
//! Anonymous --login/restore--> Pending --ok--> Authenticated
//!                                 |                  |
//!                                 +--rejected--> Rejected --dismiss--> Anonymous
//! Authenticated --logout / 401--> Anonymous
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use omnicorp_core::User;

use crate::credential::Credential;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Pending,
    Authenticated,
    Rejected,
}

impl core::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionStatus::Anonymous => write!(f, "anonymous"),
            SessionStatus::Pending => write!(f, "pending"),
            SessionStatus::Authenticated => write!(f, "authenticated"),
            SessionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Logical lifetime of one authentication attempt.
///
/// A new epoch opens on every login/restore start, logout and invalidation.
/// Results carrying an older epoch are refused, which makes logout the final
/// word for everything that was in flight before it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inputs to the session state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// User submitted the login form.
    LoginStarted,
    /// A persisted credential was found at startup.
    RestoreStarted { credential: Credential },
    /// The token endpoint accepted the login; the profile is not loaded yet.
    CredentialIssued { epoch: SessionEpoch, credential: Credential },
    /// Current-user profile loaded for the credential of `epoch`.
    Authenticated { epoch: SessionEpoch, credential: Credential, user: User },
    /// Login refused (bad password, backend down, profile fetch failed).
    LoginRejected { epoch: SessionEpoch, message: String },
    /// Persisted credential turned out to be unusable.
    RestoreFailed { epoch: SessionEpoch },
    /// Fresh copy of the current user for an authenticated session.
    UserRefreshed { epoch: SessionEpoch, user: User },
    /// Explicit logout.
    LoggedOut,
    /// The backend answered 401 to some request.
    Invalidated,
    /// Login error acknowledged by the user.
    ErrorDismissed,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::LoginStarted => "login_started",
            SessionEvent::RestoreStarted { .. } => "restore_started",
            SessionEvent::CredentialIssued { .. } => "credential_issued",
            SessionEvent::Authenticated { .. } => "authenticated",
            SessionEvent::LoginRejected { .. } => "login_rejected",
            SessionEvent::RestoreFailed { .. } => "restore_failed",
            SessionEvent::UserRefreshed { .. } => "user_refreshed",
            SessionEvent::LoggedOut => "logged_out",
            SessionEvent::Invalidated => "invalidated",
            SessionEvent::ErrorDismissed => "error_dismissed",
        }
    }

    fn epoch(&self) -> Option<SessionEpoch> {
        match self {
            SessionEvent::CredentialIssued { epoch, .. }
            | SessionEvent::Authenticated { epoch, .. }
            | SessionEvent::LoginRejected { epoch, .. }
            | SessionEvent::RestoreFailed { epoch }
            | SessionEvent::UserRefreshed { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }
}

/// Why an event did not produce a new session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionRejection {
    #[error("stale {event} result from epoch {got} (current {current})")]
    Stale {
        event: &'static str,
        got: SessionEpoch,
        current: SessionEpoch,
    },

    #[error("{event} is not valid while {from}")]
    InvalidTransition {
        event: &'static str,
        from: SessionStatus,
    },
}

/// Client-side view of the authenticated session.
///
/// # Invariants
/// - `Authenticated` implies both credential and current user are present.
/// - `Anonymous` implies both are absent.
/// - `last_error` is only set while `Rejected`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    credential: Option<Credential>,
    current_user: Option<User>,
    status: SessionStatus,
    last_error: Option<String>,
    epoch: SessionEpoch,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn is_pending(&self) -> bool {
        self.status == SessionStatus::Pending
    }

    /// Compute the session that results from `event`.
    ///
    /// No IO, no panics; refusing an event leaves the caller's session intact.
    pub fn apply(&self, event: &SessionEvent) -> Result<Session, SessionRejection> {
        if let Some(got) = event.epoch() {
            if got != self.epoch {
                return Err(SessionRejection::Stale {
                    event: event.name(),
                    got,
                    current: self.epoch,
                });
            }
        }

        let refuse = || SessionRejection::InvalidTransition {
            event: event.name(),
            from: self.status,
        };

        match event {
            SessionEvent::LoginStarted => match self.status {
                SessionStatus::Anonymous | SessionStatus::Rejected => Ok(Session {
                    status: SessionStatus::Pending,
                    epoch: self.epoch.next(),
                    ..Session::default()
                }),
                _ => Err(refuse()),
            },

            SessionEvent::RestoreStarted { credential } => match self.status {
                SessionStatus::Anonymous => Ok(Session {
                    credential: Some(credential.clone()),
                    status: SessionStatus::Pending,
                    epoch: self.epoch.next(),
                    ..Session::default()
                }),
                _ => Err(refuse()),
            },

            SessionEvent::CredentialIssued { credential, .. } => match self.status {
                SessionStatus::Pending => Ok(Session {
                    credential: Some(credential.clone()),
                    ..self.clone()
                }),
                _ => Err(refuse()),
            },

            SessionEvent::Authenticated { credential, user, .. } => match self.status {
                SessionStatus::Pending => Ok(Session {
                    credential: Some(credential.clone()),
                    current_user: Some(user.clone()),
                    status: SessionStatus::Authenticated,
                    last_error: None,
                    epoch: self.epoch,
                }),
                _ => Err(refuse()),
            },

            SessionEvent::LoginRejected { message, .. } => match self.status {
                SessionStatus::Pending => Ok(Session {
                    status: SessionStatus::Rejected,
                    last_error: Some(message.clone()),
                    epoch: self.epoch,
                    ..Session::default()
                }),
                _ => Err(refuse()),
            },

            SessionEvent::RestoreFailed { .. } => match self.status {
                SessionStatus::Pending | SessionStatus::Authenticated => Ok(Session {
                    epoch: self.epoch.next(),
                    ..Session::default()
                }),
                _ => Err(refuse()),
            },

            SessionEvent::UserRefreshed { user, .. } => match self.status {
                SessionStatus::Authenticated => Ok(Session {
                    current_user: Some(user.clone()),
                    ..self.clone()
                }),
                _ => Err(refuse()),
            },

            SessionEvent::LoggedOut | SessionEvent::Invalidated => Ok(Session {
                epoch: self.epoch.next(),
                ..Session::default()
            }),

            SessionEvent::ErrorDismissed => match self.status {
                SessionStatus::Rejected => Ok(Session {
                    epoch: self.epoch,
                    ..Session::default()
                }),
                SessionStatus::Anonymous => Ok(self.clone()),
                _ => Err(refuse()),
            },
        }
    }
}
