//! Session state: authentication status, the signed-in user and a transient
//! error message.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::user::User;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthStatus {
    /// Initial state, and the transient state while a login is in flight.
    #[default]
    Checking,
    Authenticated,
    NotAuthenticated,
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthStatus::Checking => "checking",
            AuthStatus::Authenticated => "authenticated",
            AuthStatus::NotAuthenticated => "not-authenticated",
        };
        f.write_str(s)
    }
}

/// Transitions on [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Checking,
    Login(User),
    Logout(Option<String>),
    ClearErrorMessage,
}

/// Invariant: `status == Authenticated` if and only if `user` is `Some`.
/// Fields are private so the reducer is the only way to change them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    status: AuthStatus,
    user: Option<User>,
    error_message: Option<String>,
}

impl Session {
    /// The session after a logout with no error to show.
    pub fn logged_out() -> Self {
        Session {
            status: AuthStatus::NotAuthenticated,
            user: None,
            error_message: None,
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.status
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::Checking => {
                self.status = AuthStatus::Checking;
                self.user = None;
                self.error_message = None;
            }
            SessionAction::Login(user) => {
                self.status = AuthStatus::Authenticated;
                self.user = Some(user);
                self.error_message = None;
            }
            SessionAction::Logout(message) => {
                self.status = AuthStatus::NotAuthenticated;
                self.user = None;
                self.error_message = message;
            }
            SessionAction::ClearErrorMessage => {
                self.error_message = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated() -> Session {
        let mut session = Session::default();
        session.apply(SessionAction::Login(User::new("u-1", "Test User")));
        session
    }

    #[test]
    fn test_initial_state_is_checking() {
        let session = Session::default();
        assert_eq!(session.status(), AuthStatus::Checking);
        assert!(session.user().is_none());
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_checking_clears_user() {
        let mut session = authenticated();
        session.apply(SessionAction::Checking);
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_login() {
        let session = authenticated();
        assert_eq!(session.status(), AuthStatus::Authenticated);
        assert_eq!(session.user(), Some(&User::new("u-1", "Test User")));
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_logout() {
        let mut session = authenticated();
        session.apply(SessionAction::Logout(None));
        assert_eq!(session, Session::logged_out());
    }

    #[test]
    fn test_logout_with_error_then_clear() {
        let mut session = authenticated();
        session.apply(SessionAction::Logout(Some("Bad credentials".into())));
        assert_eq!(session.status(), AuthStatus::NotAuthenticated);
        assert!(session.user().is_none());
        assert_eq!(session.error_message(), Some("Bad credentials"));

        session.apply(SessionAction::ClearErrorMessage);
        assert_eq!(session, Session::logged_out());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AuthStatus::NotAuthenticated.to_string(), "not-authenticated");
    }
}
