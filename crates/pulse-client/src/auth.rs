use pulse_types::models::Role;

use crate::Status;

/// Local mirror of the authentication state: the token and role from the
/// last successful login, or the error from the last failed one.
#[derive(Debug, Default)]
pub struct AuthSession {
    token: Option<String>,
    role: Option<Role>,
    status: Status,
    error: Option<String>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login_started(&mut self) {
        self.status = Status::Loading;
        self.error = None;
    }

    pub fn login_succeeded(&mut self, token: String, role: Role) {
        self.token = Some(token);
        self.role = Some(role);
        self.status = Status::Idle;
        self.error = None;
    }

    pub fn login_failed(&mut self, message: impl Into<String>) {
        self.status = Status::Failed;
        self.error = Some(message.into());
    }

    /// Clears every piece of locally cached authorization state.
    pub fn logout(&mut self) {
        *self = Self::default();
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_success_stores_token_and_role() {
        let mut session = AuthSession::new();
        session.login_started();
        assert_eq!(session.status(), Status::Loading);

        session.login_succeeded("tok".into(), Role::Admin);
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("tok"));
        assert_eq!(session.role(), Some(Role::Admin));
        assert_eq!(session.status(), Status::Idle);
        assert!(session.error().is_none());
    }

    #[test]
    fn login_failure_keeps_a_visible_message() {
        let mut session = AuthSession::new();
        session.login_started();
        session.login_failed("Invalid credentials");

        assert!(!session.is_authenticated());
        assert_eq!(session.status(), Status::Failed);
        assert_eq!(session.error(), Some("Invalid credentials"));
    }

    #[test]
    fn a_new_attempt_clears_the_previous_error() {
        let mut session = AuthSession::new();
        session.login_failed("Invalid credentials");
        session.login_started();
        assert!(session.error().is_none());
    }

    #[test]
    fn logout_clears_everything() {
        let mut session = AuthSession::new();
        session.login_succeeded("tok".into(), Role::Viewer);
        session.logout();

        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.role().is_none());
        assert_eq!(session.status(), Status::Idle);
        assert!(session.error().is_none());
    }
}
