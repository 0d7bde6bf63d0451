//! Login against the built-in credential set.
//!
//! Credentials are plaintext constants: the tracker is a single-seat tool
//! and stored-credential encryption is out of scope. The session value is
//! handed to the frontend explicitly; there is no ambient current user.

use std::fmt;

/// Access level attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full access: catalogue maintenance and rental returns.
    Admin,
    /// Day-to-day desk work: browsing, searching, opening rentals.
    Operator,
}

impl Role {
    /// Whether this role may add, edit, or remove catalogue entries.
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Whether this role may close a rental. Returns are an admin task.
    pub fn can_return_rentals(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Operator => f.write_str("operator"),
        }
    }
}

/// An authenticated user for the duration of one login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Login name.
    pub username: String,
    /// Granted access level.
    pub role: Role,
}

struct Account {
    username: &'static str,
    password: &'static str,
    role: Role,
}

const ACCOUNTS: [Account; 2] = [
    Account {
        username: "admin",
        password: "admin123",
        role: Role::Admin,
    },
    Account {
        username: "operator",
        password: "operator123",
        role: Role::Operator,
    },
];

/// Check a username/password pair against the built-in accounts.
pub fn authenticate(username: &str, password: &str) -> Option<Session> {
    ACCOUNTS
        .iter()
        .find(|account| account.username == username && account.password == password)
        .map(|account| Session {
            username: account.username.to_string(),
            role: account.role,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_accounts_authenticate_with_their_roles() {
        let admin = authenticate("admin", "admin123").expect("admin login");
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.role.can_manage_catalog());
        assert!(admin.role.can_return_rentals());

        let operator = authenticate("operator", "operator123").expect("operator login");
        assert_eq!(operator.role, Role::Operator);
        assert!(!operator.role.can_manage_catalog());
        assert!(!operator.role.can_return_rentals());
    }

    #[test]
    fn wrong_credentials_are_rejected() {
        assert!(authenticate("admin", "wrong").is_none());
        assert!(authenticate("nobody", "admin123").is_none());
        assert!(authenticate("", "").is_none());
    }
}
