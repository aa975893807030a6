//! In-memory user store.
//!
//! Passwords are kept as blake3 digests. The store backs the login endpoint
//! and the guard's `user_id` lookups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;

use bearer_guard_auth::{Authenticatable, UserProvider};
use bearer_guard_core::{Credentials, UserId};

/// Credential field naming the user.
const EMAIL_FIELD: &str = "email";

/// Credential field holding the password.
const PASSWORD_FIELD: &str = "password";

/// A registered user.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// User identifier, written to the `user_id` claim.
    pub id: UserId,
    /// Login email.
    pub email: String,
    #[serde(skip)]
    password_digest: blake3::Hash,
}

impl User {
    fn password_matches(&self, password: &str) -> bool {
        // blake3::Hash equality is constant-time
        self.password_digest == blake3::hash(password.as_bytes())
    }
}

impl Authenticatable for User {
    fn auth_identifier(&self) -> UserId {
        self.id.clone()
    }
}

/// A [`UserProvider`] over an in-memory map.
#[derive(Debug, Default)]
pub struct InMemoryUserProvider {
    users: RwLock<HashMap<UserId, User>>,
    next_id: AtomicU64,
}

impl InMemoryUserProvider {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, assigning the next numeric identifier.
    ///
    /// An existing user with the same email keeps its identifier and gets the new password.
    pub fn register(&self, email: impl Into<String>, password: &str) -> User {
        let email = email.into();
        let mut users = self.users.write();

        let id = users
            .values()
            .find(|user| user.email == email)
            .map_or_else(
                || UserId::from(self.next_id.fetch_add(1, Ordering::Relaxed) + 1),
                |user| user.id.clone(),
            );

        let user = User {
            id: id.clone(),
            email,
            password_digest: blake3::hash(password.as_bytes()),
        };
        users.insert(id, user.clone());
        tracing::debug!(user_id = %user.id, "Registered user");
        user
    }

    /// Number of registered users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns `true` if no users are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl UserProvider for InMemoryUserProvider {
    type User = User;

    fn retrieve_by_id(&self, id: &UserId) -> Option<User> {
        self.users.read().get(id).cloned()
    }

    fn retrieve_by_credentials(&self, credentials: &Credentials) -> Option<User> {
        let email = credentials.get(EMAIL_FIELD)?;
        self.users
            .read()
            .values()
            .find(|user| &user.email == email)
            .cloned()
    }

    fn validate_credentials(&self, user: &User, credentials: &Credentials) -> bool {
        credentials
            .get(PASSWORD_FIELD)
            .is_some_and(|password| user.password_matches(password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials::from([
            (EMAIL_FIELD.to_string(), email.to_string()),
            (PASSWORD_FIELD.to_string(), password.to_string()),
        ])
    }

    #[test]
    fn register_assigns_sequential_ids() {
        let users = InMemoryUserProvider::new();
        let ada = users.register("ada@example.com", "hunter2");
        let bob = users.register("bob@example.com", "swordfish");

        assert_eq!(ada.id.as_str(), "1");
        assert_eq!(bob.id.as_str(), "2");
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn register_existing_email_replaces_password() {
        let users = InMemoryUserProvider::new();
        let first = users.register("ada@example.com", "hunter2");
        let second = users.register("ada@example.com", "correct horse");

        assert_eq!(first.id, second.id);
        assert_eq!(users.len(), 1);
        assert!(!users.validate_credentials(&second, &credentials("ada@example.com", "hunter2")));
        assert!(users.validate_credentials(&second, &credentials("ada@example.com", "correct horse")));
    }

    #[test]
    fn retrieve_by_id_and_credentials() {
        let users = InMemoryUserProvider::new();
        let ada = users.register("ada@example.com", "hunter2");

        assert_eq!(users.retrieve_by_id(&ada.id).unwrap().email, "ada@example.com");
        assert!(users.retrieve_by_id(&UserId::from(42_u64)).is_none());

        let found = users
            .retrieve_by_credentials(&credentials("ada@example.com", "whatever"))
            .unwrap();
        assert_eq!(found.id, ada.id);
        assert!(users
            .retrieve_by_credentials(&Credentials::new())
            .is_none());
    }

    #[test]
    fn validate_credentials_checks_password() {
        let users = InMemoryUserProvider::new();
        let ada = users.register("ada@example.com", "hunter2");

        assert!(users.validate_credentials(&ada, &credentials("ada@example.com", "hunter2")));
        assert!(!users.validate_credentials(&ada, &credentials("ada@example.com", "hunter3")));
        assert!(!users.validate_credentials(&ada, &Credentials::new()));
    }

    #[test]
    fn serialized_user_omits_password() {
        let users = InMemoryUserProvider::new();
        let ada = users.register("ada@example.com", "hunter2");

        let json = serde_json::to_value(&ada).unwrap();
        assert_eq!(json, serde_json::json!({"id": "1", "email": "ada@example.com"}));
    }
}
