//! Read-only view of the authentication collaborator's session keys.

use storage::{KeyValueStore, keys};

use crate::error::DomainError;

/// The signed-in user, as left in the store by the login flow.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

impl AuthSession {
    /// Reads the session; `None` when nobody is signed in.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Self>, DomainError> {
        let Some(token) = non_empty(store.get(keys::AUTH_TOKEN)?) else {
            return Ok(None);
        };

        Ok(Some(Self {
            token,
            name: non_empty(store.get(keys::AUTH_NAME)?),
            role: non_empty(store.get(keys::AUTH_ROLE)?),
        }))
    }

    /// Returns the `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::InMemoryStore;

    #[test]
    fn test_missing_token_means_anonymous() {
        let store = InMemoryStore::new();
        store.set(keys::AUTH_NAME, "Ana").unwrap();
        assert!(AuthSession::load(&store).unwrap().is_none());

        store.set(keys::AUTH_TOKEN, "  ").unwrap();
        assert!(AuthSession::load(&store).unwrap().is_none());
    }

    #[test]
    fn test_reads_all_keys() {
        let store = InMemoryStore::new();
        store.set(keys::AUTH_TOKEN, "abc").unwrap();
        store.set(keys::AUTH_NAME, "Ana").unwrap();

        let session = AuthSession::load(&store).unwrap().unwrap();
        assert_eq!(session.bearer(), "Bearer abc");
        assert_eq!(session.name.as_deref(), Some("Ana"));
        assert!(session.role.is_none());
        assert!(!format!("{session:?}").contains("abc"));
    }
}
