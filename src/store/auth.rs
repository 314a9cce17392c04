//! Authentication state container.
//!
//! One [`AuthStore`] is created at startup and handed to whoever needs it
//! (API client, app state).  Initialisation is: load the persisted value →
//! hydrate the store → subscribers observe it through a `watch` channel.
//! Every mutation persists first, then notifies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::kv::{KeyValueStore, MemoryStore, StoreError};
use crate::core::model::User;

/// Storage key for the persisted session.
pub const AUTH_KEY: &str = "juris-auth";

/// What we remember between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Cloneable handle; all clones share the same state.
#[derive(Clone)]
pub struct AuthStore {
    kv: Arc<dyn KeyValueStore>,
    tx: Arc<watch::Sender<AuthSession>>,
}

impl AuthStore {
    /// Hydrate from `kv`.  A missing or unreadable value means logged out.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let session = match kv.get(AUTH_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<AuthSession>(&raw) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("discarding corrupt auth session: {e}");
                    AuthSession::default()
                }
            },
            Ok(None) => AuthSession::default(),
            Err(e) => {
                tracing::warn!("could not read auth session: {e}");
                AuthSession::default()
            }
        };
        tracing::debug!(authenticated = session.is_authenticated(), "auth store hydrated");

        let (tx, _rx) = watch::channel(session);
        Self {
            kv,
            tx: Arc::new(tx),
        }
    }

    /// A store that persists nowhere.
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStore::default()))
    }

    pub fn snapshot(&self) -> AuthSession {
        self.tx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.tx.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    /// Receive every future change (and the current value).
    pub fn subscribe(&self) -> watch::Receiver<AuthSession> {
        self.tx.subscribe()
    }

    /// Called after a successful login.
    pub fn set_session(&self, token: String, user: User) -> Result<(), StoreError> {
        self.commit(AuthSession {
            token: Some(token),
            user: Some(user),
        })
    }

    /// Refresh the cached user without touching the token.
    pub fn set_user(&self, user: User) -> Result<(), StoreError> {
        let mut session = self.snapshot();
        session.user = Some(user);
        self.commit(session)
    }

    /// Logout: forget token and user.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.commit(AuthSession::default())
    }

    fn commit(&self, session: AuthSession) -> Result<(), StoreError> {
        if session == AuthSession::default() {
            self.kv.remove(AUTH_KEY)?;
        } else {
            self.kv.set(AUTH_KEY, &serde_json::to_string(&session)?)?;
        }
        self.tx.send_replace(session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::FileStore;

    fn user() -> User {
        User {
            id: Some("u1".into()),
            email: "ada@example.com".into(),
            first_name: Some("Ada".into()),
            last_name: None,
        }
    }

    #[test]
    fn session_survives_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(tmp.path()));

        let store = AuthStore::load(Arc::clone(&kv));
        assert!(!store.is_authenticated());
        store.set_session("tok".into(), user()).unwrap();

        let reloaded = AuthStore::load(kv);
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.token().as_deref(), Some("tok"));
        assert_eq!(reloaded.user(), Some(user()));
    }

    #[test]
    fn clear_removes_persisted_value() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        let store = AuthStore::load(Arc::clone(&kv));
        store.set_session("tok".into(), user()).unwrap();
        store.clear().unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(kv.get(AUTH_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_value_means_logged_out() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        kv.set(AUTH_KEY, "{not json").unwrap();
        let store = AuthStore::load(kv);
        assert_eq!(store.snapshot(), AuthSession::default());
    }

    #[test]
    fn subscribers_see_changes_from_any_clone() {
        let store = AuthStore::in_memory();
        let mut rx = store.subscribe();
        assert!(!rx.borrow_and_update().is_authenticated());

        let other = store.clone();
        other.set_session("tok".into(), user()).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        store.set_user(User {
            email: "new@example.com".into(),
            ..user()
        })
        .unwrap();
        assert_eq!(rx.borrow().user.as_ref().map(|u| u.email.as_str()), Some("new@example.com"));
        assert_eq!(other.token().as_deref(), Some("tok"));
    }
}
