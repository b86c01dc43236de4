//! Per-realm credential cache
//!
//! Each realm a server challenged us for owns one [`CredentialsCacheEntry`]:
//! the credentials last used for it plus the branch identifiers of the
//! retried transactions those credentials were sent with. A challenge that
//! comes back on one of those branches means the credentials were rejected
//! for that exact attempt.
//!
//! The cache is backed by [`DashMap`], so readers inspecting cached
//! authorization headers never wait on a challenge being processed.

use dashmap::DashMap;
use std::fmt;

use crate::types::Authorization;

/// A username/password pair
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub username: String,
    /// `None` when no secret is known, `Some("")` for a placeholder
    pub password: Option<String>,
    /// Whether the secret should be written to the secret store
    pub persistent: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            persistent: false,
        }
    }

    /// Credentials with a username but no secret yet
    pub fn username_only(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            persistent: false,
        }
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

// Keep secrets out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("persistent", &self.persistent)
            .finish()
    }
}

/// Credentials for one realm and the branches they are in flight on
#[derive(Debug, Clone, Default)]
pub struct CredentialsCacheEntry {
    pub credentials: Option<Credentials>,
    transaction_history: Vec<String>,
}

impl CredentialsCacheEntry {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            transaction_history: Vec::new(),
        }
    }

    /// Record `branch_id` as awaiting confirmation; duplicates are kept
    pub fn push_branch_id(&mut self, branch_id: impl Into<String>) {
        self.transaction_history.push(branch_id.into());
    }

    /// Remove one occurrence of `branch_id`, returning whether it was there
    pub fn pop_branch_id(&mut self, branch_id: &str) -> bool {
        match self.transaction_history.iter().position(|b| b == branch_id) {
            Some(idx) => {
                self.transaction_history.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains_branch_id(&self, branch_id: &str) -> bool {
        self.transaction_history.iter().any(|b| b == branch_id)
    }

    /// Branches still awaiting confirmation, oldest first
    pub fn branch_ids(&self) -> &[String] {
        &self.transaction_history
    }
}

/// Realm → entry map plus a Call-ID → authorization side cache
#[derive(Debug, Default)]
pub struct CredentialsCache {
    authenticated_realms: DashMap<String, CredentialsCacheEntry>,
    authenticated_calls: DashMap<String, Authorization>,
}

impl CredentialsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detach the entry for `realm` so it can be mutated
    pub fn remove(&self, realm: &str) -> Option<CredentialsCacheEntry> {
        self.authenticated_realms.remove(realm).map(|(_, entry)| entry)
    }

    /// Store or overwrite the entry for `realm`
    pub fn cache_entry(&self, realm: impl Into<String>, entry: CredentialsCacheEntry) {
        self.authenticated_realms.insert(realm.into(), entry);
    }

    /// Snapshot of the entry for `realm`
    pub fn get(&self, realm: &str) -> Option<CredentialsCacheEntry> {
        self.authenticated_realms.get(realm).map(|e| e.value().clone())
    }

    pub fn contains_realm(&self, realm: &str) -> bool {
        self.authenticated_realms.contains_key(realm)
    }

    pub fn realms(&self) -> Vec<String> {
        self.authenticated_realms.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.authenticated_realms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticated_realms.is_empty()
    }

    /// Remember the last authorization sent on a call
    pub fn cache_authorization_header(&self, call_id: impl Into<String>, header: Authorization) {
        self.authenticated_calls.insert(call_id.into(), header);
    }

    pub fn get_cached_authorization_header(&self, call_id: &str) -> Option<Authorization> {
        self.authenticated_calls.get(call_id).map(|h| h.value().clone())
    }

    /// Drop every realm entry
    pub fn clear(&self) {
        self.authenticated_realms.clear();
    }
}
