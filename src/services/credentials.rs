//! Credential resolution for controller authentication.
//!
//! The submitter never looks credentials up by itself: the caller injects a
//! [`CredentialResolver`] that turns a credential id into a concrete
//! [`Credential`]. Two resolvers are provided: an in-memory map for tests and
//! embedding runners that manage secrets themselves, and one backed by the
//! OS keychain (Keychain on macOS, Credential Manager on Windows, Secret
//! Service on Linux).

use crate::error::TowerError;
use keyring::Entry;
use std::collections::HashMap;

/// Service name used in the keychain.
const SERVICE_NAME: &str = "tower-project-sync";

/// A resolved controller credential.
#[derive(Clone)]
pub enum Credential {
    /// OAuth2 / personal access token, sent as `Authorization: Bearer`.
    Token(String),

    /// Username and password, sent as HTTP basic auth.
    Basic { username: String, password: String },
}

impl Credential {
    /// Create a token credential.
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Create a basic-auth credential.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Manual Debug so secrets never end up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => write!(f, "Credential::Token(***)"),
            Self::Basic { username, .. } => {
                write!(f, "Credential::Basic {{ username: {:?}, password: *** }}", username)
            }
        }
    }
}

/// Capability for turning a credential id into a credential.
pub trait CredentialResolver {
    /// Resolve `id` to a credential.
    ///
    /// Returns `NotFound` when the id is unknown and `CredentialStorage` when
    /// the backing store itself fails.
    fn resolve(&self, id: &str) -> Result<Credential, TowerError>;
}

/// In-memory credential map.
#[derive(Default)]
pub struct StaticCredentials {
    entries: HashMap<String, Credential>,
}

impl StaticCredentials {
    /// Create an empty credential map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credential under an id.
    pub fn insert(&mut self, id: impl Into<String>, credential: Credential) {
        self.entries.insert(id.into(), credential);
    }
}

impl CredentialResolver for StaticCredentials {
    fn resolve(&self, id: &str) -> Result<Credential, TowerError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| TowerError::not_found_with_id("credential", id))
    }
}

/// Credential resolver backed by the OS keychain.
///
/// Stored secrets are treated as API tokens. Use [`KeyringCredentials::store`]
/// once (e.g. from a setup command) and resolve by the same id afterwards.
pub struct KeyringCredentials;

impl KeyringCredentials {
    /// Store a token under a credential id.
    pub fn store(id: &str, token: &str) -> Result<(), TowerError> {
        let entry = Self::entry(id)?;
        entry
            .set_password(token)
            .map_err(|e| TowerError::credential_storage(format!("Failed to store token: {}", e)))
    }

    /// Delete a stored token.
    ///
    /// This operation is idempotent - deleting a non-existent token is not an error.
    pub fn delete(id: &str) -> Result<(), TowerError> {
        let entry = Self::entry(id)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(TowerError::credential_storage(format!(
                "Failed to delete token: {}",
                e
            ))),
        }
    }

    fn entry(id: &str) -> Result<Entry, TowerError> {
        Entry::new(SERVICE_NAME, id).map_err(|e| {
            TowerError::credential_storage(format!("Failed to create keyring entry: {}", e))
        })
    }
}

impl CredentialResolver for KeyringCredentials {
    fn resolve(&self, id: &str) -> Result<Credential, TowerError> {
        let entry = Self::entry(id)?;
        match entry.get_password() {
            Ok(token) => Ok(Credential::Token(token)),
            Err(keyring::Error::NoEntry) => Err(TowerError::not_found_with_id("credential", id)),
            Err(e) => Err(TowerError::credential_storage(format!(
                "Failed to retrieve token: {}",
                e
            ))),
        }
    }
}
