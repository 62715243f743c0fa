//! The Guard: unified API for dacguard.
//!
//! The Guard owns the store and the configuration and hands out the four
//! services. Every service call is one synchronous read-modify-write
//! sequence against the store; all preconditions are checked before the
//! first write.

use std::sync::Arc;

use dacguard_core::{now_millis, validate_email, NewUser, Role, User, UserId};
use dacguard_store::{MemoryStore, SqliteStore, Store, StoreExt};

use crate::config::GuardConfig;
use crate::delegation::DelegationGraph;
use crate::error::Result;
use crate::key_exchange::KeyExchange;
use crate::mailbox::Mailbox;
use crate::matrix::AccessMatrix;

/// The main Guard struct.
///
/// Cloning is cheap: clones share the same store.
pub struct Guard<S: Store> {
    store: Arc<S>,
    config: GuardConfig,
}

impl<S: Store> Clone for Guard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> Guard<S> {
    /// Create a guard over an existing store.
    pub fn new(store: S, config: GuardConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a principal.
    pub fn register_user(&self, email: &str, role: Role) -> Result<User> {
        validate_email(email)?;
        let new_user = NewUser {
            email: email.to_string(),
            role,
            created_at: now_millis(),
        };
        let id = self.store.insert_user(&new_user)?;
        tracing::info!(user = %id, role = role.as_str(), "user registered");
        Ok(User {
            id,
            email: new_user.email,
            role,
            created_at: new_user.created_at,
        })
    }

    /// Fetch a user or fail with `NotFound`.
    pub fn user(&self, id: UserId) -> Result<User> {
        Ok(self.store.require_user(id)?)
    }

    pub fn users(&self) -> Result<Vec<User>> {
        Ok(self.store.list_users()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    /// DH parameters and handshake sessions.
    pub fn key_exchange(&self) -> KeyExchange<'_, S> {
        KeyExchange::new(&self.store, &self.config)
    }

    /// Encrypted leave-request messages.
    pub fn mailbox(&self) -> Mailbox<'_, S> {
        Mailbox::new(&self.store)
    }

    /// Documents and their ACL (HRU).
    pub fn matrix(&self) -> AccessMatrix<'_, S> {
        AccessMatrix::new(&self.store, &self.config)
    }

    /// Rights delegation (Take-Grant).
    pub fn delegations(&self) -> DelegationGraph<'_, S> {
        DelegationGraph::new(&self.store, &self.config)
    }
}

impl Guard<MemoryStore> {
    /// Guard over a fresh in-memory store.
    pub fn in_memory(config: GuardConfig) -> Self {
        Self::new(MemoryStore::new(), config)
    }
}

impl Guard<SqliteStore> {
    /// Open the SQLite database named by `config.database_path`, or an
    /// in-memory SQLite database when no path is set.
    pub fn open(config: GuardConfig) -> Result<Self> {
        let store = match &config.database_path {
            Some(path) => SqliteStore::open(path)?,
            None => SqliteStore::open_memory()?,
        };
        Ok(Self::new(store, config))
    }
}
