//! Per-principal key-exchange sessions.
//!
//! A principal holds at most one session. Re-running a handshake replaces
//! it; there is no history. The state machine is
//! `NoSession -> PrivateKeyGenerated -> SharedSecretEstablished`.

use dacguard_core::UserId;

use crate::cipher::SymmetricKey;
use crate::dh::{PrivateKey, SharedSecret};

/// Where a principal stands in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    PrivateKeyGenerated,
    SharedSecretEstablished,
}

/// Server-side handshake state of one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExchangeSession {
    pub owner: UserId,
    /// Responder's private exponent. `None` for sessions that only carry a
    /// secret computed elsewhere.
    pub private_key: Option<PrivateKey>,
    pub shared_secret: Option<SharedSecret>,
    pub updated_at: i64,
}

impl KeyExchangeSession {
    /// Fresh session holding a newly generated private key.
    pub fn with_private_key(owner: UserId, private_key: PrivateKey, now: i64) -> Self {
        Self {
            owner,
            private_key: Some(private_key),
            shared_secret: None,
            updated_at: now,
        }
    }

    /// Record the agreed secret, replacing any previous one.
    pub fn establish(&mut self, secret: SharedSecret, now: i64) {
        self.shared_secret = Some(secret);
        self.updated_at = now;
    }

    pub fn state(&self) -> SessionState {
        match (&self.private_key, &self.shared_secret) {
            (_, Some(_)) => SessionState::SharedSecretEstablished,
            (Some(_), None) => SessionState::PrivateKeyGenerated,
            (None, None) => SessionState::NoSession,
        }
    }

    /// State of an optional session row.
    pub fn state_of(session: Option<&Self>) -> SessionState {
        session.map_or(SessionState::NoSession, Self::state)
    }

    /// The AES key derived from the established secret, if any.
    pub fn symmetric_key(&self) -> Option<SymmetricKey> {
        self.shared_secret
            .as_ref()
            .map(SharedSecret::derive_symmetric_key)
    }
}
