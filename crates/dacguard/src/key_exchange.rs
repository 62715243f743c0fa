//! Key-exchange service: DH parameters and the responder side of the
//! handshake.
//!
//! The initiator runs [`dacguard_crypto::Initiator`] on its own side and
//! only ever sends its public value. The responder's private key and the
//! agreed secret live in the responder's session row.
//!
//! Sessions are one per principal and overwritten in place. Two handshakes
//! racing for the same responder both succeed; the last write wins and
//! the loser's secret no longer matches.

use dacguard_core::{now_millis, UserId};
use dacguard_crypto::{DhParameters, KeyExchangeSession, PublicKey, SessionState};
use dacguard_store::{Store, StoreExt};

use crate::config::GuardConfig;
use crate::error::{GuardError, Result};

pub struct KeyExchange<'a, S: Store> {
    store: &'a S,
    config: &'a GuardConfig,
}

impl<'a, S: Store> KeyExchange<'a, S> {
    pub(crate) fn new(store: &'a S, config: &'a GuardConfig) -> Self {
        Self { store, config }
    }

    /// The process-wide parameters.
    pub fn params(&self) -> Result<DhParameters> {
        self.store
            .get_dh_params()?
            .ok_or_else(|| GuardError::NotInitialized("DH parameters not initialized".into()))
    }

    /// Install the configured group unless parameters already exist.
    pub fn init_params(&self) -> Result<DhParameters> {
        if let Some(existing) = self.store.get_dh_params()? {
            return Ok(existing);
        }
        let params = self
            .store
            .init_dh_params(&DhParameters::for_group(self.config.dh_group)?)?;
        tracing::info!(group = ?self.config.dh_group, "dh parameters initialized");
        Ok(params)
    }

    /// Answer a handshake from `initiator`.
    ///
    /// Reuses the responder's private key if its session has one, otherwise
    /// generates a fresh one. Stores the shared secret on the responder's
    /// session and returns the responder's public value.
    pub fn respond(
        &self,
        responder: UserId,
        initiator: UserId,
        initiator_public: &PublicKey,
    ) -> Result<PublicKey> {
        tracing::debug!(responder = %responder, initiator = %initiator, "handshake requested");
        if responder == initiator {
            return Err(GuardError::InvalidInput(
                "a principal cannot exchange keys with itself".into(),
            ));
        }
        self.store.require_user(responder)?;
        self.store.require_user(initiator)?;
        let params = self.params()?;
        params.validate_public(initiator_public)?;

        let now = now_millis();
        let mut session = match self.store.get_session(responder)? {
            Some(session) if session.private_key.is_some() => session,
            _ => KeyExchangeSession::with_private_key(responder, params.generate_private_key(), now),
        };
        let private_key = session
            .private_key
            .clone()
            .ok_or_else(|| GuardError::NotInitialized("responder private key missing".into()))?;

        let secret = params.shared_secret(initiator_public, &private_key)?;
        session.establish(secret, now);
        self.store.put_session(&session)?;

        tracing::info!(responder = %responder, initiator = %initiator, "shared secret established");
        Ok(params.public_key(&private_key))
    }

    pub fn session(&self, user: UserId) -> Result<Option<KeyExchangeSession>> {
        Ok(self.store.get_session(user)?)
    }

    pub fn session_state(&self, user: UserId) -> Result<SessionState> {
        Ok(KeyExchangeSession::state_of(
            self.store.get_session(user)?.as_ref(),
        ))
    }

    /// Drop the user's session. Returns whether one existed.
    pub fn clear_session(&self, user: UserId) -> Result<bool> {
        let cleared = self.store.clear_session(user)?;
        if cleared {
            tracing::info!(user = %user, "session cleared");
        }
        Ok(cleared)
    }
}
