//! Encrypted mailbox for leave requests.
//!
//! Messages are stored as opaque base64 ciphertext. Only the receiver can
//! open one, and only with the secret from its own handshake session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dacguard_core::{now_millis, MessageId, NewMessage, Role, StoredMessage, UserId};
use dacguard_crypto::{open_json, seal_json, Ciphertext, SymmetricKey};
use dacguard_store::{Store, StoreExt};

use crate::error::{GuardError, Result};

/// The payload an employee sends to HR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub employee_name: String,
    pub start_date: String,
    pub end_date: String,
    pub reason: String,
    pub days: u32,
}

impl LeaveRequest {
    /// Encrypt under a key derived from the sender's handshake.
    pub fn seal(&self, key: &SymmetricKey) -> Result<Ciphertext> {
        Ok(seal_json(self, key)?)
    }
}

/// What an administrator sees of a stored message: routing, never content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageOverview {
    pub id: MessageId,
    pub sender: UserId,
    pub receiver: UserId,
    pub timestamp: i64,
    pub read: bool,
    pub encrypted: bool,
}

impl From<&StoredMessage> for MessageOverview {
    fn from(message: &StoredMessage) -> Self {
        Self {
            id: message.id,
            sender: message.sender,
            receiver: message.receiver,
            timestamp: message.timestamp,
            read: message.read,
            encrypted: true,
        }
    }
}

pub struct Mailbox<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> Mailbox<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Store a sealed message from `sender` to `receiver`.
    pub fn send(&self, sender: UserId, receiver: UserId, sealed: &Ciphertext) -> Result<MessageId> {
        if sender == receiver {
            return Err(GuardError::InvalidInput("cannot message oneself".into()));
        }
        if sealed.ciphertext.is_empty() || sealed.iv.is_empty() {
            return Err(GuardError::InvalidInput("empty ciphertext or iv".into()));
        }
        self.store.require_user(sender)?;
        self.store.require_user(receiver)?;

        let id = self.store.insert_message(&NewMessage {
            sender,
            receiver,
            ciphertext: sealed.ciphertext.clone(),
            iv: sealed.iv.clone(),
            timestamp: now_millis(),
        })?;
        tracing::info!(message = %id, sender = %sender, receiver = %receiver, "message stored");
        Ok(id)
    }

    /// Messages addressed to `user`, oldest first.
    pub fn inbox(&self, user: UserId) -> Result<Vec<StoredMessage>> {
        self.store.require_user(user)?;
        Ok(self.store.messages_for(user)?)
    }

    /// Metadata of every stored message. Administrators only.
    pub fn overview(&self, actor: UserId) -> Result<Vec<MessageOverview>> {
        let user = self.store.require_user(actor)?;
        if !user.role.is_admin() {
            tracing::warn!(actor = %actor, "message overview denied: role");
            return Err(GuardError::Forbidden(
                "only an administrator may list all messages".into(),
            ));
        }
        let messages = self.store.all_messages()?;
        Ok(messages.iter().map(MessageOverview::from).collect())
    }

    /// Decrypt a message as its receiver and mark it read.
    ///
    /// A wrong key surfaces as [`GuardError::Decryption`]; a payload that
    /// decrypts but is not JSON as [`GuardError::MalformedPayload`]. Neither
    /// marks the message read.
    pub fn decrypt(&self, actor: UserId, message_id: MessageId) -> Result<Value> {
        let message = self.authorize_open(actor, message_id)?;
        let key = self
            .store
            .get_session(actor)?
            .and_then(|session| session.symmetric_key())
            .ok_or_else(|| {
                GuardError::NotInitialized("no shared secret established; run the handshake".into())
            })?;

        let sealed = Ciphertext {
            ciphertext: message.ciphertext,
            iv: message.iv,
        };
        let value = open_json::<Value>(&sealed, &key).map_err(|e| {
            tracing::warn!(message = %message_id, error = %e, "decryption failed");
            GuardError::from(e)
        })?;

        self.store.mark_read(message_id)?;
        tracing::info!(message = %message_id, receiver = %actor, "message decrypted");
        Ok(value)
    }

    /// Decrypt a message and parse it as a [`LeaveRequest`].
    pub fn open_leave_request(&self, actor: UserId, message_id: MessageId) -> Result<LeaveRequest> {
        let value = self.decrypt(actor, message_id)?;
        serde_json::from_value(value).map_err(|e| GuardError::MalformedPayload(e.to_string()))
    }

    /// Delete a message as its sender or receiver.
    pub fn delete(&self, actor: UserId, message_id: MessageId) -> Result<()> {
        let message = self.require_message(message_id)?;
        if actor != message.sender && actor != message.receiver {
            tracing::warn!(message = %message_id, actor = %actor, "delete denied");
            return Err(GuardError::Forbidden(
                "only the sender or receiver may delete a message".into(),
            ));
        }
        self.store.remove_message(message_id)?;
        tracing::info!(message = %message_id, "message deleted");
        Ok(())
    }

    fn require_message(&self, id: MessageId) -> Result<StoredMessage> {
        self.store
            .get_message(id)?
            .ok_or_else(|| GuardError::NotFound(format!("message {id}")))
    }

    fn authorize_open(&self, actor: UserId, message_id: MessageId) -> Result<StoredMessage> {
        let message = self.require_message(message_id)?;
        let user = self.store.require_user(actor)?;
        if message.receiver != actor {
            tracing::warn!(message = %message_id, actor = %actor, "decrypt denied: not receiver");
            return Err(GuardError::Forbidden(
                "only the receiver may decrypt a message".into(),
            ));
        }
        if user.role != Role::HrManager {
            tracing::warn!(message = %message_id, actor = %actor, "decrypt denied: role");
            return Err(GuardError::Forbidden(
                "only an HR manager may open leave requests".into(),
            ));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;
    use crate::guard::Guard;
    use dacguard_crypto::{DecryptFailure, Initiator};
    use dacguard_store::MemoryStore;

    struct Setup {
        guard: Guard<MemoryStore>,
        hr: UserId,
        emp: UserId,
        key: SymmetricKey,
    }

    fn setup() -> Setup {
        let guard = Guard::in_memory(GuardConfig::default());
        let hr = guard.register_user("hr@example.com", Role::HrManager).unwrap().id;
        let emp = guard.register_user("emp@example.com", Role::Employee).unwrap().id;
        let params = guard.key_exchange().init_params().unwrap();
        let initiator = Initiator::new(&params);
        let hr_public = guard
            .key_exchange()
            .respond(hr, emp, initiator.public_key())
            .unwrap();
        let key = initiator.complete(&hr_public).unwrap().derive_symmetric_key();
        Setup { guard, hr, emp, key }
    }

    fn leave() -> LeaveRequest {
        LeaveRequest {
            employee_name: "Sam".into(),
            start_date: "2026-07-01".into(),
            end_date: "2026-07-05".into(),
            reason: "vacation".into(),
            days: 5,
        }
    }

    #[test]
    fn test_send_and_open() {
        let s = setup();
        let mailbox = s.guard.mailbox();
        let id = mailbox.send(s.emp, s.hr, &leave().seal(&s.key).unwrap()).unwrap();

        assert_eq!(mailbox.open_leave_request(s.hr, id).unwrap(), leave());
        assert!(mailbox.inbox(s.hr).unwrap()[0].read);
    }

    #[test]
    fn test_wrong_key_is_decryption_error() {
        let s = setup();
        let mailbox = s.guard.mailbox();
        let sealed = leave().seal(&SymmetricKey::generate()).unwrap();
        let id = mailbox.send(s.emp, s.hr, &sealed).unwrap();

        let err = mailbox.decrypt(s.hr, id).unwrap_err();
        assert!(matches!(
            err,
            GuardError::Decryption(DecryptFailure::BadPadding | DecryptFailure::BadKey)
        ));
        assert!(!mailbox.inbox(s.hr).unwrap()[0].read);
    }

    #[test]
    fn test_non_json_is_malformed_payload() {
        let s = setup();
        let mailbox = s.guard.mailbox();
        let id = mailbox.send(s.emp, s.hr, &s.key.encrypt("not json")).unwrap();

        assert!(matches!(
            mailbox.decrypt(s.hr, id),
            Err(GuardError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_only_hr_receiver_decrypts() {
        let s = setup();
        let mailbox = s.guard.mailbox();
        let to_hr = mailbox.send(s.emp, s.hr, &leave().seal(&s.key).unwrap()).unwrap();
        let to_emp = mailbox.send(s.hr, s.emp, &leave().seal(&s.key).unwrap()).unwrap();

        assert!(matches!(
            mailbox.decrypt(s.emp, to_hr),
            Err(GuardError::Forbidden(_))
        ));
        assert!(matches!(
            mailbox.decrypt(s.emp, to_emp),
            Err(GuardError::Forbidden(_))
        ));
    }

    #[test]
    fn test_missing_secret_not_initialized() {
        let s = setup();
        let mailbox = s.guard.mailbox();
        let id = mailbox.send(s.emp, s.hr, &leave().seal(&s.key).unwrap()).unwrap();
        s.guard.key_exchange().clear_session(s.hr).unwrap();

        assert!(matches!(
            mailbox.decrypt(s.hr, id),
            Err(GuardError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_delete_by_participants_only() {
        let s = setup();
        let outsider = s
            .guard
            .register_user("x@example.com", Role::Employee)
            .unwrap()
            .id;
        let mailbox = s.guard.mailbox();
        let id = mailbox.send(s.emp, s.hr, &leave().seal(&s.key).unwrap()).unwrap();

        assert!(matches!(
            mailbox.delete(outsider, id),
            Err(GuardError::Forbidden(_))
        ));
        mailbox.delete(s.emp, id).unwrap();
        assert!(matches!(mailbox.delete(s.emp, id), Err(GuardError::NotFound(_))));
    }

    #[test]
    fn test_overview_is_admin_only_metadata() {
        let s = setup();
        let admin = s
            .guard
            .register_user("admin@example.com", Role::Admin)
            .unwrap()
            .id;
        let mailbox = s.guard.mailbox();
        let id = mailbox.send(s.emp, s.hr, &leave().seal(&s.key).unwrap()).unwrap();

        for actor in [s.emp, s.hr] {
            assert!(matches!(
                mailbox.overview(actor),
                Err(GuardError::Forbidden(_))
            ));
        }
        assert!(matches!(
            mailbox.overview(UserId::new(999)),
            Err(GuardError::NotFound(_))
        ));

        let overview = mailbox.overview(admin).unwrap();
        assert_eq!(overview.len(), 1);
        let entry = &overview[0];
        assert_eq!((entry.id, entry.sender, entry.receiver), (id, s.emp, s.hr));
        assert!(entry.encrypted);
        assert!(!entry.read);

        let json = serde_json::to_value(entry).unwrap();
        assert!(json.get("ciphertext").is_none());
        assert!(json.get("iv").is_none());
    }

    #[test]
    fn test_send_validates_users() {
        let s = setup();
        let sealed = leave().seal(&s.key).unwrap();
        assert!(matches!(
            s.guard.mailbox().send(s.emp, UserId::new(999), &sealed),
            Err(GuardError::NotFound(_))
        ));
        assert!(matches!(
            s.guard.mailbox().send(s.emp, s.emp, &sealed),
            Err(GuardError::InvalidInput(_))
        ));
    }
}
