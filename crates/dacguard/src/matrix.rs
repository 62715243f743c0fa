//! Access-matrix service (HRU).
//!
//! Documents are objects, users are subjects, ACL entries are cells. The
//! decision logic lives in [`dacguard_perms::matrix`]; this service loads
//! the state a decision needs, applies the outcome, and logs it.

use std::collections::BTreeSet;

use serde::Serialize;

use dacguard_core::{
    now_millis, validate_content, validate_title, AclEntry, AclEntryId, Document, DocumentId,
    NewDocument, Permission, PermissionSet, PolicyMode, UserId,
};
use dacguard_perms::{
    authorize_copy, authorize_delete, authorize_grant, authorize_revoke, Access, GrantRequest,
};
use dacguard_store::{Store, StoreExt};

use crate::config::GuardConfig;
use crate::error::{GuardError, Result};

/// A document together with what the caller may do with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessibleDocument {
    pub document: Document,
    pub permissions: PermissionSet,
    pub can_reshare: bool,
    pub is_owner: bool,
    /// Mode of the ACL entry; `None` for owned documents.
    pub mode: Option<PolicyMode>,
}

/// One cell of the administrative matrix view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclCell {
    pub document: DocumentId,
    pub subject: UserId,
    pub permissions: PermissionSet,
    pub can_reshare: bool,
    pub is_owner: bool,
    pub mode: Option<PolicyMode>,
}

/// Subjects × documents, owners included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AclMatrix {
    pub documents: Vec<DocumentId>,
    pub subjects: Vec<UserId>,
    pub cells: Vec<AclCell>,
}

impl AclMatrix {
    pub fn cell(&self, document: DocumentId, subject: UserId) -> Option<&AclCell> {
        self.cells
            .iter()
            .find(|c| c.document == document && c.subject == subject)
    }
}

pub struct AccessMatrix<'a, S: Store> {
    store: &'a S,
    config: &'a GuardConfig,
}

impl<'a, S: Store> AccessMatrix<'a, S> {
    pub(crate) fn new(store: &'a S, config: &'a GuardConfig) -> Self {
        Self { store, config }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a document owned by `owner`.
    pub fn create_document(
        &self,
        owner: UserId,
        title: &str,
        content: &str,
        confidential: bool,
    ) -> Result<DocumentId> {
        validate_title(title)?;
        validate_content(content)?;
        self.store.require_user(owner)?;

        let id = self.store.insert_document(&NewDocument {
            owner,
            title: title.to_string(),
            content: content.to_string(),
            confidential,
            created_at: now_millis(),
        })?;
        tracing::info!(document = %id, owner = %owner, confidential, "document created");
        Ok(id)
    }

    /// What `actor` may do with `document`.
    pub fn access(&self, actor: UserId, document: DocumentId) -> Result<Access> {
        let doc = self.store.require_document(document)?;
        let entry = self.store.get_acl_entry(document, actor)?;
        Ok(Access::resolve(&doc, actor, entry.as_ref()))
    }

    /// Read a document. Requires `read`.
    pub fn get(&self, actor: UserId, document: DocumentId) -> Result<Document> {
        let doc = self.store.require_document(document)?;
        let entry = self.store.get_acl_entry(document, actor)?;
        self.deny_unless(
            Access::resolve(&doc, actor, entry.as_ref()).require(Permission::Read),
            "read",
            actor,
            document,
        )?;
        Ok(doc)
    }

    /// Replace a document's content. Requires `write`.
    pub fn update(&self, actor: UserId, document: DocumentId, content: &str) -> Result<()> {
        validate_content(content)?;
        let doc = self.store.require_document(document)?;
        let entry = self.store.get_acl_entry(document, actor)?;
        self.deny_unless(
            Access::resolve(&doc, actor, entry.as_ref()).require(Permission::Write),
            "update",
            actor,
            document,
        )?;
        self.store.update_document_content(document, content)?;
        tracing::info!(document = %document, actor = %actor, "document updated");
        Ok(())
    }

    /// Delete a document and every cell of its column. Owner only.
    pub fn delete(&self, actor: UserId, document: DocumentId) -> Result<()> {
        let doc = self.store.require_document(document)?;
        self.deny_unless(authorize_delete(&doc, actor), "delete", actor, document)?;
        self.store.remove_document(document)?;
        tracing::info!(document = %document, "document deleted");
        Ok(())
    }

    /// Copy a readable document into a new one owned by `actor`.
    ///
    /// The copy is not confidential and has no ACL. Later revocations on
    /// the source do not reach it.
    pub fn copy(&self, actor: UserId, document: DocumentId, new_title: &str) -> Result<DocumentId> {
        validate_title(new_title)?;
        let doc = self.store.require_document(document)?;
        let entry = self.store.get_acl_entry(document, actor)?;
        let copy = self.deny_unless(
            authorize_copy(&doc, actor, entry.as_ref(), new_title, now_millis()),
            "copy",
            actor,
            document,
        )?;
        let id = self.store.insert_document(&copy)?;
        tracing::info!(source = %document, copy = %id, actor = %actor, "document copied");
        Ok(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Grants
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `permissions` on `document` to `subject` in `mode`.
    ///
    /// Replaces any existing cell for (document, subject).
    pub fn grant(
        &self,
        actor: UserId,
        document: DocumentId,
        subject: UserId,
        permissions: PermissionSet,
        allow_reshare: bool,
        mode: PolicyMode,
    ) -> Result<AclEntryId> {
        tracing::debug!(
            actor = %actor,
            document = %document,
            subject = %subject,
            %permissions,
            mode = mode.as_str(),
            "grant requested"
        );
        let doc = self.store.require_document(document)?;
        self.store.require_user(subject)?;
        let actor_entry = self.store.get_acl_entry(document, actor)?;

        let request = GrantRequest {
            subject,
            permissions,
            allow_reshare,
            policy: self.config.grant_policy(mode),
        };
        let cell = self.deny_unless(
            authorize_grant(&doc, actor, actor_entry.as_ref(), &request, now_millis()),
            "grant",
            actor,
            document,
        )?;

        let id = self.store.upsert_acl_entry(&cell)?;
        tracing::info!(
            document = %document,
            subject = %subject,
            permissions = %cell.permissions,
            can_reshare = cell.can_reshare,
            mode = mode.as_str(),
            "document shared"
        );
        Ok(id)
    }

    /// [`grant`](Self::grant) in the configured default mode.
    pub fn share(
        &self,
        actor: UserId,
        document: DocumentId,
        subject: UserId,
        permissions: PermissionSet,
        allow_reshare: bool,
    ) -> Result<AclEntryId> {
        self.grant(
            actor,
            document,
            subject,
            permissions,
            allow_reshare,
            self.config.default_policy,
        )
    }

    /// Remove `subject`'s cell. Owner only. Copies already made survive.
    pub fn revoke(&self, actor: UserId, document: DocumentId, subject: UserId) -> Result<()> {
        let doc = self.store.require_document(document)?;
        self.deny_unless(authorize_revoke(&doc, actor), "revoke", actor, document)?;
        if !self.store.remove_acl_entry(document, subject)? {
            return Err(GuardError::NotFound(format!(
                "no ACL entry for user {subject} on document {document}"
            )));
        }
        tracing::info!(document = %document, subject = %subject, "access revoked");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Documents `actor` owns or holds a cell for.
    pub fn list_accessible(&self, actor: UserId) -> Result<Vec<AccessibleDocument>> {
        self.store.require_user(actor)?;
        let mut out: Vec<AccessibleDocument> = self
            .store
            .list_documents()?
            .into_iter()
            .filter(|d| d.is_owned_by(actor))
            .map(|document| AccessibleDocument {
                document,
                permissions: PermissionSet::all(),
                can_reshare: true,
                is_owner: true,
                mode: None,
            })
            .collect();

        for entry in self.store.acl_entries_for_subject(actor)? {
            if let Some(document) = self.store.get_document(entry.document)? {
                out.push(AccessibleDocument {
                    document,
                    permissions: entry.permissions,
                    can_reshare: entry.can_reshare,
                    is_owner: false,
                    mode: Some(entry.mode),
                });
            }
        }
        out.sort_by_key(|a| a.document.id);
        Ok(out)
    }

    /// The cells of a document's column. Owner only.
    pub fn shares_of(&self, actor: UserId, document: DocumentId) -> Result<Vec<AclEntry>> {
        let doc = self.store.require_document(document)?;
        if !doc.is_owned_by(actor) {
            return Err(GuardError::Forbidden(
                "only the owner may list a document's shares".into(),
            ));
        }
        Ok(self.store.acl_entries_for_document(document)?)
    }

    /// The full matrix. Administrators only.
    pub fn acl_matrix(&self, actor: UserId) -> Result<AclMatrix> {
        let user = self.store.require_user(actor)?;
        if !user.role.is_admin() {
            tracing::warn!(actor = %actor, "acl matrix denied");
            return Err(GuardError::Forbidden(
                "the ACL matrix is restricted to administrators".into(),
            ));
        }

        let documents = self.store.list_documents()?;
        let mut subjects = BTreeSet::new();
        let mut cells = Vec::new();

        for doc in &documents {
            subjects.insert(doc.owner);
            cells.push(AclCell {
                document: doc.id,
                subject: doc.owner,
                permissions: PermissionSet::all(),
                can_reshare: true,
                is_owner: true,
                mode: None,
            });
        }
        for entry in self.store.all_acl_entries()? {
            subjects.insert(entry.subject);
            cells.push(AclCell {
                document: entry.document,
                subject: entry.subject,
                permissions: entry.permissions,
                can_reshare: entry.can_reshare,
                is_owner: false,
                mode: Some(entry.mode),
            });
        }
        cells.sort_by_key(|c| (c.document, c.subject));

        Ok(AclMatrix {
            documents: documents.iter().map(|d| d.id).collect(),
            subjects: subjects.into_iter().collect(),
            cells,
        })
    }

    fn deny_unless<T>(
        &self,
        decision: dacguard_perms::Result<T>,
        operation: &str,
        actor: UserId,
        document: DocumentId,
    ) -> Result<T> {
        decision.map_err(|e| {
            tracing::warn!(operation, actor = %actor, document = %document, reason = %e, "denied");
            GuardError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Guard;
    use dacguard_core::Role;
    use dacguard_store::MemoryStore;

    fn perms(items: &[Permission]) -> PermissionSet {
        items.iter().copied().collect()
    }

    fn setup() -> (Guard<MemoryStore>, UserId, UserId, UserId, DocumentId) {
        let guard = Guard::in_memory(GuardConfig::default());
        let owner = guard.register_user("owner@example.com", Role::Employee).unwrap().id;
        let a = guard.register_user("a@example.com", Role::Employee).unwrap().id;
        let b = guard.register_user("b@example.com", Role::Employee).unwrap().id;
        let doc = guard
            .matrix()
            .create_document(owner, "Salaries", "confidential numbers", true)
            .unwrap();
        (guard, owner, a, b, doc)
    }

    #[test]
    fn test_regrant_replaces() {
        let (guard, owner, a, _, doc) = setup();
        let m = guard.matrix();
        m.grant(owner, doc, a, perms(&[Permission::Read, Permission::Write]), false, PolicyMode::Dac)
            .unwrap();
        m.grant(owner, doc, a, perms(&[Permission::Read]), false, PolicyMode::Secure)
            .unwrap();

        let shares = m.shares_of(owner, doc).unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].permissions, perms(&[Permission::Read]));
        assert_eq!(shares[0].mode, PolicyMode::Secure);
    }

    #[test]
    fn test_share_uses_default_policy() {
        let (guard, owner, a, b, doc) = setup();
        let m = guard.matrix();
        m.share(owner, doc, a, perms(&[Permission::Read, Permission::Share]), false)
            .unwrap();
        assert!(!m.access(a, doc).unwrap().can_reshare);
        assert!(matches!(
            m.share(a, doc, b, perms(&[Permission::Read]), false),
            Err(GuardError::Forbidden(_))
        ));
    }

    #[test]
    fn test_update_requires_write() {
        let (guard, owner, a, _, doc) = setup();
        let m = guard.matrix();
        m.grant(owner, doc, a, perms(&[Permission::Read]), false, PolicyMode::Dac)
            .unwrap();
        assert!(matches!(m.update(a, doc, "x"), Err(GuardError::Forbidden(_))));

        m.grant(owner, doc, a, perms(&[Permission::Write]), false, PolicyMode::Dac)
            .unwrap();
        m.update(a, doc, "edited").unwrap();
        assert_eq!(m.get(owner, doc).unwrap().content, "edited");
        assert!(matches!(m.get(a, doc), Err(GuardError::Forbidden(_))));
    }

    #[test]
    fn test_delete_cascades() {
        let (guard, owner, a, _, doc) = setup();
        let m = guard.matrix();
        m.grant(owner, doc, a, perms(&[Permission::Read]), false, PolicyMode::Dac)
            .unwrap();
        assert!(matches!(m.delete(a, doc), Err(GuardError::Forbidden(_))));
        m.delete(owner, doc).unwrap();
        assert!(guard.store().all_acl_entries().unwrap().is_empty());
        assert!(matches!(m.get(owner, doc), Err(GuardError::NotFound(_))));
    }

    #[test]
    fn test_revoke_missing_entry() {
        let (guard, owner, a, _, doc) = setup();
        assert!(matches!(
            guard.matrix().revoke(owner, doc, a),
            Err(GuardError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_accessible() {
        let (guard, owner, a, _, doc) = setup();
        let m = guard.matrix();
        let own = m.create_document(a, "Mine", "", false).unwrap();
        m.grant(owner, doc, a, perms(&[Permission::Read]), false, PolicyMode::Secure)
            .unwrap();

        let listed = m.list_accessible(a).unwrap();
        assert_eq!(listed.len(), 2);
        let shared = listed.iter().find(|d| d.document.id == doc).unwrap();
        assert!(!shared.is_owner);
        assert_eq!(shared.mode, Some(PolicyMode::Secure));
        let mine = listed.iter().find(|d| d.document.id == own).unwrap();
        assert!(mine.is_owner);
    }

    #[test]
    fn test_matrix_admin_only() {
        let (guard, owner, a, _, doc) = setup();
        let admin = guard.register_user("admin@example.com", Role::Admin).unwrap().id;
        let m = guard.matrix();
        m.grant(owner, doc, a, perms(&[Permission::Read]), false, PolicyMode::Dac)
            .unwrap();

        assert!(matches!(m.acl_matrix(owner), Err(GuardError::Forbidden(_))));
        let matrix = m.acl_matrix(admin).unwrap();
        assert_eq!(matrix.documents, vec![doc]);
        assert_eq!(matrix.subjects, vec![owner, a]);
        assert!(matrix.cell(doc, owner).unwrap().is_owner);
        assert_eq!(
            matrix.cell(doc, a).unwrap().permissions,
            perms(&[Permission::Read])
        );
    }

    #[test]
    fn test_unknown_subject_not_found() {
        let (guard, owner, _, _, doc) = setup();
        assert!(matches!(
            guard.matrix().grant(
                owner,
                doc,
                UserId::new(999),
                perms(&[Permission::Read]),
                false,
                PolicyMode::Dac
            ),
            Err(GuardError::NotFound(_))
        ));
    }
}
