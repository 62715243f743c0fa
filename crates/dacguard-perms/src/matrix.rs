//! HRU access-matrix decisions.
//!
//! Rows are subjects, columns are documents, and a cell is an [`AclEntry`].
//! Ownership sits outside the matrix: the owner holds every permission and
//! always wins a check. These functions only decide; the caller performs the
//! writes they describe.

use dacguard_core::{
    AclEntry, Document, NewAclEntry, NewDocument, Permission, PermissionSet, PropagationPolicy,
    UserId,
};

use crate::error::{PermsError, Result};

/// What one subject may do with one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    pub permissions: PermissionSet,
    pub can_reshare: bool,
    pub is_owner: bool,
}

impl Access {
    /// Resolve the access of `subject` given its cell (if any).
    pub fn resolve(document: &Document, subject: UserId, entry: Option<&AclEntry>) -> Self {
        if document.is_owned_by(subject) {
            return Self {
                permissions: PermissionSet::all(),
                can_reshare: true,
                is_owner: true,
            };
        }
        match entry {
            Some(entry) if entry.subject == subject && entry.document == document.id => Self {
                permissions: entry.permissions.clone(),
                can_reshare: entry.can_reshare,
                is_owner: false,
            },
            _ => Self::none(),
        }
    }

    /// No access at all.
    pub fn none() -> Self {
        Self {
            permissions: PermissionSet::empty(),
            can_reshare: false,
            is_owner: false,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_any(&self) -> bool {
        !self.permissions.is_empty()
    }

    /// Fail with `Forbidden` unless `permission` is held.
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.allows(permission) {
            Ok(())
        } else {
            Err(PermsError::forbidden(format!(
                "{} permission required",
                permission.as_str()
            )))
        }
    }
}

/// A request to write one cell of the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRequest {
    pub subject: UserId,
    pub permissions: PermissionSet,
    /// Must be `false` under a bounded policy; unbounded grants derive
    /// resharing from `share` instead.
    pub allow_reshare: bool,
    pub policy: PropagationPolicy,
}

/// Decide a grant by `actor` and build the cell to upsert.
///
/// Under [`PropagationPolicy::Unbounded`] the new holder may reshare iff
/// `share` is granted, so a share right travels without limit. Under
/// [`PropagationPolicy::Bounded`] the grant is transfer-only: the new cell
/// never carries resharing, for the owner's grants as much as anyone's, so a
/// transfer-only holder cannot restart propagation in another mode.
pub fn authorize_grant(
    document: &Document,
    actor: UserId,
    actor_entry: Option<&AclEntry>,
    request: &GrantRequest,
    now: i64,
) -> Result<NewAclEntry> {
    if request.permissions.is_empty() {
        return Err(PermsError::invalid("at least one permission is required"));
    }
    if request.subject == actor {
        return Err(PermsError::invalid("cannot grant permissions to oneself"));
    }
    if document.is_owned_by(request.subject) {
        return Err(PermsError::invalid("the owner already holds every permission"));
    }

    let access = Access::resolve(document, actor, actor_entry);
    if !access.is_owner && !access.can_reshare {
        return Err(PermsError::forbidden(
            "only the owner or a subject allowed to reshare may grant",
        ));
    }
    if !access.permissions.is_superset(&request.permissions) {
        return Err(PermsError::forbidden(format!(
            "cannot grant {} while holding {}",
            request.permissions, access.permissions
        )));
    }

    let can_reshare = match request.policy {
        PropagationPolicy::Unbounded => request.permissions.contains(Permission::Share),
        PropagationPolicy::Bounded { .. } => {
            if request.allow_reshare {
                return Err(PermsError::forbidden(
                    "transfer-only grants may not confer resharing",
                ));
            }
            false
        }
    };

    Ok(NewAclEntry {
        document: document.id,
        subject: request.subject,
        permissions: request.permissions.clone(),
        can_reshare,
        granted_by: actor,
        mode: request.policy.mode(),
        granted_at: now,
    })
}

/// Only the owner may revoke a cell.
pub fn authorize_revoke(document: &Document, actor: UserId) -> Result<()> {
    if document.is_owned_by(actor) {
        Ok(())
    } else {
        Err(PermsError::forbidden("only the owner may revoke access"))
    }
}

/// Only the owner may delete a document.
pub fn authorize_delete(document: &Document, actor: UserId) -> Result<()> {
    if document.is_owned_by(actor) {
        Ok(())
    } else {
        Err(PermsError::forbidden("only the owner may delete a document"))
    }
}

/// Decide a copy and build the new document.
///
/// The copy belongs to `actor`, is never confidential and carries no ACL.
/// Revoking the source later does not reach it.
pub fn authorize_copy(
    document: &Document,
    actor: UserId,
    actor_entry: Option<&AclEntry>,
    new_title: &str,
    now: i64,
) -> Result<NewDocument> {
    Access::resolve(document, actor, actor_entry).require(Permission::Read)?;
    Ok(NewDocument {
        owner: actor,
        title: new_title.to_string(),
        content: document.content.clone(),
        confidential: false,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dacguard_core::{AclEntryId, DocumentId, PolicyMode};

    const OWNER: UserId = UserId::new(1);
    const ALICE: UserId = UserId::new(2);
    const BOB: UserId = UserId::new(3);

    fn document() -> Document {
        Document {
            id: DocumentId::new(10),
            owner: OWNER,
            title: "Payroll".into(),
            content: "secret".into(),
            confidential: true,
            created_at: 0,
        }
    }

    fn request(subject: UserId, perms: &[Permission], policy: PropagationPolicy) -> GrantRequest {
        GrantRequest {
            subject,
            permissions: perms.iter().copied().collect(),
            allow_reshare: false,
            policy,
        }
    }

    fn stored(entry: NewAclEntry) -> AclEntry {
        entry.with_id(AclEntryId::new(99))
    }

    #[test]
    fn test_owner_has_everything() {
        let access = Access::resolve(&document(), OWNER, None);
        assert!(access.is_owner);
        assert_eq!(access.permissions, PermissionSet::all());
    }

    #[test]
    fn test_foreign_entry_is_ignored() {
        let doc = document();
        let cell = stored(
            authorize_grant(
                &doc,
                OWNER,
                None,
                &request(ALICE, &[Permission::Read], PropagationPolicy::Unbounded),
                0,
            )
            .unwrap(),
        );
        assert!(!Access::resolve(&doc, BOB, Some(&cell)).has_any());
    }

    #[test]
    fn test_dac_share_propagates() {
        let doc = document();
        let perms = [Permission::Read, Permission::Share];

        let alice = authorize_grant(
            &doc,
            OWNER,
            None,
            &request(ALICE, &perms, PropagationPolicy::Unbounded),
            0,
        )
        .unwrap();
        assert!(alice.can_reshare);
        assert_eq!(alice.mode, PolicyMode::Dac);

        let bob = authorize_grant(
            &doc,
            ALICE,
            Some(&stored(alice)),
            &request(BOB, &perms, PropagationPolicy::Unbounded),
            1,
        )
        .unwrap();
        assert!(bob.can_reshare);
        assert_eq!(bob.granted_by, ALICE);
    }

    #[test]
    fn test_transfer_only_contains() {
        let doc = document();
        let alice = authorize_grant(
            &doc,
            OWNER,
            None,
            &request(ALICE, &[Permission::Read, Permission::Share], PropagationPolicy::transfer_only()),
            0,
        )
        .unwrap();
        assert!(!alice.can_reshare);
        assert_eq!(alice.mode, PolicyMode::Secure);

        let err = authorize_grant(
            &doc,
            ALICE,
            Some(&stored(alice)),
            &request(BOB, &[Permission::Read], PropagationPolicy::transfer_only()),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, PermsError::Forbidden(_)));
    }

    #[test]
    fn test_non_owner_cannot_confer_reshare_when_bounded() {
        let doc = document();
        let alice = stored(
            authorize_grant(
                &doc,
                OWNER,
                None,
                &request(ALICE, &[Permission::Read, Permission::Share], PropagationPolicy::Unbounded),
                0,
            )
            .unwrap(),
        );

        let mut req = request(BOB, &[Permission::Read], PropagationPolicy::transfer_only());
        req.allow_reshare = true;
        assert!(matches!(
            authorize_grant(&doc, ALICE, Some(&alice), &req, 1),
            Err(PermsError::Forbidden(_))
        ));

        req.allow_reshare = false;
        let bob = authorize_grant(&doc, ALICE, Some(&alice), &req, 1).unwrap();
        assert!(!bob.can_reshare);
    }

    #[test]
    fn test_owner_cannot_confer_reshare_when_bounded() {
        let mut req = request(ALICE, &[Permission::Read], PropagationPolicy::transfer_only());
        req.allow_reshare = true;
        assert!(matches!(
            authorize_grant(&document(), OWNER, None, &req, 0),
            Err(PermsError::Forbidden(_))
        ));

        req.allow_reshare = false;
        let alice = authorize_grant(&document(), OWNER, None, &req, 0).unwrap();
        assert!(!alice.can_reshare);
    }

    #[test]
    fn test_transfer_only_holder_cannot_restart_dac() {
        let doc = document();
        let alice = stored(
            authorize_grant(
                &doc,
                OWNER,
                None,
                &request(ALICE, &[Permission::Read, Permission::Share], PropagationPolicy::transfer_only()),
                0,
            )
            .unwrap(),
        );
        assert!(!alice.can_reshare);

        let err = authorize_grant(
            &doc,
            ALICE,
            Some(&alice),
            &request(BOB, &[Permission::Read, Permission::Share], PropagationPolicy::Unbounded),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, PermsError::Forbidden(_)));
    }

    #[test]
    fn test_cannot_grant_more_than_held() {
        let doc = document();
        let alice = stored(
            authorize_grant(
                &doc,
                OWNER,
                None,
                &request(ALICE, &[Permission::Read, Permission::Share], PropagationPolicy::Unbounded),
                0,
            )
            .unwrap(),
        );
        let err = authorize_grant(
            &doc,
            ALICE,
            Some(&alice),
            &request(BOB, &[Permission::Write], PropagationPolicy::Unbounded),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, PermsError::Forbidden(_)));
    }

    #[test]
    fn test_invalid_grants() {
        let doc = document();
        let empty = request(ALICE, &[], PropagationPolicy::Unbounded);
        assert!(matches!(
            authorize_grant(&doc, OWNER, None, &empty, 0),
            Err(PermsError::InvalidInput(_))
        ));

        let to_owner = request(OWNER, &[Permission::Read], PropagationPolicy::Unbounded);
        assert!(matches!(
            authorize_grant(&doc, OWNER, None, &to_owner, 0),
            Err(PermsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_revoke_and_delete_owner_only() {
        let doc = document();
        assert!(authorize_revoke(&doc, OWNER).is_ok());
        assert!(authorize_revoke(&doc, ALICE).is_err());
        assert!(authorize_delete(&doc, OWNER).is_ok());
        assert!(authorize_delete(&doc, ALICE).is_err());
    }

    #[test]
    fn test_copy_drops_confidentiality() {
        let doc = document();
        let alice = stored(
            authorize_grant(
                &doc,
                OWNER,
                None,
                &request(ALICE, &[Permission::Read], PropagationPolicy::transfer_only()),
                0,
            )
            .unwrap(),
        );

        let copy = authorize_copy(&doc, ALICE, Some(&alice), "Payroll (copy)", 5).unwrap();
        assert_eq!(copy.owner, ALICE);
        assert_eq!(copy.content, doc.content);
        assert!(!copy.confidential);

        assert!(matches!(
            authorize_copy(&doc, BOB, None, "nope", 5),
            Err(PermsError::Forbidden(_))
        ));
    }
}
