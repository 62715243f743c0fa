//! Access-control properties, checked on the in-memory store, an in-memory
//! SQLite database, and a SQLite file.

use dacguard::store::{Store, SqliteStore};
use dacguard::{GuardError, Permission, PermissionSet, PolicyMode, Right, RightSet};
use dacguard_core::{now_millis, NewDelegation};
use dacguard_testkit::TestFixture;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn perms(items: &[Permission]) -> PermissionSet {
    items.iter().copied().collect()
}

fn rights(items: &[Right]) -> RightSet {
    items.iter().copied().collect()
}

/// Run one scenario against every store.
macro_rules! on_every_store {
    ($($name:ident => $scenario:ident),* $(,)?) => {
        mod memory {
            $(
                #[test]
                fn $name() {
                    super::init_tracing();
                    super::$scenario(&dacguard_testkit::TestFixture::with_employees(3));
                }
            )*
        }

        mod sqlite_memory {
            $(
                #[test]
                fn $name() {
                    super::init_tracing();
                    super::$scenario(&dacguard_testkit::TestFixture::sqlite(3));
                }
            )*
        }

        mod sqlite_file {
            $(
                #[test]
                fn $name() {
                    super::init_tracing();
                    let dir = tempfile::tempdir().unwrap();
                    let fixture =
                        dacguard_testkit::TestFixture::sqlite_at(&dir.path().join("guard.db"), 3);
                    super::$scenario(&fixture);
                }
            )*
        }
    };
}

on_every_store! {
    test_acl_single_entry => acl_single_entry,
    test_dac_propagation => dac_propagation,
    test_transfer_only_containment => transfer_only_containment,
    test_transfer_only_blocks_dac_relaunch => transfer_only_blocks_dac_relaunch,
    test_copy_escapes_acl => copy_escapes_acl,
    test_depth_exhaustion => depth_exhaustion,
    test_depth_budget_counts_hops => depth_budget_counts_hops,
    test_dac_delegation_chains_freely => dac_delegation_chains_freely,
    test_expired_delegation_grants_nothing => expired_delegation_grants_nothing,
    test_failed_grant_writes_nothing => failed_grant_writes_nothing,
    test_graph_report_flags_dac_paths => graph_report_flags_dac_paths,
}

fn acl_single_entry<S: Store>(f: &TestFixture<S>) {
    let (owner, alice) = (f.employee(0), f.employee(1));
    let doc = f.document(owner, "Budget");
    let matrix = f.guard.matrix();

    matrix
        .grant(owner, doc, alice, perms(&[Permission::Read]), false, PolicyMode::Secure)
        .unwrap();
    matrix
        .grant(
            owner,
            doc,
            alice,
            perms(&[Permission::Read, Permission::Write]),
            false,
            PolicyMode::Secure,
        )
        .unwrap();

    let shares = matrix.shares_of(owner, doc).unwrap();
    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0].permissions, perms(&[Permission::Read, Permission::Write]));
    assert_eq!(f.guard.store().all_acl_entries().unwrap().len(), 1);
}

fn dac_propagation<S: Store>(f: &TestFixture<S>) {
    let (owner, alice, bob) = (f.employee(0), f.employee(1), f.employee(2));
    let doc = f.document(owner, "Budget");
    let matrix = f.guard.matrix();
    let read_share = perms(&[Permission::Read, Permission::Share]);

    matrix
        .grant(owner, doc, alice, read_share.clone(), false, PolicyMode::Dac)
        .unwrap();
    matrix
        .grant(alice, doc, bob, read_share, false, PolicyMode::Dac)
        .unwrap();

    // Bob now holds share and could pass it on again.
    let access = matrix.access(bob, doc).unwrap();
    assert!(access.can_reshare);
    assert!(matrix.get(bob, doc).is_ok());
}

fn transfer_only_containment<S: Store>(f: &TestFixture<S>) {
    let (owner, alice, bob) = (f.employee(0), f.employee(1), f.employee(2));
    let doc = f.document(owner, "Budget");
    let matrix = f.guard.matrix();

    matrix
        .grant(owner, doc, alice, perms(&[Permission::Read]), false, PolicyMode::Secure)
        .unwrap();
    let err = matrix
        .grant(alice, doc, bob, perms(&[Permission::Read]), false, PolicyMode::Secure)
        .unwrap_err();
    assert!(matches!(err, GuardError::Forbidden(_)));

    // Even holding share, a transfer-only grant leaves no reshare right.
    matrix
        .grant(
            owner,
            doc,
            alice,
            perms(&[Permission::Read, Permission::Share]),
            false,
            PolicyMode::Secure,
        )
        .unwrap();
    let err = matrix
        .grant(alice, doc, bob, perms(&[Permission::Read]), false, PolicyMode::Secure)
        .unwrap_err();
    assert!(matches!(err, GuardError::Forbidden(_)));
    assert!(matrix.get(bob, doc).is_err());
}

fn transfer_only_blocks_dac_relaunch<S: Store>(f: &TestFixture<S>) {
    let (owner, alice, bob) = (f.employee(0), f.employee(1), f.employee(2));
    let doc = f.document(owner, "Payroll");
    let matrix = f.guard.matrix();
    let read_share = perms(&[Permission::Read, Permission::Share]);

    let err = matrix
        .grant(owner, doc, alice, read_share.clone(), true, PolicyMode::Secure)
        .unwrap_err();
    assert!(matches!(err, GuardError::Forbidden(_)));
    assert!(matrix.get(alice, doc).is_err());

    matrix
        .grant(owner, doc, alice, read_share.clone(), false, PolicyMode::Secure)
        .unwrap();
    assert!(!matrix.access(alice, doc).unwrap().can_reshare);

    let err = matrix
        .grant(alice, doc, bob, read_share, false, PolicyMode::Dac)
        .unwrap_err();
    assert!(matches!(err, GuardError::Forbidden(_)));
    assert!(matrix.get(bob, doc).is_err());
}

fn copy_escapes_acl<S: Store>(f: &TestFixture<S>) {
    let (owner, alice, bob) = (f.employee(0), f.employee(1), f.employee(2));
    let doc = f.document(owner, "Salaries");
    let matrix = f.guard.matrix();

    matrix
        .grant(owner, doc, alice, perms(&[Permission::Read]), false, PolicyMode::Secure)
        .unwrap();
    matrix
        .grant(owner, doc, bob, perms(&[Permission::Read]), false, PolicyMode::Secure)
        .unwrap();

    let copy = matrix.copy(alice, doc, "Salaries (copy)").unwrap();
    let copied = matrix.get(alice, copy).unwrap();
    assert_ne!(copy, doc);
    assert_eq!(copied.owner, alice);
    assert!(!copied.confidential);
    assert_eq!(copied.content, "quarterly numbers");
    assert!(matrix.shares_of(alice, copy).unwrap().is_empty());

    // Revoking the original leaves the copy untouched.
    matrix.revoke(owner, doc, alice).unwrap();
    assert!(matrix.get(alice, doc).is_err());
    assert!(matrix.get(alice, copy).is_ok());
}

fn depth_exhaustion<S: Store>(f: &TestFixture<S>) {
    let (a, b, c) = (f.employee(0), f.employee(1), f.employee(2));
    let graph = f.guard.delegations();
    let approve = rights(&[Right::ApproveLeave, Right::Delegate]);

    let root = graph
        .delegate_in_mode(f.hr.id, a, approve.clone(), PolicyMode::Secure, Some(1), Some(24))
        .unwrap();
    let root_edge = graph.get(root).unwrap();
    assert_eq!(root_edge.current_depth, 0);
    assert_eq!(root_edge.max_depth, Some(1));

    let hop = graph
        .delegate_in_mode(a, b, approve.clone(), PolicyMode::Secure, Some(5), Some(24))
        .unwrap();
    let hop_edge = graph.get(hop).unwrap();
    assert_eq!(hop_edge.current_depth, 1);
    assert_eq!(hop_edge.max_depth, Some(0));
    assert!(!hop_edge.can_redelegate);
    assert!(hop_edge.expires_at <= root_edge.expires_at);

    let err = graph
        .delegate_in_mode(b, c, approve, PolicyMode::Secure, Some(1), Some(24))
        .unwrap_err();
    assert!(matches!(
        err,
        GuardError::Forbidden(_) | GuardError::DepthExceeded { .. }
    ));
    assert!(!graph.has_right(c, Right::ApproveLeave).unwrap());
}

fn depth_budget_counts_hops<S: Store>(f: &TestFixture<S>) {
    let (a, b, c) = (f.employee(0), f.employee(1), f.employee(2));
    let graph = f.guard.delegations();
    let approve = rights(&[Right::ApproveLeave, Right::Delegate]);

    graph
        .delegate_in_mode(f.hr.id, a, approve.clone(), PolicyMode::Secure, Some(2), Some(24))
        .unwrap();
    let hop = graph
        .delegate_in_mode(a, b, approve.clone(), PolicyMode::Secure, Some(5), Some(24))
        .unwrap();
    let hop_edge = graph.get(hop).unwrap();
    assert_eq!(hop_edge.max_depth, Some(1));
    assert!(hop_edge.can_redelegate);

    let last = graph
        .delegate_in_mode(b, c, approve, PolicyMode::Secure, Some(5), Some(24))
        .unwrap();
    let last_edge = graph.get(last).unwrap();
    assert_eq!(last_edge.current_depth, 2);
    assert_eq!(last_edge.max_depth, Some(0));
    assert!(!last_edge.can_redelegate);
    assert!(graph.has_right(c, Right::ApproveLeave).unwrap());
}

fn dac_delegation_chains_freely<S: Store>(f: &TestFixture<S>) {
    let (a, b, c) = (f.employee(0), f.employee(1), f.employee(2));
    let graph = f.guard.delegations();
    let approve = rights(&[Right::ApproveLeave, Right::Delegate]);

    graph
        .delegate_in_mode(f.hr.id, a, approve.clone(), PolicyMode::Dac, None, None)
        .unwrap();
    graph
        .delegate_in_mode(a, b, approve.clone(), PolicyMode::Dac, None, None)
        .unwrap();
    graph
        .delegate_in_mode(b, c, approve, PolicyMode::Dac, None, None)
        .unwrap();

    assert!(graph.has_right(c, Right::ApproveLeave).unwrap());
    let chain = graph.traverse_chain(c).unwrap();
    let delegators: Vec<_> = chain.iter().map(|d| d.delegator).collect();
    assert_eq!(delegators, vec![b, a, f.hr.id]);
}

fn expired_delegation_grants_nothing<S: Store>(f: &TestFixture<S>) {
    let a = f.employee(0);
    let now = now_millis();
    let id = f
        .guard
        .store()
        .insert_delegation(&NewDelegation {
            delegator: f.hr.id,
            delegate: a,
            rights: rights(&[Right::ApproveLeave]),
            can_redelegate: false,
            max_depth: Some(0),
            current_depth: 0,
            expires_at: Some(now - 1_000),
            mode: PolicyMode::Secure,
            created_at: now - 10_000,
        })
        .unwrap();

    let graph = f.guard.delegations();
    assert!(graph.get(id).unwrap().is_active);
    assert!(graph.active_rights_for(a).unwrap().is_empty());
    assert!(!graph.has_right(a, Right::ApproveLeave).unwrap());
    assert!(graph.received_by(a).unwrap().is_empty());
}

fn failed_grant_writes_nothing<S: Store>(f: &TestFixture<S>) {
    let (owner, alice, bob) = (f.employee(0), f.employee(1), f.employee(2));
    let doc = f.document(owner, "Budget");
    let matrix = f.guard.matrix();

    for _ in 0..3 {
        assert!(matrix
            .grant(alice, doc, bob, perms(&[Permission::Read]), true, PolicyMode::Dac)
            .is_err());
    }
    assert!(f.guard.store().all_acl_entries().unwrap().is_empty());
}

fn graph_report_flags_dac_paths<S: Store>(f: &TestFixture<S>) {
    let (a, b, c) = (f.employee(0), f.employee(1), f.employee(2));
    let graph = f.guard.delegations();
    let approve = rights(&[Right::ApproveLeave, Right::Delegate]);

    graph
        .delegate_in_mode(f.hr.id, a, approve.clone(), PolicyMode::Dac, None, None)
        .unwrap();
    graph
        .delegate_in_mode(a, b, approve.clone(), PolicyMode::Dac, None, None)
        .unwrap();
    graph
        .delegate_in_mode(f.hr.id, c, approve, PolicyMode::Secure, Some(2), Some(24))
        .unwrap();

    assert!(matches!(
        graph.graph_paths(a),
        Err(GuardError::Forbidden(_))
    ));

    let report = graph.graph_paths(f.admin.id).unwrap();
    assert_eq!(report.graph.dac_edges, 2);
    assert_eq!(report.graph.secure_edges, 1);
    assert_eq!(report.paths.len(), 1);
    assert!(report.paths[0].vulnerable);
    assert_eq!(
        report.paths[0].path,
        "hr@example.com -> employee0@example.com -> employee1@example.com"
    );
}

#[test]
fn test_sqlite_state_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guard.db");

    let (owner, alice, doc) = {
        let f = TestFixture::sqlite_at(&path, 2);
        let (owner, alice) = (f.employee(0), f.employee(1));
        let doc = f.document(owner, "Budget");
        f.guard
            .matrix()
            .grant(owner, doc, alice, perms(&[Permission::Read]), false, PolicyMode::Secure)
            .unwrap();
        (owner, alice, doc)
    };

    let guard = dacguard::Guard::new(SqliteStore::open(&path).unwrap(), Default::default());
    let matrix = guard.matrix();
    assert_eq!(matrix.get(alice, doc).unwrap().owner, owner);
    assert_eq!(matrix.shares_of(owner, doc).unwrap().len(), 1);
}
