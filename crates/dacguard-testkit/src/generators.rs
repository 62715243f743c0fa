//! Proptest generators for property-based testing.

use proptest::prelude::*;

use dacguard_core::{
    Permission, PermissionSet, PolicyMode, PropagationPolicy, Right, RightSet, Role,
};
use dacguard_crypto::{Iv, SymmetricKey};

pub fn permission() -> impl Strategy<Value = Permission> {
    prop_oneof![
        Just(Permission::Read),
        Just(Permission::Write),
        Just(Permission::Share),
    ]
}

/// A non-empty permission set.
pub fn permission_set() -> impl Strategy<Value = PermissionSet> {
    prop::collection::btree_set(permission(), 1..=3).prop_map(|s| s.into_iter().collect())
}

pub fn right() -> impl Strategy<Value = Right> {
    prop_oneof![
        Just(Right::ApproveLeave),
        Just(Right::ViewRequests),
        Just(Right::Delegate),
    ]
}

/// A non-empty right set.
pub fn right_set() -> impl Strategy<Value = RightSet> {
    prop::collection::btree_set(right(), 1..=3).prop_map(|s| s.into_iter().collect())
}

pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::HrManager), Just(Role::Employee)]
}

pub fn policy_mode() -> impl Strategy<Value = PolicyMode> {
    prop_oneof![Just(PolicyMode::Dac), Just(PolicyMode::Secure)]
}

/// Unbounded, or bounded with a small depth and an optional expiry.
pub fn propagation_policy() -> impl Strategy<Value = PropagationPolicy> {
    prop_oneof![
        Just(PropagationPolicy::Unbounded),
        (0u32..=4, prop::option::of(1_000i64..=4_000_000_000_000i64)).prop_map(
            |(max_depth, expires_at)| PropagationPolicy::Bounded {
                max_depth,
                expires_at,
            }
        ),
    ]
}

pub fn symmetric_key() -> impl Strategy<Value = SymmetricKey> {
    any::<[u8; 32]>().prop_map(SymmetricKey::from_bytes)
}

pub fn iv() -> impl Strategy<Value = Iv> {
    any::<[u8; 16]>().prop_map(Iv)
}

/// Arbitrary text up to `max_len` characters.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 0..=max_len).prop_map(|chars| chars.into_iter().collect())
}

/// Inputs to one access-matrix grant.
#[derive(Debug, Clone)]
pub struct GrantParams {
    pub permissions: PermissionSet,
    pub allow_reshare: bool,
    pub mode: PolicyMode,
}

impl Arbitrary for GrantParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (permission_set(), any::<bool>(), policy_mode())
            .prop_map(|(permissions, allow_reshare, mode)| GrantParams {
                permissions,
                allow_reshare,
                mode,
            })
            .boxed()
    }
}

/// Inputs to one delegation through the facade.
#[derive(Debug, Clone)]
pub struct DelegationParams {
    pub rights: RightSet,
    pub mode: PolicyMode,
    pub max_depth: u32,
    pub expires_in_hours: u32,
}

impl Arbitrary for DelegationParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (right_set(), policy_mode(), 0u32..=3, 1u32..=720)
            .prop_map(|(rights, mode, max_depth, expires_in_hours)| DelegationParams {
                rights,
                mode,
                max_depth,
                expires_in_hours,
            })
            .boxed()
    }
}
