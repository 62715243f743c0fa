//! # dacguard testkit
//!
//! Testing utilities for dacguard.
//!
//! - **Known-answer vectors**: key derivation and AES-256-CBC outputs
//!   computed outside this codebase
//! - **Generators**: proptest strategies for rights, policies, and keys
//! - **Fixtures**: a seeded organisation over any store
//!
//! ## Vectors
//!
//! ```rust
//! use dacguard_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use dacguard_testkit::generators::GrantParams;
//!
//! proptest! {
//!     #[test]
//!     fn grant_never_empties_cell(params: GrantParams) {
//!         prop_assert!(!params.permissions.is_empty());
//!     }
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust
//! use dacguard_testkit::fixtures::{sample_leave_request, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let id = fixture.send_leave(fixture.employee(0), &sample_leave_request());
//! let opened = fixture.guard.mailbox().open_leave_request(fixture.hr.id, id).unwrap();
//! assert_eq!(opened.days, 5);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sample_leave_request, TestFixture};
pub use generators::{DelegationParams, GrantParams};
pub use vectors::{cipher_vectors, key_derivation_vectors, verify_all_vectors, TEXTBOOK};
