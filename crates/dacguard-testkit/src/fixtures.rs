//! Test fixtures and helpers.
//!
//! A seeded organisation (one admin, one HR manager, some employees) over
//! any store, plus shortcuts for the handshake and document setup that most
//! integration tests start with.

use dacguard::{Guard, GuardConfig, Initiator, LeaveRequest};
use dacguard_core::{DocumentId, MessageId, Role, User, UserId};
use dacguard_crypto::SymmetricKey;
use dacguard_store::{MemoryStore, SqliteStore, Store};

/// A guard with seeded principals.
pub struct TestFixture<S: Store = MemoryStore> {
    pub guard: Guard<S>,
    pub admin: User,
    pub hr: User,
    pub employees: Vec<User>,
}

impl TestFixture<MemoryStore> {
    /// In-memory fixture with two employees.
    pub fn new() -> Self {
        Self::with_employees(2)
    }

    /// In-memory fixture with `count` employees.
    pub fn with_employees(count: usize) -> Self {
        Self::seed(Guard::in_memory(GuardConfig::default()), count)
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture<SqliteStore> {
    /// Fixture over an in-memory SQLite database.
    pub fn sqlite(count: usize) -> Self {
        let store = SqliteStore::open_memory().expect("open in-memory sqlite");
        Self::seed(Guard::new(store, GuardConfig::default()), count)
    }

    /// Fixture over a SQLite file at `path`.
    pub fn sqlite_at(path: &std::path::Path, count: usize) -> Self {
        let config = GuardConfig {
            database_path: Some(path.to_path_buf()),
            ..GuardConfig::default()
        };
        Self::seed(Guard::open(config).expect("open sqlite file"), count)
    }
}

impl<S: Store> TestFixture<S> {
    /// Register the standard principals on `guard`.
    pub fn seed(guard: Guard<S>, employees: usize) -> Self {
        let admin = guard
            .register_user("admin@example.com", Role::Admin)
            .expect("register admin");
        let hr = guard
            .register_user("hr@example.com", Role::HrManager)
            .expect("register hr");
        let employees = (0..employees)
            .map(|i| {
                guard
                    .register_user(&format!("employee{i}@example.com"), Role::Employee)
                    .expect("register employee")
            })
            .collect();
        Self {
            guard,
            admin,
            hr,
            employees,
        }
    }

    /// Id of the `index`th seeded employee.
    pub fn employee(&self, index: usize) -> UserId {
        self.employees[index].id
    }

    /// Run a full handshake between `initiator` and HR and return the
    /// initiator's key.
    ///
    /// HR keeps one session, so only the most recent handshake can be
    /// decrypted on the HR side.
    pub fn handshake(&self, initiator: UserId) -> SymmetricKey {
        let exchange = self.guard.key_exchange();
        let params = exchange.init_params().expect("init dh params");
        let local = Initiator::new(&params);
        let hr_public = exchange
            .respond(self.hr.id, initiator, local.public_key())
            .expect("hr responds");
        local
            .complete(&hr_public)
            .expect("complete handshake")
            .derive_symmetric_key()
    }

    /// Handshake, seal, and send a leave request from `employee` to HR.
    pub fn send_leave(&self, employee: UserId, request: &LeaveRequest) -> MessageId {
        let key = self.handshake(employee);
        let sealed = request.seal(&key).expect("seal leave request");
        self.guard
            .mailbox()
            .send(employee, self.hr.id, &sealed)
            .expect("send leave request")
    }

    /// A confidential document owned by `owner`.
    pub fn document(&self, owner: UserId, title: &str) -> DocumentId {
        self.guard
            .matrix()
            .create_document(owner, title, "quarterly numbers", true)
            .expect("create document")
    }
}

/// A representative leave request.
pub fn sample_leave_request() -> LeaveRequest {
    LeaveRequest {
        employee_name: "Alice Example".into(),
        start_date: "2026-07-01".into(),
        end_date: "2026-07-05".into(),
        reason: "vacation".into(),
        days: 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dacguard::SessionState;

    #[test]
    fn test_fixture_seeds_roles() {
        let fixture = TestFixture::with_employees(3);
        assert_eq!(fixture.admin.role, Role::Admin);
        assert_eq!(fixture.hr.role, Role::HrManager);
        assert_eq!(fixture.employees.len(), 3);
        assert_eq!(fixture.guard.users().unwrap().len(), 5);
    }

    #[test]
    fn test_fixture_leave_round_trip() {
        let fixture = TestFixture::new();
        let request = sample_leave_request();
        let id = fixture.send_leave(fixture.employee(0), &request);

        let opened = fixture
            .guard
            .mailbox()
            .open_leave_request(fixture.hr.id, id)
            .unwrap();
        assert_eq!(opened, request);
        assert_eq!(
            fixture.guard.key_exchange().session_state(fixture.hr.id).unwrap(),
            SessionState::SharedSecretEstablished
        );
    }

    #[test]
    fn test_sqlite_fixture() {
        let fixture = TestFixture::sqlite(1);
        let doc = fixture.document(fixture.employee(0), "Plan");
        let fetched = fixture.guard.matrix().get(fixture.employee(0), doc).unwrap();
        assert_eq!(fetched.title, "Plan");
    }
}
