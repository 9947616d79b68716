//! In-memory patient store.
//!
//! Useful for tests and for hosts that keep records elsewhere. Failures can be
//! switched on to exercise the submission workflow's error paths.

use super::{PatientStore, StoreError, StoreResult};
use crate::models::{reference_number, NewPatient, PersistedPatient};

/// Vector-backed patient store.
#[derive(Debug)]
pub struct MemoryStore {
    patients: Vec<PersistedPatient>,
    reference_prefix: String,
    next_invoice_no: i64,
    insert_calls: usize,
    fail_inserts: bool,
    fail_fetches: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            patients: Vec::new(),
            reference_prefix: "BILL".into(),
            next_invoice_no: 1,
            insert_calls: 0,
            fail_inserts: false,
            fail_fetches: false,
        }
    }

    /// Use a different prefix for bill reference numbers.
    pub fn with_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = prefix.into();
        self
    }

    /// Make subsequent inserts fail.
    pub fn set_fail_inserts(&mut self, fail: bool) {
        self.fail_inserts = fail;
    }

    /// Make subsequent fetches fail.
    pub fn set_fail_fetches(&mut self, fail: bool) {
        self.fail_fetches = fail;
    }

    /// Number of insert attempts, including failed ones.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls
    }

    /// Stored records.
    pub fn patients(&self) -> &[PersistedPatient] {
        &self.patients
    }

    /// Add a record created elsewhere (another desk, an import).
    pub fn push_external(&mut self, patient: PersistedPatient) {
        self.patients.push(patient);
    }
}

impl PatientStore for MemoryStore {
    fn insert_patient(&mut self, patient: &NewPatient) -> StoreResult<PersistedPatient> {
        self.insert_calls += 1;
        if self.fail_inserts {
            return Err(StoreError::Unavailable("insert rejected".into()));
        }

        let persisted = PersistedPatient {
            registration_id: uuid::Uuid::new_v4().to_string(),
            reference_number: reference_number(&self.reference_prefix, self.next_invoice_no),
            created_at: chrono::Utc::now().to_rfc3339(),
            fullname: patient.fullname.clone(),
            mobile: patient.mobile.clone(),
            treatment: patient.treatment.clone(),
            invoice: patient.invoice.clone(),
        };
        self.next_invoice_no += 1;
        self.patients.push(persisted.clone());
        Ok(persisted)
    }

    fn fetch_all(&self) -> StoreResult<Vec<PersistedPatient>> {
        if self.fail_fetches {
            return Err(StoreError::Unavailable("fetch rejected".into()));
        }
        Ok(self.patients.clone())
    }
}
