//! In-memory roster and duplicate guard.

use crate::models::PersistedPatient;

/// Every known patient, as last read from the store.
///
/// Only replaced wholesale after a store round-trip; never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    patients: Vec<PersistedPatient>,
}

impl Roster {
    pub fn new(patients: Vec<PersistedPatient>) -> Self {
        Self { patients }
    }

    /// Replace the whole roster with a fresh store read.
    pub fn replace(&mut self, patients: Vec<PersistedPatient>) {
        self.patients = patients;
    }

    /// Check if a patient with this exact name and mobile is already known.
    ///
    /// Case-sensitive, no trimming.
    pub fn is_duplicate(&self, fullname: &str, mobile: &str) -> bool {
        self.patients
            .iter()
            .any(|p| p.matches_identity(fullname, mobile))
    }

    pub fn patients(&self) -> &[PersistedPatient] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Invoice;
    use rust_decimal::Decimal;

    fn make_patient(name: &str, mobile: &str) -> PersistedPatient {
        PersistedPatient {
            registration_id: format!("{}-{}", name, mobile),
            reference_number: "BILL000001".into(),
            created_at: "2026-01-01T00:00:00+00:00".into(),
            fullname: name.into(),
            mobile: mobile.into(),
            treatment: String::new(),
            invoice: Invoice {
                description: name.into(),
                total: Decimal::ZERO,
                transactions: vec![],
            },
        }
    }

    #[test]
    fn test_duplicate_needs_both_fields() {
        let roster = Roster::new(vec![make_patient("A", "1")]);

        assert!(roster.is_duplicate("A", "1"));
        assert!(!roster.is_duplicate("A", "2"));
        assert!(!roster.is_duplicate("B", "1"));
    }

    #[test]
    fn test_duplicate_is_exact() {
        let roster = Roster::new(vec![make_patient("Asha", "98")]);

        assert!(!roster.is_duplicate("asha", "98"));
        assert!(!roster.is_duplicate("Asha ", "98"));
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut roster = Roster::new(vec![make_patient("A", "1"), make_patient("B", "2")]);
        roster.replace(vec![make_patient("C", "3")]);

        assert_eq!(roster.len(), 1);
        assert!(!roster.is_duplicate("A", "1"));
        assert!(roster.is_duplicate("C", "3"));
    }
}
