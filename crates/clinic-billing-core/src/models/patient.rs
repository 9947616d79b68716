//! Patient models.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::invoice::Invoice;

/// A patient assembled from the registration form, not yet stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    /// Full name (non-empty)
    pub fullname: String,
    /// Contact number
    pub mobile: String,
    /// Free-text treatment description
    pub treatment: String,
    /// Invoice created together with the patient
    pub invoice: Invoice,
}

/// A patient record as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedPatient {
    /// Local UUID assigned at insert
    pub registration_id: String,
    /// Printed bill number, e.g. "BILL000042"
    pub reference_number: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Full name
    pub fullname: String,
    /// Contact number
    pub mobile: String,
    /// Treatment description
    pub treatment: String,
    /// Invoice with its stored transactions
    pub invoice: Invoice,
}

impl PersistedPatient {
    /// Soft uniqueness key used by the duplicate guard.
    pub fn matches_identity(&self, fullname: &str, mobile: &str) -> bool {
        self.fullname == fullname && self.mobile == mobile
    }

    /// Calendar date the patient was registered at `offset`, if the
    /// timestamp parses.
    pub fn created_on(&self, offset: FixedOffset) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&offset).date_naive())
    }
}

/// Format an invoice number as a printed reference.
pub fn reference_number(prefix: &str, invoice_no: i64) -> String {
    format!("{}{:06}", prefix, invoice_no)
}
