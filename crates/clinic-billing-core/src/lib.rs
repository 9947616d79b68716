//! Clinic Billing Core Library
//!
//! Local-first patient registration and bill generation for a clinic front desk.
//!
//! # Architecture
//!
//! ```text
//! Registration Form → Validation → Duplicate Guard → Invoice Assembly
//!                                                         │
//!                                           ┌─────────────▼─────────────┐
//!                                           │   Store: insert_patient   │
//!                                           │   (patient + invoice +    │
//!                                           │    transactions, atomic)  │
//!                                           └─────────────┬─────────────┘
//!                                                         │
//!                                           Store: fetch_all → Roster
//!                                                         │
//!                                     ┌───────────────────┴───────────────────┐
//!                                     ▼                                       ▼
//!                               Bill Projection                        Daily Summary
//!                              (host prints it)                        (JSON / CSV)
//! ```
//!
//! # Core Principle
//!
//! **Pending + paid always equals the billed total.** Amounts are exact decimals, and a
//! zero payment is dropped rather than stored.
//!
//! # Modules
//!
//! - [`db`]: SQLite patient store and an in-memory store
//! - [`models`]: Domain types (Patient, Invoice, Transaction, PatientForm)
//! - [`billing`]: Form validation and invoice assembly
//! - [`desk`]: Submission workflow, roster and duplicate guard
//! - [`export`]: Bill projection and daily summary export
//! - [`config`]: Desk configuration

pub mod billing;
pub mod config;
pub mod db;
pub mod desk;
pub mod export;
pub mod models;

// Re-export commonly used types
pub use config::DeskConfig;
pub use db::{Database, MemoryStore, PatientStore};
pub use desk::{BillingDesk, Notice, NoticeLevel, Roster, SubmitOutcome, WorkflowState};
pub use export::{BillProjection, DailySummary};
pub use models::{
    Invoice, NewPatient, PatientForm, PaymentMethod, PersistedPatient, Transaction,
    TransactionStatus,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum BillingError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Export error: {0}")]
    ExportError(String),
}

impl From<db::StoreError> for BillingError {
    fn from(e: db::StoreError) -> Self {
        BillingError::DatabaseError(e.to_string())
    }
}

impl From<config::ConfigError> for BillingError {
    fn from(e: config::ConfigError) -> Self {
        BillingError::ConfigError(e.to_string())
    }
}

impl From<desk::WorkflowError> for BillingError {
    fn from(e: desk::WorkflowError) -> Self {
        BillingError::SubmissionFailed(e.notice().message)
    }
}

impl From<export::SummaryError> for BillingError {
    fn from(e: export::SummaryError) -> Self {
        BillingError::ExportError(e.to_string())
    }
}

impl From<serde_json::Error> for BillingError {
    fn from(e: serde_json::Error) -> Self {
        BillingError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for BillingError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        BillingError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path and load the roster.
#[uniffi::export]
pub fn open_billing_desk(
    path: String,
    config_json: Option<String>,
) -> Result<Arc<BillingDeskHandle>, BillingError> {
    let config = match config_json {
        Some(json) => DeskConfig::from_json_str(&json)?,
        None => DeskConfig::default(),
    };
    let db = Database::open(&path)?.with_reference_prefix(config.reference_prefix.clone());
    let desk = BillingDesk::open(db, config)?;
    Ok(Arc::new(BillingDeskHandle {
        desk: Mutex::new(desk),
    }))
}

/// Create a desk over an in-memory database (for testing).
#[uniffi::export]
pub fn open_billing_desk_in_memory() -> Result<Arc<BillingDeskHandle>, BillingError> {
    let desk = BillingDesk::open(Database::open_in_memory()?, DeskConfig::default())?;
    Ok(Arc::new(BillingDeskHandle {
        desk: Mutex::new(desk),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe desk wrapper for FFI.
///
/// The mutex serializes host calls, so a second submit waits until the first
/// one has reloaded the roster.
#[derive(uniffi::Object)]
pub struct BillingDeskHandle {
    desk: Mutex<BillingDesk<Database>>,
}

#[uniffi::export]
impl BillingDeskHandle {
    // =========================================================================
    // Form Operations
    // =========================================================================

    /// Replace the form values with what the user has typed.
    pub fn set_form(&self, form: FfiPatientForm) -> Result<(), BillingError> {
        let mut desk = self.desk.lock()?;
        desk.set_form(form.into());
        Ok(())
    }

    /// Current form values.
    pub fn form(&self) -> Result<FfiPatientForm, BillingError> {
        let desk = self.desk.lock()?;
        Ok(desk.form().clone().into())
    }

    /// Live "Amount Due", formatted for display.
    pub fn amount_due_display(&self) -> Result<String, BillingError> {
        let desk = self.desk.lock()?;
        Ok(export::format_amount(
            desk.amount_due(),
            &desk.config().currency_symbol,
        ))
    }

    /// Whether the submit button should be enabled.
    pub fn can_submit(&self) -> Result<bool, BillingError> {
        let desk = self.desk.lock()?;
        Ok(desk.can_submit())
    }

    // =========================================================================
    // Submission Operations
    // =========================================================================

    /// Submit the current form.
    pub fn submit(&self) -> Result<FfiSubmitOutcome, BillingError> {
        let mut desk = self.desk.lock()?;
        let currency = desk.config().currency_symbol.clone();
        let outcome = desk.submit()?;
        Ok(FfiSubmitOutcome::from_outcome(outcome, &currency))
    }

    /// Dismiss the printed bill.
    pub fn clear(&self) -> Result<(), BillingError> {
        let mut desk = self.desk.lock()?;
        desk.clear();
        Ok(())
    }

    /// Bill awaiting print, if any.
    pub fn current_bill(&self) -> Result<Option<FfiBill>, BillingError> {
        let desk = self.desk.lock()?;
        let currency = desk.config().currency_symbol.clone();
        Ok(desk
            .current_bill()
            .map(|bill| FfiBill::from_projection(bill, &currency)))
    }

    // =========================================================================
    // Roster Operations
    // =========================================================================

    /// All known patients.
    pub fn roster(&self) -> Result<Vec<FfiPatient>, BillingError> {
        let desk = self.desk.lock()?;
        Ok(desk
            .roster()
            .patients()
            .iter()
            .cloned()
            .map(FfiPatient::from)
            .collect())
    }

    /// Reload the roster from the database.
    pub fn refresh(&self) -> Result<(), BillingError> {
        let mut desk = self.desk.lock()?;
        desk.refresh()?;
        Ok(())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Daily summary as JSON; `date` is `YYYY-MM-DD`.
    pub fn daily_summary_json(&self, date: String) -> Result<String, BillingError> {
        let date = parse_date(&date)?;
        let desk = self.desk.lock()?;
        Ok(desk.daily_summary(date)?.to_json()?)
    }

    /// Daily summary as CSV; `date` is `YYYY-MM-DD`.
    pub fn daily_summary_csv(&self, date: String) -> Result<String, BillingError> {
        let date = parse_date(&date)?;
        let desk = self.desk.lock()?;
        Ok(desk.daily_summary(date)?.to_csv())
    }
}

fn parse_date(date: &str) -> Result<chrono::NaiveDate, BillingError> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| BillingError::InvalidInput(format!("{}: {}", date, e)))
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe registration form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientForm {
    pub fullname: String,
    pub mobile: String,
    pub treatment: String,
    pub total_amount: String,
    pub paid_amount: String,
    pub payment_type: String,
    pub previous_paid: Option<String>,
}

impl From<PatientForm> for FfiPatientForm {
    fn from(form: PatientForm) -> Self {
        Self {
            fullname: form.fullname,
            mobile: form.mobile,
            treatment: form.treatment,
            total_amount: form.total_amount,
            paid_amount: form.paid_amount,
            payment_type: form.payment_type,
            previous_paid: form.previous_paid,
        }
    }
}

impl From<FfiPatientForm> for PatientForm {
    fn from(form: FfiPatientForm) -> Self {
        PatientForm {
            fullname: form.fullname,
            mobile: form.mobile,
            treatment: form.treatment,
            total_amount: form.total_amount,
            paid_amount: form.paid_amount,
            payment_type: form.payment_type,
            previous_paid: form.previous_paid,
        }
    }
}

/// FFI-safe transaction. Amounts are decimal strings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTransaction {
    pub status: String,
    pub amount: String,
    pub description: String,
    pub payment_method: String,
}

impl From<Transaction> for FfiTransaction {
    fn from(tx: Transaction) -> Self {
        Self {
            status: tx.status.as_str().to_string(),
            amount: tx.amount.to_string(),
            description: tx.description,
            payment_method: tx.payment_method.label().to_string(),
        }
    }
}

/// FFI-safe stored patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub registration_id: String,
    pub reference_number: String,
    pub created_at: String,
    pub fullname: String,
    pub mobile: String,
    pub treatment: String,
    pub total: String,
    pub transactions: Vec<FfiTransaction>,
}

impl From<PersistedPatient> for FfiPatient {
    fn from(patient: PersistedPatient) -> Self {
        Self {
            registration_id: patient.registration_id,
            reference_number: patient.reference_number,
            created_at: patient.created_at,
            fullname: patient.fullname,
            mobile: patient.mobile,
            treatment: patient.treatment,
            total: patient.invoice.total.to_string(),
            transactions: patient
                .invoice
                .transactions
                .into_iter()
                .map(|t| t.into())
                .collect(),
        }
    }
}

/// FFI-safe bill for the print view.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBill {
    pub fullname: String,
    pub mobile: String,
    pub registration_id: String,
    pub reference_number: String,
    pub values: FfiPatientForm,
    pub amount_due: String,
    pub amount_due_display: String,
    pub issued_at: String,
}

impl FfiBill {
    fn from_projection(bill: &BillProjection, currency_symbol: &str) -> Self {
        Self {
            fullname: bill.fullname.clone(),
            mobile: bill.mobile.clone(),
            registration_id: bill.registration_id.clone(),
            reference_number: bill.reference_number.clone(),
            values: bill.values.clone().into(),
            amount_due: bill.amount_due.to_string(),
            amount_due_display: bill.amount_due_display(currency_symbol),
            issued_at: bill.issued_at.clone(),
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotice {
    pub is_error: bool,
    pub message: String,
}

impl From<Notice> for FfiNotice {
    fn from(notice: Notice) -> Self {
        Self {
            is_error: notice.level == NoticeLevel::Error,
            message: notice.message,
        }
    }
}

/// FFI-safe field error.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldError {
    pub field: String,
    pub message: String,
}

/// FFI-safe submission outcome.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiSubmitOutcome {
    Accepted {
        patient: FfiPatient,
        bill: FfiBill,
        notice: FfiNotice,
    },
    Invalid {
        errors: Vec<FfiFieldError>,
    },
    Duplicate {
        notice: FfiNotice,
    },
}

impl FfiSubmitOutcome {
    fn from_outcome(outcome: SubmitOutcome, currency_symbol: &str) -> Self {
        match outcome {
            SubmitOutcome::Accepted {
                patient,
                bill,
                notice,
            } => FfiSubmitOutcome::Accepted {
                bill: FfiBill::from_projection(&bill, currency_symbol),
                patient: patient.into(),
                notice: notice.into(),
            },
            SubmitOutcome::Invalid(errors) => FfiSubmitOutcome::Invalid {
                errors: errors
                    .errors
                    .into_iter()
                    .map(|e| FfiFieldError {
                        field: e.field.as_str().to_string(),
                        message: e.message,
                    })
                    .collect(),
            },
            SubmitOutcome::Duplicate(notice) => FfiSubmitOutcome::Duplicate {
                notice: notice.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_form(name: &str, mobile: &str) -> FfiPatientForm {
        FfiPatientForm {
            fullname: name.into(),
            mobile: mobile.into(),
            treatment: "Crown".into(),
            total_amount: "1000".into(),
            paid_amount: "400".into(),
            payment_type: "Card".into(),
            previous_paid: None,
        }
    }

    #[test]
    fn test_handle_submit_and_bill() {
        let handle = open_billing_desk_in_memory().unwrap();
        handle.set_form(make_form("A", "1")).unwrap();
        assert_eq!(handle.amount_due_display().unwrap(), "Rs.600.00");

        match handle.submit().unwrap() {
            FfiSubmitOutcome::Accepted { patient, bill, notice } => {
                assert!(!notice.is_error);
                assert_eq!(patient.total, "1000");
                assert_eq!(patient.transactions.len(), 2);
                assert_eq!(patient.transactions[1].payment_method, "Card");
                assert_eq!(bill.amount_due_display, "Rs.600.00");
                assert_eq!(bill.reference_number, "BILL000001");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert!(handle.current_bill().unwrap().is_some());
        assert_eq!(handle.roster().unwrap().len(), 1);
        assert_eq!(handle.form().unwrap().payment_type, "Cash");

        handle.clear().unwrap();
        assert!(handle.current_bill().unwrap().is_none());
    }

    #[test]
    fn test_handle_duplicate_and_invalid() {
        let handle = open_billing_desk_in_memory().unwrap();
        handle.set_form(make_form("A", "1")).unwrap();
        handle.submit().unwrap();

        handle.set_form(make_form("A", "1")).unwrap();
        assert!(matches!(
            handle.submit().unwrap(),
            FfiSubmitOutcome::Duplicate { notice } if notice.is_error
        ));

        handle.set_form(make_form("", "2")).unwrap();
        match handle.submit().unwrap() {
            FfiSubmitOutcome::Invalid { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "fullname");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_open_on_disk_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db").to_string_lossy().to_string();

        let handle = open_billing_desk(
            path.clone(),
            Some(r#"{"reference_prefix": "INV", "currency_symbol": "$"}"#.into()),
        )
        .unwrap();
        handle.set_form(make_form("A", "1")).unwrap();
        let FfiSubmitOutcome::Accepted { bill, .. } = handle.submit().unwrap() else {
            panic!("expected accepted submission");
        };
        assert_eq!(bill.reference_number, "INV000001");
        assert_eq!(bill.amount_due_display, "$600.00");
        drop(handle);

        // Roster survives a reopen
        let reopened = open_billing_desk(path, None).unwrap();
        assert_eq!(reopened.roster().unwrap().len(), 1);
    }

    #[test]
    fn test_daily_summary_rejects_bad_date() {
        let handle = open_billing_desk_in_memory().unwrap();
        assert!(matches!(
            handle.daily_summary_json("01/05/2026".into()),
            Err(BillingError::InvalidInput(_))
        ));
        let csv = handle.daily_summary_csv("2026-05-01".into()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_amount_due_display_survives_extreme_input() {
        let handle = open_billing_desk_in_memory().unwrap();
        let mut form = make_form("A", "1");
        form.total_amount = "79228162514264337593543950335".into();
        form.paid_amount = "-79228162514264337593543950335".into();
        handle.set_form(form).unwrap();

        assert_eq!(handle.amount_due_display().unwrap(), "Rs.0.00");
        assert!(handle.can_submit().unwrap());
        match handle.submit().unwrap() {
            FfiSubmitOutcome::Invalid { errors } => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "total_amount");
                assert_eq!(errors[1].field, "paid_amount");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(handle.roster().unwrap().len(), 0);
    }

    #[test]
    fn test_daily_summary_at_amount_limit() {
        let handle = open_billing_desk_in_memory().unwrap();
        for mobile in ["1", "2"] {
            let mut form = make_form("A", mobile);
            form.total_amount = "1000000000000".into();
            form.paid_amount = "1000000000000".into();
            handle.set_form(form).unwrap();
            assert!(matches!(
                handle.submit().unwrap(),
                FfiSubmitOutcome::Accepted { .. }
            ));
        }

        let patients = handle.roster().unwrap();
        let day = &patients[0].created_at[..10];
        let expected = if patients[1].created_at.starts_with(day) {
            "2000000000000"
        } else {
            "1000000000000"
        };
        let json = handle.daily_summary_json(day.to_string()).unwrap();
        assert!(json.contains(&format!("\"billed_total\": \"{}\"", expected)));
        assert!(handle.can_submit().unwrap());
    }

    #[test]
    fn test_bad_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db").to_string_lossy().to_string();
        assert!(matches!(
            open_billing_desk(path, Some("{not json".into())),
            Err(BillingError::ConfigError(_))
        ));
    }
}
