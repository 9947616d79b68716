//! Registration desk: the submission workflow.
//!
//! ```text
//! Idle ──submit──▶ Validating ──invalid──▶ Idle
//!                      │
//!                      ├──roster stale, reload fails──▶ Idle (notice)
//!                      ├──duplicate──▶ Idle (notice)
//!                      ▼
//!                  Persisting ──store error──▶ Idle (notice)
//!                      │
//!                      ▼
//!                  Refreshing ──store error──▶ Idle (notice)
//!                      │
//!                      ▼
//!                 ReadyToPrint ──clear──▶ Idle
//! ```
//!
//! The roster is only replaced after both store calls succeed, and the form is
//! only cleared on success. If the reload after an insert fails, the roster is
//! marked stale and the next submission reloads it before the duplicate guard
//! runs, so a retried form cannot be stored twice.

mod roster;

pub use roster::*;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::billing::{self, ValidationErrors};
use crate::config::DeskConfig;
use crate::db::{PatientStore, StoreError, StoreResult};
use crate::export::{BillProjection, DailySummary, SummaryResult};
use crate::models::{PatientForm, PersistedPatient};

/// Workflow errors. Store failures are not recoverable by the desk itself.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("Failed to save patient: {0}")]
    Insert(#[source] StoreError),

    #[error("Failed to reload patients: {0}")]
    Refresh(#[source] StoreError),
}

impl WorkflowError {
    /// Failure notification for the user.
    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Notification severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient message for the host's notification area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where the desk is in the submission workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// Form displayed, nothing pending
    Idle,
    /// Checking field values
    Validating,
    /// Waiting on the store insert
    Persisting,
    /// Waiting on the roster reload
    Refreshing,
    /// A bill is available for printing
    ReadyToPrint(BillProjection),
}

/// Result of a submission that did not hit a store failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Stored and reloaded; the bill can be printed
    Accepted {
        patient: PersistedPatient,
        bill: BillProjection,
        notice: Notice,
    },
    /// Field errors to show inline; nothing was stored
    Invalid(ValidationErrors),
    /// Same name and mobile already on the roster; nothing was stored
    Duplicate(Notice),
}

/// Message shown when a duplicate submission is rejected.
pub const DUPLICATE_MESSAGE: &str = "This patient has already been submitted";

/// Message shown when a submission is stored.
pub const SUCCESS_MESSAGE: &str = "Patient registered successfully";

/// Owns the roster, the form and the store for one registration desk.
pub struct BillingDesk<S: PatientStore> {
    store: S,
    config: DeskConfig,
    roster: Roster,
    form: PatientForm,
    state: WorkflowState,
    /// Set when an insert succeeded but the reload after it failed
    roster_stale: bool,
}

impl<S: PatientStore> BillingDesk<S> {
    /// Create a desk with an empty roster.
    pub fn new(store: S, config: DeskConfig) -> Self {
        let form = PatientForm::new(config.default_payment_method);
        Self {
            store,
            config,
            roster: Roster::default(),
            form,
            state: WorkflowState::Idle,
            roster_stale: false,
        }
    }

    /// Create a desk and load the roster from the store.
    pub fn open(store: S, config: DeskConfig) -> StoreResult<Self> {
        let mut desk = Self::new(store, config);
        desk.refresh()?;
        Ok(desk)
    }

    /// Reload the roster from the store.
    pub fn refresh(&mut self) -> StoreResult<()> {
        let patients = self.store.fetch_all()?;
        tracing::debug!(count = patients.len(), "roster loaded");
        self.roster.replace(patients);
        self.roster_stale = false;
        Ok(())
    }

    /// Whether the store may hold records the roster has not seen yet.
    pub fn roster_is_stale(&self) -> bool {
        self.roster_stale
    }

    pub fn form(&self) -> &PatientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PatientForm {
        &mut self.form
    }

    pub fn set_form(&mut self, form: PatientForm) {
        self.form = form;
    }

    /// Live "Amount Due" for the current form.
    pub fn amount_due(&self) -> Decimal {
        billing::amount_due(&self.form)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Bill of the last accepted submission, until cleared.
    pub fn current_bill(&self) -> Option<&BillProjection> {
        match &self.state {
            WorkflowState::ReadyToPrint(bill) => Some(bill),
            _ => None,
        }
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        matches!(self.state, WorkflowState::Idle | WorkflowState::ReadyToPrint(_))
    }

    /// Submit the current form.
    ///
    /// Validation and duplicate rejections come back as [`SubmitOutcome`] variants.
    /// Store failures come back as errors and leave roster and form untouched.
    pub fn submit(&mut self) -> WorkflowResult<SubmitOutcome> {
        if !self.can_submit() {
            return Err(WorkflowError::SubmissionInFlight);
        }

        self.state = WorkflowState::Validating;
        let valid = match billing::validate_form(&self.form) {
            Ok(valid) => valid,
            Err(errors) => {
                tracing::debug!(errors = errors.errors.len(), "form rejected");
                self.state = WorkflowState::Idle;
                return Ok(SubmitOutcome::Invalid(errors));
            }
        };

        if self.roster_stale {
            self.state = WorkflowState::Refreshing;
            if let Err(e) = self.refresh() {
                tracing::warn!(error = %e, "roster still stale, submission held back");
                self.state = WorkflowState::Idle;
                return Err(WorkflowError::Refresh(e));
            }
        }

        if self.roster.is_duplicate(&valid.fullname, &valid.mobile) {
            tracing::warn!(fullname = %valid.fullname, mobile = %valid.mobile, "duplicate submission rejected");
            if self.config.reset_form_on_duplicate {
                self.reset_form();
            }
            self.state = WorkflowState::Idle;
            return Ok(SubmitOutcome::Duplicate(Notice::error(DUPLICATE_MESSAGE)));
        }

        let patient = billing::build_patient(&valid, &self.config);

        self.state = WorkflowState::Persisting;
        let persisted = match self.store.insert_patient(&patient) {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(error = %e, "patient insert failed");
                self.state = WorkflowState::Idle;
                return Err(WorkflowError::Insert(e));
            }
        };

        self.state = WorkflowState::Refreshing;
        let patients = match self.store.fetch_all() {
            Ok(patients) => patients,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    registration_id = %persisted.registration_id,
                    "roster reload failed after insert"
                );
                self.roster_stale = true;
                self.state = WorkflowState::Idle;
                return Err(WorkflowError::Refresh(e));
            }
        };
        self.roster.replace(patients);

        let values = std::mem::replace(
            &mut self.form,
            PatientForm::new(self.config.default_payment_method),
        );
        let bill = BillProjection::new(&persisted, values);

        tracing::info!(
            registration_id = %persisted.registration_id,
            reference_number = %persisted.reference_number,
            total = %persisted.invoice.total,
            "patient registered"
        );

        self.state = WorkflowState::ReadyToPrint(bill.clone());
        Ok(SubmitOutcome::Accepted {
            patient: persisted,
            bill,
            notice: Notice::success(SUCCESS_MESSAGE),
        })
    }

    /// Drop the pending bill and go back to an idle form.
    pub fn clear(&mut self) {
        if matches!(self.state, WorkflowState::ReadyToPrint(_)) {
            self.state = WorkflowState::Idle;
        }
    }

    /// Reset the form to its blank state.
    pub fn reset_form(&mut self) {
        self.form = PatientForm::new(self.config.default_payment_method);
    }

    /// Summary of invoices created on `date` (the clinic's local day), from
    /// the current roster.
    pub fn daily_summary(&self, date: NaiveDate) -> SummaryResult<DailySummary> {
        DailySummary::for_date(self.roster.patients(), date, self.config.utc_offset())
    }
}
