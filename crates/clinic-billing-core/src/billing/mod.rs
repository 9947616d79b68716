//! Invoice assembly.
//!
//! Pipeline: Raw Form → Validation → Transaction Candidates → Zero-Payment Filter → NewPatient

mod validation;

pub use validation::*;

use crate::config::DeskConfig;
use crate::models::{Invoice, NewPatient, PatientForm, Transaction};

/// Build the patient record from a validated form.
///
/// The pending entry is always kept, even at zero or below; a zero paid entry is dropped.
pub fn build_patient(form: &ValidatedForm, config: &DeskConfig) -> NewPatient {
    let pending = form.total - form.paid;

    let candidates = [
        Transaction::pending(pending, config.pending_description.clone()),
        Transaction::paid(form.paid, form.payment_method),
    ];

    let transactions = candidates
        .into_iter()
        .filter(|t| !t.is_empty_payment())
        .collect();

    NewPatient {
        fullname: form.fullname.clone(),
        mobile: form.mobile.clone(),
        treatment: form.treatment.clone(),
        invoice: Invoice {
            description: form.fullname.clone(),
            total: form.total,
            transactions,
        },
    }
}

/// Validate raw form input and build the patient record with default settings.
pub fn assemble(form: &PatientForm) -> Result<NewPatient, ValidationErrors> {
    let valid = validate_form(form)?;
    Ok(build_patient(&valid, &DeskConfig::default()))
}
