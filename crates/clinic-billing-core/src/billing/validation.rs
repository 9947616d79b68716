//! Field-level validation of the registration form.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{PatientForm, PaymentMethod};

/// A form field that can fail validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Fullname,
    Mobile,
    TotalAmount,
    PaidAmount,
    PaymentType,
}

impl FormField {
    /// Field name as used by the form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Fullname => "fullname",
            FormField::Mobile => "mobile",
            FormField::TotalAmount => "total_amount",
            FormField::PaidAmount => "paid_amount",
            FormField::PaymentType => "payment_type",
        }
    }
}

/// Error shown next to a single field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// All field errors of one validation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// First error for a field, if any.
    pub fn for_field(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Form values after validation, with amounts parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    pub fullname: String,
    pub mobile: String,
    pub treatment: String,
    pub total: Decimal,
    pub paid: Decimal,
    pub payment_method: PaymentMethod,
}

/// Validate raw form input.
///
/// Collects every field error rather than stopping at the first one.
pub fn validate_form(form: &PatientForm) -> Result<ValidatedForm, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if form.fullname.trim().is_empty() {
        errors.push(FormField::Fullname, "Full name is required");
    }
    if form.mobile.trim().is_empty() {
        errors.push(FormField::Mobile, "Mobile is required");
    }

    let total = check_amount(&form.total_amount, FormField::TotalAmount, &mut errors);
    let paid = check_amount(&form.paid_amount, FormField::PaidAmount, &mut errors);

    let payment_method = match form.payment_type.parse::<PaymentMethod>() {
        Ok(method) if PaymentMethod::SELECTABLE.contains(&method) => Some(method),
        _ => {
            errors.push(FormField::PaymentType, "Payment type must be Cash or Card");
            None
        }
    };

    match (total, paid, payment_method) {
        (Some(total), Some(paid), Some(payment_method)) if errors.is_empty() => {
            Ok(ValidatedForm {
                fullname: form.fullname.clone(),
                mobile: form.mobile.clone(),
                treatment: form.treatment.clone(),
                total,
                paid,
                payment_method,
            })
        }
        _ => Err(errors),
    }
}

/// Largest amount, in whole currency units, a single form field may carry.
///
/// Keeps every sum the desk computes over stored invoices well inside the
/// `Decimal` range.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// [`MAX_AMOUNT_UNITS`] as a `Decimal`.
pub fn max_amount() -> Decimal {
    Decimal::from(MAX_AMOUNT_UNITS)
}

/// Parse an amount field; empty or whitespace-only input is 0.
pub fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    trimmed
        .parse::<Decimal>()
        .map_err(|_| format!("'{}' is not a number", trimmed))
}

fn check_amount(raw: &str, field: FormField, errors: &mut ValidationErrors) -> Option<Decimal> {
    match parse_amount(raw) {
        Ok(value) if value < Decimal::ZERO => {
            errors.push(field, "Amount cannot be negative");
            None
        }
        Ok(value) if value > max_amount() => {
            errors.push(field, "Amount is too large");
            None
        }
        Ok(value) => Some(value),
        Err(message) => {
            errors.push(field, message);
            None
        }
    }
}

/// Live "Amount Due" value shown while the form is edited.
///
/// Amounts that would fail validation (unparseable, negative or too large)
/// count as 0 so the display never blocks typing and never overflows.
pub fn amount_due(form: &PatientForm) -> Decimal {
    let total = display_amount(&form.total_amount);
    let paid = display_amount(&form.paid_amount);
    total.checked_sub(paid).unwrap_or(Decimal::ZERO)
}

fn display_amount(raw: &str) -> Decimal {
    match parse_amount(raw) {
        Ok(value) if value >= Decimal::ZERO && value <= max_amount() => value,
        _ => Decimal::ZERO,
    }
}
