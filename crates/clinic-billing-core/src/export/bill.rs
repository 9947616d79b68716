//! Printable bill projection.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{PatientForm, PersistedPatient};

/// Read-only data handed to the bill renderer once a submission completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillProjection {
    pub fullname: String,
    pub mobile: String,
    /// Store-assigned patient ID
    pub registration_id: String,
    /// Printed bill number
    pub reference_number: String,
    /// Form values exactly as submitted
    pub values: PatientForm,
    /// Pending balance after this visit
    pub amount_due: Decimal,
    /// Time the bill was prepared (RFC 3339)
    pub issued_at: String,
}

impl BillProjection {
    /// Project a stored patient and the raw values it was created from.
    pub fn new(patient: &PersistedPatient, values: PatientForm) -> Self {
        Self {
            fullname: patient.fullname.clone(),
            mobile: patient.mobile.clone(),
            registration_id: patient.registration_id.clone(),
            reference_number: patient.reference_number.clone(),
            values,
            amount_due: patient.invoice.pending_amount(),
            issued_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Amount due as printed on the bill.
    pub fn amount_due_display(&self, currency_symbol: &str) -> String {
        format_amount(self.amount_due, currency_symbol)
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Format money with two fraction digits and thousands grouping, e.g. `Rs.1,234.50`.
pub fn format_amount(amount: Decimal, currency_symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}{}.{}", currency_symbol, sign, grouped, frac_part)
}
