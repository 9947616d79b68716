//! Registration form models.

use serde::{Deserialize, Serialize};

use super::invoice::PaymentMethod;

/// Raw text values as typed into the registration form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PatientForm {
    pub fullname: String,
    pub mobile: String,
    pub treatment: String,
    /// Decimal text; empty means 0
    pub total_amount: String,
    /// Decimal text; empty means 0
    pub paid_amount: String,
    /// "Cash" or "Card", any casing
    pub payment_type: String,
    /// Carried through to the bill only
    pub previous_paid: Option<String>,
}

impl PatientForm {
    /// Blank form with the given payment method preselected.
    pub fn new(default_payment_method: PaymentMethod) -> Self {
        Self {
            payment_type: default_payment_method.label().to_string(),
            ..Self::default()
        }
    }

    /// Check if the user has typed anything besides the preselected method.
    pub fn is_blank(&self) -> bool {
        self.fullname.is_empty()
            && self.mobile.is_empty()
            && self.treatment.is_empty()
            && self.total_amount.is_empty()
            && self.paid_amount.is_empty()
            && self.previous_paid.as_deref().map_or(true, str::is_empty)
    }
}
