//! Invoice and transaction models.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger status of a transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Outstanding balance still owed
    Pending,
    /// Amount already collected
    Paid,
}

impl TransactionStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "paid" => Ok(TransactionStatus::Paid),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// How a transaction was settled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PaymentMethod {
    /// No payment attached (pending balance)
    None,
    /// Cash at the counter
    #[default]
    Cash,
    /// Card terminal
    Card,
}

impl PaymentMethod {
    /// Methods a patient can actually pay with.
    pub const SELECTABLE: [PaymentMethod; 2] = [PaymentMethod::Cash, PaymentMethod::Card];

    /// Canonical display label.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::None => "None",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Case-insensitive: "cash", "Cash" and "CASH" are the same method.
impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(PaymentMethod::None),
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// One ledger entry within an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Pending balance or recorded payment
    pub status: TransactionStatus,
    /// Amount; negative for an overpaid pending balance
    pub amount: Decimal,
    /// Human-readable label
    pub description: String,
    /// `None` for the pending entry
    pub payment_method: PaymentMethod,
}

impl Transaction {
    /// Outstanding balance entry.
    pub fn pending(amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            status: TransactionStatus::Pending,
            amount,
            description: description.into(),
            payment_method: PaymentMethod::None,
        }
    }

    /// Collected payment entry, labelled with its method.
    pub fn paid(amount: Decimal, method: PaymentMethod) -> Self {
        Self {
            status: TransactionStatus::Paid,
            amount,
            description: format!("Paid Amount ({})", method),
            payment_method: method,
        }
    }

    /// Zero-amount payments are never stored.
    pub fn is_empty_payment(&self) -> bool {
        self.status == TransactionStatus::Paid && self.amount.is_zero()
    }
}

/// Billing record owned by exactly one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    /// Defaults to the patient's full name
    pub description: String,
    /// Billed total
    pub total: Decimal,
    /// Insertion order: pending first, then paid
    pub transactions: Vec<Transaction>,
}

/// Sums saturate at the `Decimal` range. Use [`Invoice::checked_sum`] where
/// an overflow has to be reported.
impl Invoice {
    /// Sum of pending entries.
    pub fn pending_amount(&self) -> Decimal {
        self.matching(TransactionStatus::Pending, None)
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
    }

    /// Sum of paid entries.
    pub fn paid_amount(&self) -> Decimal {
        self.matching(TransactionStatus::Paid, None)
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
    }

    /// Paid amount collected with a given method.
    pub fn paid_with(&self, method: PaymentMethod) -> Decimal {
        self.matching(TransactionStatus::Paid, Some(method))
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
    }

    /// Sum of entries with `status` (and `method`, if given), or `None` on overflow.
    pub fn checked_sum(
        &self,
        status: TransactionStatus,
        method: Option<PaymentMethod>,
    ) -> Option<Decimal> {
        self.matching(status, method)
            .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.amount))
    }

    fn matching(
        &self,
        status: TransactionStatus,
        method: Option<PaymentMethod>,
    ) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions
            .iter()
            .filter(move |t| t.status == status && method.map_or(true, |m| t.payment_method == m))
    }
}
