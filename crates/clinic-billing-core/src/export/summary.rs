//! Daily collection summary.

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PaymentMethod, PersistedPatient, TransactionStatus};

/// Summary errors.
#[derive(Error, Debug, PartialEq)]
pub enum SummaryError {
    #[error("Amounts too large to total: {0} overflowed")]
    Overflow(&'static str),
}

pub type SummaryResult<T> = Result<T, SummaryError>;

/// One billed patient in a daily summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryEntry {
    pub reference_number: String,
    pub fullname: String,
    pub mobile: String,
    pub treatment: String,
    pub total: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
}

/// Amount collected with one payment method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub amount: Decimal,
}

/// Totals for every invoice created on one calendar day at the clinic's offset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub patient_count: usize,
    pub billed_total: Decimal,
    pub collected: Vec<MethodTotal>,
    pub collected_total: Decimal,
    pub outstanding: Decimal,
    pub entries: Vec<SummaryEntry>,
}

impl DailySummary {
    /// Summarize the patients registered on `date`, read at `offset`.
    ///
    /// Fails instead of wrapping when stored amounts are too large to add up.
    pub fn for_date(
        patients: &[PersistedPatient],
        date: NaiveDate,
        offset: FixedOffset,
    ) -> SummaryResult<Self> {
        let day: Vec<&PersistedPatient> = patients
            .iter()
            .filter(|p| p.created_on(offset) == Some(date))
            .collect();

        let entries = day
            .iter()
            .map(|p| -> SummaryResult<SummaryEntry> {
                Ok(SummaryEntry {
                    reference_number: p.reference_number.clone(),
                    fullname: p.fullname.clone(),
                    mobile: p.mobile.clone(),
                    treatment: p.treatment.clone(),
                    total: p.invoice.total,
                    paid: p
                        .invoice
                        .checked_sum(TransactionStatus::Paid, None)
                        .ok_or(SummaryError::Overflow("paid"))?,
                    pending: p
                        .invoice
                        .checked_sum(TransactionStatus::Pending, None)
                        .ok_or(SummaryError::Overflow("pending"))?,
                })
            })
            .collect::<SummaryResult<Vec<SummaryEntry>>>()?;

        let mut collected = Vec::with_capacity(PaymentMethod::SELECTABLE.len());
        for &method in PaymentMethod::SELECTABLE.iter() {
            let amounts = day
                .iter()
                .map(|p| p.invoice.checked_sum(TransactionStatus::Paid, Some(method)));
            collected.push(MethodTotal {
                method,
                amount: checked_total(amounts, "collected")?,
            });
        }

        Ok(Self {
            date,
            patient_count: entries.len(),
            billed_total: checked_total(entries.iter().map(|e| Some(e.total)), "billed total")?,
            collected_total: checked_total(entries.iter().map(|e| Some(e.paid)), "collected")?,
            outstanding: checked_total(entries.iter().map(|e| Some(e.pending)), "outstanding")?,
            collected,
            entries,
        })
    }

    /// Collected amount for one method.
    pub fn collected_with(&self, method: PaymentMethod) -> Decimal {
        self.collected
            .iter()
            .find(|m| m.method == method)
            .map(|m| m.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format, one row per invoice.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        csv.push_str("date,reference_number,fullname,mobile,treatment,total,paid,pending\n");

        for entry in &self.entries {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                self.date,
                escape_csv(&entry.reference_number),
                escape_csv(&entry.fullname),
                escape_csv(&entry.mobile),
                escape_csv(&entry.treatment),
                entry.total,
                entry.paid,
                entry.pending,
            ));
        }

        csv
    }
}

/// Add up amounts; `None` marks an amount that already overflowed.
fn checked_total(
    mut amounts: impl Iterator<Item = Option<Decimal>>,
    what: &'static str,
) -> SummaryResult<Decimal> {
    amounts
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount?))
        .ok_or(SummaryError::Overflow(what))
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
