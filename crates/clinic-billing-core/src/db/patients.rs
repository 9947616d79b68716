//! Patient database operations.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{Database, PatientStore, StoreError, StoreResult};
use crate::models::{reference_number, Invoice, NewPatient, PersistedPatient, Transaction};

const PATIENT_SELECT: &str = r#"
    SELECT p.registration_id, i.reference_number, p.created_at, p.fullname,
           p.mobile, p.treatment, i.invoice_no, i.description, i.total
    FROM patients p
    JOIN invoices i ON i.patient_id = p.registration_id
"#;

impl PatientStore for Database {
    fn insert_patient(&mut self, patient: &NewPatient) -> StoreResult<PersistedPatient> {
        let registration_id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        // Dropped without commit on any error, which rolls everything back.
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO patients (registration_id, fullname, mobile, treatment, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                registration_id,
                patient.fullname,
                patient.mobile,
                patient.treatment,
                created_at,
            ],
        )?;

        tx.execute(
            "INSERT INTO invoices (patient_id, description, total) VALUES (?1, ?2, ?3)",
            params![
                registration_id,
                patient.invoice.description,
                patient.invoice.total.to_string(),
            ],
        )?;
        let invoice_no = tx.last_insert_rowid();
        let reference = reference_number(&self.reference_prefix, invoice_no);

        tx.execute(
            "UPDATE invoices SET reference_number = ?1 WHERE invoice_no = ?2",
            params![reference, invoice_no],
        )?;

        for (position, t) in patient.invoice.transactions.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO invoice_transactions (
                    invoice_no, position, status, amount, description, payment_method
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    invoice_no,
                    position as i64,
                    t.status.as_str(),
                    t.amount.to_string(),
                    t.description,
                    t.payment_method.label(),
                ],
            )?;
        }

        tx.commit()?;

        tracing::debug!(
            registration_id = %registration_id,
            reference_number = %reference,
            "patient stored"
        );

        Ok(PersistedPatient {
            registration_id,
            reference_number: reference,
            created_at,
            fullname: patient.fullname.clone(),
            mobile: patient.mobile.clone(),
            treatment: patient.treatment.clone(),
            invoice: patient.invoice.clone(),
        })
    }

    fn fetch_all(&self) -> StoreResult<Vec<PersistedPatient>> {
        let mut transactions = self.load_all_transactions()?;

        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY i.invoice_no", PATIENT_SELECT))?;
        let rows = stmt.query_map([], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            let row = row?;
            let txs = transactions.remove(&row.invoice_no).unwrap_or_default();
            patients.push(row.into_patient(txs)?);
        }
        Ok(patients)
    }
}

impl Database {
    /// Get a patient by registration ID.
    pub fn get_patient(&self, registration_id: &str) -> StoreResult<Option<PersistedPatient>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE p.registration_id = ?", PATIENT_SELECT),
                [registration_id],
                PatientRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => {
                let txs = self.load_transactions(row.invoice_no)?;
                Ok(Some(row.into_patient(txs)?))
            }
            None => Ok(None),
        }
    }

    /// Get a patient by printed reference number.
    pub fn get_patient_by_reference(&self, reference: &str) -> StoreResult<PersistedPatient> {
        let registration_id: String = self
            .conn
            .query_row(
                "SELECT patient_id FROM invoices WHERE reference_number = ?",
                [reference],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;

        self.get_patient(&registration_id)?
            .ok_or(StoreError::NotFound(registration_id))
    }

    /// Count stored patients.
    pub fn count_patients(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn load_transactions(&self, invoice_no: i64) -> StoreResult<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT invoice_no, status, amount, description, payment_method
            FROM invoice_transactions
            WHERE invoice_no = ?
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map([invoice_no], TransactionRow::from_row)?;

        let mut txs = Vec::new();
        for row in rows {
            txs.push(row?.try_into()?);
        }
        Ok(txs)
    }

    fn load_all_transactions(&self) -> StoreResult<HashMap<i64, Vec<Transaction>>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT invoice_no, status, amount, description, payment_method
            FROM invoice_transactions
            ORDER BY invoice_no, position
            "#,
        )?;
        let rows = stmt.query_map([], TransactionRow::from_row)?;

        let mut grouped: HashMap<i64, Vec<Transaction>> = HashMap::new();
        for row in rows {
            let row = row?;
            let invoice_no = row.invoice_no;
            grouped.entry(invoice_no).or_default().push(row.try_into()?);
        }
        Ok(grouped)
    }
}

/// Internal row type for patient/invoice joins.
struct PatientRow {
    registration_id: String,
    reference_number: Option<String>,
    created_at: String,
    fullname: String,
    mobile: String,
    treatment: String,
    invoice_no: i64,
    description: String,
    total: String,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            registration_id: row.get(0)?,
            reference_number: row.get(1)?,
            created_at: row.get(2)?,
            fullname: row.get(3)?,
            mobile: row.get(4)?,
            treatment: row.get(5)?,
            invoice_no: row.get(6)?,
            description: row.get(7)?,
            total: row.get(8)?,
        })
    }

    fn into_patient(self, transactions: Vec<Transaction>) -> StoreResult<PersistedPatient> {
        let reference_number = self.reference_number.ok_or_else(|| {
            StoreError::InvalidData(format!("invoice {} has no reference number", self.invoice_no))
        })?;

        Ok(PersistedPatient {
            registration_id: self.registration_id,
            reference_number,
            created_at: self.created_at,
            fullname: self.fullname,
            mobile: self.mobile,
            treatment: self.treatment,
            invoice: Invoice {
                description: self.description,
                total: parse_decimal(&self.total)?,
                transactions,
            },
        })
    }
}

/// Internal row type for invoice transactions.
struct TransactionRow {
    invoice_no: i64,
    status: String,
    amount: String,
    description: String,
    payment_method: String,
}

impl TransactionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            invoice_no: row.get(0)?,
            status: row.get(1)?,
            amount: row.get(2)?,
            description: row.get(3)?,
            payment_method: row.get(4)?,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            status: row.status.parse().map_err(StoreError::InvalidData)?,
            amount: parse_decimal(&row.amount)?,
            description: row.description,
            payment_method: row.payment_method.parse().map_err(StoreError::InvalidData)?,
        })
    }
}

fn parse_decimal(s: &str) -> StoreResult<Decimal> {
    s.parse()
        .map_err(|_| StoreError::InvalidData(format!("bad decimal: {}", s)))
}
