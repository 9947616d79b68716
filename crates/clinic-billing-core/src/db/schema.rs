//! SQLite schema definition.

/// Complete database schema for clinic billing.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    registration_id TEXT PRIMARY KEY,            -- UUID v4
    fullname TEXT NOT NULL,
    mobile TEXT NOT NULL,
    treatment TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Duplicate guard lookups (not a uniqueness constraint)
CREATE INDEX IF NOT EXISTS idx_patients_identity ON patients(fullname, mobile);

-- ============================================================================
-- Invoices (exactly one per patient)
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    invoice_no INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id TEXT NOT NULL UNIQUE REFERENCES patients(registration_id),
    reference_number TEXT UNIQUE,                -- set right after insert, inside the same transaction
    description TEXT NOT NULL,
    total TEXT NOT NULL                          -- decimal string, exact
);

-- ============================================================================
-- Invoice Transactions
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoice_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_no INTEGER NOT NULL REFERENCES invoices(invoice_no),
    position INTEGER NOT NULL,                   -- insertion order within the invoice
    status TEXT NOT NULL CHECK (status IN ('pending', 'paid')),
    amount TEXT NOT NULL,                        -- decimal string, exact
    description TEXT NOT NULL,
    payment_method TEXT NOT NULL DEFAULT 'None',
    UNIQUE (invoice_no, position)
);

-- Zero-amount payments are filtered before insert
CREATE TRIGGER IF NOT EXISTS invoice_transactions_no_empty_payment
BEFORE INSERT ON invoice_transactions
WHEN new.status = 'paid' AND CAST(new.amount AS REAL) = 0
BEGIN
    SELECT RAISE(ABORT, 'zero-amount paid transaction');
END;
"#;
