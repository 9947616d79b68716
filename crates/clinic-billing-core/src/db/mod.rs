//! Persistence layer for clinic billing.

mod memory;
mod patients;
mod schema;

pub use memory::*;
pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::{NewPatient, PersistedPatient};

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Where patients are persisted.
///
/// `insert_patient` must store the whole Patient+Invoice+Transactions graph or none of it.
/// `fetch_all` returns the complete current roster.
pub trait PatientStore {
    /// Insert one patient with its invoice and transactions.
    fn insert_patient(&mut self, patient: &NewPatient) -> StoreResult<PersistedPatient>;

    /// Fetch every stored patient, oldest invoice first.
    fn fetch_all(&self) -> StoreResult<Vec<PersistedPatient>>;
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
    reference_prefix: String,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self::from_connection(conn);
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self::from_connection(conn);
        db.initialize()?;
        Ok(db)
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            reference_prefix: "BILL".into(),
        }
    }

    /// Use a different prefix for bill reference numbers.
    pub fn with_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = prefix.into();
        self
    }

    /// Initialize schema.
    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
