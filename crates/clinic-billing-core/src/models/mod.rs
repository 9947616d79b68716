//! Domain models for clinic billing.

mod form;
mod invoice;
mod patient;

pub use form::*;
pub use invoice::*;
pub use patient::*;
