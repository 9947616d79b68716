//! Bill projection and daily summary export.

mod bill;
mod summary;

pub use bill::*;
pub use summary::*;
