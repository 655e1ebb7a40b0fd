pub mod catalog_store;
pub mod loan_ledger;

pub use catalog_store::*;
pub use loan_ledger::*;
