pub mod catalog_store;
pub mod database;
pub mod loan_ledger;

pub use catalog_store::CatalogStore;
pub use database::InMemoryDatabase;
pub use loan_ledger::LoanLedger;
