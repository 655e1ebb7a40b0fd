pub mod inventory;
pub mod sort;
