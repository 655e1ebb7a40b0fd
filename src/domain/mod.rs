pub mod commands;
pub mod criteria;
pub mod entities;
pub mod errors;
pub mod value_objects;

pub use criteria::*;
pub use entities::*;
pub use errors::*;
pub use value_objects::*;
