pub mod commands;
pub mod errors;
pub mod loan;
pub mod permission;
pub mod value_objects;

pub use errors::*;
pub use loan::LoanRecord;
pub use permission::{Permission, Permissions};
pub use value_objects::*;
