pub mod error;
pub mod http;
pub mod memory;
pub mod mock;
pub mod postgres;

pub use error::CollaboratorError;
