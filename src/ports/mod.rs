pub mod book_service;
pub mod loan_repository;
pub mod user_service;

pub use book_service::{Book, BookService};
pub use loan_repository::{LoanRepository, RepositoryError};
pub use user_service::{User, UserService};
