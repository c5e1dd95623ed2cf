mod errors;
mod loan_service;
mod stock_queries;

pub use errors::{LoanApplicationError, Result};
pub use loan_service::{ServiceDependencies, return_book, take_book};
pub use stock_queries::{
    count_available, get_unreturned_count_for_user, list_overdue, list_reservations,
};
