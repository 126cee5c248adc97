//! Interest accrual and the loan book.

pub mod accrual;
pub mod book;
