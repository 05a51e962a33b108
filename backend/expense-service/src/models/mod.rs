/// Data models for the expense ledger
pub mod category;
pub mod expense;
pub mod user;

pub use category::{Category, NewCategory};
pub use expense::{Expense, NewExpense};
pub use user::{NewUser, User};
