pub mod error;
pub mod loan;
pub mod loan_set;
pub mod scenario;

pub use error::{MortgageError, MortgageResult};
pub use loan::{Loan, LoanSummary, Savings, ScheduleEntry, YearEndBalance};
pub use loan_set::{CombinedScheduleEntry, LoanSet};
pub use scenario::{EquityRow, LoanOption, PurchaseConfig, Scenario};
