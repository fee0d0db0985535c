use crate::loan::{Loan, LoanSummary, ScheduleEntry};
use chrono::NaiveDate;
use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A schedule row attributed to the loan it came from.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CombinedScheduleEntry {
    pub loan_name: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub entry: ScheduleEntry,
}

/// An ordered set of loans being compared. Insertion order is kept and drives
/// the order of every comparison view.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct LoanSet {
    loans: Vec<Loan>,
}

impl LoanSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a loan starting today. Without a name one is made up from the
    /// term and rate, e.g. "30-Year @ 6.5%". The schedule is not generated.
    pub fn add_loan(
        &mut self,
        principal: f64,
        annual_rate: f64,
        years: u32,
        name: Option<&str>,
    ) -> &mut Loan {
        self.add_loan_dated(principal, annual_rate, years, name, None)
    }

    pub fn add_loan_dated(
        &mut self,
        principal: f64,
        annual_rate: f64,
        years: u32,
        name: Option<&str>,
        start_date: Option<NaiveDate>,
    ) -> &mut Loan {
        let name = match name {
            Some(name) => name.to_string(),
            None => default_loan_name(annual_rate, years),
        };
        debug!("adding loan '{}' to comparison", name);
        self.push(Loan::new(principal, annual_rate, years, name, start_date))
    }

    pub fn push(&mut self, loan: Loan) -> &mut Loan {
        self.loans.push(loan);
        let last = self.loans.len() - 1;
        &mut self.loans[last]
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn get(&self, name: &str) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.name() == name)
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    /// Generates every schedule not generated yet.
    pub fn generate_schedules(&self) {
        for loan in &self.loans {
            loan.generate_schedule();
        }
    }

    /// One summary row per loan, in insertion order.
    pub fn compare_loans(&self) -> Vec<LoanSummary> {
        self.loans.iter().map(Loan::summary).collect()
    }

    /// Every loan's schedule back to back, each row tagged with its loan's
    /// name. Missing schedules are generated first.
    pub fn combined_schedule(&self) -> Vec<CombinedScheduleEntry> {
        let rows = self.loans.iter().map(|loan| loan.pmt_count() as usize).sum();
        let mut combined = Vec::with_capacity(rows);
        for loan in &self.loans {
            combined.extend(loan.generate_schedule().iter().map(|entry| {
                CombinedScheduleEntry {
                    loan_name: loan.name().to_string(),
                    entry: *entry,
                }
            }));
        }
        info!(
            "combined {} schedule rows across {} loans",
            combined.len(),
            self.loans.len()
        );
        combined
    }
}

fn default_loan_name(annual_rate: f64, years: u32) -> String {
    format!("{}-Year @ {:.1}%", years, annual_rate * 100.)
}

#[cfg(test)]
mod tests {
    use super::{default_loan_name, LoanSet};
    use chrono::NaiveDate;
    use test_log::test;

    fn start() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 6, 1)
    }

    fn sample_set() -> LoanSet {
        let mut set = LoanSet::new();
        set.add_loan_dated(500000., 0.05, 15, Some("15-Year"), start());
        set.add_loan_dated(500000., 0.065, 30, Some("30-Year"), start());
        set.add_loan_dated(500000., 0.06, 20, None, start());
        set
    }

    #[test]
    fn test_default_loan_name() {
        assert_eq!(default_loan_name(0.065, 30), "30-Year @ 6.5%");
        assert_eq!(default_loan_name(0.05, 15), "15-Year @ 5.0%");
        assert_eq!(default_loan_name(0., 10), "10-Year @ 0.0%");
    }

    #[test]
    fn test_add_loan() {
        let mut set = LoanSet::new();
        assert!(set.is_empty());

        let loan = set.add_loan(300000., 0.07, 30, None);
        assert_eq!(loan.name(), "30-Year @ 7.0%");
        assert!(!loan.is_generated());

        set.add_loan(300000., 0.05, 15, Some("short"));
        assert_eq!(set.len(), 2);
        assert!(set.get("short").is_some());
        assert!(set.get("missing").is_none());
        assert!(set.loans().iter().all(|loan| !loan.is_generated()));
    }

    #[test]
    fn test_compare_loans_keeps_order() {
        let set = sample_set();
        let table = set.compare_loans();

        assert_eq!(table.len(), 3);
        let names: Vec<&str> = table.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, ["15-Year", "30-Year", "20-Year @ 6.0%"]);
        assert!(table[1].total_interest > table[0].total_interest);

        // comparing is a read: nothing gets generated
        assert!(set.loans().iter().all(|loan| !loan.is_generated()));
    }

    #[test]
    fn test_combined_schedule() {
        let set = sample_set();
        let combined = set.combined_schedule();

        assert_eq!(combined.len(), 180 + 360 + 240);
        assert!(set.loans().iter().all(|loan| loan.is_generated()));

        let blocks = [("15-Year", 0, 180), ("30-Year", 180, 540), ("20-Year @ 6.0%", 540, 780)];
        for (name, from, to) in blocks {
            let loan = set.get(name).unwrap();
            let block = &combined[from..to];
            assert!(block.iter().all(|row| row.loan_name == name));
            for (row, entry) in block.iter().zip(loan.schedule().unwrap()) {
                assert_eq!(&row.entry, entry);
            }
            assert_eq!(block[0].entry.pmt_number, 1);
            assert_eq!(block[block.len() - 1].entry.pmt_end_balance, 0.);
        }
    }

    #[test]
    fn test_combined_schedule_reuses_generated() {
        let set = sample_set();
        let first = set.loans()[0].generate_schedule().as_ptr();
        set.generate_schedules();
        let _ = set.combined_schedule();
        assert_eq!(set.loans()[0].schedule().unwrap().as_ptr(), first);
    }

    #[test]
    fn test_empty_set() {
        let set = LoanSet::new();
        assert!(set.compare_loans().is_empty());
        assert!(set.combined_schedule().is_empty());
    }
}
