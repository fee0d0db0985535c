use chrono::{Days, Local, NaiveDate};
use log::{info, trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, sync::OnceLock};

/// Decimal places kept on every currency value written to a schedule row.
pub const DEC_PLACES: f64 = 2.;

/// Balances below this (in currency units) are treated as paid off.
pub const BALANCE_EPSILON: f64 = 0.01;

/// Payment dates advance by a flat 30 days per month rather than by calendar month.
pub const DAYS_PER_PERIOD: u64 = 30;

pub const MONTHS_PER_YEAR: u32 = 12;

/// One month of an amortization schedule.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleEntry {
    pub pmt_number: u32,
    pub pmt_date: NaiveDate,
    pub pmt_amount: f64,
    pub pmt_principal_paid: f64,
    pub pmt_interest_paid: f64,
    pub pmt_end_balance: f64,
    pub cumulative_interest: f64,
    pub cumulative_principal: f64,
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmt number {}, date {}, payment ${:.2}, principal paid ${:.2}, interest paid ${:.2}, ending balance ${:.2}",
            self.pmt_number,
            self.pmt_date,
            self.pmt_amount,
            self.pmt_principal_paid,
            self.pmt_interest_paid,
            self.pmt_end_balance
        )
    }
}

/// Headline figures for a single loan. Derived from the fixed payment alone,
/// so producing one never requires the schedule.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanSummary {
    pub name: String,
    pub principal: f64,
    pub annual_rate: f64,
    pub monthly_rate: f64,
    pub years: u32,
    pub monthly_payment: f64,
    pub pmt_count: u32,
    pub total_paid: f64,
    pub total_interest: f64,
    pub interest_percentage: f64,
}

/// How one loan compares against another on monthly cost and lifetime interest.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Savings {
    /// Extra monthly outlay of this loan over the other (negative when cheaper).
    pub monthly_difference: f64,
    /// Interest this loan avoids relative to the other (negative when it costs more).
    pub interest_savings: f64,
    /// `interest_savings` as a share of the other loan's total interest.
    pub interest_savings_percent: f64,
}

impl LoanSummary {
    pub fn savings_against(&self, other: &LoanSummary) -> Savings {
        let interest_savings = other.total_interest - self.total_interest;
        let interest_savings_percent = if other.total_interest == 0. {
            0.
        } else {
            interest_savings / other.total_interest * 100.
        };
        Savings {
            monthly_difference: self.monthly_payment - other.monthly_payment,
            interest_savings,
            interest_savings_percent,
        }
    }
}

impl fmt::Display for LoanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: payment ${:.2} x {}, total paid ${:.2}, total interest ${:.2} ({:.1}%)",
            self.name,
            self.monthly_payment,
            self.pmt_count,
            self.total_paid,
            self.total_interest,
            self.interest_percentage
        )
    }
}

/// Snapshot of a loan at the last payment of one of its years.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct YearEndBalance {
    pub year: u32,
    pub remaining_balance: f64,
    pub cumulative_interest: f64,
    pub cumulative_principal: f64,
}

/// A fixed-rate, level-payment loan amortized monthly.
///
/// Inputs are fixed at construction. The schedule is built lazily on first
/// request and cached; a loan holds either no schedule or a complete one.
/// Equality compares the inputs only, not whether the schedule is cached.
#[derive(Clone, Debug)]
pub struct Loan {
    name: String,
    principal: f64,
    annual_rate: f64,
    years: u32,
    start_date: NaiveDate,
    monthly_rate: f64,
    pmt_count: u32,
    pmt_amount: f64,
    schedule: OnceLock<Vec<ScheduleEntry>>,
}

impl Loan {
    /// Inputs are not validated here. Zero terms, terms too long to schedule
    /// and non-finite payments are logged as warnings and produce a
    /// degenerate loan.
    pub fn new(
        principal: f64,
        annual_rate: f64,
        years: u32,
        name: impl Into<String>,
        start_date: Option<NaiveDate>,
    ) -> Self {
        let name = name.into();
        let monthly_rate = annual_rate / MONTHS_PER_YEAR as f64;
        let pmt_count = match years
            .checked_mul(MONTHS_PER_YEAR)
            .filter(|&count| i32::try_from(count).is_ok())
        {
            Some(count) => count,
            None => {
                warn!(
                    "loan '{}' has a {}-year term, too long to schedule; treating it as having no payments",
                    name, years
                );
                0
            }
        };
        let pmt_amount = get_pmt_amount(principal, monthly_rate, pmt_count);

        if years == 0 {
            warn!("loan '{}' has a zero-year term and no payments", name);
        } else if !pmt_amount.is_finite() {
            warn!(
                "loan '{}' has a non-finite monthly payment ({}) for principal {} at rate {}",
                name, pmt_amount, principal, annual_rate
            );
        }

        Self {
            name,
            principal,
            annual_rate,
            years,
            start_date: start_date.unwrap_or_else(|| Local::now().date_naive()),
            monthly_rate,
            pmt_count,
            pmt_amount,
            schedule: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn annual_rate(&self) -> f64 {
        self.annual_rate
    }

    pub fn monthly_rate(&self) -> f64 {
        self.monthly_rate
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Level monthly payment at full precision.
    pub fn monthly_payment(&self) -> f64 {
        self.pmt_amount
    }

    pub fn pmt_count(&self) -> u32 {
        self.pmt_count
    }

    pub fn is_generated(&self) -> bool {
        self.schedule.get().is_some()
    }

    /// The cached schedule, if it has been generated.
    pub fn schedule(&self) -> Option<&[ScheduleEntry]> {
        self.schedule.get().map(Vec::as_slice)
    }

    /// Builds the schedule on first call and returns the cached rows afterwards.
    /// Concurrent first calls compute it exactly once.
    pub fn generate_schedule(&self) -> &[ScheduleEntry] {
        self.schedule.get_or_init(|| self.build_schedule())
    }

    /// Rebuilds the schedule and swaps it in whole.
    pub fn regenerate_schedule(&mut self) -> &[ScheduleEntry] {
        let fresh = self.build_schedule();
        self.schedule = OnceLock::from(fresh);
        self.generate_schedule()
    }

    /// 1-based lookup of a single payment; generates the schedule if needed.
    pub fn get_pmt_detail(&self, pmt_number: u32) -> Option<&ScheduleEntry> {
        let idx = (pmt_number as usize).checked_sub(1)?;
        self.generate_schedule().get(idx)
    }

    pub fn summary(&self) -> LoanSummary {
        let total_paid = self.pmt_amount * self.pmt_count as f64;
        let total_interest = total_paid - self.principal;
        let interest_percentage = if total_paid == 0. {
            0.
        } else {
            total_interest / total_paid * 100.
        };

        LoanSummary {
            name: self.name.clone(),
            principal: self.principal,
            annual_rate: self.annual_rate,
            monthly_rate: self.monthly_rate,
            years: self.years,
            monthly_payment: self.pmt_amount,
            pmt_count: self.pmt_count,
            total_paid,
            total_interest,
            interest_percentage,
        }
    }

    /// Balance snapshot at the 12th payment of `year`. `None` means the loan
    /// has no payment in that year, i.e. it is already paid off.
    pub fn year_end_balance(&self, year: u32) -> Option<YearEndBalance> {
        let month = year.checked_mul(MONTHS_PER_YEAR)?;
        let pmt = self.get_pmt_detail(month)?;
        Some(YearEndBalance {
            year,
            remaining_balance: pmt.pmt_end_balance,
            cumulative_interest: pmt.cumulative_interest,
            cumulative_principal: pmt.cumulative_principal,
        })
    }

    pub fn year_end_balances(&self) -> Vec<YearEndBalance> {
        (1..=self.pmt_count / MONTHS_PER_YEAR)
            .filter_map(|year| self.year_end_balance(year))
            .collect()
    }

    fn build_schedule(&self) -> Vec<ScheduleEntry> {
        info!(
            "generating {} payment schedule for '{}'",
            self.pmt_count, self.name
        );

        let mut sched_pmt = Vec::with_capacity(self.pmt_count as usize);
        // running totals stay unrounded so rounding error does not compound
        let mut remaining_balance = self.principal;
        let mut cumulative_interest = 0.;

        for pmt_number in 1..=self.pmt_count {
            let interest = remaining_balance * self.monthly_rate;
            let mut principal_paid = self.pmt_amount - interest;
            remaining_balance -= principal_paid;
            cumulative_interest += interest;

            if remaining_balance < BALANCE_EPSILON {
                // fold the drift into this payment's principal, then close the loan
                principal_paid += remaining_balance;
                remaining_balance = 0.;
            }
            trace!(
                "'{}' pmt # {}, interest {}, principal {}, end bal {}",
                self.name,
                pmt_number,
                interest,
                principal_paid,
                remaining_balance
            );

            sched_pmt.push(ScheduleEntry {
                pmt_number,
                pmt_date: get_pmt_date(&self.start_date, pmt_number),
                pmt_amount: round(self.pmt_amount, DEC_PLACES),
                pmt_principal_paid: round(principal_paid, DEC_PLACES),
                pmt_interest_paid: round(interest, DEC_PLACES),
                pmt_end_balance: round(remaining_balance, DEC_PLACES),
                cumulative_interest: round(cumulative_interest, DEC_PLACES),
                cumulative_principal: round(self.principal - remaining_balance, DEC_PLACES),
            });
        }
        sched_pmt
    }
}

pub(crate) fn round(amt: f64, dec: f64) -> f64 {
    if amt == 0. {
        0.
    } else {
        (amt * 10_f64.powf(dec)).round() / 10_f64.powf(dec)
    }
}

fn get_pmt_amount(
    principal: f64,    // loan principal
    monthly_rate: f64, // annual rate / 12, as a decimal
    pmt_count: u32,    // number of monthly payments
) -> f64 {
    if pmt_count == 0 {
        return 0.;
    }
    if monthly_rate == 0. {
        return principal / pmt_count as f64;
    }

    let periods = match i32::try_from(pmt_count) {
        Ok(periods) => periods,
        Err(_) => {
            warn!("{} payments is too many to amortize", pmt_count);
            return 0.;
        }
    };
    let factor = (1. + monthly_rate).powi(periods);
    principal * (monthly_rate * factor) / (factor - 1.)
}

impl PartialEq for Loan {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.principal == other.principal
            && self.annual_rate == other.annual_rate
            && self.years == other.years
            && self.start_date == other.start_date
    }
}

fn get_pmt_date(&start_date: &NaiveDate, pmt_number: u32) -> NaiveDate {
    start_date
        .checked_add_days(Days::new(DAYS_PER_PERIOD * pmt_number as u64))
        .unwrap_or(NaiveDate::MAX)
}
