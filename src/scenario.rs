//! Purchase scenarios: a home price and down payment evaluated against a list
//! of named loan options.
//!
//! The configuration is an explicit value handed to [`Scenario::evaluate`];
//! [`PurchaseConfig::default`] supplies the stock example when no file is given.

use crate::error::{MortgageError, MortgageResult};
use crate::loan::LoanSummary;
use crate::loan_set::LoanSet;
use chrono::NaiveDate;
use log::info;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::path::Path;

/// A loan product to price against the purchase.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanOption {
    pub name: String,
    /// Annual rate as a decimal fraction (0.065 = 6.5%).
    pub annual_rate: f64,
    pub years: u32,
    /// Overrides the purchase's loan amount when set.
    #[cfg_attr(feature = "serde", serde(default))]
    pub principal: Option<f64>,
}

impl LoanOption {
    pub fn new(name: impl Into<String>, annual_rate: f64, years: u32) -> Self {
        Self {
            name: name.into(),
            annual_rate,
            years,
            principal: None,
        }
    }

    fn validate(&self, idx: usize) -> MortgageResult<()> {
        let field = |f: &str| format!("loans[{}].{}", idx, f);

        if !self.annual_rate.is_finite() || self.annual_rate < 0. {
            return Err(MortgageError::invalid(
                field("annual_rate"),
                format!("must be a non-negative rate, got {}", self.annual_rate),
            ));
        }
        if self.years == 0 {
            return Err(MortgageError::invalid(
                field("years"),
                "must be at least one year",
            ));
        }
        match self.principal {
            Some(principal) if !principal.is_finite() || principal <= 0. => {
                Err(MortgageError::invalid(
                    field("principal"),
                    format!("must be positive, got {}", principal),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Purchase parameters plus the loan options to compare.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PurchaseConfig {
    pub home_price: f64,
    pub down_payment: f64,
    #[cfg_attr(feature = "serde", serde(alias = "sample_loans"))]
    pub loans: Vec<LoanOption>,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            home_price: 400_000.,
            down_payment: 92_000.,
            loans: vec![
                LoanOption::new("15-Year @ 5.0%", 0.05, 15),
                LoanOption::new("30-Year @ 6.5%", 0.065, 30),
            ],
        }
    }
}

impl PurchaseConfig {
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> MortgageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<Path>) -> MortgageResult<Self> {
        let path = path.as_ref();
        info!("loading purchase configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn loan_amount(&self) -> f64 {
        self.home_price - self.down_payment
    }

    pub fn down_payment_percent(&self) -> f64 {
        self.down_payment / self.home_price * 100.
    }

    pub fn validate(&self) -> MortgageResult<()> {
        if !self.home_price.is_finite() || self.home_price <= 0. {
            return Err(MortgageError::invalid(
                "home_price",
                format!("must be positive, got {}", self.home_price),
            ));
        }
        if !self.down_payment.is_finite() || self.down_payment < 0. {
            return Err(MortgageError::invalid(
                "down_payment",
                format!("cannot be negative, got {}", self.down_payment),
            ));
        }
        if self.down_payment >= self.home_price {
            return Err(MortgageError::invalid(
                "down_payment",
                format!(
                    "must be less than the home price {}, got {}",
                    self.home_price, self.down_payment
                ),
            ));
        }
        if self.loans.is_empty() {
            return Err(MortgageError::invalid(
                "loans",
                "must name at least one loan option",
            ));
        }
        for (idx, option) in self.loans.iter().enumerate() {
            option.validate(idx)?;
        }
        Ok(())
    }
}

/// Home equity under each loan at the end of one year, in loan order.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EquityRow {
    pub year: u32,
    pub equity: Vec<f64>,
}

/// A validated purchase with every loan option built and scheduled.
#[derive(Debug)]
pub struct Scenario {
    home_price: f64,
    down_payment: f64,
    loans: LoanSet,
    comparison: Vec<LoanSummary>,
}

impl Scenario {
    pub fn evaluate(
        config: &PurchaseConfig,
        start_date: Option<NaiveDate>,
    ) -> MortgageResult<Self> {
        config.validate()?;

        let loan_amount = config.loan_amount();
        info!(
            "evaluating {} loan options: home ${:.2}, down ${:.2} ({:.1}%), financed ${:.2}",
            config.loans.len(),
            config.home_price,
            config.down_payment,
            config.down_payment_percent(),
            loan_amount
        );

        let mut loans = LoanSet::new();
        for option in &config.loans {
            loans.add_loan_dated(
                option.principal.unwrap_or(loan_amount),
                option.annual_rate,
                option.years,
                Some(option.name.as_str()),
                start_date,
            );
        }
        loans.generate_schedules();
        let comparison = loans.compare_loans();

        Ok(Self {
            home_price: config.home_price,
            down_payment: config.down_payment,
            loans,
            comparison,
        })
    }

    pub fn home_price(&self) -> f64 {
        self.home_price
    }

    pub fn down_payment(&self) -> f64 {
        self.down_payment
    }

    pub fn loan_amount(&self) -> f64 {
        self.home_price - self.down_payment
    }

    pub fn down_payment_percent(&self) -> f64 {
        self.down_payment / self.home_price * 100.
    }

    pub fn loans(&self) -> &LoanSet {
        &self.loans
    }

    pub fn comparison(&self) -> &[LoanSummary] {
        &self.comparison
    }

    /// Everything paid for the home under `summary`'s loan: down payment plus
    /// every monthly payment.
    pub fn total_cost(&self, summary: &LoanSummary) -> f64 {
        self.down_payment + summary.total_paid
    }

    pub fn lowest_monthly_payment(&self) -> Option<&LoanSummary> {
        self.comparison
            .iter()
            .min_by(|a, b| a.monthly_payment.total_cmp(&b.monthly_payment))
    }

    pub fn lowest_total_interest(&self) -> Option<&LoanSummary> {
        self.comparison
            .iter()
            .min_by(|a, b| a.total_interest.total_cmp(&b.total_interest))
    }

    pub fn lowest_total_cost(&self) -> Option<&LoanSummary> {
        self.comparison
            .iter()
            .min_by(|a, b| self.total_cost(a).total_cmp(&self.total_cost(b)))
    }

    /// Equity for years `1..=years`. A loan with no year-end entry for a year
    /// is paid off, so its equity is the whole home price.
    pub fn equity_by_year(&self, years: u32) -> Vec<EquityRow> {
        (1..=years)
            .map(|year| EquityRow {
                year,
                equity: self
                    .loans
                    .loans()
                    .iter()
                    .map(|loan| match loan.year_end_balance(year) {
                        Some(ye) => self.home_price - ye.remaining_balance,
                        None => self.home_price,
                    })
                    .collect(),
            })
            .collect()
    }
}
