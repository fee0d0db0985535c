use chrono::Local;
use log::info;
use mortgage::loan::*;
use mortgage::scenario::{PurchaseConfig, Scenario};
use simple_logger::SimpleLogger;
use std::error::Error;

fn load_config() -> Result<PurchaseConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        #[cfg(feature = "serde")]
        Some(path) => Ok(PurchaseConfig::from_json_file(path)?),
        #[cfg(not(feature = "serde"))]
        Some(_) => Err("reading a configuration file requires the `serde` feature".into()),
        None => {
            info!("no configuration file given, using the default purchase");
            Ok(PurchaseConfig::default())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let config = load_config()?;
    let scenario = Scenario::evaluate(&config, Some(Local::now().date_naive()))?;

    println!(
        "Home price ${:.2}, down payment ${:.2} ({:.1}%), loan amount ${:.2}",
        scenario.home_price(),
        scenario.down_payment(),
        scenario.down_payment_percent(),
        scenario.loan_amount()
    );

    println!("\nLoan comparison:");
    for summary in scenario.comparison() {
        println!(
            "  {} | total cost ${:.2}",
            summary,
            scenario.total_cost(summary)
        );
    }

    if let [first, second] = scenario.comparison() {
        let savings = first.savings_against(second);
        println!(
            "\n{} costs ${:.2} more per month and saves ${:.2} in interest ({:.1}%) against {}",
            first.name,
            savings.monthly_difference,
            savings.interest_savings,
            savings.interest_savings_percent,
            second.name
        );
    }

    if let Some(best) = scenario.lowest_monthly_payment() {
        println!("\nLowest monthly payment: {} (${:.2})", best.name, best.monthly_payment);
    }
    if let Some(best) = scenario.lowest_total_interest() {
        println!("Lowest total interest: {} (${:.2})", best.name, best.total_interest);
    }
    if let Some(best) = scenario.lowest_total_cost() {
        println!("Lowest total cost: {} (${:.2})", best.name, scenario.total_cost(best));
    }

    for loan in scenario.loans().loans() {
        println!("\nFirst 3 months of {}:", loan.name());
        for pmt in loan.generate_schedule().iter().take(3) {
            println!("  {}", pmt);
        }
    }

    let names: Vec<&str> = scenario.loans().loans().iter().map(Loan::name).collect();
    println!("\nEquity by year ({}):", names.join(" | "));
    for row in scenario.equity_by_year(10) {
        let equity: Vec<String> = row.equity.iter().map(|e| format!("${:.0}", e)).collect();
        println!("  year {:>2}: {}", row.year, equity.join(" | "));
    }

    Ok(())
}

// verifies that types can implement the gated traits below
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<ScheduleEntry>();
    is_normal::<Loan>();
    is_normal::<mortgage::LoanSet>();
}
