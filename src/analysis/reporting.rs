use chrono::NaiveDate;
use serde::Serialize;

/// Totals of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub seed: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub horizon_days: u64,
    pub billing_periods: usize,

    pub power_plants: usize,
    pub transmission_lines: usize,
    pub line_substation_links: usize,
    pub substations: usize,
    pub distribution_networks: usize,
    pub customers: usize,
    pub meters: usize,
    pub consumption_rows: usize,
    pub bills: usize,
    pub maintenance_events: usize,
    pub outages: usize,
    pub customer_outages: usize,

    pub total_consumption_kwh: f64,
    pub total_billed: f64,
}

impl GenerationSummary {
    pub fn new(seed: u64, start_date: NaiveDate, end_date: NaiveDate, horizon_days: u64) -> Self {
        Self {
            seed,
            start_date,
            end_date,
            horizon_days,
            billing_periods: 0,
            power_plants: 0,
            transmission_lines: 0,
            line_substation_links: 0,
            substations: 0,
            distribution_networks: 0,
            customers: 0,
            meters: 0,
            consumption_rows: 0,
            bills: 0,
            maintenance_events: 0,
            outages: 0,
            customer_outages: 0,
            total_consumption_kwh: 0.0,
            total_billed: 0.0,
        }
    }

    /// Mean kWh of one meter on one day, or 0 when nothing was read.
    pub fn mean_daily_kwh_per_meter(&self) -> f64 {
        if self.consumption_rows == 0 {
            0.0
        } else {
            self.total_consumption_kwh / self.consumption_rows as f64
        }
    }

    /// Mean amount of one bill, or 0 when nothing was billed.
    pub fn mean_bill(&self) -> f64 {
        if self.bills == 0 {
            0.0
        } else {
            self.total_billed / self.bills as f64
        }
    }

    /// Billed amount per billed kWh. Lies inside the tariff range.
    pub fn effective_tariff(&self) -> f64 {
        if self.total_consumption_kwh <= 0.0 {
            0.0
        } else {
            self.total_billed / self.total_consumption_kwh
        }
    }
}

pub fn print_generation_summary(summary: &GenerationSummary) {
    println!("\nGeneration Summary");
    println!("----------------------------------------");
    println!("Horizon: {} to {} ({} days)", summary.start_date, summary.end_date, summary.horizon_days);
    println!("Seed: {}", summary.seed);
    println!("Grid Assets:");
    println!("  Power Plants: {}", summary.power_plants);
    println!("  Transmission Lines: {}", summary.transmission_lines);
    println!("  Line-Substation Links: {}", summary.line_substation_links);
    println!("  Substations: {}", summary.substations);
    println!("  Distribution Networks: {}", summary.distribution_networks);
    println!("Customers: {}", summary.customers);
    println!("Meters: {}", summary.meters);
    println!("Consumption:");
    println!("  Readings: {}", summary.consumption_rows);
    println!("  Total: {:.2} kWh", summary.total_consumption_kwh);
    println!("  Mean per Meter-Day: {:.2} kWh", summary.mean_daily_kwh_per_meter());
    println!("Billing:");
    println!("  Periods: {}", summary.billing_periods);
    println!("  Bills: {}", summary.bills);
    println!("  Total Billed: ${:.2}", summary.total_billed);
    println!("  Mean Bill: ${:.2}", summary.mean_bill());
    println!("  Effective Tariff: ${:.4}/kWh", summary.effective_tariff());
    println!("Incidents:");
    println!("  Maintenance Events: {}", summary.maintenance_events);
    println!("  Outages: {}", summary.outages);
    println!("  Customers Affected: {}", summary.customer_outages);
    println!("----------------------------------------");
}
