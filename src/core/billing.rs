use std::collections::{BTreeMap, HashMap};
use chrono::{Duration, NaiveDate};
use rand::Rng;
use tracing::debug;

use crate::core::error::{check_date_range, check_range, GenerationError, GenerationResult};
use crate::models::grid::Meter;
use crate::models::ids::{BillId, ConsumptionId, CustomerId, IdSequence, MeterId};
use crate::models::records::{Billing, EnergyConsumption};
use crate::utils::logging::{self, OperationCategory};

/// Inclusive date window covered by one bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BillingPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Every day of `[start, end]`, both ends included. Stops at the last
/// representable date instead of overflowing.
pub fn each_day(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |day| day.succ_opt()).take_while(move |day| *day <= end)
}

/// Splits the horizon into back-to-back windows of `cycle_days`, starting at
/// `start`. These are rolling windows, not calendar months; the last one is
/// cut short at `end`.
pub fn billing_periods(start: NaiveDate, end: NaiveDate, cycle_days: u32) -> GenerationResult<Vec<BillingPeriod>> {
    check_date_range("billing horizon", start, end)?;
    if cycle_days == 0 {
        return Err(GenerationError::InvalidConfig("billing cycle must be at least one day".to_string()));
    }

    let span = Duration::days(i64::from(cycle_days) - 1);
    let mut periods = Vec::new();
    let mut period_start = start;
    loop {
        let period_end = period_start
            .checked_add_signed(span)
            .map_or(end, |last| last.min(end));
        periods.push(BillingPeriod { start: period_start, end: period_end });
        match period_end.succ_opt() {
            Some(next) if next <= end => period_start = next,
            _ => break,
        }
    }
    Ok(periods)
}

/// Rolls daily readings up into one bill per customer per period.
pub struct BillingAggregator {
    tariff_range: (f64, f64),
    meter_owner: HashMap<MeterId, CustomerId>,
    bill_ids: IdSequence<BillId>,
}

impl BillingAggregator {
    pub fn new(meters: &[Meter], tariff_range: (f64, f64)) -> GenerationResult<Self> {
        check_range("tariff", tariff_range)?;
        Ok(Self {
            tariff_range,
            meter_owner: meters.iter().map(|m| (m.meter_id, m.customer_id)).collect(),
            bill_ids: IdSequence::new(),
        })
    }

    pub fn tariff_range(&self) -> (f64, f64) {
        self.tariff_range
    }

    fn draw_tariff<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.tariff_range.0..=self.tariff_range.1)
    }

    fn make_bill<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        customer_id: CustomerId,
        billing_date: NaiveDate,
        total_kwh: f64,
        last_reading: ConsumptionId,
    ) -> Billing {
        let tariff_rate = self.draw_tariff(rng);
        Billing {
            bill_id: self.bill_ids.next_id(),
            customer_id,
            billing_date,
            amount: total_kwh * tariff_rate,
            consumption_id: last_reading,
            total_kwh,
            tariff_rate,
        }
    }

    /// Bills one customer for `[period_start, period_end]`.
    ///
    /// Sums every row read by any of the customer's meters inside the
    /// period. Returns `None` when there is no such row.
    pub fn bill<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        customer_id: CustomerId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        consumption_rows: &[EnergyConsumption],
    ) -> GenerationResult<Option<Billing>> {
        check_date_range("billing period", period_start, period_end)?;
        let period = BillingPeriod { start: period_start, end: period_end };

        let mut total_kwh = 0.0;
        let mut last_reading: Option<ConsumptionId> = None;
        for row in consumption_rows {
            if !period.contains(row.reading_date) {
                continue;
            }
            if self.meter_owner.get(&row.meter_id) != Some(&customer_id) {
                continue;
            }
            total_kwh += row.consumption_kwh;
            last_reading = last_reading.max(Some(row.consumption_id));
        }

        Ok(last_reading.map(|last| self.make_bill(rng, customer_id, period.end, total_kwh, last)))
    }

    /// Bills every customer that has at least one reading in `period`,
    /// in customer id order.
    pub fn bill_period<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        period: BillingPeriod,
        consumption_rows: &[EnergyConsumption],
    ) -> GenerationResult<Vec<Billing>> {
        let _timing = logging::start_timing("bill_period", OperationCategory::Billing);

        let mut totals: BTreeMap<CustomerId, (f64, ConsumptionId)> = BTreeMap::new();
        for row in consumption_rows.iter().filter(|r| period.contains(r.reading_date)) {
            let customer_id = *self.meter_owner.get(&row.meter_id).ok_or(
                GenerationError::UnresolvedForeignKey {
                    entity: "energy consumption",
                    parent: "meter",
                    id: row.meter_id.get(),
                },
            )?;
            let entry = totals.entry(customer_id).or_insert((0.0, row.consumption_id));
            entry.0 += row.consumption_kwh;
            entry.1 = entry.1.max(row.consumption_id);
        }

        let bills: Vec<Billing> = totals
            .into_iter()
            .map(|(customer_id, (total_kwh, last))| self.make_bill(rng, customer_id, period.end, total_kwh, last))
            .collect();

        debug!(
            start = %period.start,
            end = %period.end,
            bills = bills.len(),
            "Billed period"
        );
        Ok(bills)
    }
}
