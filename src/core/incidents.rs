use chrono::{Duration, NaiveDate};
use rand::seq::{index, SliceRandom};
use rand::Rng;
use tracing::{debug, info};

use crate::config::constants::*;
use crate::config::generation_config::GenerationConfig;
use crate::core::asset_graph::AssetGraph;
use crate::core::billing::each_day;
use crate::core::error::{check_date_range, check_probability, GenerationError, GenerationResult};
use crate::models::asset::{AssetKind, AssetRef};
use crate::models::ids::{IdSequence, MaintenanceId, OutageId};
use crate::models::records::{AssetMaintenance, CustomerOutage, Maintenance, Outage};
use crate::utils::logging::{self, OperationCategory};

/// Everything the maintenance and outage processes produced over a horizon.
#[derive(Debug, Clone, Default)]
pub struct IncidentLog {
    pub maintenance: Vec<Maintenance>,
    pub asset_maintenance: Vec<AssetMaintenance>,
    pub outages: Vec<Outage>,
    pub customer_outages: Vec<CustomerOutage>,
}

/// Two independent daily Bernoulli processes over the grid's assets.
///
/// Each firing picks an asset kind uniformly and then one asset of that kind
/// uniformly. Events never span days and never cluster.
pub struct IncidentSimulator<'a> {
    graph: &'a AssetGraph,
    maintenance_probability: f64,
    outage_probability: f64,
    max_affected_customers: usize,
    maintenance_ids: IdSequence<MaintenanceId>,
    outage_ids: IdSequence<OutageId>,
}

impl<'a> IncidentSimulator<'a> {
    pub fn new(
        graph: &'a AssetGraph,
        maintenance_probability: f64,
        outage_probability: f64,
        max_affected_customers: usize,
    ) -> GenerationResult<Self> {
        check_probability("maintenance", maintenance_probability)?;
        check_probability("outage", outage_probability)?;
        Ok(Self {
            graph,
            maintenance_probability,
            outage_probability,
            max_affected_customers,
            maintenance_ids: IdSequence::new(),
            outage_ids: IdSequence::new(),
        })
    }

    pub fn from_config(graph: &'a AssetGraph, config: &GenerationConfig) -> GenerationResult<Self> {
        Self::new(
            graph,
            config.maintenance_probability,
            config.outage_probability,
            config.max_affected_customers,
        )
    }

    /// Uniform kind, then a uniform asset of that kind.
    pub fn pick_asset<R: Rng + ?Sized>(&self, rng: &mut R) -> GenerationResult<AssetRef> {
        let kind = AssetKind::ALL[rng.gen_range(0..AssetKind::ALL.len())];
        let empty = |parent| GenerationError::EmptyParentPopulation { entity: "incident", parent };

        let asset = match kind {
            AssetKind::Plant => self
                .graph
                .plants
                .choose(rng)
                .map(|p| AssetRef::Plant(p.plant_id))
                .ok_or_else(|| empty("power plant"))?,
            AssetKind::Line => self
                .graph
                .lines
                .choose(rng)
                .map(|l| AssetRef::Line(l.line_id))
                .ok_or_else(|| empty("transmission line"))?,
            AssetKind::Substation => self
                .graph
                .substations
                .choose(rng)
                .map(|s| AssetRef::Substation(s.substation_id))
                .ok_or_else(|| empty("substation"))?,
            AssetKind::Network => self
                .graph
                .networks
                .choose(rng)
                .map(|n| AssetRef::Network(n.network_id))
                .ok_or_else(|| empty("distribution network"))?,
        };
        Ok(asset)
    }

    /// Rolls the maintenance process for one day.
    pub fn maintenance_for_day<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        date: NaiveDate,
    ) -> GenerationResult<Option<(Maintenance, AssetMaintenance)>> {
        if !rng.gen_bool(self.maintenance_probability) {
            return Ok(None);
        }

        let asset = self.pick_asset(rng)?;
        let activity = MAINTENANCE_ACTIVITIES[rng.gen_range(0..MAINTENANCE_ACTIVITIES.len())];
        let maintenance_id = self.maintenance_ids.next_id();
        let maintenance = Maintenance {
            maintenance_id,
            maintenance_date: date,
            description: format!("{} {}", activity, asset),
            cost: rng.gen_range(MAINTENANCE_MIN_COST..=MAINTENANCE_MAX_COST),
        };
        Ok(Some((maintenance, AssetMaintenance { maintenance_id, asset })))
    }

    /// Rolls the outage process for one day.
    ///
    /// The outage starts at a random minute of `date` and lasts between half
    /// an hour and eight hours. Between one and `max_affected_customers`
    /// distinct customers are affected, capped at the number of customers.
    pub fn outage_for_day<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        date: NaiveDate,
    ) -> GenerationResult<Option<(Outage, Vec<CustomerOutage>)>> {
        if !rng.gen_bool(self.outage_probability) {
            return Ok(None);
        }

        let asset = self.pick_asset(rng)?;
        let hour = rng.gen_range(0..24);
        let minute = rng.gen_range(0..60);
        let start_time = date.and_hms_opt(hour, minute, 0).ok_or_else(|| {
            GenerationError::InvalidConfig(format!("invalid outage start {:02}:{:02} on {}", hour, minute, date))
        })?;
        let hours = rng.gen_range(OUTAGE_MIN_HOURS..=OUTAGE_MAX_HOURS);
        let end_time = start_time
            .checked_add_signed(Duration::seconds((hours * 3600.0).round() as i64))
            .ok_or_else(|| GenerationError::InvalidConfig(format!("outage starting {} ends past the calendar", start_time)))?;
        let cause = OUTAGE_CAUSES[rng.gen_range(0..OUTAGE_CAUSES.len())];

        let outage_id = self.outage_ids.next_id();
        let outage = Outage {
            outage_id,
            start_time,
            end_time,
            description: format!("{} {}", cause, asset),
            asset,
        };

        let customers = &self.graph.customers;
        let affected = if customers.is_empty() {
            Vec::new()
        } else {
            let k = rng.gen_range(1..=self.max_affected_customers.max(1)).min(customers.len());
            let mut picked = index::sample(rng, customers.len(), k).into_vec();
            picked.sort_unstable();
            picked
                .into_iter()
                .map(|i| CustomerOutage { outage_id, customer_id: customers[i].customer_id })
                .collect()
        };

        Ok(Some((outage, affected)))
    }

    /// Runs the maintenance process over every day of `[start, end]`, then
    /// the outage process over the same days.
    #[tracing::instrument(name = "simulate_incidents", skip(self, rng))]
    pub fn simulate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        start: NaiveDate,
        end: NaiveDate,
    ) -> GenerationResult<IncidentLog> {
        let _timing = logging::start_timing("simulate_incidents", OperationCategory::Incidents);
        check_date_range("incident horizon", start, end)?;

        let mut log = IncidentLog::default();

        for date in each_day(start, end) {
            if let Some((maintenance, link)) = self.maintenance_for_day(rng, date)? {
                log.maintenance.push(maintenance);
                log.asset_maintenance.push(link);
            }
        }

        for date in each_day(start, end) {
            if let Some((outage, affected)) = self.outage_for_day(rng, date)? {
                debug!(outage = %outage.outage_id, asset = %outage.asset, affected = affected.len(), "Outage");
                log.outages.push(outage);
                log.customer_outages.extend(affected);
            }
        }

        info!(
            maintenance = log.maintenance.len(),
            outages = log.outages.len(),
            affected_customers = log.customer_outages.len(),
            "Simulated maintenance and outages"
        );
        Ok(log)
    }
}
