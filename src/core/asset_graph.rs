use std::collections::{HashMap, HashSet};
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::constants::*;
use crate::core::error::{GenerationError, GenerationResult};
use crate::data::reference::{City, ReferenceData};
use crate::models::grid::{
    Customer, DistributionNetwork, LineSubstationLink, Meter, MeterType, PowerPlant, Substation,
    TransmissionLine,
};
use crate::models::ids::{IdSequence, LineId, MeterId, NetworkId, PlantId, SubstationId};
use crate::utils::logging::{self, OperationCategory};

/// Every tier of the generated grid, parents before children.
#[derive(Debug, Clone, Default)]
pub struct AssetGraph {
    pub plants: Vec<PowerPlant>,
    pub lines: Vec<TransmissionLine>,
    pub substations: Vec<Substation>,
    pub links: Vec<LineSubstationLink>,
    pub networks: Vec<DistributionNetwork>,
    pub customers: Vec<Customer>,
    pub meters: Vec<Meter>,
}

impl AssetGraph {
    /// Confirms that every foreign key points at an existing parent, that
    /// each customer lives in the city its network serves, and that no two
    /// meters share a customer.
    pub fn check_integrity(&self) -> GenerationResult<()> {
        let plant_ids: HashSet<_> = self.plants.iter().map(|p| p.plant_id).collect();
        let line_ids: HashSet<_> = self.lines.iter().map(|l| l.line_id).collect();
        let substation_ids: HashSet<_> = self.substations.iter().map(|s| s.substation_id).collect();
        let network_cities: HashMap<_, _> = self
            .networks
            .iter()
            .map(|n| (n.network_id, n.location.as_str()))
            .collect();
        let customer_ids: HashSet<_> = self.customers.iter().map(|c| c.customer_id).collect();

        for line in &self.lines {
            if !plant_ids.contains(&line.plant_id) {
                return Err(unresolved("transmission line", "power plant", line.plant_id.get()));
            }
        }
        for link in &self.links {
            if !line_ids.contains(&link.line_id) {
                return Err(unresolved("line-substation link", "transmission line", link.line_id.get()));
            }
            if !substation_ids.contains(&link.substation_id) {
                return Err(unresolved("line-substation link", "substation", link.substation_id.get()));
            }
        }
        for network in &self.networks {
            if !substation_ids.contains(&network.substation_id) {
                return Err(unresolved("distribution network", "substation", network.substation_id.get()));
            }
        }
        for customer in &self.customers {
            let city = network_cities
                .get(&customer.network_id)
                .ok_or_else(|| unresolved("customer", "distribution network", customer.network_id.get()))?;
            if customer.city != *city {
                return Err(GenerationError::InvalidConfig(format!(
                    "customer {} lives in {} but network {} serves {}",
                    customer.customer_id, customer.city, customer.network_id, city
                )));
            }
        }
        let mut metered = HashSet::new();
        for meter in &self.meters {
            if !customer_ids.contains(&meter.customer_id) {
                return Err(unresolved("meter", "customer", meter.customer_id.get()));
            }
            if !metered.insert(meter.customer_id) {
                return Err(GenerationError::InvalidConfig(format!(
                    "customer {} has more than one meter",
                    meter.customer_id
                )));
            }
        }
        Ok(())
    }
}

fn unresolved(entity: &'static str, parent: &'static str, id: u64) -> GenerationError {
    GenerationError::UnresolvedForeignKey { entity, parent, id }
}

/// First day a meter may have been installed, `lookback_years` of 365 days
/// before `in_service_from`.
pub fn earliest_install_date(in_service_from: NaiveDate, lookback_years: u32) -> GenerationResult<NaiveDate> {
    if lookback_years > MAX_METER_INSTALL_LOOKBACK_YEARS {
        return Err(GenerationError::InvalidConfig(format!(
            "meter install lookback of {} years exceeds {}",
            lookback_years, MAX_METER_INSTALL_LOOKBACK_YEARS
        )));
    }
    in_service_from
        .checked_sub_signed(Duration::days(i64::from(lookback_years) * 365))
        .ok_or_else(|| {
            GenerationError::InvalidConfig(format!(
                "meter install lookback of {} years before {} is out of calendar range",
                lookback_years, in_service_from
            ))
        })
}

fn pick<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    parents: &'a [T],
    entity: &'static str,
    parent: &'static str,
) -> GenerationResult<&'a T> {
    parents
        .choose(rng)
        .ok_or(GenerationError::EmptyParentPopulation { entity, parent })
}

/// Mints grid assets tier by tier. Each child picks its parent uniformly
/// from the already built parent population.
pub struct AssetGraphBuilder<'a> {
    reference: &'a ReferenceData,
    line_voltages: Vec<f64>,
    network_voltages: Vec<f64>,
    plant_ids: IdSequence<PlantId>,
    line_ids: IdSequence<LineId>,
    substation_ids: IdSequence<SubstationId>,
    network_ids: IdSequence<NetworkId>,
    meter_ids: IdSequence<MeterId>,
}

impl<'a> AssetGraphBuilder<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self::with_voltages(reference, LINE_VOLTAGES_KV.to_vec(), NETWORK_VOLTAGES_KV.to_vec())
    }

    pub fn with_voltages(reference: &'a ReferenceData, line_voltages: Vec<f64>, network_voltages: Vec<f64>) -> Self {
        Self {
            reference,
            line_voltages,
            network_voltages,
            plant_ids: IdSequence::new(),
            line_ids: IdSequence::new(),
            substation_ids: IdSequence::new(),
            network_ids: IdSequence::new(),
            meter_ids: IdSequence::new(),
        }
    }

    fn random_city<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a City {
        let cities = self.reference.cities();
        // ReferenceData never holds an empty city table.
        &cities[rng.gen_range(0..cities.len())]
    }

    pub fn build_plants<R: Rng + ?Sized>(&mut self, rng: &mut R, n: usize) -> Vec<PowerPlant> {
        let _timing = logging::start_timing("build_plants", OperationCategory::AssetGraph);

        let mut plants = Vec::with_capacity(n);
        for _ in 0..n {
            let city = self.random_city(rng);
            let fuel = PLANT_FUEL_TYPES[rng.gen_range(0..PLANT_FUEL_TYPES.len())];
            plants.push(PowerPlant {
                plant_id: self.plant_ids.next_id(),
                plant_name: format!("{} {} Plant", city.name, fuel),
                capacity_mw: rng.gen_range(PLANT_MIN_CAPACITY_MW..=PLANT_MAX_CAPACITY_MW),
                location: city.name.clone(),
            });
        }

        debug!(count = plants.len(), "Built power plants");
        plants
    }

    pub fn build_lines<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        n: usize,
        plants: &[PowerPlant],
    ) -> GenerationResult<Vec<TransmissionLine>> {
        let _timing = logging::start_timing("build_lines", OperationCategory::AssetGraph);
        if n > 0 && plants.is_empty() {
            return Err(GenerationError::EmptyParentPopulation {
                entity: "transmission line",
                parent: "power plant",
            });
        }

        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            let plant = pick(rng, plants, "transmission line", "power plant")?;
            let voltage = *pick(rng, &self.line_voltages, "transmission line", "voltage")?;
            let line_id = self.line_ids.next_id();
            lines.push(TransmissionLine {
                line_id,
                line_name: format!("Line {}", line_id),
                voltage_kv: voltage,
                length_km: rng.gen_range(LINE_MIN_LENGTH_KM..=LINE_MAX_LENGTH_KM),
                plant_id: plant.plant_id,
            });
        }

        debug!(count = lines.len(), "Built transmission lines");
        Ok(lines)
    }

    pub fn build_substations<R: Rng + ?Sized>(&mut self, rng: &mut R, n: usize) -> Vec<Substation> {
        let _timing = logging::start_timing("build_substations", OperationCategory::AssetGraph);

        let mut substations = Vec::with_capacity(n);
        for _ in 0..n {
            let city = self.random_city(rng);
            let substation_id = self.substation_ids.next_id();
            substations.push(Substation {
                substation_id,
                substation_name: format!("{} Substation {}", city.name, substation_id),
                capacity_mva: rng.gen_range(SUBSTATION_MIN_CAPACITY_MVA..=SUBSTATION_MAX_CAPACITY_MVA),
                location: city.name.clone(),
            });
        }

        debug!(count = substations.len(), "Built substations");
        substations
    }

    /// Connects each line to 1..=3 substations. A line may repeat a substation.
    pub fn link_lines_to_substations<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        lines: &[TransmissionLine],
        substations: &[Substation],
    ) -> GenerationResult<Vec<LineSubstationLink>> {
        let _timing = logging::start_timing("link_lines_to_substations", OperationCategory::AssetGraph);
        if !lines.is_empty() && substations.is_empty() {
            return Err(GenerationError::EmptyParentPopulation {
                entity: "line-substation link",
                parent: "substation",
            });
        }

        let mut links = Vec::new();
        for line in lines {
            let fan_out = rng.gen_range(MIN_SUBSTATIONS_PER_LINE..=MAX_SUBSTATIONS_PER_LINE);
            for _ in 0..fan_out {
                let substation = pick(rng, substations, "line-substation link", "substation")?;
                links.push(LineSubstationLink {
                    line_id: line.line_id,
                    substation_id: substation.substation_id,
                });
            }
        }

        debug!(count = links.len(), "Linked lines to substations");
        Ok(links)
    }

    /// Networks inherit the city of the substation they hang off.
    pub fn build_networks<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        n: usize,
        substations: &[Substation],
    ) -> GenerationResult<Vec<DistributionNetwork>> {
        let _timing = logging::start_timing("build_networks", OperationCategory::AssetGraph);
        if n > 0 && substations.is_empty() {
            return Err(GenerationError::EmptyParentPopulation {
                entity: "distribution network",
                parent: "substation",
            });
        }

        let mut networks = Vec::with_capacity(n);
        for _ in 0..n {
            let substation = pick(rng, substations, "distribution network", "substation")?;
            let voltage = *pick(rng, &self.network_voltages, "distribution network", "voltage")?;
            let network_id = self.network_ids.next_id();
            networks.push(DistributionNetwork {
                network_id,
                network_name: format!("Network {}", network_id),
                voltage_kv: voltage,
                substation_id: substation.substation_id,
                location: substation.location.clone(),
            });
        }

        debug!(count = networks.len(), "Built distribution networks");
        Ok(networks)
    }

    /// One meter for each of the first `n` customers, installed some time in
    /// the `lookback_years` before `in_service_from`.
    pub fn build_meters<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        n: usize,
        customers: &[Customer],
        in_service_from: NaiveDate,
        lookback_years: u32,
    ) -> GenerationResult<Vec<Meter>> {
        let _timing = logging::start_timing("build_meters", OperationCategory::AssetGraph);
        if n > 0 && customers.is_empty() {
            return Err(GenerationError::EmptyParentPopulation {
                entity: "meter",
                parent: "customer",
            });
        }

        let earliest = earliest_install_date(in_service_from, lookback_years)?;
        let window_days = (in_service_from - earliest).num_days();
        let mut meters = Vec::with_capacity(n.min(customers.len()));
        for customer in customers.iter().take(n) {
            meters.push(Meter {
                meter_id: self.meter_ids.next_id(),
                meter_type: MeterType::ALL[rng.gen_range(0..MeterType::ALL.len())],
                installation_date: earliest + Duration::days(rng.gen_range(0..=window_days)),
                customer_id: customer.customer_id,
            });
        }

        if meters.len() < n {
            tracing::warn!(
                requested = n,
                built = meters.len(),
                "Fewer customers than requested meters; extra meters skipped"
            );
        }
        debug!(count = meters.len(), "Built meters");
        Ok(meters)
    }
}
