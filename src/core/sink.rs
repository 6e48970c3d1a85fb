use anyhow::Result;

use crate::models::grid::{
    Customer, DistributionNetwork, LineSubstationLink, Meter, PowerPlant, Substation,
    TransmissionLine,
};
use crate::models::records::{
    AssetMaintenance, Billing, CustomerOutage, EnergyConsumption, Maintenance, Outage,
};

/// One named batch of finished records, in creation order.
#[derive(Debug, Clone, Copy)]
pub enum RecordBatch<'a> {
    PowerPlants(&'a [PowerPlant]),
    TransmissionLines(&'a [TransmissionLine]),
    Substations(&'a [Substation]),
    LineSubstationLinks(&'a [LineSubstationLink]),
    DistributionNetworks(&'a [DistributionNetwork]),
    Customers(&'a [Customer]),
    Meters(&'a [Meter]),
    EnergyConsumption(&'a [EnergyConsumption]),
    Billing(&'a [Billing]),
    Maintenance(&'a [Maintenance]),
    AssetMaintenance(&'a [AssetMaintenance]),
    Outages(&'a [Outage]),
    CustomerOutages(&'a [CustomerOutage]),
}

impl RecordBatch<'_> {
    /// Table / file stem the batch belongs to.
    pub fn entity_name(&self) -> &'static str {
        match self {
            RecordBatch::PowerPlants(_) => "power_plants",
            RecordBatch::TransmissionLines(_) => "transmission_lines",
            RecordBatch::Substations(_) => "substations",
            RecordBatch::LineSubstationLinks(_) => "transmission_substation",
            RecordBatch::DistributionNetworks(_) => "distribution_networks",
            RecordBatch::Customers(_) => "customers",
            RecordBatch::Meters(_) => "meters",
            RecordBatch::EnergyConsumption(_) => "energy_consumption",
            RecordBatch::Billing(_) => "billing",
            RecordBatch::Maintenance(_) => "maintenance",
            RecordBatch::AssetMaintenance(_) => "asset_maintenance",
            RecordBatch::Outages(_) => "outages",
            RecordBatch::CustomerOutages(_) => "customer_outage",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::PowerPlants(rows) => rows.len(),
            RecordBatch::TransmissionLines(rows) => rows.len(),
            RecordBatch::Substations(rows) => rows.len(),
            RecordBatch::LineSubstationLinks(rows) => rows.len(),
            RecordBatch::DistributionNetworks(rows) => rows.len(),
            RecordBatch::Customers(rows) => rows.len(),
            RecordBatch::Meters(rows) => rows.len(),
            RecordBatch::EnergyConsumption(rows) => rows.len(),
            RecordBatch::Billing(rows) => rows.len(),
            RecordBatch::Maintenance(rows) => rows.len(),
            RecordBatch::AssetMaintenance(rows) => rows.len(),
            RecordBatch::Outages(rows) => rows.len(),
            RecordBatch::CustomerOutages(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Primary keys of the batch. Join tables have none and return an empty list.
    pub fn ids(&self) -> Vec<u64> {
        match self {
            RecordBatch::PowerPlants(rows) => rows.iter().map(|r| r.plant_id.get()).collect(),
            RecordBatch::TransmissionLines(rows) => rows.iter().map(|r| r.line_id.get()).collect(),
            RecordBatch::Substations(rows) => rows.iter().map(|r| r.substation_id.get()).collect(),
            RecordBatch::DistributionNetworks(rows) => rows.iter().map(|r| r.network_id.get()).collect(),
            RecordBatch::Customers(rows) => rows.iter().map(|r| r.customer_id.get()).collect(),
            RecordBatch::Meters(rows) => rows.iter().map(|r| r.meter_id.get()).collect(),
            RecordBatch::EnergyConsumption(rows) => rows.iter().map(|r| r.consumption_id.get()).collect(),
            RecordBatch::Billing(rows) => rows.iter().map(|r| r.bill_id.get()).collect(),
            RecordBatch::Maintenance(rows) => rows.iter().map(|r| r.maintenance_id.get()).collect(),
            RecordBatch::Outages(rows) => rows.iter().map(|r| r.outage_id.get()).collect(),
            RecordBatch::LineSubstationLinks(_)
            | RecordBatch::AssetMaintenance(_)
            | RecordBatch::CustomerOutages(_) => Vec::new(),
        }
    }
}

/// Destination for finished records (a database, a set of files, memory).
///
/// `write_batch` returns the ids under which the rows were stored, in batch
/// order; join tables return an empty list.
///
/// Stored ids must equal the ids the generator minted, since child records
/// already carry them as foreign keys. A sink that assigns its own ids, such
/// as an auto-increment column on a table that already holds rows, makes the
/// run fail with `UnresolvedForeignKey` on its first batch. Such sinks must
/// store the minted ids verbatim or start from an empty table.
pub trait RecordSink {
    fn write_batch(&mut self, batch: RecordBatch<'_>) -> Result<Vec<u64>>;

    /// Flushes anything buffered. Called once after the last batch.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps owned copies of everything written. Used by tests and small runs.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub power_plants: Vec<PowerPlant>,
    pub transmission_lines: Vec<TransmissionLine>,
    pub substations: Vec<Substation>,
    pub line_substation_links: Vec<LineSubstationLink>,
    pub distribution_networks: Vec<DistributionNetwork>,
    pub customers: Vec<Customer>,
    pub meters: Vec<Meter>,
    pub energy_consumption: Vec<EnergyConsumption>,
    pub billing: Vec<Billing>,
    pub maintenance: Vec<Maintenance>,
    pub asset_maintenance: Vec<AssetMaintenance>,
    pub outages: Vec<Outage>,
    pub customer_outages: Vec<CustomerOutage>,
    pub batches_written: usize,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn write_batch(&mut self, batch: RecordBatch<'_>) -> Result<Vec<u64>> {
        self.batches_written += 1;
        match batch {
            RecordBatch::PowerPlants(rows) => self.power_plants.extend_from_slice(rows),
            RecordBatch::TransmissionLines(rows) => self.transmission_lines.extend_from_slice(rows),
            RecordBatch::Substations(rows) => self.substations.extend_from_slice(rows),
            RecordBatch::LineSubstationLinks(rows) => self.line_substation_links.extend_from_slice(rows),
            RecordBatch::DistributionNetworks(rows) => self.distribution_networks.extend_from_slice(rows),
            RecordBatch::Customers(rows) => self.customers.extend_from_slice(rows),
            RecordBatch::Meters(rows) => self.meters.extend_from_slice(rows),
            RecordBatch::EnergyConsumption(rows) => self.energy_consumption.extend_from_slice(rows),
            RecordBatch::Billing(rows) => self.billing.extend_from_slice(rows),
            RecordBatch::Maintenance(rows) => self.maintenance.extend_from_slice(rows),
            RecordBatch::AssetMaintenance(rows) => self.asset_maintenance.extend_from_slice(rows),
            RecordBatch::Outages(rows) => self.outages.extend_from_slice(rows),
            RecordBatch::CustomerOutages(rows) => self.customer_outages.extend_from_slice(rows),
        }
        Ok(batch.ids())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
