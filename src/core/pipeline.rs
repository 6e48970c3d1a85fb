use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::analysis::reporting::GenerationSummary;
use crate::config::generation_config::GenerationConfig;
use crate::core::asset_graph::{AssetGraph, AssetGraphBuilder};
use crate::core::billing::{billing_periods, each_day, BillingAggregator};
use crate::core::consumption::{build_meter_profiles, ConsumptionSynthesizer};
use crate::core::customer_assigner::CustomerAssigner;
use crate::core::error::{GenerationError, GenerationResult};
use crate::core::incidents::IncidentSimulator;
use crate::core::sink::{RecordBatch, RecordSink};
use crate::data::reference::ReferenceData;
use crate::utils::logging::{self, OperationCategory, SinkWriteType};

/// Runs one complete, single-pass generation into a sink.
///
/// Tiers are produced strictly in dependency order: assets, customers,
/// meters, then daily consumption with a bill run at the end of every
/// billing period, then maintenance and outages. The first error aborts
/// the run; nothing already written is rolled back.
pub struct GridDataGenerator {
    config: GenerationConfig,
    reference: ReferenceData,
    show_progress: bool,
}

impl GridDataGenerator {
    pub fn new(config: GenerationConfig, reference: ReferenceData) -> GenerationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reference,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    #[tracing::instrument(name = "generate_dataset", skip_all)]
    pub fn run<S: RecordSink + ?Sized>(&self, sink: &mut S) -> GenerationResult<GenerationSummary> {
        let _timing = logging::start_timing("generate_dataset", OperationCategory::Other);

        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        info!(
            seed,
            start = %self.config.start_date,
            end = %self.config.end_date,
            customers = self.config.num_customers,
            meters = self.config.num_meters,
            "Starting generation run"
        );

        let mut summary = GenerationSummary::new(
            seed,
            self.config.start_date,
            self.config.end_date,
            self.config.horizon_days(),
        );

        let graph = self.generate_assets(&mut rng, sink)?;
        summary.power_plants = graph.plants.len();
        summary.transmission_lines = graph.lines.len();
        summary.line_substation_links = graph.links.len();
        summary.substations = graph.substations.len();
        summary.distribution_networks = graph.networks.len();
        summary.customers = graph.customers.len();
        summary.meters = graph.meters.len();

        self.generate_consumption_and_bills(&mut rng, sink, &graph, &mut summary)?;
        self.generate_incidents(&mut rng, sink, &graph, &mut summary)?;

        sink.finish().context("failed to finish sink")?;

        info!(
            readings = summary.consumption_rows,
            bills = summary.bills,
            total_kwh = summary.total_consumption_kwh,
            total_billed = summary.total_billed,
            "Generation run complete"
        );
        Ok(summary)
    }

    /// Builds and writes every asset tier, customers and meters.
    #[tracing::instrument(skip_all)]
    pub fn generate_assets<R, S>(&self, rng: &mut R, sink: &mut S) -> GenerationResult<AssetGraph>
    where
        R: Rng + ?Sized,
        S: RecordSink + ?Sized,
    {
        let config = &self.config;
        let mut builder = AssetGraphBuilder::with_voltages(
            &self.reference,
            config.line_voltages.clone(),
            config.network_voltages.clone(),
        );

        let plants = builder.build_plants(rng, config.num_plants);
        write_checked(sink, RecordBatch::PowerPlants(&plants), SinkWriteType::Assets)?;

        let lines = builder.build_lines(rng, config.num_lines, &plants)?;
        write_checked(sink, RecordBatch::TransmissionLines(&lines), SinkWriteType::Assets)?;

        let substations = builder.build_substations(rng, config.num_substations);
        write_checked(sink, RecordBatch::Substations(&substations), SinkWriteType::Assets)?;

        let links = builder.link_lines_to_substations(rng, &lines, &substations)?;
        write_checked(sink, RecordBatch::LineSubstationLinks(&links), SinkWriteType::Assets)?;

        let networks = builder.build_networks(rng, config.num_networks, &substations)?;
        write_checked(sink, RecordBatch::DistributionNetworks(&networks), SinkWriteType::Assets)?;

        let mut assigner = CustomerAssigner::new(&self.reference)?;
        let customers = assigner.assign(rng, config.num_customers, &networks)?;
        if assigner.fallback_draws() > 0 {
            info!(
                fallback = assigner.fallback_draws(),
                "Some customers drawn for unserved cities were placed in served cities instead"
            );
        }
        write_checked(sink, RecordBatch::Customers(&customers), SinkWriteType::Customers)?;

        let meters = builder.build_meters(
            rng,
            config.num_meters,
            &customers,
            config.start_date,
            config.meter_install_lookback_years,
        )?;
        write_checked(sink, RecordBatch::Meters(&meters), SinkWriteType::Customers)?;

        let graph = AssetGraph {
            plants,
            lines,
            substations,
            links,
            networks,
            customers,
            meters,
        };
        graph.check_integrity()?;
        Ok(graph)
    }

    /// Writes one reading per meter per day and bills every customer at the
    /// end of each billing period.
    #[tracing::instrument(skip_all, fields(cycle_days = self.config.billing_cycle_days))]
    pub fn generate_consumption_and_bills<R, S>(
        &self,
        rng: &mut R,
        sink: &mut S,
        graph: &AssetGraph,
        summary: &mut GenerationSummary,
    ) -> GenerationResult<()>
    where
        R: Rng + ?Sized,
        S: RecordSink + ?Sized,
    {
        let config = &self.config;
        let periods = billing_periods(config.start_date, config.end_date, config.billing_cycle_days)?;
        let profiles = build_meter_profiles(
            rng,
            &graph.meters,
            &graph.customers,
            &graph.networks,
            &self.reference,
            config.base_consumption_range,
            config.apply_size_tier_scaling,
        )?;
        let mut synthesizer = ConsumptionSynthesizer::new(&self.reference)?;
        let mut aggregator = BillingAggregator::new(&graph.meters, config.tariff_range)?;

        let progress = self.progress_bar(periods.len() as u64);
        for period in &periods {
            progress.set_message(format!("{} to {}", period.start, period.end));

            let mut period_rows = Vec::with_capacity(profiles.len() * period.days().max(0) as usize);
            for date in each_day(period.start, period.end) {
                let readings = {
                    let _timing = logging::start_timing("synthesize_day", OperationCategory::Consumption);
                    synthesizer.readings_for_day(rng, &profiles, date)
                };
                write_checked(sink, RecordBatch::EnergyConsumption(&readings), SinkWriteType::TimeSeries)?;

                summary.consumption_rows += readings.len();
                summary.total_consumption_kwh += readings.iter().map(|r| r.consumption_kwh).sum::<f64>();
                period_rows.extend(readings);
            }

            let bills = aggregator.bill_period(rng, *period, &period_rows)?;
            write_checked(sink, RecordBatch::Billing(&bills), SinkWriteType::TimeSeries)?;
            summary.bills += bills.len();
            summary.total_billed += bills.iter().map(|b| b.amount).sum::<f64>();
            summary.billing_periods += 1;

            debug!(
                start = %period.start,
                end = %period.end,
                readings = period_rows.len(),
                bills = bills.len(),
                "Finished billing period"
            );
            progress.inc(1);
        }
        progress.finish_and_clear();
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn generate_incidents<R, S>(
        &self,
        rng: &mut R,
        sink: &mut S,
        graph: &AssetGraph,
        summary: &mut GenerationSummary,
    ) -> GenerationResult<()>
    where
        R: Rng + ?Sized,
        S: RecordSink + ?Sized,
    {
        let mut simulator = IncidentSimulator::from_config(graph, &self.config)?;
        let log = simulator.simulate(rng, self.config.start_date, self.config.end_date)?;

        write_checked(sink, RecordBatch::Maintenance(&log.maintenance), SinkWriteType::Events)?;
        write_checked(sink, RecordBatch::AssetMaintenance(&log.asset_maintenance), SinkWriteType::Events)?;
        write_checked(sink, RecordBatch::Outages(&log.outages), SinkWriteType::Events)?;
        write_checked(sink, RecordBatch::CustomerOutages(&log.customer_outages), SinkWriteType::Events)?;

        summary.maintenance_events = log.maintenance.len();
        summary.outages = log.outages.len();
        summary.customer_outages = log.customer_outages.len();
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} billing periods {msg} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        pb
    }
}

/// Hands a batch to the sink and checks that it stored the rows under the
/// ids they were minted with. Empty batches are not written.
fn write_checked<S: RecordSink + ?Sized>(
    sink: &mut S,
    batch: RecordBatch<'_>,
    kind: SinkWriteType,
) -> GenerationResult<()> {
    if batch.is_empty() {
        return Ok(());
    }
    let _timing = logging::start_timing(batch.entity_name(), OperationCategory::SinkWrite { subcategory: kind });

    let stored = sink
        .write_batch(batch)
        .with_context(|| format!("failed to write {} batch", batch.entity_name()))?;
    let minted = batch.ids();
    if stored == minted {
        return Ok(());
    }

    let id = minted
        .iter()
        .zip(&stored)
        .find(|(minted, stored)| minted != stored)
        .map(|(minted, _)| *minted)
        .or_else(|| minted.get(stored.len()).copied())
        .or_else(|| stored.get(minted.len()).copied())
        .unwrap_or_default();
    Err(GenerationError::UnresolvedForeignKey {
        entity: batch.entity_name(),
        parent: "stored record",
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use crate::core::sink::MemorySink;

    fn small_config() -> GenerationConfig {
        GenerationConfig {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 2, 14).unwrap(),
            seed: Some(7),
            num_plants: 2,
            num_lines: 3,
            num_substations: 4,
            num_networks: 5,
            num_customers: 40,
            num_meters: 30,
            ..GenerationConfig::default()
        }
    }

    /// Stores nothing and hands back shifted ids.
    struct ShiftingSink;

    impl RecordSink for ShiftingSink {
        fn write_batch(&mut self, batch: RecordBatch<'_>) -> Result<Vec<u64>> {
            Ok(batch.ids().into_iter().map(|id| id + 100).collect())
        }
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn write_batch(&mut self, _batch: RecordBatch<'_>) -> Result<Vec<u64>> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let config = GenerationConfig { num_plants: 0, ..small_config() };
        let reference = ReferenceData::us_cities().unwrap();
        assert!(matches!(
            GridDataGenerator::new(config, reference),
            Err(GenerationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn horizon_on_the_last_calendar_day_is_rejected() {
        let config = GenerationConfig {
            start_date: NaiveDate::MAX,
            end_date: NaiveDate::MAX,
            ..small_config()
        };
        let reference = ReferenceData::us_cities().unwrap();
        assert!(matches!(
            GridDataGenerator::new(config, reference),
            Err(GenerationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn run_fills_every_table() {
        let generator = GridDataGenerator::new(small_config(), ReferenceData::us_cities().unwrap()).unwrap();
        let mut sink = MemorySink::new();
        let summary = generator.run(&mut sink).unwrap();

        assert!(sink.finished);
        assert_eq!(sink.power_plants.len(), 2);
        assert_eq!(sink.customers.len(), 40);
        assert_eq!(sink.meters.len(), 30);
        assert_eq!(sink.energy_consumption.len(), 30 * 45);
        assert_eq!(summary.consumption_rows, sink.energy_consumption.len());
        assert_eq!(summary.billing_periods, 2);
        // Every metered customer is billed once per period.
        assert_eq!(sink.billing.len(), 30 * 2);
        assert_eq!(summary.seed, 7);
        assert_eq!(summary.maintenance_events, sink.maintenance.len());
    }

    #[test]
    fn same_seed_same_dataset() {
        let reference = ReferenceData::us_cities().unwrap();
        let generator = GridDataGenerator::new(small_config(), reference).unwrap();
        let mut first = MemorySink::new();
        let mut second = MemorySink::new();
        generator.run(&mut first).unwrap();
        generator.run(&mut second).unwrap();

        assert_eq!(first.customers, second.customers);
        assert_eq!(first.energy_consumption, second.energy_consumption);
        assert_eq!(first.billing, second.billing);
        assert_eq!(first.outages, second.outages);
    }

    #[test]
    fn mismatched_handback_aborts() {
        let generator = GridDataGenerator::new(small_config(), ReferenceData::us_cities().unwrap()).unwrap();
        let err = generator.run(&mut ShiftingSink).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::UnresolvedForeignKey { entity: "power_plants", id: 1, .. }
        ));
    }

    #[test]
    fn sink_failure_aborts() {
        let generator = GridDataGenerator::new(small_config(), ReferenceData::us_cities().unwrap()).unwrap();
        let err = generator.run(&mut FailingSink).unwrap_err();
        assert!(matches!(err, GenerationError::Sink(_)));
    }
}
