use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::core::sink::{RecordBatch, RecordSink};

/// Writes every entity to its own CSV file under a timestamped run directory.
///
/// Columns follow the field order of the record structs. Files are opened on
/// the first non-empty batch of their entity, so an entity that never
/// produced a row has no file.
pub struct CsvSink {
    output_dir: PathBuf,
    timestamp: String,
    writers: HashMap<&'static str, Writer<File>>,
    rows_written: HashMap<&'static str, usize>,
}

impl CsvSink {
    /// Creates `<output_dir>/<YYYYmmdd_HHMMSS>/`.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let full_path = output_dir.as_ref().join(&timestamp);
        std::fs::create_dir_all(&full_path)
            .with_context(|| format!("failed to create output directory {}", full_path.display()))?;

        Ok(Self {
            output_dir: full_path,
            timestamp,
            writers: HashMap::new(),
            rows_written: HashMap::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn rows_written(&self, entity: &str) -> usize {
        self.rows_written.get(entity).copied().unwrap_or(0)
    }

    fn writer(&mut self, entity: &'static str) -> Result<&mut Writer<File>> {
        if !self.writers.contains_key(entity) {
            let path = self.output_dir.join(format!("{}.csv", entity));
            let writer = Writer::from_path(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            self.writers.insert(entity, writer);
        }
        self.writers
            .get_mut(entity)
            .with_context(|| format!("no writer for {}", entity))
    }

    fn write_rows<T: Serialize>(&mut self, entity: &'static str, rows: &[T]) -> Result<()> {
        let writer = self.writer(entity)?;
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("failed to write {} row", entity))?;
        }
        *self.rows_written.entry(entity).or_default() += rows.len();
        Ok(())
    }
}

impl RecordSink for CsvSink {
    fn write_batch(&mut self, batch: RecordBatch<'_>) -> Result<Vec<u64>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let entity = batch.entity_name();
        match batch {
            RecordBatch::PowerPlants(rows) => self.write_rows(entity, rows)?,
            RecordBatch::TransmissionLines(rows) => self.write_rows(entity, rows)?,
            RecordBatch::Substations(rows) => self.write_rows(entity, rows)?,
            RecordBatch::LineSubstationLinks(rows) => self.write_rows(entity, rows)?,
            RecordBatch::DistributionNetworks(rows) => self.write_rows(entity, rows)?,
            RecordBatch::Customers(rows) => self.write_rows(entity, rows)?,
            RecordBatch::Meters(rows) => self.write_rows(entity, rows)?,
            RecordBatch::EnergyConsumption(rows) => self.write_rows(entity, rows)?,
            RecordBatch::Billing(rows) => self.write_rows(entity, rows)?,
            RecordBatch::Maintenance(rows) => self.write_rows(entity, rows)?,
            RecordBatch::AssetMaintenance(rows) => self.write_rows(entity, rows)?,
            RecordBatch::Outages(rows) => self.write_rows(entity, rows)?,
            RecordBatch::CustomerOutages(rows) => self.write_rows(entity, rows)?,
        }
        Ok(batch.ids())
    }

    fn finish(&mut self) -> Result<()> {
        for (entity, writer) in self.writers.iter_mut() {
            writer
                .flush()
                .with_context(|| format!("failed to flush {}.csv", entity))?;
        }
        info!(
            dir = %self.output_dir.display(),
            files = self.writers.len(),
            "CSV export complete"
        );
        Ok(())
    }
}
