use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use anyhow::{Context, Result};
use serde::Deserialize;

use super::reference::{default_events, City, ConsumptionEvent, ReferenceData};

/// On-disk layout of a custom reference table. `events` may be omitted,
/// in which case the built-in event list is used.
#[derive(Debug, Deserialize)]
pub struct ReferenceFile {
    pub cities: Vec<City>,
    #[serde(default)]
    pub events: Option<Vec<ConsumptionEvent>>,
}

pub fn load_reference_data(path: impl AsRef<Path>) -> Result<ReferenceData> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open reference data {}", path.display()))?;
    let reader = BufReader::new(file);
    let parsed: ReferenceFile = serde_json::from_reader(reader)
        .with_context(|| format!("failed to parse reference data {}", path.display()))?;

    tracing::info!(
        cities = parsed.cities.len(),
        custom_events = parsed.events.is_some(),
        "Loaded reference data from {}",
        path.display()
    );

    let events = parsed.events.unwrap_or_else(default_events);
    Ok(ReferenceData::new(parsed.cities, events)?)
}
