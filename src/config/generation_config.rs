use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::core::asset_graph::earliest_install_date;
use crate::core::error::{
    check_date_range, check_probability, check_range, GenerationError, GenerationResult,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub seed: Option<u64>,

    pub num_plants: usize,
    pub num_lines: usize,
    pub num_substations: usize,
    pub num_networks: usize,
    pub num_customers: usize,
    pub num_meters: usize,

    pub line_voltages: Vec<f64>,       // kV
    pub network_voltages: Vec<f64>,    // kV
    pub meter_install_lookback_years: u32,

    pub base_consumption_range: (f64, f64), // kWh per day
    pub apply_size_tier_scaling: bool,

    pub billing_cycle_days: u32,
    pub tariff_range: (f64, f64),       // $/kWh

    pub maintenance_probability: f64,   // per day
    pub outage_probability: f64,        // per day
    pub max_affected_customers: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(DEFAULT_START_YEAR, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(DEFAULT_END_YEAR, 12, 31).unwrap_or_default(),
            seed: None,
            num_plants: DEFAULT_NUM_PLANTS,
            num_lines: DEFAULT_NUM_LINES,
            num_substations: DEFAULT_NUM_SUBSTATIONS,
            num_networks: DEFAULT_NUM_NETWORKS,
            num_customers: DEFAULT_NUM_CUSTOMERS,
            num_meters: DEFAULT_NUM_METERS,
            line_voltages: LINE_VOLTAGES_KV.to_vec(),
            network_voltages: NETWORK_VOLTAGES_KV.to_vec(),
            meter_install_lookback_years: METER_INSTALL_LOOKBACK_YEARS,
            base_consumption_range: (
                MONTHLY_BASE_MIN_KWH / DAYS_PER_MONTH,
                MONTHLY_BASE_MAX_KWH / DAYS_PER_MONTH,
            ),
            apply_size_tier_scaling: true,
            billing_cycle_days: BILLING_CYCLE_DAYS,
            tariff_range: (TARIFF_MIN, TARIFF_MAX),
            maintenance_probability: MAINTENANCE_DAILY_PROBABILITY,
            outage_probability: OUTAGE_DAILY_PROBABILITY,
            max_affected_customers: MAX_AFFECTED_CUSTOMERS,
        }
    }
}

impl GenerationConfig {
    /// Reads a JSON config. Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("failed to write config {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Number of simulated days, both ends included.
    pub fn horizon_days(&self) -> u64 {
        let days = (self.end_date - self.start_date).num_days();
        if days < 0 { 0 } else { days as u64 + 1 }
    }

    pub fn validate(&self) -> GenerationResult<()> {
        check_date_range("simulation horizon", self.start_date, self.end_date)?;
        // Outages on the last day may run into the next one.
        if self.end_date.succ_opt().is_none() {
            return Err(GenerationError::InvalidConfig(format!(
                "end_date {} leaves no room for outages running past midnight",
                self.end_date
            )));
        }
        earliest_install_date(self.start_date, self.meter_install_lookback_years)?;

        for (name, count) in [
            ("num_plants", self.num_plants),
            ("num_lines", self.num_lines),
            ("num_substations", self.num_substations),
            ("num_networks", self.num_networks),
        ] {
            if count == 0 {
                return Err(GenerationError::InvalidConfig(format!("{} must be positive", name)));
            }
        }
        if self.num_meters > self.num_customers {
            return Err(GenerationError::InvalidConfig(format!(
                "num_meters ({}) exceeds num_customers ({}); each meter needs its own customer",
                self.num_meters, self.num_customers
            )));
        }
        if self.line_voltages.is_empty() || self.network_voltages.is_empty() {
            return Err(GenerationError::InvalidConfig("voltage sets must not be empty".to_string()));
        }
        if self.line_voltages.iter().chain(&self.network_voltages).any(|v| *v <= 0.0) {
            return Err(GenerationError::InvalidConfig("voltages must be positive".to_string()));
        }
        if self.billing_cycle_days == 0 {
            return Err(GenerationError::InvalidConfig("billing_cycle_days must be positive".to_string()));
        }

        check_range("base_consumption", self.base_consumption_range)?;
        if self.base_consumption_range.0 < 0.0 {
            return Err(GenerationError::InvalidConfig("base consumption must not be negative".to_string()));
        }
        check_range("tariff", self.tariff_range)?;
        if self.tariff_range.0 < 0.0 {
            return Err(GenerationError::InvalidConfig("tariff must not be negative".to_string()));
        }
        check_probability("maintenance", self.maintenance_probability)?;
        check_probability("outage", self.outage_probability)?;
        if self.max_affected_customers == 0 {
            return Err(GenerationError::InvalidConfig("max_affected_customers must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GenerationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.horizon_days(), 365);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let config = GenerationConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            ..GenerationConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidDateRange { .. })));
    }

    #[test]
    fn dates_at_the_calendar_edges_are_rejected() {
        let config = GenerationConfig {
            start_date: NaiveDate::MAX,
            end_date: NaiveDate::MAX,
            ..GenerationConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidConfig(_))));

        let config = GenerationConfig {
            start_date: NaiveDate::MIN,
            end_date: NaiveDate::MIN,
            ..GenerationConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidConfig(_))));
    }

    #[test]
    fn oversized_meter_lookback_is_rejected() {
        let config = GenerationConfig {
            meter_install_lookback_years: u32::MAX,
            ..GenerationConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidConfig(_))));

        let config = GenerationConfig {
            meter_install_lookback_years: MAX_METER_INSTALL_LOOKBACK_YEARS,
            ..GenerationConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn more_meters_than_customers_is_rejected() {
        let config = GenerationConfig {
            num_customers: 10,
            num_meters: 11,
            ..GenerationConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenerationError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"num_plants": 3, "seed": 7, "start_date": "2022-06-01"}"#).unwrap();
        assert_eq!(config.num_plants, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());
        assert_eq!(config.num_lines, DEFAULT_NUM_LINES);
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = GenerationConfig { num_customers: 42, num_meters: 40, ..GenerationConfig::default() };
        config.save(&path).unwrap();
        assert_eq!(GenerationConfig::load(&path).unwrap(), config);
    }
}
