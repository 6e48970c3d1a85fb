use chrono::NaiveDate;
use clap::Parser;

use crate::config::generation_config::GenerationConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Synthetic power-grid dataset generator", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "JSON generation config; missing fields use defaults")]
    config: Option<String>,

    #[arg(short, long, default_value = "output")]
    output_dir: String,

    #[arg(long, help = "JSON city/event table replacing the built-in US cities")]
    reference: Option<String>,

    #[arg(long, help = "Random seed for a reproducible dataset")]
    seed: Option<u64>,

    #[arg(long, help = "First simulated day (YYYY-MM-DD)")]
    start_date: Option<NaiveDate>,

    #[arg(long, help = "Last simulated day (YYYY-MM-DD), inclusive")]
    end_date: Option<NaiveDate>,

    #[arg(long)]
    plants: Option<usize>,

    #[arg(long)]
    lines: Option<usize>,

    #[arg(long)]
    substations: Option<usize>,

    #[arg(long)]
    networks: Option<usize>,

    #[arg(long)]
    customers: Option<usize>,

    #[arg(long)]
    meters: Option<usize>,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,

    #[arg(short, long, default_value_t = false, help = "Hide the progress bar and the summary")]
    quiet: bool,
}

impl Args {
    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// Overwrites the config with every value given on the command line.
    pub fn apply_overrides(&self, config: &mut GenerationConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(start) = self.start_date {
            config.start_date = start;
        }
        if let Some(end) = self.end_date {
            config.end_date = end;
        }

        let counts = [
            (self.plants, &mut config.num_plants),
            (self.lines, &mut config.num_lines),
            (self.substations, &mut config.num_substations),
            (self.networks, &mut config.num_networks),
            (self.customers, &mut config.num_customers),
            (self.meters, &mut config.num_meters),
        ];
        for (value, target) in counts {
            if let Some(value) = value {
                *target = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_config() {
        let args = Args::parse_from([
            "gridsynth",
            "--seed", "9",
            "--start-date", "2024-02-01",
            "--customers", "500",
            "--meters", "400",
        ]);
        let mut config = GenerationConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.seed, Some(9));
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(config.num_customers, 500);
        assert_eq!(config.num_meters, 400);
        assert_eq!(config.num_plants, GenerationConfig::default().num_plants);
        assert_eq!(args.output_dir(), "output");
        assert!(!args.quiet());
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Args::try_parse_from(["gridsynth", "--end-date", "2024-13-01"]).is_err());
    }
}
