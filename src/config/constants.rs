// Horizon defaults
pub const DEFAULT_START_YEAR: i32 = 2023;
pub const DEFAULT_END_YEAR: i32 = 2023;

// Entity counts used when no configuration file is given
pub const DEFAULT_NUM_PLANTS: usize = 10;
pub const DEFAULT_NUM_LINES: usize = 20;
pub const DEFAULT_NUM_SUBSTATIONS: usize = 30;
pub const DEFAULT_NUM_NETWORKS: usize = 50;
pub const DEFAULT_NUM_CUSTOMERS: usize = 10_000;
pub const DEFAULT_NUM_METERS: usize = 10_000;

// Power plants
pub const PLANT_MIN_CAPACITY_MW: f64 = 100.0;
pub const PLANT_MAX_CAPACITY_MW: f64 = 2000.0;
pub const PLANT_FUEL_TYPES: [&str; 6] = ["Coal", "Natural Gas", "Nuclear", "Hydroelectric", "Solar", "Wind"];

// Transmission lines
pub const LINE_VOLTAGES_KV: [f64; 5] = [69.0, 138.0, 230.0, 345.0, 500.0];
pub const LINE_MIN_LENGTH_KM: f64 = 10.0;
pub const LINE_MAX_LENGTH_KM: f64 = 300.0;
pub const MIN_SUBSTATIONS_PER_LINE: usize = 1;
pub const MAX_SUBSTATIONS_PER_LINE: usize = 3;

// Substations
pub const SUBSTATION_MIN_CAPACITY_MVA: f64 = 50.0;
pub const SUBSTATION_MAX_CAPACITY_MVA: f64 = 500.0;

// Distribution networks
pub const NETWORK_VOLTAGES_KV: [f64; 3] = [4.16, 13.8, 34.5];

// City size tiers (population thresholds)
pub const SMALL_CITY_POPULATION: u64 = 100_000;
pub const LARGE_CITY_POPULATION: u64 = 1_000_000;

// Per-tier multipliers applied once to a meter's base load
pub const SMALL_TIER_FACTOR: (f64, f64) = (0.8, 1.2);
pub const MEDIUM_TIER_FACTOR: (f64, f64) = (1.2, 1.6);
pub const LARGE_TIER_FACTOR: (f64, f64) = (1.6, 2.0);

// Meters
pub const METER_INSTALL_LOOKBACK_YEARS: u32 = 5;
pub const MAX_METER_INSTALL_LOOKBACK_YEARS: u32 = 100;

// Consumption shape
pub const MONTHLY_BASE_MIN_KWH: f64 = 200.0;
pub const MONTHLY_BASE_MAX_KWH: f64 = 1000.0;
pub const DAYS_PER_MONTH: f64 = 30.0;
pub const SEASONAL_AMPLITUDE: f64 = 0.5;
pub const SEASONAL_PHASE_DAYS: f64 = 15.0;
pub const DAYS_PER_YEAR: f64 = 365.0;
pub const TEMPERATURE_NOISE_STD_DEV: f64 = 0.1;
pub const WEEKDAY_FACTOR: f64 = 1.1;
pub const WEEKEND_FACTOR: f64 = 0.9;
pub const DAILY_JITTER_MIN: f64 = 0.9;
pub const DAILY_JITTER_MAX: f64 = 1.1;

// Billing
pub const BILLING_CYCLE_DAYS: u32 = 30;
pub const TARIFF_MIN: f64 = 0.10; // $/kWh
pub const TARIFF_MAX: f64 = 0.20;

// Maintenance and outages
pub const MAINTENANCE_DAILY_PROBABILITY: f64 = 0.10;
pub const OUTAGE_DAILY_PROBABILITY: f64 = 0.05;
pub const MAINTENANCE_MIN_COST: f64 = 1000.0;
pub const MAINTENANCE_MAX_COST: f64 = 10_000.0;
pub const OUTAGE_MIN_HOURS: f64 = 0.5;
pub const OUTAGE_MAX_HOURS: f64 = 8.0;
pub const MAX_AFFECTED_CUSTOMERS: usize = 1000;

pub const MAINTENANCE_ACTIVITIES: [&str; 5] = [
    "Scheduled maintenance on",
    "Inspection of",
    "Repair work on",
    "Vegetation clearing around",
    "Equipment upgrade on",
];
pub const OUTAGE_CAUSES: [&str; 5] = [
    "Equipment failure on",
    "Storm damage to",
    "Overload trip on",
    "Animal contact at",
    "Emergency shutdown of",
];
