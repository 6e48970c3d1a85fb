use std::collections::HashMap;
use std::fmt;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::constants::{
    LARGE_CITY_POPULATION, LARGE_TIER_FACTOR, MEDIUM_TIER_FACTOR, SMALL_CITY_POPULATION,
    SMALL_TIER_FACTOR,
};
use crate::core::error::{check_date_range, GenerationError, GenerationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub state: String,
    pub population: u64,
}

impl City {
    pub fn new(name: &str, state: &str, population: u64) -> Self {
        Self {
            name: name.to_string(),
            state: state.to_string(),
            population,
        }
    }

    pub fn size_tier(&self) -> SizeTier {
        SizeTier::from_population(self.population)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl SizeTier {
    pub fn from_population(population: u64) -> Self {
        if population < SMALL_CITY_POPULATION {
            SizeTier::Small
        } else if population < LARGE_CITY_POPULATION {
            SizeTier::Medium
        } else {
            SizeTier::Large
        }
    }

    /// Uniform range of the one-off multiplier applied to a meter's base load.
    pub fn consumption_factor_range(&self) -> (f64, f64) {
        match self {
            SizeTier::Small => SMALL_TIER_FACTOR,
            SizeTier::Medium => MEDIUM_TIER_FACTOR,
            SizeTier::Large => LARGE_TIER_FACTOR,
        }
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SizeTier::Small => write!(f, "small"),
            SizeTier::Medium => write!(f, "medium"),
            SizeTier::Large => write!(f, "large"),
        }
    }
}

/// A named date range that shifts demand by `effect` (0.3 means +30%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionEvent {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub effect: f64,
}

impl ConsumptionEvent {
    pub fn new(name: &str, start: NaiveDate, end: NaiveDate, effect: f64) -> GenerationResult<Self> {
        check_date_range(&format!("event '{}'", name), start, end)?;
        Ok(Self {
            name: name.to_string(),
            start,
            end,
            effect,
        })
    }

    /// Inclusive on both ends.
    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Immutable lookup tables shared by every generation stage.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    cities: Vec<City>,
    events: Vec<ConsumptionEvent>,
    city_index: HashMap<String, usize>,
    pub first_names: Vec<&'static str>,
    pub last_names: Vec<&'static str>,
    pub street_names: Vec<&'static str>,
}

impl ReferenceData {
    pub fn new(cities: Vec<City>, events: Vec<ConsumptionEvent>) -> GenerationResult<Self> {
        if cities.is_empty() {
            return Err(GenerationError::InvalidConfig("city table is empty".to_string()));
        }
        if cities.iter().all(|c| c.population == 0) {
            return Err(GenerationError::InvalidConfig(
                "city table has no population to weight by".to_string(),
            ));
        }
        for event in &events {
            check_date_range(&format!("event '{}'", event.name), event.start, event.end)?;
        }

        let city_index = cities
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        Ok(Self {
            cities,
            events,
            city_index,
            first_names: FIRST_NAMES.to_vec(),
            last_names: LAST_NAMES.to_vec(),
            street_names: STREET_NAMES.to_vec(),
        })
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn events(&self) -> &[ConsumptionEvent] {
        &self.events
    }

    pub fn city(&self, name: &str) -> Option<&City> {
        self.city_index.get(name).map(|&i| &self.cities[i])
    }

    pub fn state_of(&self, city: &str) -> Option<&str> {
        self.city(city).map(|c| c.state.as_str())
    }

    pub fn size_tier_of(&self, city: &str) -> Option<SizeTier> {
        self.city(city).map(City::size_tier)
    }

    pub fn total_population(&self) -> u64 {
        self.cities.iter().map(|c| c.population).sum()
    }

    /// Events whose range contains `date`.
    pub fn active_events(&self, date: NaiveDate) -> impl Iterator<Item = &ConsumptionEvent> {
        self.events.iter().filter(move |e| e.is_active(date))
    }

    /// `1 + Σ effect` over every active event. Overlaps accumulate additively.
    pub fn event_multiplier(&self, date: NaiveDate) -> f64 {
        1.0 + self.active_events(date).map(|e| e.effect).sum::<f64>()
    }

    /// Returns a copy with the event table replaced.
    pub fn with_events(&self, events: Vec<ConsumptionEvent>) -> GenerationResult<Self> {
        Self::new(self.cities.clone(), events)
    }

    pub fn us_cities() -> GenerationResult<Self> {
        Self::new(default_cities(), default_events())
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Only called with literal, known-valid dates.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

pub fn default_events() -> Vec<ConsumptionEvent> {
    vec![
        ConsumptionEvent { name: "COVID-19 Lockdowns".to_string(), start: ymd(2020, 3, 15), end: ymd(2020, 6, 30), effect: -0.2 },
        ConsumptionEvent { name: "Texas Winter Storm".to_string(), start: ymd(2021, 2, 13), end: ymd(2021, 2, 17), effect: 0.5 },
        ConsumptionEvent { name: "Summer Heatwave".to_string(), start: ymd(2021, 6, 15), end: ymd(2021, 9, 15), effect: 0.3 },
        ConsumptionEvent { name: "Energy Price Spike".to_string(), start: ymd(2022, 6, 1), end: ymd(2022, 8, 31), effect: -0.1 },
        ConsumptionEvent { name: "Economic Recession".to_string(), start: ymd(2023, 1, 1), end: ymd(2023, 12, 31), effect: -0.15 },
        ConsumptionEvent { name: "Olympic Games".to_string(), start: ymd(2024, 6, 1), end: ymd(2024, 8, 31), effect: 0.2 },
    ]
}

pub fn default_cities() -> Vec<City> {
    vec![
        City::new("New York City", "New York", 8_336_817),
        City::new("Los Angeles", "California", 3_898_747),
        City::new("Chicago", "Illinois", 2_746_388),
        City::new("Houston", "Texas", 2_304_580),
        City::new("Phoenix", "Arizona", 1_608_139),
        City::new("Philadelphia", "Pennsylvania", 1_603_797),
        City::new("San Antonio", "Texas", 1_434_625),
        City::new("San Diego", "California", 1_386_932),
        City::new("Dallas", "Texas", 1_304_379),
        City::new("San Jose", "California", 1_013_240),
        City::new("Austin", "Texas", 961_855),
        City::new("Jacksonville", "Florida", 911_507),
        City::new("Fort Worth", "Texas", 909_585),
        City::new("Columbus", "Ohio", 898_553),
        City::new("San Francisco", "California", 873_965),
        City::new("Charlotte", "North Carolina", 885_708),
        City::new("Indianapolis", "Indiana", 876_384),
        City::new("Seattle", "Washington", 753_675),
        City::new("Denver", "Colorado", 727_211),
        City::new("Washington", "District of Columbia", 689_545),
        City::new("Boston", "Massachusetts", 675_647),
        City::new("El Paso", "Texas", 681_728),
        City::new("Detroit", "Michigan", 639_111),
        City::new("Nashville", "Tennessee", 689_447),
        City::new("Portland", "Oregon", 641_162),
        City::new("Memphis", "Tennessee", 633_104),
        City::new("Oklahoma City", "Oklahoma", 649_021),
        City::new("Las Vegas", "Nevada", 651_319),
        City::new("Louisville", "Kentucky", 633_045),
        City::new("Baltimore", "Maryland", 585_708),
        City::new("Milwaukee", "Wisconsin", 577_222),
        City::new("Albuquerque", "New Mexico", 564_559),
        City::new("Tucson", "Arizona", 548_073),
        City::new("Fresno", "California", 542_107),
        City::new("Sacramento", "California", 513_624),
        City::new("Mesa", "Arizona", 504_258),
        City::new("Kansas City", "Missouri", 508_090),
        City::new("Atlanta", "Georgia", 498_715),
        City::new("Long Beach", "California", 466_742),
        City::new("Omaha", "Nebraska", 486_051),
        City::new("Raleigh", "North Carolina", 467_665),
        City::new("Colorado Springs", "Colorado", 478_221),
        City::new("Miami", "Florida", 442_241),
        City::new("Virginia Beach", "Virginia", 459_470),
        City::new("Oakland", "California", 440_646),
        City::new("Minneapolis", "Minnesota", 429_606),
        City::new("Tulsa", "Oklahoma", 413_066),
        City::new("Arlington", "Texas", 398_112),
        City::new("New Orleans", "Louisiana", 383_997),
        City::new("Wichita", "Kansas", 389_255),
    ]
}

const FIRST_NAMES: [&str; 24] = [
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda",
    "David", "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica",
    "Thomas", "Sarah", "Carlos", "Maria", "Wei", "Aisha", "Daniel", "Nancy",
];

const LAST_NAMES: [&str; 24] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas",
    "Taylor", "Moore", "Jackson", "Martin", "Lee", "Nguyen", "Clark", "Lewis",
];

const STREET_NAMES: [&str; 16] = [
    "Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Pine St", "Elm St", "Washington Blvd",
    "Lake Rd", "Hill St", "Park Ave", "River Rd", "Sunset Blvd", "Church St", "Highland Ave",
    "Mill Rd", "Forest Dr",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_tier_thresholds() {
        assert_eq!(SizeTier::from_population(99_999), SizeTier::Small);
        assert_eq!(SizeTier::from_population(100_000), SizeTier::Medium);
        assert_eq!(SizeTier::from_population(999_999), SizeTier::Medium);
        assert_eq!(SizeTier::from_population(1_000_000), SizeTier::Large);
    }

    #[test]
    fn default_tables_load() {
        let reference = ReferenceData::us_cities().unwrap();
        assert_eq!(reference.cities().len(), 50);
        assert_eq!(reference.events().len(), 6);
        assert_eq!(reference.state_of("Houston"), Some("Texas"));
        assert_eq!(reference.size_tier_of("New York City"), Some(SizeTier::Large));
        assert_eq!(reference.size_tier_of("Wichita"), Some(SizeTier::Medium));
        assert_eq!(reference.size_tier_of("Atlantis"), None);
    }

    #[test]
    fn overlapping_events_accumulate() {
        let day = ymd(2023, 7, 1);
        let events = vec![
            ConsumptionEvent::new("Heat", ymd(2023, 6, 1), ymd(2023, 7, 31), 0.3).unwrap(),
            ConsumptionEvent::new("Festival", ymd(2023, 7, 1), ymd(2023, 7, 1), 0.2).unwrap(),
            ConsumptionEvent::new("Later", ymd(2023, 8, 1), ymd(2023, 8, 2), 5.0).unwrap(),
        ];
        let reference = ReferenceData::new(default_cities(), events).unwrap();
        assert!((reference.event_multiplier(day) - 1.5).abs() < 1e-12);
        assert!((reference.event_multiplier(ymd(2023, 7, 2)) - 1.3).abs() < 1e-12);
        assert!((reference.event_multiplier(ymd(2023, 9, 1)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn event_range_is_inclusive() {
        let event = ConsumptionEvent::new("Storm", ymd(2021, 2, 13), ymd(2021, 2, 17), 0.5).unwrap();
        assert!(event.is_active(ymd(2021, 2, 13)));
        assert!(event.is_active(ymd(2021, 2, 17)));
        assert!(!event.is_active(ymd(2021, 2, 18)));
    }

    #[test]
    fn inverted_event_is_rejected() {
        let err = ConsumptionEvent::new("Backwards", ymd(2023, 5, 2), ymd(2023, 5, 1), 0.1).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidDateRange { .. }));

        let raw = ConsumptionEvent { name: "Raw".to_string(), start: ymd(2023, 5, 2), end: ymd(2023, 5, 1), effect: 0.1 };
        assert!(ReferenceData::new(default_cities(), vec![raw]).is_err());
    }

    #[test]
    fn empty_city_table_is_rejected() {
        assert!(ReferenceData::new(Vec::new(), Vec::new()).is_err());
    }
}
