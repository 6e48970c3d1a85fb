use std::collections::HashMap;
use std::f64::consts::PI;
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::constants::*;
use crate::core::error::{GenerationError, GenerationResult};
use crate::data::reference::ReferenceData;
use crate::models::grid::{Customer, DistributionNetwork, Meter};
use crate::models::ids::{ConsumptionId, CustomerId, IdSequence, MeterId};
use crate::models::records::EnergyConsumption;

/// Smooth double-sinusoid demand shape: an annual wave plus a half-year
/// harmonic, both phased from mid-January. Ranges over roughly [0.35, 1.65].
pub fn seasonal_shape(day_of_year: u32) -> f64 {
    let phase = (f64::from(day_of_year) - SEASONAL_PHASE_DAYS) / DAYS_PER_YEAR;
    1.0 + SEASONAL_AMPLITUDE * ((2.0 * PI * phase).sin() + 0.5 * (4.0 * PI * phase).sin())
}

/// 1.1 Monday to Friday, 0.9 on weekends.
pub fn weekday_factor(date: NaiveDate) -> f64 {
    if date.weekday().num_days_from_monday() < 5 {
        WEEKDAY_FACTOR
    } else {
        WEEKEND_FACTOR
    }
}

/// Per-meter load parameters fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterProfile {
    pub meter_id: MeterId,
    pub customer_id: CustomerId,
    pub base_daily_kwh: f64,
}

/// Draws each meter's base daily load and, if enabled, scales it once by
/// the size tier of the city its customer lives in.
pub fn build_meter_profiles<R: Rng + ?Sized>(
    rng: &mut R,
    meters: &[Meter],
    customers: &[Customer],
    networks: &[DistributionNetwork],
    reference: &ReferenceData,
    base_range: (f64, f64),
    apply_size_tier_scaling: bool,
) -> GenerationResult<Vec<MeterProfile>> {
    let customer_city: HashMap<CustomerId, &str> = customers
        .iter()
        .map(|c| (c.customer_id, c.city.as_str()))
        .collect();
    let network_city: HashMap<_, &str> = networks
        .iter()
        .map(|n| (n.network_id, n.location.as_str()))
        .collect();
    let customer_network: HashMap<CustomerId, _> = customers
        .iter()
        .map(|c| (c.customer_id, c.network_id))
        .collect();

    meters
        .iter()
        .map(|meter| {
            let network_id = customer_network.get(&meter.customer_id).ok_or(
                GenerationError::UnresolvedForeignKey {
                    entity: "meter",
                    parent: "customer",
                    id: meter.customer_id.get(),
                },
            )?;
            let city = network_city
                .get(network_id)
                .or_else(|| customer_city.get(&meter.customer_id))
                .copied()
                .unwrap_or_default();

            let mut base = rng.gen_range(base_range.0..=base_range.1);
            if apply_size_tier_scaling {
                if let Some(tier) = reference.size_tier_of(city) {
                    let (low, high) = tier.consumption_factor_range();
                    base *= rng.gen_range(low..=high);
                }
            }

            Ok(MeterProfile {
                meter_id: meter.meter_id,
                customer_id: meter.customer_id,
                base_daily_kwh: base,
            })
        })
        .collect()
}

/// Produces one daily reading per meter from the base load, modulated by
/// season, day of week, random jitter and active events.
pub struct ConsumptionSynthesizer<'a> {
    reference: &'a ReferenceData,
    temperature_noise: Normal<f64>,
    consumption_ids: IdSequence<ConsumptionId>,
}

impl<'a> ConsumptionSynthesizer<'a> {
    pub fn new(reference: &'a ReferenceData) -> GenerationResult<Self> {
        let temperature_noise = Normal::new(0.0, TEMPERATURE_NOISE_STD_DEV)
            .map_err(|e| GenerationError::InvalidConfig(format!("temperature noise: {}", e)))?;
        Ok(Self {
            reference,
            temperature_noise,
            consumption_ids: IdSequence::new(),
        })
    }

    /// Deterministic part of the multiplier for `date`, without noise.
    pub fn expected_factor(&self, date: NaiveDate) -> f64 {
        seasonal_shape(date.ordinal()) * weekday_factor(date) * self.reference.event_multiplier(date)
    }

    /// Consumption in kWh for one meter on one day; never negative.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        _meter_id: MeterId,
        date: NaiveDate,
        base_daily_consumption: f64,
    ) -> f64 {
        let seasonal = seasonal_shape(date.ordinal()) + self.temperature_noise.sample(rng);
        let weekday = weekday_factor(date);
        let daily_jitter = rng.gen_range(DAILY_JITTER_MIN..=DAILY_JITTER_MAX);
        let event_mult = self.reference.event_multiplier(date);

        (base_daily_consumption * seasonal * weekday * daily_jitter * event_mult).max(0.0)
    }

    /// One reading per profile for `date`, with fresh consumption ids.
    pub fn readings_for_day<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        profiles: &[MeterProfile],
        date: NaiveDate,
    ) -> Vec<EnergyConsumption> {
        let mut readings = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let consumption_kwh = self.synthesize(rng, profile.meter_id, date, profile.base_daily_kwh);
            readings.push(EnergyConsumption {
                consumption_id: self.consumption_ids.next_id(),
                meter_id: profile.meter_id,
                reading_date: date,
                consumption_kwh,
            });
        }
        readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::data::reference::{default_cities, ConsumptionEvent};
    use crate::models::grid::MeterType;
    use crate::models::ids::{NetworkId, SubstationId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn no_events() -> ReferenceData {
        ReferenceData::new(default_cities(), Vec::new()).unwrap()
    }

    fn mean_over<R: Rng>(synth: &ConsumptionSynthesizer, rng: &mut R, day: NaiveDate, n: usize) -> f64 {
        (0..n).map(|_| synth.synthesize(rng, MeterId(1), day, 10.0)).sum::<f64>() / n as f64
    }

    #[test]
    fn seasonal_shape_matches_formula() {
        assert!((seasonal_shape(15) - 1.0).abs() < 1e-12);
        let doy = 100.0_f64;
        let phase = (doy - 15.0) / 365.0;
        let expected = 1.0 + 0.5 * ((2.0 * PI * phase).sin() + 0.5 * (4.0 * PI * phase).sin());
        assert!((seasonal_shape(100) - expected).abs() < 1e-12);
    }

    #[test]
    fn seasonal_extremes() {
        let by_value = |a: &u32, b: &u32| seasonal_shape(*a).total_cmp(&seasonal_shape(*b));
        let peak = (1..=365).max_by(by_value).unwrap();
        let trough = (1..=365).min_by(by_value).unwrap();
        assert_eq!(peak, 76);
        assert_eq!(trough, 319);
        assert!((seasonal_shape(peak) - 1.6495).abs() < 1e-3);
        assert!((seasonal_shape(trough) - 0.3505).abs() < 1e-3);
    }

    #[test]
    fn weekday_factor_by_day() {
        // 2023-01-02 was a Monday.
        assert_eq!(weekday_factor(date(2023, 1, 2)), WEEKDAY_FACTOR);
        assert_eq!(weekday_factor(date(2023, 1, 6)), WEEKDAY_FACTOR);
        assert_eq!(weekday_factor(date(2023, 1, 7)), WEEKEND_FACTOR);
        assert_eq!(weekday_factor(date(2023, 1, 8)), WEEKEND_FACTOR);
    }

    #[test]
    fn weekday_mean_exceeds_weekend_mean() {
        let reference = no_events();
        let synth = ConsumptionSynthesizer::new(&reference).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        // Friday and Saturday have nearly the same seasonal term.
        let friday = mean_over(&synth, &mut rng, date(2023, 3, 10), 5_000);
        let saturday = mean_over(&synth, &mut rng, date(2023, 3, 11), 5_000);
        assert!(friday > saturday * 1.1, "friday {} saturday {}", friday, saturday);
    }

    #[test]
    fn consumption_is_never_negative() {
        let day = date(2023, 2, 1);
        let events = vec![ConsumptionEvent::new("Blackout", day, day, -3.0).unwrap()];
        let reference = ReferenceData::new(default_cities(), events).unwrap();
        let synth = ConsumptionSynthesizer::new(&reference).unwrap();
        let mut rng = StdRng::seed_from_u64(22);
        for _ in 0..1_000 {
            assert_eq!(synth.synthesize(&mut rng, MeterId(1), day, 25.0), 0.0);
        }

        let plain = no_events();
        let synth = ConsumptionSynthesizer::new(&plain).unwrap();
        for ordinal in 1..=365 {
            let day = NaiveDate::from_yo_opt(2023, ordinal).unwrap();
            assert!(synth.synthesize(&mut rng, MeterId(1), day, 25.0) >= 0.0);
        }
    }

    #[test]
    fn event_raises_expected_consumption() {
        let day = date(2023, 7, 12);
        let events = vec![ConsumptionEvent::new("Heatwave", date(2023, 7, 10), date(2023, 7, 20), 0.3).unwrap()];
        let with_event = ReferenceData::new(default_cities(), events).unwrap();
        let without = no_events();

        let boosted = ConsumptionSynthesizer::new(&with_event).unwrap().expected_factor(day);
        let plain = ConsumptionSynthesizer::new(&without).unwrap().expected_factor(day);
        assert!((boosted / plain - 1.3).abs() < 1e-12);
    }

    #[test]
    fn readings_get_sequential_ids() {
        let reference = no_events();
        let mut synth = ConsumptionSynthesizer::new(&reference).unwrap();
        let mut rng = StdRng::seed_from_u64(23);
        let profiles = [
            MeterProfile { meter_id: MeterId(1), customer_id: CustomerId(1), base_daily_kwh: 10.0 },
            MeterProfile { meter_id: MeterId(2), customer_id: CustomerId(2), base_daily_kwh: 20.0 },
        ];
        let day1 = synth.readings_for_day(&mut rng, &profiles, date(2023, 1, 1));
        let day2 = synth.readings_for_day(&mut rng, &profiles, date(2023, 1, 2));
        let ids: Vec<u64> = day1.iter().chain(&day2).map(|r| r.consumption_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(day2[1].meter_id, MeterId(2));
    }

    #[test]
    fn size_tier_scales_base_load() {
        let reference = no_events();
        let mut rng = StdRng::seed_from_u64(24);
        let networks = vec![
            DistributionNetwork { network_id: NetworkId(1), network_name: "N1".into(), voltage_kv: 13.8, substation_id: SubstationId(1), location: "New York City".into() },
            DistributionNetwork { network_id: NetworkId(2), network_name: "N2".into(), voltage_kv: 13.8, substation_id: SubstationId(1), location: "Wichita".into() },
        ];
        let customers: Vec<Customer> = (1..=2)
            .map(|i| Customer {
                customer_id: CustomerId(i),
                customer_name: String::new(),
                address: String::new(),
                network_id: NetworkId(i),
                city: networks[i as usize - 1].location.clone(),
            })
            .collect();
        let meters: Vec<Meter> = (1..=2)
            .map(|i| Meter { meter_id: MeterId(i), meter_type: MeterType::Smart, installation_date: date(2020, 1, 1), customer_id: CustomerId(i) })
            .collect();

        let profiles = build_meter_profiles(&mut rng, &meters, &customers, &networks, &reference, (10.0, 10.0), true).unwrap();
        // Large city factor is in [1.6, 2.0], medium in [1.2, 1.6].
        assert!(profiles[0].base_daily_kwh >= 16.0 && profiles[0].base_daily_kwh <= 20.0);
        assert!(profiles[1].base_daily_kwh >= 12.0 && profiles[1].base_daily_kwh <= 16.0);

        let flat = build_meter_profiles(&mut rng, &meters, &customers, &networks, &reference, (10.0, 10.0), false).unwrap();
        assert!(flat.iter().all(|p| p.base_daily_kwh == 10.0));
    }
}
