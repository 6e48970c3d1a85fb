use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use gridsynth::core::consumption::ConsumptionSynthesizer;
use gridsynth::data::reference::ConsumptionEvent;
use gridsynth::models::ids::CustomerId;
use gridsynth::{GenerationConfig, GridDataGenerator, MemorySink, ReferenceData};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn scenario_config() -> GenerationConfig {
    GenerationConfig {
        start_date: date(2023, 1, 1),
        end_date: date(2023, 1, 30),
        seed: Some(2023),
        num_plants: 5,
        num_lines: 10,
        num_substations: 15,
        num_networks: 20,
        num_customers: 1000,
        num_meters: 1000,
        ..GenerationConfig::default()
    }
}

fn scenario_reference() -> ReferenceData {
    let event = ConsumptionEvent::new("Cold Snap", date(2023, 1, 10), date(2023, 1, 20), 0.3).unwrap();
    ReferenceData::us_cities().unwrap().with_events(vec![event]).unwrap()
}

fn run_scenario() -> (MemorySink, ReferenceData) {
    let reference = scenario_reference();
    let generator = GridDataGenerator::new(scenario_config(), reference.clone()).unwrap();
    let mut sink = MemorySink::new();
    generator.run(&mut sink).unwrap();
    (sink, reference)
}

fn mean_kwh_for_days(sink: &MemorySink, days: std::ops::RangeInclusive<u32>) -> f64 {
    let rows: Vec<f64> = sink
        .energy_consumption
        .iter()
        .filter(|r| days.contains(&r.reading_date.day()))
        .map(|r| r.consumption_kwh)
        .collect();
    rows.iter().sum::<f64>() / rows.len() as f64
}

#[test]
fn every_foreign_key_resolves() {
    let (sink, _) = run_scenario();

    let plants: HashSet<_> = sink.power_plants.iter().map(|p| p.plant_id).collect();
    let lines: HashSet<_> = sink.transmission_lines.iter().map(|l| l.line_id).collect();
    let substations: HashSet<_> = sink.substations.iter().map(|s| s.substation_id).collect();
    let networks: HashSet<_> = sink.distribution_networks.iter().map(|n| n.network_id).collect();
    let customers: HashSet<_> = sink.customers.iter().map(|c| c.customer_id).collect();
    let meters: HashSet<_> = sink.meters.iter().map(|m| m.meter_id).collect();

    assert_eq!(plants.len(), 5);
    assert_eq!(lines.len(), 10);
    assert_eq!(substations.len(), 15);
    assert_eq!(networks.len(), 20);
    assert_eq!(customers.len(), 1000);

    assert!(sink.transmission_lines.iter().all(|l| plants.contains(&l.plant_id)));
    assert!(sink
        .line_substation_links
        .iter()
        .all(|l| lines.contains(&l.line_id) && substations.contains(&l.substation_id)));
    assert!(sink.distribution_networks.iter().all(|n| substations.contains(&n.substation_id)));
    assert!(sink.customers.iter().all(|c| networks.contains(&c.network_id)));
    let network_city: HashMap<_, _> = sink
        .distribution_networks
        .iter()
        .map(|n| (n.network_id, n.location.as_str()))
        .collect();
    assert!(sink.customers.iter().all(|c| network_city[&c.network_id] == c.city));
    assert!(sink.energy_consumption.iter().all(|r| meters.contains(&r.meter_id)));
    assert!(sink.billing.iter().all(|b| customers.contains(&b.customer_id)));
    assert!(sink.customer_outages.iter().all(|co| customers.contains(&co.customer_id)));
}

#[test]
fn every_customer_has_exactly_one_meter() {
    let (sink, _) = run_scenario();

    let mut meters_per_customer: HashMap<CustomerId, usize> = HashMap::new();
    for meter in &sink.meters {
        *meters_per_customer.entry(meter.customer_id).or_default() += 1;
    }
    assert_eq!(meters_per_customer.len(), sink.customers.len());
    assert!(meters_per_customer.values().all(|&n| n == 1));
    assert!(sink.meters.iter().all(|m| m.installation_date <= date(2023, 1, 1)));
}

#[test]
fn readings_cover_every_meter_day_and_are_never_negative() {
    let (sink, _) = run_scenario();

    assert_eq!(sink.energy_consumption.len(), 1000 * 30);
    assert!(sink.energy_consumption.iter().all(|r| r.consumption_kwh >= 0.0));
    let ids: HashSet<_> = sink.energy_consumption.iter().map(|r| r.consumption_id).collect();
    assert_eq!(ids.len(), sink.energy_consumption.len());
}

#[test]
fn event_lifts_consumption_on_top_of_seasonal_drift() {
    let (sink, reference) = run_scenario();

    let before = mean_kwh_for_days(&sink, 1..=9);
    let during = mean_kwh_for_days(&sink, 10..=20);
    let observed = during / before;
    assert!(observed > 1.0, "event window mean {:.3} not above {:.3}", during, before);

    // Deterministic shape (season, weekday, event) averaged over each window.
    let synthesizer = ConsumptionSynthesizer::new(&reference).unwrap();
    let no_events = reference.with_events(Vec::new()).unwrap();
    let baseline = ConsumptionSynthesizer::new(&no_events).unwrap();
    let window_mean = |s: &ConsumptionSynthesizer, days: std::ops::RangeInclusive<u32>| {
        let factors: Vec<f64> = days.map(|d| s.expected_factor(date(2023, 1, d))).collect();
        factors.iter().sum::<f64>() / factors.len() as f64
    };

    let expected = window_mean(&synthesizer, 10..=20) / window_mean(&synthesizer, 1..=9);
    let drift_only = window_mean(&baseline, 10..=20) / window_mean(&baseline, 1..=9);

    assert!(
        (observed / expected - 1.0).abs() < 0.03,
        "observed ratio {:.3}, expected {:.3}",
        observed,
        expected
    );
    let event_lift = observed / drift_only;
    assert!(
        (1.25..=1.35).contains(&event_lift),
        "lift beyond seasonal drift {:.3}",
        event_lift
    );
}

#[test]
fn bills_match_consumption_times_tariff() {
    let (sink, _) = run_scenario();

    let meter_owner: HashMap<_, _> = sink.meters.iter().map(|m| (m.meter_id, m.customer_id)).collect();
    let mut kwh_per_customer: HashMap<CustomerId, f64> = HashMap::new();
    for reading in &sink.energy_consumption {
        *kwh_per_customer.entry(meter_owner[&reading.meter_id]).or_default() += reading.consumption_kwh;
    }

    // A 30-day horizon is exactly one billing period.
    assert_eq!(sink.billing.len(), 1000);
    for bill in &sink.billing {
        let total = kwh_per_customer[&bill.customer_id];
        assert!((bill.total_kwh - total).abs() < 1e-6 * total.max(1.0));
        assert!((bill.amount - total * bill.tariff_rate).abs() < 1e-6 * bill.amount.max(1.0));
        assert!(bill.amount >= total * 0.10 - 1e-9 && bill.amount <= total * 0.20 + 1e-9);
        assert_eq!(bill.billing_date, date(2023, 1, 30));
    }
}

#[test]
fn maintenance_and_outages_reference_existing_assets() {
    let (sink, _) = run_scenario();

    let maintenance_ids: HashSet<_> = sink.maintenance.iter().map(|m| m.maintenance_id).collect();
    assert_eq!(sink.asset_maintenance.len(), sink.maintenance.len());
    assert!(sink.asset_maintenance.iter().all(|am| maintenance_ids.contains(&am.maintenance_id)));

    let outage_ids: HashSet<_> = sink.outages.iter().map(|o| o.outage_id).collect();
    assert!(sink.customer_outages.iter().all(|co| outage_ids.contains(&co.outage_id)));
    for outage in &sink.outages {
        assert!(outage.end_time > outage.start_time);
        assert!(outage.start_time.date() >= date(2023, 1, 1) && outage.start_time.date() <= date(2023, 1, 30));
    }
}
