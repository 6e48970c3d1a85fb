use std::collections::BTreeMap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::core::error::{GenerationError, GenerationResult};
use crate::data::reference::ReferenceData;
use crate::models::grid::{Customer, DistributionNetwork};
use crate::models::ids::{CustomerId, IdSequence};
use crate::utils::logging::{self, OperationCategory};

/// Assigns customers to networks so that each city receives customers in
/// proportion to its population.
///
/// When the population-weighted draw lands on a city that has no network,
/// the city is redrawn uniformly among cities that do. That fallback draw
/// ignores population, so the proportionality only holds for cities that
/// are served by at least one network.
pub struct CustomerAssigner<'a> {
    reference: &'a ReferenceData,
    weights: WeightedIndex<u64>,
    customer_ids: IdSequence<CustomerId>,
    fallback_draws: usize,
}

impl<'a> CustomerAssigner<'a> {
    pub fn new(reference: &'a ReferenceData) -> GenerationResult<Self> {
        let weights = WeightedIndex::new(reference.cities().iter().map(|c| c.population))
            .map_err(|e| GenerationError::InvalidConfig(format!("city population weights: {}", e)))?;
        Ok(Self {
            reference,
            weights,
            customer_ids: IdSequence::new(),
            fallback_draws: 0,
        })
    }

    /// How many draws so far had to fall back to an unweighted city.
    pub fn fallback_draws(&self) -> usize {
        self.fallback_draws
    }

    pub fn assign<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        n: usize,
        networks: &[DistributionNetwork],
    ) -> GenerationResult<Vec<Customer>> {
        let _timing = logging::start_timing("assign_customers", OperationCategory::CustomerAssignment);
        if n > 0 && networks.is_empty() {
            return Err(GenerationError::EmptyParentPopulation {
                entity: "customer",
                parent: "distribution network",
            });
        }

        // BTreeMap keeps the fallback order stable for a given seed.
        let mut city_networks: BTreeMap<&str, Vec<&DistributionNetwork>> = BTreeMap::new();
        for network in networks {
            city_networks.entry(network.location.as_str()).or_default().push(network);
        }
        let served_cities: Vec<&str> = city_networks.keys().copied().collect();

        let mut customers = Vec::with_capacity(n);
        let fallback_before = self.fallback_draws;
        for _ in 0..n {
            let drawn = &self.reference.cities()[self.weights.sample(rng)];
            let city = if city_networks.contains_key(drawn.name.as_str()) {
                drawn.name.as_str()
            } else {
                self.fallback_draws += 1;
                *served_cities.choose(rng).ok_or(GenerationError::EmptyParentPopulation {
                    entity: "customer",
                    parent: "distribution network",
                })?
            };

            let network = city_networks
                .get(city)
                .and_then(|candidates| candidates.choose(rng))
                .ok_or(GenerationError::EmptyParentPopulation {
                    entity: "customer",
                    parent: "distribution network",
                })?;

            customers.push(Customer {
                customer_id: self.customer_ids.next_id(),
                customer_name: self.random_name(rng),
                address: self.random_address(rng, city),
                network_id: network.network_id,
                city: city.to_string(),
            });
        }

        debug!(
            count = customers.len(),
            fallback = self.fallback_draws - fallback_before,
            served_cities = served_cities.len(),
            "Assigned customers to networks"
        );
        Ok(customers)
    }

    fn random_name<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let first = self.reference.first_names.choose(rng).copied().unwrap_or("Alex");
        let last = self.reference.last_names.choose(rng).copied().unwrap_or("Doe");
        format!("{} {}", first, last)
    }

    fn random_address<R: Rng + ?Sized>(&self, rng: &mut R, city: &str) -> String {
        let number = rng.gen_range(1..10_000);
        let street = self.reference.street_names.choose(rng).copied().unwrap_or("Main St");
        let state = self.reference.state_of(city).unwrap_or("Unknown");
        let zip = rng.gen_range(10_000..100_000);
        format!("{} {}, {}, {} {:05}", number, street, city, state, zip)
    }
}
