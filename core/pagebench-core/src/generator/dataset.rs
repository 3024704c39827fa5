//! Seeded stream of synthetic customers, independent of the store.

use super::names;
use crate::config::GeneratorConfig;
use crate::error::PageResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Street + city pair. Unique in the store as `(street, city_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntheticAddress {
    pub street: String,
    pub city: String,
}

/// One customer with its addresses; `addresses[0]` is the primary address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticCustomer {
    pub name: String,
    pub addresses: Vec<SyntheticAddress>,
}

impl SyntheticCustomer {
    pub fn primary(&self) -> &SyntheticAddress {
        &self.addresses[0]
    }
}

/// Wall-clock seed for runs that do not pin one.
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Iterator over `customer_count` synthetic customers.
///
/// Guarantees, so the store never merges two generated rows:
/// - a customer's addresses are pairwise distinct, so its link count is exactly
///   the drawn `k`;
/// - no two customers share `(name, primary address)`.
pub struct SyntheticDataset {
    rng: StdRng,
    remaining: usize,
    min_addresses: usize,
    max_addresses: usize,
    /// Cities are drawn from a bounded pool so addresses and cities repeat
    /// across customers.
    city_pool: Vec<String>,
    seen: HashSet<(String, SyntheticAddress)>,
}

impl SyntheticDataset {
    pub fn new(config: &GeneratorConfig, seed: u64) -> PageResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        // roughly one city per 40 customers, never fewer than 8
        let pool_size = (config.customer_count / 40).max(8);
        let city_pool = (0..pool_size).map(|_| names::city_name(&mut rng)).collect();
        Ok(Self {
            rng,
            remaining: config.customer_count,
            min_addresses: config.min_addresses,
            max_addresses: config.max_addresses,
            city_pool,
            seen: HashSet::with_capacity(config.customer_count),
        })
    }

    fn address(&mut self) -> SyntheticAddress {
        let idx = self.rng.gen_range(0..self.city_pool.len());
        SyntheticAddress {
            street: names::street_address(&mut self.rng),
            city: self.city_pool[idx].clone(),
        }
    }
}

impl Iterator for SyntheticDataset {
    type Item = SyntheticCustomer;

    fn next(&mut self) -> Option<SyntheticCustomer> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let k = self.rng.gen_range(self.min_addresses..=self.max_addresses);
        let mut addresses: Vec<SyntheticAddress> = Vec::with_capacity(k);
        while addresses.len() < k {
            let address = self.address();
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }

        let mut name = names::company_name(&mut self.rng);
        while !self.seen.insert((name.clone(), addresses[0].clone())) {
            name = names::company_name(&mut self.rng);
        }

        Some(SyntheticCustomer { name, addresses })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SyntheticDataset {}
