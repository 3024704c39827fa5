//! Synthetic dataset generator
//!
//! Streams [`SyntheticDataset`] into the store inside one transaction with
//! foreign keys deferred to commit, then compacts the store.
//!
//! 1. `begin` + `set constraints all deferred`
//! 2. per customer: upsert city → upsert address → upsert customer (first
//!    address) → link
//! 3. `commit` (deferred checks run here; any failure rolls everything back)
//! 4. `vacuum (full, analyze)` and report table counts

pub mod dataset;
pub mod names;

pub use dataset::{SyntheticAddress, SyntheticCustomer, SyntheticDataset, clock_seed};

use crate::config::GeneratorConfig;
use crate::error::{PageError, PageResult};
use crate::store::{Store, TableCounts, shape, with_transaction};
use postgres::types::Type;
use postgres::{Statement, Transaction};
use std::time::Instant;
use tracing::{debug, info};

const UPSERT_CITY: &str = "
    insert into example.cities (name) values ($1)
    on conflict (name) do update set name = excluded.name
    returning city_id";

const UPSERT_ADDRESS: &str = "
    insert into example.addresses (street, city_id) values ($1, $2)
    on conflict (street, city_id) do update set street = excluded.street
    returning address_id";

const UPSERT_CUSTOMER: &str = "
    insert into example.customers (name, address_id) values ($1, $2)
    on conflict (name, address_id) do update set name = excluded.name
    returning customer_id";

const LINK_ADDRESS: &str = "
    insert into example.customer_addresses (customer_id, address_id) values ($1, $2)
    on conflict do nothing";

const PROGRESS_EVERY: usize = 1_000;

/// Upsert statements prepared once per generation transaction.
struct Upserts {
    city: Statement,
    address: Statement,
    customer: Statement,
    link: Statement,
}

impl Upserts {
    fn prepare(tx: &mut Transaction<'_>) -> PageResult<Self> {
        fn prepare(tx: &mut Transaction<'_>, sql: &str, types: &[Type]) -> PageResult<Statement> {
            tx.prepare_typed(sql, types)
                .map_err(|e| PageError::query(e, "prepare upsert"))
        }
        Ok(Self {
            city: prepare(tx, UPSERT_CITY, &[Type::TEXT])?,
            address: prepare(tx, UPSERT_ADDRESS, &[Type::TEXT, Type::INT4])?,
            customer: prepare(tx, UPSERT_CUSTOMER, &[Type::TEXT, Type::INT4])?,
            link: prepare(tx, LINK_ADDRESS, &[Type::INT4, Type::INT4])?,
        })
    }

    fn returning_id(
        tx: &mut Transaction<'_>,
        statement: &Statement,
        params: &[&(dyn postgres::types::ToSql + Sync)],
        what: &'static str,
    ) -> PageResult<i32> {
        let row = tx
            .query_one(statement, params)
            .map_err(|e| PageError::query(e, what))?;
        row.try_get(0).map_err(shape(what))
    }

    /// Writes one customer; returns its identity.
    fn load(&self, tx: &mut Transaction<'_>, customer: &SyntheticCustomer) -> PageResult<i32> {
        let mut customer_id = None;
        for address in &customer.addresses {
            let city_id = Self::returning_id(tx, &self.city, &[&address.city], "upsert city")?;
            let address_id = Self::returning_id(
                tx,
                &self.address,
                &[&address.street, &city_id],
                "upsert address",
            )?;

            let id = match customer_id {
                Some(id) => id,
                None => {
                    let id = Self::returning_id(
                        tx,
                        &self.customer,
                        &[&customer.name, &address_id],
                        "upsert customer",
                    )?;
                    customer_id = Some(id);
                    id
                }
            };

            tx.execute(&self.link, &[&id, &address_id])
                .map_err(|e| PageError::query(e, "link address"))?;
        }
        customer_id.ok_or_else(|| {
            PageError::InvalidArguments(format!("customer '{}' has no addresses", customer.name))
        })
    }
}

/// Populates the store with a seeded synthetic dataset.
pub struct DataGenerator {
    config: GeneratorConfig,
    seed: u64,
}

impl DataGenerator {
    pub fn new(config: GeneratorConfig) -> PageResult<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        Ok(Self { config, seed })
    }

    /// Seed actually used; log it to reproduce a wall-clock-seeded run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The customers this generator writes, without touching the store.
    pub fn dataset(&self) -> PageResult<SyntheticDataset> {
        SyntheticDataset::new(&self.config, self.seed)
    }

    /// Generates, commits, compacts and returns the resulting table counts.
    ///
    /// All-or-nothing: any failure (including deferred constraint checks at
    /// commit) rolls back the whole run.
    pub fn generate(&self, store: &mut Store) -> PageResult<TableCounts> {
        info!(
            customers = self.config.customer_count,
            min_addresses = self.config.min_addresses,
            max_addresses = self.config.max_addresses,
            seed = self.seed,
            "generating dataset"
        );
        let started = Instant::now();
        let dataset = self.dataset()?;

        let loaded = with_transaction(store.client(), |tx| {
            tx.batch_execute("set constraints all deferred")
                .map_err(|e| PageError::query(e, "defer constraints"))?;
            let upserts = Upserts::prepare(tx)?;

            let mut loaded = 0usize;
            for customer in dataset {
                upserts.load(tx, &customer)?;
                loaded += 1;
                if loaded % PROGRESS_EVERY == 0 {
                    debug!(loaded, last = %customer.name, "generation progress");
                }
            }
            Ok(loaded)
        })?;
        info!(
            loaded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset committed, compacting"
        );

        store.compact()?;
        let counts = store.counts()?;
        info!(%counts, "generation done");
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_seed_is_kept() {
        let generator = DataGenerator::new(GeneratorConfig::new(10, 1, 2).with_seed(99)).unwrap();
        assert_eq!(generator.seed(), 99);
    }

    #[test]
    fn generator_dataset_matches_seeded_stream() {
        let config = GeneratorConfig::new(20, 1, 4).with_seed(5);
        let generator = DataGenerator::new(config.clone()).unwrap();
        let from_generator: Vec<_> = generator.dataset().unwrap().collect();
        let direct: Vec<_> = SyntheticDataset::new(&config, 5).unwrap().collect();
        assert_eq!(from_generator, direct);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(DataGenerator::new(GeneratorConfig::new(0, 1, 2)).is_err());
    }

    #[test]
    fn upserts_are_conflict_safe() {
        for sql in [UPSERT_CITY, UPSERT_ADDRESS, UPSERT_CUSTOMER] {
            assert!(sql.contains("on conflict"));
            assert!(sql.contains("returning"));
        }
        assert!(LINK_ADDRESS.contains("do nothing"));
    }
}
