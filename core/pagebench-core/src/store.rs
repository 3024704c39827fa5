//! Store connection, schema installation and scoped transactions.

use crate::config::StoreConfig;
use crate::error::{PageError, PageResult};
use postgres::{Client, NoTls, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Idempotent DDL for the customer/address/city graph.
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

/// Opens connections. The harness uses this to open a fresh connection per
/// call or one per strategy.
pub trait Connector {
    fn connect(&self) -> PageResult<Client>;
}

impl Connector for StoreConfig {
    fn connect(&self) -> PageResult<Client> {
        let mut client = Client::connect(&self.url, NoTls)
            .map_err(|e| PageError::Connection(e.to_string()))?;
        client
            .batch_execute(&format!(
                "set statement_timeout = {}",
                self.statement_timeout_ms
            ))
            .map_err(|e| PageError::query(e, "set statement_timeout"))?;
        Ok(client)
    }
}

/// Row counts of the four generated tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub cities: i64,
    pub addresses: i64,
    pub customers: i64,
    pub customer_addresses: i64,
}

impl fmt::Display for TableCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} customers with {} addresses in {} cities ({} links)",
            self.customers, self.addresses, self.cities, self.customer_addresses
        )
    }
}

/// One open connection to the benchmark store.
pub struct Store {
    client: Client,
}

impl Store {
    pub fn connect(config: &StoreConfig) -> PageResult<Self> {
        let client = config.connect()?;
        debug!(statement_timeout_ms = config.statement_timeout_ms, "store connected");
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }

    pub fn into_client(self) -> Client {
        self.client
    }

    /// Creates the schema, tables and ordering index if missing.
    pub fn install_schema(&mut self) -> PageResult<()> {
        self.client
            .batch_execute(SCHEMA_SQL)
            .map_err(|e| PageError::query(e, "install schema"))?;
        info!("schema installed");
        Ok(())
    }

    /// Empties every table and restarts identities, for a clean regeneration.
    pub fn reset(&mut self) -> PageResult<()> {
        self.client
            .batch_execute(
                "truncate example.customer_addresses, example.customers, \
                 example.addresses, example.cities restart identity",
            )
            .map_err(|e| PageError::query(e, "reset store"))?;
        info!("store reset");
        Ok(())
    }

    /// Reclaims space and refreshes planner statistics. Must run outside a
    /// transaction.
    pub fn compact(&mut self) -> PageResult<()> {
        self.client
            .batch_execute("vacuum (full, analyze)")
            .map_err(|e| PageError::query(e, "vacuum"))?;
        Ok(())
    }

    pub fn counts(&mut self) -> PageResult<TableCounts> {
        let row = self
            .client
            .query_one(
                "select \
                    (select count(*) from example.cities), \
                    (select count(*) from example.addresses), \
                    (select count(*) from example.customers), \
                    (select count(*) from example.customer_addresses)",
                &[],
            )
            .map_err(|e| PageError::query(e, "table counts"))?;
        Ok(TableCounts {
            cities: row.try_get(0).map_err(shape("cities count"))?,
            addresses: row.try_get(1).map_err(shape("addresses count"))?,
            customers: row.try_get(2).map_err(shape("customers count"))?,
            customer_addresses: row.try_get(3).map_err(shape("links count"))?,
        })
    }
}

/// Runs `work` inside a transaction that commits on `Ok` and rolls back on
/// every other exit path, taking transaction-scoped temp tables with it.
pub fn with_transaction<T, F>(client: &mut Client, work: F) -> PageResult<T>
where
    F: FnOnce(&mut Transaction<'_>) -> PageResult<T>,
{
    let mut tx = client
        .transaction()
        .map_err(|e| PageError::query(e, "begin"))?;
    let out = work(&mut tx)?;
    tx.commit().map_err(|e| PageError::query(e, "commit"))?;
    Ok(out)
}

/// Maps a column decode failure to a shape error naming the column.
pub(crate) fn shape(column: &'static str) -> impl Fn(postgres::Error) -> PageError {
    move |e| PageError::Shape(format!("{column}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_asset_is_idempotent_ddl() {
        for line in SCHEMA_SQL.lines() {
            let line = line.trim_start();
            if line.starts_with("create table") || line.starts_with("create schema") {
                assert!(line.contains("if not exists"), "not idempotent: {line}");
            }
        }
        assert!(SCHEMA_SQL.contains("deferrable initially immediate"));
        assert!(SCHEMA_SQL.contains("primary key (customer_id, address_id)"));
    }

    #[test]
    fn counts_display() {
        let counts = TableCounts {
            cities: 3,
            addresses: 10,
            customers: 5,
            customer_addresses: 11,
        };
        assert_eq!(
            counts.to_string(),
            "5 customers with 10 addresses in 3 cities (11 links)"
        );
    }

    #[test]
    fn unreachable_store_is_connection_error() {
        let config = StoreConfig::default().with_url("host=127.0.0.1 port=1 user=nobody connect_timeout=1");
        match Store::connect(&config) {
            Err(PageError::Connection(_)) => {}
            Err(other) => panic!("expected connection error, got {other}"),
            Ok(_) => panic!("nothing should listen on port 1"),
        }
    }
}
