//! Run configuration
//!
//! Every setting has a default matching the standard run (100k
//! customers, 1..=15 addresses, filter `john`, page 871 of size 10) and can be
//! overridden from `PAGEBENCH_*` environment variables or with `with_*` setters.

use crate::error::{PageError, PageResult};
use crate::model::PageRequest;
use crate::strategy::StrategyId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_DATABASE_URL: &str = "PAGEBENCH_DATABASE_URL";
pub const ENV_STATEMENT_TIMEOUT_MS: &str = "PAGEBENCH_STATEMENT_TIMEOUT_MS";
pub const ENV_CUSTOMERS: &str = "PAGEBENCH_CUSTOMERS";
pub const ENV_MIN_ADDRESSES: &str = "PAGEBENCH_MIN_ADDRESSES";
pub const ENV_MAX_ADDRESSES: &str = "PAGEBENCH_MAX_ADDRESSES";
pub const ENV_SEED: &str = "PAGEBENCH_SEED";
pub const ENV_FILTER: &str = "PAGEBENCH_FILTER";
pub const ENV_PAGE: &str = "PAGEBENCH_PAGE";
pub const ENV_PAGE_SIZE: &str = "PAGEBENCH_PAGE_SIZE";
pub const ENV_WARMUP: &str = "PAGEBENCH_WARMUP";
pub const ENV_SAMPLES: &str = "PAGEBENCH_SAMPLES";
pub const ENV_CONNECTION_MODE: &str = "PAGEBENCH_CONNECTION_MODE";
pub const ENV_BASELINE: &str = "PAGEBENCH_BASELINE";

pub const DEFAULT_DATABASE_URL: &str =
    "host=localhost port=5436 user=postgres password=postgres dbname=example";

/// Store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// libpq-style connection string or `postgres://` URL
    pub url: String,
    /// Applied with `set statement_timeout` on every new connection
    pub statement_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            // generation runs for a long time inside one transaction
            statement_timeout_ms: 24 * 60 * 60 * 1000,
        }
    }
}

impl StoreConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }

    pub fn from_env() -> PageResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> PageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            config.url = url;
        }
        if let Some(ms) = parse_var(&lookup, ENV_STATEMENT_TIMEOUT_MS)? {
            config.statement_timeout_ms = ms;
        }
        Ok(config)
    }
}

/// Synthetic dataset shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub customer_count: usize,
    pub min_addresses: usize,
    pub max_addresses: usize,
    /// `None` seeds from the wall clock (logged so the run can be repeated)
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            customer_count: 100_000,
            min_addresses: 1,
            max_addresses: 15,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(customer_count: usize, min_addresses: usize, max_addresses: usize) -> Self {
        Self {
            customer_count,
            min_addresses,
            max_addresses,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> PageResult<()> {
        if self.customer_count == 0 {
            return Err(PageError::InvalidArguments(
                "customer count must be at least 1".to_string(),
            ));
        }
        if self.min_addresses == 0 {
            return Err(PageError::InvalidArguments(
                "minimum addresses per customer must be at least 1".to_string(),
            ));
        }
        if self.max_addresses < self.min_addresses {
            return Err(PageError::InvalidArguments(format!(
                "maximum addresses ({}) is below minimum ({})",
                self.max_addresses, self.min_addresses
            )));
        }
        Ok(())
    }

    pub fn from_env() -> PageResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> PageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(count) = parse_var(&lookup, ENV_CUSTOMERS)? {
            config.customer_count = count;
        }
        if let Some(min) = parse_var(&lookup, ENV_MIN_ADDRESSES)? {
            config.min_addresses = min;
        }
        if let Some(max) = parse_var(&lookup, ENV_MAX_ADDRESSES)? {
            config.max_addresses = max;
        }
        config.seed = parse_var(&lookup, ENV_SEED)?;
        config.validate()?;
        Ok(config)
    }
}

/// How the harness hands connections to strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionMode {
    /// Fresh connection per invocation; connect time is part of the cost
    #[default]
    PerCall,
    /// One connection per strategy, reused across its iterations
    Shared,
}

impl FromStr for ConnectionMode {
    type Err = PageError;

    fn from_str(s: &str) -> PageResult<Self> {
        match s {
            "per-call" => Ok(ConnectionMode::PerCall),
            "shared" => Ok(ConnectionMode::Shared),
            other => Err(PageError::InvalidArguments(format!(
                "unknown connection mode '{other}' (expected per-call or shared)"
            ))),
        }
    }
}

/// Benchmark inputs and iteration counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub filter: String,
    pub page: u32,
    pub page_size: u32,
    pub warmup_iterations: usize,
    pub sample_count: usize,
    pub connection_mode: ConnectionMode,
    pub baseline: StrategyId,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            filter: "john".to_string(),
            page: 871,
            page_size: 10,
            warmup_iterations: 5,
            sample_count: 100,
            connection_mode: ConnectionMode::PerCall,
            baseline: StrategyId::OffsetLimit,
        }
    }
}

impl HarnessConfig {
    pub fn request(&self) -> PageResult<PageRequest> {
        PageRequest::new(self.filter.clone(), self.page, self.page_size)
    }

    pub fn validate(&self) -> PageResult<()> {
        self.request()?;
        if self.sample_count == 0 {
            return Err(PageError::InvalidArguments(
                "sample count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_env() -> PageResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> PageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = lookup(ENV_FILTER) {
            config.filter = filter;
        }
        if let Some(page) = parse_var(&lookup, ENV_PAGE)? {
            config.page = page;
        }
        if let Some(page_size) = parse_var(&lookup, ENV_PAGE_SIZE)? {
            config.page_size = page_size;
        }
        if let Some(warmup) = parse_var(&lookup, ENV_WARMUP)? {
            config.warmup_iterations = warmup;
        }
        if let Some(samples) = parse_var(&lookup, ENV_SAMPLES)? {
            config.sample_count = samples;
        }
        if let Some(mode) = parse_var(&lookup, ENV_CONNECTION_MODE)? {
            config.connection_mode = mode;
        }
        if let Some(baseline) = parse_var(&lookup, ENV_BASELINE)? {
            config.baseline = baseline;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> PageResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            PageError::InvalidArguments(format!("{key}={raw:?} is not valid: {e}"))
        }),
    }
}
