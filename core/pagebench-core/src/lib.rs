//! # pagebench: 페이지네이션 전략 벤치마크
//!
//! Compares fourteen ways of paging a filtered, joined and aggregated
//! customer/address/city dataset on PostgreSQL, against a seeded synthetic
//! dataset with realistic skew.
//!
//! ## 주요 특징
//!
//! - **Seeded generator**: customers with 1..N addresses in a small city pool,
//!   loaded in one transaction with deferred foreign keys
//! - **14 strategies**: offset/limit, CTEs with and without `materialized`,
//!   temp tables (row-numbered, indexed) and server-side routines returning
//!   JSON or rows
//! - **Harness**: warm-up, timed samples, baseline ratios and regression checks
//! - **Reference pager**: in-memory oracle for correctness checks
//!
//! ## 빠른 시작
//!
//! ```no_run
//! use pagebench_core::config::{GeneratorConfig, HarnessConfig, StoreConfig};
//! use pagebench_core::{BenchmarkRunner, DataGenerator, Store, StrategyRegistry};
//!
//! # fn main() -> pagebench_core::PageResult<()> {
//! let store_config = StoreConfig::from_env()?;
//! let mut store = Store::connect(&store_config)?;
//! store.install_schema()?;
//!
//! // 데이터 생성 (고정 시드)
//! DataGenerator::new(GeneratorConfig::new(1_000, 1, 5).with_seed(42))?.generate(&mut store)?;
//!
//! // 모든 전략 측정
//! let harness = HarnessConfig::default();
//! let report = BenchmarkRunner::from_config(&harness).run(
//!     &store_config,
//!     &StrategyRegistry::with_defaults(),
//!     &harness.request()?,
//! )?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## 모듈 구조
//!
//! - [`generator`]: synthetic dataset and its loader ([`DataGenerator`])
//! - [`strategy`]: [`PageStrategy`] implementations and [`StrategyRegistry`]
//! - [`routines`]: versioned server-side routines
//! - [`harness`]: [`BenchmarkRunner`], reports, agreement checks
//! - [`reference`]: in-memory expected pages
//! - [`store`]: connections, schema, scoped transactions

pub mod config;
pub mod error;
pub mod generator;
pub mod harness;
pub mod model;
pub mod reference;
pub mod routines;
pub mod store;
pub mod strategy;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use error::{PageError, PageResult};
pub use generator::DataGenerator;
pub use harness::{BenchmarkReport, BenchmarkResult, BenchmarkRunner};
pub use model::{DataPage, PageRequest};
pub use reference::ReferencePager;
pub use store::Store;
pub use strategy::{PageStrategy, StrategyId, StrategyRegistry};
