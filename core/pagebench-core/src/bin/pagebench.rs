//! pagebench command line: generate the dataset, install routines, run the
//! benchmark, verify that strategies agree.
//!
//! Every flag falls back to its `PAGEBENCH_*` variable, then to the default of
//! the standard run.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use pagebench_core::config::{ConnectionMode, GeneratorConfig, HarnessConfig, StoreConfig};
use pagebench_core::harness::verify_agreement;
use pagebench_core::{
    BenchmarkRunner, DataGenerator, PageRequest, ReferencePager, Store, StrategyId,
    StrategyRegistry, logging, routines,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pagebench")]
#[command(about = "Compare pagination strategies on PostgreSQL", long_about = None)]
struct Cli {
    /// libpq-style connection string or postgres:// URL.
    #[arg(
        long,
        env = "PAGEBENCH_DATABASE_URL",
        default_value = pagebench_core::config::DEFAULT_DATABASE_URL
    )]
    database_url: String,
    /// Statement timeout applied to every connection.
    #[arg(
        long,
        env = "PAGEBENCH_STATEMENT_TIMEOUT_MS",
        default_value_t = StoreConfig::default().statement_timeout_ms
    )]
    statement_timeout_ms: u64,
    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_url(self.database_url.clone())
            .with_statement_timeout(Duration::from_millis(self.statement_timeout_ms))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create the schema and load a synthetic dataset.
    Generate {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Truncate every table first.
        #[arg(long, default_value_t = false)]
        reset: bool,
    },
    /// Install or upgrade the server-side routines.
    Install,
    /// Benchmark the selected strategies (all by default).
    Run {
        #[command(flatten)]
        request: RequestArgs,
        #[arg(long, env = "PAGEBENCH_WARMUP", default_value_t = 5)]
        warmup: usize,
        #[arg(long, env = "PAGEBENCH_SAMPLES", default_value_t = 100)]
        samples: usize,
        /// per-call or shared.
        #[arg(long, env = "PAGEBENCH_CONNECTION_MODE", default_value = "per-call")]
        connection_mode: ConnectionMode,
        /// Strategy the ratios are computed against.
        #[arg(long, env = "PAGEBENCH_BASELINE", default_value = "offset-limit")]
        baseline: StrategyId,
        /// Compare means against this baseline file and fail on regressions.
        #[arg(long)]
        check_baseline: Option<PathBuf>,
        /// Write this run's means to a baseline file.
        #[arg(long)]
        save_baseline: Option<PathBuf>,
        /// Allowed slowdown before a regression is reported.
        #[arg(long, default_value_t = 1.1)]
        threshold: f64,
    },
    /// Check that every strategy returns the same page.
    Verify {
        #[command(flatten)]
        request: RequestArgs,
        // with --seed, also compare against the page expected from that
        // dataset; only meaningful on a store freshly generated with it
        #[command(flatten)]
        dataset: DatasetArgs,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Case-insensitive substring of the customer name.
    #[arg(long, env = "PAGEBENCH_FILTER", default_value = "john")]
    filter: String,
    /// Zero-based page index.
    #[arg(long, env = "PAGEBENCH_PAGE", default_value_t = 871)]
    page: u32,
    #[arg(long, env = "PAGEBENCH_PAGE_SIZE", default_value_t = 10)]
    page_size: u32,
    /// Restrict to these strategies (repeatable).
    #[arg(long = "strategy")]
    strategies: Vec<StrategyId>,
}

impl RequestArgs {
    fn request(&self) -> anyhow::Result<PageRequest> {
        Ok(PageRequest::new(self.filter.clone(), self.page, self.page_size)?)
    }

    fn registry(&self) -> StrategyRegistry {
        if self.strategies.is_empty() {
            StrategyRegistry::with_defaults()
        } else {
            StrategyRegistry::from_ids(self.strategies.iter().copied())
        }
    }
}

#[derive(Args)]
struct DatasetArgs {
    #[arg(long, env = "PAGEBENCH_CUSTOMERS", default_value_t = 100_000)]
    customers: usize,
    #[arg(long, env = "PAGEBENCH_MIN_ADDRESSES", default_value_t = 1)]
    min_addresses: usize,
    #[arg(long, env = "PAGEBENCH_MAX_ADDRESSES", default_value_t = 15)]
    max_addresses: usize,
    /// Seeds from the clock when unset.
    #[arg(long, env = "PAGEBENCH_SEED")]
    seed: Option<u64>,
}

impl DatasetArgs {
    fn config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config =
            GeneratorConfig::new(self.customers, self.min_addresses, self.max_addresses);
        config.seed = self.seed;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_with_level(&cli.log_level);

    let store_config = cli.store_config();

    match cli.command {
        Command::Generate { dataset, reset } => {
            let generator = DataGenerator::new(dataset.config()?)?;
            let mut store = Store::connect(&store_config).context("connecting to the store")?;
            store.install_schema()?;
            if reset {
                store.reset()?;
            }
            let counts = generator.generate(&mut store)?;
            println!("seed {}: {counts}", generator.seed());
        }
        Command::Install => {
            let mut store = Store::connect(&store_config).context("connecting to the store")?;
            store.install_schema()?;
            routines::install_all(store.client())?;
            println!("{} routines installed", routines::ROUTINES.len());
        }
        Command::Run {
            request,
            warmup,
            samples,
            connection_mode,
            baseline,
            check_baseline,
            save_baseline,
            threshold,
        } => {
            let config = HarnessConfig {
                filter: request.filter.clone(),
                page: request.page,
                page_size: request.page_size,
                warmup_iterations: warmup,
                sample_count: samples,
                connection_mode,
                baseline,
            };
            config.validate()?;

            let report = BenchmarkRunner::from_config(&config).run(
                &store_config,
                &request.registry(),
                &config.request()?,
            )?;
            println!("{report}");

            if let Some(path) = check_baseline {
                let mut checker = BenchmarkRunner::new()
                    .with_threshold(threshold)
                    .with_baseline_path(path);
                checker.load_baseline()?;
                let regressions = checker.regressions(&report);
                for regression in &regressions {
                    eprintln!("{regression}");
                }
                if !regressions.is_empty() {
                    bail!("{} strategies regressed", regressions.len());
                }
            }
            if let Some(path) = save_baseline {
                let mut saver = BenchmarkRunner::new().with_baseline_path(&path);
                saver.load_baseline()?;
                saver.update_from_report(&report);
                saver.save_baseline()?;
                println!("baseline written to {}", path.display());
            }
        }
        Command::Verify { request, dataset } => {
            let page_request = request.request()?;

            let generator = dataset.config()?;
            let expected = if generator.seed.is_some() {
                let pager = ReferencePager::new(DataGenerator::new(generator)?.dataset()?);
                Some(pager.page(&page_request))
            } else {
                None
            };

            let agreement = verify_agreement(
                &store_config,
                &request.registry(),
                &page_request,
                expected.as_ref(),
            )?;
            for (id, diff) in &agreement.disagreements {
                eprintln!("{id}: {diff}");
            }
            if !agreement.is_ok() {
                bail!(
                    "{} of {} strategies disagree",
                    agreement.disagreements.len(),
                    agreement.checked.len()
                );
            }
            println!("{} strategies agree", agreement.checked.len());
        }
    }
    Ok(())
}
