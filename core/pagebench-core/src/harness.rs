// 페이지네이션 전략 벤치마크 하네스
//
// 전략마다:
// 1. install (한 번)
// 2. warm-up 반복
// 3. 측정 반복 (동일한 입력)
// 결과는 베이스라인 전략 대비 비율로 보고한다.

use crate::config::{ConnectionMode, HarnessConfig};
use crate::error::{PageError, PageResult};
use crate::model::{DataPage, PageRequest};
use crate::reference::ReferencePage;
use crate::store::Connector;
use crate::strategy::{PageStrategy, StrategyId, StrategyRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// 벤치마크 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub strategy: StrategyId,

    /// 평균 실행 시간 (밀리초)
    pub avg_time_ms: f64,

    pub min_time_ms: f64,

    pub max_time_ms: f64,

    /// 표준 편차
    pub std_dev_ms: f64,

    pub p50_time_ms: f64,

    pub p95_time_ms: f64,

    /// 샘플 수
    pub sample_count: usize,

    /// Total match count of the last measured page
    pub count: i64,

    /// Customers on the last measured page
    pub rows: usize,

    /// 타임스탬프 (unix seconds)
    pub timestamp: i64,
}

impl BenchmarkResult {
    pub fn new(strategy: StrategyId, samples: &[Duration], page: &DataPage) -> PageResult<Self> {
        if samples.is_empty() {
            return Err(PageError::InvalidArguments(format!(
                "no samples recorded for '{strategy}'"
            )));
        }
        let sample_count = samples.len();

        let mut times_ms: Vec<f64> = samples.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        times_ms.sort_by(f64::total_cmp);

        let avg_time_ms = times_ms.iter().sum::<f64>() / sample_count as f64;
        let variance = times_ms
            .iter()
            .map(|t| {
                let diff = t - avg_time_ms;
                diff * diff
            })
            .sum::<f64>()
            / sample_count as f64;

        Ok(Self {
            strategy,
            avg_time_ms,
            min_time_ms: times_ms[0],
            max_time_ms: times_ms[sample_count - 1],
            std_dev_ms: variance.sqrt(),
            p50_time_ms: percentile(&times_ms, 50.0),
            p95_time_ms: percentile(&times_ms, 95.0),
            sample_count,
            count: page.count,
            rows: page.len(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs() as i64),
        })
    }
}

/// Nearest-rank percentile over ascending, non-empty samples.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// What happened to one strategy during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum StrategyOutcome {
    Measured(BenchmarkResult),
    Failed { strategy: StrategyId, error: String },
}

impl StrategyOutcome {
    pub fn strategy(&self) -> StrategyId {
        match self {
            StrategyOutcome::Measured(result) => result.strategy,
            StrategyOutcome::Failed { strategy, .. } => *strategy,
        }
    }

    pub fn result(&self) -> Option<&BenchmarkResult> {
        match self {
            StrategyOutcome::Measured(result) => Some(result),
            StrategyOutcome::Failed { .. } => None,
        }
    }
}

/// Outcomes of one run, in strategy order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub request: PageRequest,
    pub baseline: StrategyId,
    pub connection_mode: ConnectionMode,
    pub outcomes: Vec<StrategyOutcome>,
}

impl BenchmarkReport {
    pub fn result(&self, id: StrategyId) -> Option<&BenchmarkResult> {
        self.outcomes
            .iter()
            .find(|o| o.strategy() == id)
            .and_then(StrategyOutcome::result)
    }

    pub fn results(&self) -> impl Iterator<Item = &BenchmarkResult> {
        self.outcomes.iter().filter_map(StrategyOutcome::result)
    }

    pub fn failures(&self) -> impl Iterator<Item = (StrategyId, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            StrategyOutcome::Failed { strategy, error } => Some((*strategy, error.as_str())),
            StrategyOutcome::Measured(_) => None,
        })
    }

    /// Mean of `id` over mean of the baseline strategy.
    pub fn ratio_to_baseline(&self, id: StrategyId) -> Option<f64> {
        let baseline = self.result(self.baseline)?.avg_time_ms;
        let current = self.result(id)?.avg_time_ms;
        (baseline > 0.0).then(|| current / baseline)
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "filter={:?} page={} page_size={} connections={:?} baseline={}",
            self.request.filter,
            self.request.page,
            self.request.page_size,
            self.connection_mode,
            self.baseline
        )?;
        writeln!(
            f,
            "{:<4}{:<34}{:>11}{:>11}{:>11}{:>8}{:>9}{:>6}",
            "#", "strategy", "mean ms", "p50 ms", "p95 ms", "ratio", "count", "rows"
        )?;
        for outcome in &self.outcomes {
            let id = outcome.strategy();
            match outcome {
                StrategyOutcome::Measured(r) => {
                    let ratio = self
                        .ratio_to_baseline(id)
                        .map_or_else(|| "-".to_string(), |x| format!("{x:.2}"));
                    writeln!(
                        f,
                        "{:<4}{:<34}{:>11.3}{:>11.3}{:>11.3}{:>8}{:>9}{:>6}",
                        id.number(),
                        id.as_str(),
                        r.avg_time_ms,
                        r.p50_time_ms,
                        r.p95_time_ms,
                        ratio,
                        r.count,
                        r.rows
                    )?;
                }
                StrategyOutcome::Failed { error, .. } => {
                    // one table row per strategy
                    let error = error.replace('\n', " / ");
                    writeln!(f, "{:<4}{:<34}failed: {error}", id.number(), id.as_str())?;
                }
            }
        }
        Ok(())
    }
}

/// 전략 간 결과 일치 검사 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Agreement {
    pub checked: Vec<StrategyId>,
    pub disagreements: Vec<(StrategyId, String)>,
}

impl Agreement {
    /// Checks every page against `expected` (when known) and against the
    /// first successful page, on count, ordered ids and address counts.
    pub fn check<I>(expected: Option<&ReferencePage>, pages: I) -> Self
    where
        I: IntoIterator<Item = (StrategyId, PageResult<DataPage>)>,
    {
        let mut agreement = Agreement::default();
        let mut first: Option<(StrategyId, DataPage)> = None;

        for (id, page) in pages {
            agreement.checked.push(id);
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    agreement.disagreements.push((id, e.to_string()));
                    continue;
                }
            };
            if let Some(expected) = expected
                && let Err(diff) = expected.compare(&page)
            {
                agreement.disagreements.push((id, format!("vs reference: {diff}")));
            }
            match &first {
                None => first = Some((id, page)),
                Some((first_id, first_page)) => {
                    if let Some(diff) = page_difference(first_page, &page) {
                        agreement
                            .disagreements
                            .push((id, format!("vs {first_id}: {diff}")));
                    }
                }
            }
        }
        agreement
    }

    pub fn is_ok(&self) -> bool {
        self.disagreements.is_empty()
    }
}

fn page_difference(a: &DataPage, b: &DataPage) -> Option<String> {
    if a.count != b.count {
        return Some(format!("count {} != {}", b.count, a.count));
    }
    if a.ids() != b.ids() {
        return Some(format!("ids {:?} != {:?}", b.ids(), a.ids()));
    }
    let counts = |p: &DataPage| p.customers.iter().map(|c| c.address_count).collect::<Vec<_>>();
    if counts(a) != counts(b) {
        return Some(format!("address counts {:?} != {:?}", counts(b), counts(a)));
    }
    None
}

/// Runs every registered strategy once per connection and compares the pages.
/// Connection failures abort; any other failure is reported as a
/// disagreement.
pub fn verify_agreement<C>(
    connector: &C,
    registry: &StrategyRegistry,
    request: &PageRequest,
    expected: Option<&ReferencePage>,
) -> PageResult<Agreement>
where
    C: Connector + ?Sized,
{
    request.validate()?;
    let mut client = connector.connect()?;
    let mut pages = Vec::with_capacity(registry.len());
    for strategy in registry.iter() {
        match strategy
            .install(&mut client)
            .and_then(|_| strategy.page(&mut client, request))
        {
            Err(e) if e.is_fatal() => return Err(e),
            page => pages.push((strategy.id(), page)),
        }
    }
    let agreement = Agreement::check(expected, pages);
    info!(
        checked = agreement.checked.len(),
        disagreements = agreement.disagreements.len(),
        "agreement verified"
    );
    Ok(agreement)
}

/// 성능 벤치마크 러너
pub struct BenchmarkRunner {
    warmup: usize,

    /// 샘플 수
    sample_count: usize,

    baseline: StrategyId,

    connection_mode: ConnectionMode,

    /// 성능 회귀 임계값 (예: 1.1 = 10% 저하 허용)
    threshold: f64,

    /// 베이스라인 파일 경로
    baseline_path: PathBuf,

    /// 저장된 베이스라인 (전략 → 결과)
    stored: BTreeMap<String, BenchmarkResult>,
}

impl BenchmarkRunner {
    pub fn new() -> Self {
        Self {
            warmup: 5,
            sample_count: 20,
            baseline: StrategyId::OffsetLimit,
            connection_mode: ConnectionMode::PerCall,
            threshold: 1.1, // 10% 저하 허용
            baseline_path: PathBuf::from("target/pagebench_baseline.json"),
            stored: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new()
            .with_warmup(config.warmup_iterations)
            .with_sample_count(config.sample_count)
            .with_baseline(config.baseline)
            .with_connection_mode(config.connection_mode)
    }

    pub fn with_warmup(mut self, iterations: usize) -> Self {
        self.warmup = iterations;
        self
    }

    /// 샘플 수 설정
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    pub fn with_baseline(mut self, id: StrategyId) -> Self {
        self.baseline = id;
        self
    }

    pub fn with_connection_mode(mut self, mode: ConnectionMode) -> Self {
        self.connection_mode = mode;
        self
    }

    /// 임계값 설정
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// 베이스라인 경로 설정
    pub fn with_baseline_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.baseline_path = path.into();
        self
    }

    pub fn baseline_path(&self) -> &Path {
        &self.baseline_path
    }

    /// Warm-up then timed calls of `f`; the first error aborts.
    pub fn measure<F>(&self, id: StrategyId, mut f: F) -> PageResult<BenchmarkResult>
    where
        F: FnMut() -> PageResult<DataPage>,
    {
        if self.sample_count == 0 {
            return Err(PageError::InvalidArguments(
                "sample count must be greater than zero".to_string(),
            ));
        }

        for _ in 0..self.warmup {
            f()?;
        }

        let mut samples = Vec::with_capacity(self.sample_count);
        let mut last = DataPage::default();
        for _ in 0..self.sample_count {
            let start = Instant::now();
            last = f()?;
            samples.push(start.elapsed());
        }

        let result = BenchmarkResult::new(id, &samples, &last)?;
        debug!(
            strategy = %id,
            avg_ms = result.avg_time_ms,
            p95_ms = result.p95_time_ms,
            count = result.count,
            rows = result.rows,
            "strategy measured"
        );
        Ok(result)
    }

    fn run_strategy<C>(
        &self,
        connector: &C,
        strategy: &dyn PageStrategy,
        request: &PageRequest,
    ) -> PageResult<BenchmarkResult>
    where
        C: Connector + ?Sized,
    {
        let mut shared = connector.connect()?;
        strategy.install(&mut shared)?;

        match self.connection_mode {
            ConnectionMode::Shared => {
                self.measure(strategy.id(), || strategy.page(&mut shared, request))
            }
            ConnectionMode::PerCall => {
                drop(shared);
                // connect cost is part of every sample
                self.measure(strategy.id(), || {
                    let mut client = connector.connect()?;
                    strategy.page(&mut client, request)
                })
            }
        }
    }

    /// Benchmarks every strategy of `registry` with the same request.
    ///
    /// A failing strategy is recorded and the run moves on, except for
    /// connection failures, which end the run.
    pub fn run<C>(
        &self,
        connector: &C,
        registry: &StrategyRegistry,
        request: &PageRequest,
    ) -> PageResult<BenchmarkReport>
    where
        C: Connector + ?Sized,
    {
        request.validate()?;
        info!(
            strategies = registry.len(),
            filter = %request.filter,
            page = request.page,
            page_size = request.page_size,
            warmup = self.warmup,
            samples = self.sample_count,
            mode = ?self.connection_mode,
            "benchmark run started"
        );

        let mut outcomes = Vec::with_capacity(registry.len());
        for strategy in registry.iter() {
            let id = strategy.id();
            match self.run_strategy(connector, strategy, request) {
                Ok(result) => outcomes.push(StrategyOutcome::Measured(result)),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(strategy = %id, error = %e, "strategy failed");
                    outcomes.push(StrategyOutcome::Failed {
                        strategy: id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let report = BenchmarkReport {
            request: request.clone(),
            baseline: self.baseline,
            connection_mode: self.connection_mode,
            outcomes,
        };
        info!(
            measured = report.results().count(),
            failed = report.failures().count(),
            "benchmark run finished"
        );
        Ok(report)
    }

    /// 베이스라인 저장
    pub fn save_baseline(&self) -> PageResult<()> {
        let json = serde_json::to_string_pretty(&self.stored)?;

        if let Some(parent) = self.baseline_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.baseline_path, json)?;
        debug!(path = %self.baseline_path.display(), entries = self.stored.len(), "baseline saved");
        Ok(())
    }

    /// 베이스라인 로드 (파일이 없으면 무시)
    pub fn load_baseline(&mut self) -> PageResult<()> {
        if !self.baseline_path.exists() {
            return Ok(());
        }
        let json = fs::read_to_string(&self.baseline_path)?;
        self.stored = serde_json::from_str(&json)?;
        Ok(())
    }

    pub fn update_baseline(&mut self, result: &BenchmarkResult) {
        self.stored
            .insert(result.strategy.as_str().to_string(), result.clone());
    }

    /// Stores every measured result of `report`.
    pub fn update_from_report(&mut self, report: &BenchmarkReport) {
        for result in report.results() {
            self.update_baseline(result);
        }
    }

    pub fn stored(&self, id: StrategyId) -> Option<&BenchmarkResult> {
        self.stored.get(id.as_str())
    }

    /// 성능 회귀 검사
    pub fn check_regression(&self, result: &BenchmarkResult) -> PageResult<()> {
        let Some(stored) = self.stored(result.strategy) else {
            return Ok(());
        };
        if stored.avg_time_ms <= 0.0 {
            return Ok(());
        }
        let ratio = result.avg_time_ms / stored.avg_time_ms;
        if ratio > self.threshold {
            return Err(PageError::PerformanceRegression {
                name: result.strategy.to_string(),
                baseline: stored.avg_time_ms,
                current: result.avg_time_ms,
                ratio,
            });
        }
        Ok(())
    }

    /// Every regression in `report`.
    pub fn regressions(&self, report: &BenchmarkReport) -> Vec<PageError> {
        report
            .results()
            .filter_map(|r| self.check_regression(r).err())
            .collect()
    }
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, City, CustomerProjection};
    use std::cell::Cell;
    use std::thread;

    fn page(count: i64, ids: &[i32]) -> DataPage {
        DataPage {
            count,
            customers: ids
                .iter()
                .map(|&id| CustomerProjection {
                    id,
                    name: format!("Customer {id}"),
                    address: Address {
                        id,
                        street: format!("{id} Main Street"),
                        city: City {
                            id: 1,
                            name: "Springfield".to_string(),
                        },
                    },
                    address_count: 1,
                })
                .collect(),
        }
    }

    fn result(strategy: StrategyId, avg_time_ms: f64) -> BenchmarkResult {
        BenchmarkResult {
            strategy,
            avg_time_ms,
            min_time_ms: avg_time_ms,
            max_time_ms: avg_time_ms,
            std_dev_ms: 0.0,
            p50_time_ms: avg_time_ms,
            p95_time_ms: avg_time_ms,
            sample_count: 10,
            count: 42,
            rows: 10,
            timestamp: 0,
        }
    }

    fn report(outcomes: Vec<StrategyOutcome>) -> BenchmarkReport {
        BenchmarkReport {
            request: PageRequest::new("john", 871, 10).unwrap(),
            baseline: StrategyId::OffsetLimit,
            connection_mode: ConnectionMode::PerCall,
            outcomes,
        }
    }

    #[test]
    fn statistics_from_samples() {
        let samples: Vec<Duration> = (1..=20).map(Duration::from_millis).collect();
        let r = BenchmarkResult::new(StrategyId::CteOffset, &samples, &page(7, &[1, 2])).unwrap();
        assert_eq!(r.sample_count, 20);
        assert!((r.avg_time_ms - 10.5).abs() < 1e-9);
        assert!((r.min_time_ms - 1.0).abs() < 1e-9);
        assert!((r.max_time_ms - 20.0).abs() < 1e-9);
        assert!((r.p50_time_ms - 10.0).abs() < 1e-9);
        assert!((r.p95_time_ms - 19.0).abs() < 1e-9);
        assert!(r.std_dev_ms > 5.0 && r.std_dev_ms < 6.0);
        assert_eq!((r.count, r.rows), (7, 2));
    }

    #[test]
    fn empty_samples_rejected() {
        assert!(BenchmarkResult::new(StrategyId::CteOffset, &[], &DataPage::default()).is_err());
    }

    #[test]
    fn measure_runs_warmup_then_samples() {
        let calls = Cell::new(0);
        let runner = BenchmarkRunner::new().with_warmup(3).with_sample_count(7);
        let r = runner
            .measure(StrategyId::OffsetLimit, || {
                calls.set(calls.get() + 1);
                thread::sleep(Duration::from_millis(1));
                Ok(page(3, &[1, 2, 3]))
            })
            .unwrap();
        assert_eq!(calls.get(), 10);
        assert_eq!(r.sample_count, 7);
        assert!(r.avg_time_ms >= 1.0);
        assert_eq!(r.rows, 3);
    }

    #[test]
    fn measure_stops_on_first_error() {
        let calls = Cell::new(0);
        let runner = BenchmarkRunner::new().with_warmup(0).with_sample_count(5);
        let err = runner
            .measure(StrategyId::TempTableOffset, || {
                calls.set(calls.get() + 1);
                if calls.get() == 2 {
                    Err(PageError::Shape("missing column".to_string()))
                } else {
                    Ok(page(1, &[1]))
                }
            })
            .unwrap_err();
        assert!(matches!(err, PageError::Shape(_)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn zero_samples_rejected() {
        let runner = BenchmarkRunner::new().with_sample_count(0);
        assert!(runner.measure(StrategyId::OffsetLimit, || Ok(page(0, &[]))).is_err());
    }

    #[test]
    fn ratio_against_baseline() {
        let report = report(vec![
            StrategyOutcome::Measured(result(StrategyId::OffsetLimit, 10.0)),
            StrategyOutcome::Measured(result(StrategyId::CteRowNumber, 4.0)),
            StrategyOutcome::Failed {
                strategy: StrategyId::RoutineCteRows,
                error: "query error".to_string(),
            },
        ]);
        assert_eq!(report.ratio_to_baseline(StrategyId::OffsetLimit), Some(1.0));
        assert_eq!(report.ratio_to_baseline(StrategyId::CteRowNumber), Some(0.4));
        assert_eq!(report.ratio_to_baseline(StrategyId::RoutineCteRows), None);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn ratio_missing_without_baseline_result() {
        let report = report(vec![StrategyOutcome::Measured(result(
            StrategyId::CteRowNumber,
            4.0,
        ))]);
        assert_eq!(report.ratio_to_baseline(StrategyId::CteRowNumber), None);
    }

    #[test]
    fn report_table_lists_every_outcome() {
        let report = report(vec![
            StrategyOutcome::Measured(result(StrategyId::OffsetLimit, 10.0)),
            StrategyOutcome::Failed {
                strategy: StrategyId::RoutineCteRows,
                error: "boom".to_string(),
            },
        ]);
        let table = report.to_string();
        assert!(table.contains("offset-limit"));
        assert!(table.contains("1.00"));
        assert!(table.contains("routine-cte-rows"));
        assert!(table.contains("failed: boom"));
        assert!(table.lines().next().unwrap().contains("page=871"));
    }

    #[test]
    fn multi_line_failure_stays_on_one_row() {
        let error = PageError::Query {
            message: "relation \"example.missing\" does not exist".to_string(),
            context: "count matches".to_string(),
        };
        let report = report(vec![
            StrategyOutcome::Measured(result(StrategyId::OffsetLimit, 10.0)),
            StrategyOutcome::Failed {
                strategy: StrategyId::CteOffset,
                error: error.to_string(),
            },
        ]);
        let table = report.to_string();
        // header, column titles, one row per outcome
        assert_eq!(table.lines().count(), 4, "{table}");
        let row = table.lines().last().unwrap();
        assert!(row.starts_with(&format!("{:<4}cte-offset", StrategyId::CteOffset.number())));
        assert!(row.contains("does not exist / Context: count matches"), "{row}");
    }

    #[test]
    fn baseline_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("baseline.json");

        let mut runner = BenchmarkRunner::new().with_baseline_path(&path);
        runner.update_baseline(&result(StrategyId::TempTableRowNumber, 3.5));
        runner.save_baseline().unwrap();

        let mut reloaded = BenchmarkRunner::new().with_baseline_path(&path);
        reloaded.load_baseline().unwrap();
        let stored = reloaded.stored(StrategyId::TempTableRowNumber).unwrap();
        assert_eq!(stored.avg_time_ms, 3.5);
        assert!(reloaded.stored(StrategyId::OffsetLimit).is_none());
    }

    #[test]
    fn missing_baseline_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = BenchmarkRunner::new().with_baseline_path(dir.path().join("none.json"));
        runner.load_baseline().unwrap();
        assert!(runner.stored(StrategyId::OffsetLimit).is_none());
    }

    #[test]
    fn regression_detection() {
        let mut runner = BenchmarkRunner::new().with_threshold(1.5);
        runner.update_baseline(&result(StrategyId::CteOffset, 2.0));

        assert!(runner.check_regression(&result(StrategyId::CteOffset, 2.9)).is_ok());
        let err = runner
            .check_regression(&result(StrategyId::CteOffset, 4.0))
            .unwrap_err();
        match err {
            PageError::PerformanceRegression { name, ratio, .. } => {
                assert_eq!(name, "cte-offset");
                assert!((ratio - 2.0).abs() < 1e-9);
            }
            other => panic!("unexpected {other}"),
        }
        // nothing stored, nothing to regress against
        assert!(runner.check_regression(&result(StrategyId::CteRowNumber, 99.0)).is_ok());
    }

    #[test]
    fn regressions_over_report() {
        let mut runner = BenchmarkRunner::new();
        let baseline = report(vec![
            StrategyOutcome::Measured(result(StrategyId::OffsetLimit, 10.0)),
            StrategyOutcome::Measured(result(StrategyId::CteOffset, 10.0)),
        ]);
        runner.update_from_report(&baseline);

        let current = report(vec![
            StrategyOutcome::Measured(result(StrategyId::OffsetLimit, 10.5)),
            StrategyOutcome::Measured(result(StrategyId::CteOffset, 30.0)),
        ]);
        let found = runner.regressions(&current);
        assert_eq!(found.len(), 1);
        assert!(found[0].to_string().contains("cte-offset"));
    }

    #[test]
    fn from_config_applies_settings() {
        let config = HarnessConfig {
            connection_mode: ConnectionMode::Shared,
            baseline: StrategyId::CteRowNumber,
            warmup_iterations: 1,
            sample_count: 2,
            ..HarnessConfig::default()
        };
        let runner = BenchmarkRunner::from_config(&config);
        assert_eq!(runner.connection_mode, ConnectionMode::Shared);
        assert_eq!(runner.baseline, StrategyId::CteRowNumber);
        assert_eq!((runner.warmup, runner.sample_count), (1, 2));
    }

    #[test]
    fn agreement_flags_divergent_pages() {
        let agreement = Agreement::check(
            None,
            vec![
                (StrategyId::OffsetLimit, Ok(page(12, &[1, 2]))),
                (StrategyId::CteOffset, Ok(page(12, &[1, 2]))),
                (StrategyId::CteRowNumber, Ok(page(12, &[2, 1]))),
                (StrategyId::RoutineCteRows, Ok(page(11, &[1, 2]))),
                (
                    StrategyId::TempTableOffset,
                    Err(PageError::Shape("bad".to_string())),
                ),
            ],
        );
        assert_eq!(agreement.checked.len(), 5);
        let flagged: Vec<StrategyId> = agreement.disagreements.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            flagged,
            vec![
                StrategyId::CteRowNumber,
                StrategyId::RoutineCteRows,
                StrategyId::TempTableOffset
            ]
        );
        assert!(!agreement.is_ok());
    }

    #[test]
    fn agreement_checks_reference() {
        let expected = ReferencePage {
            count: 12,
            customers: Vec::new(),
        };
        let agreement = Agreement::check(
            Some(&expected),
            vec![(StrategyId::OffsetLimit, Ok(page(12, &[])))],
        );
        assert!(agreement.is_ok());

        let agreement = Agreement::check(
            Some(&expected),
            vec![(StrategyId::OffsetLimit, Ok(page(13, &[])))],
        );
        assert!(agreement.disagreements[0].1.starts_with("vs reference"));
    }
}
