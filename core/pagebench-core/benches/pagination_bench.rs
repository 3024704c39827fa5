// 페이지네이션 전략 벤치마크 (criterion)
//
// PAGEBENCH_DATABASE_URL 이 가리키는 저장소에 데이터가 이미 생성되어 있어야 한다.
// 변수가 없으면 아무것도 측정하지 않는다.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pagebench_core::config::{ENV_DATABASE_URL, HarnessConfig, StoreConfig};
use pagebench_core::store::Connector;
use pagebench_core::{StrategyRegistry, logging, routines};
use std::time::Duration;

fn bench_strategies(c: &mut Criterion) {
    if std::env::var(ENV_DATABASE_URL).is_err() {
        eprintln!("{ENV_DATABASE_URL} not set, skipping pagination benchmarks");
        return;
    }
    logging::init_with_level("warn");

    let store = match StoreConfig::from_env() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("bad store config: {e}");
            return;
        }
    };
    let harness = HarnessConfig::from_env().unwrap_or_default();
    let request = match harness.request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("bad request: {e}");
            return;
        }
    };

    let mut client = match store.connect() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("store unreachable: {e}");
            return;
        }
    };
    routines::install_all(&mut client).unwrap();

    let mut group = c.benchmark_group(format!(
        "page_{}_{}x{}",
        request.filter, request.page, request.page_size
    ));
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    // 연결은 전략 간 공유 (연결 비용 제외)
    for strategy in StrategyRegistry::with_defaults().iter() {
        group.bench_function(strategy.id().as_str(), |b| {
            b.iter(|| strategy.page(&mut client, black_box(&request)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
