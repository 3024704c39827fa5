//! Pagination strategies
//!
//! 페이지네이션 전략 공통 인터페이스와 등록소
//!
//! Every strategy answers the same `(filter, page, page_size)` request with a
//! [`DataPage`]. Strategies differ only in how the store is asked: plain
//! offset/limit, CTEs with and without a materialization hint, temp tables
//! (optionally row-numbered and indexed) or server-side routines.

mod cte;
mod offset;
mod routine;
mod rows;
mod temp_table;

pub use cte::{CteStrategy, CteWindow};
pub use offset::OffsetLimitStrategy;
pub use routine::RoutineStrategy;
pub use temp_table::{TempTableKind, TempTableStrategy};

use crate::error::{PageError, PageResult};
use crate::model::{DataPage, PageRequest};
use crate::routines;
use postgres::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A way of paging the filtered customer set.
pub trait PageStrategy {
    fn id(&self) -> StrategyId;

    /// Returns the total match count and the requested window.
    fn page(&self, client: &mut Client, request: &PageRequest) -> PageResult<DataPage>;

    /// Creates whatever server-side objects the strategy needs. Called once
    /// per run before any `page` call.
    fn install(&self, _client: &mut Client) -> PageResult<()> {
        Ok(())
    }
}

/// Strategy identifiers, in benchmark order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyId {
    OffsetLimit,
    CteMaterializedOffset,
    CteOffset,
    TempTableOffset,
    TempTableRowNumber,
    TempTableRowNumberIndexed,
    RoutineTempTableJson,
    RoutineRowNumberJson,
    RoutineRowNumberIndexedJson,
    RoutineRowNumberIndexedRows,
    RoutineCteRows,
    RoutineCteRowNumberRows,
    CteMaterializedRowNumber,
    CteRowNumber,
}

/// How a strategy reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyFamily {
    Plain,
    Cte,
    TempTable,
    Routine,
}

impl StrategyId {
    pub const ALL: [StrategyId; 14] = [
        StrategyId::OffsetLimit,
        StrategyId::CteMaterializedOffset,
        StrategyId::CteOffset,
        StrategyId::TempTableOffset,
        StrategyId::TempTableRowNumber,
        StrategyId::TempTableRowNumberIndexed,
        StrategyId::RoutineTempTableJson,
        StrategyId::RoutineRowNumberJson,
        StrategyId::RoutineRowNumberIndexedJson,
        StrategyId::RoutineRowNumberIndexedRows,
        StrategyId::RoutineCteRows,
        StrategyId::RoutineCteRowNumberRows,
        StrategyId::CteMaterializedRowNumber,
        StrategyId::CteRowNumber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyId::OffsetLimit => "offset-limit",
            StrategyId::CteMaterializedOffset => "cte-materialized-offset",
            StrategyId::CteOffset => "cte-offset",
            StrategyId::TempTableOffset => "temp-table-offset",
            StrategyId::TempTableRowNumber => "temp-table-row-number",
            StrategyId::TempTableRowNumberIndexed => "temp-table-row-number-indexed",
            StrategyId::RoutineTempTableJson => "routine-temp-table-json",
            StrategyId::RoutineRowNumberJson => "routine-row-number-json",
            StrategyId::RoutineRowNumberIndexedJson => "routine-row-number-indexed-json",
            StrategyId::RoutineRowNumberIndexedRows => "routine-row-number-indexed-rows",
            StrategyId::RoutineCteRows => "routine-cte-rows",
            StrategyId::RoutineCteRowNumberRows => "routine-cte-row-number-rows",
            StrategyId::CteMaterializedRowNumber => "cte-materialized-row-number",
            StrategyId::CteRowNumber => "cte-row-number",
        }
    }

    /// 1-based position in [`StrategyId::ALL`].
    pub fn number(self) -> usize {
        StrategyId::ALL
            .iter()
            .position(|id| *id == self)
            .map_or(0, |pos| pos + 1)
    }

    pub fn family(self) -> StrategyFamily {
        match self {
            StrategyId::OffsetLimit => StrategyFamily::Plain,
            StrategyId::CteMaterializedOffset
            | StrategyId::CteOffset
            | StrategyId::CteMaterializedRowNumber
            | StrategyId::CteRowNumber => StrategyFamily::Cte,
            StrategyId::TempTableOffset
            | StrategyId::TempTableRowNumber
            | StrategyId::TempTableRowNumberIndexed => StrategyFamily::TempTable,
            StrategyId::RoutineTempTableJson
            | StrategyId::RoutineRowNumberJson
            | StrategyId::RoutineRowNumberIndexedJson
            | StrategyId::RoutineRowNumberIndexedRows
            | StrategyId::RoutineCteRows
            | StrategyId::RoutineCteRowNumberRows => StrategyFamily::Routine,
        }
    }

    /// Builds the strategy this id names.
    pub fn strategy(self) -> Box<dyn PageStrategy> {
        match self {
            StrategyId::OffsetLimit => Box::new(OffsetLimitStrategy),
            StrategyId::CteMaterializedOffset => {
                Box::new(CteStrategy::new(self, CteWindow::Offset, true))
            }
            StrategyId::CteOffset => Box::new(CteStrategy::new(self, CteWindow::Offset, false)),
            StrategyId::CteMaterializedRowNumber => {
                Box::new(CteStrategy::new(self, CteWindow::RowNumber, true))
            }
            StrategyId::CteRowNumber => {
                Box::new(CteStrategy::new(self, CteWindow::RowNumber, false))
            }
            StrategyId::TempTableOffset => {
                Box::new(TempTableStrategy::new(self, TempTableKind::Offset))
            }
            StrategyId::TempTableRowNumber => {
                Box::new(TempTableStrategy::new(self, TempTableKind::RowNumber))
            }
            StrategyId::TempTableRowNumberIndexed => {
                Box::new(TempTableStrategy::new(self, TempTableKind::RowNumberIndexed))
            }
            StrategyId::RoutineTempTableJson => {
                Box::new(RoutineStrategy::new(self, routines::PAGE_TEMP_TABLE_JSON))
            }
            StrategyId::RoutineRowNumberJson => {
                Box::new(RoutineStrategy::new(self, routines::PAGE_ROW_NUMBER_JSON))
            }
            StrategyId::RoutineRowNumberIndexedJson => {
                Box::new(RoutineStrategy::new(self, routines::PAGE_ROW_NUMBER_INDEXED_JSON))
            }
            StrategyId::RoutineRowNumberIndexedRows => {
                Box::new(RoutineStrategy::new(self, routines::PAGE_ROW_NUMBER_INDEXED_ROWS))
            }
            StrategyId::RoutineCteRows => {
                Box::new(RoutineStrategy::new(self, routines::PAGE_CTE_ROWS))
            }
            StrategyId::RoutineCteRowNumberRows => {
                Box::new(RoutineStrategy::new(self, routines::PAGE_CTE_ROW_NUMBER_ROWS))
            }
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown strategy '{s}'"))
    }
}

/// 등록된 전략 목록 (등록 순서 유지)
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn PageStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All fourteen strategies in benchmark order.
    pub fn with_defaults() -> Self {
        Self::from_ids(StrategyId::ALL)
    }

    /// Registry holding `ids` in order; repeated ids are kept once.
    pub fn from_ids(ids: impl IntoIterator<Item = StrategyId>) -> Self {
        let mut registry = Self::new();
        for id in ids {
            if registry.get(id).is_none() {
                registry.strategies.push(id.strategy());
            }
        }
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn PageStrategy>) -> PageResult<()> {
        let id = strategy.id();
        if self.get(id).is_some() {
            return Err(PageError::InvalidArguments(format!(
                "strategy '{id}' already registered"
            )));
        }
        self.strategies.push(strategy);
        Ok(())
    }

    pub fn get(&self, id: StrategyId) -> Option<&dyn PageStrategy> {
        self.strategies
            .iter()
            .find(|s| s.id() == id)
            .map(|s| s.as_ref())
    }

    pub fn ids(&self) -> Vec<StrategyId> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PageStrategy> {
        self.strategies.iter().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_round_trip_through_text() {
        for id in StrategyId::ALL {
            assert_eq!(id.as_str().parse::<StrategyId>().unwrap(), id);
            assert_eq!(id.to_string(), id.as_str());
        }
        assert!("method7".parse::<StrategyId>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&StrategyId::RoutineRowNumberIndexedRows).unwrap();
        assert_eq!(json, "\"routine-row-number-indexed-rows\"");
        let back: StrategyId = serde_json::from_str("\"cte-materialized-offset\"").unwrap();
        assert_eq!(back, StrategyId::CteMaterializedOffset);
    }

    #[test]
    fn numbering_follows_benchmark_order() {
        assert_eq!(StrategyId::OffsetLimit.number(), 1);
        assert_eq!(StrategyId::RoutineTempTableJson.number(), 7);
        assert_eq!(StrategyId::CteRowNumber.number(), 14);
    }

    #[test]
    fn every_id_builds_its_own_strategy() {
        for id in StrategyId::ALL {
            assert_eq!(id.strategy().id(), id);
        }
    }

    #[test]
    fn families() {
        let routines = StrategyId::ALL
            .iter()
            .filter(|id| id.family() == StrategyFamily::Routine)
            .count();
        assert_eq!(routines, crate::routines::ROUTINES.len());
        assert_eq!(StrategyId::OffsetLimit.family(), StrategyFamily::Plain);
        assert_eq!(StrategyId::CteRowNumber.family(), StrategyFamily::Cte);
    }

    #[test]
    fn default_registry_holds_all() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(registry.len(), 14);
        assert_eq!(registry.ids(), StrategyId::ALL.to_vec());
        let unique: HashSet<_> = registry.ids().into_iter().collect();
        assert_eq!(unique.len(), 14);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = StrategyRegistry::new();
        registry.register(StrategyId::CteOffset.strategy()).unwrap();
        let err = registry
            .register(StrategyId::CteOffset.strategy())
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_ids_dedups_and_keeps_order() {
        let registry = StrategyRegistry::from_ids([
            StrategyId::CteRowNumber,
            StrategyId::OffsetLimit,
            StrategyId::CteRowNumber,
        ]);
        assert_eq!(
            registry.ids(),
            vec![StrategyId::CteRowNumber, StrategyId::OffsetLimit]
        );
        assert!(registry.get(StrategyId::TempTableOffset).is_none());
    }
}
