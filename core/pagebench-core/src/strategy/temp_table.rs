//! Temp-table strategies
//!
//! Matching ids are materialized into `_page_customers`, created
//! `on commit drop` inside a scoped transaction. Dropping the transaction
//! guard on any error rolls back and takes the table with it.

use super::rows::{self, PROJECTION, PROJECTION_GROUP, PROJECTION_JOINS};
use super::{PageStrategy, StrategyId};
use crate::error::{PageError, PageResult};
use crate::model::{DataPage, PageRequest};
use crate::store::{shape, with_transaction};
use postgres::types::Type;
use postgres::{Client, Transaction};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempTableKind {
    /// Ids only; `count(*)` and `offset`/`limit` on the join
    Offset,
    /// Ids with their page ordinal; `max(row_num)` and an ordinal range
    RowNumber,
    /// As `RowNumber` plus a btree index on the ordinal; the count is the
    /// number of rows inserted
    RowNumberIndexed,
}

const CREATE_IDS: &str =
    "create temp table _page_customers (customer_id int not null) on commit drop";

const CREATE_NUMBERED: &str = "create temp table _page_customers (
        row_num bigint not null,
        customer_id int not null
    ) on commit drop";

const INSERT_IDS: &str = "insert into _page_customers (customer_id)
    select customer_id from example.customers where name ilike $1";

const INSERT_NUMBERED: &str = "insert into _page_customers (row_num, customer_id)
    select row_number() over (order by name collate \"C\", customer_id), customer_id
    from example.customers
    where name ilike $1";

const INDEX_NUMBERED: &str = "create index on _page_customers using btree (row_num)";

const COUNT_IDS: &str = "select count(*) from _page_customers";

const COUNT_NUMBERED: &str = "select coalesce(max(row_num), 0) from _page_customers";

fn offset_page_sql() -> String {
    format!(
        "select {PROJECTION}
    from _page_customers t
    join example.customers c on c.customer_id = t.customer_id
    {PROJECTION_JOINS}
    group by {PROJECTION_GROUP}
    order by c.name collate \"C\", c.customer_id
    offset $1 limit $2"
    )
}

fn range_page_sql() -> String {
    format!(
        "select {PROJECTION}
    from _page_customers t
    join example.customers c on c.customer_id = t.customer_id
    {PROJECTION_JOINS}
    where t.row_num > $1 and t.row_num <= $1 + $2
    group by t.row_num, {PROJECTION_GROUP}
    order by t.row_num"
    )
}

pub struct TempTableStrategy {
    id: StrategyId,
    kind: TempTableKind,
}

impl TempTableStrategy {
    pub fn new(id: StrategyId, kind: TempTableKind) -> Self {
        Self { id, kind }
    }

    pub fn kind(&self) -> TempTableKind {
        self.kind
    }

    fn fill(&self, tx: &mut Transaction<'_>, pattern: &str) -> PageResult<u64> {
        let (create, insert) = match self.kind {
            TempTableKind::Offset => (CREATE_IDS, INSERT_IDS),
            TempTableKind::RowNumber | TempTableKind::RowNumberIndexed => {
                (CREATE_NUMBERED, INSERT_NUMBERED)
            }
        };
        tx.batch_execute(create)
            .map_err(|e| PageError::query(e, format!("{} create temp table", self.id)))?;

        let statement = tx
            .prepare_typed(insert, &[Type::TEXT])
            .map_err(|e| PageError::query(e, format!("{} fill prepare", self.id)))?;
        let inserted = tx
            .execute(&statement, &[&pattern])
            .map_err(|e| PageError::query(e, format!("{} fill", self.id)))?;

        if self.kind == TempTableKind::RowNumberIndexed {
            tx.batch_execute(INDEX_NUMBERED)
                .map_err(|e| PageError::query(e, format!("{} index", self.id)))?;
        }
        Ok(inserted)
    }

    fn count(&self, tx: &mut Transaction<'_>, inserted: u64) -> PageResult<i64> {
        let sql = match self.kind {
            TempTableKind::Offset => COUNT_IDS,
            TempTableKind::RowNumber => COUNT_NUMBERED,
            TempTableKind::RowNumberIndexed => {
                return i64::try_from(inserted).map_err(|_| {
                    PageError::Shape(format!("inserted row count {inserted} exceeds int8"))
                });
            }
        };
        tx.query_one(sql, &[])
            .map_err(|e| PageError::query(e, format!("{} count", self.id)))?
            .try_get(0)
            .map_err(shape("count"))
    }
}

impl PageStrategy for TempTableStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn page(&self, client: &mut Client, request: &PageRequest) -> PageResult<DataPage> {
        let pattern = request.pattern();
        let (skip, take) = (request.skip()?, request.take()?);

        with_transaction(client, |tx| {
            let inserted = self.fill(tx, &pattern)?;
            let count = self.count(tx, inserted)?;
            debug!(strategy = %self.id, inserted, count, "temp table filled");

            let sql = match self.kind {
                TempTableKind::Offset => offset_page_sql(),
                TempTableKind::RowNumber | TempTableKind::RowNumberIndexed => range_page_sql(),
            };
            let statement = tx
                .prepare_typed(&sql, &[Type::INT4, Type::INT4])
                .map_err(|e| PageError::query(e, format!("{} page prepare", self.id)))?;
            let rows = tx
                .query(&statement, &[&skip, &take])
                .map_err(|e| PageError::query(e, format!("{} page", self.id)))?;

            Ok(DataPage {
                count,
                customers: rows::customers(&rows)?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_table_is_transaction_scoped() {
        assert!(CREATE_IDS.ends_with("on commit drop"));
        assert!(CREATE_NUMBERED.ends_with("on commit drop"));
    }

    #[test]
    fn ordinal_matches_page_order() {
        assert!(INSERT_NUMBERED.contains("order by name collate \"C\", customer_id"));
        assert!(range_page_sql().contains("order by t.row_num"));
        assert!(offset_page_sql().contains("order by c.name collate \"C\", c.customer_id"));
    }

    #[test]
    fn filter_is_bound_not_interpolated() {
        for sql in [INSERT_IDS, INSERT_NUMBERED] {
            assert!(sql.contains("ilike $1"));
        }
    }

    #[test]
    fn kinds_map_to_ids() {
        for (id, kind) in [
            (StrategyId::TempTableOffset, TempTableKind::Offset),
            (StrategyId::TempTableRowNumber, TempTableKind::RowNumber),
            (StrategyId::TempTableRowNumberIndexed, TempTableKind::RowNumberIndexed),
        ] {
            let strategy = TempTableStrategy::new(id, kind);
            assert_eq!(strategy.id(), id);
            assert_eq!(strategy.kind(), kind);
        }
    }
}
