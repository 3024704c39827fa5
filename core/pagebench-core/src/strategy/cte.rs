//! Single-statement CTE strategies.
//!
//! The match set is a CTE, optionally `materialized`. The page is left-joined
//! onto a one-row count relation, so an empty window still carries the total.

use super::rows::{self, PROJECTION, PROJECTION_GROUP, PROJECTION_JOINS};
use super::{PageStrategy, StrategyId};
use crate::error::{PageError, PageResult};
use crate::model::{DataPage, PageRequest};
use postgres::Client;
use postgres::types::Type;

/// How the window is cut from the match set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CteWindow {
    /// `order by … offset $2 limit $3`
    Offset,
    /// `row_number()` ordinal range `($2, $2 + $3]`
    RowNumber,
}

pub struct CteStrategy {
    id: StrategyId,
    sql: String,
}

impl CteStrategy {
    pub fn new(id: StrategyId, window: CteWindow, materialized: bool) -> Self {
        Self {
            id,
            sql: cte_sql(window, materialized),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

fn cte_sql(window: CteWindow, materialized: bool) -> String {
    let hint = if materialized { "materialized " } else { "" };
    match window {
        CteWindow::Offset => format!(
            "with matching as {hint}(
        select customer_id
        from example.customers
        where name ilike $1
    ),
    total as (
        select count(*) as matched from matching
    ),
    page as (
        select {PROJECTION}
        from matching m
        join example.customers c on c.customer_id = m.customer_id
        {PROJECTION_JOINS}
        group by {PROJECTION_GROUP}
        order by c.name collate \"C\", c.customer_id
        offset $2 limit $3
    )
    select p.customer_id, p.name, p.address_id, p.street, p.city_id, p.city_name,
           p.address_count, total.matched
    from total
    left join page p on true
    order by p.name collate \"C\", p.customer_id"
        ),
        CteWindow::RowNumber => format!(
            "with numbered as {hint}(
        select row_number() over (order by name collate \"C\", customer_id) as row_num,
               customer_id
        from example.customers
        where name ilike $1
    ),
    total as (
        select coalesce(max(row_num), 0) as matched from numbered
    ),
    page as (
        select nb.row_num, {PROJECTION}
        from numbered nb
        join example.customers c on c.customer_id = nb.customer_id
        {PROJECTION_JOINS}
        where nb.row_num > $2 and nb.row_num <= $2 + $3
        group by nb.row_num, {PROJECTION_GROUP}
    )
    select p.customer_id, p.name, p.address_id, p.street, p.city_id, p.city_name,
           p.address_count, total.matched
    from total
    left join page p on true
    order by p.row_num"
        ),
    }
}

impl PageStrategy for CteStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn page(&self, client: &mut Client, request: &PageRequest) -> PageResult<DataPage> {
        let pattern = request.pattern();
        let (skip, take) = (request.skip()?, request.take()?);
        let statement = client
            .prepare_typed(&self.sql, &[Type::TEXT, Type::INT4, Type::INT4])
            .map_err(|e| PageError::query(e, format!("{} prepare", self.id)))?;
        let rows = client
            .query(&statement, &[&pattern, &skip, &take])
            .map_err(|e| PageError::query(e, format!("{} page", self.id)))?;
        rows::counted_page(&rows)
    }
}
