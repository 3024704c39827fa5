//! Baseline: separate count query, then the joined page with `offset`/`limit`.

use super::rows::{self, PROJECTION, PROJECTION_GROUP, PROJECTION_JOINS};
use super::{PageStrategy, StrategyId};
use crate::error::{PageError, PageResult};
use crate::model::{DataPage, PageRequest};
use crate::store::shape;
use postgres::Client;
use postgres::types::Type;

const COUNT_SQL: &str = "select count(*) from example.customers where name ilike $1";

fn page_sql() -> String {
    format!(
        "select {PROJECTION}
    from example.customers c
    {PROJECTION_JOINS}
    where c.name ilike $1
    group by {PROJECTION_GROUP}
    order by c.name collate \"C\", c.customer_id
    offset $2 limit $3"
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetLimitStrategy;

impl PageStrategy for OffsetLimitStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::OffsetLimit
    }

    fn page(&self, client: &mut Client, request: &PageRequest) -> PageResult<DataPage> {
        let pattern = request.pattern();
        let (skip, take) = (request.skip()?, request.take()?);

        let count_stmt = client
            .prepare_typed(COUNT_SQL, &[Type::TEXT])
            .map_err(|e| PageError::query(e, "offset-limit count"))?;
        let count: i64 = client
            .query_one(&count_stmt, &[&pattern])
            .map_err(|e| PageError::query(e, "offset-limit count"))?
            .try_get(0)
            .map_err(shape("count"))?;

        let page_stmt = client
            .prepare_typed(&page_sql(), &[Type::TEXT, Type::INT4, Type::INT4])
            .map_err(|e| PageError::query(e, "offset-limit page"))?;
        let rows = client
            .query(&page_stmt, &[&pattern, &skip, &take])
            .map_err(|e| PageError::query(e, "offset-limit page"))?;

        Ok(DataPage {
            count,
            customers: rows::customers(&rows)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_sql_binds_every_parameter() {
        let sql = page_sql();
        for param in ["$1", "$2", "$3"] {
            assert!(sql.contains(param), "{param} unused");
        }
        assert!(sql.contains("order by c.name collate \"C\", c.customer_id"));
        assert!(!sql.contains("john"));
    }
}
