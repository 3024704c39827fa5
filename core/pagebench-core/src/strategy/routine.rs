//! Strategies that delegate the whole page to a server-side routine.

use super::rows;
use super::{PageStrategy, StrategyId};
use crate::error::{PageError, PageResult};
use crate::model::{DataPage, PageRequest};
use crate::routines::{RoutineDefinition, RoutineShape};
use crate::store::shape;
use postgres::Client;
use postgres::types::Type;

pub struct RoutineStrategy {
    id: StrategyId,
    routine: RoutineDefinition,
    call: String,
}

impl RoutineStrategy {
    pub fn new(id: StrategyId, routine: RoutineDefinition) -> Self {
        Self {
            id,
            call: routine.call_sql(),
            routine,
        }
    }

    pub fn routine(&self) -> &RoutineDefinition {
        &self.routine
    }
}

impl PageStrategy for RoutineStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn install(&self, client: &mut Client) -> PageResult<()> {
        self.routine.install(client)
    }

    fn page(&self, client: &mut Client, request: &PageRequest) -> PageResult<DataPage> {
        let pattern = request.pattern();
        let (skip, take) = (request.skip()?, request.take()?);
        let statement = client
            .prepare_typed(&self.call, &[Type::VARCHAR, Type::INT4, Type::INT4])
            .map_err(|e| PageError::query(e, format!("{} prepare", self.routine.name)))?;

        match self.routine.shape {
            RoutineShape::Json => {
                let row = client
                    .query_one(&statement, &[&pattern, &skip, &take])
                    .map_err(|e| PageError::query(e, format!("call {}", self.routine.name)))?;
                let document: Option<String> = row.try_get(0).map_err(shape("page document"))?;
                rows::json_page(document.as_deref())
            }
            RoutineShape::Rows => {
                let rows = client
                    .query(&statement, &[&pattern, &skip, &take])
                    .map_err(|e| PageError::query(e, format!("call {}", self.routine.name)))?;
                rows::counted_page(&rows)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::ROUTINES;

    #[test]
    fn json_routine_call_casts_to_text() {
        let strategy = RoutineStrategy::new(
            StrategyId::RoutineTempTableJson,
            crate::routines::PAGE_TEMP_TABLE_JSON,
        );
        assert!(ROUTINES.contains(strategy.routine()));
        assert!(strategy.call.ends_with("page_temp_table_json($1, $2, $3)::text"));
    }

    #[test]
    fn rows_routines_select_count_last() {
        let strategy =
            RoutineStrategy::new(StrategyId::RoutineCteRows, crate::routines::PAGE_CTE_ROWS);
        assert!(strategy.call.contains("_address_count, _count from"));
    }
}
