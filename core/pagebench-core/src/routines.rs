//! Schema-side routines
//!
//! 서버 측 페이지네이션 함수 등록 및 설치
//!
//! Each routine is a versioned `.sql` asset. Installing writes the version into
//! the function comment (`pagebench:<name>:v<N>`), so a run can tell whether the
//! store already carries the current body.

use crate::error::{PageError, PageResult};
use crate::store::{shape, with_transaction};
use postgres::types::Type;
use postgres::{Client, GenericClient};
use tracing::{debug, info};

/// Result shape of a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineShape {
    /// One `json` value `{count, customers[]}`
    Json,
    /// `table(_customer_id, _name, _address_id, _street, _city_id, _city_name,
    /// _address_count, _count)`
    Rows,
}

/// A routine body and the identity it is installed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineDefinition {
    pub name: &'static str,
    pub version: u32,
    pub shape: RoutineShape,
    pub source: &'static str,
}

pub const SCHEMA: &str = "example";

pub const PAGE_TEMP_TABLE_JSON: RoutineDefinition = RoutineDefinition {
    name: "page_temp_table_json",
    version: 1,
    shape: RoutineShape::Json,
    source: include_str!("../sql/routines/page_temp_table_json.sql"),
};

pub const PAGE_ROW_NUMBER_JSON: RoutineDefinition = RoutineDefinition {
    name: "page_row_number_json",
    version: 2,
    shape: RoutineShape::Json,
    source: include_str!("../sql/routines/page_row_number_json.sql"),
};

pub const PAGE_ROW_NUMBER_INDEXED_JSON: RoutineDefinition = RoutineDefinition {
    name: "page_row_number_indexed_json",
    version: 2,
    shape: RoutineShape::Json,
    source: include_str!("../sql/routines/page_row_number_indexed_json.sql"),
};

pub const PAGE_ROW_NUMBER_INDEXED_ROWS: RoutineDefinition = RoutineDefinition {
    name: "page_row_number_indexed_rows",
    version: 1,
    shape: RoutineShape::Rows,
    source: include_str!("../sql/routines/page_row_number_indexed_rows.sql"),
};

pub const PAGE_CTE_ROWS: RoutineDefinition = RoutineDefinition {
    name: "page_cte_rows",
    version: 1,
    shape: RoutineShape::Rows,
    source: include_str!("../sql/routines/page_cte_rows.sql"),
};

pub const PAGE_CTE_ROW_NUMBER_ROWS: RoutineDefinition = RoutineDefinition {
    name: "page_cte_row_number_rows",
    version: 1,
    shape: RoutineShape::Rows,
    source: include_str!("../sql/routines/page_cte_row_number_rows.sql"),
};

pub const ROUTINES: &[RoutineDefinition] = &[
    PAGE_TEMP_TABLE_JSON,
    PAGE_ROW_NUMBER_JSON,
    PAGE_ROW_NUMBER_INDEXED_JSON,
    PAGE_ROW_NUMBER_INDEXED_ROWS,
    PAGE_CTE_ROWS,
    PAGE_CTE_ROW_NUMBER_ROWS,
];

const COMMENT_PREFIX: &str = "pagebench";

const INSTALLED_COMMENT: &str = "
    select obj_description(p.oid, 'pg_proc')
    from pg_proc p
    join pg_namespace n on n.oid = p.pronamespace
    where n.nspname = $1 and p.proname = $2";

impl RoutineDefinition {
    /// Schema-qualified name.
    pub fn qualified_name(&self) -> String {
        format!("{SCHEMA}.{}", self.name)
    }

    /// Signature used by `drop function` and `comment on function`.
    pub fn signature(&self) -> String {
        format!("{}(varchar, integer, integer)", self.qualified_name())
    }

    pub fn version_comment(&self) -> String {
        format!("{COMMENT_PREFIX}:{}:v{}", self.name, self.version)
    }

    /// Statement a strategy sends to call the routine.
    pub fn call_sql(&self) -> String {
        match self.shape {
            RoutineShape::Json => format!("select {}($1, $2, $3)::text", self.qualified_name()),
            RoutineShape::Rows => format!(
                "select _customer_id, _name, _address_id, _street, _city_id, _city_name, \
                 _address_count, _count from {}($1, $2, $3)",
                self.qualified_name()
            ),
        }
    }

    /// Version recorded on the installed function, `None` if absent or not
    /// installed by pagebench.
    pub fn installed_version(&self, client: &mut impl GenericClient) -> PageResult<Option<u32>> {
        let context = || format!("read version of {}", self.name);
        let statement = client
            .prepare_typed(INSTALLED_COMMENT, &[Type::TEXT, Type::TEXT])
            .map_err(|e| PageError::query(e, context()))?;
        let rows = client
            .query(&statement, &[&SCHEMA, &self.name])
            .map_err(|e| PageError::query(e, context()))?;

        let mut version = None;
        for row in rows {
            let comment: Option<String> = row.try_get(0).map_err(shape("routine comment"))?;
            if let Some(found) = comment.as_deref().and_then(|c| parse_version_comment(c, self.name)) {
                version = Some(found);
            }
        }
        Ok(version)
    }

    /// Installs (or upgrades) the routine. A no-op when the store already
    /// carries this version.
    pub fn install(&self, client: &mut impl GenericClient) -> PageResult<()> {
        let installed = self.installed_version(client)?;
        if installed == Some(self.version) {
            debug!(routine = self.name, version = self.version, "routine up to date");
            return Ok(());
        }

        // a changed result type cannot be replaced in place
        if installed.is_some() {
            client
                .batch_execute(&format!("drop function if exists {}", self.signature()))
                .map_err(|e| PageError::query(e, format!("drop {}", self.name)))?;
        }
        client
            .batch_execute(self.source)
            .map_err(|e| PageError::query(e, format!("create {}", self.name)))?;
        client
            .batch_execute(&format!(
                "comment on function {} is '{}'",
                self.signature(),
                self.version_comment()
            ))
            .map_err(|e| PageError::query(e, format!("comment {}", self.name)))?;

        info!(
            routine = self.name,
            version = self.version,
            previous = ?installed,
            "routine installed"
        );
        Ok(())
    }
}

/// Parses `pagebench:<name>:v<N>`; other comments yield `None`.
pub fn parse_version_comment(comment: &str, name: &str) -> Option<u32> {
    let mut parts = comment.trim().splitn(3, ':');
    if parts.next()? != COMMENT_PREFIX || parts.next()? != name {
        return None;
    }
    parts.next()?.strip_prefix('v')?.parse().ok()
}

pub fn find(name: &str) -> Option<&'static RoutineDefinition> {
    ROUTINES.iter().find(|r| r.name == name)
}

/// Installs every routine in one transaction.
pub fn install_all(client: &mut Client) -> PageResult<()> {
    with_transaction(client, |tx| {
        for routine in ROUTINES {
            routine.install(tx)?;
        }
        Ok(())
    })?;
    info!(count = ROUTINES.len(), "routines ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn assets_carry_matching_header() {
        for routine in ROUTINES {
            let header = format!("-- pagebench routine: {} v{}", routine.name, routine.version);
            assert!(
                routine.source.starts_with(&header),
                "{} header out of date",
                routine.name
            );
            assert!(routine.source.contains(&format!(
                "create or replace function {}(",
                routine.qualified_name()
            )));
        }
    }

    #[test]
    fn signatures_are_uniform() {
        for routine in ROUTINES {
            assert!(routine.source.contains("_search varchar"));
            assert!(routine.source.contains("_skip integer"));
            assert!(routine.source.contains("_take integer"));
            match routine.shape {
                RoutineShape::Json => assert!(routine.source.contains("returns json")),
                RoutineShape::Rows => assert!(routine.source.contains("_count bigint")),
            }
        }
    }

    #[test]
    fn json_routines_never_return_null_customers() {
        for routine in ROUTINES.iter().filter(|r| r.shape == RoutineShape::Json) {
            assert!(routine.source.contains("'[]'::json"), "{}", routine.name);
            assert!(routine.source.contains("addressCount"), "{}", routine.name);
        }
    }

    #[test]
    fn routines_order_by_name_bytes() {
        for routine in ROUTINES {
            assert!(routine.source.contains("collate \"C\""), "{}", routine.name);
        }
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = ROUTINES.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), ROUTINES.len());
        assert_eq!(find("page_cte_rows"), Some(&PAGE_CTE_ROWS));
        assert!(find("method7").is_none());
    }

    #[test]
    fn version_comment_round_trip() {
        let comment = PAGE_ROW_NUMBER_JSON.version_comment();
        assert_eq!(comment, "pagebench:page_row_number_json:v2");
        assert_eq!(parse_version_comment(&comment, "page_row_number_json"), Some(2));
    }

    #[test]
    fn foreign_comments_ignored() {
        assert_eq!(parse_version_comment("pagebench:page_cte_rows:v3", "page_cte_rows"), Some(3));
        assert_eq!(parse_version_comment("pagebench:other:v3", "page_cte_rows"), None);
        assert_eq!(parse_version_comment("hand written", "page_cte_rows"), None);
        assert_eq!(parse_version_comment("pagebench:page_cte_rows:vx", "page_cte_rows"), None);
    }

    #[test]
    fn call_sql_by_shape() {
        assert_eq!(
            PAGE_TEMP_TABLE_JSON.call_sql(),
            "select example.page_temp_table_json($1, $2, $3)::text"
        );
        let rows = PAGE_CTE_ROWS.call_sql();
        assert!(rows.starts_with("select _customer_id"));
        assert!(rows.ends_with("from example.page_cte_rows($1, $2, $3)"));
    }
}
