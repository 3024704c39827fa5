//! Row and document decoding shared by the strategies.
//!
//! Tabular results put the projection in columns 0..=6 and, for the
//! single-statement shapes, the total count in column 7.

use crate::error::{PageError, PageResult};
use crate::model::{Address, City, CustomerProjection, DataPage};
use crate::store::shape;
use postgres::Row;

/// Column of the repeated total in counted result sets.
pub(crate) const COUNT_COLUMN: usize = 7;

/// Projection select list over `c` (customers), `a` (addresses), `ci` (cities)
/// and `ca` (customer_addresses).
pub(crate) const PROJECTION: &str = "c.customer_id, c.name, c.address_id, a.street, \
     ci.city_id, ci.name as city_name, count(ca.address_id) as address_count";

/// Joins from the primary address to its city plus every link of the customer.
pub(crate) const PROJECTION_JOINS: &str = "\
    join example.addresses a on a.address_id = c.address_id
    join example.cities ci on ci.city_id = a.city_id
    join example.customer_addresses ca on ca.customer_id = c.customer_id";

pub(crate) const PROJECTION_GROUP: &str =
    "c.customer_id, c.name, c.address_id, a.street, ci.city_id, ci.name";

/// Decodes one projection row; `None` for the count-only row of an empty
/// window.
pub(crate) fn customer(row: &Row) -> PageResult<Option<CustomerProjection>> {
    let id: Option<i32> = row.try_get(0).map_err(shape("customer_id"))?;
    let Some(id) = id else {
        return Ok(None);
    };
    Ok(Some(CustomerProjection {
        id,
        name: row.try_get(1).map_err(shape("name"))?,
        address: Address {
            id: row.try_get(2).map_err(shape("address_id"))?,
            street: row.try_get(3).map_err(shape("street"))?,
            city: City {
                id: row.try_get(4).map_err(shape("city_id"))?,
                name: row.try_get(5).map_err(shape("city_name"))?,
            },
        },
        address_count: row.try_get(6).map_err(shape("address_count"))?,
    }))
}

pub(crate) fn customers(rows: &[Row]) -> PageResult<Vec<CustomerProjection>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(customer) = customer(row)? {
            out.push(customer);
        }
    }
    Ok(out)
}

/// Page whose total travels in column 7 of every row.
///
/// The single-statement shapes always emit at least the count row, so an
/// empty result means the statement is not the expected shape.
pub(crate) fn counted_page(rows: &[Row]) -> PageResult<DataPage> {
    let first = rows.first().ok_or_else(|| {
        PageError::Shape("no rows returned; expected at least the count row".to_string())
    })?;
    let count: i64 = first.try_get(COUNT_COLUMN).map_err(shape("count"))?;
    Ok(DataPage {
        count,
        customers: customers(rows)?,
    })
}

/// Decodes a `{count, customers}` document.
pub(crate) fn json_page(document: Option<&str>) -> PageResult<DataPage> {
    let document =
        document.ok_or_else(|| PageError::Shape("routine returned null".to_string()))?;
    serde_json::from_str(document).map_err(|e| PageError::Shape(format!("page document: {e}")))
}
