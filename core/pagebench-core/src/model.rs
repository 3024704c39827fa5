//! Page shapes returned by every strategy, and the request that drives them.

use crate::error::{PageError, PageResult};
use serde::{Deserialize, Serialize};

/// City as projected into a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: i32,
    pub name: String,
}

/// Primary address of a customer, with its city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: i32,
    pub street: String,
    pub city: City,
}

/// One customer row of a page.
///
/// `address_count` is the number of customer/address links, not just the
/// primary address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProjection {
    pub id: i32,
    pub name: String,
    pub address: Address,
    pub address_count: i64,
}

/// Total match count plus the requested window of customers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPage {
    pub count: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub customers: Vec<CustomerProjection>,
}

// json_agg over zero rows yields null
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<CustomerProjection>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<CustomerProjection>>::deserialize(deserializer)?.unwrap_or_default())
}

impl DataPage {
    /// Customer identifiers in page order.
    pub fn ids(&self) -> Vec<i32> {
        self.customers.iter().map(|c| c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

/// `(filter, page, page_size)` input shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Raw substring, matched case-insensitively against customer names
    pub filter: String,
    /// Zero-based page index
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(filter: impl Into<String>, page: u32, page_size: u32) -> PageResult<Self> {
        let request = Self {
            filter: filter.into(),
            page,
            page_size,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> PageResult<()> {
        if self.page_size == 0 {
            return Err(PageError::InvalidArguments(
                "page size must be greater than zero".to_string(),
            ));
        }
        // row-numbered strategies compute `skip + take` in int4
        self.skip()?
            .checked_add(self.take()?)
            .ok_or_else(|| {
                PageError::InvalidArguments(format!(
                    "window end of page {} overflows int4",
                    self.page
                ))
            })?;
        Ok(())
    }

    /// `ILIKE` pattern: the filter with `\`, `%` and `_` escaped, wrapped in `%`.
    pub fn pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.filter.len() + 2);
        pattern.push('%');
        for ch in self.filter.chars() {
            if matches!(ch, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        pattern
    }

    /// Rows before the window, `page * page_size`, as the `int4` the store binds.
    pub fn skip(&self) -> PageResult<i32> {
        self.page
            .checked_mul(self.page_size)
            .and_then(|skip| i32::try_from(skip).ok())
            .ok_or_else(|| {
                PageError::InvalidArguments(format!(
                    "page {} x page size {} overflows int4",
                    self.page, self.page_size
                ))
            })
    }

    pub fn take(&self) -> PageResult<i32> {
        i32::try_from(self.page_size).map_err(|_| {
            PageError::InvalidArguments(format!("page size {} overflows int4", self.page_size))
        })
    }
}
