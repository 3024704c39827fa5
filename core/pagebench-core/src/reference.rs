//! In-memory pagination oracle
//!
//! Builds the expected page for a synthetic dataset the same way the store
//! would: names matched case-insensitively, ordered byte-wise (`collate "C"`)
//! with insertion order breaking ties, address count = number of links.
//! Store identities are not known here, so pages are compared by content.

use crate::generator::SyntheticCustomer;
use crate::model::{DataPage, PageRequest};
use std::cmp::Ordering;

/// Expected customer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCustomer {
    /// Position in the generated stream; mirrors identity order in a fresh store
    pub ordinal: usize,
    pub name: String,
    pub street: String,
    pub city: String,
    pub address_count: i64,
}

/// Expected page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePage {
    pub count: i64,
    pub customers: Vec<ReferenceCustomer>,
}

impl ReferencePage {
    /// Checks `page` against this expectation; the error names the first
    /// difference.
    pub fn compare(&self, page: &DataPage) -> Result<(), String> {
        if page.count != self.count {
            return Err(format!("count {} != expected {}", page.count, self.count));
        }
        if page.customers.len() != self.customers.len() {
            return Err(format!(
                "{} customers != expected {}",
                page.customers.len(),
                self.customers.len()
            ));
        }
        for (pos, (actual, expected)) in page.customers.iter().zip(&self.customers).enumerate() {
            let same = actual.name == expected.name
                && actual.address.street == expected.street
                && actual.address.city.name == expected.city
                && actual.address_count == expected.address_count;
            if !same {
                return Err(format!(
                    "row {pos}: got ({}, {}, {}, {}) expected ({}, {}, {}, {})",
                    actual.name,
                    actual.address.street,
                    actual.address.city.name,
                    actual.address_count,
                    expected.name,
                    expected.street,
                    expected.city,
                    expected.address_count
                ));
            }
        }
        Ok(())
    }
}

/// Customers of a generated dataset, sorted in page order.
#[derive(Debug, Clone, Default)]
pub struct ReferencePager {
    ordered: Vec<ReferenceCustomer>,
}

impl ReferencePager {
    pub fn new<I>(customers: I) -> Self
    where
        I: IntoIterator<Item = SyntheticCustomer>,
    {
        let mut ordered: Vec<ReferenceCustomer> = customers
            .into_iter()
            .enumerate()
            .map(|(ordinal, customer)| ReferenceCustomer {
                ordinal,
                address_count: customer.addresses.len() as i64,
                street: customer.primary().street.clone(),
                city: customer.primary().city.clone(),
                name: customer.name,
            })
            .collect();
        ordered.sort_by(page_order);
        Self { ordered }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Every customer matching `filter`, in page order.
    ///
    /// Only ASCII letters fold case, as `ilike` does under the C locale.
    /// Generated names are ASCII; other locales may fold more.
    pub fn matches<'a>(&'a self, filter: &str) -> impl Iterator<Item = &'a ReferenceCustomer> {
        let needle = filter.to_ascii_lowercase();
        self.ordered
            .iter()
            .filter(move |c| c.name.to_ascii_lowercase().contains(&needle))
    }

    pub fn page(&self, request: &PageRequest) -> ReferencePage {
        let skip = (request.page as usize).saturating_mul(request.page_size as usize);
        let take = request.page_size as usize;
        let matching: Vec<&ReferenceCustomer> = self.matches(&request.filter).collect();
        ReferencePage {
            count: matching.len() as i64,
            customers: matching.into_iter().skip(skip).take(take).cloned().collect(),
        }
    }
}

fn page_order(a: &ReferenceCustomer, b: &ReferenceCustomer) -> Ordering {
    a.name
        .as_bytes()
        .cmp(b.name.as_bytes())
        .then(a.ordinal.cmp(&b.ordinal))
}
