//! Expense records and their identifiers.

use std::{fmt, num::ParseIntError, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{category::Category, common::*};

/// Stable key of an expense. Integer-valued so ledgers exported from the
/// browser tracker (millisecond ids) load without conversion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ExpenseId(pub u64);

impl ExpenseId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExpenseId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(ExpenseId)
    }
}

/// A single spending record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub item: String,
    /// Written as an exact JSON number so no digits are lost on reload.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub cost: Decimal,
    pub category: Category,
    /// Moment the expense is attributed to; drives month grouping.
    pub date: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        id: ExpenseId,
        item: impl Into<String>,
        cost: Decimal,
        category: Category,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item: item.into(),
            cost,
            category,
            date,
        }
    }

    /// Returns `true` when the record satisfies the ledger invariants.
    pub fn is_well_formed(&self) -> bool {
        !self.item.trim().is_empty() && self.cost > Decimal::ZERO
    }
}

impl Identifiable for Expense {
    fn id(&self) -> ExpenseId {
        self.id
    }
}

impl NamedEntity for Expense {
    fn name(&self) -> &str {
        &self.item
    }
}

impl Amounted for Expense {
    fn amount(&self) -> Decimal {
        self.cost
    }
}

impl Displayable for Expense {
    fn display_label(&self) -> String {
        format!("expense:{} [{} / {}]", self.id, self.item, self.category)
    }
}
