//! Aggregations over the ledger used by summary screens.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use spendbook_domain::{Amounted, Category, MonthFilter, MonthKey, MonthRange};

use crate::ExpenseLedger;

/// Total for one month bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTotal {
    pub month: MonthKey,
    pub total: Decimal,
    pub count: usize,
}

/// Per-month totals over a selector range plus everything that falls outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyBreakdown {
    /// One entry per month in the range, ascending, zero-filled.
    pub months: Vec<MonthTotal>,
    pub outside_range: Decimal,
    pub outside_count: usize,
}

impl MonthlyBreakdown {
    pub fn compute(ledger: &ExpenseLedger, range: &MonthRange) -> Self {
        let mut buckets: BTreeMap<MonthKey, (Decimal, usize)> = range
            .months()
            .into_iter()
            .map(|key| (key, (Decimal::ZERO, 0)))
            .collect();
        let mut outside_range = Decimal::ZERO;
        let mut outside_count = 0;

        for expense in ledger.entries() {
            let key = ledger.month_key_of(expense);
            match buckets.get_mut(&key) {
                Some((total, count)) => {
                    *total = total.saturating_add(expense.amount());
                    *count += 1;
                }
                None => {
                    outside_range = outside_range.saturating_add(expense.amount());
                    outside_count += 1;
                }
            }
        }

        Self {
            months: buckets
                .into_iter()
                .map(|(month, (total, count))| MonthTotal {
                    month,
                    total,
                    count,
                })
                .collect(),
            outside_range,
            outside_count,
        }
    }

    /// Sum of every bucket, equal to the ledger's unfiltered total.
    pub fn grand_total(&self) -> Decimal {
        self.months
            .iter()
            .map(|entry| entry.total)
            .fold(self.outside_range, Decimal::saturating_add)
    }

    pub fn entry_count(&self) -> usize {
        self.months.iter().map(|entry| entry.count).sum::<usize>() + self.outside_count
    }
}

/// Total spent in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
    pub count: usize,
}

pub struct SummaryService;

impl SummaryService {
    /// Category totals for `filter`, largest first; ties ordered by name.
    pub fn category_totals(ledger: &ExpenseLedger, filter: MonthFilter) -> Vec<CategoryTotal> {
        let mut totals: BTreeMap<Category, (Decimal, usize)> = BTreeMap::new();
        for expense in ledger.filtered_view(filter) {
            let entry = totals
                .entry(expense.category.clone())
                .or_insert((Decimal::ZERO, 0));
            entry.0 = entry.0.saturating_add(expense.amount());
            entry.1 += 1;
        }
        let mut rows: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category, (total, count))| CategoryTotal {
                category,
                total,
                count,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
        });
        rows
    }
}
