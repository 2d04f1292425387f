//! Render-ready projection of the ledger for a month filter.

use rust_decimal::Decimal;

use spendbook_domain::{ExpenseId, Identifiable, MonthFilter};

use crate::{CurrencyFormatter, DateFormatter, ExpenseLedger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRow {
    pub id: ExpenseId,
    pub item: String,
    pub category: String,
    pub date_label: String,
    pub amount_label: String,
}

/// Everything a surface needs to draw the list, the total, and the empty state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerView {
    pub filter: MonthFilter,
    pub rows: Vec<ExpenseRow>,
    pub total: Decimal,
    pub total_label: String,
}

impl LedgerView {
    pub fn build<F>(ledger: &ExpenseLedger, filter: MonthFilter, formatter: &F) -> Self
    where
        F: CurrencyFormatter + DateFormatter,
    {
        let today = ledger.today();
        let rows = ledger
            .filtered_view(filter)
            .into_iter()
            .map(|expense| ExpenseRow {
                id: expense.id(),
                item: expense.item.clone(),
                category: expense.category.to_string(),
                date_label: formatter.format_date(ledger.local_date(expense.date), today),
                amount_label: formatter.format_amount(expense.cost),
            })
            .collect();
        let total = ledger.total(filter);

        Self {
            filter,
            rows,
            total,
            total_label: formatter.format_amount(total),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
