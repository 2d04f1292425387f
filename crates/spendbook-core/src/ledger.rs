//! The expense ledger: validation, month queries, and write-through persistence.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use spendbook_domain::{
    Amounted, AttributedMonth, Category, Displayable, Expense, ExpenseId, MonthFilter, MonthKey,
};

use crate::{storage::ExpenseStore, time::Clock, CoreError, IdSequence};

/// Outcome of reading the store when a ledger is opened.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: usize,
    /// Stored entries that were skipped because they break ledger invariants.
    pub warnings: Vec<String>,
    /// Set when the store could not be read and the ledger started empty.
    pub degraded: Option<String>,
}

/// Ordered, newest-first list of expenses mirrored to an [`ExpenseStore`].
///
/// Every successful mutation writes the full list back. A failed write rolls
/// the mutation back so memory and storage stay in agreement.
pub struct ExpenseLedger {
    entries: Vec<Expense>,
    ids: IdSequence,
    store: Box<dyn ExpenseStore>,
    clock: Box<dyn Clock>,
    offset: FixedOffset,
    report: LoadReport,
}

impl ExpenseLedger {
    /// Loads the ledger from `store`. Unreadable storage degrades to an empty ledger.
    pub fn open(
        store: Box<dyn ExpenseStore>,
        clock: Box<dyn Clock>,
        offset: FixedOffset,
    ) -> Self {
        let mut report = LoadReport::default();
        let stored = match store.load() {
            Ok(expenses) => expenses,
            Err(err) => {
                warn!(error = %err, "expense storage unreadable; starting with an empty ledger");
                report.degraded = Some(err.to_string());
                Vec::new()
            }
        };

        let ids = IdSequence::after(stored.iter().map(|expense| expense.id));
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(stored.len());
        let mut running_total = Decimal::ZERO;
        for expense in stored {
            if !seen.insert(expense.id) {
                let message = format!("skipped duplicate expense id {}", expense.id);
                warn!("{message}");
                report.warnings.push(message);
                continue;
            }
            if !expense.is_well_formed() {
                let message = format!(
                    "skipped malformed expense {} (item `{}`, cost {})",
                    expense.id, expense.item, expense.cost
                );
                warn!("{message}");
                report.warnings.push(message);
                continue;
            }
            let Some(next_total) = running_total.checked_add(expense.cost) else {
                let message = format!(
                    "skipped expense {} (cost {} overflows the ledger total)",
                    expense.id, expense.cost
                );
                warn!("{message}");
                report.warnings.push(message);
                continue;
            };
            running_total = next_total;
            entries.push(expense);
        }
        report.loaded = entries.len();
        debug!(count = entries.len(), "expense ledger opened");

        Self {
            entries,
            ids,
            store,
            clock,
            offset,
            report,
        }
    }

    /// Validates and records a new expense at the front of the ledger.
    pub fn add(
        &mut self,
        item: &str,
        cost: Decimal,
        category: impl Into<Category>,
        month: AttributedMonth,
    ) -> Result<Expense, CoreError> {
        let item = validate_item(item)?;
        validate_cost(cost)?;
        self.ensure_total_fits(cost, None)?;

        let date = self.attributed_date(month);
        let expense = Expense::new(self.ids.next_id(), item, cost, category.into(), date);
        self.entries.insert(0, expense.clone());

        if let Err(err) = self.persist() {
            self.entries.remove(0);
            warn!(error = %err, id = %expense.id, "add rolled back after failed save");
            return Err(err);
        }
        debug!("added {}", expense.display_label());
        Ok(expense)
    }

    /// Replaces the item, cost, and category of the expense with `id`.
    pub fn edit(
        &mut self,
        id: ExpenseId,
        item: &str,
        cost: Decimal,
        category: impl Into<Category>,
    ) -> Result<Expense, CoreError> {
        let item = validate_item(item)?;
        validate_cost(cost)?;
        let index = self.position(id)?;
        self.ensure_total_fits(cost, Some(index))?;

        let previous = self.entries[index].clone();
        let entry = &mut self.entries[index];
        entry.item = item;
        entry.cost = cost;
        entry.category = category.into();

        if let Err(err) = self.persist() {
            self.entries[index] = previous;
            warn!(error = %err, %id, "edit rolled back after failed save");
            return Err(err);
        }
        let updated = self.entries[index].clone();
        debug!("edited {}", updated.display_label());
        Ok(updated)
    }

    /// Removes the expense with `id`.
    pub fn delete(&mut self, id: ExpenseId) -> Result<(), CoreError> {
        let index = self.position(id)?;
        let removed = self.entries.remove(index);

        if let Err(err) = self.persist() {
            self.entries.insert(index, removed);
            warn!(error = %err, %id, "delete rolled back after failed save");
            return Err(err);
        }
        debug!("deleted {}", removed.display_label());
        Ok(())
    }

    /// Entries matching `filter`, in ledger order.
    pub fn filtered_view(&self, filter: MonthFilter) -> Vec<&Expense> {
        self.entries
            .iter()
            .filter(|expense| filter.matches(self.month_key_of(expense)))
            .collect()
    }

    /// Exact sum of costs over [`Self::filtered_view`].
    ///
    /// Mutations keep the unfiltered total representable, so the saturating
    /// add never actually clamps.
    pub fn total(&self, filter: MonthFilter) -> Decimal {
        self.filtered_view(filter)
            .into_iter()
            .map(Amounted::amount)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Month an expense is grouped under, in the ledger's UTC offset.
    pub fn month_key_of(&self, expense: &Expense) -> MonthKey {
        MonthKey::of(self.local_date(expense.date))
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Today's date in the ledger's UTC offset.
    pub fn today(&self) -> NaiveDate {
        self.local_date(self.clock.now())
    }

    pub fn current_month(&self) -> MonthKey {
        MonthKey::of(self.today())
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.entries.iter().find(|expense| expense.id == id)
    }

    pub fn entries(&self) -> &[Expense] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    fn position(&self, id: ExpenseId) -> Result<usize, CoreError> {
        self.entries
            .iter()
            .position(|expense| expense.id == id)
            .ok_or(CoreError::NotFound(id))
    }

    /// Rejects `cost` when the ledger total, with the entry at `replacing`
    /// swapped out, would no longer fit in a `Decimal`.
    fn ensure_total_fits(&self, cost: Decimal, replacing: Option<usize>) -> Result<(), CoreError> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != replacing)
            .try_fold(cost, |sum, (_, expense)| sum.checked_add(expense.cost))
            .map(|_| ())
            .ok_or_else(|| {
                CoreError::InvalidCost(format!("{cost} would overflow the ledger total"))
            })
    }

    fn persist(&self) -> Result<(), CoreError> {
        self.store.save(&self.entries)
    }

    /// `Current` stamps now. A specific month stamps local midnight on today's
    /// day-of-month, clamped to the month's last day.
    fn attributed_date(&self, month: AttributedMonth) -> DateTime<Utc> {
        let now = self.clock.now();
        match month {
            AttributedMonth::Current => now,
            AttributedMonth::Month(key) => {
                let day = self.local_date(now).day();
                key.day_clamped(day)
                    .and_hms_opt(0, 0, 0)
                    .and_then(|midnight| self.offset.from_local_datetime(&midnight).single())
                    .map(|local| local.with_timezone(&Utc))
                    .unwrap_or(now)
            }
        }
    }
}

/// Trims `raw` and rejects empty item names.
pub fn validate_item(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidItem);
    }
    Ok(trimmed.to_string())
}

pub fn validate_cost(cost: Decimal) -> Result<(), CoreError> {
    if cost <= Decimal::ZERO {
        return Err(CoreError::InvalidCost(format!(
            "{cost} is not greater than zero"
        )));
    }
    Ok(())
}

/// Parses user-entered cost text such as `4.50` or `$1,200`.
pub fn parse_cost(raw: &str) -> Result<Decimal, CoreError> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',')
        .collect();
    let cost = cleaned
        .parse::<Decimal>()
        .map_err(|_| CoreError::InvalidCost(format!("`{}` is not a number", raw.trim())))?;
    validate_cost(cost)?;
    Ok(cost)
}
