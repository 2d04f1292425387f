use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::{
    ledger::parse_cost, CoreError, DisplayFormatter, ExpenseLedger, ExpenseStore, FixedClock,
    LedgerView, MemoryStore, MonthlyBreakdown, SummaryService,
};
use spendbook_domain::{
    AttributedMonth, Category, Expense, ExpenseId, MonthFilter, MonthKey, MonthRange,
};

fn money(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

fn month(raw: &str) -> MonthKey {
    raw.parse().unwrap()
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn ledger_at(now: DateTime<Utc>) -> (ExpenseLedger, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let ledger = ExpenseLedger::open(Box::new(store.clone()), Box::new(FixedClock(now)), utc());
    (ledger, store)
}

fn stored(id: u64, item: &str, cost: &str, date: DateTime<Utc>) -> Expense {
    Expense::new(ExpenseId(id), item, money(cost), Category::from("Food"), date)
}

struct UnreadableStore;

impl ExpenseStore for UnreadableStore {
    fn load(&self) -> Result<Vec<Expense>, CoreError> {
        Err(CoreError::Storage("expected value at line 1 column 1".into()))
    }

    fn save(&self, _expenses: &[Expense]) -> Result<(), CoreError> {
        Ok(())
    }
}

#[test]
fn coffee_scenario_tracks_total_through_edit_and_delete() {
    let (mut ledger, _store) = ledger_at(at(2026, 1, 15, 10));

    let coffee = ledger
        .add("Coffee", money("4.50"), "Food", AttributedMonth::Current)
        .expect("add coffee");
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.total(MonthFilter::All), money("4.50"));

    let rejected = ledger.add("", money("5"), "Food", AttributedMonth::Current);
    assert!(matches!(rejected, Err(CoreError::InvalidItem)));
    assert_eq!(ledger.len(), 1);

    ledger
        .edit(coffee.id, "Coffee", money("6.00"), "Food")
        .expect("edit coffee");
    assert_eq!(ledger.total(MonthFilter::All), money("6.00"));

    ledger.delete(coffee.id).expect("delete coffee");
    assert!(ledger.is_empty());
    assert_eq!(ledger.total(MonthFilter::All), Decimal::ZERO);
}

#[test]
fn valid_adds_grow_ledger_with_unique_ids_newest_first() {
    let (mut ledger, store) = ledger_at(at(2026, 1, 15, 10));

    let items = ["Bread", "Bus", "Cinema", "Rent", "Soap"];
    for (index, item) in items.iter().enumerate() {
        ledger
            .add(item, Decimal::from(index as u32 + 1), "Other", AttributedMonth::Current)
            .expect("add");
    }

    assert_eq!(ledger.len(), items.len());
    let mut ids: Vec<_> = ledger.entries().iter().map(|e| e.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), items.len());
    assert_eq!(ledger.entries()[0].item, "Soap");
    assert_eq!(ledger.entries()[4].item, "Bread");
    assert_eq!(store.save_count(), items.len());
}

#[test]
fn invalid_adds_never_reach_storage() {
    let (mut ledger, store) = ledger_at(at(2026, 1, 15, 10));

    assert!(matches!(
        ledger.add("   ", money("3"), "Food", AttributedMonth::Current),
        Err(CoreError::InvalidItem)
    ));
    assert!(matches!(
        ledger.add("Tea", money("0"), "Food", AttributedMonth::Current),
        Err(CoreError::InvalidCost(_))
    ));
    assert!(matches!(
        ledger.add("Tea", money("-2.5"), "Food", AttributedMonth::Current),
        Err(CoreError::InvalidCost(_))
    ));

    assert!(ledger.is_empty());
    assert_eq!(store.save_count(), 0);
}

#[test]
fn add_trims_item_and_persists_full_ledger() {
    let (mut ledger, store) = ledger_at(at(2026, 1, 15, 10));
    ledger
        .add("  Groceries  ", money("23.10"), " Food ", AttributedMonth::Current)
        .unwrap();

    let saved = store.snapshot().expect("saved ledger");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].item, "Groceries");
    assert_eq!(saved[0].category.as_str(), "Food");
    assert_eq!(saved[0].date, at(2026, 1, 15, 10));
}

#[test]
fn edit_changes_only_mutable_fields_of_matching_entry() {
    let (mut ledger, _store) = ledger_at(at(2026, 1, 15, 10));
    let first = ledger
        .add("Taxi", money("18"), "Transport", AttributedMonth::Current)
        .unwrap();
    let second = ledger
        .add("Lunch", money("11"), "Food", AttributedMonth::Month(month("2025-12")))
        .unwrap();
    let before = ledger.entries().to_vec();

    let updated = ledger
        .edit(second.id, " Team lunch ", money("42.25"), "Work")
        .unwrap();

    assert_eq!(ledger.len(), 2);
    assert_eq!(updated.id, second.id);
    assert_eq!(updated.date, second.date);
    assert_eq!(updated.item, "Team lunch");
    assert_eq!(updated.cost, money("42.25"));
    assert_eq!(updated.category.as_str(), "Work");
    assert_eq!(ledger.get(first.id), Some(&before[1]));
}

#[test]
fn edit_validates_before_lookup() {
    let (mut ledger, store) = ledger_at(at(2026, 1, 15, 10));
    let taxi = ledger
        .add("Taxi", money("18"), "Transport", AttributedMonth::Current)
        .unwrap();

    assert!(matches!(
        ledger.edit(ExpenseId(999), "Taxi", money("1"), "Transport"),
        Err(CoreError::NotFound(ExpenseId(999)))
    ));
    assert!(matches!(
        ledger.edit(taxi.id, "", money("1"), "Transport"),
        Err(CoreError::InvalidItem)
    ));
    assert!(matches!(
        ledger.edit(ExpenseId(999), "Taxi", money("0"), "Transport"),
        Err(CoreError::InvalidCost(_))
    ));
    assert_eq!(ledger.get(taxi.id).unwrap().cost, money("18"));
    assert_eq!(store.save_count(), 1);
}

#[test]
fn delete_removes_exactly_one_and_keeps_order() {
    let (mut ledger, _store) = ledger_at(at(2026, 1, 15, 10));
    let ids: Vec<_> = ["a", "b", "c", "d"]
        .iter()
        .map(|item| {
            ledger
                .add(item, money("1"), "Other", AttributedMonth::Current)
                .unwrap()
                .id
        })
        .collect();

    ledger.delete(ids[1]).unwrap();

    let remaining: Vec<_> = ledger.entries().iter().map(|e| e.item.as_str()).collect();
    assert_eq!(remaining, vec!["d", "c", "a"]);
    assert!(matches!(
        ledger.delete(ids[1]),
        Err(CoreError::NotFound(_))
    ));
    assert_eq!(ledger.len(), 3);
}

#[test]
fn month_filter_selects_entries_and_totals() {
    let (mut ledger, _store) = ledger_at(at(2026, 1, 15, 10));
    ledger
        .add("Jan coffee", money("3.10"), "Food", AttributedMonth::Current)
        .unwrap();
    ledger
        .add("Dec gift", money("25.00"), "Shopping", AttributedMonth::Month(month("2025-12")))
        .unwrap();
    ledger
        .add("Jan bus", money("2.20"), "Transport", AttributedMonth::Month(month("2026-01")))
        .unwrap();

    let january = ledger.filtered_view(MonthFilter::Month(month("2026-01")));
    let names: Vec<_> = january.iter().map(|e| e.item.as_str()).collect();
    assert_eq!(names, vec!["Jan bus", "Jan coffee"]);

    assert_eq!(ledger.total(MonthFilter::Month(month("2026-01"))), money("5.30"));
    assert_eq!(ledger.total(MonthFilter::Month(month("2025-12"))), money("25.00"));
    assert_eq!(ledger.total(MonthFilter::Month(month("2026-02"))), Decimal::ZERO);
    assert_eq!(ledger.total(MonthFilter::All), money("30.30"));
}

#[test]
fn decimal_totals_do_not_drift() {
    let (mut ledger, _store) = ledger_at(at(2026, 1, 15, 10));
    for _ in 0..10 {
        ledger
            .add("Candy", money("0.10"), "Food", AttributedMonth::Current)
            .unwrap();
    }
    ledger
        .add("Gum", money("0.20"), "Food", AttributedMonth::Current)
        .unwrap();

    assert_eq!(ledger.total(MonthFilter::All), money("1.20"));
}

#[test]
fn explicit_month_mirrors_today_and_clamps_short_months() {
    let (mut ledger, _store) = ledger_at(at(2026, 1, 31, 22));

    let feb = ledger
        .add("Valentine", money("30"), "Gifts", AttributedMonth::Month(month("2026-02")))
        .unwrap();
    let nov = ledger
        .add("Boots", money("80"), "Shopping", AttributedMonth::Month(month("2025-11")))
        .unwrap();
    let dec = ledger
        .add("Tree", money("45"), "Other", AttributedMonth::Month(month("2025-12")))
        .unwrap();

    assert_eq!(feb.date, at(2026, 2, 28, 0));
    assert_eq!(nov.date, at(2025, 11, 30, 0));
    assert_eq!(dec.date, at(2025, 12, 31, 0));
    assert_eq!(ledger.month_key_of(&feb), month("2026-02"));
    assert_eq!(ledger.month_key_of(&nov), month("2025-11"));
}

#[test]
fn attribution_and_grouping_follow_ledger_offset() {
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let store = Arc::new(MemoryStore::new());
    // 23:30 UTC on Jan 31 is already Feb 1 at +02:00.
    let now = Utc.with_ymd_and_hms(2026, 1, 31, 23, 30, 0).unwrap();
    let mut ledger =
        ExpenseLedger::open(Box::new(store.clone()), Box::new(FixedClock(now)), plus_two);

    let current = ledger
        .add("Late snack", money("5"), "Food", AttributedMonth::Current)
        .unwrap();
    let march = ledger
        .add("Plan", money("5"), "Other", AttributedMonth::Month(month("2026-03")))
        .unwrap();

    assert_eq!(ledger.current_month(), month("2026-02"));
    assert_eq!(ledger.month_key_of(&current), month("2026-02"));
    assert_eq!(march.date, Utc.with_ymd_and_hms(2026, 2, 28, 22, 0, 0).unwrap());
    assert_eq!(ledger.month_key_of(&march), month("2026-03"));
}

#[test]
fn failed_save_rolls_back_every_mutation() {
    let (mut ledger, store) = ledger_at(at(2026, 1, 15, 10));
    let kept = ledger
        .add("Kept", money("10"), "Other", AttributedMonth::Current)
        .unwrap();
    store.set_fail_saves(true);

    let add = ledger.add("Lost", money("1"), "Other", AttributedMonth::Current);
    assert!(matches!(add, Err(CoreError::Storage(_))));
    assert_eq!(ledger.len(), 1);

    let edit = ledger.edit(kept.id, "Changed", money("99"), "Other");
    assert!(edit.unwrap_err().is_storage());
    assert_eq!(ledger.get(kept.id), Some(&kept));

    let delete = ledger.delete(kept.id);
    assert!(delete.unwrap_err().is_storage());
    assert_eq!(ledger.entries(), &[kept.clone()]);

    store.set_fail_saves(false);
    let next = ledger
        .add("Later", money("2"), "Other", AttributedMonth::Current)
        .unwrap();
    assert!(next.id > kept.id);
    assert_eq!(store.snapshot().unwrap().len(), 2);
}

#[test]
fn unreadable_store_degrades_to_empty_ledger() {
    let ledger = ExpenseLedger::open(
        Box::new(UnreadableStore),
        Box::new(FixedClock(at(2026, 1, 15, 10))),
        utc(),
    );

    assert!(ledger.is_empty());
    assert!(ledger.load_report().degraded.is_some());
}

#[test]
fn open_skips_duplicate_and_malformed_entries() {
    let date = at(2025, 12, 5, 9);
    let store = MemoryStore::with_expenses(vec![
        stored(1_767_225_600_123, "Coffee", "4.5", date),
        stored(1_767_225_600_123, "Copy", "9", date),
        stored(5, "", "3", date),
        stored(6, "Free sample", "0", date),
        stored(7, "Bread", "2.40", date),
    ]);
    let mut ledger =
        ExpenseLedger::open(Box::new(store), Box::new(FixedClock(at(2026, 1, 15, 10))), utc());

    let items: Vec<_> = ledger.entries().iter().map(|e| e.item.as_str()).collect();
    assert_eq!(items, vec!["Coffee", "Bread"]);
    assert_eq!(ledger.load_report().warnings.len(), 3);
    assert_eq!(ledger.load_report().loaded, 2);

    let fresh = ledger
        .add("Jam", money("3"), "Food", AttributedMonth::Current)
        .unwrap();
    assert_eq!(fresh.id, ExpenseId(1_767_225_600_124));
}

#[test]
fn monthly_breakdown_partitions_every_entry_once() {
    let store = MemoryStore::with_expenses(vec![
        stored(1, "Old", "7.00", at(2025, 6, 1, 12)),
        stored(2, "Nov", "10.00", at(2025, 11, 2, 12)),
        stored(3, "Nov 2", "5.55", at(2025, 11, 28, 12)),
        stored(4, "Jan", "1.45", at(2026, 1, 3, 12)),
        stored(5, "Future", "100", at(2027, 2, 1, 12)),
    ]);
    let ledger =
        ExpenseLedger::open(Box::new(store), Box::new(FixedClock(at(2026, 1, 15, 10))), utc());

    let breakdown = MonthlyBreakdown::compute(&ledger, &MonthRange::default());

    assert_eq!(breakdown.months.len(), 14);
    assert_eq!(breakdown.months[0].month, month("2025-11"));
    assert_eq!(breakdown.months[0].total, money("15.55"));
    assert_eq!(breakdown.months[0].count, 2);
    assert_eq!(breakdown.months[1].total, Decimal::ZERO);
    assert_eq!(breakdown.months[2].total, money("1.45"));
    assert_eq!(breakdown.outside_range, money("107"));
    assert_eq!(breakdown.outside_count, 2);
    assert_eq!(breakdown.grand_total(), ledger.total(MonthFilter::All));
    assert_eq!(breakdown.entry_count(), ledger.len());
}

#[test]
fn category_totals_sort_by_amount_then_name() {
    let date = at(2026, 1, 2, 12);
    let store = MemoryStore::with_expenses(vec![
        Expense::new(ExpenseId(1), "Bus", money("3"), "Transport".into(), date),
        Expense::new(ExpenseId(2), "Soup", money("4"), "Food".into(), date),
        Expense::new(ExpenseId(3), "Bread", money("2"), "Food".into(), date),
        Expense::new(ExpenseId(4), "Film", money("6"), "Entertainment".into(), date),
    ]);
    let ledger =
        ExpenseLedger::open(Box::new(store), Box::new(FixedClock(at(2026, 1, 15, 10))), utc());

    let rows = SummaryService::category_totals(&ledger, MonthFilter::All);
    let order: Vec<_> = rows.iter().map(|row| row.category.as_str()).collect();

    assert_eq!(order, vec!["Entertainment", "Food", "Transport"]);
    assert_eq!(rows[1].total, money("6"));
    assert_eq!(rows[1].count, 2);
}

#[test]
fn view_formats_rows_and_total_for_filter() {
    let (mut ledger, _store) = ledger_at(at(2026, 1, 15, 10));
    ledger
        .add("Coffee", money("4.5"), "Food", AttributedMonth::Current)
        .unwrap();
    ledger
        .add("Laptop", money("1299.99"), "Shopping", AttributedMonth::Month(month("2025-12")))
        .unwrap();

    let formatter = DisplayFormatter::default();
    let all = LedgerView::build(&ledger, MonthFilter::All, &formatter);
    assert_eq!(all.rows.len(), 2);
    assert_eq!(all.rows[0].item, "Laptop");
    assert_eq!(all.rows[0].amount_label, "$1,299.99");
    assert_eq!(all.rows[0].date_label, "Dec 15");
    assert_eq!(all.rows[1].date_label, "Today");
    assert_eq!(all.total_label, "$1,304.49");

    let february = LedgerView::build(&ledger, MonthFilter::Month(month("2026-02")), &formatter);
    assert!(february.is_empty());
    assert_eq!(february.total_label, "$0.00");
}

#[test]
fn parse_cost_accepts_currency_text() {
    assert_eq!(parse_cost("4.50").unwrap(), money("4.50"));
    assert_eq!(parse_cost(" $1,200 ").unwrap(), money("1200"));
    assert!(matches!(parse_cost("abc"), Err(CoreError::InvalidCost(_))));
    assert!(matches!(parse_cost("0"), Err(CoreError::InvalidCost(_))));
    assert!(matches!(parse_cost("-3"), Err(CoreError::InvalidCost(_))));
}

#[test]
fn costs_that_would_overflow_the_total_are_rejected() {
    let (mut ledger, store) = ledger_at(at(2026, 1, 15, 10));
    let huge = money("50000000000000000000000000000");

    let yacht = ledger
        .add("Yacht", huge, "Other", AttributedMonth::Current)
        .expect("first yacht fits");
    let second = ledger.add("Yacht", huge, "Other", AttributedMonth::Current);
    assert!(matches!(second, Err(CoreError::InvalidCost(_))));
    assert_eq!(ledger.len(), 1);
    assert_eq!(store.save_count(), 1);

    let coffee = ledger
        .add("Coffee", money("4"), "Food", AttributedMonth::Current)
        .expect("small add still fits");
    let bumped = ledger.edit(coffee.id, "Coffee", huge, "Food");
    assert!(matches!(bumped, Err(CoreError::InvalidCost(_))));

    // Replacing an entry's own cost does not count it twice.
    ledger
        .edit(yacht.id, "Yacht", huge, "Other")
        .expect("re-saving the same cost fits");

    assert_eq!(ledger.total(MonthFilter::All), huge + money("4"));
    let breakdown = MonthlyBreakdown::compute(&ledger, &MonthRange::default());
    assert_eq!(breakdown.grand_total(), ledger.total(MonthFilter::All));
}

#[test]
fn open_skips_entries_whose_cost_overflows_the_total() {
    let huge = money("50000000000000000000000000000");
    let store = MemoryStore::with_expenses(vec![
        stored(2, "Yacht", "50000000000000000000000000000", at(2026, 1, 2, 9)),
        stored(1, "Yacht", "50000000000000000000000000000", at(2026, 1, 1, 9)),
    ]);
    let ledger = ExpenseLedger::open(Box::new(store), Box::new(FixedClock(at(2026, 1, 15, 10))), utc());

    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.load_report().warnings.len(), 1);
    assert_eq!(ledger.total(MonthFilter::All), huge);
    assert_eq!(SummaryService::category_totals(&ledger, MonthFilter::All)[0].total, huge);
}
