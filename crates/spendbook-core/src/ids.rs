use spendbook_domain::ExpenseId;

/// Monotonic id source. Never hands out an id at or below one it has already seen.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    /// Seeds the sequence past every id in `existing`.
    pub fn after<I>(existing: I) -> Self
    where
        I: IntoIterator<Item = ExpenseId>,
    {
        let last = existing.into_iter().map(ExpenseId::value).max().unwrap_or(0);
        Self { last }
    }

    pub fn next_id(&mut self) -> ExpenseId {
        self.last = self.last.saturating_add(1);
        ExpenseId(self.last)
    }
}
