use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use spendbook_domain::Expense;

use crate::CoreError;

/// Abstraction over the single storage slot holding the serialized ledger.
pub trait ExpenseStore: Send + Sync {
    /// Returns every stored expense in ledger order. An absent slot is an empty ledger.
    fn load(&self) -> Result<Vec<Expense>, CoreError>;

    /// Replaces the stored ledger with `expenses`.
    fn save(&self, expenses: &[Expense]) -> Result<(), CoreError>;
}

/// Keeps the ledger in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Vec<Expense>>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expenses(expenses: Vec<Expense>) -> Self {
        Self {
            slot: Mutex::new(Some(expenses)),
            ..Self::default()
        }
    }

    /// Makes every subsequent `save` fail with [`CoreError::Storage`].
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Copy of whatever was last saved.
    pub fn snapshot(&self) -> Option<Vec<Expense>> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl ExpenseStore for MemoryStore {
    fn load(&self) -> Result<Vec<Expense>, CoreError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        Ok(slot.clone().unwrap_or_default())
    }

    fn save(&self, expenses: &[Expense]) -> Result<(), CoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("memory store rejected the write".into()));
        }
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        *slot = Some(expenses.to_vec());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<S: ExpenseStore + ?Sized> ExpenseStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Vec<Expense>, CoreError> {
        (**self).load()
    }

    fn save(&self, expenses: &[Expense]) -> Result<(), CoreError> {
        (**self).save(expenses)
    }
}
