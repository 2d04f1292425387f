use std::{
    cmp::Reverse,
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use spendbook_core::{CoreError, ExpenseStore};
use spendbook_domain::Expense;
use tracing::{debug, warn};

const EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// File-backed JSON slot holding the whole ledger as one array.
#[derive(Debug, Clone)]
pub struct JsonExpenseStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonExpenseStore {
    pub fn new(path: PathBuf, backups_dir: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(path, backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(
        path: PathBuf,
        backups_dir: PathBuf,
        retention: usize,
    ) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            path,
            backups_dir,
            retention: retention.max(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Backup files, newest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", self.stem());
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let matches_stem = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix));
            if matches_stem {
                entries.push(path);
            }
        }
        entries.sort_by_key(|path| Reverse(path.file_name().map(|name| name.to_owned())));
        Ok(entries)
    }

    fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("expenses")
            .to_string()
    }

    fn backup_existing_file(&self) -> Result<(), CoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup = self
            .backups_dir
            .join(format!("{}_{}.{}", self.stem(), timestamp, EXTENSION));
        fs::copy(&self.path, &backup)?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for stale in self.list_backups()?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(stale);
        }
        Ok(())
    }

    /// Copies an unparseable ledger aside so a later save cannot overwrite it.
    /// An existing copy with the same bytes is reused instead of adding another.
    fn quarantine(&self, contents: &[u8]) -> Result<PathBuf, CoreError> {
        if let Some(existing) = self.find_quarantined(contents)? {
            return Ok(existing);
        }
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let target = self.path.with_file_name(format!(
            "{}{}.{}",
            self.quarantine_prefix(),
            timestamp,
            EXTENSION
        ));
        fs::write(&target, contents)?;
        Ok(target)
    }

    fn quarantine_prefix(&self) -> String {
        format!("{}.corrupt-", self.stem())
    }

    fn find_quarantined(&self, contents: &[u8]) -> Result<Option<PathBuf>, CoreError> {
        let Some(dir) = self.path.parent() else {
            return Ok(None);
        };
        let prefix = self.quarantine_prefix();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_copy = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix));
            if is_copy && fs::read(&path)? == contents {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

impl ExpenseStore for JsonExpenseStore {
    fn load(&self) -> Result<Vec<Expense>, CoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        // Invalid UTF-8 surfaces as a parse error here, like any other bad JSON.
        match serde_json::from_slice(&data) {
            Ok(expenses) => Ok(expenses),
            Err(err) => {
                let kept = self.quarantine(&data)?;
                warn!(path = %kept.display(), "unreadable ledger copied aside");
                Err(CoreError::Storage(format!(
                    "{} is not a valid expense list ({err}); a copy was kept at {}",
                    self.path.display(),
                    kept.display()
                )))
            }
        }
    }

    fn save(&self, expenses: &[Expense]) -> Result<(), CoreError> {
        self.backup_existing_file()?;
        save_expenses_to_path(expenses, &self.path)?;
        debug!(path = %self.path.display(), count = expenses.len(), "ledger saved");
        Ok(())
    }
}

/// Writes `expenses` to `path` through a temporary file and rename.
pub fn save_expenses_to_path(expenses: &[Expense], path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_expenses(expenses)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads an expense list from the provided filesystem path.
pub fn load_expenses_from_path(path: &Path) -> Result<Vec<Expense>, CoreError> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

fn serialize_expenses(expenses: &[Expense]) -> Result<String, CoreError> {
    serde_json::to_string_pretty(expenses).map_err(|err| CoreError::Serde(err.to_string()))
}
