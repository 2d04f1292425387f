use std::path::Path;

use dialoguer::theme::ColorfulTheme;
use spendbook_config::{Config, ConfigManager};
use spendbook_core::{CoreError, DisplayFormatter, ExpenseLedger, SystemClock};
use spendbook_domain::MonthFilter;
use spendbook_storage_json::JsonExpenseStore;
use strsim::levenshtein;
use tracing::info;

use crate::cli::{
    commands::COMMANDS,
    error::{CliError, CommandError},
    output,
};

const SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Shell state shared by every command: the ledger, preferences, and the
/// currently selected month.
pub struct ShellContext {
    pub mode: CliMode,
    pub running: bool,
    pub last_command: Option<String>,
    pub(crate) ledger: ExpenseLedger,
    pub(crate) config: Config,
    pub(crate) selected: MonthFilter,
    pub(crate) formatter: DisplayFormatter,
    pub(crate) theme: ColorfulTheme,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, &Config::resolve_base_dir())
    }

    /// Loads config and ledger from `base`, creating both on first run.
    pub fn with_base_dir(mode: CliMode, base: &Path) -> Result<Self, CliError> {
        let config = ConfigManager::with_base_dir(base)?.load_or_init()?;
        let offset = config.utc_offset()?;
        let store = JsonExpenseStore::with_retention(
            config.resolve_ledger_path(base),
            config.resolve_backup_dir(base),
            config.backup_retention,
        )?;
        let ledger_path = store.path().display().to_string();
        let ledger = ExpenseLedger::open(Box::new(store), Box::new(SystemClock), offset);

        if mode == CliMode::Script || !config.ui_color_enabled {
            colored::control::set_override(false);
        }

        info!(path = %ledger_path, expenses = ledger.len(), "ledger opened");

        let context = Self {
            mode,
            running: true,
            last_command: None,
            formatter: DisplayFormatter::new(config.currency.clone()).with_locale(&config.locale),
            ledger,
            config,
            selected: MonthFilter::All,
            theme: ColorfulTheme::default(),
        };
        context.report_load();
        Ok(context)
    }

    pub fn ledger(&self) -> &ExpenseLedger {
        &self.ledger
    }

    pub fn selected(&self) -> MonthFilter {
        self.selected
    }

    pub fn prompt(&self) -> String {
        format!("spendbook [{}]> ", self.selected)
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        COMMANDS.iter().map(|command| command.name).collect()
    }

    /// Human label of the selected month, e.g. `January 2026` or `all months`.
    pub(crate) fn selection_label(&self) -> String {
        match self.selected {
            MonthFilter::All => "all months".to_string(),
            MonthFilter::Month(key) => key.label(),
        }
    }

    /// Parses and runs one input line. Command failures are reported and never
    /// end the shell.
    pub fn process_line(&mut self, line: &str) -> LoopControl {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return LoopControl::Continue;
        }

        let tokens = match shell_words::split(trimmed) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(format!("Could not parse input: {err}"));
                return LoopControl::Continue;
            }
        };
        let Some((raw, rest)) = tokens.split_first() else {
            return LoopControl::Continue;
        };
        let command = raw.to_ascii_lowercase();
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        self.last_command = Some(trimmed.to_string());

        match self.dispatch(&command, &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                LoopControl::Exit
            }
            Ok(LoopControl::Continue) => LoopControl::Continue,
            Err(err) => {
                self.report_error(err);
                LoopControl::Continue
            }
        }
    }

    pub fn report_error(&self, err: CommandError) {
        match err {
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Type `help <command>` for usage.");
            }
            CommandError::Core(CoreError::NotFound(id)) => {
                output::warning(format!("Expense #{id} was not found; nothing changed."));
            }
            CommandError::Core(err) if err.is_validation() => output::error(err),
            CommandError::Core(err) if err.is_storage() => {
                output::error(format!("Could not save expenses: {err}"));
            }
            other => output::error(other),
        }
    }

    pub(crate) fn suggest_command(&self, unknown: &str) {
        let suggestion = COMMANDS
            .iter()
            .map(|command| (command.name, levenshtein(unknown, command.name)))
            .filter(|(_, distance)| *distance <= SUGGESTION_DISTANCE)
            .min_by_key(|(_, distance)| *distance);

        match suggestion {
            Some((name, _)) => {
                output::warning(format!("Unknown command `{unknown}`. Did you mean `{name}`?"))
            }
            None => output::warning(format!(
                "Unknown command `{unknown}`. Type `help` to list commands."
            )),
        }
    }

    fn report_load(&self) {
        let report = self.ledger.load_report();
        if let Some(reason) = &report.degraded {
            output::warning(format!(
                "Stored expenses could not be read, starting with an empty list ({reason})."
            ));
        }
        for warning in &report.warnings {
            output::warning(warning);
        }
    }
}
