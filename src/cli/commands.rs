//! Command table and handlers for the shell.

use dialoguer::{Confirm, Input, Select};
use rust_decimal::Decimal;
use spendbook_core::{
    parse_cost, validate_item, CoreError, CurrencyFormatter, LedgerView, MonthlyBreakdown,
    SummaryService,
};
use spendbook_domain::{AttributedMonth, ExpenseId, MonthFilter};

use crate::cli::{
    context::{CliMode, LoopControl, ShellContext},
    error::CommandError,
    output,
};

/// Name, usage line, and one-line description of a shell command.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "add",
        usage: "add <item> <cost> [category]",
        summary: "Record an expense in the selected month",
    },
    CommandSpec {
        name: "edit",
        usage: "edit <id> [<item> <cost> [category]]",
        summary: "Change an expense; prompts for fields when only an id is given",
    },
    CommandSpec {
        name: "delete",
        usage: "delete <id> [--yes]",
        summary: "Remove an expense after confirmation",
    },
    CommandSpec {
        name: "month",
        usage: "month [YYYY-MM|all]",
        summary: "Select the month to view, or show the current selection",
    },
    CommandSpec {
        name: "months",
        usage: "months",
        summary: "List the selectable months",
    },
    CommandSpec {
        name: "list",
        usage: "list",
        summary: "Show expenses for the selected month",
    },
    CommandSpec {
        name: "total",
        usage: "total",
        summary: "Show the total for the selected month",
    },
    CommandSpec {
        name: "summary",
        usage: "summary",
        summary: "Show monthly and per-category totals",
    },
    CommandSpec {
        name: "categories",
        usage: "categories",
        summary: "List the configured categories",
    },
    CommandSpec {
        name: "help",
        usage: "help [command]",
        summary: "Show available commands",
    },
    CommandSpec {
        name: "exit",
        usage: "exit",
        summary: "Leave the shell (alias: quit)",
    },
];

fn usage(name: &str) -> CommandError {
    let line = COMMANDS
        .iter()
        .find(|command| command.name == name)
        .map(|command| command.usage)
        .unwrap_or(name);
    CommandError::InvalidArguments(format!("Usage: {line}"))
}

fn parse_id(raw: &str) -> Result<ExpenseId, CommandError> {
    raw.parse::<ExpenseId>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not an expense id")))
}

impl ShellContext {
    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        match command {
            "add" => self.cmd_add(args),
            "edit" => self.cmd_edit(args),
            "delete" | "rm" => self.cmd_delete(args),
            "month" => self.cmd_month(args),
            "months" => self.cmd_months(),
            "list" | "ls" => {
                self.render_list();
                Ok(LoopControl::Continue)
            }
            "total" => {
                self.show_total();
                Ok(LoopControl::Continue)
            }
            "summary" => self.cmd_summary(),
            "categories" => self.cmd_categories(),
            "help" => self.cmd_help(args),
            "exit" | "quit" => Ok(LoopControl::Exit),
            other => {
                self.suggest_command(other);
                Ok(LoopControl::Continue)
            }
        }
    }

    fn cmd_add(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let (item, raw_cost, category) = match args {
            [item, cost] => (item.to_string(), cost.to_string(), self.resolve_category(None)),
            [item, cost, category] => (
                item.to_string(),
                cost.to_string(),
                self.resolve_category(Some(*category)),
            ),
            [] if self.mode == CliMode::Interactive => {
                let item = self.prompt_text("Item", None)?;
                let cost = self.prompt_text("Cost", None)?;
                let fallback = self.resolve_category(None);
                let category = self.prompt_category(&fallback)?;
                (item, cost, category)
            }
            _ => return Err(usage("add")),
        };

        validate_item(&item)?;
        let cost = parse_cost(&raw_cost)?;
        let expense =
            self.ledger
                .add(&item, cost, category, AttributedMonth::from(self.selected))?;

        output::success(format!(
            "Added #{} {} ({}) {}",
            expense.id,
            expense.item,
            expense.category,
            self.amount(expense.cost)
        ));
        self.show_total();
        Ok(LoopControl::Continue)
    }

    fn cmd_edit(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let Some((raw_id, fields)) = args.split_first() else {
            return Err(usage("edit"));
        };
        let id = parse_id(raw_id)?;
        let current_category = self
            .ledger
            .get(id)
            .map(|expense| expense.category.to_string());

        let (item, raw_cost, category) = match fields {
            [item, cost] => {
                let category = current_category.unwrap_or_else(|| self.resolve_category(None));
                (item.to_string(), cost.to_string(), category)
            }
            [item, cost, category] => (
                item.to_string(),
                cost.to_string(),
                self.resolve_category(Some(*category)),
            ),
            [] if self.mode == CliMode::Interactive => {
                let current = self
                    .ledger
                    .get(id)
                    .cloned()
                    .ok_or(CoreError::NotFound(id))?;
                let item = self.prompt_text("Item", Some(&current.item))?;
                let cost = self.prompt_text("Cost", Some(&current.cost.to_string()))?;
                let category = self.prompt_category(current.category.as_str())?;
                (item, cost, category)
            }
            _ => return Err(usage("edit")),
        };

        validate_item(&item)?;
        let cost = parse_cost(&raw_cost)?;
        let expense = self.ledger.edit(id, &item, cost, category)?;

        output::success(format!(
            "Updated #{} {} ({}) {}",
            expense.id,
            expense.item,
            expense.category,
            self.amount(expense.cost)
        ));
        self.show_total();
        Ok(LoopControl::Continue)
    }

    fn cmd_delete(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        let mut skip_confirm = false;
        let mut raw_id = None;
        for arg in args {
            match *arg {
                "--yes" | "-y" => skip_confirm = true,
                value if raw_id.is_none() => raw_id = Some(value),
                _ => return Err(usage("delete")),
            }
        }
        let id = parse_id(raw_id.ok_or_else(|| usage("delete"))?)?;
        let expense = self
            .ledger
            .get(id)
            .cloned()
            .ok_or(CoreError::NotFound(id))?;

        if !skip_confirm && self.mode == CliMode::Interactive {
            let confirmed = Confirm::with_theme(&self.theme)
                .with_prompt(format!(
                    "Delete this expense? #{} {} {}",
                    expense.id,
                    expense.item,
                    self.amount(expense.cost)
                ))
                .default(false)
                .interact()?;
            if !confirmed {
                output::info("Delete cancelled.");
                return Ok(LoopControl::Continue);
            }
        }

        self.ledger.delete(id)?;
        output::success(format!("Deleted #{} {}", expense.id, expense.item));
        self.show_total();
        Ok(LoopControl::Continue)
    }

    fn cmd_month(&mut self, args: &[&str]) -> Result<LoopControl, CommandError> {
        match args {
            [] => output::info(format!(
                "Showing {}. The current month is {}.",
                self.selection_label(),
                self.ledger.current_month()
            )),
            [token] => {
                let filter = token
                    .parse::<MonthFilter>()
                    .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
                let range = self.config.month_range;
                if !range.allows(filter) {
                    return Err(CommandError::InvalidArguments(format!(
                        "{filter} is outside the selectable months {}..{}",
                        range.start, range.end
                    )));
                }
                self.selected = filter;
                output::success(format!("Showing {}.", self.selection_label()));
                self.render_list();
            }
            _ => return Err(usage("month")),
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_months(&self) -> Result<LoopControl, CommandError> {
        output::section("Selectable months");
        for option in self.config.month_range.options() {
            let marker = if option.filter == self.selected { "*" } else { " " };
            println!("{marker} {:<8} {}", option.filter.to_string(), option.label);
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_summary(&self) -> Result<LoopControl, CommandError> {
        let breakdown = MonthlyBreakdown::compute(&self.ledger, &self.config.month_range);

        output::section("Monthly totals");
        for month in &breakdown.months {
            println!(
                "  {:<16} {:>12}  ({} {})",
                month.month.label(),
                self.amount(month.total),
                month.count,
                plural(month.count)
            );
        }
        if breakdown.outside_count > 0 {
            println!(
                "  {:<16} {:>12}  ({} {})",
                "Other months",
                self.amount(breakdown.outside_range),
                breakdown.outside_count,
                plural(breakdown.outside_count)
            );
        }
        output::total("All time", self.amount(breakdown.grand_total()));

        output::section(format!("By category ({})", self.selection_label()));
        let totals = SummaryService::category_totals(&self.ledger, self.selected);
        if totals.is_empty() {
            output::info("No expenses yet.");
        }
        for entry in totals {
            println!(
                "  {:<16} {:>12}  ({} {})",
                entry.category.as_str(),
                self.amount(entry.total),
                entry.count,
                plural(entry.count)
            );
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_categories(&self) -> Result<LoopControl, CommandError> {
        output::section("Categories");
        let fallback = self.config.fallback_category();
        for name in self.config.categories.iter().filter(|name| !name.trim().is_empty()) {
            if name.trim() == fallback {
                println!("  {name} (default)");
            } else {
                println!("  {name}");
            }
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_help(&self, args: &[&str]) -> Result<LoopControl, CommandError> {
        match args {
            [] => {
                output::section("Commands");
                for command in COMMANDS {
                    println!("  {:<38} {}", command.usage, command.summary);
                }
            }
            [name] => {
                let name = name.to_ascii_lowercase();
                match COMMANDS.iter().find(|command| command.name == name) {
                    Some(command) => {
                        println!("{}", command.usage);
                        println!("  {}", command.summary);
                    }
                    None => self.suggest_command(&name),
                }
            }
            _ => return Err(usage("help")),
        }
        Ok(LoopControl::Continue)
    }

    pub(crate) fn render_list(&self) {
        let view = LedgerView::build(&self.ledger, self.selected, &self.formatter);
        output::section(format!("Expenses ({})", self.selection_label()));
        if view.is_empty() {
            output::info("No expenses yet. Add one with `add <item> <cost> [category]`.");
        }
        for row in &view.rows {
            println!(
                "  {:<15} {:<24} {:<14} {:<10} {:>12}",
                format!("#{}", row.id),
                row.item, row.category, row.date_label, row.amount_label
            );
        }
        output::total(
            format!("Total ({})", self.selection_label()),
            &view.total_label,
        );
    }

    pub(crate) fn show_total(&self) {
        output::total(
            format!("Total ({})", self.selection_label()),
            self.amount(self.ledger.total(self.selected)),
        );
    }

    fn amount(&self, value: Decimal) -> String {
        self.formatter.format_amount(value)
    }

    /// Canonical spelling of a configured category, the raw text otherwise, and
    /// the default when blank or absent.
    fn resolve_category(&self, raw: Option<&str>) -> String {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return self.config.fallback_category().to_string();
        }
        self.config
            .categories
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(raw))
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| raw.to_string())
    }

    fn prompt_text(&self, prompt: &str, initial: Option<&str>) -> Result<String, CommandError> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(prompt);
        if let Some(initial) = initial {
            input = input.with_initial_text(initial);
        }
        Ok(input.interact_text()?)
    }

    fn prompt_category(&self, current: &str) -> Result<String, CommandError> {
        let mut options: Vec<String> = self
            .config
            .categories
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let default = match options.iter().position(|name| name == current) {
            Some(index) => index,
            None => {
                options.push(current.to_string());
                options.len() - 1
            }
        };
        let index = Select::with_theme(&self.theme)
            .with_prompt("Category")
            .items(&options)
            .default(default)
            .interact()?;
        Ok(options.swap_remove(index))
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "expense"
    } else {
        "expenses"
    }
}
