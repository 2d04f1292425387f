use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: Decimal) -> String;
}

/// Formats dates for presentation, relative to `today`.
pub trait DateFormatter: Send + Sync {
    fn format_date(&self, date: NaiveDate, today: NaiveDate) -> String;
}

/// Digit grouping and decimal separators for a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberSeparators {
    pub group: char,
    pub decimal: char,
}

impl NumberSeparators {
    pub const EN: NumberSeparators = NumberSeparators {
        group: ',',
        decimal: '.',
    };

    /// Separators for a BCP 47 tag such as `de-DE`. Unknown tags fall back to `en`.
    pub fn for_locale(locale: &str) -> Self {
        let mut parts = locale.trim().split(['-', '_']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        let region = parts.last().unwrap_or_default().to_ascii_uppercase();

        if matches!(region.as_str(), "CH" | "LI") {
            return Self {
                group: '\'',
                decimal: '.',
            };
        }
        match language.as_str() {
            "de" | "es" | "it" | "nl" | "pt" | "id" | "tr" | "da" | "el" => Self {
                group: '.',
                decimal: ',',
            },
            "fr" | "ru" | "pl" | "sv" | "nb" | "no" | "fi" | "cs" | "sk" | "uk" | "hu" => Self {
                group: ' ',
                decimal: ',',
            },
            _ => Self::EN,
        }
    }
}

/// Currency and date display. Defaults to en-US (`$1,234.56`); dates read
/// `Today` / `Yesterday` / `Oct 3`.
#[derive(Debug, Clone)]
pub struct DisplayFormatter {
    currency: String,
    separators: NumberSeparators,
}

impl DisplayFormatter {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into().trim().to_ascii_uppercase(),
            separators: NumberSeparators::EN,
        }
    }

    /// Uses the number separators of `locale`.
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.separators = NumberSeparators::for_locale(locale);
        self
    }

    fn prefix(&self) -> String {
        match self.currency.as_str() {
            "USD" => "$".into(),
            "EUR" => "€".into(),
            "GBP" => "£".into(),
            "JPY" => "¥".into(),
            other => format!("{other} "),
        }
    }

    fn minor_digits(&self) -> u32 {
        match self.currency.as_str() {
            "JPY" => 0,
            _ => 2,
        }
    }
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl CurrencyFormatter for DisplayFormatter {
    fn format_amount(&self, amount: Decimal) -> String {
        let digits = self.minor_digits();
        let rounded =
            amount.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let plain = format!("{:.*}", digits as usize, rounded.abs());
        let (whole, fraction) = match plain.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (plain.as_str(), None),
        };
        let mut out = format!(
            "{sign}{}{}",
            self.prefix(),
            group_thousands(whole, self.separators.group)
        );
        if let Some(fraction) = fraction {
            out.push(self.separators.decimal);
            out.push_str(fraction);
        }
        out
    }
}

impl DateFormatter for DisplayFormatter {
    fn format_date(&self, date: NaiveDate, today: NaiveDate) -> String {
        if date == today {
            "Today".into()
        } else if today
            .checked_sub_signed(Duration::days(1))
            .is_some_and(|yesterday| yesterday == date)
        {
            "Yesterday".into()
        } else {
            date.format("%b %-d").to_string()
        }
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}
