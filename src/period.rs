use chrono::{Datelike, FixedOffset, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{LedgerError, Result};

/// portuguese month names, index 0 = janeiro
pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9999;

/// month name for 1-12
pub fn month_name(month: u32) -> Result<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .ok_or(LedgerError::InvalidMonthNumber { month })
}

/// month number for a portuguese month name, ignoring case and accents
pub fn month_number(name: &str) -> Result<u32> {
    let wanted = fold_name(name);
    MONTH_NAMES
        .iter()
        .position(|candidate| fold_name(candidate) == wanted)
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| LedgerError::UnknownMonthName {
            name: name.trim().to_string(),
        })
}

fn fold_name(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// today's calendar date at the given utc offset
pub fn today(time_provider: &SafeTimeProvider, offset: FixedOffset) -> NaiveDate {
    time_provider.now().with_timezone(&offset).date_naive()
}

/// billing period: a (month, year) pair
///
/// Field order matters: the derived `Ord` compares year first, then month,
/// which is chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPeriod {
    month: u32,
    year: i32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = LedgerError;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        Period::new(raw.month, raw.year)
    }
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidMonthNumber { month });
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(LedgerError::InvalidYear {
                value: year.to_string(),
            });
        }
        Ok(Self { year, month })
    }

    /// caller guarantees `month` is within 1..=12
    pub(crate) const fn new_unchecked(month: u32, year: i32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// period containing today
    pub fn current(time_provider: &SafeTimeProvider, offset: FixedOffset) -> Self {
        Self::from_date(today(time_provider, offset))
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// `year * 100 + month`, monotonic in chronological order
    pub fn sort_key(&self) -> i32 {
        self.year * 100 + self.month as i32
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    pub fn succ(&self) -> Self {
        self.add_months(1)
    }

    pub fn pred(&self) -> Self {
        self.add_months(-1)
    }

    pub fn add_months(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// due date on `due_day`, clamped to the last day of the month
    pub fn due_date(&self, due_day: u32) -> NaiveDate {
        let day = due_day.clamp(1, days_in_month(self.year, self.month));
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.first_day())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name(), self.year)
    }
}

impl FromStr for Period {
    type Err = LedgerError;

    /// strict `"Nome/Ano"` form; bare names need a year, see [`parse_month_from_string`]
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some(_) => parse_month_from_string(s, 0),
            None => Err(LedgerError::MalformedPeriodLabel {
                label: s.to_string(),
            }),
        }
    }
}

/// parse a legacy `"Nome"` or `"Nome/Ano"` label
///
/// A bare month name is taken to belong to `current_year`.
pub fn parse_month_from_string(label: &str, current_year: i32) -> Result<Period> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::MalformedPeriodLabel {
            label: label.to_string(),
        });
    }

    let (name, year) = match trimmed.split_once('/') {
        Some((name, year_str)) => {
            let year_str = year_str.trim();
            if year_str.contains('/') {
                return Err(LedgerError::MalformedPeriodLabel {
                    label: label.to_string(),
                });
            }
            let year = year_str.parse::<i32>().map_err(|_| LedgerError::InvalidYear {
                value: year_str.to_string(),
            })?;
            (name, year)
        }
        None => (trimmed, current_year),
    };

    Period::new(month_number(name)?, year)
}

/// where a payment's period comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSource<'a> {
    /// month and year numbers stored on the row
    Canonical(Period),
    /// only the human label is available
    Legacy(&'a str),
}

impl PeriodSource<'_> {
    /// resolve to a period, parsing the legacy label if needed
    pub fn resolve(&self, current_year: i32) -> Result<Period> {
        match self {
            PeriodSource::Canonical(period) => Ok(*period),
            PeriodSource::Legacy(label) => parse_month_from_string(label, current_year),
        }
    }
}
