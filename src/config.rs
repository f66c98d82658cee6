use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::period::Period;

/// first period eligible for reporting; older rows are pre-launch history
pub const BASE_PERIOD_MONTH: u32 = 12;
pub const BASE_PERIOD_YEAR: i32 = 2025;

/// last day of the month on which an unpaid tuition is still "Em Aberto"
pub const DEFAULT_GRACE_DAY: u32 = 10;

/// day of the month tuition falls due
pub const DEFAULT_DUE_DAY: u32 = 10;

/// number of monthly rows generated when a student registers
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

/// brasilia time, no daylight saving since 2019
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub base_period: Period,
    pub grace_day: u32,
    pub due_day: u32,
    pub horizon_months: u32,
    pub utc_offset_hours: i32,
    pub default_monthly_fee: Option<Money>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_period: Period::new_unchecked(BASE_PERIOD_MONTH, BASE_PERIOD_YEAR),
            grace_day: DEFAULT_GRACE_DAY,
            due_day: DEFAULT_DUE_DAY,
            horizon_months: DEFAULT_HORIZON_MONTHS,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            default_monthly_fee: None,
        }
    }
}

impl LedgerConfig {
    /// configuration evaluated in utc, handy for tests pinned to utc instants
    pub fn utc() -> Self {
        Self {
            utc_offset_hours: 0,
            ..Self::default()
        }
    }

    /// parse and validate a json configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=28).contains(&self.grace_day) {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("grace_day must be within 1..=28, got {}", self.grace_day),
            });
        }
        if !(1..=31).contains(&self.due_day) {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("due_day must be within 1..=31, got {}", self.due_day),
            });
        }
        if self.horizon_months == 0 || self.horizon_months > 120 {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "horizon_months must be within 1..=120, got {}",
                    self.horizon_months
                ),
            });
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "utc_offset_hours must be within -12..=14, got {}",
                    self.utc_offset_hours
                ),
            });
        }
        if let Some(fee) = self.default_monthly_fee {
            if fee.is_negative() {
                return Err(LedgerError::InvalidConfiguration {
                    message: format!("default_monthly_fee must not be negative, got {}", fee),
                });
            }
        }
        Ok(())
    }

    /// offset used to decide what "today" is
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}
