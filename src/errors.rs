use chrono::NaiveDate;
use thiserror::Error;

use crate::period::Period;
use crate::types::PaymentStatus;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("unknown month name: {name}")]
    UnknownMonthName {
        name: String,
    },

    #[error("invalid month number: {month}")]
    InvalidMonthNumber {
        month: u32,
    },

    #[error("invalid year: {value}")]
    InvalidYear {
        value: String,
    },

    #[error("malformed period label: {label:?}")]
    MalformedPeriodLabel {
        label: String,
    },

    #[error("unknown payment status: {label}")]
    UnknownStatus {
        label: String,
    },

    #[error("payment already exists for period {period}")]
    DuplicatePeriod {
        period: Period,
    },

    #[error("no payment found for period {period}")]
    PaymentNotFound {
        period: Period,
    },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("receipt reference is empty")]
    EmptyReceipt,

    #[error("payment has no receipt attached")]
    NoReceipt,

    #[error("cannot postpone to {requested}: due date is {due_date}")]
    InvalidPostponeDate {
        due_date: NaiveDate,
        requested: NaiveDate,
    },

    #[error("invariant violation: {message}")]
    InvariantViolation {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
