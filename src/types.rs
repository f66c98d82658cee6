use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::LedgerError;

/// unique identifier for a student
pub type StudentId = Uuid;

/// unique identifier for a monthly payment row
pub type PaymentId = Uuid;

/// tuition payment status, serialized with the labels the school uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// paid, by cash confirmation or receipt
    #[serde(rename = "Pago")]
    Paid,
    /// grace window expired without payment
    #[serde(rename = "Não Pagou")]
    Unpaid,
    /// scholarship, nothing due
    #[serde(rename = "Bolsista")]
    Scholarship,
    /// student withdrawn or inactive
    #[serde(rename = "AFASTADO")]
    Withdrawn,
    #[serde(rename = "Novo")]
    New,
    /// a collection attempt was made
    #[serde(rename = "Cobrado")]
    Charged,
    /// manually postponed to a later date
    #[serde(rename = "Adiado")]
    Postponed,
    /// awaiting payment, within the grace window
    #[serde(rename = "Em Aberto")]
    Open,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 8] = [
        PaymentStatus::Paid,
        PaymentStatus::Unpaid,
        PaymentStatus::Scholarship,
        PaymentStatus::Withdrawn,
        PaymentStatus::New,
        PaymentStatus::Charged,
        PaymentStatus::Postponed,
        PaymentStatus::Open,
    ];

    /// label stored by the application
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Pago",
            PaymentStatus::Unpaid => "Não Pagou",
            PaymentStatus::Scholarship => "Bolsista",
            PaymentStatus::Withdrawn => "AFASTADO",
            PaymentStatus::New => "Novo",
            PaymentStatus::Charged => "Cobrado",
            PaymentStatus::Postponed => "Adiado",
            PaymentStatus::Open => "Em Aberto",
        }
    }

    /// overdue means `Não Pagou` or `Cobrado`
    pub fn is_overdue(&self) -> bool {
        matches!(self, PaymentStatus::Unpaid | PaymentStatus::Charged)
    }

    /// statuses the automatic resolver never overwrites
    pub fn is_sticky(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Paid | PaymentStatus::Scholarship | PaymentStatus::Postponed
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        PaymentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LedgerError::UnknownStatus {
                label: trimmed.to_string(),
            })
    }
}

/// how a payment was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    #[serde(rename = "dinheiro")]
    Cash,
    Pix,
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentType::Cash => f.write_str("dinheiro"),
            PaymentType::Pix => f.write_str("pix"),
        }
    }
}

/// sort direction for payment lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// oldest first
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}
