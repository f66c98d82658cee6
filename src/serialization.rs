/// serialization support for student ledgers
use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::ledger::StudentLedger;
use crate::payment::MonthlyPayment;
use crate::period::{today, Period};
use crate::reporting::{pending_total, PaymentSummary, PendingPayment};
use crate::types::StudentId;

/// serializable view of a student's ledger, for report generators
#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerView {
    pub student_id: StudentId,
    pub as_of: NaiveDate,
    pub current_period: Period,
    pub current_summary: PaymentSummary,
    pub pending: PendingView,
    pub has_overdue: bool,
    pub payments: Vec<MonthlyPayment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingView {
    pub items: Vec<PendingPayment>,
    pub total: Money,
}

impl LedgerView {
    pub fn from_ledger(ledger: &StudentLedger, time_provider: &SafeTimeProvider) -> Self {
        let as_of = today(time_provider, ledger.config().utc_offset());
        let current_period = Period::from_date(as_of);
        let items = ledger.pending(time_provider);

        LedgerView {
            student_id: ledger.student_id,
            as_of,
            current_period,
            current_summary: ledger.summary(current_period, time_provider),
            pending: PendingView {
                total: pending_total(&items),
                items,
            },
            has_overdue: ledger.has_overdue(),
            payments: ledger.payments().to_vec(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl StudentLedger {
    /// load stored rows from a json array
    ///
    /// Each row is normalized and validated; duplicates and broken rows fail
    /// the whole import.
    pub fn from_json_rows(student_id: StudentId, config: LedgerConfig, json: &str) -> Result<Self> {
        let rows: Vec<MonthlyPayment> = serde_json::from_str(json)?;
        tracing::debug!(student_id = %student_id, rows = rows.len(), "importing payment rows");
        StudentLedger::from_payments(student_id, config, rows)
    }

    /// rows as a json array, oldest first
    pub fn to_json_rows(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.payments())?)
    }
}
