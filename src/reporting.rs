use chrono::Datelike;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::payment::MonthlyPayment;
use crate::period::{today, Period};
use crate::types::{PaymentStatus, SortOrder};

/// status counts for one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub paid: usize,
    pub open: usize,
    /// `Não Pagou` and `Cobrado`
    pub overdue: usize,
    /// every payment matching the period
    pub total: usize,
}

/// an overdue amount to collect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    /// formatted period, e.g. "Dezembro/2025"
    pub month: String,
    pub value: Money,
}

/// true if the payment belongs to `period`
///
/// Canonical numbers win; otherwise the legacy label is parsed with bare
/// month names taken as `current_year`. Unparseable labels never match.
pub fn is_payment_in_period(payment: &MonthlyPayment, period: Period, current_year: i32) -> bool {
    match payment.period(current_year) {
        Ok(resolved) => resolved == period,
        Err(err) => {
            tracing::debug!(
                payment_id = %payment.id,
                month = %payment.month,
                error = %err,
                "skipping payment with unparseable period"
            );
            false
        }
    }
}

/// `"MonthName/Year"` from canonical numbers, else the raw legacy label
pub fn format_payment_period(payment: &MonthlyPayment) -> String {
    match payment.canonical_period() {
        Some(period) => period.to_string(),
        None => payment.month.clone(),
    }
}

/// period used by reporting: canonical, else the legacy label, else the due date's month
fn reporting_period(payment: &MonthlyPayment, current_year: i32) -> Period {
    payment
        .period(current_year)
        .unwrap_or_else(|_| payment.stored_period())
}

/// true if the payment is on or after the configured base period
///
/// Bare legacy labels are read as `current_year`, as in [`is_payment_in_period`].
pub fn is_payment_from_base_date(
    payment: &MonthlyPayment,
    config: &LedgerConfig,
    current_year: i32,
) -> bool {
    reporting_period(payment, current_year) >= config.base_period
}

/// count paid, open and overdue payments for a period
pub fn calculate_payment_summary(
    payments: &[MonthlyPayment],
    period: Period,
    current_year: i32,
) -> PaymentSummary {
    payments
        .iter()
        .filter(|p| is_payment_in_period(p, period, current_year))
        .fold(PaymentSummary::default(), |mut summary, payment| {
            match payment.status {
                PaymentStatus::Paid => summary.paid += 1,
                PaymentStatus::Open => summary.open += 1,
                status if status.is_overdue() => summary.overdue += 1,
                _ => {}
            }
            summary.total += 1;
            summary
        })
}

/// overdue payments between the base period and the current month, in input order
pub fn get_pending_payments_info(
    payments: &[MonthlyPayment],
    config: &LedgerConfig,
    time_provider: &SafeTimeProvider,
) -> Vec<PendingPayment> {
    let today = today(time_provider, config.utc_offset());
    let current = Period::from_date(today);

    payments
        .iter()
        .filter(|p| p.is_overdue())
        .filter(|p| is_payment_from_base_date(p, config, today.year()))
        .filter(|p| reporting_period(p, today.year()) <= current)
        .map(|payment| PendingPayment {
            month: format_payment_period(payment),
            value: payment.value,
        })
        .collect()
}

/// total of a pending list
pub fn pending_total(pending: &[PendingPayment]) -> Money {
    pending.iter().map(|p| p.value).sum()
}

/// compare canonical periods when both rows have them, due dates otherwise
fn compare_by_due_date(a: &MonthlyPayment, b: &MonthlyPayment) -> Ordering {
    match (a.canonical_period(), b.canonical_period()) {
        (Some(pa), Some(pb)) => pa.sort_key().cmp(&pb.sort_key()),
        _ => a.due_date.cmp(&b.due_date),
    }
}

/// sorted copy, oldest first for `SortOrder::Ascending`
pub fn sort_payments_by_due_date(
    payments: &[MonthlyPayment],
    order: SortOrder,
) -> Vec<MonthlyPayment> {
    let mut sorted = payments.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort_by(compare_by_due_date),
        SortOrder::Descending => sorted.sort_by(|a, b| compare_by_due_date(b, a)),
    }
    sorted
}

/// true if any payment is `Não Pagou` or `Cobrado`
pub fn has_overdue_payments(payments: &[MonthlyPayment]) -> bool {
    payments.iter().any(MonthlyPayment::is_overdue)
}
