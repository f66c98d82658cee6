use chrono::Datelike;
use hourglass_rs::SafeTimeProvider;
use std::cmp::Ordering;

use crate::config::LedgerConfig;
use crate::payment::MonthlyPayment;
use crate::period::{today, Period};
use crate::types::PaymentStatus;

/// where a period sits relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPosition {
    Past,
    /// current month, with today's day of month
    Current { day: u32 },
    Future,
}

/// derives the status a payment should carry right now
///
/// Statuses that record a manual decision (`Pago`, `Bolsista`, `Adiado`) are
/// never overwritten. `Cobrado` survives the open/unpaid toggle.
#[derive(Debug, Clone, Default)]
pub struct StatusResolver {
    pub config: LedgerConfig,
}

impl StatusResolver {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// position of (month, year) relative to today's calendar month
    pub fn position(
        &self,
        month_number: u32,
        year_number: i32,
        time_provider: &SafeTimeProvider,
    ) -> PeriodPosition {
        let today = today(time_provider, self.config.utc_offset());
        match (year_number, month_number).cmp(&(today.year(), today.month())) {
            Ordering::Less => PeriodPosition::Past,
            Ordering::Equal => PeriodPosition::Current { day: today.day() },
            Ordering::Greater => PeriodPosition::Future,
        }
    }

    /// status for (month, year) given what is stored today
    ///
    /// Total over its inputs: out-of-range month numbers are simply compared
    /// numerically against today.
    pub fn determine(
        &self,
        month_number: u32,
        year_number: i32,
        current_status: PaymentStatus,
        has_receipt: bool,
        time_provider: &SafeTimeProvider,
    ) -> PaymentStatus {
        if current_status == PaymentStatus::Paid || has_receipt {
            return PaymentStatus::Paid;
        }
        if current_status.is_sticky() {
            return current_status;
        }

        let charged = current_status == PaymentStatus::Charged;
        match self.position(month_number, year_number, time_provider) {
            PeriodPosition::Current { day } if day <= self.config.grace_day => {
                if charged {
                    PaymentStatus::Charged
                } else {
                    PaymentStatus::Open
                }
            }
            PeriodPosition::Current { .. } | PeriodPosition::Past => {
                if charged {
                    PaymentStatus::Charged
                } else {
                    PaymentStatus::Unpaid
                }
            }
            PeriodPosition::Future => current_status,
        }
    }

    pub fn resolve(
        &self,
        period: Period,
        current_status: PaymentStatus,
        has_receipt: bool,
        time_provider: &SafeTimeProvider,
    ) -> PaymentStatus {
        self.determine(
            period.month(),
            period.year(),
            current_status,
            has_receipt,
            time_provider,
        )
    }

    /// status for a stored row; rows without a resolvable period keep theirs
    pub fn resolve_payment(
        &self,
        payment: &MonthlyPayment,
        time_provider: &SafeTimeProvider,
    ) -> PaymentStatus {
        let current_year = today(time_provider, self.config.utc_offset()).year();
        match payment.period(current_year) {
            Ok(period) => self.resolve(period, payment.status, payment.has_receipt(), time_provider),
            Err(err) => {
                tracing::debug!(
                    payment_id = %payment.id,
                    month = %payment.month,
                    error = %err,
                    "period unresolvable, keeping stored status"
                );
                payment.status
            }
        }
    }
}

/// status for (month, year) with the default configuration
pub fn determine_payment_status(
    month_number: u32,
    year_number: i32,
    current_status: PaymentStatus,
    has_receipt: bool,
    time_provider: &SafeTimeProvider,
) -> PaymentStatus {
    StatusResolver::default().determine(
        month_number,
        year_number,
        current_status,
        has_receipt,
        time_provider,
    )
}
