use chrono::{Datelike, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::payment::MonthlyPayment;
use crate::period::{today, Period};
use crate::reporting::{self, PaymentSummary, PendingPayment};
use crate::status::StatusResolver;
use crate::types::{PaymentId, PaymentStatus, PaymentType, StudentId};

/// what is needed to open a student's ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub student_id: StudentId,
    pub registration_date: NaiveDate,
    /// falls back to `LedgerConfig::default_monthly_fee`
    pub monthly_fee: Option<Money>,
    pub scholarship: bool,
}

impl Registration {
    pub fn new(student_id: StudentId, registration_date: NaiveDate, monthly_fee: Money) -> Self {
        Self {
            student_id,
            registration_date,
            monthly_fee: Some(monthly_fee),
            scholarship: false,
        }
    }

    pub fn with_scholarship(mut self) -> Self {
        self.scholarship = true;
        self
    }
}

/// a status the resolver changed; the caller persists it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub payment_id: PaymentId,
    pub period: Period,
    pub old_status: PaymentStatus,
    pub new_status: PaymentStatus,
}

/// every monthly payment of one student, one row per period
#[derive(Debug)]
pub struct StudentLedger {
    pub student_id: StudentId,
    pub resolver: StatusResolver,
    pub events: EventStore,
    payments: Vec<MonthlyPayment>,
}

impl StudentLedger {
    /// empty ledger
    pub fn new(student_id: StudentId, config: LedgerConfig) -> Self {
        Self {
            student_id,
            resolver: StatusResolver::new(config),
            events: EventStore::new(),
            payments: Vec::new(),
        }
    }

    /// generate one row per month from the registration month through the horizon
    pub fn generate(
        registration: &Registration,
        config: LedgerConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        config.validate()?;

        let monthly_fee = registration
            .monthly_fee
            .or(config.default_monthly_fee)
            .ok_or_else(|| LedgerError::InvalidConfiguration {
                message: "no monthly fee given and no default_monthly_fee configured".to_string(),
            })?;
        if monthly_fee.is_negative() {
            return Err(LedgerError::InvariantViolation {
                message: format!("monthly fee must not be negative, got {}", monthly_fee),
            });
        }

        let first = Period::from_date(registration.registration_date);
        let count = config.horizon_months as usize;
        let due_day = config.due_day;
        let mut ledger = Self::new(registration.student_id, config);

        for offset in 0..count {
            let period = first.add_months(offset as i32);
            let mut payment = MonthlyPayment::new(registration.student_id, period, monthly_fee, due_day);
            if registration.scholarship {
                payment.grant_scholarship()?;
            }
            ledger.insert(payment)?;
        }

        let last = first.add_months(count as i32 - 1);
        info!(
            student_id = %registration.student_id,
            first = %first,
            last = %last,
            count,
            scholarship = registration.scholarship,
            "generated monthly payments"
        );
        ledger.events.emit(Event::PaymentsGenerated {
            student_id: registration.student_id,
            first_period: first,
            last_period: last,
            count,
            monthly_value: if registration.scholarship { Money::ZERO } else { monthly_fee },
            timestamp: time_provider.now(),
        });

        ledger.refresh_statuses(time_provider);
        Ok(ledger)
    }

    /// build a ledger from stored rows
    pub fn from_payments(
        student_id: StudentId,
        config: LedgerConfig,
        payments: Vec<MonthlyPayment>,
    ) -> Result<Self> {
        let mut ledger = Self::new(student_id, config);
        for payment in payments {
            let payment_id = payment.id;
            let period = ledger.insert(payment)?;
            ledger.events.emit(Event::PaymentImported {
                student_id,
                payment_id,
                period,
            });
        }
        Ok(ledger)
    }

    /// add a row, keeping one row per period
    ///
    /// Legacy labels are parsed here, once; the stored row always carries
    /// canonical numbers.
    pub fn insert(&mut self, mut payment: MonthlyPayment) -> Result<Period> {
        if payment.student_id != self.student_id {
            return Err(LedgerError::InvariantViolation {
                message: format!(
                    "payment {} belongs to student {}, not {}",
                    payment.id, payment.student_id, self.student_id
                ),
            });
        }
        let period = payment.normalize_period()?;
        payment.validate()?;

        match self.position(period) {
            Ok(_) => Err(LedgerError::DuplicatePeriod { period }),
            Err(idx) => {
                self.payments.insert(idx, payment);
                Ok(period)
            }
        }
    }

    fn position(&self, period: Period) -> std::result::Result<usize, usize> {
        self.payments.binary_search_by_key(&period, MonthlyPayment::stored_period)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.resolver.config
    }

    /// rows ordered oldest first
    pub fn payments(&self) -> &[MonthlyPayment] {
        &self.payments
    }

    pub fn payment(&self, period: Period) -> Option<&MonthlyPayment> {
        self.position(period).ok().map(|idx| &self.payments[idx])
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// re-derive every status; returns the rows that changed
    pub fn refresh_statuses(&mut self, time_provider: &SafeTimeProvider) -> Vec<StatusChange> {
        let now = time_provider.now();
        let mut changes = Vec::new();

        for payment in &mut self.payments {
            let new_status = self.resolver.resolve_payment(payment, time_provider);
            if new_status == payment.status {
                continue;
            }

            let change = StatusChange {
                payment_id: payment.id,
                period: payment.stored_period(),
                old_status: payment.status,
                new_status,
            };
            if new_status == PaymentStatus::Paid && payment.paid_at.is_none() {
                payment.paid_at = Some(now);
            }
            payment.status = new_status;

            self.events.emit(Event::StatusChanged {
                student_id: self.student_id,
                payment_id: change.payment_id,
                period: change.period,
                old_status: change.old_status,
                new_status: change.new_status,
                timestamp: now,
            });
            changes.push(change);
        }

        debug!(
            student_id = %self.student_id,
            rows = self.payments.len(),
            changed = changes.len(),
            "refreshed payment statuses"
        );
        changes
    }

    /// apply a transition to a copy of the row and commit it only if it succeeds
    fn transition<F>(&mut self, period: Period, action: &str, apply: F) -> Result<&MonthlyPayment>
    where
        F: FnOnce(&mut MonthlyPayment) -> Result<()>,
    {
        let idx = self
            .position(period)
            .map_err(|_| LedgerError::PaymentNotFound { period })?;

        let mut updated = self.payments[idx].clone();
        let outcome = apply(&mut updated).and_then(|_| updated.validate());
        if let Err(err) = outcome {
            warn!(
                student_id = %self.student_id,
                period = %period,
                status = %self.payments[idx].status,
                action,
                error = %err,
                "payment transition rejected"
            );
            return Err(err);
        }

        info!(
            student_id = %self.student_id,
            period = %period,
            old_status = %self.payments[idx].status,
            new_status = %updated.status,
            action,
            "payment updated"
        );
        self.payments[idx] = updated;
        Ok(&self.payments[idx])
    }

    /// confirm payment by cash or pix
    pub fn mark_paid(
        &mut self,
        period: Period,
        payment_type: PaymentType,
        receipt: Option<String>,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        let student_id = self.student_id;
        let payment = self.transition(period, "mark_paid", |p| p.mark_paid(payment_type, receipt, now))?;
        let event = Event::PaymentMarkedPaid {
            student_id,
            payment_id: payment.id,
            period,
            amount: payment.value,
            payment_type,
            timestamp: now,
        };
        self.events.emit(event);
        Ok(())
    }

    pub fn attach_receipt(
        &mut self,
        period: Period,
        receipt: impl Into<String>,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        let receipt = receipt.into();
        let student_id = self.student_id;
        let payment =
            self.transition(period, "attach_receipt", |p| p.attach_receipt(receipt.clone(), now))?;
        let event = Event::ReceiptAttached {
            student_id,
            payment_id: payment.id,
            period,
            receipt,
            timestamp: now,
        };
        self.events.emit(event);
        Ok(())
    }

    /// remove the receipt; the row's status is re-derived right away
    pub fn delete_receipt(
        &mut self,
        period: Period,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentStatus> {
        let now = time_provider.now();
        let student_id = self.student_id;
        let resolver = self.resolver.clone();
        let payment = self.transition(period, "delete_receipt", |p| {
            p.delete_receipt()?;
            p.status = resolver.resolve(period, p.status, false, time_provider);
            Ok(())
        })?;
        let status = payment.status;
        let event = Event::ReceiptDeleted {
            student_id,
            payment_id: payment.id,
            period,
            timestamp: now,
        };
        self.events.emit(event);
        Ok(status)
    }

    pub fn postpone(
        &mut self,
        period: Period,
        to: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        let student_id = self.student_id;
        let payment = self.transition(period, "postpone", |p| p.postpone(to))?;
        let event = Event::PaymentPostponed {
            student_id,
            payment_id: payment.id,
            period,
            postponed_to: to,
            timestamp: now,
        };
        self.events.emit(event);
        Ok(())
    }

    pub fn charge(&mut self, period: Period, time_provider: &SafeTimeProvider) -> Result<()> {
        let now = time_provider.now();
        let student_id = self.student_id;
        let payment = self.transition(period, "charge", |p| p.charge(now))?;
        let event = Event::PaymentCharged {
            student_id,
            payment_id: payment.id,
            period,
            amount: payment.value,
            timestamp: now,
        };
        self.events.emit(event);
        Ok(())
    }

    pub fn grant_scholarship(
        &mut self,
        period: Period,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        let student_id = self.student_id;
        let waived_amount = self
            .payment(period)
            .map(|p| p.value)
            .ok_or(LedgerError::PaymentNotFound { period })?;
        let payment = self.transition(period, "grant_scholarship", MonthlyPayment::grant_scholarship)?;
        let event = Event::ScholarshipGranted {
            student_id,
            payment_id: payment.id,
            period,
            waived_amount,
            timestamp: now,
        };
        self.events.emit(event);
        Ok(())
    }

    pub fn withdraw(&mut self, period: Period, time_provider: &SafeTimeProvider) -> Result<()> {
        let now = time_provider.now();
        let student_id = self.student_id;
        let payment = self.transition(period, "withdraw", MonthlyPayment::withdraw)?;
        let event = Event::StudentWithdrawn {
            student_id,
            payment_id: payment.id,
            period,
            timestamp: now,
        };
        self.events.emit(event);
        Ok(())
    }

    /// status counts for one period
    pub fn summary(&self, period: Period, time_provider: &SafeTimeProvider) -> PaymentSummary {
        let current_year = today(time_provider, self.config().utc_offset()).year();
        reporting::calculate_payment_summary(&self.payments, period, current_year)
    }

    pub fn pending(&self, time_provider: &SafeTimeProvider) -> Vec<PendingPayment> {
        reporting::get_pending_payments_info(&self.payments, self.config(), time_provider)
    }

    pub fn has_overdue(&self) -> bool {
        reporting::has_overdue_payments(&self.payments)
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use uuid::Uuid;

    fn time_at(year: i32, month: u32, day: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
        ))
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn period(month: u32, year: i32) -> Period {
        Period::new(month, year).unwrap()
    }

    fn registered(time: &SafeTimeProvider) -> StudentLedger {
        let registration = Registration::new(Uuid::new_v4(), date(2026, 3, 15), Money::from_major(150));
        StudentLedger::generate(&registration, LedgerConfig::default(), time).unwrap()
    }

    #[test]
    fn test_generation_covers_horizon() {
        let time = time_at(2026, 3, 15);
        let ledger = registered(&time);

        assert_eq!(ledger.len(), 12);
        let periods: Vec<_> = ledger.payments().iter().map(|p| p.canonical_period().unwrap()).collect();
        assert_eq!(periods.first(), Some(&period(3, 2026)));
        assert_eq!(periods.last(), Some(&period(2, 2027)));
        assert!(periods.windows(2).all(|w| w[1] == w[0].succ()));
        assert!(ledger.payments().iter().all(|p| p.due_date.day() == 10));
    }

    #[test]
    fn test_generation_resolves_current_month() {
        let time = time_at(2026, 3, 15);
        let mut ledger = registered(&time);

        // registered after the grace window
        assert_eq!(ledger.payment(period(3, 2026)).unwrap().status, PaymentStatus::Unpaid);
        assert_eq!(ledger.payment(period(4, 2026)).unwrap().status, PaymentStatus::Open);

        let events = ledger.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::PaymentsGenerated { count: 12, .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::StatusChanged { new_status: PaymentStatus::Unpaid, .. }
        )));
    }

    #[test]
    fn test_generation_with_scholarship() {
        let time = time_at(2026, 3, 5);
        let registration =
            Registration::new(Uuid::new_v4(), date(2026, 3, 5), Money::from_major(150)).with_scholarship();
        let ledger = StudentLedger::generate(&registration, LedgerConfig::default(), &time).unwrap();

        assert!(ledger
            .payments()
            .iter()
            .all(|p| p.status == PaymentStatus::Scholarship && p.value.is_zero()));
        assert!(!ledger.has_overdue());
    }

    #[test]
    fn test_generation_needs_a_fee() {
        let time = time_at(2026, 3, 5);
        let registration = Registration {
            student_id: Uuid::new_v4(),
            registration_date: date(2026, 3, 5),
            monthly_fee: None,
            scholarship: false,
        };
        let result = StudentLedger::generate(&registration, LedgerConfig::default(), &time);
        assert!(matches!(result, Err(LedgerError::InvalidConfiguration { .. })));

        let config = LedgerConfig {
            default_monthly_fee: Some(Money::from_major(200)),
            ..LedgerConfig::default()
        };
        let ledger = StudentLedger::generate(&registration, config, &time).unwrap();
        assert_eq!(ledger.payments()[0].value, Money::from_major(200));
    }

    #[test]
    fn test_duplicate_period_rejected() {
        let time = time_at(2026, 3, 5);
        let mut ledger = registered(&time);
        let duplicate = MonthlyPayment::new(ledger.student_id, period(4, 2026), Money::from_major(150), 10);

        assert!(matches!(
            ledger.insert(duplicate),
            Err(LedgerError::DuplicatePeriod { .. })
        ));
        assert_eq!(ledger.len(), 12);
    }

    #[test]
    fn test_duplicate_detected_through_legacy_label() {
        let student_id = Uuid::new_v4();
        let mut ledger = StudentLedger::new(student_id, LedgerConfig::default());
        ledger
            .insert(MonthlyPayment::new(student_id, period(5, 2026), Money::from_major(150), 10))
            .unwrap();

        let legacy = MonthlyPayment::from_legacy_label(
            student_id,
            "Maio",
            Money::from_major(150),
            date(2026, 5, 10),
            PaymentStatus::Open,
        );
        assert!(matches!(ledger.insert(legacy), Err(LedgerError::DuplicatePeriod { .. })));
    }

    #[test]
    fn test_foreign_row_rejected() {
        let mut ledger = StudentLedger::new(Uuid::new_v4(), LedgerConfig::default());
        let other = MonthlyPayment::new(Uuid::new_v4(), period(5, 2026), Money::from_major(150), 10);
        assert!(matches!(ledger.insert(other), Err(LedgerError::InvariantViolation { .. })));
    }

    #[test]
    fn test_refresh_after_grace_window() {
        let time = time_at(2026, 3, 5);
        let control = time.test_control().unwrap();
        let mut ledger = registered(&time);
        ledger.take_events();
        assert_eq!(ledger.payment(period(3, 2026)).unwrap().status, PaymentStatus::Open);

        control.advance(Duration::days(10));
        let changes = ledger.refresh_statuses(&time);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].period, period(3, 2026));
        assert_eq!(changes[0].old_status, PaymentStatus::Open);
        assert_eq!(changes[0].new_status, PaymentStatus::Unpaid);

        // nothing else to change on a second pass
        assert!(ledger.refresh_statuses(&time).is_empty());
    }

    #[test]
    fn test_manual_transitions_keep_invariants() {
        let time = time_at(2026, 3, 20);
        let mut ledger = registered(&time);

        ledger.mark_paid(period(3, 2026), PaymentType::Cash, None, &time).unwrap();
        ledger.charge(period(4, 2026), &time).unwrap();
        ledger.postpone(period(5, 2026), date(2026, 5, 25), &time).unwrap();
        ledger.grant_scholarship(period(6, 2026), &time).unwrap();
        ledger.withdraw(period(7, 2026), &time).unwrap();
        ledger.attach_receipt(period(8, 2026), "pix-0808", &time).unwrap();

        assert!(ledger.payments().iter().all(|p| p.validate().is_ok()));
        assert_eq!(ledger.payment(period(3, 2026)).unwrap().status, PaymentStatus::Paid);
        assert_eq!(ledger.payment(period(4, 2026)).unwrap().status, PaymentStatus::Charged);
        assert_eq!(ledger.payment(period(5, 2026)).unwrap().status, PaymentStatus::Postponed);
        assert_eq!(ledger.payment(period(6, 2026)).unwrap().status, PaymentStatus::Scholarship);
        assert_eq!(ledger.payment(period(7, 2026)).unwrap().status, PaymentStatus::Withdrawn);
        assert_eq!(ledger.payment(period(8, 2026)).unwrap().status, PaymentStatus::Paid);

        let events = ledger.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::PaymentMarkedPaid { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::PaymentCharged { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::PaymentPostponed { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::ScholarshipGranted { waived_amount, .. } if *waived_amount == Money::from_major(150)
        )));
        assert!(events.iter().any(|e| matches!(e, Event::StudentWithdrawn { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::ReceiptAttached { .. })));
    }

    #[test]
    fn test_rejected_transition_leaves_row_untouched() {
        let time = time_at(2026, 3, 20);
        let mut ledger = registered(&time);
        ledger.grant_scholarship(period(4, 2026), &time).unwrap();
        let before = ledger.payment(period(4, 2026)).unwrap().clone();
        ledger.take_events();

        let result = ledger.mark_paid(period(4, 2026), PaymentType::Pix, None, &time);
        assert!(matches!(result, Err(LedgerError::InvalidTransition { .. })));
        assert_eq!(ledger.payment(period(4, 2026)).unwrap(), &before);
        assert!(ledger.take_events().is_empty());
    }

    #[test]
    fn test_unknown_period() {
        let time = time_at(2026, 3, 20);
        let mut ledger = registered(&time);
        let result = ledger.charge(period(1, 2030), &time);
        assert!(matches!(result, Err(LedgerError::PaymentNotFound { .. })));
    }

    #[test]
    fn test_delete_receipt_on_past_month_becomes_unpaid() {
        let time = time_at(2026, 3, 5);
        let control = time.test_control().unwrap();
        let mut ledger = registered(&time);
        ledger.attach_receipt(period(3, 2026), "comprovante.png", &time).unwrap();

        control.advance(Duration::days(40));
        assert!(ledger.refresh_statuses(&time).iter().all(|c| c.period != period(3, 2026)));

        let status = ledger.delete_receipt(period(3, 2026), &time).unwrap();
        assert_eq!(status, PaymentStatus::Unpaid);
        let payment = ledger.payment(period(3, 2026)).unwrap();
        assert!(payment.receipt.is_none());
        assert!(payment.paid_at.is_none());
    }

    #[test]
    fn test_refresh_promotes_rows_with_receipt() {
        let time = time_at(2026, 3, 5);
        let student_id = Uuid::new_v4();
        let mut row = MonthlyPayment::new(student_id, period(2, 2026), Money::from_major(150), 10);
        row.status = PaymentStatus::Unpaid;
        row.receipt = Some("late-upload.jpg".to_string());

        let mut ledger = StudentLedger::from_payments(student_id, LedgerConfig::default(), vec![row]).unwrap();
        let changes = ledger.refresh_statuses(&time);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_status, PaymentStatus::Paid);
        let payment = ledger.payment(period(2, 2026)).unwrap();
        assert!(payment.paid_at.is_some());
        assert!(payment.validate().is_ok());
    }

    #[test]
    fn test_summary_and_pending() {
        let time = time_at(2026, 1, 20);
        let control = time.test_control().unwrap();
        let registration = Registration::new(Uuid::new_v4(), date(2025, 11, 3), Money::from_major(150));
        let mut ledger = StudentLedger::generate(&registration, LedgerConfig::default(), &time).unwrap();

        // nov/2025 is before the base period, dec/2025 and jan/2026 are pending
        let pending = ledger.pending(&time);
        let months: Vec<_> = pending.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["Dezembro/2025", "Janeiro/2026"]);
        assert!(ledger.has_overdue());

        ledger.mark_paid(period(1, 2026), PaymentType::Pix, None, &time).unwrap();
        let summary = ledger.summary(period(1, 2026), &time);
        assert_eq!(summary.paid, 1);
        assert_eq!(summary.total, 1);

        control.advance(Duration::days(30));
        ledger.refresh_statuses(&time);
        let months: Vec<_> = ledger.pending(&time).into_iter().map(|p| p.month).collect();
        assert_eq!(months, vec!["Dezembro/2025".to_string(), "Fevereiro/2026".to_string()]);
    }
}
