use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::period::{parse_month_from_string, Period, PeriodSource};
use crate::types::{PaymentId, PaymentStatus, PaymentType, StudentId};

/// one tuition row: what a student owes for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPayment {
    pub id: PaymentId,
    pub student_id: StudentId,
    /// legacy label, `"Nome"` or `"Nome/Ano"`
    pub month: String,
    #[serde(default)]
    pub month_number: Option<u32>,
    #[serde(default)]
    pub year_number: Option<i32>,
    pub status: PaymentStatus,
    pub value: Money,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub charged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub postponed_to: Option<NaiveDate>,
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
}

impl MonthlyPayment {
    /// new open payment for a period
    pub fn new(student_id: StudentId, period: Period, value: Money, due_day: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            month: period.to_string(),
            month_number: Some(period.month()),
            year_number: Some(period.year()),
            status: PaymentStatus::Open,
            value,
            due_date: period.due_date(due_day),
            receipt: None,
            paid_at: None,
            charged_at: None,
            postponed_to: None,
            payment_type: None,
        }
    }

    /// row that only carries the legacy label, as older records do
    pub fn from_legacy_label(
        student_id: StudentId,
        label: impl Into<String>,
        value: Money,
        due_date: NaiveDate,
        status: PaymentStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            month: label.into(),
            month_number: None,
            year_number: None,
            status,
            value,
            due_date,
            receipt: None,
            paid_at: None,
            charged_at: None,
            postponed_to: None,
            payment_type: None,
        }
    }

    /// canonical period, when both numbers are present and valid
    pub fn canonical_period(&self) -> Option<Period> {
        match (self.month_number, self.year_number) {
            (Some(month), Some(year)) => Period::new(month, year).ok(),
            _ => None,
        }
    }

    /// canonical period, else the month of the due date; never parses the label
    pub fn stored_period(&self) -> Period {
        self.canonical_period()
            .unwrap_or_else(|| Period::from_date(self.due_date))
    }

    pub fn period_source(&self) -> PeriodSource<'_> {
        match self.canonical_period() {
            Some(period) => PeriodSource::Canonical(period),
            None => PeriodSource::Legacy(&self.month),
        }
    }

    /// resolve the period, parsing the legacy label against `current_year` if needed
    pub fn period(&self, current_year: i32) -> Result<Period> {
        self.period_source().resolve(current_year)
    }

    /// parse the legacy label once and store canonical numbers
    ///
    /// A bare month name without a year takes the year of the due date.
    pub fn normalize_period(&mut self) -> Result<Period> {
        if let Some(period) = self.canonical_period() {
            return Ok(period);
        }
        let period = parse_month_from_string(&self.month, self.due_date.year())?;
        self.month_number = Some(period.month());
        self.year_number = Some(period.year());
        Ok(period)
    }

    pub fn has_receipt(&self) -> bool {
        self.receipt.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    pub fn is_overdue(&self) -> bool {
        self.status.is_overdue()
    }

    /// check the per-row invariants
    pub fn validate(&self) -> Result<()> {
        if self.value.is_negative() {
            return Err(self.violation(format!("negative value {}", self.value)));
        }
        match self.status {
            PaymentStatus::Scholarship if !self.value.is_zero() => {
                Err(self.violation(format!("scholarship with value {}", self.value)))
            }
            PaymentStatus::Paid if self.paid_at.is_none() => {
                Err(self.violation("paid without paid_at".to_string()))
            }
            PaymentStatus::Charged if self.charged_at.is_none() => {
                Err(self.violation("charged without charged_at".to_string()))
            }
            PaymentStatus::Postponed if self.postponed_to.is_none() => {
                Err(self.violation("postponed without postponed_to".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn violation(&self, message: String) -> LedgerError {
        LedgerError::InvariantViolation {
            message: format!("payment {} ({}): {}", self.id, self.month, message),
        }
    }

    fn reject(&self, to: PaymentStatus) -> LedgerError {
        LedgerError::InvalidTransition {
            from: self.status,
            to,
        }
    }

    /// confirm payment, by cash or transfer
    pub fn mark_paid(
        &mut self,
        payment_type: PaymentType,
        receipt: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.status == PaymentStatus::Scholarship {
            return Err(self.reject(PaymentStatus::Paid));
        }
        if let Some(receipt) = &receipt {
            if receipt.trim().is_empty() {
                return Err(LedgerError::EmptyReceipt);
            }
        }

        self.status = PaymentStatus::Paid;
        self.paid_at = Some(now);
        self.payment_type = Some(payment_type);
        if receipt.is_some() {
            self.receipt = receipt;
        }
        Ok(())
    }

    /// attach proof of payment; a receipt always means paid
    pub fn attach_receipt(&mut self, receipt: impl Into<String>, now: DateTime<Utc>) -> Result<()> {
        let receipt = receipt.into();
        if receipt.trim().is_empty() {
            return Err(LedgerError::EmptyReceipt);
        }
        if self.status == PaymentStatus::Scholarship {
            return Err(self.reject(PaymentStatus::Paid));
        }

        self.receipt = Some(receipt);
        if self.status != PaymentStatus::Paid {
            self.status = PaymentStatus::Paid;
            self.paid_at = Some(now);
        }
        if self.payment_type.is_none() {
            self.payment_type = Some(PaymentType::Pix);
        }
        Ok(())
    }

    /// drop the receipt and the payment it proved; the row goes back to open
    pub fn delete_receipt(&mut self) -> Result<()> {
        if self.receipt.is_none() {
            return Err(LedgerError::NoReceipt);
        }
        self.receipt = None;
        self.paid_at = None;
        self.payment_type = None;
        self.status = PaymentStatus::Open;
        Ok(())
    }

    /// postpone to a later date
    pub fn postpone(&mut self, to: NaiveDate) -> Result<()> {
        if matches!(self.status, PaymentStatus::Paid | PaymentStatus::Scholarship) {
            return Err(self.reject(PaymentStatus::Postponed));
        }
        if to < self.due_date {
            return Err(LedgerError::InvalidPostponeDate {
                due_date: self.due_date,
                requested: to,
            });
        }
        self.status = PaymentStatus::Postponed;
        self.postponed_to = Some(to);
        Ok(())
    }

    /// flag that a collection attempt was made
    pub fn charge(&mut self, now: DateTime<Utc>) -> Result<()> {
        if matches!(
            self.status,
            PaymentStatus::Paid | PaymentStatus::Scholarship | PaymentStatus::Withdrawn
        ) {
            return Err(self.reject(PaymentStatus::Charged));
        }
        self.status = PaymentStatus::Charged;
        self.charged_at = Some(now);
        Ok(())
    }

    /// exempt this period; nothing is due
    pub fn grant_scholarship(&mut self) -> Result<()> {
        if self.status == PaymentStatus::Paid {
            return Err(self.reject(PaymentStatus::Scholarship));
        }
        self.status = PaymentStatus::Scholarship;
        self.value = Money::ZERO;
        self.receipt = None;
        self.paid_at = None;
        self.payment_type = None;
        Ok(())
    }

    /// mark the student as away for this period
    pub fn withdraw(&mut self) -> Result<()> {
        if self.status == PaymentStatus::Paid {
            return Err(self.reject(PaymentStatus::Withdrawn));
        }
        self.status = PaymentStatus::Withdrawn;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn june_2026() -> MonthlyPayment {
        MonthlyPayment::new(Uuid::new_v4(), Period::new(6, 2026).unwrap(), Money::from_major(150), 10)
    }

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_payment() {
        let payment = june_2026();
        assert_eq!(payment.month, "Junho/2026");
        assert_eq!(payment.canonical_period(), Some(Period::new(6, 2026).unwrap()));
        assert_eq!(payment.due_date, NaiveDate::from_ymd_opt(2026, 6, 10).unwrap());
        assert_eq!(payment.status, PaymentStatus::Open);
        assert!(payment.validate().is_ok());
    }

    #[test]
    fn test_normalize_legacy_label() {
        let mut payment = MonthlyPayment::from_legacy_label(
            Uuid::new_v4(),
            "Março",
            Money::from_major(150),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            PaymentStatus::Open,
        );
        assert!(matches!(payment.period_source(), PeriodSource::Legacy("Março")));

        let period = payment.normalize_period().unwrap();
        assert_eq!(period, Period::new(3, 2026).unwrap());
        assert_eq!(payment.month_number, Some(3));
        assert_eq!(payment.year_number, Some(2026));
        assert!(matches!(payment.period_source(), PeriodSource::Canonical(_)));
    }

    #[test]
    fn test_stored_period_ignores_label() {
        let mut payment = MonthlyPayment::from_legacy_label(
            Uuid::new_v4(),
            "Março",
            Money::from_major(150),
            NaiveDate::from_ymd_opt(2025, 11, 10).unwrap(),
            PaymentStatus::Open,
        );
        assert_eq!(payment.stored_period(), Period::new(11, 2025).unwrap());

        payment.normalize_period().unwrap();
        assert_eq!(payment.stored_period(), Period::new(3, 2025).unwrap());
    }

    #[test]
    fn test_normalize_rejects_unknown_month() {
        let mut payment = MonthlyPayment::from_legacy_label(
            Uuid::new_v4(),
            "Desconhecido",
            Money::from_major(150),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            PaymentStatus::Open,
        );
        assert!(matches!(
            payment.normalize_period(),
            Err(LedgerError::UnknownMonthName { .. })
        ));
        assert_eq!(payment.month_number, None);
    }

    #[test]
    fn test_mark_paid_sets_paid_at_and_type() {
        let mut payment = june_2026();
        payment.mark_paid(PaymentType::Cash, None, noon(2026, 6, 5)).unwrap();

        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.paid_at, Some(noon(2026, 6, 5)));
        assert_eq!(payment.payment_type, Some(PaymentType::Cash));
        assert!(payment.validate().is_ok());
    }

    #[test]
    fn test_attach_and_delete_receipt() {
        let mut payment = june_2026();
        payment.attach_receipt("comprovante-123.pdf", noon(2026, 6, 8)).unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.payment_type, Some(PaymentType::Pix));
        assert!(payment.has_receipt());

        payment.delete_receipt().unwrap();
        assert_eq!(payment.status, PaymentStatus::Open);
        assert!(payment.paid_at.is_none());
        assert!(payment.payment_type.is_none());
        assert!(matches!(payment.delete_receipt(), Err(LedgerError::NoReceipt)));
    }

    #[test]
    fn test_empty_receipt_rejected() {
        let mut payment = june_2026();
        assert!(matches!(
            payment.attach_receipt("  ", noon(2026, 6, 8)),
            Err(LedgerError::EmptyReceipt)
        ));
        assert_eq!(payment.status, PaymentStatus::Open);
    }

    #[test]
    fn test_postpone() {
        let mut payment = june_2026();
        let early = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(matches!(
            payment.postpone(early),
            Err(LedgerError::InvalidPostponeDate { .. })
        ));

        let later = NaiveDate::from_ymd_opt(2026, 6, 25).unwrap();
        payment.postpone(later).unwrap();
        assert_eq!(payment.status, PaymentStatus::Postponed);
        assert_eq!(payment.postponed_to, Some(later));
        assert!(payment.validate().is_ok());
    }

    #[test]
    fn test_charge() {
        let mut payment = june_2026();
        payment.charge(noon(2026, 6, 20)).unwrap();
        assert_eq!(payment.status, PaymentStatus::Charged);
        assert_eq!(payment.charged_at, Some(noon(2026, 6, 20)));
        assert!(payment.validate().is_ok());
    }

    #[test]
    fn test_scholarship_zeroes_value_and_blocks_payment() {
        let mut payment = june_2026();
        payment.grant_scholarship().unwrap();
        assert_eq!(payment.status, PaymentStatus::Scholarship);
        assert!(payment.value.is_zero());
        assert!(payment.validate().is_ok());

        let before = payment.clone();
        assert!(matches!(
            payment.mark_paid(PaymentType::Pix, None, noon(2026, 6, 5)),
            Err(LedgerError::InvalidTransition {
                from: PaymentStatus::Scholarship,
                to: PaymentStatus::Paid
            })
        ));
        assert!(payment.charge(noon(2026, 6, 5)).is_err());
        assert_eq!(payment, before);
    }

    #[test]
    fn test_paid_rows_cannot_be_charged_or_postponed() {
        let mut payment = june_2026();
        payment.mark_paid(PaymentType::Pix, Some("r1".into()), noon(2026, 6, 5)).unwrap();

        assert!(payment.charge(noon(2026, 6, 20)).is_err());
        assert!(payment.postpone(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()).is_err());
        assert!(payment.grant_scholarship().is_err());
        assert!(payment.withdraw().is_err());
        assert_eq!(payment.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_validate_catches_broken_rows() {
        let mut payment = june_2026();
        payment.status = PaymentStatus::Paid;
        assert!(matches!(payment.validate(), Err(LedgerError::InvariantViolation { .. })));

        let mut payment = june_2026();
        payment.status = PaymentStatus::Scholarship;
        assert!(payment.validate().is_err());

        let mut payment = june_2026();
        payment.status = PaymentStatus::Charged;
        assert!(payment.validate().is_err());

        let mut payment = june_2026();
        payment.status = PaymentStatus::Postponed;
        assert!(payment.validate().is_err());
    }

    #[test]
    fn test_deserialize_legacy_row_without_numbers() {
        let json = r#"{
            "id": "6f1c2a3e-0000-4000-8000-000000000001",
            "student_id": "6f1c2a3e-0000-4000-8000-000000000002",
            "month": "Dezembro/2025",
            "status": "Não Pagou",
            "value": "150.00",
            "due_date": "2025-12-10"
        }"#;
        let payment: MonthlyPayment = serde_json::from_str(json).unwrap();
        assert_eq!(payment.status, PaymentStatus::Unpaid);
        assert_eq!(payment.canonical_period(), None);
        assert_eq!(payment.period(2026).unwrap(), Period::new(12, 2025).unwrap());
    }
}
