use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::period::Period;
use crate::types::{PaymentId, PaymentStatus, PaymentType, StudentId};

/// all events that can be emitted by a student ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    PaymentsGenerated {
        student_id: StudentId,
        first_period: Period,
        last_period: Period,
        count: usize,
        monthly_value: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentImported {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
    },

    // status events
    StatusChanged {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
        old_status: PaymentStatus,
        new_status: PaymentStatus,
        timestamp: DateTime<Utc>,
    },

    // manual transitions
    PaymentMarkedPaid {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
        amount: Money,
        payment_type: PaymentType,
        timestamp: DateTime<Utc>,
    },
    ReceiptAttached {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
        receipt: String,
        timestamp: DateTime<Utc>,
    },
    ReceiptDeleted {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
        timestamp: DateTime<Utc>,
    },
    PaymentPostponed {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
        postponed_to: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    PaymentCharged {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    ScholarshipGranted {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
        waived_amount: Money,
        timestamp: DateTime<Utc>,
    },
    StudentWithdrawn {
        student_id: StudentId,
        payment_id: PaymentId,
        period: Period,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
