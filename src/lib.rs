pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod payment;
pub mod period;
pub mod reporting;
pub mod serialization;
pub mod status;
pub mod types;

// re-export key types
pub use config::LedgerConfig;
pub use decimal::Money;
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use ledger::{Registration, StatusChange, StudentLedger};
pub use payment::MonthlyPayment;
pub use period::{month_name, month_number, parse_month_from_string, Period, PeriodSource};
pub use reporting::{
    calculate_payment_summary, format_payment_period, get_pending_payments_info,
    has_overdue_payments, is_payment_from_base_date, is_payment_in_period, pending_total,
    sort_payments_by_due_date, PaymentSummary, PendingPayment,
};
pub use serialization::LedgerView;
pub use status::{determine_payment_status, PeriodPosition, StatusResolver};
pub use types::{PaymentId, PaymentStatus, PaymentType, SortOrder, StudentId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
