/// monthly report - summary, pending list and json view for a class
use chrono::{NaiveDate, TimeZone, Utc};
use tuition_ledger_rs::{
    calculate_payment_summary, get_pending_payments_info, pending_total, sort_payments_by_due_date,
    LedgerConfig, LedgerView, Money, Period, PaymentType, Registration, SafeTimeProvider,
    SortOrder, StudentLedger, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== monthly report ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap()
    ));
    let config = LedgerConfig::default();
    let february = Period::new(2, 2026)?;

    let mut ledgers = Vec::new();
    for (registered, fee) in [((2025, 11, 3), 150), ((2025, 12, 1), 180), ((2026, 1, 20), 150)] {
        let (y, m, d) = registered;
        let registration = Registration::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            Money::from_major(fee),
        );
        ledgers.push(StudentLedger::generate(&registration, config.clone(), &time)?);
    }

    // one student paid february in cash
    ledgers[1].mark_paid(february, PaymentType::Cash, None, &time)?;

    let all: Vec<_> = ledgers.iter().flat_map(|l| l.payments().to_vec()).collect();
    let summary = calculate_payment_summary(&all, february, 2026);
    println!(
        "{}: {} paid, {} open, {} overdue of {}",
        february, summary.paid, summary.open, summary.overdue, summary.total
    );

    let pending = get_pending_payments_info(
        &sort_payments_by_due_date(&all, SortOrder::Ascending),
        &config,
        &time,
    );
    for item in &pending {
        println!("  pending {:<16} {}", item.month, item.value.to_brl());
    }
    println!("  total pending: {}", pending_total(&pending).to_brl());

    println!("\n{}", LedgerView::from_ledger(&ledgers[0], &time).to_json_pretty()?);
    Ok(())
}
