/// time control - watch statuses change as the grace window closes
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use tuition_ledger_rs::{
    LedgerConfig, Money, Period, PaymentType, Registration, SafeTimeProvider, StudentLedger,
    TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== time control example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let registration = Registration::new(
        Uuid::new_v4(),
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        Money::from_major(150),
    );
    let mut ledger = StudentLedger::generate(&registration, LedgerConfig::default(), &time)?;
    let march = Period::new(3, 2026)?;
    let april = Period::new(4, 2026)?;

    println!("{}: march is {}", time.now().format("%Y-%m-%d"), ledger.payment(march).unwrap().status);

    // past the 10th
    controller.advance(Duration::days(10));
    for change in ledger.refresh_statuses(&time) {
        println!("{}: {} {} -> {}", time.now().format("%Y-%m-%d"), change.period, change.old_status, change.new_status);
    }

    // collection attempt, then payment by pix
    ledger.charge(march, &time)?;
    println!("march charged: {}", ledger.payment(march).unwrap().status);
    ledger.mark_paid(march, PaymentType::Pix, Some("pix-e2e-0312".to_string()), &time)?;
    println!("march paid: {}", ledger.payment(march).unwrap().status);

    // april gets postponed to the 20th
    ledger.postpone(april, NaiveDate::from_ymd_opt(2026, 4, 20).unwrap(), &time)?;
    controller.advance(Duration::days(30));
    ledger.refresh_statuses(&time);
    println!("{}: april is {}", time.now().format("%Y-%m-%d"), ledger.payment(april).unwrap().status);

    println!("\n{} events recorded", ledger.take_events().len());
    Ok(())
}
