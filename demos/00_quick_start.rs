/// quick start - register a student and look at the generated payments
use tuition_ledger_rs::{
    LedgerConfig, Money, Registration, SafeTimeProvider, StudentLedger, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== quick start ===\n");

    let time = SafeTimeProvider::new(TimeSource::System);
    let registration = Registration::new(
        Uuid::new_v4(),
        time.now().date_naive(),
        Money::from_major(150),
    );

    let ledger = StudentLedger::generate(&registration, LedgerConfig::default(), &time)?;

    println!("student {}", ledger.student_id);
    for payment in ledger.payments() {
        println!(
            "  {:<16} {:<10} {:>12}  due {}",
            payment.month,
            payment.status,
            payment.value.to_brl(),
            payment.due_date
        );
    }

    Ok(())
}
