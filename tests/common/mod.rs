use splitstat::VariationData;

/// Routes library logs to the test writer. Honors `RUST_LOG`; safe to call
/// from every test.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn arm(key: &str, participants: u64, conversions: u64) -> VariationData {
    VariationData::new(key, participants, conversions)
}
