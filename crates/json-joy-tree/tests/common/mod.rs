#![allow(dead_code)]

pub mod fixtures;

/// Routes `tracing` output through the test harness. Safe to call from every
/// test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
