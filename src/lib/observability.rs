use std::{sync::Once, time::Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};

static DESCRIBE: Once = Once::new();

/// Registers metric descriptions with whatever recorder the host process
/// installed. Safe to call more than once.
pub fn describe() {
    DESCRIBE.call_once(|| {
        describe_counter!(
            "reservedb_store_operations_total",
            "Total number of operations executed by the snapshot store."
        );
        describe_histogram!(
            "reservedb_store_operation_duration_seconds",
            "Duration of operations executed by the snapshot store."
        );
    });
}

pub(crate) fn record_store_op(operation: &'static str, status: &'static str, duration: f64) {
    let labels = [("operation", operation), ("status", status)];
    counter!("reservedb_store_operations_total", &labels).increment(1);
    histogram!("reservedb_store_operation_duration_seconds", &labels).record(duration);
}

pub(crate) fn timed<T, E>(
    operation: &'static str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let start = Instant::now();
    let result = f();
    record_store_op(
        operation,
        if result.is_ok() { "ok" } else { "err" },
        start.elapsed().as_secs_f64(),
    );
    result
}
