/// Throughput in bytes/sec between two readings of a cumulative counter.
///
/// - `None` when `elapsed_secs <= 0`: no basis, the caller keeps whatever it had.
/// - `Some(0)` when the counter went backwards (reboot, interface reset).
/// - otherwise `(current - previous) / elapsed_secs`, truncated.
pub fn derive_rate(previous: u64, current: u64, elapsed_secs: f64) -> Option<u64> {
    if elapsed_secs.is_nan() || elapsed_secs <= 0.0 {
        return None;
    }
    match current.checked_sub(previous) {
        Some(delta) => Some((delta as f64 / elapsed_secs) as u64),
        None => Some(0),
    }
}
