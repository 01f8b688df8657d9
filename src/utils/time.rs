use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Wall-clock time since the epoch; zero if the clock reads before 1970.
pub fn duration_since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Wall-clock unix seconds, the unit ledger deadlines are expressed in.
pub fn now_unix_secs() -> u64 {
    duration_since_epoch().as_secs()
}

/// Whether a ledger deadline (unix seconds) has been reached at `now`.
pub fn deadline_reached(
    deadline: u64,
    now: u64,
) -> bool {
    now >= deadline
}
