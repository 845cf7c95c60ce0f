use crate::config::BatchConfig;
use std::time::Duration;

/// Message fragments marking an error as transient
const TRANSIENT_MARKERS: &[&str] = &[
    "connection",
    "timeout",
    "timed out",
    "reset",
    "socket",
    "network",
    "broken pipe",
    "eof",
    "unexpected end",
    "temporarily unavailable",
];

/// Check if a generation error is worth retrying.
///
/// Inspects the whole error chain, case-insensitively.
pub fn is_transient(error: &anyhow::Error) -> bool {
    is_transient_message(&format!("{error:#}"))
}

pub fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Delay before retry number `retry` (1-based): exponential, capped, with
/// equal jitter.
pub fn backoff_delay(retry: u32, config: &BatchConfig) -> Duration {
    let base = exponential_backoff(retry, config);
    jittered(base, random_u64())
}

fn exponential_backoff(retry: u32, config: &BatchConfig) -> Duration {
    let factor = 2u64.saturating_pow(retry.saturating_sub(1));
    let millis = config
        .initial_backoff_ms
        .saturating_mul(factor)
        .min(config.max_backoff_ms);
    Duration::from_millis(millis)
}

/// Keep half of `base` and randomize the other half
fn jittered(base: Duration, random: u64) -> Duration {
    let millis = base.as_millis() as u64;
    let half = millis / 2;
    let spread = millis - half;
    let extra = if spread == 0 { 0 } else { random % (spread + 1) };
    Duration::from_millis(half + extra)
}

fn random_u64() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_be_bytes(bytes),
        Err(_) => 0,
    }
}
