use std::time::Duration;

use jiff::{SignedDuration, Span, SpanRelativeTo};

/// Accepts ISO 8601 (`PT30S`), friendly (`30s`, `1m 30s`) or plain seconds (`30`).
/// The sign is kept, [`to_std_duration`] rejects negative values.
pub fn parse_duration(input: &str) -> Result<SignedDuration, String> {
    let input = input.trim();

    input
        .parse::<SignedDuration>()
        .ok()
        .or_else(|| {
            input
                .parse::<Span>()
                .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
                .ok()
        })
        .or_else(|| input.parse::<i64>().ok().map(SignedDuration::from_secs))
        .ok_or_else(|| format!("Invalid duration: {input}"))
}

/// Durations given to the planner and the oracle are never negative.
pub fn to_std_duration(duration: SignedDuration) -> anyhow::Result<Duration> {
    Duration::try_from(duration)
        .map_err(|_| anyhow::anyhow!("duration must not be negative, got {duration}"))
}
