/// Parse a duration label into whole minutes.
///
/// `H:MM:SS` gives `H * 60 + MM`, `MM:SS` gives `MM`. Seconds are dropped.
/// Anything else (including non-numeric parts or a total too large to
/// represent) counts as zero minutes.
pub fn total_minutes(text: &str) -> u64 {
    let parts: Vec<&str> = text.trim().split(':').collect();

    let parsed: Option<Vec<u64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
    let Some(values) = parsed else {
        return 0;
    };

    match values.as_slice() {
        [hours, minutes, _seconds] => hours
            .checked_mul(60)
            .and_then(|h| h.checked_add(*minutes))
            .unwrap_or(0),
        [minutes, _seconds] => *minutes,
        _ => 0,
    }
}

/// Minutes left after `minutes_watched`, never negative
pub fn remaining_minutes(text: &str, minutes_watched: f64) -> f64 {
    (total_minutes(text) as f64 - minutes_watched).max(0.0)
}
