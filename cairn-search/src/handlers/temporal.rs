//! `handle_temporal`.

use crate::types::{Candidate, TemporalBounds};
use cairn_storage::{MemoryFilter, Storage};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Default lookback window when the router extracted neither bound.
const DEFAULT_WINDOW_DAYS: i64 = 7;

pub async fn handle_temporal(storage: &Arc<dyn Storage>, bounds: &TemporalBounds, project: &str) -> Vec<Candidate> {
    let now = Utc::now();
    let after = bounds.after.as_deref().and_then(parse_bound);
    let before = bounds.before.as_deref().and_then(parse_bound);
    let (after, before) = resolve_window(after, before, now);

    let filter = MemoryFilter { project: Some(project.to_string()), active_only: true, ..Default::default() };
    let rows = match storage.list_memories(&filter).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(error = %err, "list_memories failed, temporal handler empty");
            return Vec::new();
        }
    };

    let mut matched: Vec<DateTime<Utc>> = Vec::new();
    let mut ids: Vec<i64> = Vec::new();
    for row in rows {
        if row.created_at >= after && row.created_at <= before {
            ids.push(row.id);
            matched.push(row.created_at);
        }
    }

    let mut by_recency: Vec<(i64, DateTime<Utc>)> = ids.into_iter().zip(matched).collect();
    by_recency.sort_by(|a, b| b.1.cmp(&a.1));

    by_recency.into_iter().enumerate().map(|(i, (id, _))| Candidate::new(id, 1.0 / (i as f64 + 1.0))).collect()
}

/// Resolves the router's extracted `after`/`before` into a concrete window. The 7-day default
/// applies only when *neither* bound was extracted; a `before`-only query gets no lower bound at
/// all, not an implicit "last 7 days before `before`".
fn resolve_window(after: Option<DateTime<Utc>>, before: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    match (after, before) {
        (None, None) => (now - Duration::days(DEFAULT_WINDOW_DAYS), now),
        (Some(a), None) => (a, now),
        (None, Some(b)) => (DateTime::<Utc>::MIN_UTC, b),
        (Some(a), Some(b)) => (a, b),
    }
}

/// Parses an ISO-8601 timestamp, or the `"<N> days ago"` shorthand the
/// router commonly emits for relative bounds. Anything else is treated as
/// absent rather than erroring, since a malformed bound degrading to the
/// default window is preferable to failing the whole search.
fn parse_bound(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    let trimmed = text.trim().to_lowercase();
    let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    if !digits.is_empty() && (trimmed.contains("day ago") || trimmed.contains("days ago")) {
        let n: i64 = digits.parse().ok()?;
        return Some(Utc::now() - Duration::days(n));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso8601() {
        let parsed = parse_bound("2026-01-01T00:00:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn parses_relative_days_ago() {
        let parsed = parse_bound("7 days ago").unwrap();
        let expected = Utc::now() - Duration::days(7);
        assert!((parsed - expected).num_seconds().abs() < 5);
    }

    #[test]
    fn unparseable_bound_is_none() {
        assert!(parse_bound("sometime").is_none());
    }

    #[test]
    fn neither_bound_defaults_to_seven_day_window() {
        let now = Utc::now();
        let (after, before) = resolve_window(None, None, now);
        assert_eq!(before, now);
        assert_eq!(after, now - Duration::days(DEFAULT_WINDOW_DAYS));
    }

    #[test]
    fn before_only_has_no_lower_bound() {
        let now = Utc::now();
        let before = now - Duration::days(90);
        let (after, resolved_before) = resolve_window(None, Some(before), now);
        assert_eq!(resolved_before, before);
        assert_eq!(after, DateTime::<Utc>::MIN_UTC, "a before-only query must not impose an implicit 7-day lower bound");
    }

    #[test]
    fn after_only_extends_to_now() {
        let now = Utc::now();
        let after = now - Duration::days(30);
        let (resolved_after, before) = resolve_window(Some(after), None, now);
        assert_eq!(resolved_after, after);
        assert_eq!(before, now);
    }
}
