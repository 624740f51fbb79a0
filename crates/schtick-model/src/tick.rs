use time::{Duration, OffsetDateTime};

/// First whole second strictly after `now`, keeping `now`'s offset.
///
/// This is the instant a once-per-second schedule fires next.
pub fn next_whole_second(now: OffsetDateTime) -> OffsetDateTime {
    now - Duration::nanoseconds(i64::from(now.nanosecond())) + Duration::SECOND
}
