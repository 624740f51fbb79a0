use time::Duration;

/// Safety margin a lock outlives the task's catch-up window by.
pub const LOCK_TTL_MARGIN: Duration = Duration::HOUR;

/// Lifetime of a lock record: `max(window, 0) + 1h`.
///
/// Long enough that no node still inside the catch-up window can re-claim the
/// occurrence, short enough that a crashed holder does not pin the key forever.
pub fn lock_ttl(window: Duration) -> Duration {
    window.max(Duration::ZERO).saturating_add(LOCK_TTL_MARGIN)
}

/// Largest TTL handed to a store, in milliseconds.
///
/// Redis rejects a `PX` whose absolute expiry (now + ttl) overflows `i64`;
/// half of `i64::MAX` leaves room for any realistic clock.
pub const MAX_LOCK_TTL_MS: u64 = (i64::MAX / 2) as u64;

/// [`lock_ttl`] in whole milliseconds, the unit the store expects.
///
/// Capped at [`MAX_LOCK_TTL_MS`].
pub fn lock_ttl_ms(window: Duration) -> u64 {
    u64::try_from(lock_ttl(window).whole_milliseconds())
        .unwrap_or(MAX_LOCK_TTL_MS)
        .min(MAX_LOCK_TTL_MS)
}
