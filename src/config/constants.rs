/// Maximum allowed text length for a single generation request (in characters).
///
/// Requests exceeding this limit are rejected with `VALIDATION_ERROR`.
pub const MAX_TEXT_LENGTH: usize = 100_000;

/// Default protocol-wide speed bounds, before a provider clamps into its
/// own narrower range.
pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;

/// Fixed gap inserted between stitched chunks, in milliseconds. The timing
/// normalizer consults this same value rather than redeclaring it.
pub const DEFAULT_SILENCE_BETWEEN_MS: u64 = 100;

/// Default age, in hours, after which a completed or failed job (and its
/// audio file) becomes eligible for garbage collection.
pub const DEFAULT_JOB_MAX_AGE_HOURS: i64 = 24;
