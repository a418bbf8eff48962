//! Content signatures for song identity.
//!
//! A signature is `sha1(title_norm | artist_id | rounded_duration)` in lowercase
//! hex. Durations are rounded to the nearest bucket (`round(d / w) * w`) so
//! that encoding noise across sources lands on the same identity. The bucket
//! width is configurable, but for any fixed width the output must stay
//! byte-for-byte stable: changing the rounding would change which stored
//! signatures collide.

use sha1::{Digest, Sha1};

/// Bucket width used by the existing catalog.
pub const DEFAULT_BUCKET_SECS: u32 = 3;

/// Round a duration to its bucket. Missing durations fall into bucket 0.
///
/// Exact halves round up (`f64::round`), which only matters for even widths.
pub fn round_duration(duration_sec: Option<u32>, bucket_secs: u32) -> u64 {
    let Some(duration) = duration_sec else {
        return 0;
    };
    if bucket_secs == 0 {
        return duration as u64;
    }
    let buckets = (duration as f64 / bucket_secs as f64).round() as u64;
    buckets * bucket_secs as u64
}

/// Compute the signature of a song.
pub fn song_signature(title_norm: &str, artist_id: i64, duration_sec: Option<u32>, bucket_secs: u32) -> String {
    let rounded = round_duration(duration_sec, bucket_secs);

    let mut hasher = Sha1::new();
    hasher.update(title_norm.as_bytes());
    hasher.update(b"|");
    hasher.update(artist_id.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(rounded.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}
