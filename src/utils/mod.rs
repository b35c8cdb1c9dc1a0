//! Project-specific utilities live here.

use time::OffsetDateTime;

/// Current Unix time in whole seconds, as stored in `addedOn`.
pub fn unix_timestamp_now() -> f64 {
    OffsetDateTime::now_utc().unix_timestamp() as f64
}
