/// Timestamp ordering and duplicate screening
///
/// Timestamps are rounded to the requested precision first, so readings
/// closer together than the precision collapse into duplicates by design.

use std::collections::HashSet;

use chrono::Duration;

use crate::track::Track;

fn round_to_precision(timestamp_seconds: i64, precision: Duration) -> i64 {
    let step = precision.num_seconds().max(1);
    (timestamp_seconds + step / 2).div_euclid(step) * step
}

/// Drops rows whose rounded timestamp duplicates an earlier row's (first
/// occurrence kept), and rows that step backwards in time relative to the
/// immediately preceding row in the track's native order.
pub fn validate_times(track: &Track, precision: Duration) -> Track {
    let rounded: Vec<i64> = track
        .obs
        .iter()
        .map(|o| round_to_precision(o.datetime.timestamp(), precision))
        .collect();

    let mut seen: HashSet<i64> = HashSet::new();
    let mut keep = Vec::with_capacity(track.len());

    for (i, &t) in rounded.iter().enumerate() {
        let duplicated = !seen.insert(t);
        let reversed = i > 0 && t < rounded[i - 1];
        keep.push(!(duplicated || reversed));
    }

    track.filter_by_mask(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Observation, Track};
    use chrono::{TimeZone, Utc};

    fn track_at_offsets(offsets_seconds: &[i64]) -> Track {
        let start = Utc.with_ymd_and_hms(2020, 1, 15, 0, 0, 0).unwrap();
        let obs = offsets_seconds
            .iter()
            .map(|&s| Observation {
                datetime: start + Duration::seconds(s),
                latitude: 75.0,
                longitude: 10.0,
            })
            .collect();
        Track::new(obs)
    }

    #[test]
    fn test_strictly_increasing_after_validation() {
        // duplicate at 3600, reversal at 5400 -> 1800
        let track = track_at_offsets(&[0, 3600, 3600, 5400, 1800, 7200]);
        let filtered = validate_times(&track, Duration::minutes(1));

        for pair in filtered.obs.windows(2) {
            assert!(pair[1].datetime > pair[0].datetime);
        }
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_near_simultaneous_fixes_collapse() {
        // 20 s apart rounds to the same minute
        let track = track_at_offsets(&[0, 20, 3600]);
        let filtered = validate_times(&track, Duration::minutes(1));
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.obs[0].datetime, track.obs[0].datetime);
    }

    #[test]
    fn test_reversal_judged_against_preceding_row() {
        // Index 3 steps back relative to index 2 in original order, even
        // though index 2 itself is a duplicate and gets dropped.
        let track = track_at_offsets(&[0, 3600, 3600, 1800, 7200]);
        let filtered = validate_times(&track, Duration::minutes(1));
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered.obs[2].datetime, track.obs[4].datetime);
    }
}
