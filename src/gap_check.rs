/// Gap-based track segmentation
///
/// Short clusters of fixes bracketed by long silences are usually spurious
/// wake-up transmissions rather than reliable drift samples, so segments at
/// or below the minimum length are dropped outright.

use chrono::Duration;

use crate::track::Track;

/// Segment label per observation, assigned in temporal order starting at 0.
/// A gap to the *next* observation larger than the threshold ends the
/// current segment; it never relabels rows already emitted.
fn segment_labels(track: &Track, gap_threshold: Duration) -> Vec<usize> {
    let n = track.len();
    let mut labels = Vec::with_capacity(n);
    let mut counter = 0;

    for i in 0..n {
        labels.push(counter);
        if i + 1 < n {
            let till_next = track.obs[i + 1].datetime - track.obs[i].datetime;
            if till_next > gap_threshold {
                counter += 1;
            }
        }
    }

    labels
}

/// Splits the track at gaps exceeding `gap_threshold` and keeps only the
/// segments with more than `min_segment_length` observations, in original
/// order.
pub fn segment_and_filter(
    track: &Track,
    gap_threshold: Duration,
    min_segment_length: usize,
) -> Track {
    let labels = segment_labels(track, gap_threshold);

    let segment_count = labels.last().map_or(0, |&l| l + 1);
    let mut sizes = vec![0usize; segment_count];
    for &label in &labels {
        sizes[label] += 1;
    }

    let keep: Vec<bool> = labels
        .iter()
        .map(|&label| sizes[label] > min_segment_length)
        .collect();

    track.filter_by_mask(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Observation, Track};
    use chrono::{TimeZone, Utc};

    fn track_at_hours(hours: &[i64]) -> Track {
        let start = Utc.with_ymd_and_hms(2020, 1, 15, 0, 0, 0).unwrap();
        let obs = hours
            .iter()
            .map(|&h| Observation {
                datetime: start + Duration::hours(h),
                latitude: 75.0,
                longitude: 10.0,
            })
            .collect();
        Track::new(obs)
    }

    #[test]
    fn test_gap_ends_current_segment() {
        // gaps of 1h then 10h with a 4h threshold
        let track = track_at_hours(&[0, 1, 11]);
        let labels = segment_labels(&track, Duration::hours(4));
        assert_eq!(labels, vec![0, 0, 1]);
    }

    #[test]
    fn test_short_trailing_segment_dropped() {
        let track = track_at_hours(&[0, 1, 11]);
        let filtered = segment_and_filter(&track, Duration::hours(4), 1);

        // segment 0 has 2 rows (> 1), segment 1 has a single row
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.obs[1].datetime, track.obs[1].datetime);
    }

    #[test]
    fn test_minimum_length_is_strict() {
        // both segments have exactly 2 rows; 2 > 2 is false, so both go
        let track = track_at_hours(&[0, 1, 11, 12]);
        let filtered = segment_and_filter(&track, Duration::hours(4), 2);
        assert_eq!(filtered.len(), 0);
    }

    #[test]
    fn test_gapless_track_is_untouched() {
        let track = track_at_hours(&[0, 1, 2, 3, 4]);
        let filtered = segment_and_filter(&track, Duration::hours(4), 3);
        assert_eq!(filtered.len(), 5);
    }
}
