/// Regular-grid resampling of cleaned tracks
///
/// The reporting interval varies between buoy models, so the target
/// frequency is inferred per track from the median inter-fix interval and
/// snapped to a standard grid. Grid points that fall inside a data gap
/// wider than the caller's maximum are left out rather than bridged.

use chrono::{DateTime, TimeZone, Utc};

use crate::rolling::median;
use crate::track::{Observation, Track};

/// Median sampling interval in whole minutes, snapped: 30 min for anything
/// at or under half-hourly, 60 min for roughly hourly reporters (a few
/// buoys sit at 61 min, which is certainly a programming error), otherwise
/// rounded to the nearest 10 min.
pub fn infer_frequency_minutes(track: &Track) -> Option<i64> {
    if track.len() < 2 {
        return None;
    }

    let intervals: Vec<f64> = track
        .obs
        .windows(2)
        .map(|pair| (pair[1].datetime - pair[0].datetime).num_seconds() as f64 / 60.0)
        .collect();

    let f = median(&intervals).round();
    if !f.is_finite() {
        return None;
    }

    let snapped = if f <= 30.0 {
        30
    } else if f <= 65.0 {
        60
    } else {
        ((f / 10.0).round() * 10.0) as i64
    };

    Some(snapped)
}

/// Linear interpolation of the track onto a regular grid of `freq_minutes`,
/// aligned to whole multiples of the frequency. Grid points bracketed by
/// observations further apart than `maxgap_minutes` are skipped.
pub fn interpolate_track(track: &Track, freq_minutes: i64, maxgap_minutes: i64) -> Track {
    if track.len() < 2 || freq_minutes <= 0 {
        return Track::default();
    }

    let times: Vec<DateTime<Utc>> = track.times();
    let step = freq_minutes * 60;
    let maxgap = maxgap_minutes * 60;

    let first = times.first().unwrap().timestamp();
    let last = times.last().unwrap().timestamp();
    let mut t = first.div_euclid(step) * step;
    if t < first {
        t += step;
    }

    let mut obs = Vec::new();

    while t <= last {
        let grid_time = Utc.timestamp_opt(t, 0).unwrap();
        let hi = times.partition_point(|&x| x < grid_time);

        if hi < times.len() && times[hi] == grid_time {
            obs.push(Observation {
                datetime: grid_time,
                ..track.obs[hi]
            });
        } else if hi > 0 && hi < times.len() {
            let lo = hi - 1;
            let gap = (times[hi] - times[lo]).num_seconds();
            if gap <= maxgap {
                let w = (t - times[lo].timestamp()) as f64 / gap as f64;
                let a = &track.obs[lo];
                let b = &track.obs[hi];
                obs.push(Observation {
                    datetime: grid_time,
                    latitude: a.latitude + w * (b.latitude - a.latitude),
                    longitude: a.longitude + w * (b.longitude - a.longitude),
                });
            }
        }

        t += step;
    }

    Track::new(obs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::test_support::synthetic_track;
    use chrono::Duration;

    #[test]
    fn test_frequency_snapping() {
        let ten_min = synthetic_track(&[(75.0, 10.0); 10], Duration::minutes(10));
        assert_eq!(infer_frequency_minutes(&ten_min), Some(30));

        let hourly = synthetic_track(&[(75.0, 10.0); 10], Duration::minutes(61));
        assert_eq!(infer_frequency_minutes(&hourly), Some(60));

        let two_hourly = synthetic_track(&[(75.0, 10.0); 10], Duration::minutes(120));
        assert_eq!(infer_frequency_minutes(&two_hourly), Some(120));

        let single = synthetic_track(&[(75.0, 10.0)], Duration::minutes(10));
        assert_eq!(infer_frequency_minutes(&single), None);
    }

    #[test]
    fn test_linear_interpolation_midpoint() {
        let track = synthetic_track(&[(75.0, 10.0), (76.0, 11.0)], Duration::hours(1));
        let interp = interpolate_track(&track, 30, 120);

        assert_eq!(interp.len(), 3);
        assert!((interp.obs[1].latitude - 75.5).abs() < 1e-12);
        assert!((interp.obs[1].longitude - 10.5).abs() < 1e-12);
        assert_eq!(interp.obs[0].datetime, track.obs[0].datetime);
        assert_eq!(interp.obs[2].datetime, track.obs[1].datetime);
    }

    #[test]
    fn test_wide_gaps_are_not_bridged() {
        let start = track_start();
        let track = Track::new(vec![
            obs_at(start, 0, 75.0),
            obs_at(start, 60, 75.1),
            obs_at(start, 300, 75.5),
        ]);

        let interp = interpolate_track(&track, 30, 120);
        // grid points inside the 4 h gap are skipped, exact fixes survive
        let kept: Vec<i64> = interp
            .obs
            .iter()
            .map(|o| (o.datetime - start).num_minutes())
            .collect();
        assert_eq!(kept, vec![0, 30, 60, 300]);
    }

    fn track_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 15, 0, 0, 0).unwrap()
    }

    fn obs_at(start: DateTime<Utc>, minutes: i64, latitude: f64) -> Observation {
        Observation {
            datetime: start + Duration::minutes(minutes),
            latitude,
            longitude: 10.0,
        }
    }
}
