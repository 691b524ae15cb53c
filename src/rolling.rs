/// Time-windowed centered rolling statistics
///
/// All statistics use a centered window: for row i, every row j with
/// |t_j - t_i| <= window/2 is in scope. NaN values inside the window are
/// skipped; a statistic is reported as NaN unless at least `n_min` valid
/// samples fall inside the window. Timestamps are assumed nondecreasing,
/// which holds for any track that passed the time check.

use chrono::{DateTime, Duration, Utc};

/// Inclusive index bounds [lo, hi) of the centered window around each row.
/// Two-pointer sweep, so the whole pass is O(n).
fn window_ranges(times: &[DateTime<Utc>], window: Duration) -> Vec<(usize, usize)> {
    let half = window / 2;
    let n = times.len();
    let mut ranges = Vec::with_capacity(n);
    let mut lo = 0;
    let mut hi = 0;

    for i in 0..n {
        while lo < n && times[i] - times[lo] > half {
            lo += 1;
        }
        if hi < i {
            hi = i;
        }
        while hi < n && times[hi] - times[i] <= half {
            hi += 1;
        }
        ranges.push((lo, hi));
    }

    ranges
}

/// Number of observations inside each centered window (valid values only).
pub fn rolling_count(times: &[DateTime<Utc>], values: &[f64], window: Duration) -> Vec<usize> {
    window_ranges(times, window)
        .iter()
        .map(|&(lo, hi)| values[lo..hi].iter().filter(|v| v.is_finite()).count())
        .collect()
}

pub fn rolling_mean(
    times: &[DateTime<Utc>],
    values: &[f64],
    window: Duration,
    n_min: usize,
) -> Vec<f64> {
    window_ranges(times, window)
        .iter()
        .map(|&(lo, hi)| {
            let valid: Vec<f64> = values[lo..hi].iter().copied().filter(|v| v.is_finite()).collect();
            if valid.len() < n_min || valid.is_empty() {
                f64::NAN
            } else {
                valid.iter().sum::<f64>() / valid.len() as f64
            }
        })
        .collect()
}

/// Sample standard deviation (n - 1 denominator); NaN below `n_min` valid
/// samples or with fewer than two values.
pub fn rolling_std(
    times: &[DateTime<Utc>],
    values: &[f64],
    window: Duration,
    n_min: usize,
) -> Vec<f64> {
    window_ranges(times, window)
        .iter()
        .map(|&(lo, hi)| {
            let valid: Vec<f64> = values[lo..hi].iter().copied().filter(|v| v.is_finite()).collect();
            if valid.len() < n_min.max(2) {
                return f64::NAN;
            }
            let mean = valid.iter().sum::<f64>() / valid.len() as f64;
            let ss: f64 = valid.iter().map(|v| (v - mean) * (v - mean)).sum();
            (ss / (valid.len() - 1) as f64).sqrt()
        })
        .collect()
}

pub fn rolling_median(
    times: &[DateTime<Utc>],
    values: &[f64],
    window: Duration,
    n_min: usize,
) -> Vec<f64> {
    window_ranges(times, window)
        .iter()
        .map(|&(lo, hi)| {
            let mut valid: Vec<f64> =
                values[lo..hi].iter().copied().filter(|v| v.is_finite()).collect();
            if valid.len() < n_min || valid.is_empty() {
                return f64::NAN;
            }
            valid.sort_by(|a, b| a.partial_cmp(b).unwrap());
            median_of_sorted(&valid)
        })
        .collect()
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Median of an arbitrary finite slice. NaN for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.sort_by(|a, b| a.partial_cmp(b).unwrap());
    median_of_sorted(&valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hourly_times(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn test_rolling_count_centered() {
        let times = hourly_times(5);
        let values = vec![1.0; 5];
        // 2h window -> +/- 1h around each point
        let counts = rolling_count(&times, &values, Duration::hours(2));
        assert_eq!(counts, vec![2, 3, 3, 3, 2]);
    }

    #[test]
    fn test_rolling_mean_skips_nan() {
        let times = hourly_times(3);
        let values = vec![1.0, f64::NAN, 3.0];
        let means = rolling_mean(&times, &values, Duration::hours(4), 1);
        // every window spans all three rows, NaN excluded
        for m in means {
            assert!((m - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rolling_mean_respects_n_min() {
        let times = hourly_times(5);
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let means = rolling_mean(&times, &values, Duration::hours(2), 3);
        // endpoints only see 2 samples
        assert!(means[0].is_nan());
        assert!((means[1] - 2.0).abs() < 1e-12);
        assert!((means[2] - 3.0).abs() < 1e-12);
        assert!((means[3] - 4.0).abs() < 1e-12);
        assert!(means[4].is_nan());
    }

    #[test]
    fn test_rolling_std_sample_denominator() {
        let times = hourly_times(3);
        let values = vec![2.0, 4.0, 6.0];
        let stds = rolling_std(&times, &values, Duration::hours(10), 1);
        // sample std of [2, 4, 6] is 2
        assert!((stds[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_median_even_and_odd() {
        let times = hourly_times(4);
        let values = vec![1.0, 10.0, 2.0, 100.0];
        let meds = rolling_median(&times, &values, Duration::hours(10), 1);
        // full window everywhere: median of [1, 2, 10, 100] = 6
        assert!((meds[0] - 6.0).abs() < 1e-12);
        assert!((median(&[3.0, 1.0, 2.0]) - 2.0).abs() < 1e-12);
        assert!(median(&[]).is_nan());
    }
}
