/// Statistical speed-anomaly screening
///
/// A fix that is randomly offset from the drift path leaves a signature in
/// the velocity record. Robust rolling z-scores of the u and v components
/// pick out that signature; scores near each suspect fix are then
/// recomputed with the suspect excluded, so one bad position cannot hide
/// inside the statistics it contaminated. A physical speed ceiling acts as
/// a backstop where the rolling statistics are undefined or were already
/// contaminated.

use chrono::{DateTime, Duration, Utc};

use crate::rolling::{median, rolling_count, rolling_mean, rolling_median, rolling_std};
use crate::track::Track;
use crate::velocity::{compute_velocity, DifferenceMethod};

/// Looser threshold used to schedule local recomputation, distinct from the
/// final rejection threshold.
const SUSPECT_THRESHOLD: f64 = 3.0;

const FALLBACK_N_MIN: usize = 10;

/// Minimum number of samples a rolling window must hold for its statistics
/// to count: 40% of the median centered-window occupancy, floored, with a
/// fixed fallback when that comes out at zero.
pub(crate) fn minimum_window_samples(times: &[DateTime<Utc>], window: Duration) -> usize {
    let ones = vec![1.0; times.len()];
    let counts: Vec<f64> = rolling_count(times, &ones, window)
        .into_iter()
        .map(|c| c as f64)
        .collect();

    let n_min = (0.4 * median(&counts)).floor();
    if n_min > 0.0 {
        n_min as usize
    } else {
        FALLBACK_N_MIN
    }
}

/// Robust z-score of one velocity component: centered rolling
/// standardization followed by a rolling-median detrend to strip residual
/// low-frequency structure.
fn component_zscores(
    times: &[DateTime<Utc>],
    values: &[f64],
    window: Duration,
    n_min: usize,
) -> Vec<f64> {
    let mean = rolling_mean(times, values, window, n_min);
    let std = rolling_std(times, values, window, n_min);

    let standardized: Vec<f64> = values
        .iter()
        .zip(mean.iter().zip(std.iter()))
        .map(|(&x, (&m, &s))| (x - m) / s)
        .collect();

    let detrend = rolling_median(times, &standardized, window, n_min);

    standardized
        .iter()
        .zip(detrend.iter())
        .map(|(&z, &d)| z - d)
        .collect()
}

/// Flags and removes fixes whose velocity z-score exceeds `sigma` or whose
/// implied speed exceeds `max_speed` (m/s).
///
/// Suspects are fixed upfront from the initial scores and processed in
/// timestamp order; each one gets an independent local recomputation on the
/// surrounding 1.5x window with the suspect excluded, overwriting scores
/// within 0.5x window. Where refinement windows overlap, the later suspect's
/// refinement wins.
pub fn detect_speed_anomalies(
    track: &Track,
    window: Duration,
    sigma: f64,
    max_speed: f64,
) -> Track {
    let n = track.len();
    if n == 0 {
        return track.clone();
    }

    let times = track.times();
    let n_min = minimum_window_samples(&times, window);

    let velocity = compute_velocity(track, DifferenceMethod::ForwardBackward);
    let u: Vec<f64> = velocity.iter().map(|s| s.u).collect();
    let v: Vec<f64> = velocity.iter().map(|s| s.v).collect();

    let zu_init = component_zscores(&times, &u, window, n_min);
    let zv_init = component_zscores(&times, &v, window, n_min);

    let suspects: Vec<usize> = (0..n)
        .filter(|&i| zu_init[i].abs() > SUSPECT_THRESHOLD || zv_init[i].abs() > SUSPECT_THRESHOLD)
        .collect();

    let mut zu = zu_init;
    let mut zv = zv_init;

    let wide_seconds = (window + window / 2).num_seconds();
    let narrow_seconds = (window / 2).num_seconds();

    for &s in &suspects {
        let center = times[s];

        let local: Vec<usize> = (0..n)
            .filter(|&j| {
                j != s && (times[j] - center).num_seconds().abs() < wide_seconds
            })
            .collect();
        if local.len() < 2 {
            continue;
        }

        let local_track = track.subset(&local);
        let local_times = local_track.times();
        let local_velocity = compute_velocity(&local_track, DifferenceMethod::ForwardBackward);
        let local_u: Vec<f64> = local_velocity.iter().map(|s| s.u).collect();
        let local_v: Vec<f64> = local_velocity.iter().map(|s| s.v).collect();

        let zu_local = component_zscores(&local_times, &local_u, window, n_min);
        let zv_local = component_zscores(&local_times, &local_v, window, n_min);

        for (k, &j) in local.iter().enumerate() {
            if (times[j] - center).num_seconds().abs() < narrow_seconds {
                zu[j] = zu_local[k];
                zv[j] = zv_local[k];
            }
        }
    }

    // Undefined scores (NaN) can never exceed a finite threshold, so sparse
    // stretches survive this criterion and rely on the speed ceiling below.
    let mut flagged: Vec<bool> = (0..n)
        .map(|i| velocity[i].is_defined() && (zu[i].abs() > sigma || zv[i].abs() > sigma))
        .collect();

    // Secondary check: with the flagged fixes removed, any remaining speed
    // above the physical ceiling marks under-flagged fixes.
    let kept: Vec<usize> = (0..n).filter(|&i| !flagged[i]).collect();
    let kept_velocity = compute_velocity(&track.subset(&kept), DifferenceMethod::ForwardBackward);
    for (k, &i) in kept.iter().enumerate() {
        if kept_velocity[k].speed > max_speed {
            flagged[i] = true;
        }
    }

    let keep: Vec<bool> = flagged.iter().map(|&f| !f).collect();
    track.filter_by_mask(&keep)
}
