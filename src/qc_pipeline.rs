/// Standard QC sequence for one buoy track
///
/// Stage order matters: timestamp and position hygiene come before
/// segmentation so that gap detection is not confused by duplicate times,
/// and segmentation comes before the speed screen so that rolling
/// statistics never straddle an artificial gap as if it were continuous
/// drift. "Not enough data" is a normal outcome, reported as None rather
/// than an error.

use chrono::Duration;

use crate::gap_check::segment_and_filter;
use crate::position_check::validate_positions;
use crate::speed_anomaly::detect_speed_anomalies;
use crate::time_check::validate_times;
use crate::track::Track;

#[derive(Debug, Clone)]
pub struct QcConfig {
    /// Minimum surviving row count at every checkpoint.
    pub min_size: usize,
    /// Time gap that ends a segment.
    pub gap_threshold: Duration,
    /// Segments at or below this size are dropped.
    pub segment_length: usize,
    pub lon_range: (f64, f64),
    pub lat_range: (f64, f64),
    /// Physical drift speed ceiling, m/s.
    pub max_speed: f64,
    pub speed_window: Duration,
    /// Final z-score rejection threshold.
    pub speed_sigma: f64,
    /// Timestamp rounding applied before duplicate/ordering checks.
    pub time_precision: Duration,
}

impl Default for QcConfig {
    fn default() -> Self {
        QcConfig {
            min_size: 100,
            gap_threshold: Duration::hours(6),
            segment_length: 24,
            lon_range: (-180.0, 180.0),
            lat_range: (65.0, 90.0),
            max_speed: 1.5,
            speed_window: Duration::days(3),
            speed_sigma: 4.0,
            time_precision: Duration::minutes(1),
        }
    }
}

/// Restricts the track to the span between the first and the last fix
/// inside the bounding box (strict inequalities). The buoy may leave and
/// re-enter within that span; only fixes before the first qualifying
/// timestamp and after the last are trimmed. None if the track never
/// enters the box.
pub fn bbox_select(track: &Track, lon_range: (f64, f64), lat_range: (f64, f64)) -> Option<Track> {
    let in_box: Vec<usize> = track
        .obs
        .iter()
        .enumerate()
        .filter(|(_, o)| {
            o.longitude > lon_range.0
                && o.longitude < lon_range.1
                && o.latitude > lat_range.0
                && o.latitude < lat_range.1
        })
        .map(|(i, _)| i)
        .collect();

    let (&first, &last) = (in_box.first()?, in_box.last()?);
    let start = track.obs[first].datetime;
    let end = track.obs[last].datetime;

    let keep: Vec<bool> = track
        .obs
        .iter()
        .map(|o| o.datetime >= start && o.datetime <= end)
        .collect();

    Some(track.filter_by_mask(&keep))
}

/// Runs the full QC sequence and returns the cleaned track, or None when
/// the surviving data is too small to be useful at any checkpoint.
pub fn standard_qc(track: &Track, config: &QcConfig) -> Option<Track> {
    let enough = |t: &Track| t.len() >= config.min_size;

    let track = validate_times(track, config.time_precision);
    if !enough(&track) {
        return None;
    }

    let track = validate_positions(&track, true);
    if !enough(&track) {
        return None;
    }

    let track = bbox_select(&track, config.lon_range, config.lat_range)?;
    if !enough(&track) {
        return None;
    }

    let track = segment_and_filter(&track, config.gap_threshold, config.segment_length);
    if !enough(&track) {
        return None;
    }

    let track = detect_speed_anomalies(
        &track,
        config.speed_window,
        config.speed_sigma,
        config.max_speed,
    );
    if !enough(&track) {
        return None;
    }

    Some(track)
}
