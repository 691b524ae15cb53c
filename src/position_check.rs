/// Duplicate and nonphysical position screening
///
/// Coordinates are rounded to 10 decimal places before comparison so that
/// floating-point noise does not make identical fixes look distinct. The
/// longitude validity bound depends on the track's own convention: any
/// negative longitude means [-180, 180], otherwise [0, 360].

use std::collections::HashSet;

use crate::track::Track;

fn round10(x: f64) -> f64 {
    (x * 1e10).round() / 1e10
}

fn key(x: f64) -> u64 {
    // rounded values, so bit equality is exact equality
    round10(x).to_bits()
}

/// Drops invalid and duplicated fixes, keeping the first occurrence.
///
/// With `pairs_only` set, only exact (longitude, latitude) pair repeats are
/// dropped; otherwise a fix repeating either coordinate alone against any
/// earlier fix is dropped too. A stationary buoy legitimately repeats a
/// single axis often, which is why the pipeline runs this with `pairs_only`.
pub fn validate_positions(track: &Track, pairs_only: bool) -> Track {
    let signed = track.uses_signed_longitude();

    let mut seen_lats: HashSet<u64> = HashSet::new();
    let mut seen_lons: HashSet<u64> = HashSet::new();
    let mut seen_pairs: HashSet<(u64, u64)> = HashSet::new();

    let mut keep = Vec::with_capacity(track.len());

    for o in &track.obs {
        let lat = round10(o.latitude);
        let lon = round10(o.longitude);

        let invalid_lat = lat.abs() > 90.0;
        let invalid_lon = if signed { lon.abs() > 180.0 } else { lon > 360.0 };

        let lat_key = key(o.latitude);
        let lon_key = key(o.longitude);

        // Membership accumulates over every row, kept or not, so a later
        // repeat of a dropped row's coordinates is still a repeat.
        let repeated = !seen_lats.insert(lat_key) | !seen_lons.insert(lon_key);
        let duplicated = !seen_pairs.insert((lon_key, lat_key));

        let drop = if pairs_only {
            invalid_lat || invalid_lon || duplicated
        } else {
            invalid_lat || invalid_lon || duplicated || repeated
        };

        keep.push(!drop);
    }

    track.filter_by_mask(&keep)
}
