/// Buoy track data model and CSV I/O
///
/// A track is the full ordered sequence of GPS fixes reported by one buoy.
/// QC stages never mutate a track in place; each returns a new reduced copy.

use std::path::Path;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub datetime: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Track {
    pub obs: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    datetime: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct OutputRecord<'a> {
    datetime: &'a str,
    latitude: f64,
    longitude: f64,
}

const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Buoy loggers are not consistent about timestamp formatting, so accept the
/// common variants seen in the Arctic drift archives.
fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    for format in formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw.trim(), format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    // RFC 3339 with an explicit offset (e.g. trailing Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(format!("Unrecognized datetime value: '{}'", raw).into())
}

impl Track {
    pub fn new(obs: Vec<Observation>) -> Self {
        Track { obs }
    }

    pub fn len(&self) -> usize {
        self.obs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obs.is_empty()
    }

    pub fn times(&self) -> Vec<DateTime<Utc>> {
        self.obs.iter().map(|o| o.datetime).collect()
    }

    /// Longitude convention for this track, inferred once per run: any
    /// negative longitude means the track uses [-180, 180], otherwise [0, 360].
    pub fn uses_signed_longitude(&self) -> bool {
        self.obs.iter().any(|o| o.longitude < 0.0)
    }

    /// New track containing the rows where `keep` is true.
    pub fn filter_by_mask(&self, keep: &[bool]) -> Track {
        debug_assert_eq!(keep.len(), self.obs.len());
        let obs = self
            .obs
            .iter()
            .zip(keep.iter())
            .filter(|(_, &k)| k)
            .map(|(o, _)| *o)
            .collect();
        Track { obs }
    }

    /// New track containing the rows at the given indices, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Track {
        let obs = indices.iter().map(|&i| self.obs[i]).collect();
        Track { obs }
    }

    pub fn from_csv(path: &Path) -> Result<Track, Box<dyn std::error::Error>> {
        let mut rdr = Reader::from_path(path)?;
        let mut obs = Vec::new();

        for result in rdr.deserialize::<RawRecord>() {
            let record = result?;
            obs.push(Observation {
                datetime: parse_datetime(&record.datetime)?,
                latitude: record.latitude,
                longitude: record.longitude,
            });
        }

        Ok(Track { obs })
    }

    pub fn to_csv(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let mut wtr = Writer::from_path(path)?;

        for o in &self.obs {
            let datetime = o.datetime.format(DATETIME_OUTPUT_FORMAT).to_string();
            wtr.serialize(OutputRecord {
                datetime: &datetime,
                latitude: o.latitude,
                longitude: o.longitude,
            })?;
        }

        wtr.flush()?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_datetime_parsing_variants() {
        let expected = Utc.with_ymd_and_hms(2020, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_datetime("2020-03-01 12:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2020-03-01T12:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2020-03-01T12:30:00Z").unwrap(), expected);
        assert_eq!(parse_datetime("2020-03-01 12:30").unwrap(), expected);
        assert!(parse_datetime("not a date").is_err());
    }

    #[test]
    fn test_longitude_convention_inference() {
        let signed = test_support::synthetic_track(
            &[(75.0, -150.0), (75.1, 10.0)],
            Duration::hours(1),
        );
        assert!(signed.uses_signed_longitude());

        let unsigned = test_support::synthetic_track(
            &[(75.0, 210.0), (75.1, 10.0)],
            Duration::hours(1),
        );
        assert!(!unsigned.uses_signed_longitude());
    }

    #[test]
    fn test_filter_by_mask_keeps_order() {
        let track = test_support::synthetic_track(
            &[(75.0, 10.0), (75.1, 10.1), (75.2, 10.2)],
            Duration::hours(1),
        );
        let filtered = track.filter_by_mask(&[true, false, true]);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.obs[0].latitude, 75.0);
        assert_eq!(filtered.obs[1].latitude, 75.2);
    }
}
