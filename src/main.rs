use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

mod gap_check;
mod interpolation;
mod position_check;
mod qc_pipeline;
mod rolling;
mod speed_anomaly;
mod time_check;
mod track;
mod velocity;

use interpolation::{infer_frequency_minutes, interpolate_track};
use qc_pipeline::{standard_qc, QcConfig};
use track::Track;

#[derive(Debug, Serialize)]
struct BuoySummary {
    buoy: String,
    raw_rows: usize,
    qc_rows: usize,
    interp_rows: usize,
    status: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let input_folder = args.get(1).map(String::as_str).unwrap_or("data/raw_tracks");
    let output_folder = args.get(2).map(String::as_str).unwrap_or("data/processed");

    println!("\n🧊 ICE DRIFT BUOY TRACK QC");
    println!("==========================");
    println!("Input folder:  {}", input_folder);
    println!("Output folder: {}", output_folder);

    let qc_folder = Path::new(output_folder).join("qc_tracks");
    let interp_folder = Path::new(output_folder).join("interp_tracks");
    fs::create_dir_all(&qc_folder)?;
    fs::create_dir_all(&interp_folder)?;

    let track_files = find_track_files(input_folder);
    if track_files.is_empty() {
        println!("⚠️  No CSV track files found in {}", input_folder);
        return Ok(());
    }

    println!("Found {} track files", track_files.len());
    println!("⚡ Using parallel processing on {} cores", num_cpus::get());

    let config = QcConfig::default();

    // Tracks are independent, so the pipeline parallelizes across buoys
    // with one track per worker.
    let mut summaries: Vec<BuoySummary> = track_files
        .par_iter()
        .filter_map(|path| match process_track_file(path, &qc_folder, &interp_folder, &config) {
            Ok(summary) => Some(summary),
            Err(e) => {
                eprintln!("❌ Error processing {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    summaries.sort_by(|a, b| a.buoy.cmp(&b.buoy));

    let summary_path = Path::new(output_folder).join("processing_summary.csv");
    write_summary_csv(&summaries, &summary_path)?;

    print_summary(&summaries);
    println!("📁 Summary saved to: {}", summary_path.display());

    Ok(())
}

fn find_track_files(input_folder: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(input_folder)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

fn process_track_file(
    path: &Path,
    qc_folder: &Path,
    interp_folder: &Path,
    config: &QcConfig,
) -> Result<BuoySummary, Box<dyn std::error::Error>> {
    let buoy = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("unknown")
        .to_string();

    let raw = Track::from_csv(path)?;
    println!("🔄 Processing {}: {} raw fixes", buoy, raw.len());

    let cleaned = match standard_qc(&raw, config) {
        Some(track) => track,
        None => {
            println!("⚠️  {}: insufficient data after QC, skipping", buoy);
            return Ok(BuoySummary {
                buoy,
                raw_rows: raw.len(),
                qc_rows: 0,
                interp_rows: 0,
                status: "rejected".to_string(),
            });
        }
    };

    cleaned.to_csv(&qc_folder.join(format!("{}.csv", buoy)))?;

    let freq = infer_frequency_minutes(&cleaned).unwrap_or(60);
    let maxgap = (4 * freq).max(120);
    let interpolated = interpolate_track(&cleaned, freq, maxgap);
    interpolated.to_csv(&interp_folder.join(format!("{}.csv", buoy)))?;

    println!(
        "  ✅ {}: {} → {} fixes after QC, {} on the {}min grid",
        buoy,
        raw.len(),
        cleaned.len(),
        interpolated.len(),
        freq
    );

    Ok(BuoySummary {
        buoy,
        raw_rows: raw.len(),
        qc_rows: cleaned.len(),
        interp_rows: interpolated.len(),
        status: "ok".to_string(),
    })
}

fn write_summary_csv(
    summaries: &[BuoySummary],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = Writer::from_path(path)?;
    for summary in summaries {
        wtr.serialize(summary)?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_summary(summaries: &[BuoySummary]) {
    let accepted = summaries.iter().filter(|s| s.status == "ok").count();
    let rejected = summaries.len() - accepted;
    let raw_total: usize = summaries.iter().map(|s| s.raw_rows).sum();
    let qc_total: usize = summaries.iter().map(|s| s.qc_rows).sum();

    println!("\n📊 QC SUMMARY");
    println!("=============");
    println!("Tracks processed: {}", summaries.len());
    println!("Tracks accepted:  {}", accepted);
    println!("Tracks rejected:  {} (insufficient data)", rejected);
    if raw_total > 0 {
        println!(
            "Fixes kept: {} of {} ({:.1}%)",
            qc_total,
            raw_total,
            qc_total as f64 / raw_total as f64 * 100.0
        );
    }
}
