// src/bin/pack_lens.rs
// Packs a JSON similarity export into the columnar lens file the server loads
//
// Usage: pack_lens <input.json> <lens>
// Input: {"lat": [..], "lon": [..], "similarity": [..]}
use anyhow::Context;
use dotenv::dotenv;
use lens_grid::models::Lens;
use lens_grid::services::LensColumns;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

// --- ANSI terminal colors ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

// --- Data structures ---

#[derive(Debug)]
struct PackSummary {
    lens: String,
    output: PathBuf,
    samples: usize,
    lat_range: (f64, f64),
    lon_range: (f64, f64),
    similarity_range: (f64, f64),
    bytes: u64,
    duration_secs: f64,
}

fn range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
}

fn pack(input: &Path, lens: &str, data_dir: &Path) -> anyhow::Result<PackSummary> {
    let start = Instant::now();

    let lens = Lens::parse(lens).with_context(|| format!("unknown lens '{}'", lens))?;
    let file = lens
        .dataset_file()
        .with_context(|| format!("lens '{}' has no dataset file", lens))?;

    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let columns: LensColumns = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a lens export", input.display()))?;
    columns.check()?;

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("cannot create {}", data_dir.display()))?;
    let output = data_dir.join(file);
    columns.write(&output)?;
    let bytes = std::fs::metadata(&output)
        .with_context(|| format!("cannot stat {}", output.display()))?
        .len();

    Ok(PackSummary {
        lens: lens.to_string(),
        output,
        samples: columns.lat.len(),
        lat_range: range(&columns.lat),
        lon_range: range(&columns.lon),
        similarity_range: range(&columns.similarity),
        bytes,
        duration_secs: start.elapsed().as_secs_f64(),
    })
}

fn print_summary(summary: &PackSummary) {
    println!("\n{}📋 Lens packed{}", BOLD, RESET);
    println!("──────────────────────────────────────────────────────────────");
    println!("  • Lens:       {}{}{}", CYAN, summary.lens, RESET);
    println!("  • Output:     {}", summary.output.display());
    println!("  • Samples:    {}{}{}", GREEN, summary.samples, RESET);
    if summary.samples > 0 {
        println!(
            "  • Latitude:   {:.5} .. {:.5}",
            summary.lat_range.0, summary.lat_range.1
        );
        println!(
            "  • Longitude:  {:.5} .. {:.5}",
            summary.lon_range.0, summary.lon_range.1
        );
        println!(
            "  • Similarity: {:.4} .. {:.4}",
            summary.similarity_range.0, summary.similarity_range.1
        );
    } else {
        println!("  {}⚠️  Empty export: the lens will render no cells{}", YELLOW, RESET);
    }
    println!("  • Size:       {} bytes", summary.bytes);
    println!("  • Duration:   {:.2}s", summary.duration_secs);
    println!("──────────────────────────────────────────────────────────────");
}

fn main() {
    dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let [input, lens] = args.as_slice() else {
        eprintln!("{}Usage: pack_lens <input.json> <lens>{}", YELLOW, RESET);
        process::exit(2);
    };

    let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    println!("{}📦 Packing {} → {}{}", CYAN, input, lens, RESET);

    match pack(Path::new(input), lens, &data_dir) {
        Ok(summary) => {
            print_summary(&summary);
            println!("\n{}✅ Done{}", GREEN, RESET);
        }
        Err(e) => {
            eprintln!("{}❌ {:#}{}", RED, e, RESET);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_grid::services::{SampleSource, SampleStore};
    use tempfile::TempDir;

    fn write_export(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("export.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_packed_file_loads_in_store() {
        let dir = TempDir::new().unwrap();
        let input = write_export(
            dir.path(),
            r#"{"lat": [46.5, 47.1], "lon": [8.5, 7.2], "similarity": [0.3, 0.9]}"#,
        );
        let data_dir = dir.path().join("data");

        let summary = pack(&input, "Water", &data_dir).unwrap();

        assert_eq!(summary.samples, 2);
        assert_eq!(summary.output, data_dir.join("water.bin"));
        assert_eq!(summary.similarity_range, (0.3, 0.9));

        let store = SampleStore::load(&data_dir);
        let samples = store.samples(Lens::Water).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].lon, 7.2);
        assert_eq!(samples[1].similarity, 0.9);
    }

    #[test]
    fn test_pack_refuses_unmapped_lens() {
        let dir = TempDir::new().unwrap();
        let input = write_export(dir.path(), r#"{"lat": [], "lon": [], "similarity": []}"#);

        assert!(pack(&input, "roads", dir.path()).is_err());
        assert!(pack(&input, "lava", dir.path()).is_err());
        assert!(!dir.path().join("roads.bin").exists());
    }

    #[test]
    fn test_pack_rejects_ragged_columns() {
        let dir = TempDir::new().unwrap();
        let input = write_export(
            dir.path(),
            r#"{"lat": [46.0, 46.1], "lon": [8.0], "similarity": [0.1, 0.2]}"#,
        );

        assert!(pack(&input, "water", dir.path()).is_err());
        assert!(!dir.path().join("water.bin").exists());
    }
}
