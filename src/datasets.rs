use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tracing::{debug, info};

/// Rating events: one row per user rating of one movie.
pub const RATINGS_FILE: &str = "u_data.csv";
/// Title table keyed by item id.
pub const TITLES_FILE: &str = "u_item.csv";

#[derive(Debug, Clone)]
pub struct DatasetFile {
    pub name: &'static str,
    pub gz_path: PathBuf,
    pub csv_path: PathBuf,
}

impl DatasetFile {
    fn new(data_dir: &Path, name: &'static str) -> Self {
        let csv_path = data_dir.join(name);
        let gz_path = data_dir.join(format!("{name}.gz"));
        Self {
            name,
            gz_path,
            csv_path,
        }
    }
}

/// Locations of the two tables the local catalog is joined from.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    pub ratings: PathBuf,
    pub titles: PathBuf,
}

impl DatasetPaths {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            ratings: data_dir.join(RATINGS_FILE),
            titles: data_dir.join(TITLES_FILE),
        }
    }
}

/// Makes sure both dataset tables exist as plain CSV, decompressing `.gz`
/// copies when the CSV is missing or older than its archive.
pub fn prepare_datasets(data_dir: &Path) -> Result<DatasetPaths> {
    for name in [RATINGS_FILE, TITLES_FILE] {
        let file = DatasetFile::new(data_dir, name);
        ensure_decompressed(&file)?;
    }
    Ok(DatasetPaths::in_dir(data_dir))
}

fn ensure_decompressed(file: &DatasetFile) -> Result<()> {
    if !file.gz_path.exists() {
        if file.csv_path.exists() {
            debug!(path = %file.csv_path.display(), "dataset ready");
            return Ok(());
        }
        anyhow::bail!(
            "dataset {} not found at {} or {}",
            file.name,
            file.csv_path.display(),
            file.gz_path.display()
        );
    }

    if file.csv_path.exists() {
        let gz_meta = fs::metadata(&file.gz_path).ok();
        let csv_meta = fs::metadata(&file.csv_path).ok();
        if let (Some(gz), Some(csv)) = (gz_meta, csv_meta)
            && let (Ok(gz_time), Ok(csv_time)) = (gz.modified(), csv.modified())
            && gz_time <= csv_time
        {
            debug!(path = %file.csv_path.display(), "decompression up to date");
            return Ok(());
        }
    }

    info!(
        gz = %file.gz_path.display(),
        csv = %file.csv_path.display(),
        "decompressing dataset"
    );
    decompress(&file.gz_path, &file.csv_path)
}

fn decompress(gz_path: &Path, csv_path: &Path) -> Result<()> {
    let input =
        File::open(gz_path).with_context(|| format!("opening archive {}", gz_path.display()))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));

    let mut tmp_path = csv_path.to_path_buf();
    tmp_path.set_extension("tmp-decompress");
    let output = File::create(&tmp_path)
        .with_context(|| format!("creating decompressed file {}", tmp_path.display()))?;
    let mut writer = BufWriter::new(output);

    std::io::copy(&mut decoder, &mut writer)
        .with_context(|| format!("decompressing {}", gz_path.display()))?;
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp_path, csv_path)
        .with_context(|| format!("moving decompressed file into place for {}", csv_path.display()))?;
    Ok(())
}
