// src/services/sample_store.rs
// DOCUMENTATION: Columnar sample source
// PURPOSE: Load one immutable columnar file per lens at startup and serve
// read-only sample slices to the grid pipeline

use crate::errors::GridError;
use crate::models::{Lens, Sample};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only access to per-lens samples
/// DOCUMENTATION: Implementations must be safe to read concurrently.
/// A lens without data returns `SourceUnavailable`; callers decide whether
/// that is fatal
pub trait SampleSource: Send + Sync {
    fn samples(&self, lens: Lens) -> Result<Arc<[Sample]>, GridError>;
}

/// On-disk lens file layout
/// DOCUMENTATION: Three equal-length columns, bincode encoded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LensColumns {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub similarity: Vec<f64>,
}

impl LensColumns {
    /// Check that columns line up and hold only finite numbers
    pub fn check(&self) -> anyhow::Result<()> {
        if self.lat.len() != self.lon.len() || self.lat.len() != self.similarity.len() {
            bail!(
                "column lengths differ: lat={}, lon={}, similarity={}",
                self.lat.len(),
                self.lon.len(),
                self.similarity.len()
            );
        }

        for (name, column) in [
            ("lat", &self.lat),
            ("lon", &self.lon),
            ("similarity", &self.similarity),
        ] {
            if let Some(i) = column.iter().position(|v| !v.is_finite()) {
                bail!("{}[{}] is not a finite number ({})", name, i, column[i]);
            }
        }

        Ok(())
    }

    /// Pivot checked columns into samples
    pub fn into_samples(self) -> anyhow::Result<Vec<Sample>> {
        self.check()?;

        Ok(self
            .lat
            .into_iter()
            .zip(self.lon)
            .zip(self.similarity)
            .map(|((lat, lon), similarity)| Sample::new(lat, lon, similarity))
            .collect())
    }

    /// Decode a lens file
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        bincode::deserialize(&bytes).with_context(|| format!("corrupt lens file {}", path.display()))
    }

    /// Encode a lens file
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let bytes = bincode::serialize(self).context("cannot encode lens columns")?;
        std::fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))
    }
}

/// Per-lens load result
#[derive(Debug, Clone)]
enum LensData {
    Loaded(Arc<[Sample]>),
    Unavailable(String),
}

/// Availability summary for one lens
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub lens: Lens,
    pub dataset: Option<&'static str>,
    pub available: bool,
    pub sample_count: usize,
    pub reason: Option<String>,
}

/// In-memory store holding every lens dataset
/// DOCUMENTATION: Immutable after construction, so it is shared across
/// workers behind an Arc without locking
#[derive(Debug, Clone)]
pub struct SampleStore {
    data_dir: PathBuf,
    lenses: HashMap<Lens, LensData>,
}

impl SampleStore {
    /// Load every mapped lens from `data_dir`
    /// DOCUMENTATION: Missing or corrupt files are logged and recorded as
    /// unavailable; they never abort startup
    pub fn load(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        let mut lenses = HashMap::new();

        for lens in Lens::ALL {
            let Some(file) = lens.dataset_file() else {
                log::info!("Lens {} has no dataset mapping", lens);
                continue;
            };

            let path = data_dir.join(file);
            let data = match LensColumns::read(&path).and_then(LensColumns::into_samples) {
                Ok(samples) => {
                    log::info!("Loaded lens {}: {} samples from {}", lens, samples.len(), path.display());
                    LensData::Loaded(samples.into())
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    log::warn!("Lens {} unavailable: {}", lens, reason);
                    LensData::Unavailable(reason)
                }
            };
            lenses.insert(lens, data);
        }

        Self { data_dir, lenses }
    }

    /// Build a store from in-memory samples
    pub fn from_samples(samples: impl IntoIterator<Item = (Lens, Vec<Sample>)>) -> Self {
        Self {
            data_dir: PathBuf::new(),
            lenses: samples
                .into_iter()
                .map(|(lens, s)| (lens, LensData::Loaded(s.into())))
                .collect(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Availability of every catalog lens
    pub fn stats(&self) -> Vec<DatasetStats> {
        Lens::ALL
            .iter()
            .map(|lens| {
                let (available, sample_count, reason) = match self.lenses.get(lens) {
                    Some(LensData::Loaded(samples)) => (true, samples.len(), None),
                    Some(LensData::Unavailable(reason)) => (false, 0, Some(reason.clone())),
                    None => (false, 0, Some("no dataset mapped".to_string())),
                };
                DatasetStats {
                    lens: *lens,
                    dataset: lens.dataset_file(),
                    available,
                    sample_count,
                    reason,
                }
            })
            .collect()
    }
}

impl SampleSource for SampleStore {
    fn samples(&self, lens: Lens) -> Result<Arc<[Sample]>, GridError> {
        match self.lenses.get(&lens) {
            Some(LensData::Loaded(samples)) => Ok(samples.clone()),
            Some(LensData::Unavailable(reason)) => {
                Err(GridError::SourceUnavailable(format!("{}: {}", lens, reason)))
            }
            None => Err(GridError::SourceUnavailable(format!("{}: no dataset loaded", lens))),
        }
    }
}
