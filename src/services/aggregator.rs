// src/services/aggregator.rs
// DOCUMENTATION: Spatial binning of raw lens samples
// PURPOSE: Filter samples to a bounding box, bucket them into a lat/lon grid
// and merge duplicates within and across lenses

use crate::errors::GridError;
use crate::models::{BinKey, BoundingBox, GridCell, Sample};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Rule used when a sample lands in an occupied bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// `new = (prev + sample) / 2`. Order dependent, matches the
    /// historical output bit for bit
    #[default]
    Pairwise,
    /// `new = prev + (sample - prev) / count`. A true mean within a lens;
    /// across lenses every lens cell weighs the same
    CountWeighted,
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pairwise" => Ok(MergeStrategy::Pairwise),
            "weighted" | "count-weighted" | "count_weighted" => Ok(MergeStrategy::CountWeighted),
            other => Err(format!("Unknown merge strategy: {}", other)),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Pairwise => f.write_str("pairwise"),
            MergeStrategy::CountWeighted => f.write_str("weighted"),
        }
    }
}

/// Running state of one bin
#[derive(Debug, Clone, Copy)]
struct CellAccumulator {
    lat: f64,
    lon: f64,
    similarity: f64,
    count: u64,
}

impl CellAccumulator {
    fn new(lat: f64, lon: f64, similarity: f64) -> Self {
        Self {
            lat,
            lon,
            similarity,
            count: 1,
        }
    }

    fn merge(&mut self, lat: f64, lon: f64, similarity: f64, strategy: MergeStrategy) {
        self.count += 1;
        match strategy {
            MergeStrategy::Pairwise => {
                self.lat = (self.lat + lat) / 2.0;
                self.lon = (self.lon + lon) / 2.0;
                self.similarity = (self.similarity + similarity) / 2.0;
            }
            MergeStrategy::CountWeighted => {
                let n = self.count as f64;
                self.lat += (lat - self.lat) / n;
                self.lon += (lon - self.lon) / n;
                self.similarity += (similarity - self.similarity) / n;
            }
        }
    }

    fn to_cell(self) -> GridCell {
        GridCell {
            lat: self.lat,
            lon: self.lon,
            similarity: self.similarity,
        }
    }
}

/// Bin one lens's samples independently
fn bin_lens(
    samples: &[Sample],
    bbox: &BoundingBox,
    bin_size_deg: f64,
    strategy: MergeStrategy,
) -> BTreeMap<BinKey, CellAccumulator> {
    let mut bins: BTreeMap<BinKey, CellAccumulator> = BTreeMap::new();

    // Non-finite similarities never enter a cell; NaN coordinates already
    // fail the bbox test
    for sample in samples
        .iter()
        .filter(|s| bbox.contains(s.lat, s.lon) && s.similarity.is_finite())
    {
        let key = BinKey::for_point(sample.lat, sample.lon, bin_size_deg);
        bins.entry(key)
            .and_modify(|cell| cell.merge(sample.lat, sample.lon, sample.similarity, strategy))
            .or_insert_with(|| CellAccumulator::new(sample.lat, sample.lon, sample.similarity));
    }

    bins
}

/// Aggregate lens sample sets into one grid
/// DOCUMENTATION: Each lens is binned on its own, then the per-lens grids
/// are folded into the combined grid in the order given. A combined cell
/// exists for every BinKey that survived the bbox filter in at least one lens.
///
/// # Arguments
/// * `lens_sample_sets` - One sample slice per selected lens, in request order
/// * `bbox` - Inclusive filter rectangle
/// * `bin_size_deg` - Bin edge length in degrees
/// * `strategy` - How occupied bins absorb new values
///
/// # Returns
/// Cells keyed and ordered by BinKey
pub fn aggregate(
    lens_sample_sets: &[&[Sample]],
    bbox: &BoundingBox,
    bin_size_deg: f64,
    strategy: MergeStrategy,
) -> Result<BTreeMap<BinKey, GridCell>, GridError> {
    bbox.validate()?;

    if lens_sample_sets.is_empty() {
        return Err(GridError::EmptyLensSelection);
    }

    if !(bin_size_deg.is_finite() && bin_size_deg > 0.0) {
        return Err(GridError::InvalidInput(format!(
            "bin size must be a positive number of degrees, got {}",
            bin_size_deg
        )));
    }

    let mut combined: BTreeMap<BinKey, CellAccumulator> = BTreeMap::new();

    for (index, samples) in lens_sample_sets.iter().enumerate() {
        let lens_bins = bin_lens(samples, bbox, bin_size_deg, strategy);
        log::debug!(
            "Lens #{}: {} samples -> {} bins",
            index,
            samples.len(),
            lens_bins.len()
        );

        for (key, cell) in lens_bins {
            // Across lenses each lens cell counts once, whatever its sample count
            combined
                .entry(key)
                .and_modify(|prev| prev.merge(cell.lat, cell.lon, cell.similarity, strategy))
                .or_insert_with(|| CellAccumulator::new(cell.lat, cell.lon, cell.similarity));
        }
    }

    Ok(combined
        .into_iter()
        .map(|(key, cell)| (key, cell.to_cell()))
        .collect())
}
