// src/services/grid_service.rs
// DOCUMENTATION: Grid pipeline orchestration
// PURPOSE: Resolve lenses, read samples, aggregate and normalize into the
// index-aligned grid response

use crate::config::Config;
use crate::errors::GridError;
use crate::models::{parse_lenses, GridCell, GridQuery, GridResponse, Lens, Sample};
use crate::services::aggregator::{aggregate, MergeStrategy};
use crate::services::normalizer::{normalize_with, NormalizationMethod};
use crate::services::sample_store::SampleSource;
use std::sync::Arc;
use std::time::Instant;

/// Pipeline tuning taken from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub bin_size_deg: f64,
    pub merge_strategy: MergeStrategy,
    pub normalization: NormalizationMethod,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            bin_size_deg: 0.01,
            merge_strategy: MergeStrategy::Pairwise,
            normalization: NormalizationMethod::Percentile,
        }
    }
}

impl From<&Config> for GridSettings {
    fn from(config: &Config) -> Self {
        Self {
            bin_size_deg: config.bin_size_deg,
            merge_strategy: config.merge_strategy,
            normalization: config.normalization,
        }
    }
}

pub struct GridService;

impl GridService {
    /// Resolve requested names to lenses with local data
    /// DOCUMENTATION: Unknown names and lenses without a dataset mapping are
    /// dropped. Fails only when nothing is left
    pub fn resolve_lenses(names: &[String]) -> Result<Vec<Lens>, GridError> {
        let lenses: Vec<Lens> = parse_lenses(names)
            .into_iter()
            .filter(|lens| {
                let mapped = lens.dataset_file().is_some();
                if !mapped {
                    log::warn!("Dropping lens {} from grid request: no dataset", lens);
                }
                mapped
            })
            .collect();

        if lenses.is_empty() {
            return Err(GridError::NoValidLenses(format!("{:?}", names)));
        }

        Ok(lenses)
    }

    /// Read every lens, absorbing unavailable sources as empty contributions
    fn read_lenses<S: SampleSource + ?Sized>(source: &S, lenses: &[Lens]) -> Vec<Arc<[Sample]>> {
        lenses
            .iter()
            .map(|lens| match source.samples(*lens) {
                Ok(samples) => samples,
                Err(e) => {
                    log::warn!("Treating lens {} as empty: {}", lens, e);
                    Arc::from(Vec::new())
                }
            })
            .collect()
    }

    /// Run the full grid pipeline for one request
    /// DOCUMENTATION: Validation errors surface to the caller; per-lens read
    /// failures do not. An empty aggregate returns empty arrays
    pub fn build_grid<S: SampleSource + ?Sized>(
        source: &S,
        query: &GridQuery,
        settings: &GridSettings,
    ) -> Result<GridResponse, GridError> {
        let started = Instant::now();

        query.bounds.validate()?;
        let lenses = Self::resolve_lenses(&query.lenses)?;

        let sample_sets = Self::read_lenses(source, &lenses);
        let slices: Vec<&[Sample]> = sample_sets.iter().map(|s| &s[..]).collect();

        let cells: Vec<GridCell> = aggregate(
            &slices,
            &query.bounds,
            settings.bin_size_deg,
            settings.merge_strategy,
        )?
        .into_values()
        .collect();

        if cells.is_empty() {
            log::debug!("No samples inside {:?} for {:?}", query.bounds, lenses);
            return Ok(GridResponse::default());
        }

        let normalized = normalize_with(&cells, settings.normalization)?;
        let response = GridResponse::from_cells(&normalized);

        log::debug!(
            "Built grid for {:?}: {} cells in {:?}",
            lenses,
            response.len(),
            started.elapsed()
        );

        Ok(response)
    }
}
