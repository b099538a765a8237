// src/services/normalizer.rs
// DOCUMENTATION: Similarity normalization
// PURPOSE: Rescale aggregated similarities to [0, 1], robust to outliers

use crate::errors::GridError;
use crate::models::{GridCell, NormalizedGridCell};
use std::fmt;
use std::str::FromStr;

/// Lower clipping percentile
pub const LOWER_PERCENTILE: f64 = 1.0;
/// Upper clipping percentile
pub const UPPER_PERCENTILE: f64 = 99.0;
/// Value assigned to every cell when the value range collapses
pub const DEGENERATE_VALUE: f64 = 0.5;

/// Which rescaling to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationMethod {
    /// Clip to the 1st/99th percentile, then rescale
    #[default]
    Percentile,
    /// Plain min/max rescale
    MinMax,
}

impl FromStr for NormalizationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percentile" => Ok(NormalizationMethod::Percentile),
            "minmax" | "min-max" | "min_max" => Ok(NormalizationMethod::MinMax),
            other => Err(format!("Unknown normalization method: {}", other)),
        }
    }
}

impl fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationMethod::Percentile => f.write_str("percentile"),
            NormalizationMethod::MinMax => f.write_str("minmax"),
        }
    }
}

/// Percentile of an ascending sequence by linear interpolation
/// DOCUMENTATION: idx = p/100 * (n-1); integral idx returns that element,
/// otherwise interpolates between floor(idx) and ceil(idx).
/// `p` is clamped to [0, 100]. Returns None for an empty sequence or a NaN `p`
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || p.is_nan() {
        return None;
    }

    let idx = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;

    if lower == upper {
        return Some(sorted[lower]);
    }

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * (idx - lower as f64))
}

fn sorted_similarities(cells: &[GridCell]) -> Vec<f64> {
    let mut values: Vec<f64> = cells.iter().map(|c| c.similarity).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Clamp each similarity into [lower, upper] and rescale
/// DOCUMENTATION: Keeps input order. Collapsed ranges map to 0.5
fn rescale(cells: &[GridCell], lower: f64, upper: f64) -> Vec<NormalizedGridCell> {
    let range = upper - lower;

    cells
        .iter()
        .map(|cell| {
            let similarity = if range > 0.0 {
                (cell.similarity.clamp(lower, upper) - lower) / range
            } else {
                DEGENERATE_VALUE
            };
            NormalizedGridCell {
                lat: cell.lat,
                lon: cell.lon,
                similarity,
            }
        })
        .collect()
}

/// Percentile-clipped normalization
/// DOCUMENTATION: Values below the 1st / above the 99th percentile are
/// clipped before rescaling, so single outliers do not flatten the palette.
///
/// # Returns
/// One normalized cell per input cell, in input order
pub fn normalize(cells: &[GridCell]) -> Result<Vec<NormalizedGridCell>, GridError> {
    let sorted = sorted_similarities(cells);
    let lower = percentile(&sorted, LOWER_PERCENTILE).ok_or(GridError::EmptyInput)?;
    let upper = percentile(&sorted, UPPER_PERCENTILE).ok_or(GridError::EmptyInput)?;

    log::debug!(
        "Percentile normalization over {} cells: p1={:.4}, p99={:.4}",
        cells.len(),
        lower,
        upper
    );

    Ok(rescale(cells, lower, upper))
}

/// Min/max normalization without clipping
pub fn normalize_min_max(cells: &[GridCell]) -> Result<Vec<NormalizedGridCell>, GridError> {
    let sorted = sorted_similarities(cells);
    let (lower, upper) = match (sorted.first(), sorted.last()) {
        (Some(min), Some(max)) => (*min, *max),
        _ => return Err(GridError::EmptyInput),
    };

    Ok(rescale(cells, lower, upper))
}

/// Dispatch on the configured method
pub fn normalize_with(
    cells: &[GridCell],
    method: NormalizationMethod,
) -> Result<Vec<NormalizedGridCell>, GridError> {
    match method {
        NormalizationMethod::Percentile => normalize(cells),
        NormalizationMethod::MinMax => normalize_min_max(cells),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn cells(values: &[f64]) -> Vec<GridCell> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| GridCell {
                lat: 46.0 + i as f64 * 0.01,
                lon: 8.0,
                similarity: *v,
            })
            .collect()
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted: Vec<f64> = (0..100).map(|v| v as f64).collect();
        assert!((percentile(&sorted, 1.0).unwrap() - 0.99).abs() < EPS);
        assert!((percentile(&sorted, 99.0).unwrap() - 98.01).abs() < EPS);
        assert_eq!(percentile(&sorted, 0.0), Some(0.0));
        assert_eq!(percentile(&sorted, 100.0), Some(99.0));
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[3.0], 99.0), Some(3.0));
    }

    #[test]
    fn test_percentile_clamps_out_of_range_p() {
        let sorted = [1.0, 2.0, 3.0];
        assert_eq!(percentile(&sorted, 150.0), Some(3.0));
        assert_eq!(percentile(&sorted, -20.0), Some(1.0));
        assert_eq!(percentile(&sorted, f64::NAN), None);
    }

    #[test]
    fn test_extremes_clip_before_rescaling() {
        let values: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let out = normalize(&cells(&values)).unwrap();

        assert_eq!(out.len(), 100);
        // 0 and 1 clip up to p1 = 0.99; 98 and 99 clip down to p99 = 98.01
        assert_eq!(out[0].similarity, 0.0);
        assert_eq!(out[99].similarity, 1.0);
        assert!(out[1].similarity > 0.0);
        assert!(out[98].similarity < 1.0);
        assert!(out.iter().all(|c| (0.0..=1.0).contains(&c.similarity)));
    }

    #[test]
    fn test_output_keeps_input_order() {
        let input = cells(&[0.9, 0.1, 0.5]);
        let out = normalize_min_max(&input).unwrap();

        assert_eq!(out[0].similarity, 1.0);
        assert_eq!(out[1].similarity, 0.0);
        assert!((out[2].similarity - 0.5).abs() < EPS);
        for (a, b) in input.iter().zip(out.iter()) {
            assert_eq!((a.lat, a.lon), (b.lat, b.lon));
        }
    }

    #[test]
    fn test_min_and_max_map_to_bounds() {
        let out = normalize(&cells(&[0.3, 0.7])).unwrap();
        assert_eq!(out[0].similarity, 0.0);
        assert_eq!(out[1].similarity, 1.0);
    }

    #[test]
    fn test_identical_values_map_to_midpoint() {
        let input = cells(&[0.42; 7]);
        for method in [NormalizationMethod::Percentile, NormalizationMethod::MinMax] {
            let out = normalize_with(&input, method).unwrap();
            assert!(out.iter().all(|c| c.similarity == DEGENERATE_VALUE));
        }

        let single = normalize(&cells(&[0.8])).unwrap();
        assert_eq!(single[0].similarity, DEGENERATE_VALUE);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(normalize(&[]), Err(GridError::EmptyInput));
        assert_eq!(normalize_min_max(&[]), Err(GridError::EmptyInput));
    }

    #[test]
    fn test_parse_method() {
        assert_eq!("MinMax".parse::<NormalizationMethod>(), Ok(NormalizationMethod::MinMax));
        assert!("zscore".parse::<NormalizationMethod>().is_err());
    }
}
