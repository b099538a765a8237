// src/models/lens.rs
// DOCUMENTATION: Lens catalog
// PURPOSE: Closed set of semantic lenses and their backing datasets

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named semantic data dimension with its own similarity dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lens {
    Water,
    Vegetation,
    Topography,
    Roads,
}

impl Lens {
    pub const ALL: [Lens; 4] = [Lens::Water, Lens::Vegetation, Lens::Topography, Lens::Roads];

    /// Parse a lens name (case-insensitive, surrounding whitespace ignored)
    pub fn parse(name: &str) -> Option<Lens> {
        match name.trim().to_lowercase().as_str() {
            "water" => Some(Lens::Water),
            "vegetation" => Some(Lens::Vegetation),
            "topography" => Some(Lens::Topography),
            "roads" => Some(Lens::Roads),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lens::Water => "water",
            Lens::Vegetation => "vegetation",
            Lens::Topography => "topography",
            Lens::Roads => "roads",
        }
    }

    /// Dataset file backing this lens, if any
    /// DOCUMENTATION: Roads is searchable through the backend but has no
    /// local similarity grid
    pub fn dataset_file(&self) -> Option<&'static str> {
        match self {
            Lens::Water => Some("water.bin"),
            Lens::Vegetation => Some("vegetation.bin"),
            Lens::Topography => Some("topography.bin"),
            Lens::Roads => None,
        }
    }
}

impl fmt::Display for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a list of lens names, dropping unknown ones and duplicates
/// DOCUMENTATION: Keeps the first occurrence of each lens so caller order
/// decides merge order
pub fn parse_lenses(names: &[String]) -> Vec<Lens> {
    let mut lenses = Vec::with_capacity(names.len());
    for name in names {
        match Lens::parse(name) {
            Some(lens) if !lenses.contains(&lens) => lenses.push(lens),
            Some(_) => log::debug!("Duplicate lens in request: {}", name),
            None => log::warn!("Dropping unknown lens: {:?}", name),
        }
    }
    lenses
}

/// Catalog entry returned by GET /api/lenses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LensInfo {
    pub lens: Lens,
    pub dataset: Option<&'static str>,
    pub available: bool,
    pub sample_count: usize,
    pub colormap: &'static str,
}
