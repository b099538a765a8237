// src/models/grid.rs
// DOCUMENTATION: Core data structures for samples and grid cells
// PURPOSE: Defines the pipeline types and the grid request/response DTOs

use crate::errors::GridError;
use serde::{Deserialize, Serialize};

/// Default viewport used when a grid request omits its bounds
pub const DEFAULT_MIN_LAT: f64 = 45.8;
pub const DEFAULT_MAX_LAT: f64 = 47.8;
pub const DEFAULT_MIN_LON: f64 = 5.9;
pub const DEFAULT_MAX_LON: f64 = 10.5;

/// One measurement from one lens dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub lat: f64,
    pub lon: f64,
    pub similarity: f64,
}

impl Sample {
    pub fn new(lat: f64, lon: f64, similarity: f64) -> Self {
        Self {
            lat,
            lon,
            similarity,
        }
    }
}

/// Geographic rectangle in degrees
/// DOCUMENTATION: Shared by grid requests, search requests and tile bounds.
/// Construct through `BoundingBox::new` to enforce north > south, east > west
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Build a validated bounding box
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, GridError> {
        let bbox = Self {
            north,
            south,
            east,
            west,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check the box invariants
    /// DOCUMENTATION: Deserialized boxes bypass `new`, so callers validate
    /// before handing them to the pipeline. No anti-meridian wraparound
    pub fn validate(&self) -> Result<(), GridError> {
        let all_finite = [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(GridError::InvalidBounds(format!(
                "bounds must be finite numbers, got {:?}",
                self
            )));
        }
        if self.north <= self.south {
            return Err(GridError::InvalidBounds(format!(
                "north ({}) must be greater than south ({})",
                self.north, self.south
            )));
        }
        if self.east <= self.west {
            return Err(GridError::InvalidBounds(format!(
                "east ({}) must be greater than west ({})",
                self.east, self.west
            )));
        }
        Ok(())
    }

    /// Inclusive containment test
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// Whether two boxes overlap (touching edges do not count)
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.west < other.east
            && other.west < self.east
            && self.south < other.north
            && other.south < self.north
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            north: DEFAULT_MAX_LAT,
            south: DEFAULT_MIN_LAT,
            east: DEFAULT_MAX_LON,
            west: DEFAULT_MIN_LON,
        }
    }
}

/// Quantized grid-cell identity: (floor(lat / bin), floor(lon / bin))
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinKey {
    pub lat_index: i64,
    pub lon_index: i64,
}

impl BinKey {
    pub fn for_point(lat: f64, lon: f64, bin_size_deg: f64) -> Self {
        Self {
            lat_index: (lat / bin_size_deg).floor() as i64,
            lon_index: (lon / bin_size_deg).floor() as i64,
        }
    }
}

/// Aggregated cell: running-average centroid and similarity of one BinKey
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCell {
    pub lat: f64,
    pub lon: f64,
    pub similarity: f64,
}

/// Externally visible cell with similarity rescaled to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedGridCell {
    pub lat: f64,
    pub lon: f64,
    pub similarity: f64,
}

/// Coordinate pair in grid responses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Response format for grid data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridFormat {
    #[default]
    Json,
    GeoJson,
}

/// Parsed grid request
/// DOCUMENTATION: Built from the raw query pairs since `lens` may repeat
#[derive(Debug, Clone, PartialEq)]
pub struct GridQuery {
    /// Requested lens names, as sent by the client
    pub lenses: Vec<String>,
    /// Viewport to aggregate over (not yet validated)
    pub bounds: BoundingBox,
    /// Output representation
    pub format: GridFormat,
}

impl GridQuery {
    /// Build a query from URL query pairs
    /// DOCUMENTATION: Accepts repeated `lens=` and comma separated `lenses=`,
    /// plus `minLat`, `maxLat`, `minLon`, `maxLon` and `format`.
    /// Missing bounds fall back to the default viewport
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, GridError> {
        let mut lenses = Vec::new();
        let mut bounds = BoundingBox::default();
        let mut format = GridFormat::Json;

        for (key, value) in pairs {
            match key.as_str() {
                "lens" => lenses.push(value.trim().to_string()),
                "lenses" => lenses.extend(
                    value
                        .split(',')
                        .map(|s| s.trim())
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_string()),
                ),
                "minLat" => bounds.south = parse_coordinate(key, value)?,
                "maxLat" => bounds.north = parse_coordinate(key, value)?,
                "minLon" => bounds.west = parse_coordinate(key, value)?,
                "maxLon" => bounds.east = parse_coordinate(key, value)?,
                "format" => {
                    format = match value.to_lowercase().as_str() {
                        "json" => GridFormat::Json,
                        "geojson" => GridFormat::GeoJson,
                        other => {
                            return Err(GridError::InvalidInput(format!(
                                "Unknown format: {}",
                                other
                            )))
                        }
                    }
                }
                _ => log::debug!("Ignoring unknown grid query parameter: {}", key),
            }
        }

        Ok(Self {
            lenses,
            bounds,
            format,
        })
    }
}

fn parse_coordinate(key: &str, value: &str) -> Result<f64, GridError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| GridError::InvalidInput(format!("{} is not a number: {:?}", key, value)))
}

/// Grid data response
/// DOCUMENTATION: `coordinates[i]` and `similarities[i]` describe the same cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridResponse {
    pub coordinates: Vec<Coordinate>,
    pub similarities: Vec<f64>,
}

impl GridResponse {
    /// Split normalized cells into the two index-aligned arrays
    pub fn from_cells(cells: &[NormalizedGridCell]) -> Self {
        let mut response = Self {
            coordinates: Vec::with_capacity(cells.len()),
            similarities: Vec::with_capacity(cells.len()),
        };
        for cell in cells {
            response.coordinates.push(Coordinate {
                lat: cell.lat,
                lon: cell.lon,
            });
            response.similarities.push(cell.similarity);
        }
        response
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Iterate cells back out of the aligned arrays
    pub fn cells(&self) -> impl Iterator<Item = NormalizedGridCell> + '_ {
        self.coordinates
            .iter()
            .zip(self.similarities.iter())
            .map(|(c, s)| NormalizedGridCell {
                lat: c.lat,
                lon: c.lon,
                similarity: *s,
            })
    }

    /// Render as a GeoJSON FeatureCollection of points
    /// DOCUMENTATION: GeoJSON positions are [lon, lat]; similarity is a property
    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        let features = self
            .cells()
            .map(|cell| {
                let point = geo_types::Point::new(cell.lon, cell.lat);
                let mut properties = geojson::JsonObject::new();
                properties.insert("similarity".to_string(), serde_json::json!(cell.similarity));
                geojson::Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(&point))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
