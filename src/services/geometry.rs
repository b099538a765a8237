// src/services/geometry.rs
// DOCUMENTATION: Grid geometry and map projection helpers
// PURPOSE: Convert between meters, degrees, slippy-map tiles and pixels

use crate::models::BoundingBox;
use serde::Serialize;
use std::f64::consts::PI;

/// Meters per degree of latitude (spherical approximation)
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Size of a cell expressed in degrees at a given latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreeSpan {
    pub lat_degrees: f64,
    pub lng_degrees: f64,
}

/// Slippy-map tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

/// Grid geometry helpers
/// DOCUMENTATION: Pure functions without shared state. Malformed input
/// (NaN, poles) propagates instead of failing
pub struct GridGeometry;

impl GridGeometry {
    /// Convert a distance in meters to degrees at a latitude
    /// DOCUMENTATION: 1° latitude ≈ 111.32 km everywhere,
    /// 1° longitude ≈ 111.32 km * cos(latitude). Diverges toward the poles
    pub fn meters_to_degrees_at_latitude(meters: f64, lat: f64) -> DegreeSpan {
        let lat_radians = lat.to_radians();
        DegreeSpan {
            lat_degrees: meters / METERS_PER_DEGREE,
            lng_degrees: meters / (METERS_PER_DEGREE * lat_radians.cos()),
        }
    }

    /// Rendering cell size for a zoom level
    /// DOCUMENTATION: Independent of the aggregation bin size
    pub fn cell_size_meters_for_zoom(zoom: u32) -> f64 {
        if zoom >= 10 {
            1000.0
        } else if zoom == 9 {
            2000.0
        } else {
            3000.0
        }
    }

    /// Web Mercator tile containing a point
    pub fn degrees_to_tile_number(lat: f64, lon: f64, zoom: u32) -> (i64, i64) {
        let n = 2f64.powi(zoom as i32);
        let lat_rad = lat.to_radians();
        let x = ((lon + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();
        (x as i64, y as i64)
    }

    /// North-west corner of a tile, as (lat, lon)
    pub fn tile_number_to_degrees(x: f64, y: f64, zoom: u32) -> (f64, f64) {
        let n = 2f64.powi(zoom as i32);
        let lon = x / n * 360.0 - 180.0;
        let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
        (lat_rad.to_degrees(), lon)
    }

    /// Geographic extent of a tile
    pub fn tile_bounds(tile: TileCoord) -> BoundingBox {
        let (north, west) = Self::tile_number_to_degrees(tile.x as f64, tile.y as f64, tile.z);
        let (south, east) =
            Self::tile_number_to_degrees(tile.x as f64 + 1.0, tile.y as f64 + 1.0, tile.z);
        BoundingBox {
            north,
            south,
            east,
            west,
        }
    }

    /// Linear projection of lat/lon onto a width x height raster covering `view`
    /// DOCUMENTATION: x grows eastward, y grows southward
    pub fn project_to_pixel(
        lat: f64,
        lon: f64,
        view: &BoundingBox,
        width: f64,
        height: f64,
    ) -> geo_types::Coord<f64> {
        geo_types::coord! {
            x: (lon - view.west) / (view.east - view.west) * width,
            y: (view.north - lat) / (view.north - view.south) * height,
        }
    }

    /// Web Mercator projection of lat/lon into the pixel space of one tile
    /// DOCUMENTATION: Origin at the tile's north-west corner. Unlike
    /// `project_to_pixel` the y axis follows Mercator, so cells stay in
    /// place at low zoom where a tile spans many degrees of latitude
    pub fn project_to_tile_pixel(
        lat: f64,
        lon: f64,
        tile: TileCoord,
        tile_size: f64,
    ) -> geo_types::Coord<f64> {
        let world = 2f64.powi(tile.z as i32) * tile_size;
        let lat_rad = lat.to_radians();
        geo_types::coord! {
            x: (lon + 180.0) / 360.0 * world - tile.x as f64 * tile_size,
            y: (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * world - tile.y as f64 * tile_size,
        }
    }
}
