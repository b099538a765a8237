// src/services/tile_renderer.rs
// DOCUMENTATION: Server-side tile layout of the similarity grid
// PURPOSE: Turn normalized grid cells into colored pixel rectangles for one
// slippy-map tile

use crate::errors::GridError;
use crate::models::{BoundingBox, GridResponse, Lens};
use crate::services::colormap::Colormap;
use crate::services::geometry::{GridGeometry, TileCoord};
use serde::{Deserialize, Serialize};

/// Edge length of a map tile in pixels
pub const TILE_SIZE: u32 = 256;
/// Highest zoom level accepted for tile layouts
pub const MAX_ZOOM: u32 = 22;

// Cells are drawn slightly taller and narrower than their nominal size so
// they tile visually at Swiss latitudes
const HEIGHT_SCALE: f64 = 1.15;
const WIDTH_SCALE: f64 = 0.8;

/// One filled rectangle in tile pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileCellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub similarity: f64,
}

/// Layout of every grid cell touching one tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayout {
    pub z: u32,
    pub x: u32,
    pub y: u32,
    pub tile_size: u32,
    pub colormap: String,
    pub cells: Vec<TileCellRect>,
}

impl TileLayout {
    pub fn empty(tile: TileCoord, colormap: &str) -> Self {
        Self {
            z: tile.z,
            x: tile.x,
            y: tile.y,
            tile_size: TILE_SIZE,
            colormap: colormap.to_string(),
            cells: Vec::new(),
        }
    }
}

pub struct TileRenderer;

impl TileRenderer {
    /// Check that a tile address exists at its zoom level
    pub fn validate_tile(tile: TileCoord) -> Result<(), GridError> {
        if tile.z > MAX_ZOOM {
            return Err(GridError::InvalidInput(format!(
                "zoom {} exceeds maximum {}",
                tile.z, MAX_ZOOM
            )));
        }
        let n = 1u64 << tile.z;
        if tile.x as u64 >= n || tile.y as u64 >= n {
            return Err(GridError::InvalidInput(format!(
                "tile {}/{}/{} is outside the zoom {} grid",
                tile.z, tile.x, tile.y, tile.z
            )));
        }
        Ok(())
    }

    /// Geographic extent of one rendered cell anchored at its centroid
    /// DOCUMENTATION: Cell size follows the zoom level, not the aggregation bin
    fn cell_bounds(lat: f64, lon: f64, zoom: u32) -> BoundingBox {
        let meters = GridGeometry::cell_size_meters_for_zoom(zoom);
        let span = GridGeometry::meters_to_degrees_at_latitude(meters, lat);
        BoundingBox {
            north: lat + span.lat_degrees * HEIGHT_SCALE,
            south: lat,
            east: lon + span.lng_degrees * WIDTH_SCALE,
            west: lon,
        }
    }

    /// Lay out the grid cells that intersect `tile`
    ///
    /// # Arguments
    /// * `grid` - Normalized viewport grid
    /// * `lenses` - Selection the grid was built for (drives the palette)
    /// * `tile` - Tile address to render
    pub fn layout(grid: &GridResponse, lenses: &[Lens], tile: TileCoord) -> TileLayout {
        let colormap = Colormap::for_selection(lenses);
        let tile_bounds = GridGeometry::tile_bounds(tile);
        let size = TILE_SIZE as f64;

        let mut layout = TileLayout::empty(tile, colormap.name());

        for cell in grid.cells() {
            let bounds = Self::cell_bounds(cell.lat, cell.lon, tile.z);
            if !tile_bounds.intersects(&bounds) {
                continue;
            }

            let top_left = GridGeometry::project_to_tile_pixel(bounds.north, bounds.west, tile, size);
            let bottom_right =
                GridGeometry::project_to_tile_pixel(bounds.south, bounds.east, tile, size);

            layout.cells.push(TileCellRect {
                x: top_left.x,
                y: top_left.y,
                width: bottom_right.x - top_left.x,
                height: bottom_right.y - top_left.y,
                fill: colormap.fill(cell.similarity),
                similarity: cell.similarity,
            });
        }

        log::debug!(
            "Tile {}/{}/{}: {} of {} cells",
            tile.z,
            tile.x,
            tile.y,
            layout.cells.len(),
            grid.len()
        );

        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedGridCell;

    const ZURICH_TILE: TileCoord = TileCoord { z: 10, x: 536, y: 358 };

    fn grid(cells: &[(f64, f64, f64)]) -> GridResponse {
        let cells: Vec<NormalizedGridCell> = cells
            .iter()
            .map(|(lat, lon, similarity)| NormalizedGridCell {
                lat: *lat,
                lon: *lon,
                similarity: *similarity,
            })
            .collect();
        GridResponse::from_cells(&cells)
    }

    #[test]
    fn test_only_intersecting_cells_are_laid_out() {
        let bounds = GridGeometry::tile_bounds(ZURICH_TILE);
        let inside_lat = (bounds.north + bounds.south) / 2.0;
        let inside_lon = (bounds.east + bounds.west) / 2.0;

        let grid = grid(&[(inside_lat, inside_lon, 0.7), (46.0, 6.5, 0.2)]);
        let layout = TileRenderer::layout(&grid, &[Lens::Water], ZURICH_TILE);

        assert_eq!(layout.cells.len(), 1);
        assert_eq!(layout.colormap, "cividis_r");
        assert_eq!((layout.z, layout.x, layout.y), (10, 536, 358));

        let rect = &layout.cells[0];
        assert_eq!(rect.similarity, 0.7);
        assert!(rect.width > 0.0 && rect.height > 0.0);
        assert!(rect.x > 0.0 && rect.x < TILE_SIZE as f64);
        assert!(rect.y > 0.0 && rect.y < TILE_SIZE as f64);
        assert_eq!(rect.fill, Colormap::CividisR.fill(0.7));
    }

    #[test]
    fn test_cell_crossing_tile_edge_is_kept() {
        let bounds = GridGeometry::tile_bounds(ZURICH_TILE);
        // Anchored just west of the tile, the cell reaches into it
        let grid = grid(&[((bounds.north + bounds.south) / 2.0, bounds.west - 0.001, 0.3)]);

        let layout = TileRenderer::layout(&grid, &[Lens::Water, Lens::Vegetation], ZURICH_TILE);

        assert_eq!(layout.cells.len(), 1);
        assert!(layout.cells[0].x < 0.0);
        assert_eq!(layout.colormap, "viridis");
    }

    #[test]
    fn test_coarser_zoom_draws_larger_cells() {
        let lat = 47.37;
        let lon = 8.54;
        let fine = TileRenderer::cell_bounds(lat, lon, 12);
        let coarse = TileRenderer::cell_bounds(lat, lon, 8);

        assert!((coarse.north - coarse.south) > 2.9 * (fine.north - fine.south));
        assert!((coarse.east - coarse.west) > 2.9 * (fine.east - fine.west));
    }

    #[test]
    fn test_low_zoom_cells_follow_mercator() {
        // Tile 4/8/5 spans ~40.98..55.78 N; a cell at 45 N projects below
        // where linear interpolation across the tile would put it
        let tile = TileCoord { z: 4, x: 8, y: 5 };
        let bounds = GridGeometry::tile_bounds(tile);
        let grid = grid(&[(45.0, 8.0, 0.5)]);

        let layout = TileRenderer::layout(&grid, &[Lens::Topography], tile);
        assert_eq!(layout.cells.len(), 1);

        let cell = TileRenderer::cell_bounds(45.0, 8.0, tile.z);
        let linear_top =
            GridGeometry::project_to_pixel(cell.north, cell.west, &bounds, 256.0, 256.0).y;
        let expected_top = GridGeometry::project_to_tile_pixel(cell.north, cell.west, tile, 256.0).y;

        assert!((layout.cells[0].y - expected_top).abs() < 1e-9);
        assert!(layout.cells[0].y - linear_top > 5.0);
        assert!(layout.cells[0].height > 0.0);
    }

    #[test]
    fn test_validate_tile() {
        assert!(TileRenderer::validate_tile(ZURICH_TILE).is_ok());
        assert!(TileRenderer::validate_tile(TileCoord { z: 1, x: 2, y: 0 }).is_err());
        assert!(TileRenderer::validate_tile(TileCoord { z: 23, x: 0, y: 0 }).is_err());
    }
}
