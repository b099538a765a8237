// src/handlers/grid.rs
// DOCUMENTATION: HTTP handlers for grid data, tiles and the lens catalog
// PURPOSE: Parse requests, run the grid pipeline off the async workers,
// return responses

use crate::errors::GridError;
use crate::models::{GridFormat, GridQuery, GridResponse, LensInfo};
use crate::services::{
    Colormap, GridService, GridSettings, SampleStore, TileCache, TileCoord, TileKey,
    TileRenderer,
};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

/// Run the grid pipeline on the blocking pool
async fn run_pipeline(
    store: web::Data<SampleStore>,
    settings: GridSettings,
    query: GridQuery,
) -> Result<GridResponse, GridError> {
    let store = store.into_inner();
    web::block(move || GridService::build_grid(store.as_ref(), &query, &settings))
        .await
        .map_err(|e| GridError::InternalError(format!("grid worker failed: {}", e)))?
}

/// GET /api/gridcell
/// Aggregated, normalized similarity grid for the requested lenses and viewport
pub async fn get_grid(
    store: web::Data<SampleStore>,
    settings: web::Data<GridSettings>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<impl Responder, GridError> {
    let query = GridQuery::from_pairs(&query.into_inner())?;
    let format = query.format;

    let grid = run_pipeline(store, *settings.get_ref(), query).await?;

    Ok(match format {
        GridFormat::Json => HttpResponse::Ok().json(grid),
        GridFormat::GeoJson => HttpResponse::Ok()
            .content_type("application/geo+json")
            .json(grid.to_geojson()),
    })
}

/// GET /api/tiles/{z}/{x}/{y}
/// Pixel layout of the viewport grid inside one map tile
pub async fn get_tile(
    store: web::Data<SampleStore>,
    settings: web::Data<GridSettings>,
    cache: web::Data<Arc<TileCache>>,
    path: web::Path<(u32, u32, u32)>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<impl Responder, GridError> {
    let (z, x, y) = path.into_inner();
    let tile = TileCoord { z, x, y };
    TileRenderer::validate_tile(tile)?;

    let query = GridQuery::from_pairs(&query.into_inner())?;
    query.bounds.validate()?;
    let lenses = GridService::resolve_lenses(&query.lenses)?;
    let key = TileKey::new(&lenses, &query.bounds, tile);

    if let Some(layout) = cache.get(&key).await {
        return Ok(HttpResponse::Ok().json(layout.as_ref()));
    }

    let grid = run_pipeline(store, *settings.get_ref(), query).await?;
    let layout = Arc::new(TileRenderer::layout(&grid, &lenses, tile));
    cache.set(key, layout.clone()).await;

    Ok(HttpResponse::Ok().json(layout.as_ref()))
}

/// GET /api/lenses
/// Lens catalog with dataset availability and palette
pub async fn list_lenses(store: web::Data<SampleStore>) -> impl Responder {
    let catalog: Vec<LensInfo> = store
        .stats()
        .into_iter()
        .map(|stats| LensInfo {
            lens: stats.lens,
            dataset: stats.dataset,
            available: stats.available,
            sample_count: stats.sample_count,
            colormap: Colormap::for_lens(stats.lens).name(),
        })
        .collect();

    HttpResponse::Ok().json(catalog)
}

/// Configuration for grid routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/gridcell", web::get().to(get_grid))
            .route("/tiles/{z}/{x}/{y}", web::get().to(get_tile))
            .route("/lenses", web::get().to(list_lenses)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lens, Sample};
    use actix_web::{http::StatusCode, test, App};

    fn store() -> SampleStore {
        SampleStore::from_samples(vec![
            (
                Lens::Water,
                vec![Sample::new(46.5, 8.5, 0.2), Sample::new(46.5001, 8.5001, 0.8)],
            ),
            (
                Lens::Vegetation,
                vec![
                    Sample::new(47.37, 8.54, 0.9),
                    Sample::new(47.38, 8.55, 0.1),
                    Sample::new(46.2, 7.3, 0.5),
                ],
            ),
        ])
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(store()))
                    .app_data(web::Data::new(GridSettings::default()))
                    .app_data(web::Data::new(Arc::new(TileCache::new(16, 60))))
                    .configure(config),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn test_gridcell_merges_close_samples() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/gridcell?lens=water&minLat=46&maxLat=47&minLon=8&maxLon=9")
            .to_request();

        let body: GridResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.coordinates.len(), 1);
        assert_eq!(body.similarities, vec![0.5]);
        assert!((body.coordinates[0].lat - 46.50005).abs() < 1e-9);
    }

    #[actix_rt::test]
    async fn test_gridcell_roads_only_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/gridcell?lens=roads")
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "NO_VALID_LENSES");
    }

    #[actix_rt::test]
    async fn test_gridcell_inverted_bounds_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/gridcell?lens=water&minLat=47&maxLat=46")
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_BOUNDS");
    }

    #[actix_rt::test]
    async fn test_gridcell_empty_viewport_returns_empty_arrays() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/gridcell?lenses=water,vegetation&minLat=45.0&maxLat=45.5&minLon=6&maxLon=7")
            .to_request();

        let body: GridResponse = test::call_and_read_body_json(&app, req).await;
        assert!(body.coordinates.is_empty());
        assert!(body.similarities.is_empty());
    }

    #[actix_rt::test]
    async fn test_gridcell_geojson_format() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/gridcell?lens=vegetation&format=geojson")
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"].as_array().map(|f| f.len()), Some(3));
    }

    #[actix_rt::test]
    async fn test_tile_layout_is_cached() {
        let cache = Arc::new(TileCache::new(16, 60));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(store()))
                .app_data(web::Data::new(GridSettings::default()))
                .app_data(web::Data::new(cache.clone()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/tiles/10/536/358?lens=vegetation")
            .to_request();
        let layout: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(layout["colormap"], "summer_r");
        assert_eq!(layout["tileSize"], 256);
        assert_eq!(layout["cells"].as_array().map(|c| c.len()), Some(2));
        assert_eq!(cache.stats().await.active_entries, 1);
    }

    #[actix_rt::test]
    async fn test_tile_out_of_range_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/tiles/2/4/0?lens=water")
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_lens_catalog() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/lenses").to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let lenses = body.as_array().unwrap();

        assert_eq!(lenses.len(), 4);
        assert_eq!(lenses[0]["lens"], "water");
        assert_eq!(lenses[0]["sampleCount"], 2);
        assert_eq!(lenses[3]["lens"], "roads");
        assert_eq!(lenses[3]["available"], false);
        assert_eq!(lenses[3]["colormap"], "seismic");
    }
}
