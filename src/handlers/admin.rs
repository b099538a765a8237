// src/handlers/admin.rs
// DOCUMENTATION: Admin handlers for operational state
// PURPOSE: Expose dataset and tile cache state via REST endpoints

use crate::config::Config;
use crate::errors::GridError;
use crate::services::{CacheStats, DatasetStats, GridSettings, SampleStore, TileCache};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;
use std::sync::Arc;

/// Response for the stats endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub data_dir: String,
    pub datasets: Vec<DatasetStats>,
    pub tile_cache: CacheStats,
    pub bin_size_deg: f64,
    pub merge_strategy: String,
    pub normalization: String,
}

/// GET /admin/stats
/// Dataset availability, tile cache occupancy and pipeline settings
///
/// DOCUMENTATION: Requires admin authentication via X-Admin-Token header
pub async fn stats(
    store: web::Data<SampleStore>,
    settings: web::Data<GridSettings>,
    cache: web::Data<Arc<TileCache>>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, GridError> {
    verify_admin_token(&req, &config)?;

    let response = AdminStatsResponse {
        data_dir: store.data_dir().display().to_string(),
        datasets: store.stats(),
        tile_cache: cache.stats().await,
        bin_size_deg: settings.bin_size_deg,
        merge_strategy: settings.merge_strategy.to_string(),
        normalization: settings.normalization.to_string(),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// POST /admin/cache/clear
/// Drop every cached tile layout
pub async fn clear_cache(
    cache: web::Data<Arc<TileCache>>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, GridError> {
    verify_admin_token(&req, &config)?;

    let removed = cache.clear().await;
    log::info!("Admin cleared tile cache ({} entries)", removed);

    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}

/// Helper function to verify admin authentication
/// DOCUMENTATION: Checks X-Admin-Token header against configured admin token
fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), GridError> {
    let token = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Admin request without token");
            GridError::Unauthorized
        })?;

    if token != config.admin_token {
        log::warn!("Admin request with invalid token");
        return Err(GridError::Forbidden);
    }

    Ok(())
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/stats", web::get().to(stats))
            .route("/cache/clear", web::post().to(clear_cache)),
    );
}
