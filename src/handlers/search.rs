// src/handlers/search.rs
// DOCUMENTATION: HTTP handler for top-K similarity search
// PURPOSE: Forward validated search requests to the backend

use crate::errors::GridError;
use crate::models::SearchRequest;
use crate::services::SearchClient;
use actix_web::{web, HttpResponse, Responder};

/// POST /api/search
/// Top-K most similar cells inside a bounding box (delegated to the backend)
pub async fn search(
    client: web::Data<SearchClient>,
    req: web::Json<SearchRequest>,
) -> Result<impl Responder, GridError> {
    let result = client.search(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Configuration for search routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/search", web::post().to(search));
}
