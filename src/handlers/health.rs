// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Simple endpoint to verify service status

use crate::services::SampleStore;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn health_check(store: web::Data<SampleStore>) -> impl Responder {
    let lenses_available = store.stats().iter().filter(|s| s.available).count();

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "lens-grid",
        "version": env!("CARGO_PKG_VERSION"),
        "lensesAvailable": lenses_available
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lens, Sample};
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn test_health_counts_loaded_lenses() {
        let store = SampleStore::from_samples(vec![(Lens::Water, vec![Sample::new(46.5, 8.5, 0.1)])]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(store))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "lens-grid");
        assert_eq!(body["lensesAvailable"], 1);
    }
}
