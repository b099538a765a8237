// src/models/search.rs
// DOCUMENTATION: Top-K search DTOs
// PURPOSE: Request/response contract of the external similarity search backend

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use super::BoundingBox;

/// Request DTO for POST /api/search
/// DOCUMENTATION: Forwarded to the backend after validation and lens cleanup
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Area to search in
    pub bounding_box: BoundingBox,

    /// Number of best cells to return
    #[validate(range(min = 1, max = 1000))]
    pub top_k: u32,

    /// Size of each returned cell, interpreted by the backend
    #[serde(default)]
    #[validate(range(min = 1))]
    pub output_size: Option<u32>,

    /// Lenses to combine in the search
    #[validate(length(min = 1))]
    pub lenses: Vec<String>,
}

/// Response from the search backend
/// DOCUMENTATION: All three arrays are indexed by result rank
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Best matching cells, best first
    #[serde(default)]
    pub top_k_cells: Vec<BoundingBox>,

    /// Combined similarity per cell
    #[serde(default)]
    pub similarities: Vec<f64>,

    /// Per-lens similarity per cell
    #[serde(default)]
    pub lens_similarity: Vec<HashMap<String, f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(top_k: u32, lenses: &[&str]) -> SearchRequest {
        SearchRequest {
            bounding_box: BoundingBox::new(47.0, 46.0, 9.0, 8.0).unwrap(),
            top_k,
            output_size: None,
            lenses: lenses.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_top_k_range() {
        assert!(request(10, &["water"]).validate().is_ok());
        assert!(request(0, &["water"]).validate().is_err());
        assert!(request(1001, &["water"]).validate().is_err());
    }

    #[test]
    fn test_lenses_required() {
        assert!(request(5, &[]).validate().is_err());
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = r#"{
            "boundingBox": {"north": 47.0, "south": 46.0, "east": 9.0, "west": 8.0},
            "topK": 3,
            "outputSize": 2,
            "lenses": ["water", "roads"]
        }"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.top_k, 3);
        assert_eq!(req.output_size, Some(2));

        let response: SearchResponse =
            serde_json::from_str(r#"{"topKCells": [], "similarities": []}"#).unwrap();
        assert!(response.lens_similarity.is_empty());
    }
}
