// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod aggregator;
pub mod cache;
pub mod colormap;
pub mod geometry;
pub mod grid_service;
pub mod normalizer;
pub mod sample_store;
pub mod search_client;
pub mod tile_renderer;

pub use aggregator::*;
pub use cache::*;
pub use colormap::*;
pub use geometry::*;
pub use grid_service::*;
pub use normalizer::*;
pub use sample_store::*;
pub use search_client::*;
pub use tile_renderer::*;
