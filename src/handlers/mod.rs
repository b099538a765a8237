// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod admin;
pub mod grid;
pub mod health;
pub mod search;

pub use admin::config as admin_config;
pub use grid::config as grid_config;
pub use health::config as health_config;
pub use search::config as search_config;
