// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod grid;
pub mod lens;
pub mod search;

pub use grid::*;
pub use lens::*;
pub use search::*;
