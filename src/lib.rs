// src/lib.rs
// DOCUMENTATION: Library root shared by the server and the pack_lens CLI
// PURPOSE: One definition of the lens catalog and the lens file format

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
