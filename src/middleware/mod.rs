// src/middleware/mod.rs
// DOCUMENTATION: Request guards shared by the handlers

pub mod auth;

pub use auth::*;
