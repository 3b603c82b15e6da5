// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod access_policy;
pub mod auth_service;
pub mod dynamic_field_service;
pub mod geocoding_client;
pub mod image_host_client;
pub mod property_query;
pub mod property_service;
pub mod rate_limit;

pub use access_policy::*;
pub use auth_service::*;
pub use dynamic_field_service::*;
pub use geocoding_client::*;
pub use image_host_client::*;
pub use property_query::*;
pub use property_service::*;
pub use rate_limit::*;
