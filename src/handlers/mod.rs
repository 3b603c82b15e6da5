// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod admin;
pub mod auth;
pub mod contacts;
pub mod health;
pub mod inquiries;
pub mod lookups;
pub mod media;
pub mod properties;

pub use admin::config as admin_config;
pub use auth::config as auth_config;
pub use contacts::config as contacts_config;
pub use health::config as health_config;
pub use inquiries::config as inquiries_config;
pub use lookups::config as lookups_config;
pub use media::config as media_config;
pub use properties::config as properties_config;
